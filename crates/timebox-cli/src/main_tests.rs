//! CLI argument parsing tests

use clap::Parser;

use crate::{Cli, Commands, ConfigAction, InboxAction, OutputFormat, PaymentAction, PhaseAction};

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["timebox", "whoami", "--format", "json", "-q"]).unwrap();
    assert_eq!(cli.format, OutputFormat::Json);
    assert!(cli.quiet);
    assert!(matches!(cli.command, Commands::Whoami));
}

#[test]
fn test_phase_complete_defaults_to_advancing() {
    let cli = Cli::try_parse_from(["timebox", "phase", "complete", "tb-1", "kickoff"]).unwrap();
    match cli.command {
        Commands::Phase {
            action:
                PhaseAction::Complete {
                    timebox_id,
                    phase,
                    no_advance,
                },
        } => {
            assert_eq!(timebox_id, "tb-1");
            assert_eq!(phase, "kickoff");
            assert!(!no_advance);
        }
        _ => panic!("expected phase complete"),
    }
}

#[test]
fn test_deliver_requires_files() {
    assert!(Cli::try_parse_from(["timebox", "phase", "deliver", "tb-1"]).is_err());
    let cli = Cli::try_parse_from(["timebox", "phase", "deliver", "tb-1", "a.pdf", "b.png"]).unwrap();
    match cli.command {
        Commands::Phase {
            action: PhaseAction::Deliver { files, .. },
        } => assert_eq!(files.len(), 2),
        _ => panic!("expected phase deliver"),
    }
}

#[test]
fn test_inbox_apply_without_role_is_general_interest() {
    let cli = Cli::try_parse_from(["timebox", "inbox", "apply", "tb-1"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Inbox {
            action: InboxAction::Apply { role: None, .. }
        }
    ));
}

#[test]
fn test_payment_set_status_args() {
    let cli = Cli::try_parse_from(["timebox", "payments", "set-status", "o1", "Pagada"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Payments {
            action: PaymentAction::SetStatus { .. }
        }
    ));
}

#[test]
fn test_config_requires_action() {
    assert!(Cli::try_parse_from(["timebox", "config"]).is_err());
    let cli = Cli::try_parse_from(["timebox", "config", "get", "api.base_url"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            action: ConfigAction::Get { .. }
        }
    ));
}

#[test]
fn test_role_parsing_accepts_keys_and_labels() {
    use timebox_core::domain::timebox::TeamRole;
    assert_eq!(
        crate::parse_role("solutionTester").unwrap(),
        TeamRole::SolutionTester
    );
    assert_eq!(
        crate::parse_role("business advisor").unwrap(),
        TeamRole::BusinessAdvisor
    );
    assert!(crate::parse_role("scrumMaster").is_err());
}

#[test]
fn test_phase_parsing() {
    use timebox_core::domain::timebox::PhaseKind;
    assert_eq!(crate::parse_phase("Kick-Off").unwrap(), PhaseKind::KickOff);
    assert!(crate::parse_phase("deploy").is_err());
}
