//! Config module tests

use crate::config::{ApiConfig, Config};
use crate::domain::inbox::SortOrder;
use crate::domain::timebox::TeamRole;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.api.base_url, "http://localhost:3000/api");
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.finance.currency, "USD");
    assert_eq!(config.finance.fallback_rates.len(), 5);
    assert_eq!(config.finance.fallback_rates["solutionDeveloper"], 600.0);
    assert_eq!(config.inbox.sort_order(), SortOrder::Desc);
    assert_eq!(config.gantt.default_span_days, 14);
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_rate_table_round_trips_through_config() {
    let table = Config::default().finance.rate_table();
    assert_eq!(table.fallback_rate(TeamRole::BusinessAmbassador), Some(400.0));
    assert!(
        table
            .candidate_names(TeamRole::SolutionTester)
            .contains(&"QA".to_string())
    );
}

#[test]
fn test_partial_toml_fills_defaults() {
    let config: Config = toml::from_str(
        r#"
        [api]
        base_url = "https://timebox.example.com/api"
        "#,
    )
    .expect("Should parse");

    assert_eq!(config.api.base_url, "https://timebox.example.com/api");
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.finance.currency, "USD");
}

#[test]
fn test_get_set_roundtrip() {
    let mut config = Config::default();

    config.set("api.timeout_secs", "45").unwrap();
    assert_eq!(config.get("api.timeout_secs").unwrap(), "45");

    config.set("finance.currency", "pen").unwrap();
    assert_eq!(config.get("finance.currency").unwrap(), "PEN");

    config.set("inbox.sort", "ASC").unwrap();
    assert_eq!(config.inbox.sort_order(), SortOrder::Asc);

    config
        .set("finance.fallback_rates.solution_tester", "510.5")
        .unwrap();
    assert_eq!(
        config.get("finance.fallback_rates.solutionTester").unwrap(),
        "510.5"
    );

    config
        .set("finance.role_names.technicalAdvisor", "Arquitecto, Tech Lead")
        .unwrap();
    assert_eq!(
        config.get("finance.role_names.technicalAdvisor").unwrap(),
        "Arquitecto, Tech Lead"
    );
}

#[test]
fn test_set_rejects_invalid_values() {
    let mut config = Config::default();

    assert!(config.set("api.timeout_secs", "0").is_err());
    assert!(config.set("api.base_url", "ftp://nope").is_err());
    assert!(config.set("inbox.sort", "sideways").is_err());
    assert!(config.set("gantt.default_span_days", "-3").is_err());
    assert!(config.set("finance.fallback_rates.scrumMaster", "100").is_err());
    assert!(config.set("finance.fallback_rates.solutionDeveloper", "-1").is_err());
    assert!(config.set("unknown.key", "x").is_err());
}

#[test]
fn test_gantt_span_is_bounded() {
    let mut config = Config::default();
    assert!(config.set("gantt.default_span_days", "200000000").is_err());
    assert_eq!(config.gantt.default_span_days, 14);
    assert!(config.set("gantt.default_span_days", "3650").is_ok());

    config.gantt.default_span_days = 200_000_000;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_unknown_role_in_file() {
    let config: Config = toml::from_str(
        r#"
        [finance.fallback_rates]
        scrumMaster = 900.0
        "#,
    )
    .expect("Should parse");

    assert!(config.validate().is_err());
}

#[test]
fn test_list_covers_every_role() {
    let list = Config::default().list().unwrap();
    assert!(list.iter().any(|(k, _)| k == "api.base_url"));
    for role in TeamRole::ALL {
        let key = format!("finance.fallback_rates.{}", role.key());
        assert!(list.iter().any(|(k, _)| *k == key));
    }
}

#[test]
fn test_base_url_trailing_slash_trimmed() {
    let api = ApiConfig {
        base_url: "http://localhost:3000/api/".to_string(),
        timeout_secs: 5,
    };
    // TIMEBOX_API_URL is not set by the test suite
    if std::env::var("TIMEBOX_API_URL").is_err() {
        assert_eq!(api.resolved_base_url(), "http://localhost:3000/api");
    }
}

#[test]
fn test_config_serialize_deserialize() {
    let config = Config::default();
    let serialized = toml::to_string_pretty(&config).expect("Should serialize");
    let deserialized: Config = toml::from_str(&serialized).expect("Should deserialize");

    assert_eq!(deserialized.api.base_url, config.api.base_url);
    assert_eq!(
        deserialized.finance.role_names,
        config.finance.role_names
    );
}
