//! Timebox Track CLI - timebox planning, tracking and settlement

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use timebox_core::application::{
    FinanceService, InboxService, ProjectService, TimeboxPhaseForm, TimeboxService,
};
use timebox_core::config::Config;
use timebox_core::domain::attachment::UploadFile;
use timebox_core::domain::finance::{GenerationReport, PaymentOrderGenerator, PaymentStatus};
use timebox_core::domain::gantt::GanttDeriver;
use timebox_core::domain::inbox::{InboxBucket, InboxFilter, SortOrder};
use timebox_core::domain::project::ProjectContent;
use timebox_core::domain::timebox::{PhaseKind, TeamRole, Timebox, TimeboxStatus};
use timebox_core::infrastructure::api::{
    AuthService, HttpPaymentOrderRepository, HttpProjectRepository, HttpRoleRepository,
    HttpTimeboxRepository, HttpUploader,
};
use timebox_core::infrastructure::{ApiClient, SessionStore};
use timebox_core::store::EntityStore;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "timebox")]
#[command(author, version, about = "Timebox planning, tracking and settlement", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Browse and manage timeboxes
    Timeboxes {
        #[command(subcommand)]
        action: TimeboxAction,
    },

    /// Work through the phases of a timebox
    Phase {
        #[command(subcommand)]
        action: PhaseAction,
    },

    /// Developer task inbox
    Inbox {
        #[command(subcommand)]
        action: InboxAction,
    },

    /// Show Gantt rows for the timeboxes
    Gantt {
        /// Only timeboxes of this project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Payment orders
    Payments {
        #[command(subcommand)]
        action: PaymentAction,
    },

    /// Projects and their content
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum TimeboxAction {
    /// List timeboxes
    List {
        #[arg(short, long)]
        project: Option<String>,
        /// Filter by status (e.g. "Disponible")
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Show timebox details
    Show { id: String },
    /// Delete a timebox
    Delete {
        id: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum PhaseAction {
    /// Complete a phase
    Complete {
        timebox_id: String,
        /// planning, kickoff, refinement, qa or close
        phase: String,
        /// Stay on the phase instead of moving to the next one
        #[arg(long)]
        no_advance: bool,
    },
    /// Publish the offer
    Publish { timebox_id: String },
    /// Add a Refinement review request
    Review {
        timebox_id: String,
        descripcion: String,
    },
    /// Upload delivery files
    Deliver {
        timebox_id: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short, long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
enum InboxAction {
    /// List inbox timeboxes
    List {
        /// Disponible, Solicitado, Asignado or Finalizado
        #[arg(short, long)]
        bucket: Option<String>,
        #[arg(long)]
        skill: Option<String>,
        #[arg(long)]
        effort: Option<String>,
        /// asc or desc by publication date
        #[arg(long)]
        sort: Option<String>,
    },
    /// Apply to a role, or register general interest without --role
    Apply {
        timebox_id: String,
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Approve an application
    Approve {
        timebox_id: String,
        postulacion_id: String,
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Reject an application
    Reject {
        timebox_id: String,
        postulacion_id: String,
    },
}

#[derive(Subcommand)]
enum PaymentAction {
    /// Issue the missing orders for a finished timebox
    Generate { timebox_id: String },
    /// List payment orders (yours unless --all)
    List {
        #[arg(long)]
        all: bool,
        #[arg(short, long)]
        timebox: Option<String>,
    },
    /// Move an order to Aprobada, Pagada or Rechazada
    SetStatus { order_id: String, status: String },
    /// Attach a payment receipt
    Receipt { order_id: String, file: PathBuf },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// List projects
    List,
    /// Show project details
    Show { id: String },
    /// Print the content tree
    Tree { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

/// Config, session and client shared by the commands that talk to the backend
struct Context {
    config: Config,
    client: ApiClient,
}

impl Context {
    fn open() -> anyhow::Result<Self> {
        let config = Config::load()?;
        let session = Arc::new(SessionStore::open(Config::session_path()?));
        let client = ApiClient::from_config(&config.api, session)?;
        debug!(base_url = %client.base_url(), "Backend client ready");
        Ok(Self { config, client })
    }

    fn auth(&self) -> AuthService {
        AuthService::new(self.client.clone())
    }

    fn timeboxes(&self) -> TimeboxService {
        TimeboxService::new(
            Arc::new(HttpTimeboxRepository::new(self.client.clone())),
            Arc::new(EntityStore::new("timeboxes")),
        )
    }

    fn generator(&self) -> PaymentOrderGenerator {
        PaymentOrderGenerator::new(
            Arc::new(HttpPaymentOrderRepository::new(self.client.clone())),
            Arc::new(HttpRoleRepository::new(self.client.clone())),
        )
        .with_rates(self.config.finance.rate_table())
        .with_currency(self.config.finance.currency.clone())
    }

    fn finance(&self) -> FinanceService {
        FinanceService::new(
            Arc::new(HttpPaymentOrderRepository::new(self.client.clone())),
            Arc::new(self.generator()),
        )
    }

    fn projects(&self) -> ProjectService {
        ProjectService::new(Arc::new(HttpProjectRepository::new(self.client.clone())))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_role(raw: &str) -> anyhow::Result<TeamRole> {
    TeamRole::from_key(raw).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown role: {}. Valid roles: {}",
            raw,
            TeamRole::ALL.map(|r| r.key()).join(", ")
        )
    })
}

fn parse_phase(raw: &str) -> anyhow::Result<PhaseKind> {
    PhaseKind::parse(raw).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown phase: {}. Valid phases: planning, kickoff, refinement, qa, close",
            raw
        )
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("timebox_core=info".parse()?)
                .add_directive("timebox=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let format = cli.format;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Login { email, password } => cmd_login(&email, &password, format, quiet).await,
        Commands::Logout => cmd_logout(quiet).await,
        Commands::Whoami => cmd_whoami(format),
        Commands::Timeboxes { action } => cmd_timeboxes(action, format, quiet).await,
        Commands::Phase { action } => cmd_phase(action, format, quiet).await,
        Commands::Inbox { action } => cmd_inbox(action, format, quiet).await,
        Commands::Gantt { project } => cmd_gantt(project.as_deref(), format).await,
        Commands::Payments { action } => cmd_payments(action, format, quiet).await,
        Commands::Projects { action } => cmd_projects(action, format).await,
        Commands::Config { action } => cmd_config(action, quiet),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_login(
    email: &str,
    password: &str,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let ctx = Context::open()?;
    let user = ctx.auth().login(email, password).await?;
    match format {
        OutputFormat::Json => print_json(&user)?,
        OutputFormat::Text if !quiet => println!("Logged in as {} <{}>", user.nombre, user.email),
        OutputFormat::Text => {}
    }
    Ok(())
}

async fn cmd_logout(quiet: bool) -> anyhow::Result<()> {
    let ctx = Context::open()?;
    ctx.auth().logout().await?;
    if !quiet {
        println!("Logged out.");
    }
    Ok(())
}

fn cmd_whoami(format: OutputFormat) -> anyhow::Result<()> {
    let session = SessionStore::open(Config::session_path()?);
    let user = session.current_user().filter(|_| session.is_authenticated());
    match (user, format) {
        (Some(user), OutputFormat::Json) => print_json(&user)?,
        (Some(user), OutputFormat::Text) => {
            println!("{} <{}>", user.nombre, user.email);
            println!("  ID: {}", user.id);
            if let Some(developer_id) = &user.developer_id {
                println!("  Developer: {}", developer_id);
            }
            if let Some(rol) = &user.rol {
                println!("  Role: {}", rol);
            }
        }
        (None, _) => {
            println!("Not logged in.");
            println!("\nLog in with: timebox login <email> --password <password>");
        }
    }
    Ok(())
}

fn print_timebox_row(t: &Timebox) {
    println!(
        "  {} - {} [{}] {}",
        t.id.as_deref().unwrap_or("(unsaved)"),
        t.name(),
        t.estado,
        t.fases.current().label()
    );
}

async fn cmd_timeboxes(action: TimeboxAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let ctx = Context::open()?;
    let service = ctx.timeboxes();

    match action {
        TimeboxAction::List { project, status } => {
            let status = match status.as_deref() {
                Some(raw) => Some(
                    TimeboxStatus::parse(raw)
                        .ok_or_else(|| anyhow::anyhow!("Unknown status: {}", raw))?,
                ),
                None => None,
            };
            let timeboxes: Vec<Timebox> = service
                .list()
                .await?
                .iter()
                .filter(|t| project.as_deref().is_none_or(|p| t.project_id == p))
                .filter(|t| status.is_none_or(|s| t.estado == s))
                .cloned()
                .collect();

            if format == OutputFormat::Json {
                return print_json(&timeboxes);
            }
            if timeboxes.is_empty() {
                if !quiet {
                    println!("No timeboxes found.");
                }
            } else {
                if !quiet {
                    println!("Timeboxes:");
                }
                for t in &timeboxes {
                    print_timebox_row(t);
                }
            }
        }
        TimeboxAction::Show { id } => {
            let t = service.get(&id).await?;
            if format == OutputFormat::Json {
                return print_json(&t);
            }
            println!("Timebox: {}", t.name());
            println!("  ID: {}", id);
            println!("  Project: {}", t.project_id);
            println!("  Status: {}", t.estado);
            if let Some(start) = t.fases.planning.fecha_inicio {
                println!("  Start: {}", start.format("%Y-%m-%d"));
            }
            println!("  Phases:");
            for phase in PhaseKind::ALL {
                let mark = if t.fases.is_completed(phase) { "x" } else { " " };
                println!("    [{}] {}", mark, phase.label());
            }
            if let Some(team) = t.team() {
                println!("  Team:");
                for (role, persona) in team.filled() {
                    println!("    {}: {}", role.label(), persona.nombre);
                }
                let missing = team.missing_roles();
                if !missing.is_empty() {
                    let labels: Vec<&str> = missing.iter().map(|r| r.label()).collect();
                    println!("    Missing: {}", labels.join(", "));
                }
            }
            if let Some(offer) = t.offer() {
                println!(
                    "  Offer: {} ({} applications)",
                    if offer.publicado { "published" } else { "not published" },
                    offer.postulaciones.len()
                );
            }
        }
        TimeboxAction::Delete { id, force } => {
            if !force && !quiet {
                println!("Warning: This will permanently delete timebox '{}'.", id);
                println!("Use --force to confirm deletion.");
                return Ok(());
            }
            service.delete(&id).await?;
            if !quiet {
                println!("Timebox '{}' deleted.", id);
            }
        }
    }
    Ok(())
}

fn print_report(report: &GenerationReport, currency: &str) {
    println!("Payment orders ({} weeks):", report.weeks);
    for order in &report.created {
        println!("  + {} {:.2} {} ({})", order.rol, order.monto, currency, order.developer_id);
    }
    for (role, reason) in &report.skipped {
        println!("  - {} skipped: {:?}", role.key(), reason);
    }
    for (role, error) in &report.failed {
        println!("  ! {} failed: {}", role.key(), error);
    }
}

async fn cmd_phase(action: PhaseAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let ctx = Context::open()?;
    let service = ctx.timeboxes();
    let open = |timebox: Timebox| {
        TimeboxPhaseForm::new(service.repository(), Arc::clone(service.store()), timebox)
            .with_uploader(Arc::new(HttpUploader::new(ctx.client.clone())))
            .with_payments(Arc::new(ctx.generator()))
    };

    match action {
        PhaseAction::Complete {
            timebox_id,
            phase,
            no_advance,
        } => {
            let phase = parse_phase(&phase)?;
            let mut form = open(service.get(&timebox_id).await?);
            let outcome = form.complete_phase(phase, !no_advance, Utc::now()).await?;
            let payments = form.wait_for_payments().await;

            if let Some(warning) = outcome.warning() {
                warn!("{}", warning);
            }
            if format == OutputFormat::Json {
                return print_json(form.timebox());
            }
            if !quiet {
                if outcome.completed {
                    println!("{} completed.", phase.label());
                } else {
                    println!("{} saved.", phase.label());
                }
                if let Some(warning) = outcome.warning() {
                    println!("Warning: {}", warning);
                }
                println!("  Status: {}", form.timebox().estado);
                println!("  Current step: {}", form.stepper().active_phase().label());
                if let Some(report) = payments {
                    print_report(&report, &ctx.config.finance.currency);
                }
            }
        }
        PhaseAction::Publish { timebox_id } => {
            let mut form = open(service.get(&timebox_id).await?);
            let outcome = form.publish(Utc::now()).await?;
            if !quiet {
                if outcome.published {
                    println!("Offer for '{}' published.", form.timebox().name());
                } else {
                    println!("Offer for '{}' was already published.", form.timebox().name());
                }
            }
        }
        PhaseAction::Review {
            timebox_id,
            descripcion,
        } => {
            let mut form = open(service.get(&timebox_id).await?);
            let revision = form.add_revision(descripcion, Some(Utc::now())).await?;
            if !quiet {
                println!("Review request added: {}", revision.id);
            }
        }
        PhaseAction::Deliver {
            timebox_id,
            files,
            description,
        } => {
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                uploads.push(UploadFile::from_path(path).await?);
            }
            let mut form = open(service.get(&timebox_id).await?);
            let entrega = form.submit_delivery(description, uploads, Utc::now()).await?;
            if format == OutputFormat::Json {
                return print_json(&entrega);
            }
            if !quiet {
                println!("Delivery submitted ({} files).", entrega.archivos.len());
                for adjunto in &entrega.archivos {
                    println!("  {} -> {}", adjunto.nombre, adjunto.url);
                }
            }
        }
    }
    Ok(())
}

async fn cmd_inbox(action: InboxAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let ctx = Context::open()?;
    let user = ctx.auth().require_user()?;
    let service = ctx.timeboxes();
    let inbox = InboxService::new(service.repository(), Arc::clone(service.store()), user);

    match action {
        InboxAction::List {
            bucket,
            skill,
            effort,
            sort,
        } => {
            let mut filter = InboxFilter::default().sorted(ctx.config.inbox.sort_order());
            if let Some(raw) = bucket {
                filter.bucket = Some(
                    InboxBucket::parse(&raw)
                        .ok_or_else(|| anyhow::anyhow!("Unknown bucket: {}", raw))?,
                );
            }
            if let Some(skill) = skill {
                filter = filter.with_skill(skill);
            }
            if let Some(effort) = effort {
                filter = filter.with_effort(effort);
            }
            if let Some(raw) = sort {
                filter = filter.sorted(
                    SortOrder::parse(&raw).ok_or_else(|| anyhow::anyhow!("Unknown sort: {}", raw))?,
                );
            }

            let timeboxes = inbox.list(&filter).await?;
            if format == OutputFormat::Json {
                return print_json(&timeboxes);
            }
            if !quiet {
                let counts: Vec<String> = inbox
                    .counts()
                    .await?
                    .into_iter()
                    .map(|(bucket, n)| format!("{} {}", bucket, n))
                    .collect();
                println!("Inbox ({})", counts.join(" | "));
            }
            for t in &timeboxes {
                print_timebox_row(t);
            }
        }
        InboxAction::Apply { timebox_id, role } => {
            let role = role.as_deref().map(parse_role).transpose()?;
            inbox.apply(&timebox_id, role, Utc::now()).await?;
            if !quiet {
                match role {
                    Some(role) => println!("Applied to {} on '{}'.", role.label(), timebox_id),
                    None => println!("Interest registered on '{}'.", timebox_id),
                }
            }
        }
        InboxAction::Approve {
            timebox_id,
            postulacion_id,
            role,
        } => {
            let role = role.as_deref().map(parse_role).transpose()?;
            let saved = inbox.approve(&timebox_id, &postulacion_id, role).await?;
            if !quiet {
                println!("Application approved. Status: {}", saved.estado);
            }
        }
        InboxAction::Reject {
            timebox_id,
            postulacion_id,
        } => {
            inbox.reject(&timebox_id, &postulacion_id).await?;
            if !quiet {
                println!("Application rejected.");
            }
        }
    }
    Ok(())
}

async fn cmd_gantt(project: Option<&str>, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = Context::open()?;
    let service = ctx.timeboxes();
    let timeboxes = match project {
        Some(project_id) => service.list_for_project(project_id).await?,
        None => service.list().await?.to_vec(),
    };
    let tasks = GanttDeriver::new(ctx.config.gantt.default_span_days).tasks(&timeboxes, Utc::now());

    if format == OutputFormat::Json {
        return print_json(&tasks);
    }
    for task in &tasks {
        println!(
            "  {} {} .. {} {:>3}% {}",
            task.id,
            task.start.format("%Y-%m-%d"),
            task.end.format("%Y-%m-%d"),
            task.progress,
            task.name
        );
    }
    Ok(())
}

async fn cmd_payments(action: PaymentAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let ctx = Context::open()?;
    let finance = ctx.finance();

    match action {
        PaymentAction::Generate { timebox_id } => {
            let timebox = ctx.timeboxes().get(&timebox_id).await?;
            let report = finance.generate(&timebox, Utc::now()).await?;
            if format == OutputFormat::Json {
                return print_json(&report.created);
            }
            if !quiet {
                print_report(&report, &ctx.config.finance.currency);
            }
            if !report.is_complete() {
                anyhow::bail!("{} payment orders could not be created", report.failed.len());
            }
        }
        PaymentAction::List { all, timebox } => {
            let orders = match timebox {
                Some(timebox_id) => finance.for_timebox(&timebox_id).await?,
                None if all => finance.all_payments().await?.to_vec(),
                None => {
                    let user = ctx.auth().require_user()?;
                    finance.my_payments(user.developer_key()).await?.to_vec()
                }
            };
            if format == OutputFormat::Json {
                return print_json(&orders);
            }
            if orders.is_empty() && !quiet {
                println!("No payment orders found.");
            }
            for o in &orders {
                println!(
                    "  {} - {} {:.2} {} [{}] {}",
                    o.id.as_deref().unwrap_or("-"),
                    o.rol,
                    o.monto,
                    o.moneda,
                    o.estado,
                    o.concepto
                );
            }
        }
        PaymentAction::SetStatus { order_id, status } => {
            let estado = PaymentStatus::parse(&status)
                .ok_or_else(|| anyhow::anyhow!("Unknown payment status: {}", status))?;
            finance.all_payments().await?;
            let updated = finance.set_status(&order_id, estado).await?;
            if !quiet {
                println!("Order '{}' is now {}.", order_id, updated.estado);
            }
        }
        PaymentAction::Receipt { order_id, file } => {
            let upload = UploadFile::from_path(&file).await?;
            finance.upload_receipt(&order_id, upload).await?;
            if !quiet {
                println!("Receipt attached to '{}'.", order_id);
            }
        }
    }
    Ok(())
}

fn print_tree(nodes: &[ProjectContent], depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth + 1);
        match &node.adjunto {
            Some(adjunto) => println!("{}{} [{}] {}", indent, node.nombre, node.tipo, adjunto.url),
            None => println!("{}{}/", indent, node.nombre),
        }
        print_tree(&node.contenido, depth + 1);
    }
}

async fn cmd_projects(action: ProjectAction, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = Context::open()?;
    let projects = ctx.projects();

    match action {
        ProjectAction::List => {
            let list = projects.list().await?;
            if format == OutputFormat::Json {
                return print_json(&*list);
            }
            if list.is_empty() {
                println!("No projects found.");
            }
            for p in list.iter() {
                println!("  {} - {} ({} timeboxes)", p.id, p.nombre, p.timeboxes.len());
            }
        }
        ProjectAction::Show { id } => {
            let p = projects.get(&id).await?;
            if format == OutputFormat::Json {
                return print_json(&p);
            }
            println!("Project: {}", p.nombre);
            println!("  ID: {}", p.id);
            if let Some(desc) = &p.descripcion {
                println!("  Description: {}", desc);
            }
            println!("  Timeboxes: {}", p.timebox_ids().join(", "));
            println!("  Content nodes: {}", p.contenido.iter().map(|n| n.count()).sum::<usize>());
        }
        ProjectAction::Tree { id } => {
            let p = projects.get(&id).await?;
            if format == OutputFormat::Json {
                return print_json(&p.contenido);
            }
            println!("{}/", p.nombre);
            print_tree(&p.contenido, 0);
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod main_tests;
