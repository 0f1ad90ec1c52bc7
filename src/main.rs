mod api;
mod server;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use lfg_reputation::{
    MemoryStore, ParticipantOutcome, ParticipantStatus, ReportReason, ReputationCalculator,
    ReputationConfig,
};

#[derive(Parser)]
#[command(name = "lfg-reputation", about = "Player reputation scoring engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Walk one user through a scripted reputation history and print it.
    Demo(DemoArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
    /// TOML config path (defaults to REPUTATION_CONFIG_PATH or config/reputation.toml).
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON snapshot file for the in-memory store.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            config: None,
            snapshot: None,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct DemoArgs {
    #[arg(long, default_value = "alice")]
    user: String,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("lfg_reputation=info".parse().unwrap()),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::serve(args).await,
        Command::Demo(args) => run_demo(args),
    }
}

fn run_demo(args: DemoArgs) -> Result<(), String> {
    let (config, _) = ReputationConfig::load(None).map_err(|err| err.to_string())?;
    let calculator = Arc::new(ReputationCalculator::new(Arc::new(MemoryStore::new()), config));
    let user = args.user.as_str();

    let good = ParticipantOutcome {
        status: ParticipantStatus::Completed,
        minutes_late: 0,
        completion_percent: Some(100),
        was_kicked: false,
    };
    let no_show = ParticipantOutcome {
        status: ParticipantStatus::NoShow,
        minutes_late: 0,
        completion_percent: Some(0),
        was_kicked: false,
    };

    let step = |label: &str| -> Result<(), String> {
        let display = calculator
            .reputation_display(user)
            .map_err(|err| err.to_string())?;
        println!("{:<40} {}", label, display.display);
        Ok(())
    };

    calculator
        .record_session_completion(user, "session-demo-1", &good)
        .map_err(|err| err.to_string())?;
    step("completed a session on time")?;

    calculator
        .record_session_completion(user, "session-demo-2", &no_show)
        .map_err(|err| err.to_string())?;
    step("no-showed (still in grace, no penalty)")?;

    calculator
        .record_endorsement("host-demo", user, Some("session-demo-1"))
        .map_err(|err| err.to_string())?;
    step("received a host endorsement")?;

    calculator
        .record_report("rando-demo", user, ReportReason::ToxicBehavior, None, None)
        .map_err(|err| err.to_string())?;
    step("reported for toxic behavior")?;

    calculator
        .record_cancellation(user, "session-demo-3", 0.5)
        .map_err(|err| err.to_string())?;
    step("cancelled 0.5h before start")?;

    let drift = calculator.config().seasonal.drift_factor;
    calculator
        .apply_seasonal_reset(user, drift)
        .map_err(|err| err.to_string())?;
    step("seasonal soft reset")?;

    Ok(())
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
