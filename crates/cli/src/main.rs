mod commands;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "swivel", about = "Swivel — rotate provider identities via browser OAuth")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the account roster (defaults to ~/.swivel/accounts.json).
    #[arg(long, global = true)]
    accounts: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Establish browser profiles by signing in interactively.
    Setup {
        /// Re-create profiles that already exist.
        #[arg(long)]
        force: bool,
        /// Set up a single account instead of all of them.
        #[arg(long)]
        account: Option<String>,
    },
    /// Rotate to the least-recently-used or an explicitly named account.
    Switch {
        /// Account id to switch to, overriding LRU selection.
        #[arg(long)]
        account: Option<String>,
    },
    /// Show the roster and last-used timestamps.
    Status,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "swivel starting");

    let roster_path = match cli.accounts.clone() {
        Some(path) => path,
        None => swivel_accounts::store::AccountStore::default_path()?,
    };

    match cli.command {
        Commands::Setup { force, account } => {
            commands::run_setup(&roster_path, force, account.as_deref()).await
        },
        Commands::Switch { account } => {
            commands::run_switch(&roster_path, account.as_deref()).await
        },
        Commands::Status => commands::run_status(&roster_path),
    }
}
