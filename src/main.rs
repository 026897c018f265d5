use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};

use gator::auth::Session;
use gator::commands::{Command, Context, Registry};
use gator::{Config, Database, SqlStore};

/// Gator - a multi-user RSS feed aggregator.
#[derive(Debug, Parser)]
#[command(name = "gator", version, about)]
struct Cli {
    /// Path to the configuration file (defaults to ~/.gatorconfig.json).
    #[arg(long, env = "GATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Command to run.
    command: String,

    /// Command arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> gator::Result<()> {
    let path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load_with_env(&path)?;

    // Initialize logging
    if let Err(e) = gator::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        gator::logging::init_console_only(&config.logging.level);
    }

    config.validate()?;
    debug!(path = %path.display(), "Loaded configuration");

    let db = Database::open(&config.db_url).await?;
    let store = Arc::new(SqlStore::new(db.clone()));

    let (trigger, shutdown) = gator::shutdown::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            trigger.trigger();
        }
    });

    let mut ctx = Context::new(store, Session::persistent(config, path)).with_shutdown(shutdown);
    let cmd = Command::new(cli.command, cli.args);

    let registry = Registry::with_defaults();
    if registry.get(&cmd.name).is_none() {
        eprintln!("available commands: {}", registry.names().join(", "));
    }

    let result = registry.run(&mut ctx, &cmd).await;
    db.close().await;
    result
}
