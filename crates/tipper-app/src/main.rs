// Tipper admin entry point.
//
// 1. Parse the command line
// 2. Initialize tracing (log to file, stdout carries only the status)
// 3. Load config, open the database, build the Sportradar client
// 4. Run the command and print `ok` or `failed`

use tipper::cli::{self, Cli};
use tipper::config;
use tipper_core::engine::Engine;
use tipper_core::provider::SportradarClient;
use tipper_core::store::Database;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let status = match run(args).await {
        Ok(()) => "ok",
        Err(e) => {
            error!("Command failed: {e:#}");
            "failed"
        }
    };
    println!("{status}");
    if status != "ok" {
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> anyhow::Result<()> {
    let log_path = init_tracing()?;
    info!("Running {:?}, logging to {}", args.command, log_path.display());

    let config = config::load_config().context("failed to load configuration")?;

    let db = Database::open(&config.database.path).context("failed to open database")?;
    info!("Database opened at {}", config.database.path);

    let api_key = config.credentials.sportradar_api_key.clone().unwrap_or_else(|| {
        warn!("No sportradar_api_key configured; provider requests will be rejected");
        String::new()
    });
    let client = SportradarClient::new(&config.provider.base_url, &api_key, config.fetch_timeout());
    let engine = Engine::new(db, client, config.fetch_timeout());

    cli::run(&engine, &config, args.command).await
}

const LOG_FILE: &str = "logs/tipper.log";
const DEFAULT_LOG_FILTER: &str = "tipper=info,tipper_core=info,warn";

/// Route tracing output to [`LOG_FILE`]; `RUST_LOG` overrides the filter.
fn init_tracing() -> anyhow::Result<PathBuf> {
    let path = std::env::current_dir()?.join(LOG_FILE);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {e}"))?;

    Ok(path)
}
