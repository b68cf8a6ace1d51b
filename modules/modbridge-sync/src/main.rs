use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use modbridge_core::{load_config, AppConfig};
use modbridge_ledger::Ledger;
use modbridge_sync::clients::{MailboxSource, TrackerClient};
use modbridge_sync::deps::BridgeDeps;
use modbridge_sync::runner::Runner;
use modmail_client::ModmailClient;
use rt_client::RtClient;

#[derive(Parser)]
#[command(name = "modbridge", about = "Moderation mailbox to ticket tracker bridge")]
struct Cli {
    /// Path to behavior config TOML file
    #[arg(long, default_value = "./config/modbridge.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll both backends on an interval (the default)
    Run,
    /// Run a single sync cycle, print its stats, and exit
    Once,
    /// Bring up the ledger schema and exit
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("modbridge=info".parse()?))
        .init();

    info!("Modbridge starting...");

    let cli = Cli::parse();

    // Secrets and endpoints from env vars
    let env = AppConfig::from_env()?;

    // Connect the ledger and bring the schema up to date
    let ledger = Ledger::connect(&env.database_url)
        .await
        .context("connecting ledger database")?;
    ledger.migrate().await.context("migrating ledger schema")?;

    if matches!(cli.command, Some(Command::InitDb)) {
        info!("Ledger schema ready");
        return Ok(());
    }

    // Behavior config from TOML
    let config = load_config(&cli.config).with_context(|| {
        format!(
            "Config file not found: {}. Create one or specify --config <path>",
            cli.config.display()
        )
    })?;
    info!(config = %cli.config.display(), "Loaded behavior config");

    // Backend clients
    let mailbox = MailboxSource::new(ModmailClient::new(&env.mailbox_url, &env.mailbox_token)?);
    let tracker = TrackerClient::new(RtClient::new(
        &env.tracker_url,
        &env.tracker_user,
        &env.tracker_password,
    )?);

    let deps = BridgeDeps {
        source: Arc::new(mailbox),
        tracker: Arc::new(tracker),
        ledger,
        config: Arc::new(config),
    };

    let mut runner = Runner::new(deps);

    match cli.command {
        Some(Command::Once) => {
            let stats = runner.run_cycle().await?;
            info!("Cycle complete. {stats}");
        }
        // `run` and no subcommand both mean the polling loop
        _ => {
            if let Err(e) = runner.run_loop().await {
                error!(error = %e, "Bridge stopped on fatal error");
                return Err(e.into());
            }
        }
    }

    Ok(())
}
