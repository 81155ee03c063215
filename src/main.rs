//! `cmdbus` - a file-based command bus
//!
//! Producers append `NAME {json}` lines to a shared file; the bus drains it,
//! dispatches each line to a capability handler and emits the resulting host
//! calls as JSON lines on stdout. Logs go to stderr.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use cmdbus_core::client::BridgeClient;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli::config::resolve_config_path(cli.config.as_deref())?;
    let overrides = cli.overrides();

    match cli.command {
        Commands::Run => cli::service::handle_run(config_path, overrides).await?,
        Commands::Drain { dry_run } => {
            let config = cli::config::load_effective(&config_path, &overrides)?;
            cli::service::handle_drain(config, dry_run).await?
        }
        Commands::Send { cmd } => {
            let config = cli::config::load_effective(&config_path, &overrides)?;
            cli::send::handle_send(&BridgeClient::from_config(&config), cmd)?
        }
        Commands::Config { cmd } => cli::config::handle_config(cmd, &config_path, &overrides)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
