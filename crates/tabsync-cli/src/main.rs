//! tabsync CLI - drive tab-group reconciliation from the terminal
//!
//! An offline harness: the browser state lives in a JSON file and the two
//! storage scopes in a store directory, so every engine operation can be
//! exercised end to end without a browser.

mod cli;
mod commands;
mod error;

use clap::Parser;

use cli::{Cli, Commands};
use commands::CliContext;
use error::CliError;

/// Targets follow the crate names, underscores included.
const DEFAULT_LOG_FILTER: &str = "tabsync_core=info,tabsync_cli=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let ctx = CliContext::open(&cli.store, &cli.browser)?;

    match cli.command {
        Commands::Push => commands::sync_ops::run_push(&ctx).await?,
        Commands::Pull => commands::sync_ops::run_pull(&ctx).await?,
        Commands::Merge => commands::sync_ops::run_merge(&ctx).await?,
        Commands::Groups { json } => commands::groups::run_groups(&ctx, json).await?,
        Commands::Export { select, output } => {
            commands::export::run_export(&ctx, select.as_deref(), output.as_deref()).await?;
        }
        Commands::Import { input } => commands::import::run_import(&ctx, &input).await?,
    }

    Ok(())
}
