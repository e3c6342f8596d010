//! SmartCal - natural-language calendar assistant
//!
//! Main entry point for the command-line client.

use std::process::ExitCode;

use clap::Parser;
use smartcal_app::cli::{self, Cli};
use smartcal_app::utils::logging::init_tracing;
use smartcal_app::AppContext;
use smartcal_domain::Config;
use smartcal_infra::config;
use tracing::{debug, error};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %err, "smartcal failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<bool> {
    // Load .env before clap reads env-backed arguments
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs)?;
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(err) => debug!(error = %err, "No .env file loaded"),
    }

    let config = load_config(&cli)?;
    let ctx = AppContext::new(config)?;
    cli::run(cli.command, &ctx).await
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => config::apply_env_overrides(config::load_from_file(Some(path.clone()))?)?,
        None => config::load()?,
    };
    debug!(backend = %config.backend.resolved_base_url(), "Configuration loaded");
    Ok(config)
}
