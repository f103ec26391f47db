//! # pdfengines CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - One subcommand per PDF operation, raced across the configured engines
//! - Cancellation on Ctrl+C / SIGTERM

mod cli;
mod commands;
mod error;
mod shutdown;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::debug;

use cli::{Cli, Commands};
use commands::{run_info, run_operation, run_validate, OutputMode};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (engine binary paths usually live there)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(
        ObservabilityConfig {
            log_format: cli.log_format.into(),
            metrics_port: cli.metrics_port,
            ..ObservabilityConfig::default()
        }
        .with_verbosity(cli.verbose, cli.quiet),
    )?;

    debug!(version = env!("CARGO_PKG_VERSION"), "pdfengines starting");

    let result = match &cli.command {
        Commands::Merge(args) => {
            run_operation(&args.engine, args.request(), OutputMode::Text).await
        }
        Commands::Linearize(args) => {
            run_operation(&args.engine, args.request(), OutputMode::Text).await
        }
        Commands::Thumbnail(args) => {
            run_operation(&args.engine, args.request(), OutputMode::Text).await
        }
        Commands::Render(args) => {
            run_operation(&args.engine, args.request(), OutputMode::Text).await
        }
        Commands::Convert(args) => {
            run_operation(&args.engine, args.request(), OutputMode::Text).await
        }
        Commands::ReadMetadata(args) => {
            let output = if args.json {
                OutputMode::Json
            } else {
                OutputMode::Text
            };
            run_operation(&args.engine, args.request(), output).await
        }
        Commands::WriteMetadata(args) => {
            run_operation(&args.engine, args.request(), OutputMode::Text).await
        }
        Commands::Validate(args) => return log_failure(run_validate(args)),
        Commands::Info(args) => return log_failure(run_info(args)),
    };

    log_failure(result.map_err(anyhow::Error::from))
}

fn log_failure(result: Result<()>) -> Result<()> {
    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}
