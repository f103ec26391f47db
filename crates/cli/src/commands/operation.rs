//! Operation commands: load config, race the request, report.

use std::time::Instant;

use contracts::{EngineBlueprint, EngineRequest, EngineResponse, Metadata, OpContext};
use dispatcher::{create_dispatcher, MultiPdfEngines};
use tracing::{info, warn};

use crate::cli::EngineArgs;
use crate::error::{CliError, Result};
use crate::shutdown;

/// How a successful response is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

/// Execute one operation command
pub async fn run_operation(
    args: &EngineArgs,
    request: EngineRequest,
    output: OutputMode,
) -> Result<()> {
    let operation = request.operation();
    let blueprint = load_blueprint(args)?;
    let dispatcher = create_dispatcher(&blueprint, &args.engines)?;

    info!(
        %operation,
        engines = ?dispatcher.engine_names(),
        timeout_secs = dispatcher.timeout().map(|t| t.as_secs()),
        "Dispatching"
    );

    let ctx = OpContext::new();
    let signal_watcher = shutdown::cancel_on_signal(ctx.clone());
    let started = Instant::now();
    let result = dispatcher.dispatch(&ctx, request).await;
    signal_watcher.abort();

    print_engine_metrics(&dispatcher);

    match result {
        Ok(response) => {
            info!(
                %operation,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Operation completed"
            );
            print_response(response, output)
        }
        Err(e) => {
            if let Some(aggregated) = e.aggregated() {
                if aggregated.is_empty() {
                    eprintln!("✗ {operation}: no engines configured");
                } else if aggregated.all_unsupported() {
                    eprintln!("✗ no configured engine supports {}:", aggregated.operation());
                    for failure in aggregated {
                        eprintln!("  - {}", failure.engine);
                    }
                } else {
                    eprintln!("✗ {operation} failed on every engine:");
                    for failure in aggregated {
                        eprintln!("  - {}: {}", failure.engine, failure.error);
                    }
                }
            } else if e.is_cancelled() {
                warn!(%operation, error = %e, "Operation stopped before any engine succeeded");
            }
            Err(e.into())
        }
    }
}

/// Load the configuration and apply command-line overrides
pub(crate) fn load_blueprint(args: &EngineArgs) -> Result<EngineBlueprint> {
    if !args.config.exists() {
        return Err(CliError::ConfigNotFound {
            path: args.config.clone(),
        });
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config).map_err(
        |source| CliError::Config {
            path: args.config.clone(),
            source,
        },
    )?;

    if let Some(timeout) = args.timeout {
        info!(timeout_secs = timeout, "Overriding request timeout from CLI");
        blueprint.dispatch.timeout_secs = timeout;
    }

    Ok(blueprint)
}

fn print_response(response: EngineResponse, output: OutputMode) -> Result<()> {
    match response {
        EngineResponse::Done => {
            if output == OutputMode::Json {
                println!("{}", serde_json::json!({ "status": "ok" }));
            }
            Ok(())
        }
        EngineResponse::Metadata(metadata) => print_metadata(&metadata, output),
    }
}

fn print_metadata(metadata: &Metadata, output: OutputMode) -> Result<()> {
    match output {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(metadata)?),
        OutputMode::Text => {
            for (key, value) in metadata {
                match value {
                    serde_json::Value::String(s) => println!("{key}: {s}"),
                    other => println!("{key}: {other}"),
                }
            }
        }
    }
    Ok(())
}

fn print_engine_metrics(dispatcher: &MultiPdfEngines) {
    for (engine, snapshot) in dispatcher.metrics() {
        info!(%engine, "{snapshot}");
    }
}
