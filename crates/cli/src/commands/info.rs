//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{EngineBlueprint, EngineConfig, EngineKind, OperationKind};
use engines::registry::resolve_bin_path_with;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    timeout_secs: u64,
    engines: Vec<EngineInfo>,
}

#[derive(Serialize)]
struct EngineInfo {
    id: String,
    kind: EngineKind,
    enabled: bool,
    operations: Vec<OperationKind>,
    binary: BinaryStatus,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum BinaryStatus {
    /// The engine runs in-process
    NotRequired,
    Found { path: String },
    Missing { path: String },
    Unresolved { reason: String },
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint, |var| std::env::var(var).ok());
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

/// Operations an engine kind implements
fn supported_operations(kind: EngineKind) -> Vec<OperationKind> {
    match kind {
        EngineKind::QPdf => vec![OperationKind::Merge, OperationKind::Linearize],
        EngineKind::PdfToCairo => vec![OperationKind::Thumbnail, OperationKind::RenderImage],
        EngineKind::Cad2X => vec![OperationKind::Convert],
        EngineKind::Mock => OperationKind::ALL.to_vec(),
    }
}

fn binary_status<F>(config: &EngineConfig, env: F) -> BinaryStatus
where
    F: Fn(&str) -> Option<String>,
{
    match resolve_bin_path_with(config, env) {
        Ok(None) => BinaryStatus::NotRequired,
        Ok(Some(path)) if path.exists() => BinaryStatus::Found {
            path: path.display().to_string(),
        },
        Ok(Some(path)) => BinaryStatus::Missing {
            path: path.display().to_string(),
        },
        Err(e) => BinaryStatus::Unresolved {
            reason: e.to_string(),
        },
    }
}

fn build_config_info<F>(blueprint: &EngineBlueprint, env: F) -> ConfigInfo
where
    F: Fn(&str) -> Option<String>,
{
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        timeout_secs: blueprint.dispatch.timeout_secs,
        engines: blueprint
            .engines
            .iter()
            .map(|engine| EngineInfo {
                id: engine.id.clone(),
                kind: engine.kind,
                enabled: engine.enabled,
                operations: supported_operations(engine.kind),
                binary: binary_status(engine, &env),
            })
            .collect(),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("PDF engines");
    println!("   ├─ Version: {}", info.version);
    match info.timeout_secs {
        0 => println!("   └─ Timeout: none"),
        secs => println!("   └─ Timeout: {secs}s"),
    }

    println!("\nEngines ({}), in dispatch order", info.engines.len());
    for (i, engine) in info.engines.iter().enumerate() {
        let is_last = i == info.engines.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        let state = if engine.enabled { "" } else { " [disabled]" };
        println!("   {} {} ({}){}", prefix, engine.id, engine.kind, state);

        let operations: Vec<&str> = engine.operations.iter().map(|op| op.as_str()).collect();
        println!("   {}  ├─ Operations: {}", child_prefix, operations.join(", "));
        let binary = match &engine.binary {
            BinaryStatus::NotRequired => "in-process".to_string(),
            BinaryStatus::Found { path } => path.clone(),
            BinaryStatus::Missing { path } => format!("{path} (missing)"),
            BinaryStatus::Unresolved { reason } => reason.clone(),
        };
        println!("   {}  └─ Binary: {}", child_prefix, binary);
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_resolves_binaries() {
        let blueprint: EngineBlueprint = serde_json::from_str(
            r#"{
                "engines": [
                    { "id": "m", "kind": "mock" },
                    { "id": "q", "kind": "qpdf" },
                    { "id": "c", "kind": "pdftocairo" }
                ]
            }"#,
        )
        .unwrap();
        let info = build_config_info(&blueprint, |var| {
            (var == "QPDF_BIN_PATH").then(|| "/nonexistent/qpdf".to_string())
        });

        assert!(matches!(info.engines[0].binary, BinaryStatus::NotRequired));
        assert_eq!(info.engines[0].operations.len(), 7);
        assert!(matches!(info.engines[1].binary, BinaryStatus::Missing { .. }));
        assert!(matches!(
            info.engines[2].binary,
            BinaryStatus::Unresolved { ref reason } if reason.contains("PDFTOCAIRO_BIN_PATH")
        ));
    }
}
