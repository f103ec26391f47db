//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{EngineBlueprint, EngineKind};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    timeout_secs: u64,
    engine_count: usize,
    enabled_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    timeout_secs: blueprint.dispatch.timeout_secs,
                    engine_count: blueprint.engines.len(),
                    enabled_count: blueprint.enabled_engines().count(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &EngineBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.enabled_engines().next().is_none() {
        warnings.push("No enabled engines - every operation will fail".to_string());
    }

    if blueprint.dispatch.timeout().is_none() {
        warnings.push("dispatch.timeout_secs is 0 - a stuck engine can block forever".to_string());
    }

    for engine in blueprint.enabled_engines() {
        if let Some(env_var) = engine.kind.env_var() {
            if engine.bin_path.is_none() && std::env::var_os(env_var).is_none() {
                warnings.push(format!(
                    "Engine '{}' has no bin_path and {} is not set",
                    engine.id, env_var
                ));
            }
        }
        if engine.kind == EngineKind::Mock {
            warnings.push(format!("Engine '{}' is a mock engine", engine.id));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Timeout: {}s", summary.timeout_secs);
            println!(
                "  Engines: {} ({} enabled)",
                summary.engine_count, summary.enabled_count
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_reports_duplicate() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            "[[engines]]\nid = \"x\"\nkind = \"mock\"\n[[engines]]\nid = \"x\"\nkind = \"mock\"\n"
        )
        .unwrap();
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("duplicate"));
    }

    #[test]
    fn test_warnings_for_empty_engine_set() {
        let blueprint: EngineBlueprint = serde_json::from_str("{}").unwrap();
        let warnings = collect_warnings(&blueprint);
        assert!(warnings.iter().any(|w| w.contains("No enabled engines")));
    }
}
