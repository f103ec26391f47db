//! Configuration validation
//!
//! Rules:
//! - engine ids are non-empty and unique
//! - `bin_path`, when given, is non-empty
//! - mock engines take no `bin_path`
//! - only mock engines take `params`
//! - `dispatch.timeout_secs` stays within `DispatchConfig::MAX_TIMEOUT_SECS`

use std::collections::HashSet;

use contracts::{ContractError, DispatchConfig, EngineBlueprint, EngineKind};

/// Validate an EngineBlueprint
///
/// Returns the first error encountered.
pub fn validate(blueprint: &EngineBlueprint) -> Result<(), ContractError> {
    validate_dispatch(blueprint)?;
    validate_engine_ids(blueprint)?;
    validate_bin_paths(blueprint)?;
    validate_params(blueprint)?;
    Ok(())
}

fn validate_dispatch(blueprint: &EngineBlueprint) -> Result<(), ContractError> {
    if blueprint.dispatch.timeout_secs > DispatchConfig::MAX_TIMEOUT_SECS {
        return Err(ContractError::config_validation(
            "dispatch.timeout_secs",
            format!(
                "timeout must be at most {} seconds, got {}",
                DispatchConfig::MAX_TIMEOUT_SECS,
                blueprint.dispatch.timeout_secs
            ),
        ));
    }
    Ok(())
}

fn validate_engine_ids(blueprint: &EngineBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, engine) in blueprint.engines.iter().enumerate() {
        if engine.id.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("engines[{idx}].id"),
                "engine id cannot be empty",
            ));
        }
        if !seen.insert(engine.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("engines[id={}]", engine.id),
                "duplicate engine id",
            ));
        }
    }
    Ok(())
}

fn validate_bin_paths(blueprint: &EngineBlueprint) -> Result<(), ContractError> {
    for engine in &blueprint.engines {
        let Some(path) = &engine.bin_path else {
            continue;
        };
        if engine.kind == EngineKind::Mock {
            return Err(ContractError::config_validation(
                format!("engines[{}].bin_path", engine.id),
                "mock engines run no binary",
            ));
        }
        if path.as_os_str().is_empty() {
            return Err(ContractError::config_validation(
                format!("engines[{}].bin_path", engine.id),
                "bin_path cannot be empty",
            ));
        }
    }
    Ok(())
}

fn validate_params(blueprint: &EngineBlueprint) -> Result<(), ContractError> {
    for engine in &blueprint.engines {
        if engine.kind != EngineKind::Mock && !engine.params.is_empty() {
            return Err(ContractError::config_validation(
                format!("engines[{}].params", engine.id),
                format!("{} engines take no parameters", engine.kind),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ConfigVersion, EngineConfig};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn engine(id: &str, kind: EngineKind) -> EngineConfig {
        EngineConfig {
            id: id.into(),
            kind,
            bin_path: None,
            enabled: true,
            params: HashMap::new(),
        }
    }

    fn blueprint(engines: Vec<EngineConfig>) -> EngineBlueprint {
        EngineBlueprint {
            version: ConfigVersion::V1,
            dispatch: DispatchConfig::default(),
            engines,
        }
    }

    #[test]
    fn test_valid_blueprint() {
        let mut qpdf = engine("qpdf", EngineKind::QPdf);
        qpdf.bin_path = Some(PathBuf::from("/usr/bin/qpdf"));
        let bp = blueprint(vec![qpdf, engine("mock", EngineKind::Mock)]);
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_empty_engine_list_is_valid() {
        assert!(validate(&blueprint(Vec::new())).is_ok());
    }

    #[test]
    fn test_timeout_upper_bound() {
        let mut bp = blueprint(vec![engine("m", EngineKind::Mock)]);
        bp.dispatch.timeout_secs = DispatchConfig::MAX_TIMEOUT_SECS;
        assert!(validate(&bp).is_ok());

        bp.dispatch.timeout_secs = u64::MAX;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("dispatch.timeout_secs"));
    }

    #[test]
    fn test_duplicate_engine_id() {
        let bp = blueprint(vec![
            engine("a", EngineKind::Mock),
            engine("a", EngineKind::QPdf),
        ]);
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("duplicate engine id"));
    }

    #[test]
    fn test_empty_engine_id() {
        let bp = blueprint(vec![engine("  ", EngineKind::Cad2X)]);
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("engines[0].id"));
    }

    #[test]
    fn test_mock_with_bin_path() {
        let mut mock = engine("m", EngineKind::Mock);
        mock.bin_path = Some(PathBuf::from("/bin/true"));
        let err = validate(&blueprint(vec![mock])).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_empty_bin_path() {
        let mut cairo = engine("cairo", EngineKind::PdfToCairo);
        cairo.bin_path = Some(PathBuf::new());
        let err = validate(&blueprint(vec![cairo])).unwrap_err();
        assert!(err.to_string().contains("bin_path cannot be empty"));
    }

    #[test]
    fn test_params_on_process_engine() {
        let mut cad = engine("cad", EngineKind::Cad2X);
        cad.params.insert("behavior".into(), "hang".into());
        let err = validate(&blueprint(vec![cad])).unwrap_err();
        assert!(err.to_string().contains("cad2x engines take no parameters"));
    }
}
