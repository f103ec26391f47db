//! Engine provisioning error types

use std::path::PathBuf;

use contracts::{ContractError, EngineKind};
use thiserror::Error;

/// Engine provisioning specific error
#[derive(Debug, Error)]
pub enum EngineFactoryError {
    /// Neither the configuration nor the environment names a binary
    #[error("engine '{engine}' ({kind}): binary path not set, configure bin_path or {env_var}")]
    BinPathNotSet {
        engine: String,
        kind: EngineKind,
        env_var: &'static str,
    },

    /// The configured binary does not exist
    #[error("engine '{engine}': binary path does not exist: {}", .path.display())]
    BinaryNotFound { engine: String, path: PathBuf },

    /// Invalid kind-specific parameter
    #[error("engine '{engine}': invalid parameter '{key}': {message}")]
    InvalidParam {
        engine: String,
        key: String,
        message: String,
    },

    /// An engine name appears more than once
    #[error("engine '{name}' is listed more than once")]
    DuplicateEngine { name: String },

    /// Lookup of an engine that was never registered
    #[error("unknown engine '{name}'")]
    UnknownEngine { name: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl EngineFactoryError {
    /// Create invalid parameter error
    pub fn invalid_param(
        engine: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParam {
            engine: engine.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, EngineFactoryError>;
