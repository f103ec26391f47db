//! Error types for CLI operations.

use std::path::PathBuf;

use contracts::{ContractError, EngineError};
use dispatcher::DispatcherError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", .path.display())]
    ConfigNotFound { path: PathBuf },

    /// Configuration could not be loaded
    #[error("Failed to load config from {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ContractError,
    },

    /// Engines could not be provisioned
    #[error(transparent)]
    Setup(#[from] DispatcherError),

    /// The operation failed on every engine, or was cancelled
    #[error("Operation failed: {0}")]
    Operation(#[from] EngineError),

    /// Output serialization error
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
