//! Dispatcher error types

use engines::EngineFactoryError;
use thiserror::Error;

/// Dispatcher construction errors
///
/// Request-time failures are reported as `contracts::EngineError`.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Engine provisioning or selection failed
    #[error("failed to set up PDF engines: {0}")]
    Engines(#[from] EngineFactoryError),
}
