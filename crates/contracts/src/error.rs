//! Layered error definitions
//!
//! Categorized by source: config (`ContractError`) / engine operations
//! (`EngineError`, `AggregatedError`)

use std::fmt;

use thiserror::Error;

use crate::{CancelReason, OperationKind};

/// Configuration and contract-level error
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error returned by a [`crate::PdfEngine`] operation
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine does not implement the requested operation
    #[error("engine '{engine}' does not support {operation}")]
    MethodNotSupported {
        engine: String,
        operation: OperationKind,
    },

    /// The engine attempted the operation and failed
    #[error("engine '{engine}' failed to {operation}: {message}")]
    Backend {
        engine: String,
        operation: OperationKind,
        message: String,
    },

    /// The engine's external process exited unsuccessfully
    #[error("engine '{engine}' failed to {operation}: '{program}' exited with {status}: {stderr}")]
    Process {
        engine: String,
        operation: OperationKind,
        program: String,
        status: String,
        stderr: String,
    },

    /// Every engine failed; carries one cause per engine
    #[error(transparent)]
    AllEnginesFailed(#[from] AggregatedError),

    /// The request context fired before any engine succeeded
    #[error("{operation} aborted: {reason}")]
    Cancelled {
        operation: OperationKind,
        reason: CancelReason,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal condition
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl EngineError {
    /// Create a method-not-supported error
    pub fn not_supported(engine: impl Into<String>, operation: OperationKind) -> Self {
        Self::MethodNotSupported {
            engine: engine.into(),
            operation,
        }
    }

    /// Create a backend failure
    pub fn backend(
        engine: impl Into<String>,
        operation: OperationKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Backend {
            engine: engine.into(),
            operation,
            message: message.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: OperationKind, reason: CancelReason) -> Self {
        Self::Cancelled { operation, reason }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::MethodNotSupported { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The per-engine causes, when every engine failed
    pub fn aggregated(&self) -> Option<&AggregatedError> {
        match self {
            Self::AllEnginesFailed(aggregated) => Some(aggregated),
            _ => None,
        }
    }
}

/// One engine's failure inside an [`AggregatedError`]
#[derive(Debug)]
pub struct EngineFailure {
    /// Engine name
    pub engine: String,
    /// Why it failed
    pub error: EngineError,
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.engine, self.error)
    }
}

/// Composite error: every engine was asked and every engine failed
///
/// Failures are listed in engine declaration order, one per engine.
#[derive(Debug)]
pub struct AggregatedError {
    operation: OperationKind,
    failures: Vec<EngineFailure>,
}

impl AggregatedError {
    pub fn new(operation: OperationKind, failures: Vec<EngineFailure>) -> Self {
        Self {
            operation,
            failures,
        }
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn failures(&self) -> &[EngineFailure] {
        &self.failures
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EngineFailure> {
        self.failures.iter()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// True when no engine supported the operation at all
    pub fn all_unsupported(&self) -> bool {
        !self.failures.is_empty() && self.failures.iter().all(|f| f.error.is_not_supported())
    }
}

impl fmt::Display for AggregatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "{} failed: no PDF engines configured", self.operation);
        }
        write!(
            f,
            "{} failed across all {} PDF engines: ",
            self.operation,
            self.failures.len()
        )?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregatedError {}

impl<'a> IntoIterator for &'a AggregatedError {
    type Item = &'a EngineFailure;
    type IntoIter = std::slice::Iter<'a, EngineFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregated_display_lists_every_engine() {
        let aggregated = AggregatedError::new(
            OperationKind::Merge,
            vec![
                EngineFailure {
                    engine: "A".into(),
                    error: EngineError::backend("A", OperationKind::Merge, "bad format"),
                },
                EngineFailure {
                    engine: "B".into(),
                    error: EngineError::backend("B", OperationKind::Merge, "timeout"),
                },
            ],
        );

        let msg = aggregated.to_string();
        assert!(msg.starts_with("merge failed across all 2 PDF engines"), "got: {msg}");
        assert!(msg.contains("bad format"));
        assert!(msg.contains("timeout"));
        assert!(!aggregated.all_unsupported());
    }

    #[test]
    fn test_empty_aggregated_display() {
        let aggregated = AggregatedError::new(OperationKind::Convert, Vec::new());
        assert!(aggregated.is_empty());
        assert!(!aggregated.all_unsupported());
        assert_eq!(
            aggregated.to_string(),
            "convert failed: no PDF engines configured"
        );
    }

    #[test]
    fn test_aggregated_is_reachable_from_engine_error() {
        let err: EngineError = AggregatedError::new(
            OperationKind::ReadMetadata,
            vec![EngineFailure {
                engine: "cad2x".into(),
                error: EngineError::not_supported("cad2x", OperationKind::ReadMetadata),
            }],
        )
        .into();

        let aggregated = err.aggregated().unwrap();
        assert_eq!(aggregated.len(), 1);
        assert!(aggregated.all_unsupported());
    }

    #[test]
    fn test_cancelled_display() {
        let err = EngineError::cancelled(OperationKind::Thumbnail, CancelReason::DeadlineExceeded);
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "thumbnail aborted: context deadline exceeded");
    }

    #[test]
    fn test_config_validation_display() {
        let err = ContractError::config_validation("engines[0].id", "engine id cannot be empty");
        assert!(err.to_string().contains("engines[0].id"));
    }
}
