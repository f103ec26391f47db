//! OpContext - request-scoped cancellation signal
//!
//! Wraps a [`CancellationToken`] and an optional deadline. Both are observed
//! through the same API so callers never need to distinguish "cancelled by the
//! caller" from "deadline expired" until they report it.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Span;

/// Why a context stopped being live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// Explicitly cancelled by the caller
    Cancelled,
    /// The request deadline passed
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => f.write_str("context cancelled"),
            CancelReason::DeadlineExceeded => f.write_str("context deadline exceeded"),
        }
    }
}

/// Cancellation-aware execution context passed to every engine operation
///
/// Cloning is cheap; clones share the same token and deadline. The transition
/// from live to done happens once and is irreversible.
#[derive(Debug, Clone)]
pub struct OpContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    span: Span,
}

impl Default for OpContext {
    fn default() -> Self {
        Self::new()
    }
}

impl OpContext {
    /// Live context without deadline, logging into the current span
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// Context driven by an externally owned token
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
            span: Span::current(),
        }
    }

    /// Context that expires `timeout` from now
    ///
    /// A timeout too far out to represent leaves the context without deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(at) => Self::new().deadline(at),
            None => Self::new(),
        }
    }

    /// Set (or tighten) the deadline
    ///
    /// An existing earlier deadline is kept.
    pub fn deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(at),
            None => at,
        });
        self
    }

    /// Attach the span operations should log into
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Child context: cancelled with its parent, cancellable on its own
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            span: self.span.clone(),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline_at(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Cancel this context (and every child)
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Non-blocking poll
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.cancel_reason().is_some()
    }

    /// Wait until the context is cancelled or its deadline passes
    pub async fn done(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => CancelReason::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CancelReason::Cancelled
            }
        }
    }
}
