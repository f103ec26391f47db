//! Engine metrics for observability

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use observability::{AttemptStatus, RunningStats, StatsSummary};

/// Metrics for a single engine, shared by every request of one dispatcher
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Attempts started
    attempts: AtomicU64,
    /// Attempts that succeeded
    successes: AtomicU64,
    /// Attempts that failed (excluding unsupported)
    failures: AtomicU64,
    /// Attempts answered with `MethodNotSupported`
    unsupported: AtomicU64,
    /// Attempts that stopped because the context fired
    cancelled: AtomicU64,
    /// Outcomes that arrived after the dispatcher had returned
    discarded: AtomicU64,
    /// Attempt latency in milliseconds
    latency_ms: Mutex<RunningStats>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn inc_attempts(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn unsupported(&self) -> u64 {
        self.unsupported.load(Ordering::Relaxed)
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    pub fn inc_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished attempt
    pub fn record(&self, status: AttemptStatus, latency: Duration) {
        let counter = match status {
            AttemptStatus::Success => &self.successes,
            AttemptStatus::Failure => &self.failures,
            AttemptStatus::Unsupported => &self.unsupported,
            AttemptStatus::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        self.latency_ms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(latency.as_secs_f64() * 1000.0);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts(),
            successes: self.successes(),
            failures: self.failures(),
            unsupported: self.unsupported(),
            cancelled: self.cancelled(),
            discarded: self.discarded(),
            latency_ms: self
                .latency_ms
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .summary(),
        }
    }
}

/// Snapshot of engine metrics (for reporting)
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub unsupported: u64,
    pub cancelled: u64,
    pub discarded: u64,
    pub latency_ms: StatsSummary,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempts={} ok={} failed={} unsupported={} cancelled={} discarded={} latency_ms: {}",
            self.attempts,
            self.successes,
            self.failures,
            self.unsupported,
            self.cancelled,
            self.discarded,
            self.latency_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_routes_by_status() {
        let metrics = EngineMetrics::new();
        metrics.inc_attempts();
        metrics.inc_attempts();
        metrics.record(AttemptStatus::Success, Duration::from_millis(20));
        metrics.record(AttemptStatus::Unsupported, Duration::from_millis(0));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.attempts, 2);
        assert_eq!(snapshot.successes, 1);
        assert_eq!(snapshot.unsupported, 1);
        assert_eq!(snapshot.failures, 0);
        assert_eq!(snapshot.latency_ms.count, 2);
        assert!(snapshot.to_string().contains("ok=1"));
    }
}
