//! Engine dispatch metrics
//!
//! Prometheus-facing counters and histograms for engine attempts and
//! dispatched requests, plus in-memory running statistics.

use std::fmt;
use std::time::Duration;

use contracts::OperationKind;
use metrics::{counter, gauge, histogram};

/// Outcome class of one engine attempt or one dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptStatus {
    Success,
    Failure,
    /// The engine does not implement the operation
    Unsupported,
    /// The request context fired first
    Cancelled,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Success => "success",
            AttemptStatus::Failure => "failure",
            AttemptStatus::Unsupported => "unsupported",
            AttemptStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record one engine attempt
///
/// Called once per (engine, request) when the attempt reports, whether or not
/// the dispatcher still waits for it.
pub fn record_engine_attempt(
    engine: &str,
    operation: OperationKind,
    status: AttemptStatus,
    latency: Duration,
) {
    counter!(
        "pdfengines_engine_attempts_total",
        "engine" => engine.to_string(),
        "operation" => operation.as_str(),
        "status" => status.as_str()
    )
    .increment(1);

    histogram!(
        "pdfengines_engine_latency_ms",
        "engine" => engine.to_string(),
        "operation" => operation.as_str()
    )
    .record(latency.as_secs_f64() * 1000.0);
}

/// Record one dispatched request and its overall result
pub fn record_dispatch(operation: OperationKind, status: AttemptStatus, latency: Duration) {
    counter!(
        "pdfengines_dispatch_total",
        "operation" => operation.as_str(),
        "status" => status.as_str()
    )
    .increment(1);

    histogram!(
        "pdfengines_dispatch_latency_ms",
        "operation" => operation.as_str()
    )
    .record(latency.as_secs_f64() * 1000.0);
}

/// Record an outcome that arrived after the dispatcher had already returned
pub fn record_outcome_discarded(engine: &str, operation: OperationKind) {
    counter!(
        "pdfengines_outcomes_discarded_total",
        "engine" => engine.to_string(),
        "operation" => operation.as_str()
    )
    .increment(1);
}

/// Record the number of engines a dispatcher fans out to
pub fn record_engine_count(count: usize) {
    gauge!("pdfengines_engines_configured").set(count as f64);
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [12.0, 48.0, 30.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 3);
        assert!((stats.mean() - 30.0).abs() < 1e-10);
        assert!((stats.min() - 12.0).abs() < 1e-10);
        assert!((stats.max() - 48.0).abs() < 1e-10);
        assert!((stats.variance() - 324.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        assert_eq!(RunningStats::default().summary().to_string(), "N/A");

        let mut stats = RunningStats::default();
        stats.push(10.0);
        let output = stats.summary().to_string();
        assert!(output.contains("mean=10.000"));
        assert!(output.contains("(n=1)"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_engine_attempt(
            "qpdf",
            OperationKind::Merge,
            AttemptStatus::Failure,
            Duration::from_millis(3),
        );
        record_dispatch(
            OperationKind::Merge,
            AttemptStatus::Success,
            Duration::from_millis(5),
        );
        record_outcome_discarded("qpdf", OperationKind::Merge);
        record_engine_count(2);
    }
}
