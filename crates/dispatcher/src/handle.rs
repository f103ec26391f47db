//! EngineHandle - one engine plus its metrics, able to start detached attempts

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, debug_span, Instrument};

use contracts::{EngineError, EngineRequest, EngineResponse, OpContext, PdfEngine};
use observability::AttemptStatus;

use crate::metrics::EngineMetrics;

/// One engine's result for one request
#[derive(Debug)]
pub struct Attempt {
    /// Engine position in declaration order
    pub index: usize,
    /// Engine name
    pub engine: String,
    pub outcome: Result<EngineResponse, EngineError>,
}

impl Attempt {
    pub fn status(&self) -> AttemptStatus {
        status_of(&self.outcome)
    }
}

pub(crate) fn status_of<T>(outcome: &Result<T, EngineError>) -> AttemptStatus {
    match outcome {
        Ok(_) => AttemptStatus::Success,
        Err(e) if e.is_not_supported() => AttemptStatus::Unsupported,
        Err(e) if e.is_cancelled() => AttemptStatus::Cancelled,
        Err(_) => AttemptStatus::Failure,
    }
}

/// Handle to one engine in a dispatcher
pub struct EngineHandle {
    /// Engine name
    name: String,
    engine: Arc<dyn PdfEngine>,
    /// Shared metrics
    metrics: Arc<EngineMetrics>,
}

impl EngineHandle {
    pub fn new(engine: Arc<dyn PdfEngine>) -> Self {
        Self {
            name: engine.name().to_string(),
            engine,
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    /// Get engine name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine(&self) -> &Arc<dyn PdfEngine> {
        &self.engine
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Start one detached attempt of `request` on this engine
    ///
    /// The attempt reports exactly once through `tx` and never blocks doing
    /// so: the channel holds one slot per engine. When the receiver is gone
    /// the outcome is counted as discarded and dropped.
    pub fn spawn_attempt(
        &self,
        index: usize,
        request: Arc<EngineRequest>,
        ctx: OpContext,
        tx: mpsc::Sender<Attempt>,
    ) {
        let engine = Arc::clone(&self.engine);
        let metrics = Arc::clone(&self.metrics);
        let name = self.name.clone();
        let operation = request.operation();
        let span = debug_span!(
            parent: ctx.span(),
            "engine_attempt",
            engine = %name,
            operation = %operation
        );

        tokio::spawn(
            async move {
                metrics.inc_attempts();
                let started = Instant::now();
                let outcome = request.invoke(engine.as_ref(), &ctx).await;
                let elapsed = started.elapsed();

                let status = status_of(&outcome);
                metrics.record(status, elapsed);
                observability::record_engine_attempt(&name, operation, status, elapsed);
                match &outcome {
                    Ok(_) => debug!(elapsed_ms = elapsed.as_millis() as u64, "attempt succeeded"),
                    Err(e) => debug!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        %status,
                        error = %e,
                        "attempt failed"
                    ),
                }

                let attempt = Attempt {
                    index,
                    engine: name,
                    outcome,
                };
                if let Err(e) = tx.try_send(attempt) {
                    let attempt = e.into_inner();
                    metrics.inc_discarded();
                    observability::record_outcome_discarded(&attempt.engine, operation);
                    debug!(status = %attempt.status(), "dispatcher already returned, outcome discarded");
                }
            }
            .instrument(span),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use contracts::OperationKind;
    use engines::{MockEngine, MockStep};

    fn merge_request() -> Arc<EngineRequest> {
        Arc::new(EngineRequest::Merge {
            input_paths: vec![PathBuf::from("a.pdf")],
            output_path: PathBuf::from("out.pdf"),
        })
    }

    #[tokio::test]
    async fn test_attempt_reports_once() {
        let handle = EngineHandle::new(Arc::new(
            MockEngine::new("m").with_default(MockStep::fail("bad format")),
        ));
        let (tx, mut rx) = mpsc::channel(1);

        handle.spawn_attempt(3, merge_request(), OpContext::new(), tx);

        let attempt = rx.recv().await.unwrap();
        assert_eq!(attempt.index, 3);
        assert_eq!(attempt.engine, "m");
        assert_eq!(attempt.status(), AttemptStatus::Failure);
        assert!(rx.recv().await.is_none());

        let snapshot = handle.metrics().snapshot();
        assert_eq!(snapshot.attempts, 1);
        assert_eq!(snapshot.failures, 1);
    }

    #[tokio::test]
    async fn test_outcome_after_receiver_dropped_is_discarded() {
        let handle = EngineHandle::new(Arc::new(
            MockEngine::new("late").on(
                OperationKind::Merge,
                MockStep::succeed().after(Duration::from_millis(20)),
            ),
        ));
        let (tx, rx) = mpsc::channel(1);

        handle.spawn_attempt(0, merge_request(), OpContext::new(), tx);
        drop(rx);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let snapshot = handle.metrics().snapshot();
        assert_eq!(snapshot.successes, 1);
        assert_eq!(snapshot.discarded, 1);
    }
}
