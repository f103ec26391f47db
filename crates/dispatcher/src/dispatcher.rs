//! MultiPdfEngines - fan-out race over every configured engine

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn, Span};

use contracts::{
    AggregatedError, EngineBlueprint, EngineError, EngineFailure, EngineRequest, EngineResponse,
    Metadata, OpContext, PageNumber, PdfEngine, PdfFormats,
};
use engines::EngineRegistry;

use crate::error::DispatcherError;
use crate::handle::{status_of, Attempt, EngineHandle};
use crate::metrics::MetricsSnapshot;

const DEFAULT_NAME: &str = "multi";

/// Builder for creating a MultiPdfEngines
pub struct DispatcherBuilder {
    name: String,
    engines: Vec<Arc<dyn PdfEngine>>,
    timeout: Option<Duration>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            engines: Vec::new(),
            timeout: None,
        }
    }

    /// Name reported through `PdfEngine::name`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append one engine to the declaration order
    pub fn engine(mut self, engine: Arc<dyn PdfEngine>) -> Self {
        self.engines.push(engine);
        self
    }

    pub fn engines(mut self, engines: impl IntoIterator<Item = Arc<dyn PdfEngine>>) -> Self {
        self.engines.extend(engines);
        self
    }

    /// Deadline applied to every request (on top of the caller's own)
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> MultiPdfEngines {
        observability::record_engine_count(self.engines.len());
        MultiPdfEngines {
            name: self.name,
            handles: self.engines.into_iter().map(EngineHandle::new).collect(),
            timeout: self.timeout,
        }
    }
}

/// The composite engine: asks every engine, returns the first success
///
/// Implements [`PdfEngine`] itself, so it can stand in for a single engine
/// (including inside another `MultiPdfEngines`).
pub struct MultiPdfEngines {
    name: String,
    handles: Vec<EngineHandle>,
    timeout: Option<Duration>,
}

impl fmt::Debug for MultiPdfEngines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiPdfEngines")
            .field("name", &self.name)
            .field("engines", &self.engine_names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MultiPdfEngines {
    /// Dispatcher over `engines` in the given order, without timeout
    pub fn new(engines: Vec<Arc<dyn PdfEngine>>) -> Self {
        DispatcherBuilder::new().engines(engines).build()
    }

    /// Engine names in declaration order
    pub fn engine_names(&self) -> Vec<&str> {
        self.handles.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Get metrics for all engines
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run `request` against every engine concurrently
    ///
    /// Returns the first success. When every engine fails, returns
    /// [`EngineError::AllEnginesFailed`] listing one failure per engine in
    /// declaration order. When `ctx` fires first, returns
    /// [`EngineError::Cancelled`].
    pub async fn dispatch(
        &self,
        ctx: &OpContext,
        request: EngineRequest,
    ) -> Result<EngineResponse, EngineError> {
        let operation = request.operation();
        let started = Instant::now();

        // A timeout too large to represent as an instant means no deadline.
        let ctx = match self.timeout.and_then(|t| started.checked_add(t)) {
            Some(at) => ctx.child().deadline(at),
            None => ctx.clone(),
        };
        let result = self.race(&ctx, request).await;

        observability::record_dispatch(operation, status_of(&result), started.elapsed());
        result
    }

    #[instrument(
        name = "multi_pdf_engines_dispatch",
        skip(self, ctx, request),
        fields(dispatcher = %self.name, operation = %request.operation(), engines = self.handles.len())
    )]
    async fn race(
        &self,
        ctx: &OpContext,
        request: EngineRequest,
    ) -> Result<EngineResponse, EngineError> {
        let operation = request.operation();

        if self.handles.is_empty() {
            warn!("no PDF engines configured");
            return Err(AggregatedError::new(operation, Vec::new()).into());
        }
        if let Some(reason) = ctx.cancel_reason() {
            return Err(EngineError::cancelled(operation, reason));
        }

        // Attempts still running when this returns see their context cancelled.
        let attempt_ctx = ctx.child().with_span(Span::current());
        let _cancel_leftovers = attempt_ctx.token().clone().drop_guard();

        let request = Arc::new(request);
        let (tx, mut rx) = mpsc::channel::<Attempt>(self.handles.len());
        for (index, handle) in self.handles.iter().enumerate() {
            handle.spawn_attempt(index, Arc::clone(&request), attempt_ctx.clone(), tx.clone());
        }
        drop(tx);

        let mut failures: Vec<Option<EngineError>> =
            std::iter::repeat_with(|| None).take(self.handles.len()).collect();

        loop {
            tokio::select! {
                biased;
                reason = ctx.done() => {
                    warn!(%reason, "context done before any engine succeeded");
                    return Err(EngineError::cancelled(operation, reason));
                }
                attempt = rx.recv() => match attempt {
                    Some(Attempt { engine, outcome: Ok(response), .. }) => {
                        info!(engine = %engine, "engine succeeded");
                        return Ok(response);
                    }
                    Some(Attempt { index, engine, outcome: Err(error) }) => {
                        debug!(engine = %engine, error = %error, "engine failed, waiting for others");
                        if let Some(slot) = failures.get_mut(index) {
                            *slot = Some(error);
                        }
                    }
                    // Every attempt has reported or vanished
                    None => break,
                },
            }
        }

        let failures = self
            .handles
            .iter()
            .zip(failures)
            .map(|(handle, error)| EngineFailure {
                engine: handle.name().to_string(),
                error: error.unwrap_or_else(|| {
                    EngineError::internal(format!(
                        "engine '{}' stopped without reporting an outcome",
                        handle.name()
                    ))
                }),
            })
            .collect();

        let aggregated = AggregatedError::new(operation, failures);
        warn!(error = %aggregated, "all PDF engines failed");
        Err(aggregated.into())
    }
}

#[async_trait]
impl PdfEngine for MultiPdfEngines {
    fn name(&self) -> &str {
        &self.name
    }

    async fn merge(
        &self,
        ctx: &OpContext,
        input_paths: &[PathBuf],
        output_path: &Path,
    ) -> Result<(), EngineError> {
        let request = EngineRequest::Merge {
            input_paths: input_paths.to_vec(),
            output_path: output_path.to_path_buf(),
        };
        self.dispatch(ctx, request).await.map(drop)
    }

    async fn linearize(
        &self,
        ctx: &OpContext,
        input_paths: &[PathBuf],
        output_path: &Path,
    ) -> Result<(), EngineError> {
        let request = EngineRequest::Linearize {
            input_paths: input_paths.to_vec(),
            output_path: output_path.to_path_buf(),
        };
        self.dispatch(ctx, request).await.map(drop)
    }

    async fn thumbnail(
        &self,
        ctx: &OpContext,
        input_paths: &[PathBuf],
        output_path: &Path,
        page: PageNumber,
    ) -> Result<(), EngineError> {
        let request = EngineRequest::Thumbnail {
            input_paths: input_paths.to_vec(),
            output_path: output_path.to_path_buf(),
            page,
        };
        self.dispatch(ctx, request).await.map(drop)
    }

    async fn render_image(
        &self,
        ctx: &OpContext,
        input_paths: &[PathBuf],
        output_path: &Path,
        page: PageNumber,
        monochrome: bool,
    ) -> Result<(), EngineError> {
        let request = EngineRequest::RenderImage {
            input_paths: input_paths.to_vec(),
            output_path: output_path.to_path_buf(),
            page,
            monochrome,
        };
        self.dispatch(ctx, request).await.map(drop)
    }

    async fn convert(
        &self,
        ctx: &OpContext,
        formats: PdfFormats,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<(), EngineError> {
        let request = EngineRequest::Convert {
            formats,
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
        };
        self.dispatch(ctx, request).await.map(drop)
    }

    async fn read_metadata(
        &self,
        ctx: &OpContext,
        input_path: &Path,
    ) -> Result<Metadata, EngineError> {
        let request = EngineRequest::ReadMetadata {
            input_path: input_path.to_path_buf(),
        };
        self.dispatch(ctx, request)
            .await
            .and_then(EngineResponse::into_metadata)
    }

    async fn write_metadata(
        &self,
        ctx: &OpContext,
        metadata: &Metadata,
        input_path: &Path,
    ) -> Result<(), EngineError> {
        let request = EngineRequest::WriteMetadata {
            metadata: metadata.clone(),
            input_path: input_path.to_path_buf(),
        };
        self.dispatch(ctx, request).await.map(drop)
    }
}

/// Convenience function to create a dispatcher from a blueprint
///
/// `engine_order` selects and reorders engines by id; empty means every
/// enabled engine in declaration order.
#[instrument(name = "dispatcher_create", skip(blueprint), fields(engine_count = blueprint.engines.len()))]
pub fn create_dispatcher(
    blueprint: &EngineBlueprint,
    engine_order: &[String],
) -> Result<MultiPdfEngines, DispatcherError> {
    let registry = EngineRegistry::from_blueprint(blueprint)?;
    let engines = if engine_order.is_empty() {
        registry.into_engines()
    } else {
        registry.select(engine_order)?
    };

    if engines.is_empty() {
        warn!("dispatcher has no engines, every request will fail");
    }

    Ok(DispatcherBuilder::new()
        .engines(engines)
        .timeout(blueprint.dispatch.timeout())
        .build())
}
