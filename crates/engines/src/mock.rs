//! Mock engine
//!
//! Scriptable in-memory engine for unit tests and demos. Each operation can be
//! given a delay and a behaviour; calls are counted.
//!
//! The mock does not observe the `OpContext`: a delayed or hanging call runs
//! until it finishes on its own, like an uncooperative backend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use contracts::{
    EngineError, Metadata, OpContext, OperationKind, PageNumber, PdfEngine, PdfFormats,
};
use tracing::{debug, instrument};

use crate::error::{EngineFactoryError, Result};

/// What a mocked call does once its delay has elapsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MockBehavior {
    #[default]
    Succeed,
    /// Fail with a backend error carrying this message
    Fail(String),
    /// Report `MethodNotSupported`
    Unsupported,
    /// Never complete
    Hang,
}

impl FromStr for MockBehavior {
    type Err = String;

    /// `succeed`, `unsupported`, `hang` or `fail:<message>`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "succeed" => Ok(Self::Succeed),
            "unsupported" => Ok(Self::Unsupported),
            "hang" => Ok(Self::Hang),
            "fail" => Ok(Self::Fail("mock failure".into())),
            other => match other.strip_prefix("fail:") {
                Some(message) => Ok(Self::Fail(message.trim().to_string())),
                None => Err(format!(
                    "expected succeed, unsupported, hang or fail:<message>, got '{other}'"
                )),
            },
        }
    }
}

/// Delay plus behaviour for one operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockStep {
    pub delay: Duration,
    pub behavior: MockBehavior,
}

impl MockStep {
    pub fn succeed() -> Self {
        Self::default()
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Fail(message.into()),
            ..Self::default()
        }
    }

    pub fn unsupported() -> Self {
        Self {
            behavior: MockBehavior::Unsupported,
            ..Self::default()
        }
    }

    pub fn hang() -> Self {
        Self {
            behavior: MockBehavior::Hang,
            ..Self::default()
        }
    }

    /// Apply the behaviour after `delay`
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Mock engine
#[derive(Debug)]
pub struct MockEngine {
    name: String,
    /// Step for operations without an override
    default_step: MockStep,
    steps: HashMap<OperationKind, MockStep>,
    metadata: Metadata,
    calls: HashMap<OperationKind, AtomicUsize>,
    completed: AtomicUsize,
}

impl MockEngine {
    /// Engine that succeeds immediately on every operation
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_step: MockStep::default(),
            steps: HashMap::new(),
            metadata: Metadata::new(),
            calls: OperationKind::ALL
                .into_iter()
                .map(|op| (op, AtomicUsize::new(0)))
                .collect(),
            completed: AtomicUsize::new(0),
        }
    }

    /// Step used by every operation without its own override
    pub fn with_default(mut self, step: MockStep) -> Self {
        self.default_step = step;
        self
    }

    /// Override one operation
    pub fn on(mut self, operation: OperationKind, step: MockStep) -> Self {
        self.steps.insert(operation, step);
        self
    }

    /// Payload returned by a successful `read_metadata`
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Build from configuration parameters
    ///
    /// Recognised keys:
    /// - `behavior`, `delay_ms`: default step
    /// - `<operation>.behavior`, `<operation>.delay_ms`: per-operation override
    /// - `metadata.<key>`: metadata entry (parsed as JSON, else kept as a string)
    pub fn from_params(name: impl Into<String>, params: &HashMap<String, String>) -> Result<Self> {
        let name = name.into();
        let mut engine = Self::new(name.clone());
        let mut steps: HashMap<Option<OperationKind>, MockStep> = HashMap::new();

        for (key, value) in params {
            if let Some(meta_key) = key.strip_prefix("metadata.") {
                let parsed = serde_json::from_str(value)
                    .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
                engine.metadata.insert(meta_key.to_string(), parsed);
                continue;
            }

            let (operation, field) = match key.split_once('.') {
                Some((op, field)) => (Some(parse_operation(&name, key, op)?), field),
                None => (None, key.as_str()),
            };
            let step = steps.entry(operation).or_default();

            match field {
                "behavior" => {
                    step.behavior = value
                        .parse()
                        .map_err(|msg| EngineFactoryError::invalid_param(&name, key, msg))?;
                }
                "delay_ms" => {
                    let ms: u64 = value.parse().map_err(|_| {
                        EngineFactoryError::invalid_param(&name, key, "expected milliseconds")
                    })?;
                    step.delay = Duration::from_millis(ms);
                }
                _ => {
                    return Err(EngineFactoryError::invalid_param(
                        &name,
                        key,
                        "unknown mock parameter",
                    ))
                }
            }
        }

        for (operation, step) in steps {
            engine = match operation {
                Some(op) => engine.on(op, step),
                None => engine.with_default(step),
            };
        }
        Ok(engine)
    }

    /// Times `operation` has been called
    pub fn calls(&self, operation: OperationKind) -> usize {
        self.calls
            .get(&operation)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    pub fn total_calls(&self) -> usize {
        self.calls.values().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Calls that ran to completion (successfully or not)
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    fn step(&self, operation: OperationKind) -> &MockStep {
        self.steps.get(&operation).unwrap_or(&self.default_step)
    }

    #[instrument(name = "mock_engine_perform", skip(self), fields(engine = %self.name))]
    async fn perform(&self, operation: OperationKind) -> std::result::Result<(), EngineError> {
        if let Some(counter) = self.calls.get(&operation) {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        let step = self.step(operation);
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }

        let result = match &step.behavior {
            MockBehavior::Succeed => Ok(()),
            MockBehavior::Fail(message) => {
                Err(EngineError::backend(&self.name, operation, message.clone()))
            }
            MockBehavior::Unsupported => Err(EngineError::not_supported(&self.name, operation)),
            MockBehavior::Hang => std::future::pending().await,
        };

        self.completed.fetch_add(1, Ordering::Relaxed);
        debug!(ok = result.is_ok(), "mock call finished");
        result
    }
}

fn parse_operation(engine: &str, key: &str, op: &str) -> Result<OperationKind> {
    OperationKind::ALL
        .into_iter()
        .find(|kind| kind.as_str() == op)
        .ok_or_else(|| EngineFactoryError::invalid_param(engine, key, "unknown operation"))
}

#[async_trait]
impl PdfEngine for MockEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn merge(
        &self,
        _ctx: &OpContext,
        _input_paths: &[PathBuf],
        _output_path: &Path,
    ) -> std::result::Result<(), EngineError> {
        self.perform(OperationKind::Merge).await
    }

    async fn linearize(
        &self,
        _ctx: &OpContext,
        _input_paths: &[PathBuf],
        _output_path: &Path,
    ) -> std::result::Result<(), EngineError> {
        self.perform(OperationKind::Linearize).await
    }

    async fn thumbnail(
        &self,
        _ctx: &OpContext,
        _input_paths: &[PathBuf],
        _output_path: &Path,
        _page: PageNumber,
    ) -> std::result::Result<(), EngineError> {
        self.perform(OperationKind::Thumbnail).await
    }

    async fn render_image(
        &self,
        _ctx: &OpContext,
        _input_paths: &[PathBuf],
        _output_path: &Path,
        _page: PageNumber,
        _monochrome: bool,
    ) -> std::result::Result<(), EngineError> {
        self.perform(OperationKind::RenderImage).await
    }

    async fn convert(
        &self,
        _ctx: &OpContext,
        _formats: PdfFormats,
        _input_path: &Path,
        _output_path: &Path,
    ) -> std::result::Result<(), EngineError> {
        self.perform(OperationKind::Convert).await
    }

    async fn read_metadata(
        &self,
        _ctx: &OpContext,
        _input_path: &Path,
    ) -> std::result::Result<Metadata, EngineError> {
        self.perform(OperationKind::ReadMetadata).await?;
        Ok(self.metadata.clone())
    }

    async fn write_metadata(
        &self,
        _ctx: &OpContext,
        _metadata: &Metadata,
        _input_path: &Path,
    ) -> std::result::Result<(), EngineError> {
        self.perform(OperationKind::WriteMetadata).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behavior_parsing() {
        assert_eq!("hang".parse::<MockBehavior>(), Ok(MockBehavior::Hang));
        assert_eq!(
            "fail: disk full".parse::<MockBehavior>(),
            Ok(MockBehavior::Fail("disk full".into()))
        );
        assert!("explode".parse::<MockBehavior>().is_err());
    }

    #[tokio::test]
    async fn test_scripted_steps_and_counters() {
        let engine = MockEngine::new("m")
            .with_default(MockStep::fail("bad format"))
            .on(OperationKind::Merge, MockStep::succeed());
        let ctx = OpContext::new();

        engine
            .merge(&ctx, &[PathBuf::from("a.pdf")], Path::new("o.pdf"))
            .await
            .unwrap();
        let err = engine
            .convert(&ctx, PdfFormats::default(), Path::new("a"), Path::new("b"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("bad format"));
        assert_eq!(engine.calls(OperationKind::Merge), 1);
        assert_eq!(engine.calls(OperationKind::Convert), 1);
        assert_eq!(engine.total_calls(), 2);
        assert_eq!(engine.completed(), 2);
    }

    #[tokio::test]
    async fn test_from_params() {
        let params: HashMap<String, String> = [
            ("behavior", "unsupported"),
            ("read_metadata.behavior", "succeed"),
            ("read_metadata.delay_ms", "5"),
            ("metadata.Title", "report"),
            ("metadata.Pages", "12"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let engine = MockEngine::from_params("m", &params).unwrap();
        let ctx = OpContext::new();

        let metadata = engine.read_metadata(&ctx, Path::new("a.pdf")).await.unwrap();
        assert_eq!(metadata["Title"], serde_json::json!("report"));
        assert_eq!(metadata["Pages"], serde_json::json!(12));

        let err = engine
            .linearize(&ctx, &[PathBuf::from("a.pdf")], Path::new("o.pdf"))
            .await
            .unwrap_err();
        assert!(err.is_not_supported());
    }

    #[test]
    fn test_from_params_rejects_unknown_keys() {
        let params = HashMap::from([("shred.behavior".to_string(), "hang".to_string())]);
        let err = MockEngine::from_params("m", &params).unwrap_err();
        assert!(matches!(err, EngineFactoryError::InvalidParam { .. }));
    }
}
