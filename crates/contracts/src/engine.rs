//! PdfEngine trait - the capability interface
//!
//! Implemented by every concrete engine and by the multi-engine dispatcher.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{EngineError, Metadata, OpContext, OperationKind, PageNumber, PdfFormats};

/// Document operations offered by an engine
///
/// Every operation defaults to [`EngineError::MethodNotSupported`]; an engine
/// overrides only the operations it actually implements and never silently
/// no-ops an unsupported one.
///
/// Implementations should observe `ctx` while they work and stop early with
/// [`EngineError::Cancelled`] when it fires.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    /// Engine name (used for logging, metrics and aggregated errors)
    fn name(&self) -> &str;

    /// Merge `input_paths`, in order, into `output_path`
    async fn merge(
        &self,
        _ctx: &OpContext,
        _input_paths: &[PathBuf],
        _output_path: &Path,
    ) -> Result<(), EngineError> {
        Err(EngineError::not_supported(self.name(), OperationKind::Merge))
    }

    /// Linearize ("fast web view") the input into `output_path`
    async fn linearize(
        &self,
        _ctx: &OpContext,
        _input_paths: &[PathBuf],
        _output_path: &Path,
    ) -> Result<(), EngineError> {
        Err(EngineError::not_supported(self.name(), OperationKind::Linearize))
    }

    /// Render `page` as a small JPEG thumbnail
    async fn thumbnail(
        &self,
        _ctx: &OpContext,
        _input_paths: &[PathBuf],
        _output_path: &Path,
        _page: PageNumber,
    ) -> Result<(), EngineError> {
        Err(EngineError::not_supported(self.name(), OperationKind::Thumbnail))
    }

    /// Render `page` as a full-size PNG image
    ///
    /// `monochrome` is a hint; engines that cannot honour it may ignore it.
    async fn render_image(
        &self,
        _ctx: &OpContext,
        _input_paths: &[PathBuf],
        _output_path: &Path,
        _page: PageNumber,
        _monochrome: bool,
    ) -> Result<(), EngineError> {
        Err(EngineError::not_supported(self.name(), OperationKind::RenderImage))
    }

    /// Convert `input_path` to the requested PDF format
    async fn convert(
        &self,
        _ctx: &OpContext,
        _formats: PdfFormats,
        _input_path: &Path,
        _output_path: &Path,
    ) -> Result<(), EngineError> {
        Err(EngineError::not_supported(self.name(), OperationKind::Convert))
    }

    /// Read document metadata
    async fn read_metadata(
        &self,
        _ctx: &OpContext,
        _input_path: &Path,
    ) -> Result<Metadata, EngineError> {
        Err(EngineError::not_supported(self.name(), OperationKind::ReadMetadata))
    }

    /// Write `metadata` into `input_path` in place
    async fn write_metadata(
        &self,
        _ctx: &OpContext,
        _metadata: &Metadata,
        _input_path: &Path,
    ) -> Result<(), EngineError> {
        Err(EngineError::not_supported(self.name(), OperationKind::WriteMetadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NothingEngine;

    #[async_trait]
    impl PdfEngine for NothingEngine {
        fn name(&self) -> &str {
            "nothing"
        }
    }

    #[tokio::test]
    async fn test_default_methods_report_not_supported() {
        let engine = NothingEngine;
        let ctx = OpContext::new();

        let err = engine
            .merge(&ctx, &[PathBuf::from("a.pdf")], Path::new("out.pdf"))
            .await
            .unwrap_err();
        assert!(err.is_not_supported());
        assert_eq!(err.to_string(), "engine 'nothing' does not support merge");

        let err = engine
            .read_metadata(&ctx, Path::new("a.pdf"))
            .await
            .unwrap_err();
        assert!(err.is_not_supported());
    }
}
