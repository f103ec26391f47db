//! QPDF engine: merge and linearize.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use contracts::{EngineError, OpContext, OperationKind, PdfEngine};
use tracing::{debug, instrument};

use crate::command::CommandRunner;

/// Fronts the `qpdf` binary
#[derive(Debug, Clone)]
pub struct QPdf {
    name: String,
    runner: CommandRunner,
}

impl QPdf {
    pub fn new(name: impl Into<String>, bin_path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            runner: CommandRunner::new(name.clone(), bin_path),
            name,
        }
    }

    pub fn bin_path(&self) -> &Path {
        self.runner.program()
    }
}

#[async_trait]
impl PdfEngine for QPdf {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "qpdf_merge",
        skip(self, ctx, input_paths),
        fields(engine = %self.name, inputs = input_paths.len())
    )]
    async fn merge(
        &self,
        ctx: &OpContext,
        input_paths: &[PathBuf],
        output_path: &Path,
    ) -> Result<(), EngineError> {
        if input_paths.is_empty() {
            return Err(EngineError::backend(
                &self.name,
                OperationKind::Merge,
                "no input files",
            ));
        }

        let mut args: Vec<OsString> = vec!["--empty".into(), "--pages".into()];
        args.extend(input_paths.iter().map(|p| p.as_os_str().to_owned()));
        args.push("--".into());
        args.push(output_path.as_os_str().to_owned());

        self.runner.run(ctx, OperationKind::Merge, &args).await?;
        debug!(output = %output_path.display(), "merged");
        Ok(())
    }

    #[instrument(name = "qpdf_linearize", skip(self, ctx, input_paths), fields(engine = %self.name))]
    async fn linearize(
        &self,
        ctx: &OpContext,
        input_paths: &[PathBuf],
        output_path: &Path,
    ) -> Result<(), EngineError> {
        let [input] = input_paths else {
            return Err(EngineError::backend(
                &self.name,
                OperationKind::Linearize,
                format!("expected exactly one input file, got {}", input_paths.len()),
            ));
        };

        let args: Vec<OsString> = vec![
            "--linearize".into(),
            input.as_os_str().to_owned(),
            output_path.as_os_str().to_owned(),
        ];

        self.runner.run(ctx, OperationKind::Linearize, &args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_linearize_rejects_multiple_inputs() {
        let engine = QPdf::new("qpdf", "/nonexistent/qpdf");
        let err = engine
            .linearize(
                &OpContext::new(),
                &[PathBuf::from("a.pdf"), PathBuf::from("b.pdf")],
                Path::new("out.pdf"),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exactly one input"), "got {err}");
    }

    #[tokio::test]
    async fn test_unsupported_operations() {
        let engine = QPdf::new("qpdf", "/nonexistent/qpdf");
        let err = engine
            .read_metadata(&OpContext::new(), Path::new("a.pdf"))
            .await
            .unwrap_err();
        assert!(err.is_not_supported());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_merge_arguments() {
        use crate::command::test_support::{fake_binary, recorded_args, RECORD_ARGS};

        let dir = tempfile::tempdir().unwrap();
        let bin = fake_binary(dir.path(), "qpdf", RECORD_ARGS);
        let engine = QPdf::new("qpdf", bin);

        engine
            .merge(
                &OpContext::new(),
                &[PathBuf::from("/in/a.pdf"), PathBuf::from("/in/b.pdf")],
                Path::new("/out/merged.pdf"),
            )
            .await
            .unwrap();

        assert_eq!(
            recorded_args(dir.path()),
            [
                "--empty",
                "--pages",
                "/in/a.pdf",
                "/in/b.pdf",
                "--",
                "/out/merged.pdf"
            ]
        );
    }
}
