//! cad2x engine: DWG/DXF to PDF conversion.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use contracts::{EngineError, OpContext, OperationKind, PdfEngine, PdfFormats};
use tracing::{debug, instrument};

use crate::command::CommandRunner;

/// Fronts the `cad2x` binary
///
/// Only `convert` is implemented. Requested PDF/A and PDF/UA formats are not
/// honoured; cad2x always produces a plain PDF.
#[derive(Debug, Clone)]
pub struct Cad2X {
    name: String,
    runner: CommandRunner,
}

impl Cad2X {
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
impl PdfEngine for Cad2X {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "cad2x_convert",
        skip(self, ctx, input_path, output_path),
        fields(engine = %self.name, formats = %formats)
    )]
    async fn convert(
        &self,
        ctx: &OpContext,
        formats: PdfFormats,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<(), EngineError> {
        if !formats.is_plain() {
            debug!("requested formats ignored");
        }

        let args = [
            OsString::from("-o"),
            output_path.as_os_str().to_owned(),
            input_path.as_os_str().to_owned(),
            OsString::from("-abc"),
        ];

        self.runner.run(ctx, OperationKind::Convert, &args).await
    }
}
