//! pdftocairo engine: page rasterization.
//!
//! Supports `thumbnail` (400px JPEG) and `render_image` (full-size PNG, with
//! optional monochrome output). Every other operation is unsupported.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use contracts::{EngineError, OpContext, OperationKind, PageNumber, PdfEngine};
use tracing::instrument;

use crate::command::{strip_extension, CommandRunner};

/// Thumbnail bounding box, in pixels
const THUMBNAIL_SCALE: &str = "400";

/// Fronts the `pdftocairo` binary
#[derive(Debug, Clone)]
pub struct PdfToCairo {
    name: String,
    runner: CommandRunner,
}

impl PdfToCairo {
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

    fn page_args(
        input_paths: &[PathBuf],
        output_path: &Path,
        format: &str,
        extension: &str,
        page: PageNumber,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = input_paths
            .iter()
            .map(|p| p.as_os_str().to_owned())
            .collect();
        args.push(strip_extension(output_path, extension).into_os_string());
        args.push(format!("-{format}").into());
        let page = page.to_string();
        args.extend([
            OsString::from("-f"),
            OsString::from(&page),
            OsString::from("-l"),
            OsString::from(&page),
        ]);
        args
    }
}

#[async_trait]
impl PdfEngine for PdfToCairo {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "pdftocairo_thumbnail",
        skip(self, ctx, input_paths, output_path),
        fields(engine = %self.name, page = %page)
    )]
    async fn thumbnail(
        &self,
        ctx: &OpContext,
        input_paths: &[PathBuf],
        output_path: &Path,
        page: PageNumber,
    ) -> Result<(), EngineError> {
        let mut args = Self::page_args(input_paths, output_path, "jpeg", "jpg", page);
        args.extend([
            OsString::from("-scale-to"),
            OsString::from(THUMBNAIL_SCALE),
            OsString::from("-singlefile"),
        ]);

        self.runner.run(ctx, OperationKind::Thumbnail, &args).await
    }

    #[instrument(
        name = "pdftocairo_render_image",
        skip(self, ctx, input_paths, output_path),
        fields(engine = %self.name, page = %page, monochrome)
    )]
    async fn render_image(
        &self,
        ctx: &OpContext,
        input_paths: &[PathBuf],
        output_path: &Path,
        page: PageNumber,
        monochrome: bool,
    ) -> Result<(), EngineError> {
        let mut args = Self::page_args(input_paths, output_path, "png", "png", page);
        args.push("-singlefile".into());
        if monochrome {
            args.push("-mono".into());
        }

        self.runner.run(ctx, OperationKind::RenderImage, &args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_args_layout() {
        let args = PdfToCairo::page_args(
            &[PathBuf::from("in.pdf")],
            Path::new("/out/page.png"),
            "png",
            "png",
            PageNumber::new(3).unwrap(),
        );
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["in.pdf", "/out/page", "-png", "-f", "3", "-l", "3"]);
    }

    #[tokio::test]
    async fn test_merge_is_not_supported() {
        let engine = PdfToCairo::new("pdftocairo", "/nonexistent/pdftocairo");
        let err = engine
            .merge(&OpContext::new(), &[PathBuf::from("a.pdf")], Path::new("o.pdf"))
            .await
            .unwrap_err();
        assert!(err.is_not_supported());
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use crate::command::test_support::{fake_binary, recorded_args, RECORD_ARGS};

        #[tokio::test]
        async fn test_thumbnail_arguments() {
            let dir = tempfile::tempdir().unwrap();
            let bin = fake_binary(dir.path(), "pdftocairo", RECORD_ARGS);
            let engine = PdfToCairo::new("pdftocairo", bin);

            engine
                .thumbnail(
                    &OpContext::new(),
                    &[PathBuf::from("/in/doc.pdf")],
                    Path::new("/out/thumb.jpg"),
                    PageNumber::new(2).unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(
                recorded_args(dir.path()),
                [
                    "/in/doc.pdf",
                    "/out/thumb",
                    "-jpeg",
                    "-f",
                    "2",
                    "-l",
                    "2",
                    "-scale-to",
                    "400",
                    "-singlefile"
                ]
            );
        }

        #[tokio::test]
        async fn test_render_monochrome_arguments() {
            let dir = tempfile::tempdir().unwrap();
            let bin = fake_binary(dir.path(), "pdftocairo", RECORD_ARGS);
            let engine = PdfToCairo::new("pdftocairo", bin);

            engine
                .render_image(
                    &OpContext::new(),
                    &[PathBuf::from("/in/doc.pdf")],
                    Path::new("/out/page.png"),
                    PageNumber::FIRST,
                    true,
                )
                .await
                .unwrap();

            let args = recorded_args(dir.path());
            assert_eq!(args[1], "/out/page");
            assert_eq!(args[2], "-png");
            assert_eq!(args.last().map(String::as_str), Some("-mono"));
        }
    }
}
