//! Operation values: what is asked of an engine and what comes back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;

use crate::{EngineError, OpContext, PdfEngine};

/// Document metadata mapping (string keys to arbitrary values)
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Closed set of operations an engine can be asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Merge,
    Linearize,
    Thumbnail,
    RenderImage,
    Convert,
    ReadMetadata,
    WriteMetadata,
}

impl OperationKind {
    /// All operations, in declaration order
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Merge,
        OperationKind::Linearize,
        OperationKind::Thumbnail,
        OperationKind::RenderImage,
        OperationKind::Convert,
        OperationKind::ReadMetadata,
        OperationKind::WriteMetadata,
    ];

    /// Stable snake_case label, used for metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Merge => "merge",
            OperationKind::Linearize => "linearize",
            OperationKind::Thumbnail => "thumbnail",
            OperationKind::RenderImage => "render_image",
            OperationKind::Convert => "convert",
            OperationKind::ReadMetadata => "read_metadata",
            OperationKind::WriteMetadata => "write_metadata",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1-indexed page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageNumber(NonZeroU32);

impl PageNumber {
    /// The first page
    pub const FIRST: PageNumber = PageNumber(NonZeroU32::MIN);

    /// Returns `None` for page 0
    pub fn new(page: u32) -> Option<Self> {
        NonZeroU32::new(page).map(Self)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// PDF/A conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PdfA {
    #[serde(rename = "PDF/A-1b")]
    A1b,
    #[serde(rename = "PDF/A-2b")]
    A2b,
    #[serde(rename = "PDF/A-3b")]
    A3b,
}

impl fmt::Display for PdfA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PdfA::A1b => "PDF/A-1b",
            PdfA::A2b => "PDF/A-2b",
            PdfA::A3b => "PDF/A-3b",
        };
        f.write_str(label)
    }
}

/// Target-format descriptor for `convert`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PdfFormats {
    /// PDF/A conformance, if any
    #[serde(default)]
    pub pdfa: Option<PdfA>,

    /// PDF/UA accessibility flag
    #[serde(default)]
    pub pdfua: bool,
}

impl PdfFormats {
    /// True when no specific format was requested
    pub fn is_plain(&self) -> bool {
        self.pdfa.is_none() && !self.pdfua
    }
}

impl fmt::Display for PdfFormats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.pdfa, self.pdfua) {
            (None, false) => f.write_str("PDF"),
            (Some(a), false) => write!(f, "{a}"),
            (None, true) => f.write_str("PDF/UA"),
            (Some(a), true) => write!(f, "{a} + PDF/UA"),
        }
    }
}

/// One operation with its arguments
///
/// Owned so that it can be shared with attempts running on other tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineRequest {
    Merge {
        input_paths: Vec<PathBuf>,
        output_path: PathBuf,
    },
    Linearize {
        input_paths: Vec<PathBuf>,
        output_path: PathBuf,
    },
    Thumbnail {
        input_paths: Vec<PathBuf>,
        output_path: PathBuf,
        page: PageNumber,
    },
    RenderImage {
        input_paths: Vec<PathBuf>,
        output_path: PathBuf,
        page: PageNumber,
        monochrome: bool,
    },
    Convert {
        formats: PdfFormats,
        input_path: PathBuf,
        output_path: PathBuf,
    },
    ReadMetadata {
        input_path: PathBuf,
    },
    WriteMetadata {
        metadata: Metadata,
        input_path: PathBuf,
    },
}

impl EngineRequest {
    /// Which operation this request is
    pub fn operation(&self) -> OperationKind {
        match self {
            EngineRequest::Merge { .. } => OperationKind::Merge,
            EngineRequest::Linearize { .. } => OperationKind::Linearize,
            EngineRequest::Thumbnail { .. } => OperationKind::Thumbnail,
            EngineRequest::RenderImage { .. } => OperationKind::RenderImage,
            EngineRequest::Convert { .. } => OperationKind::Convert,
            EngineRequest::ReadMetadata { .. } => OperationKind::ReadMetadata,
            EngineRequest::WriteMetadata { .. } => OperationKind::WriteMetadata,
        }
    }

    /// Run this request against a single engine
    pub async fn invoke(
        &self,
        engine: &dyn PdfEngine,
        ctx: &OpContext,
    ) -> Result<EngineResponse, EngineError> {
        match self {
            EngineRequest::Merge {
                input_paths,
                output_path,
            } => engine
                .merge(ctx, input_paths, output_path)
                .await
                .map(|()| EngineResponse::Done),
            EngineRequest::Linearize {
                input_paths,
                output_path,
            } => engine
                .linearize(ctx, input_paths, output_path)
                .await
                .map(|()| EngineResponse::Done),
            EngineRequest::Thumbnail {
                input_paths,
                output_path,
                page,
            } => engine
                .thumbnail(ctx, input_paths, output_path, *page)
                .await
                .map(|()| EngineResponse::Done),
            EngineRequest::RenderImage {
                input_paths,
                output_path,
                page,
                monochrome,
            } => engine
                .render_image(ctx, input_paths, output_path, *page, *monochrome)
                .await
                .map(|()| EngineResponse::Done),
            EngineRequest::Convert {
                formats,
                input_path,
                output_path,
            } => engine
                .convert(ctx, *formats, input_path, output_path)
                .await
                .map(|()| EngineResponse::Done),
            EngineRequest::ReadMetadata { input_path } => engine
                .read_metadata(ctx, input_path)
                .await
                .map(EngineResponse::Metadata),
            EngineRequest::WriteMetadata {
                metadata,
                input_path,
            } => engine
                .write_metadata(ctx, metadata, input_path)
                .await
                .map(|()| EngineResponse::Done),
        }
    }
}

/// Success payload of one operation
#[derive(Debug, Clone, PartialEq)]
pub enum EngineResponse {
    /// Mutating operations carry no payload
    Done,
    /// Result of `read_metadata`
    Metadata(Metadata),
}

impl EngineResponse {
    /// Extract the metadata payload of a `read_metadata` response
    ///
    /// # Errors
    /// Returns an internal error if the response carries no metadata.
    pub fn into_metadata(self) -> Result<Metadata, EngineError> {
        match self {
            EngineResponse::Metadata(metadata) => Ok(metadata),
            EngineResponse::Done => Err(EngineError::internal(
                "read_metadata response carried no metadata",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_rejects_zero() {
        assert!(PageNumber::new(0).is_none());
        assert_eq!(PageNumber::new(3).map(|p| p.get()), Some(3));
        assert_eq!(PageNumber::FIRST.to_string(), "1");
    }

    #[test]
    fn test_request_operation() {
        let request = EngineRequest::RenderImage {
            input_paths: vec![PathBuf::from("a.pdf")],
            output_path: PathBuf::from("a.png"),
            page: PageNumber::FIRST,
            monochrome: true,
        };
        assert_eq!(request.operation(), OperationKind::RenderImage);
        assert_eq!(request.operation().to_string(), "render_image");
    }

    #[test]
    fn test_formats_display() {
        assert_eq!(PdfFormats::default().to_string(), "PDF");
        let formats = PdfFormats {
            pdfa: Some(PdfA::A2b),
            pdfua: true,
        };
        assert_eq!(formats.to_string(), "PDF/A-2b + PDF/UA");
        assert!(!formats.is_plain());
    }

    #[test]
    fn test_into_metadata_rejects_done() {
        assert!(EngineResponse::Done.into_metadata().is_err());
        let mut metadata = Metadata::new();
        metadata.insert("Title".into(), serde_json::json!("x"));
        let extracted = EngineResponse::Metadata(metadata.clone())
            .into_metadata()
            .unwrap();
        assert_eq!(extracted, metadata);
    }
}
