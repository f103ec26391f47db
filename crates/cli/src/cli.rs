//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use contracts::{DispatchConfig, EngineRequest, Metadata, PageNumber, PdfA, PdfFormats};

/// pdfengines - run PDF operations across several backends at once
#[derive(Parser, Debug)]
#[command(
    name = "pdfengines",
    author,
    version,
    about = "Race PDF operations across multiple engines",
    long_about = "Fans a PDF operation out to every configured engine (qpdf, pdftocairo, \n\
                  cad2x, ...), keeps the first success and reports every engine's \n\
                  failure when none succeeds."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PDFENGINES_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PDFENGINES_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Expose Prometheus metrics on this port
    #[arg(long, global = true, env = "PDFENGINES_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge several PDFs into one
    Merge(MergeArgs),

    /// Linearize a PDF for fast web view
    Linearize(LinearizeArgs),

    /// Render a JPEG thumbnail of one page
    Thumbnail(ThumbnailArgs),

    /// Render one page as a PNG image
    Render(RenderArgs),

    /// Convert a document to PDF (optionally PDF/A or PDF/UA)
    Convert(ConvertArgs),

    /// Print document metadata
    ReadMetadata(ReadMetadataArgs),

    /// Write metadata entries into a document
    WriteMetadata(WriteMetadataArgs),

    /// Validate configuration file without running anything
    Validate(ValidateArgs),

    /// Display configured engines
    Info(InfoArgs),
}

/// Options shared by every operation command
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "pdfengines.toml",
        env = "PDFENGINES_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the request timeout in seconds (0 = no timeout)
    #[arg(
        long,
        env = "PDFENGINES_TIMEOUT",
        value_parser = clap::value_parser!(u64).range(..=DispatchConfig::MAX_TIMEOUT_SECS)
    )]
    pub timeout: Option<u64>,

    /// Only use these engines, in this order (repeatable)
    #[arg(short, long = "engine", value_name = "ID")]
    pub engines: Vec<String>,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Output PDF
    #[arg(short, long)]
    pub output: PathBuf,

    /// Input PDFs, in page order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LinearizeArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    #[arg(short, long)]
    pub output: PathBuf,

    /// Input PDFs
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    #[arg(short, long)]
    pub output: PathBuf,

    /// 1-indexed page to render
    #[arg(long, default_value = "1", value_parser = parse_page)]
    pub page: PageNumber,

    /// Input PDFs
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    #[arg(short, long)]
    pub output: PathBuf,

    /// 1-indexed page to render
    #[arg(long, default_value = "1", value_parser = parse_page)]
    pub page: PageNumber,

    /// Render in black and white
    #[arg(long)]
    pub mono: bool,

    /// Input PDFs
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    #[arg(short, long)]
    pub output: PathBuf,

    /// PDF/A conformance level
    #[arg(long, value_enum)]
    pub pdfa: Option<PdfALevel>,

    /// Produce PDF/UA
    #[arg(long)]
    pub pdfua: bool,

    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct ReadMetadataArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct WriteMetadataArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Entry to write, `KEY=VALUE`; VALUE is read as JSON when it parses (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", required = true, value_parser = parse_entry)]
    pub entries: Vec<(String, serde_json::Value)>,

    pub input: PathBuf,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "pdfengines.toml", env = "PDFENGINES_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "pdfengines.toml", env = "PDFENGINES_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

/// PDF/A level accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PdfALevel {
    #[value(name = "1b")]
    A1b,
    #[value(name = "2b")]
    A2b,
    #[value(name = "3b")]
    A3b,
}

impl From<PdfALevel> for PdfA {
    fn from(level: PdfALevel) -> Self {
        match level {
            PdfALevel::A1b => PdfA::A1b,
            PdfALevel::A2b => PdfA::A2b,
            PdfALevel::A3b => PdfA::A3b,
        }
    }
}

impl MergeArgs {
    pub fn request(&self) -> EngineRequest {
        EngineRequest::Merge {
            input_paths: self.inputs.clone(),
            output_path: self.output.clone(),
        }
    }
}

impl LinearizeArgs {
    pub fn request(&self) -> EngineRequest {
        EngineRequest::Linearize {
            input_paths: self.inputs.clone(),
            output_path: self.output.clone(),
        }
    }
}

impl ThumbnailArgs {
    pub fn request(&self) -> EngineRequest {
        EngineRequest::Thumbnail {
            input_paths: self.inputs.clone(),
            output_path: self.output.clone(),
            page: self.page,
        }
    }
}

impl RenderArgs {
    pub fn request(&self) -> EngineRequest {
        EngineRequest::RenderImage {
            input_paths: self.inputs.clone(),
            output_path: self.output.clone(),
            page: self.page,
            monochrome: self.mono,
        }
    }
}

impl ConvertArgs {
    pub fn request(&self) -> EngineRequest {
        EngineRequest::Convert {
            formats: PdfFormats {
                pdfa: self.pdfa.map(PdfA::from),
                pdfua: self.pdfua,
            },
            input_path: self.input.clone(),
            output_path: self.output.clone(),
        }
    }
}

impl ReadMetadataArgs {
    pub fn request(&self) -> EngineRequest {
        EngineRequest::ReadMetadata {
            input_path: self.input.clone(),
        }
    }
}

impl WriteMetadataArgs {
    pub fn request(&self) -> EngineRequest {
        EngineRequest::WriteMetadata {
            metadata: self.entries.iter().cloned().collect::<Metadata>(),
            input_path: self.input.clone(),
        }
    }
}

fn parse_page(value: &str) -> Result<PageNumber, String> {
    let page: u32 = value
        .parse()
        .map_err(|e| format!("invalid page number '{value}': {e}"))?;
    PageNumber::new(page).ok_or_else(|| "pages are numbered from 1".to_string())
}

fn parse_entry(value: &str) -> Result<(String, serde_json::Value), String> {
    let (key, raw) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{value}'"))?;
    if key.is_empty() {
        return Err("metadata key cannot be empty".to_string());
    }
    let parsed = serde_json::from_str(raw)
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
    Ok((key.to_string(), parsed))
}
