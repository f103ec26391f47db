//! EngineBlueprint - Config Loader output
//!
//! Describes the engine set: which backends exist, in which order they are
//! declared, where their binaries live, and the per-request deadline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete engine configuration blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Request-level dispatch settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Engines in declaration order
    #[serde(default)]
    pub engines: Vec<EngineConfig>,
}

impl EngineBlueprint {
    /// Enabled engines, in declaration order
    pub fn enabled_engines(&self) -> impl Iterator<Item = &EngineConfig> {
        self.engines.iter().filter(|engine| engine.enabled)
    }
}

/// Dispatch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-request deadline in seconds (0 = none)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DispatchConfig {
    /// Largest accepted `timeout_secs` (one week)
    pub const MAX_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

    /// Deadline applied to each request, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// One engine declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Unique identifier, also the engine's reported name
    pub id: String,

    /// Backend kind
    pub kind: EngineKind,

    /// Path to the backend binary (falls back to the kind's env var)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_path: Option<PathBuf>,

    /// Disabled engines are not provisioned
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Kind-specific parameters
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, String>,
}

fn default_enabled() -> bool {
    true
}

/// Backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// qpdf: merge, linearize
    #[serde(rename = "qpdf")]
    QPdf,
    /// pdftocairo: thumbnail, render_image
    #[serde(rename = "pdftocairo")]
    PdfToCairo,
    /// cad2x: DWG/DXF to PDF conversion
    #[serde(rename = "cad2x")]
    Cad2X,
    /// In-memory scriptable engine
    Mock,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::QPdf,
        EngineKind::PdfToCairo,
        EngineKind::Cad2X,
        EngineKind::Mock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::QPdf => "qpdf",
            EngineKind::PdfToCairo => "pdftocairo",
            EngineKind::Cad2X => "cad2x",
            EngineKind::Mock => "mock",
        }
    }

    /// Environment variable holding the binary path, if the kind needs one
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            EngineKind::QPdf => Some("QPDF_BIN_PATH"),
            EngineKind::PdfToCairo => Some("PDFTOCAIRO_BIN_PATH"),
            EngineKind::Cad2X => Some("CAD2X_BIN_PATH"),
            EngineKind::Mock => None,
        }
    }

    pub fn needs_binary(&self) -> bool {
        self.env_var().is_some()
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
