//! # Engines
//!
//! Concrete PDF engine backends and their provisioning.
//!
//! Responsibilities:
//! - Front external binaries (`qpdf`, `pdftocairo`, `cad2x`) behind [`contracts::PdfEngine`]
//! - Run those binaries under the request's `OpContext` (killed on cancel)
//! - Build the engine set from an `EngineBlueprint` ([`EngineRegistry`])
//! - Provide a scriptable [`MockEngine`] for tests and demos

pub mod cad2x;
pub mod command;
pub mod error;
pub mod mock;
pub mod pdftocairo;
pub mod qpdf;
pub mod registry;

pub use cad2x::Cad2X;
pub use command::CommandRunner;
pub use contracts::{EngineBlueprint, EngineConfig, EngineKind, PdfEngine};
pub use error::{EngineFactoryError, Result};
pub use mock::{MockBehavior, MockEngine, MockStep};
pub use pdftocairo::PdfToCairo;
pub use qpdf::QPdf;
pub use registry::EngineRegistry;
