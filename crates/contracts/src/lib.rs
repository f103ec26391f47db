//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Capability model
//! - [`PdfEngine`] is the capability interface implemented by every concrete
//!   engine and by the multi-engine dispatcher itself
//! - [`EngineRequest`] / [`EngineResponse`] describe one operation as a value,
//!   so a single algorithm can drive any operation
//! - [`OpContext`] carries the request-scoped cancellation signal and span

mod blueprint;
mod context;
mod engine;
mod error;
mod request;

pub use blueprint::*;
pub use context::{CancelReason, OpContext};
pub use engine::PdfEngine;
pub use error::*;
pub use request::*;
