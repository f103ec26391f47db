//! # Dispatcher
//!
//! Multi-engine dispatch module.
//!
//! Responsibilities:
//! - Fan one operation out to every configured engine concurrently
//! - Return the first success without waiting for slower engines
//! - Aggregate every engine's failure when none succeeds
//! - Stop waiting as soon as the request context fires

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;

pub use contracts::{EngineRequest, EngineResponse, PdfEngine};
pub use dispatcher::{create_dispatcher, DispatcherBuilder, MultiPdfEngines};
pub use error::DispatcherError;
pub use handle::{Attempt, EngineHandle};
pub use metrics::{EngineMetrics, MetricsSnapshot};
