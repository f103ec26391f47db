//! Command implementations.

mod info;
mod operation;
mod validate;

pub use info::run_info;
pub use operation::{run_operation, OutputMode};
pub use validate::run_validate;
