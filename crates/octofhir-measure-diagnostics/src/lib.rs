//! Measure diagnostics and error handling
//!
//! This crate provides the error handling infrastructure for measure evaluation:
//! structured error codes, the [`MeasureError`] taxonomy and diagnostic reporting.

mod error;
mod error_code;
#[cfg(feature = "colored")]
mod render;

pub use error::*;
pub use error_code::*;
#[cfg(feature = "colored")]
pub use render::*;

/// Result type for measure operations
pub type Result<T> = std::result::Result<T, MeasureError>;
