//! Error types for report construction and rendering.

use thiserror::Error;

/// Table rendering failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// Column inputs differ in length.
    #[error("input lists must have equal length (got {lengths:?})")]
    LengthMismatch {
        /// Length of each column, in table order.
        lengths: Vec<usize>,
    },
}

/// Report assembly failures.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The parsed design holds no module definition.
    #[error("no module definitions found in the input files")]
    NoModules,
    /// The requested top module is not defined.
    #[error("top module `{0}` is not defined in the input files")]
    UnknownTop(String),
    /// A table could not be rendered.
    #[error(transparent)]
    Table(#[from] TableError),
    /// JSON serialization failed.
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}
