//! Error types for sf-compare

use thiserror::Error;

/// Comparison error type
#[derive(Error, Debug)]
pub enum CompareError {
    /// C001: Tables were compared and differ
    #[error("[C001] Tables differ: {message}")]
    Mismatch { message: String },

    /// C002: Requested column is missing from a table
    #[error("[C002] Column '{name}' not found in result set")]
    ColumnNotFound { name: String },

    /// C003: Invalid argument to a projection or lookup
    #[error("[C003] Invalid argument: {0}")]
    InvalidArgument(String),

    /// C004: Error from sf-core
    #[error("[C004] {0}")]
    Core(#[from] sf_core::CoreError),
}

/// Result type alias for CompareError
pub type CompareResult<T> = Result<T, CompareError>;
