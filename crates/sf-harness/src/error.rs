//! Error types for sf-harness

use sf_compare::CompareError;
use sf_core::CoreError;
use sf_db::DbError;
use sf_sql::SqlError;
use thiserror::Error;

/// Harness error type
#[derive(Error, Debug)]
pub enum HarnessError {
    /// H001: Operation not allowed in the context's current state
    #[error("[H001] Invalid state: {0}")]
    InvalidState(String),

    /// H002: Missing or malformed caller input
    #[error("[H002] Invalid argument: {0}")]
    InvalidArgument(String),

    /// H003: An object reference did not resolve
    #[error("[H003] {kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// H004: Output lookup for a parameter that was never passed
    #[error("[H004] Parameter '@{name}' was not passed to the invocation")]
    ParameterNotFound { name: String },

    /// H005: Output lookup for an input-only parameter
    #[error("[H005] Parameter '@{name}' is not an output parameter")]
    NotOutputParameter { name: String },

    /// H006: Result set index outside the captured sets
    #[error("[H006] Result set index {index} is out of range ({range})")]
    ResultSetIndex { index: usize, range: String },

    /// H007: Database collaborator error
    #[error("[H007] {0}")]
    Db(#[from] DbError),

    /// H008: Statement rendering error
    #[error("[H008] {0}")]
    Sql(#[from] SqlError),

    /// H009: Core error (reference format, value conversion)
    #[error("[H009] {0}")]
    Core(#[from] CoreError),

    /// H010: Comparison error
    #[error("[H010] {0}")]
    Compare(#[from] CompareError),
}

impl HarnessError {
    pub(crate) fn result_set_index(index: usize, count: usize) -> Self {
        let range = match count {
            0 => "no result sets were captured".to_string(),
            n => format!("0-{}", n - 1),
        };
        HarnessError::ResultSetIndex { index, range }
    }
}

/// Result type alias for HarnessError
pub type HarnessResult<T> = Result<T, HarnessError>;
