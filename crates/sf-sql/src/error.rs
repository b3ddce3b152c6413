//! Error types for sf-sql

use sf_core::Dialect;
use thiserror::Error;

/// Statement rendering errors
#[derive(Error, Debug)]
pub enum SqlError {
    /// Template render error (R001)
    #[error("[R001] Template render error: {0}")]
    RenderError(String),

    /// Statement not expressible in the dialect (R002)
    #[error("[R002] {what} is not supported for dialect '{dialect}'")]
    Unsupported { what: &'static str, dialect: Dialect },
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;

impl From<minijinja::Error> for SqlError {
    fn from(err: minijinja::Error) -> Self {
        SqlError::RenderError(err.to_string())
    }
}
