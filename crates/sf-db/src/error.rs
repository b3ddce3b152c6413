//! Error types for sf-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Statement execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Object not found (D003)
    #[error("[D003] Object not found: {0}")]
    ObjectNotFound(String),

    /// Not supported by this backend (D004)
    #[error("[D004] Feature not supported by {backend}: {feature}")]
    NotSupported { backend: String, feature: String },

    /// Mutex poisoned (D005)
    #[error("[D005] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Catalog returned an unusable name or value (D006)
    #[error("[D006] {0}")]
    Core(#[from] sf_core::CoreError),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error has no structured catalog variants; classify by message.
        let msg = err.to_string();
        if msg.contains("Catalog Error") && msg.contains("does not exist") {
            DbError::ObjectNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
