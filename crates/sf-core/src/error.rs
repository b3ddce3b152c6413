//! Error types for sf-core

use thiserror::Error;

/// Core error type for sqlfake
#[derive(Error, Debug)]
pub enum CoreError {
    /// SF001: Object reference could not be split into (schema, name)
    #[error("[SF001] Invalid object reference '{input}': {reason}. Expected [schema].[name] or a bare name")]
    InvalidReference { input: String, reason: String },

    /// SF002: Configuration file not found
    #[error("[SF002] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// SF003: YAML parse error
    #[error("[SF003] Failed to parse config: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// SF004: Invalid configuration value
    #[error("[SF004] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// SF005: A cell value could not be converted to the requested type
    #[error("[SF005] Cannot convert {found} value to {expected}")]
    ValueConversion {
        expected: &'static str,
        found: &'static str,
    },

    /// SF006: IO error with file path context
    #[error("[SF006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// SF007: A row does not match the column count of its table
    #[error("[SF007] Row has {found} values but the table has {expected} columns")]
    RowArity { expected: usize, found: usize },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
