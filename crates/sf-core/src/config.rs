//! Configuration types and parsing for sqlfake.yml

use crate::dialect::Dialect;
use crate::error::{CoreError, CoreResult};
use crate::naming::DEFAULT_SUFFIX_LENGTH;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Accepted range for `naming.suffix_length`.
const SUFFIX_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 4..=32;

/// Main configuration from sqlfake.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SQL dialect of the target database
    #[serde(default)]
    pub dialect: Dialect,

    /// Schema for unqualified references; falls back to the dialect's default
    #[serde(default)]
    pub default_schema: Option<String>,

    /// Generated-name settings
    #[serde(default)]
    pub naming: NamingConfig,

    /// Defaults for result comparison
    #[serde(default)]
    pub comparison: ComparisonOptions,

    /// Database connection settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Generated-name settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    /// Number of random suffix characters
    #[serde(default = "default_suffix_length")]
    pub suffix_length: usize,

    /// Seed for reproducible names; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            suffix_length: default_suffix_length(),
            seed: None,
        }
    }
}

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the DuckDB database file, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Equivalence rules used when comparing two tabular results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparisonOptions {
    /// Match columns by name instead of position
    pub ignore_column_order: bool,
    /// Compare rows as a multiset instead of positionally
    pub ignore_row_order: bool,
    /// Compare column names case-insensitively
    pub ignore_column_name_case: bool,
    /// Columns whose values order the rows before comparison
    pub sort_by_columns: Vec<String>,
    /// Emit `=` rows for matched pairs in the diff table
    pub include_matched_rows_in_diff: bool,
    /// Cap on diff table rows
    pub max_diff_rows: usize,
    /// Cap on rendered cell width
    pub max_cell_length: usize,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            ignore_column_order: false,
            ignore_row_order: false,
            ignore_column_name_case: true,
            sort_by_columns: Vec::new(),
            include_matched_rows_in_diff: true,
            max_diff_rows: 200,
            max_cell_length: 120,
        }
    }
}

impl ComparisonOptions {
    pub fn with_ignore_row_order(mut self, value: bool) -> Self {
        self.ignore_row_order = value;
        self
    }

    pub fn with_ignore_column_order(mut self, value: bool) -> Self {
        self.ignore_column_order = value;
        self
    }

    pub fn with_ignore_column_name_case(mut self, value: bool) -> Self {
        self.ignore_column_name_case = value;
        self
    }

    pub fn with_sort_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_by_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_matched_rows(mut self, value: bool) -> Self {
        self.include_matched_rows_in_diff = value;
        self
    }

    pub fn with_max_diff_rows(mut self, value: usize) -> Self {
        self.max_diff_rows = value;
        self
    }
}

fn default_suffix_length() -> usize {
    DEFAULT_SUFFIX_LENGTH
}

fn default_db_path() -> String {
    ":memory:".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config = Self::from_yaml_str(&content)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a directory.
    /// Looks for sqlfake.yml or sqlfake.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("sqlfake.yml");
        let yaml_path = dir.join("sqlfake.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(yaml: &str) -> CoreResult<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if !SUFFIX_LENGTH_RANGE.contains(&self.naming.suffix_length) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "naming.suffix_length must be between {} and {}, got {}",
                    SUFFIX_LENGTH_RANGE.start(),
                    SUFFIX_LENGTH_RANGE.end(),
                    self.naming.suffix_length
                ),
            });
        }

        if let Some(schema) = &self.default_schema {
            if schema.trim().is_empty() || schema.contains(['.', '[', ']', '"', '`']) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("default_schema '{}' is not a plain schema name", schema),
                });
            }
        }

        if self.comparison.max_diff_rows == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "comparison.max_diff_rows must be greater than zero".to_string(),
            });
        }

        if self.database.path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Schema that unqualified references resolve to
    pub fn effective_default_schema(&self) -> &str {
        self.default_schema
            .as_deref()
            .unwrap_or_else(|| self.dialect.default_schema())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
