//! SQL dialect selector
//!
//! The dialect decides how identifiers are quoted, which schema an
//! unqualified reference belongs to, and which keyword drops each kind of
//! object.

use crate::kind::ObjectKind;
use serde::{Deserialize, Serialize};

/// Target database dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Microsoft SQL Server (default)
    #[default]
    SqlServer,
    /// DuckDB
    DuckDb,
}

impl Dialect {
    /// Schema that unqualified references resolve to.
    pub fn default_schema(self) -> &'static str {
        match self {
            Dialect::SqlServer => "dbo",
            Dialect::DuckDb => "main",
        }
    }

    /// Quote a single identifier, escaping the closing delimiter.
    ///
    /// # Examples
    /// ```
    /// use sf_core::Dialect;
    /// assert_eq!(Dialect::SqlServer.quote_ident("Orders"), "[Orders]");
    /// assert_eq!(Dialect::SqlServer.quote_ident("a]b"), "[a]]b]");
    /// assert_eq!(Dialect::DuckDb.quote_ident("orders"), r#""orders""#);
    /// ```
    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            Dialect::SqlServer => format!("[{}]", ident.replace(']', "]]")),
            Dialect::DuckDb => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Quote a `(schema, name)` pair as `schema.name` with both parts quoted.
    pub fn quote_qualified(self, schema: &str, name: &str) -> String {
        format!("{}.{}", self.quote_ident(schema), self.quote_ident(name))
    }

    /// Keyword(s) following `DROP` for the given object kind, or `None` when the
    /// dialect has no such object.
    pub fn drop_keyword(self, kind: ObjectKind) -> Option<&'static str> {
        match (self, kind) {
            (Dialect::SqlServer, ObjectKind::Routine) => Some("PROCEDURE"),
            (Dialect::SqlServer, ObjectKind::Function) => Some("FUNCTION"),
            (Dialect::SqlServer, ObjectKind::Table) => Some("TABLE"),
            (Dialect::SqlServer, ObjectKind::View) => Some("VIEW"),
            (Dialect::SqlServer, ObjectKind::Trigger) => Some("TRIGGER"),
            (Dialect::DuckDb, ObjectKind::Routine) => Some("MACRO TABLE"),
            (Dialect::DuckDb, ObjectKind::Function) => Some("MACRO"),
            (Dialect::DuckDb, ObjectKind::Table) => Some("TABLE"),
            (Dialect::DuckDb, ObjectKind::View) => Some("VIEW"),
            (Dialect::DuckDb, ObjectKind::Trigger) => None,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::SqlServer => write!(f, "sqlserver"),
            Dialect::DuckDb => write!(f, "duckdb"),
        }
    }
}
