//! Kinds of database objects that can be faked

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of object kinds a test context can create or fake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Stored procedure (a table macro on DuckDB)
    Routine,
    /// Scalar or table-valued function
    Function,
    /// Base table
    Table,
    /// View
    View,
    /// Trigger
    Trigger,
}

impl ObjectKind {
    /// All kinds, in declaration order.
    pub const ALL: [ObjectKind; 5] = [
        ObjectKind::Routine,
        ObjectKind::Function,
        ObjectKind::Table,
        ObjectKind::View,
        ObjectKind::Trigger,
    ];

    /// Role prefix used for generated temporary object names.
    pub fn role_prefix(self) -> &'static str {
        match self {
            ObjectKind::Routine => "TestProc",
            ObjectKind::Function => "TestFunc",
            ObjectKind::Table => "TestTable",
            ObjectKind::View => "TestView",
            ObjectKind::Trigger => "TestTrigger",
        }
    }

    /// Human-readable name for error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            ObjectKind::Routine => "Routine",
            ObjectKind::Function => "Function",
            ObjectKind::Table => "Table",
            ObjectKind::View => "View",
            ObjectKind::Trigger => "Trigger",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
