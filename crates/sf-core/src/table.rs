//! In-memory tabular results.

use crate::error::{CoreError, CoreResult};
use crate::value::SqlValue;

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Engine type name as reported by the database (e.g. `INTEGER`), or
    /// empty when unknown.
    pub data_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// Column with no declared type.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }
}

/// One result set: ordered columns plus ordered rows of nullable values.
///
/// Rows are not required to be unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabularResult {
    columns: Vec<Column>,
    rows: Vec<Vec<SqlValue>>,
}

impl TabularResult {
    /// Empty table with the given columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Table from columns and rows, checking every row's arity.
    pub fn from_rows(columns: Vec<Column>, rows: Vec<Vec<SqlValue>>) -> CoreResult<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Untyped table from column names and rows. Convenient for expected
    /// values in tests.
    ///
    /// # Examples
    /// ```
    /// use sf_core::{SqlValue, TabularResult};
    /// let t = TabularResult::from_names(
    ///     &["Id", "Name"],
    ///     vec![vec![SqlValue::from(1), SqlValue::from("A")]],
    /// )
    /// .unwrap();
    /// assert_eq!(t.row_count(), 1);
    /// assert_eq!(t.column_index("name", true), Some(1));
    /// ```
    pub fn from_names(names: &[&str], rows: Vec<Vec<SqlValue>>) -> CoreResult<Self> {
        let columns = names.iter().map(|n| Column::untyped(*n)).collect();
        Self::from_rows(columns, rows)
    }

    pub fn push_row(&mut self, row: Vec<SqlValue>) -> CoreResult<()> {
        if row.len() != self.columns.len() {
            return Err(CoreError::RowArity {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has neither columns nor rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Position of the first column called `name`.
    pub fn column_index(&self, name: &str, ignore_case: bool) -> Option<usize> {
        self.columns.iter().position(|c| {
            if ignore_case {
                c.name.to_lowercase() == name.to_lowercase()
            } else {
                c.name == name
            }
        })
    }

    /// Cell at `(row, column)`.
    pub fn value(&self, row: usize, column: usize) -> Option<&SqlValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}
