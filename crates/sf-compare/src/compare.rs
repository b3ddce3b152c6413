//! Multiset comparison of two tabular results with a readable diff.
//!
//! Comparison runs in two phases. Structural checks (column count, names,
//! column order, sort columns) fail fast with a message and no diff table.
//! Rows are then reduced to signatures of normalized values, ordered as
//! the options ask, and compared. When the row multisets differ a diff
//! table is built whose first column, `_m_`, holds a marker:
//!
//! - `=` row present on both sides
//! - `<` row present only in the expected table
//! - `>` row present only in the actual table

use crate::error::{CompareError, CompareResult};
use crate::format::format_as_text_table;
use crate::normalize::{normalize_value, signature};
use sf_core::{Column, ComparisonOptions, SqlValue, TabularResult};
use std::collections::{BTreeMap, VecDeque};

/// Name of the marker column in a diff table.
pub const MARKER_COLUMN: &str = "_m_";

pub const MARKER_MATCHED: &str = "=";
pub const MARKER_EXPECTED_ONLY: &str = "<";
pub const MARKER_ACTUAL_ONLY: &str = ">";

/// Outcome of [`compare`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub is_equal: bool,
    /// Empty when equal
    pub message: String,
    /// Row-level diff, present only for row mismatches
    pub diff_table: Option<TabularResult>,
}

impl ComparisonResult {
    fn equal() -> Self {
        Self {
            is_equal: true,
            message: String::new(),
            diff_table: None,
        }
    }

    fn mismatch(message: impl Into<String>) -> Self {
        Self {
            is_equal: false,
            message: message.into(),
            diff_table: None,
        }
    }

    /// Escalate a mismatch into an error.
    pub fn into_result(self) -> CompareResult<()> {
        if self.is_equal {
            Ok(())
        } else {
            Err(CompareError::Mismatch {
                message: self.message,
            })
        }
    }
}

/// One row reduced for comparison.
struct RowKey {
    values: Vec<String>,
    signature: String,
    sort_key: String,
}

/// Compare tables that may be missing.
pub fn compare_optional(
    expected: Option<&TabularResult>,
    actual: Option<&TabularResult>,
    options: &ComparisonOptions,
) -> ComparisonResult {
    match (expected, actual) {
        (None, _) => ComparisonResult::mismatch("Expected table is missing."),
        (_, None) => ComparisonResult::mismatch("Actual table is missing."),
        (Some(expected), Some(actual)) => compare(expected, actual, options),
    }
}

/// Compare `expected` against `actual`.
///
/// # Examples
/// ```
/// use sf_core::{ComparisonOptions, SqlValue, TabularResult};
/// use sf_compare::compare;
///
/// let a = TabularResult::from_names(&["Id"], vec![vec![SqlValue::Int(1)], vec![SqlValue::Int(2)]]).unwrap();
/// let b = TabularResult::from_names(&["id"], vec![vec![SqlValue::Int(2)], vec![SqlValue::Int(1)]]).unwrap();
///
/// let strict = compare(&a, &b, &ComparisonOptions::default());
/// assert!(!strict.is_equal);
///
/// let relaxed = compare(&a, &b, &ComparisonOptions::default().with_ignore_row_order(true));
/// assert!(relaxed.is_equal);
/// ```
pub fn compare(expected: &TabularResult, actual: &TabularResult, options: &ComparisonOptions) -> ComparisonResult {
    if expected.column_count() != actual.column_count() {
        return ComparisonResult::mismatch(format!(
            "Column count mismatch. Expected: {}, Actual: {}.",
            expected.column_count(),
            actual.column_count()
        ));
    }

    let columns = match logical_columns(expected, actual, options) {
        Ok(columns) => columns,
        Err(message) => return ComparisonResult::mismatch(message),
    };

    let mut sort_columns = Vec::with_capacity(options.sort_by_columns.len());
    for name in &options.sort_by_columns {
        let Some(e) = expected.column_index(name, options.ignore_column_name_case) else {
            return ComparisonResult::mismatch(format!("Sort column '{}' not found in expected table.", name));
        };
        let Some(a) = actual.column_index(name, options.ignore_column_name_case) else {
            return ComparisonResult::mismatch(format!("Sort column '{}' not found in actual table.", name));
        };
        sort_columns.push((e, a));
    }

    let expected_indexes: Vec<usize> = columns.iter().map(|c| c.expected).collect();
    let actual_indexes: Vec<usize> = columns.iter().map(|c| c.actual).collect();
    let expected_sort: Vec<usize> = sort_columns.iter().map(|(e, _)| *e).collect();
    let actual_sort: Vec<usize> = sort_columns.iter().map(|(_, a)| *a).collect();

    let expected_rows = row_keys(expected, &expected_indexes, &expected_sort, options);
    let actual_rows = row_keys(actual, &actual_indexes, &actual_sort, options);

    let same_sequence = expected_rows.len() == actual_rows.len()
        && expected_rows
            .iter()
            .zip(&actual_rows)
            .all(|(e, a)| e.signature == a.signature);
    if same_sequence {
        return ComparisonResult::equal();
    }

    if expected_rows.len() == actual_rows.len() && same_multiset(&expected_rows, &actual_rows) {
        if options.ignore_row_order {
            return ComparisonResult::equal();
        }
        return order_mismatch(&expected_rows, &actual_rows);
    }

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let (diff, truncated) = build_diff(&names, &expected_rows, &actual_rows, options);

    let mut message = if expected_rows.len() != actual_rows.len() {
        format!(
            "Row count mismatch. Expected: {}, Actual: {}.",
            expected_rows.len(),
            actual_rows.len()
        )
    } else {
        "Rows differ.".to_string()
    };
    if truncated {
        message.push_str(&format!(" Diff truncated at {} rows.", options.max_diff_rows));
    }
    message.push('\n');
    message.push_str(&format_as_text_table(
        &diff,
        options.max_diff_rows,
        options.max_cell_length,
    ));
    log::debug!("Comparison failed: {} diff rows", diff.row_count());

    ComparisonResult {
        is_equal: false,
        message,
        diff_table: Some(diff),
    }
}

/// A column as seen from both sides.
struct LogicalColumn {
    name: String,
    expected: usize,
    actual: usize,
}

fn logical_columns(
    expected: &TabularResult,
    actual: &TabularResult,
    options: &ComparisonOptions,
) -> Result<Vec<LogicalColumn>, String> {
    let ignore_case = options.ignore_column_name_case;
    let names_equal = |a: &str, b: &str| {
        if ignore_case {
            a.to_lowercase() == b.to_lowercase()
        } else {
            a == b
        }
    };

    let mut columns = Vec::with_capacity(expected.column_count());
    for (i, column) in expected.columns().iter().enumerate() {
        let actual_index = if options.ignore_column_order {
            actual
                .column_index(&column.name, ignore_case)
                .ok_or_else(|| format!("Column '{}' not found in actual table.", column.name))?
        } else {
            let actual_name = &actual.columns()[i].name;
            if !names_equal(&column.name, actual_name) {
                return Err(format!(
                    "Column mismatch at index {}. Expected: '{}', Actual: '{}'.",
                    i, column.name, actual_name
                ));
            }
            i
        };
        columns.push(LogicalColumn {
            name: column.name.clone(),
            expected: i,
            actual: actual_index,
        });
    }
    Ok(columns)
}

fn row_keys(
    table: &TabularResult,
    columns: &[usize],
    sort_columns: &[usize],
    options: &ComparisonOptions,
) -> Vec<RowKey> {
    let mut keys: Vec<RowKey> = table
        .rows()
        .iter()
        .map(|row| {
            let values: Vec<String> = columns.iter().map(|&i| normalize_value(&row[i])).collect();
            RowKey {
                signature: signature(columns.iter().map(|&i| &row[i])),
                sort_key: signature(sort_columns.iter().map(|&i| &row[i])),
                values,
            }
        })
        .collect();

    if !sort_columns.is_empty() {
        if options.ignore_row_order {
            // Ties on the sort columns fall back to the whole row
            keys.sort_by(|a, b| {
                a.sort_key
                    .cmp(&b.sort_key)
                    .then_with(|| a.signature.cmp(&b.signature))
            });
        } else {
            keys.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
        }
    } else if options.ignore_row_order {
        keys.sort_by(|a, b| a.signature.cmp(&b.signature));
    }
    keys
}

fn same_multiset(expected: &[RowKey], actual: &[RowKey]) -> bool {
    let mut e: Vec<&str> = expected.iter().map(|r| r.signature.as_str()).collect();
    let mut a: Vec<&str> = actual.iter().map(|r| r.signature.as_str()).collect();
    e.sort_unstable();
    a.sort_unstable();
    e == a
}

fn order_mismatch(expected: &[RowKey], actual: &[RowKey]) -> ComparisonResult {
    let first = expected
        .iter()
        .zip(actual)
        .position(|(e, a)| e.signature != a.signature)
        .unwrap_or(0);
    let width = expected
        .iter()
        .map(|r| r.signature.chars().count())
        .max()
        .unwrap_or(0)
        .max("Expected".len());

    let mut message = format!(
        "Row order mismatch at index {}. Same rows, different order.\n{:<width$} | Actual",
        first,
        "Expected",
        width = width
    );
    for (e, a) in expected.iter().zip(actual) {
        let marker = if e.signature == a.signature { ' ' } else { '*' };
        message.push_str(&format!(
            "\n{:<width$} | {} {}",
            e.signature,
            a.signature,
            marker,
            width = width
        ));
    }
    ComparisonResult::mismatch(message.trim_end().to_string())
}

/// Diff rows grouped by signature, walked in signature order.
fn build_diff(
    names: &[&str],
    expected: &[RowKey],
    actual: &[RowKey],
    options: &ComparisonOptions,
) -> (TabularResult, bool) {
    let mut buckets: BTreeMap<&str, (VecDeque<&RowKey>, VecDeque<&RowKey>)> = BTreeMap::new();
    for row in expected {
        buckets.entry(row.signature.as_str()).or_default().0.push_back(row);
    }
    for row in actual {
        buckets.entry(row.signature.as_str()).or_default().1.push_back(row);
    }

    let mut columns = Vec::with_capacity(names.len() + 1);
    columns.push(Column::untyped(MARKER_COLUMN));
    columns.extend(names.iter().map(|n| Column::untyped(*n)));
    let mut diff = TabularResult::new(columns);

    let cap = options.max_diff_rows;
    let mut truncated = false;
    let mut push = |diff: &mut TabularResult, marker: &str, row: &RowKey| -> bool {
        if diff.row_count() >= cap {
            truncated = true;
            return false;
        }
        let mut values = Vec::with_capacity(row.values.len() + 1);
        values.push(SqlValue::Text(marker.to_string()));
        values.extend(row.values.iter().cloned().map(SqlValue::Text));
        // Arity always matches the column list built above.
        let _ = diff.push_row(values);
        true
    };

    'walk: for (_, (mut left, mut right)) in buckets {
        let matched = left.len().min(right.len());
        right.drain(..matched);
        for e in left.drain(..matched) {
            if options.include_matched_rows_in_diff && !push(&mut diff, MARKER_MATCHED, e) {
                break 'walk;
            }
        }
        for e in left {
            if !push(&mut diff, MARKER_EXPECTED_ONLY, e) {
                break 'walk;
            }
        }
        for a in right {
            if !push(&mut diff, MARKER_ACTUAL_ONLY, a) {
                break 'walk;
            }
        }
    }

    (diff, truncated)
}

#[cfg(test)]
#[path = "compare_test.rs"]
mod tests;
