//! Column lookup and projection

use crate::error::{CompareError, CompareResult};
use sf_core::{Column, TabularResult};

/// Index of the column called `name`, or `ColumnNotFound`.
pub fn required_column(table: &TabularResult, name: &str, ignore_case: bool) -> CompareResult<usize> {
    if name.trim().is_empty() {
        return Err(CompareError::InvalidArgument(
            "column name must not be empty".to_string(),
        ));
    }
    table
        .column_index(name, ignore_case)
        .ok_or_else(|| CompareError::ColumnNotFound {
            name: name.to_string(),
        })
}

/// New table holding only `columns`, in the requested order.
///
/// Lookups ignore case; the projected columns take the requested
/// spelling and keep the source data type.
pub fn select_columns(table: &TabularResult, columns: &[&str]) -> CompareResult<TabularResult> {
    if columns.is_empty() {
        return Err(CompareError::InvalidArgument(
            "at least one column must be specified".to_string(),
        ));
    }

    let mut indexes = Vec::with_capacity(columns.len());
    let mut projected = Vec::with_capacity(columns.len());
    for name in columns {
        let index = required_column(table, name, true)?;
        let data_type = table.columns()[index].data_type.clone();
        indexes.push(index);
        projected.push(Column::new(*name, data_type));
    }

    let rows = table
        .rows()
        .iter()
        .map(|row| indexes.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Ok(TabularResult::from_rows(projected, rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::SqlValue;

    fn people() -> TabularResult {
        TabularResult::from_rows(
            vec![
                Column::new("Id", "INT"),
                Column::new("Name", "NVARCHAR"),
                Column::new("Age", "INT"),
            ],
            vec![
                vec![SqlValue::Int(1), SqlValue::from("Ann"), SqlValue::Int(30)],
                vec![SqlValue::Int(2), SqlValue::from("Bob"), SqlValue::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_select_columns_reorders_and_keeps_types() {
        let projected = select_columns(&people(), &["age", "Id"]).unwrap();
        assert_eq!(projected.column_names().collect::<Vec<_>>(), vec!["age", "Id"]);
        assert_eq!(projected.columns()[0].data_type, "INT");
        assert_eq!(projected.rows()[1], vec![SqlValue::Null, SqlValue::Int(2)]);
    }

    #[test]
    fn test_select_columns_errors() {
        assert!(matches!(
            select_columns(&people(), &[]),
            Err(CompareError::InvalidArgument(_))
        ));
        assert!(matches!(
            select_columns(&people(), &["Missing"]),
            Err(CompareError::ColumnNotFound { name }) if name == "Missing"
        ));
    }

    #[test]
    fn test_required_column_case() {
        assert_eq!(required_column(&people(), "NAME", true).unwrap(), 1);
        assert!(required_column(&people(), "NAME", false).is_err());
        assert!(required_column(&people(), " ", true).is_err());
    }
}
