//! Captured output of one invocation

use crate::error::{HarnessError, HarnessResult};
use sf_compare::{compare, format_as_text_table, required_column, ComparisonOptions, ComparisonResult};
use sf_core::param::names_match;
use sf_core::{FromSqlValue, Parameter, SqlValue, TabularResult};

/// Result sets, return code and output parameter values of one invocation.
///
/// A routine that produced no result sets yields an empty `result_sets()`;
/// one that produced a single empty set yields one table with no rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSnapshot {
    return_code: Option<i64>,
    result_sets: Vec<TabularResult>,
    parameters: Vec<Parameter>,
    output_values: Vec<(String, SqlValue)>,
}

impl ResultSnapshot {
    pub fn new(
        return_code: Option<i64>,
        result_sets: Vec<TabularResult>,
        parameters: Vec<Parameter>,
        output_values: Vec<(String, SqlValue)>,
    ) -> Self {
        Self {
            return_code,
            result_sets,
            parameters,
            output_values,
        }
    }

    pub fn return_code(&self) -> Option<i64> {
        self.return_code
    }

    pub fn result_sets(&self) -> &[TabularResult] {
        &self.result_sets
    }

    pub fn first_result_set(&self) -> Option<&TabularResult> {
        self.result_sets.first()
    }

    pub fn result_set(&self, index: usize) -> HarnessResult<&TabularResult> {
        self.result_sets
            .get(index)
            .ok_or_else(|| HarnessError::result_set_index(index, self.result_sets.len()))
    }

    /// Final values of output-direction parameters, by bare name.
    pub fn output_values(&self) -> &[(String, SqlValue)] {
        &self.output_values
    }

    /// Final value of an output parameter.
    ///
    /// The `@` prefix is optional. A parameter the routine never set reads
    /// as `T::default()`.
    pub fn output_parameter<T: FromSqlValue + Default>(&self, name: &str) -> HarnessResult<T> {
        if name.trim().is_empty() {
            return Err(HarnessError::InvalidArgument(
                "parameter name must not be empty".to_string(),
            ));
        }
        let parameter = self
            .parameters
            .iter()
            .find(|p| p.matches(name))
            .ok_or_else(|| HarnessError::ParameterNotFound {
                name: bare(name),
            })?;
        if !parameter.direction().is_output() {
            return Err(HarnessError::NotOutputParameter {
                name: parameter.name().to_string(),
            });
        }
        let value = self
            .output_values
            .iter()
            .find(|(n, _)| names_match(n, name))
            .map_or(&SqlValue::Null, |(_, v)| v);
        Ok(value.get_or_default()?)
    }

    /// First cell of the first result set.
    pub fn scalar<T: FromSqlValue + Default>(&self) -> HarnessResult<T> {
        self.scalar_at(0)
    }

    /// First cell of result set `index`; `T::default()` when the set is empty.
    pub fn scalar_at<T: FromSqlValue + Default>(&self, index: usize) -> HarnessResult<T> {
        let table = self.result_set(index)?;
        match table.value(0, 0) {
            Some(value) => Ok(value.get_or_default()?),
            None => Ok(T::default()),
        }
    }

    /// Named column of the first row of result set `index`.
    ///
    /// The column must exist even when the set has no rows.
    pub fn scalar_column<T: FromSqlValue + Default>(&self, index: usize, column: &str) -> HarnessResult<T> {
        let table = self.result_set(index)?;
        let column = required_column(table, column, true)?;
        match table.value(0, column) {
            Some(value) => Ok(value.get_or_default()?),
            None => Ok(T::default()),
        }
    }

    /// Map every row of result set `index`.
    pub fn map_rows<T, F>(&self, index: usize, mut f: F) -> HarnessResult<Vec<T>>
    where
        F: FnMut(Row<'_>) -> HarnessResult<T>,
    {
        let table = self.result_set(index)?;
        (0..table.row_count())
            .map(|row| f(Row { table, index: row }))
            .collect()
    }

    /// Map the first row of result set `index`, if any.
    pub fn map_first<T, F>(&self, index: usize, f: F) -> HarnessResult<Option<T>>
    where
        F: FnOnce(Row<'_>) -> HarnessResult<T>,
    {
        let table = self.result_set(index)?;
        if table.row_count() == 0 {
            return Ok(None);
        }
        f(Row { table, index: 0 }).map(Some)
    }

    pub fn result_set_as_text(&self, index: usize, max_rows: usize, max_cell_length: usize) -> HarnessResult<String> {
        let table = self.result_set(index)?;
        Ok(format_as_text_table(table, max_rows, max_cell_length))
    }

    /// Compare result set `index` against `expected`.
    pub fn compare_result_set(
        &self,
        index: usize,
        expected: &TabularResult,
        options: &ComparisonOptions,
    ) -> HarnessResult<ComparisonResult> {
        let actual = self.result_set(index)?;
        Ok(compare(expected, actual, options))
    }
}

/// Borrowed view of one row of a result set.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a TabularResult,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn values(&self) -> &'a [SqlValue] {
        &self.table.rows()[self.index]
    }

    /// Value of the named column, matched case-insensitively.
    pub fn value(&self, column: &str) -> HarnessResult<&'a SqlValue> {
        let i = required_column(self.table, column, true)?;
        Ok(&self.values()[i])
    }

    /// Typed value of the named column; NULL fails unless `T` is an `Option`.
    pub fn get<T: FromSqlValue>(&self, column: &str) -> HarnessResult<T> {
        Ok(T::from_sql_value(self.value(column)?)?)
    }

    /// Typed value of the named column; NULL reads as `T::default()`.
    pub fn get_or_default<T: FromSqlValue + Default>(&self, column: &str) -> HarnessResult<T> {
        Ok(self.value(column)?.get_or_default()?)
    }
}

fn bare(name: &str) -> String {
    name.trim().trim_start_matches('@').to_string()
}

#[cfg(test)]
#[path = "result_test.rs"]
mod tests;
