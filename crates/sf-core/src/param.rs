//! Routine parameters bound at invocation time

use crate::value::SqlValue;

/// Direction of a routine parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterDirection {
    Input,
    Output,
    InputOutput,
}

impl ParameterDirection {
    /// Whether the routine can write a value back through this parameter.
    pub fn is_output(self) -> bool {
        matches!(self, ParameterDirection::Output | ParameterDirection::InputOutput)
    }

    /// Whether a caller-supplied value is sent with the invocation.
    pub fn is_input(self) -> bool {
        matches!(self, ParameterDirection::Input | ParameterDirection::InputOutput)
    }
}

/// A named parameter with its bound value.
///
/// Names are stored without the `@` prefix; lookups accept either form and
/// ignore case.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    value: SqlValue,
    direction: ParameterDirection,
}

impl Parameter {
    pub fn new(name: &str, value: impl Into<SqlValue>, direction: ParameterDirection) -> Self {
        Self {
            name: strip_prefix(name).to_string(),
            value: value.into(),
            direction,
        }
    }

    pub fn input(name: &str, value: impl Into<SqlValue>) -> Self {
        Self::new(name, value, ParameterDirection::Input)
    }

    /// Output-only parameter; its initial value is NULL.
    pub fn output(name: &str) -> Self {
        Self::new(name, SqlValue::Null, ParameterDirection::Output)
    }

    pub fn input_output(name: &str, value: impl Into<SqlValue>) -> Self {
        Self::new(name, value, ParameterDirection::InputOutput)
    }

    /// Name without the `@` prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &SqlValue {
        &self.value
    }

    pub fn direction(&self) -> ParameterDirection {
        self.direction
    }

    /// Case-insensitive name match; the `@` prefix is optional on both sides.
    pub fn matches(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

/// Compare two parameter names, ignoring case and an `@` prefix.
pub fn names_match(a: &str, b: &str) -> bool {
    strip_prefix(a).to_lowercase() == strip_prefix(b).to_lowercase()
}

fn strip_prefix(name: &str) -> &str {
    name.trim().trim_start_matches('@')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_stripped() {
        let p = Parameter::input("@Board", "X--");
        assert_eq!(p.name(), "Board");
        assert!(p.matches("board"));
        assert!(p.matches("@BOARD"));
        assert!(!p.matches("Boards"));
    }

    #[test]
    fn test_output_starts_null() {
        let p = Parameter::output("Winner");
        assert!(p.value().is_null());
        assert!(p.direction().is_output());
        assert!(!p.direction().is_input());
        assert!(ParameterDirection::InputOutput.is_input());
        assert!(ParameterDirection::InputOutput.is_output());
    }
}
