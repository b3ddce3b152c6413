//! Schema-qualified object references and the name normalizer.
//!
//! User input may be a bare name (`Orders`), schema-qualified
//! (`sales.Orders`) or decorated (`[sales].[Orders]`, `"sales"."Orders"`).
//! [`ObjectReference::parse`] strips the decoration, splits on the single
//! `.` delimiter, and supplies the default schema when it is omitted.
//!
//! References compare and hash case-insensitively but keep their original
//! casing for display.

use crate::dialect::Dialect;
use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Characters stripped from user input before splitting.
const DECORATION_CHARS: [char; 4] = ['[', ']', '"', '`'];

/// Separator between schema and name.
const DELIMITER: char = '.';

/// A `(schema, name)` pair identifying one database object.
#[derive(Debug, Clone)]
pub struct ObjectReference {
    schema: String,
    name: String,
}

impl ObjectReference {
    /// Build a reference from already-split parts.
    ///
    /// Both parts must be non-empty and free of delimiter and decoration
    /// characters.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> CoreResult<Self> {
        let schema = schema.into();
        let name = name.into();
        for part in [&schema, &name] {
            validate_part(part, &format!("{schema}.{name}"))?;
        }
        Ok(Self { schema, name })
    }

    /// Normalize raw user input into a reference.
    ///
    /// # Examples
    /// ```
    /// use sf_core::ObjectReference;
    /// let r = ObjectReference::parse("[sales].[Orders]", "dbo").unwrap();
    /// assert_eq!(r.schema(), "sales");
    /// assert_eq!(r.name(), "Orders");
    ///
    /// let bare = ObjectReference::parse("Orders", "dbo").unwrap();
    /// assert_eq!(bare.schema(), "dbo");
    ///
    /// assert!(ObjectReference::parse("a.b.c", "dbo").is_err());
    /// ```
    pub fn parse(input: &str, default_schema: &str) -> CoreResult<Self> {
        let cleaned: String = input
            .chars()
            .filter(|c| !DECORATION_CHARS.contains(c))
            .collect();

        if cleaned.trim().is_empty() {
            return Err(invalid(input, "reference is empty"));
        }

        let parts: Vec<&str> = cleaned.split(DELIMITER).map(str::trim).collect();
        let (schema, name) = match parts.as_slice() {
            [name] => (default_schema, *name),
            [schema, name] => (*schema, *name),
            _ => {
                return Err(invalid(
                    input,
                    &format!("expected 1 or 2 parts, found {}", parts.len()),
                ))
            }
        };

        if schema.is_empty() || name.is_empty() {
            return Err(invalid(input, "schema and name must not be empty"));
        }
        validate_part(schema, input)?;
        validate_part(name, input)?;

        Ok(Self {
            schema: schema.to_string(),
            name: name.to_string(),
        })
    }

    /// Schema part, as originally cased.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Object name part, as originally cased.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this reference lives in `schema` (case-insensitive).
    pub fn is_in_schema(&self, schema: &str) -> bool {
        self.schema.to_lowercase() == schema.to_lowercase()
    }

    /// Fully-qualified, quoted form for the given dialect.
    pub fn quoted(&self, dialect: Dialect) -> String {
        dialect.quote_qualified(&self.schema, &self.name)
    }

    /// Same reference with a different name, keeping the schema.
    pub fn with_name(&self, name: impl Into<String>) -> CoreResult<Self> {
        Self::new(self.schema.clone(), name)
    }

    fn key(&self) -> (String, String) {
        (self.schema.to_lowercase(), self.name.to_lowercase())
    }
}

impl PartialEq for ObjectReference {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ObjectReference {}

impl Hash for ObjectReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

fn validate_part(part: &str, input: &str) -> CoreResult<()> {
    if part.is_empty() {
        return Err(invalid(input, "schema and name must not be empty"));
    }
    if part.contains(DELIMITER) || part.contains(DECORATION_CHARS) {
        return Err(invalid(input, "parts must not contain delimiter characters"));
    }
    Ok(())
}

fn invalid(input: &str, reason: &str) -> CoreError {
    CoreError::InvalidReference {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[path = "reference_test.rs"]
mod tests;
