//! Boundary-aware replacement of object references inside SQL scripts.
//!
//! [`ScriptRewriter::rewrite`] walks the script once, character by
//! character. At each position that is not preceded by a delimiter or
//! identifier character it tries to match the old reference:
//!
//! 1. the schema-qualified form `schema.name`, each part optionally quoted
//!    with `[..]` or `".."`;
//! 2. when the old reference lives in the default schema, the bare form
//!    `name` (optionally quoted).
//!
//! A match only counts when the character after it is not a delimiter or
//! identifier character either, so `dbo.Foo` never touches `dbo.Foo2` or
//! `MyFoo`. Matching is case-insensitive and every replacement is emitted
//! fully qualified and quoted for the dialect.
//!
//! No SQL is parsed: occurrences inside comments and string literals are
//! rewritten too, which keeps dynamic SQL pointing at the replacement.

use sf_core::{Dialect, ObjectReference};

/// Rewrites references to one object into references to another.
#[derive(Debug, Clone)]
pub struct ScriptRewriter {
    dialect: Dialect,
    default_schema: String,
}

impl ScriptRewriter {
    /// Rewriter using the dialect's default schema.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            default_schema: dialect.default_schema().to_string(),
        }
    }

    /// Override the schema that bare names belong to.
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = schema.into();
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    /// Replace every occurrence of `old` in `script` with `new`.
    ///
    /// # Examples
    /// ```
    /// use sf_core::{Dialect, ObjectReference};
    /// use sf_sql::ScriptRewriter;
    ///
    /// let rewriter = ScriptRewriter::new(Dialect::SqlServer);
    /// let old = ObjectReference::parse("dbo.Foo", "dbo").unwrap();
    /// let new = ObjectReference::parse("dbo.Bar", "dbo").unwrap();
    /// let out = rewriter.rewrite("SELECT * FROM Foo JOIN dbo.Foo2 f2 ON 1=1", &old, &new);
    /// assert_eq!(out, "SELECT * FROM [dbo].[Bar] JOIN dbo.Foo2 f2 ON 1=1");
    /// ```
    pub fn rewrite(&self, script: &str, old: &ObjectReference, new: &ObjectReference) -> String {
        self.rewrite_counted(script, old, new).0
    }

    /// Like [`rewrite`](Self::rewrite), also returning how many occurrences
    /// were replaced.
    pub fn rewrite_counted(
        &self,
        script: &str,
        old: &ObjectReference,
        new: &ObjectReference,
    ) -> (String, usize) {
        let replacement = new.quoted(self.dialect);
        let schema: Vec<char> = old.schema().chars().collect();
        let name: Vec<char> = old.name().chars().collect();
        let match_bare = old.is_in_schema(&self.default_schema);

        let chars: Vec<char> = script.chars().collect();
        let mut out = String::with_capacity(script.len());
        let mut replaced = 0;
        let mut pos = 0;

        while pos < chars.len() {
            if starts_token(&chars, pos) {
                let end = match_qualified(&chars, pos, &schema, &name).or_else(|| {
                    if match_bare {
                        match_part(&chars, pos, &name).filter(|&end| ends_token(&chars, end))
                    } else {
                        None
                    }
                });
                if let Some(end) = end {
                    out.push_str(&replacement);
                    replaced += 1;
                    pos = end;
                    continue;
                }
            }
            out.push(chars[pos]);
            pos += 1;
        }

        (out, replaced)
    }
}

/// Characters that may not touch either side of a match.
fn is_boundary_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '$' | '.' | '[' | ']' | '"')
}

fn starts_token(chars: &[char], pos: usize) -> bool {
    pos == 0 || !is_boundary_char(chars[pos - 1])
}

fn ends_token(chars: &[char], end: usize) -> bool {
    chars.get(end).map_or(true, |c| !is_boundary_char(*c))
}

/// `schema.name` starting at `pos`; returns the end offset.
fn match_qualified(chars: &[char], pos: usize, schema: &[char], name: &[char]) -> Option<usize> {
    let after_schema = match_part(chars, pos, schema)?;
    if chars.get(after_schema) != Some(&'.') {
        return None;
    }
    match_part(chars, after_schema + 1, name).filter(|&end| ends_token(chars, end))
}

/// One optionally quoted identifier starting at `pos`.
fn match_part(chars: &[char], pos: usize, part: &[char]) -> Option<usize> {
    let mut i = pos;
    if matches!(chars.get(i), Some('[' | '"')) {
        i += 1;
    }
    for expected in part {
        let actual = chars.get(i)?;
        if !eq_ignore_case(*actual, *expected) {
            return None;
        }
        i += 1;
    }
    if matches!(chars.get(i), Some(']' | '"')) {
        i += 1;
    }
    Some(i)
}

fn eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

#[cfg(test)]
#[path = "rewrite_test.rs"]
mod tests;
