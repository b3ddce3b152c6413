//! Registered fakes and the override rule between them

use sf_core::{ObjectKind, ObjectReference};
use sf_db::TableDefinitionOptions;

/// Where a fake's definition script comes from.
#[derive(Debug, Clone)]
pub enum FakeSource {
    /// Caller-supplied `CREATE` script
    Script(String),
    /// The real table's structure, fetched at build time
    TableStructure(TableDefinitionOptions),
    /// Synthesized spy routine that logs its arguments, then runs `custom_sql`
    Spy { custom_sql: Option<String> },
}

/// The log table backing a spy routine.
#[derive(Debug, Clone)]
pub struct SpyLog {
    pub table: ObjectReference,
    pub definition: String,
}

/// One fake registration and, after the build, its artifacts.
#[derive(Debug, Clone)]
pub struct FakeSpec {
    /// Name as the caller wrote it
    pub original_name: String,
    pub original: ObjectReference,
    pub kind: ObjectKind,
    pub source: FakeSource,
    /// Resolved during the build
    pub canonical: Option<ObjectReference>,
    /// Set once the fake is materialized; suppressed fakes never get one
    pub generated: Option<ObjectReference>,
    pub rewritten_definition: Option<String>,
    pub spy_log: Option<SpyLog>,
}

impl FakeSpec {
    pub fn new(original_name: &str, original: ObjectReference, kind: ObjectKind, source: FakeSource) -> Self {
        Self {
            original_name: original_name.to_string(),
            original,
            kind,
            source,
            canonical: None,
            generated: None,
            rewritten_definition: None,
            spy_log: None,
        }
    }

    /// Whether `name` (raw text, or its parsed form) designates this fake.
    pub fn answers_to(&self, raw: &str, parsed: Option<&ObjectReference>) -> bool {
        if self.original_name.eq_ignore_ascii_case(raw.trim()) {
            return true;
        }
        match parsed {
            Some(reference) => {
                &self.original == reference || self.canonical.as_ref() == Some(reference)
            }
            None => false,
        }
    }
}

/// Indexes of the fakes that survive the last-fake-wins rule.
///
/// An entry is suppressed when a later entry has the same kind and the
/// same canonical reference. Entries without a canonical reference are
/// never suppressed.
pub fn surviving(fakes: &[FakeSpec]) -> Vec<usize> {
    (0..fakes.len())
        .filter(|&i| {
            let Some(canonical) = fakes[i].canonical.as_ref() else {
                return true;
            };
            !fakes[i + 1..]
                .iter()
                .any(|later| later.kind == fakes[i].kind && later.canonical.as_ref() == Some(canonical))
        })
        .collect()
}
