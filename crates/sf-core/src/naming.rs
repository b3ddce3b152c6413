//! Unique names for temporary test objects.
//!
//! Generated names follow `<RolePrefix>_<OriginalName>_<Suffix>` and are
//! always created in the default schema. The suffix comes from a pluggable
//! [`SuffixSource`] so tests can use a seeded or sequential source and get
//! reproducible names.

use crate::kind::ObjectKind;
use crate::reference::ObjectReference;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Default number of suffix characters.
pub const DEFAULT_SUFFIX_LENGTH: usize = 6;

/// Redraws allowed before a colliding name is accepted.
const MAX_REDRAWS: usize = 64;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Source of name suffixes.
pub trait SuffixSource: Send {
    /// Produce a suffix of exactly `len` lowercase alphanumeric characters.
    fn next_suffix(&mut self, len: usize) -> String;
}

/// Suffixes taken from random v4 UUIDs.
#[derive(Debug, Default)]
pub struct UuidSuffix;

impl SuffixSource for UuidSuffix {
    fn next_suffix(&mut self, len: usize) -> String {
        let mut suffix = String::with_capacity(len);
        while suffix.len() < len {
            let simple = uuid::Uuid::new_v4().simple().to_string();
            suffix.push_str(&simple[..(len - suffix.len()).min(simple.len())]);
        }
        suffix
    }
}

/// Hex suffixes from a seeded RNG; identical seeds yield identical names.
#[derive(Debug)]
pub struct SeededSuffix {
    rng: StdRng,
}

impl SeededSuffix {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SuffixSource for SeededSuffix {
    fn next_suffix(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| HEX_DIGITS[self.rng.gen_range(0..HEX_DIGITS.len())] as char)
            .collect()
    }
}

/// Zero-padded hex counter (`000001`, `000002`, ...).
#[derive(Debug, Default)]
pub struct SequentialSuffix {
    next: u64,
}

impl SequentialSuffix {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SuffixSource for SequentialSuffix {
    fn next_suffix(&mut self, len: usize) -> String {
        self.next += 1;
        let formatted = format!("{:0width$x}", self.next, width = len);
        // Keep the low-order digits if the counter outgrows the width.
        formatted[formatted.len() - len..].to_string()
    }
}

/// Generates names for temporary objects and remembers what it issued.
pub struct NameGenerator {
    source: Box<dyn SuffixSource>,
    suffix_length: usize,
    issued: HashSet<String>,
}

impl NameGenerator {
    /// Create a generator over an arbitrary suffix source.
    pub fn new(source: Box<dyn SuffixSource>, suffix_length: usize) -> Self {
        Self {
            source,
            suffix_length: suffix_length.max(1),
            issued: HashSet::new(),
        }
    }

    /// UUID-backed generator with the default suffix length.
    pub fn random() -> Self {
        Self::new(Box::new(UuidSuffix), DEFAULT_SUFFIX_LENGTH)
    }

    /// Deterministic generator for a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(Box::new(SeededSuffix::new(seed)), DEFAULT_SUFFIX_LENGTH)
    }

    /// Deterministic counter-based generator.
    pub fn sequential() -> Self {
        Self::new(Box::new(SequentialSuffix::new()), DEFAULT_SUFFIX_LENGTH)
    }

    /// Build the generator described by a naming config section.
    pub fn from_config(config: &crate::config::NamingConfig) -> Self {
        let source: Box<dyn SuffixSource> = match config.seed {
            Some(seed) => Box::new(SeededSuffix::new(seed)),
            None => Box::new(UuidSuffix),
        };
        Self::new(source, config.suffix_length)
    }

    /// Name for a temporary stand-in of `original`. Only the object name is
    /// used; the schema is dropped.
    pub fn generate(&mut self, original: &ObjectReference, kind: ObjectKind) -> String {
        self.generate_for_name(original.name(), kind)
    }

    /// Name for a temporary object derived from a plain base name.
    pub fn generate_for_name(&mut self, base: &str, kind: ObjectKind) -> String {
        let mut candidate = self.draw(base, kind);
        for _ in 0..MAX_REDRAWS {
            if self.issued.insert(candidate.to_lowercase()) {
                return candidate;
            }
            log::debug!("Generated name '{}' already issued, redrawing", candidate);
            candidate = self.draw(base, kind);
        }
        log::warn!(
            "Suffix source kept repeating names; accepting possibly duplicate '{}'",
            candidate
        );
        candidate
    }

    /// Every name issued so far, lowercased.
    pub fn issued(&self) -> impl Iterator<Item = &str> {
        self.issued.iter().map(String::as_str)
    }

    fn draw(&mut self, base: &str, kind: ObjectKind) -> String {
        let suffix = self.source.next_suffix(self.suffix_length);
        format!("{}_{}_{}", kind.role_prefix(), base, suffix)
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::random()
    }
}

impl std::fmt::Debug for NameGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameGenerator")
            .field("suffix_length", &self.suffix_length)
            .field("issued", &self.issued.len())
            .finish()
    }
}

/// Split a generated name into `(kind, original name, suffix)`.
///
/// Returns `None` for names that do not follow the convention.
///
/// # Examples
/// ```
/// use sf_core::{naming::parse_generated_name, ObjectKind};
/// let (kind, original, suffix) = parse_generated_name("TestView_Orders_1a2b3c").unwrap();
/// assert_eq!(kind, ObjectKind::View);
/// assert_eq!(original, "Orders");
/// assert_eq!(suffix, "1a2b3c");
/// assert!(parse_generated_name("Orders").is_none());
/// ```
pub fn parse_generated_name(name: &str) -> Option<(ObjectKind, &str, &str)> {
    let kind = ObjectKind::ALL.into_iter().find(|kind| {
        let prefix = kind.role_prefix();
        name.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
            && name[prefix.len()..].starts_with('_')
    })?;
    let rest = &name[kind.role_prefix().len() + 1..];
    let (original, suffix) = rest.rsplit_once('_')?;
    if original.is_empty()
        || suffix.is_empty()
        || !suffix.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some((kind, original, suffix))
}

/// Whether `name` follows the generated-name convention.
pub fn is_generated_name(name: &str) -> bool {
    parse_generated_name(name).is_some()
}

#[cfg(test)]
#[path = "naming_test.rs"]
mod tests;
