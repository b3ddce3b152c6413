//! sf-harness - Unit-test harness for database routines
//!
//! A [`TestContext`] takes a routine under test, swaps the functions,
//! views, tables, triggers and routines it depends on for fakes, creates a
//! renamed copy of the routine wired to those fakes, runs it, and captures
//! every result set, output parameter and return code into a
//! [`ResultSnapshot`]. All temporary objects are dropped when the context
//! goes out of scope.

pub mod context;
pub mod error;
pub mod fake;
pub mod result;
pub mod suite;

pub use context::{ContextState, TestContext};
pub use error::{HarnessError, HarnessResult};
pub use fake::{FakeSource, FakeSpec, SpyLog};
pub use result::{ResultSnapshot, Row};
pub use suite::TestSuite;

pub use sf_compare::{compare, ComparisonOptions, ComparisonResult};
pub use sf_core::{ObjectKind, Parameter, SqlValue, TabularResult};
pub use sf_db::TableDefinitionOptions;
