//! sf-compare - Tabular comparison for sqlfake
//!
//! Order-aware multiset comparison of two `TabularResult`s with a
//! marker-annotated diff table, plus the column projection and text
//! rendering helpers used when asserting on result sets.

pub mod compare;
pub mod error;
pub mod format;
pub mod normalize;
pub mod project;

pub use compare::{compare, compare_optional, ComparisonResult, MARKER_COLUMN};
pub use error::{CompareError, CompareResult};
pub use format::{format_as_text_table, truncate_cell};
pub use project::{required_column, select_columns};
pub use sf_core::ComparisonOptions;
