//! sf-sql - SQL text layer for sqlfake
//!
//! This crate rewrites object references inside definition scripts and
//! renders the statements the database collaborators run: drops,
//! invocations, setup calls and spy routines.

pub mod error;
pub mod render;
pub mod rewrite;
pub mod spy;

pub use error::{SqlError, SqlResult};
pub use rewrite::ScriptRewriter;
pub use spy::{FakeRoutineTemplate, SPY_ID_COLUMN};
