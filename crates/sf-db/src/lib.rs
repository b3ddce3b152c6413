//! sf-db - Database layer for sqlfake
//!
//! This crate provides the `MetadataProvider` and `Executor` collaborator
//! traits the harness drives, and a DuckDB implementation of both.

pub mod duckdb;
pub mod error;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{
    BufferedResults, Database, Executor, InvocationOutputs, MetadataProvider, ResultStream,
    TableDefinitionOptions,
};

#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryBackend, RecordedInvocation, ScriptedInvocation};
