//! Collaborator traits consumed by the test harness

use crate::error::DbResult;
use sf_core::{Dialect, ObjectKind, ObjectReference, Parameter, SqlValue, TabularResult};
use sf_sql::FakeRoutineTemplate;
use std::collections::VecDeque;

/// Which parts of a real table's structure a fake table copies.
///
/// The default copies column names and types only, which keeps the fake
/// free of constraints that would get in the way of test data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableDefinitionOptions {
    pub include_computed_columns: bool,
    pub include_not_null: bool,
    pub include_identity: bool,
    pub include_defaults: bool,
    pub include_primary_key: bool,
    pub include_foreign_keys: bool,
    pub include_check_constraints: bool,
    pub include_unique_constraints: bool,
}

impl TableDefinitionOptions {
    /// Copy everything.
    pub fn maximum() -> Self {
        Self {
            include_computed_columns: true,
            include_not_null: true,
            include_identity: true,
            include_defaults: true,
            include_primary_key: true,
            include_foreign_keys: true,
            include_check_constraints: true,
            include_unique_constraints: true,
        }
    }
}

/// Catalog lookups.
///
/// `Ok(None)` means the object does not exist; `Err` is reserved for
/// transport and execution failures.
pub trait MetadataProvider {
    /// System-validated identity of `reference`.
    fn resolve_canonical_name(&self, reference: &ObjectReference) -> DbResult<Option<ObjectReference>>;

    /// Creation script of a routine, function, view or trigger.
    fn get_definition(&self, reference: &ObjectReference) -> DbResult<Option<String>>;

    /// `CREATE TABLE` script reproducing a table's structure.
    fn get_table_definition(
        &self,
        reference: &ObjectReference,
        options: &TableDefinitionOptions,
    ) -> DbResult<Option<String>>;

    /// Fragments for a spy replacement of a routine.
    fn get_fake_routine_template(&self, reference: &ObjectReference) -> DbResult<Option<FakeRoutineTemplate>>;
}

/// Values available once an invocation's result sets have been drained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationOutputs {
    /// Status code, when the invocation asked for one and the engine has one
    pub return_code: Option<i64>,
    /// Final values of output-direction parameters, by bare name
    pub output_values: Vec<(String, SqlValue)>,
}

/// The result sets of one invocation, read one at a time.
pub trait ResultStream {
    /// Next result set, or `None` when all have been read.
    fn next_result_set(&mut self) -> DbResult<Option<TabularResult>>;

    /// Return code and output values. Only meaningful after every result set
    /// has been read.
    fn finish(self: Box<Self>) -> DbResult<InvocationOutputs>;
}

/// A [`ResultStream`] over result sets that were already fetched.
#[derive(Debug, Default)]
pub struct BufferedResults {
    sets: VecDeque<TabularResult>,
    outputs: InvocationOutputs,
}

impl BufferedResults {
    pub fn new(sets: Vec<TabularResult>, outputs: InvocationOutputs) -> Self {
        Self {
            sets: sets.into(),
            outputs,
        }
    }
}

impl ResultStream for BufferedResults {
    fn next_result_set(&mut self) -> DbResult<Option<TabularResult>> {
        Ok(self.sets.pop_front())
    }

    fn finish(self: Box<Self>) -> DbResult<InvocationOutputs> {
        Ok(self.outputs)
    }
}

/// Statement execution against the database session.
pub trait Executor {
    /// Dialect of the session; decides quoting and statement shapes.
    fn dialect(&self) -> Dialect;

    /// Run a creation script.
    fn create_object(&self, script: &str) -> DbResult<()>;

    /// Drop an object if it exists. Kinds the engine has no notion of are
    /// a no-op.
    fn drop_object_if_exists(&self, kind: ObjectKind, reference: &ObjectReference) -> DbResult<()>;

    /// Invoke a routine with named parameters.
    fn invoke(
        &self,
        routine: &ObjectReference,
        params: &[Parameter],
        with_return_code: bool,
    ) -> DbResult<Box<dyn ResultStream>>;

    /// Run a statement and return the number of rows affected.
    fn run_statement(&self, sql: &str) -> DbResult<usize>;

    /// Run a query and return its single result set.
    fn query(&self, sql: &str) -> DbResult<TabularResult>;

    /// Backend identifier for logging
    fn db_type(&self) -> &'static str;
}

/// A full database collaborator.
pub trait Database: MetadataProvider + Executor + Send + Sync {}

impl<T: MetadataProvider + Executor + Send + Sync> Database for T {}
