//! Scripted in-memory database for orchestration tests.
//!
//! [`MemoryBackend`] holds a catalog of object definitions, records every
//! statement it is asked to run, tracks the objects created through it,
//! and answers invocations and queries from scripted responses.

use crate::error::{DbError, DbResult};
use crate::traits::{
    BufferedResults, Executor, InvocationOutputs, MetadataProvider, ResultStream,
    TableDefinitionOptions,
};
use sf_core::{Dialect, ObjectKind, ObjectReference, Parameter, SqlValue, TabularResult};
use sf_sql::FakeRoutineTemplate;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Canned answer for one invocation.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInvocation {
    pub result_sets: Vec<TabularResult>,
    pub return_code: Option<i64>,
    /// Values written to output parameters; unlisted outputs stay NULL
    pub output_values: Vec<(String, SqlValue)>,
}

/// One recorded call to [`Executor::invoke`].
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    pub routine: ObjectReference,
    pub params: Vec<Parameter>,
    pub with_return_code: bool,
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    reference: ObjectReference,
    definition: String,
    template: Option<FakeRoutineTemplate>,
}

#[derive(Debug, Default)]
struct MemoryState {
    catalog: Vec<CatalogEntry>,
    created_scripts: Vec<String>,
    live_objects: Vec<ObjectReference>,
    dropped: Vec<(ObjectKind, ObjectReference)>,
    failing_drops: HashSet<String>,
    failing_creates: Vec<String>,
    statements: Vec<String>,
    invocations: Vec<RecordedInvocation>,
    scripted_invocations: VecDeque<ScriptedInvocation>,
    scripted_queries: HashMap<String, TabularResult>,
    table_options: Vec<TableDefinitionOptions>,
}

/// In-memory database double.
pub struct MemoryBackend {
    dialect: Dialect,
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panicking test poisons the lock; later inspection still wants the data.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn parse(&self, name: &str) -> ObjectReference {
        match ObjectReference::parse(name, self.dialect.default_schema()) {
            Ok(reference) => reference,
            Err(e) => panic!("invalid object name in test setup: {e}"),
        }
    }

    /// Register an existing object and its definition script.
    pub fn with_object(self, name: &str, definition: &str) -> Self {
        let reference = self.parse(name);
        self.lock().catalog.push(CatalogEntry {
            reference,
            definition: definition.to_string(),
            template: None,
        });
        self
    }

    /// Register an existing routine that supports spy fakes.
    pub fn with_routine_template(self, name: &str, definition: &str, template: FakeRoutineTemplate) -> Self {
        let reference = self.parse(name);
        self.lock().catalog.push(CatalogEntry {
            reference,
            definition: definition.to_string(),
            template: Some(template),
        });
        self
    }

    /// Queue the response for the next invocation.
    pub fn script_invocation(&self, response: ScriptedInvocation) {
        self.lock().scripted_invocations.push_back(response);
    }

    /// Answer `sql` with `table`.
    pub fn script_query(&self, sql: &str, table: TabularResult) {
        self.lock().scripted_queries.insert(sql.to_string(), table);
    }

    /// Make drops of `name` fail.
    pub fn fail_drop(&self, name: &str) {
        self.lock().failing_drops.insert(name.to_lowercase());
    }

    /// Make creation scripts containing `fragment` fail.
    pub fn fail_create_containing(&self, fragment: &str) {
        self.lock().failing_creates.push(fragment.to_string());
    }

    pub fn created_scripts(&self) -> Vec<String> {
        self.lock().created_scripts.clone()
    }

    /// Objects created and not yet dropped, in creation order.
    pub fn live_objects(&self) -> Vec<ObjectReference> {
        self.lock().live_objects.clone()
    }

    pub fn dropped(&self) -> Vec<(ObjectKind, ObjectReference)> {
        self.lock().dropped.clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.lock().invocations.clone()
    }

    /// Options passed to every table definition request.
    pub fn table_options(&self) -> Vec<TableDefinitionOptions> {
        self.lock().table_options.clone()
    }

    fn entry(&self, reference: &ObjectReference) -> Option<CatalogEntry> {
        self.lock()
            .catalog
            .iter()
            .find(|e| &e.reference == reference)
            .cloned()
    }
}

impl MetadataProvider for MemoryBackend {
    fn resolve_canonical_name(&self, reference: &ObjectReference) -> DbResult<Option<ObjectReference>> {
        Ok(self.entry(reference).map(|e| e.reference))
    }

    fn get_definition(&self, reference: &ObjectReference) -> DbResult<Option<String>> {
        Ok(self.entry(reference).map(|e| e.definition))
    }

    fn get_table_definition(
        &self,
        reference: &ObjectReference,
        options: &TableDefinitionOptions,
    ) -> DbResult<Option<String>> {
        self.lock().table_options.push(*options);
        Ok(self.entry(reference).map(|e| e.definition))
    }

    fn get_fake_routine_template(&self, reference: &ObjectReference) -> DbResult<Option<FakeRoutineTemplate>> {
        Ok(self.entry(reference).and_then(|e| e.template))
    }
}

impl Executor for MemoryBackend {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn create_object(&self, script: &str) -> DbResult<()> {
        let mut state = self.lock();
        if state.failing_creates.iter().any(|f| script.contains(f.as_str())) {
            return Err(DbError::ExecutionError(format!("scripted failure: {script}")));
        }
        state.created_scripts.push(script.to_string());
        if let Some(reference) = created_name(script, self.dialect) {
            state.live_objects.push(reference);
        }
        Ok(())
    }

    fn drop_object_if_exists(&self, kind: ObjectKind, reference: &ObjectReference) -> DbResult<()> {
        let mut state = self.lock();
        if state.failing_drops.contains(&reference.name().to_lowercase()) {
            return Err(DbError::ExecutionError(format!("scripted drop failure: {reference}")));
        }
        state.dropped.push((kind, reference.clone()));
        state.live_objects.retain(|live| live != reference);
        Ok(())
    }

    fn invoke(
        &self,
        routine: &ObjectReference,
        params: &[Parameter],
        with_return_code: bool,
    ) -> DbResult<Box<dyn ResultStream>> {
        let mut state = self.lock();
        state.invocations.push(RecordedInvocation {
            routine: routine.clone(),
            params: params.to_vec(),
            with_return_code,
        });
        let response = state.scripted_invocations.pop_front().unwrap_or_default();

        let output_values = params
            .iter()
            .filter(|p| p.direction().is_output())
            .map(|p| {
                let value = response
                    .output_values
                    .iter()
                    .find(|(name, _)| p.matches(name))
                    .map_or(SqlValue::Null, |(_, v)| v.clone());
                (p.name().to_string(), value)
            })
            .collect();
        let outputs = InvocationOutputs {
            return_code: if with_return_code {
                Some(response.return_code.unwrap_or(0))
            } else {
                None
            },
            output_values,
        };
        Ok(Box::new(BufferedResults::new(response.result_sets, outputs)))
    }

    fn run_statement(&self, sql: &str) -> DbResult<usize> {
        self.lock().statements.push(sql.to_string());
        Ok(0)
    }

    fn query(&self, sql: &str) -> DbResult<TabularResult> {
        let mut state = self.lock();
        state.statements.push(sql.to_string());
        state
            .scripted_queries
            .get(sql)
            .cloned()
            .ok_or_else(|| DbError::ExecutionError(format!("no scripted result for: {sql}")))
    }

    fn db_type(&self) -> &'static str {
        "memory"
    }
}

/// Name declared by a `CREATE [OR ALTER|OR REPLACE] <kind> <name>` script.
fn created_name(script: &str, dialect: Dialect) -> Option<ObjectReference> {
    const KIND_WORDS: [&str; 7] = ["PROCEDURE", "PROC", "FUNCTION", "TABLE", "VIEW", "TRIGGER", "MACRO"];
    let mut words = script.split_whitespace().skip_while(|w| !w.eq_ignore_ascii_case("CREATE"));
    words.next()?;
    words.find(|w| KIND_WORDS.iter().any(|k| w.eq_ignore_ascii_case(k)))?;
    let name = words.next()?.split('(').next()?.trim_end_matches([';', ',']);
    ObjectReference::parse(name, dialect.default_schema()).ok()
}
