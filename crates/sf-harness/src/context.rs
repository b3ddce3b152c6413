//! Test context: registers fakes, builds an isolated copy of the routine
//! under test, runs it, and drops every temporary object afterwards.
//!
//! Lifecycle is `Unbuilt -> Built`. Registration methods are only accepted
//! while unbuilt and never touch the database. [`TestContext::build`]
//! resolves every reference, materializes the surviving fakes in
//! registration order, rewrites the target's definition to point at them,
//! and finally creates the renamed target. Cleanup runs on drop.

use crate::error::{HarnessError, HarnessResult};
use crate::fake::{surviving, FakeSource, FakeSpec, SpyLog};
use crate::result::ResultSnapshot;
use sf_core::{
    ComparisonOptions, Config, Dialect, NameGenerator, ObjectKind, ObjectReference, Parameter,
    TabularResult,
};
use sf_db::{Database, InvocationOutputs, ResultStream};
use sf_sql::{render, spy, ScriptRewriter, SPY_ID_COLUMN};
use std::sync::Arc;

/// Lifecycle state of a [`TestContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Unbuilt,
    Built,
}

/// A statement run before every invocation.
#[derive(Debug, Clone)]
enum SetupStep {
    Sql(String),
    /// Resolved when the setup runs
    Routine(ObjectReference),
}

/// Isolated test run of one routine.
pub struct TestContext {
    db: Arc<dyn Database>,
    dialect: Dialect,
    default_schema: String,
    names: NameGenerator,
    rewriter: ScriptRewriter,
    comparison: ComparisonOptions,
    target: Option<(String, ObjectReference)>,
    fakes: Vec<FakeSpec>,
    setup: Vec<SetupStep>,
    state: ContextState,
    build_attempted: bool,
    tested_routine: Option<ObjectReference>,
    /// Everything this context asked the database to create, in order
    created: Vec<(ObjectKind, ObjectReference)>,
}

impl TestContext {
    /// Context over `db`, using its dialect's default schema and random names.
    pub fn new(db: Arc<dyn Database>) -> Self {
        let dialect = db.dialect();
        Self::assemble(db, dialect.default_schema().to_string(), NameGenerator::random())
    }

    /// Context configured from a `sqlfake.yml` section.
    pub fn with_config(db: Arc<dyn Database>, config: &Config) -> HarnessResult<Self> {
        if config.dialect != db.dialect() {
            return Err(HarnessError::InvalidArgument(format!(
                "config dialect '{}' does not match {} database dialect '{}'",
                config.dialect,
                db.db_type(),
                db.dialect()
            )));
        }
        let default_schema = config.effective_default_schema().to_string();
        let mut context = Self::assemble(db, default_schema, NameGenerator::from_config(&config.naming));
        context.comparison = config.comparison.clone();
        Ok(context)
    }

    /// Replace the name generator, e.g. with a deterministic one.
    pub fn with_name_generator(mut self, names: NameGenerator) -> Self {
        self.names = names;
        self
    }

    fn assemble(db: Arc<dyn Database>, default_schema: String, names: NameGenerator) -> Self {
        let dialect = db.dialect();
        Self {
            rewriter: ScriptRewriter::new(dialect).with_default_schema(default_schema.clone()),
            db,
            dialect,
            default_schema,
            names,
            comparison: ComparisonOptions::default(),
            target: None,
            fakes: Vec::new(),
            setup: Vec::new(),
            state: ContextState::Unbuilt,
            build_attempted: false,
            tested_routine: None,
            created: Vec::new(),
        }
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Comparison defaults from the configuration.
    pub fn comparison_options(&self) -> &ComparisonOptions {
        &self.comparison
    }

    /// Registered fakes, in registration order.
    pub fn fakes(&self) -> &[FakeSpec] {
        &self.fakes
    }

    // ── Registration ─────────────────────────────────────────────────────

    /// Set the routine under test.
    pub fn for_routine(&mut self, name: &str) -> HarnessResult<&mut Self> {
        self.ensure_unbuilt("for_routine")?;
        let reference = self.parse(name, "routine name")?;
        self.target = Some((name.to_string(), reference));
        Ok(self)
    }

    /// Replace a function with a caller-supplied `CREATE FUNCTION` script.
    pub fn mock_function(&mut self, name: &str, create_script: &str) -> HarnessResult<&mut Self> {
        self.register_script(name, ObjectKind::Function, create_script)
    }

    /// Replace a view with a caller-supplied `CREATE VIEW` script.
    pub fn mock_view(&mut self, name: &str, create_script: &str) -> HarnessResult<&mut Self> {
        self.register_script(name, ObjectKind::View, create_script)
    }

    /// Replace a trigger with a caller-supplied `CREATE TRIGGER` script.
    pub fn mock_trigger(&mut self, name: &str, create_script: &str) -> HarnessResult<&mut Self> {
        self.register_script(name, ObjectKind::Trigger, create_script)
    }

    /// Replace a table with an empty copy of its structure.
    pub fn mock_table(&mut self, name: &str, options: sf_db::TableDefinitionOptions) -> HarnessResult<&mut Self> {
        self.register(name, ObjectKind::Table, FakeSource::TableStructure(options))
    }

    /// Replace a routine with a spy that logs every call, then runs
    /// `custom_sql` if given.
    pub fn mock_routine(&mut self, name: &str, custom_sql: Option<&str>) -> HarnessResult<&mut Self> {
        let custom_sql = custom_sql
            .map(str::trim)
            .filter(|sql| !sql.is_empty())
            .map(str::to_string);
        self.register(name, ObjectKind::Routine, FakeSource::Spy { custom_sql })
    }

    /// Statement run before every invocation.
    pub fn setup_sql(&mut self, sql: &str) -> HarnessResult<&mut Self> {
        require_text(sql, "setup SQL")?;
        self.setup.push(SetupStep::Sql(sql.to_string()));
        Ok(self)
    }

    /// Routine invoked without arguments before every invocation.
    pub fn setup_routine(&mut self, name: &str) -> HarnessResult<&mut Self> {
        let reference = self.parse(name, "setup routine name")?;
        self.setup.push(SetupStep::Routine(reference));
        Ok(self)
    }

    fn register_script(&mut self, name: &str, kind: ObjectKind, script: &str) -> HarnessResult<&mut Self> {
        require_text(script, "fake definition")?;
        self.register(name, kind, FakeSource::Script(script.to_string()))
    }

    fn register(&mut self, name: &str, kind: ObjectKind, source: FakeSource) -> HarnessResult<&mut Self> {
        self.ensure_unbuilt("mock registration")?;
        let reference = self.parse(name, "object name")?;
        self.fakes.push(FakeSpec::new(name, reference, kind, source));
        Ok(self)
    }

    // ── Build ────────────────────────────────────────────────────────────

    /// Materialize the fakes and the renamed routine under test.
    ///
    /// Fails with `InvalidState` when called a second time or without a
    /// target, and with `NotFound` when any reference does not resolve.
    /// Objects created before a failure are still dropped by cleanup.
    pub fn build(&mut self) -> HarnessResult<&mut Self> {
        if self.build_attempted {
            return Err(HarnessError::InvalidState(
                "build() has already been called on this context".to_string(),
            ));
        }
        let Some((target_name, target)) = self.target.clone() else {
            return Err(HarnessError::InvalidState(
                "no routine under test; call for_routine() first".to_string(),
            ));
        };
        self.build_attempted = true;

        let canonical_target = self.resolve(&target, &target_name, ObjectKind::Routine)?;
        log::debug!("Resolved routine under test '{}' to {}", target_name, canonical_target);
        let mut target_definition = self
            .db
            .get_definition(&canonical_target)?
            .ok_or_else(|| HarnessError::NotFound {
                kind: ObjectKind::Routine.display_name(),
                name: canonical_target.to_string(),
            })?;

        for i in 0..self.fakes.len() {
            let (reference, raw, kind) = {
                let fake = &self.fakes[i];
                (fake.original.clone(), fake.original_name.clone(), fake.kind)
            };
            let canonical = self.resolve(&reference, &raw, kind)?;
            log::debug!("Resolved {} fake '{}' to {}", kind, raw, canonical);
            self.fakes[i].canonical = Some(canonical);
        }

        let survivors = surviving(&self.fakes);
        for (i, fake) in self.fakes.iter().enumerate() {
            if !survivors.contains(&i) {
                log::warn!(
                    "{} fake '{}' is overridden by a later registration and will not be created",
                    fake.kind,
                    fake.original_name
                );
            }
        }

        for i in survivors {
            self.materialize_fake(i, &mut target_definition)?;
        }

        let routine_name = self.names.generate(&canonical_target, ObjectKind::Routine);
        let tested = self.generated_reference(&routine_name)?;
        let routine_definition = self.rewriter.rewrite(&target_definition, &canonical_target, &tested);
        self.create(ObjectKind::Routine, &tested, &routine_definition)?;
        log::debug!("Created routine under test {}", tested);

        log::info!(
            "Built test context for {} as {} with {} fake(s)",
            canonical_target,
            tested,
            self.fakes.iter().filter(|f| f.generated.is_some()).count()
        );
        self.tested_routine = Some(tested);
        self.state = ContextState::Built;
        Ok(self)
    }

    fn materialize_fake(&mut self, index: usize, target_definition: &mut String) -> HarnessResult<()> {
        let (kind, canonical, source) = {
            let fake = &self.fakes[index];
            let canonical = fake.canonical.clone().ok_or_else(|| {
                HarnessError::InvalidState(format!("fake '{}' was not resolved", fake.original_name))
            })?;
            (fake.kind, canonical, fake.source.clone())
        };

        let generated_name = self.names.generate(&canonical, kind);
        let generated = self.generated_reference(&generated_name)?;

        let (definition, spy_log) = match source {
            FakeSource::Script(script) => (script, None),
            FakeSource::TableStructure(options) => {
                let definition = self
                    .db
                    .get_table_definition(&canonical, &options)?
                    .ok_or_else(|| HarnessError::NotFound {
                        kind: kind.display_name(),
                        name: canonical.to_string(),
                    })?;
                (definition, None)
            }
            FakeSource::Spy { custom_sql } => {
                let template = self
                    .db
                    .get_fake_routine_template(&canonical)?
                    .ok_or_else(|| HarnessError::NotFound {
                        kind: "Routine template",
                        name: canonical.to_string(),
                    })?;
                let log_name = self
                    .names
                    .generate_for_name(&format!("{}_SpyProcedureLog", canonical.name()), ObjectKind::Table);
                let log_table = self.generated_reference(&log_name)?;
                let log_definition = spy::render_log_table(self.dialect, &log_table, &template)?;
                let routine = spy::render_spy_routine(
                    self.dialect,
                    &canonical,
                    &log_table,
                    &template,
                    custom_sql.as_deref(),
                )?;
                let spy_log = SpyLog {
                    table: log_table,
                    definition: log_definition,
                };
                (routine, Some(spy_log))
            }
        };

        let renamed = self.rewriter.rewrite(&definition, &canonical, &generated);
        *target_definition = self.rewriter.rewrite(target_definition, &canonical, &generated);

        if let Some(log) = &spy_log {
            self.create(ObjectKind::Table, &log.table, &log.definition)?;
            log::debug!("Created spy log table {}", log.table);
        }
        self.create(kind, &generated, &renamed)?;
        log::debug!("Created {} fake {} for {}", kind, generated, canonical);

        let fake = &mut self.fakes[index];
        fake.generated = Some(generated);
        fake.rewritten_definition = Some(renamed);
        fake.spy_log = spy_log;
        Ok(())
    }

    fn create(&mut self, kind: ObjectKind, reference: &ObjectReference, script: &str) -> HarnessResult<()> {
        // Tracked before the attempt; dropping an object that was never
        // created is a no-op.
        self.created.push((kind, reference.clone()));
        self.db.create_object(script)?;
        Ok(())
    }

    // ── Execution ────────────────────────────────────────────────────────

    /// Invoke the routine under test and discard its output.
    pub fn execute(&self, params: &[Parameter]) -> HarnessResult<()> {
        let routine = self.tested()?;
        validate_parameters(params)?;
        self.run_setup()?;
        let stream = self.db.invoke(routine, params, false)?;
        let (sets, _) = drain(stream)?;
        log::debug!("Executed {} ({} result set(s) discarded)", routine, sets.len());
        Ok(())
    }

    /// Invoke the routine under test and capture everything it returns.
    pub fn execute_with_result(&self, params: &[Parameter]) -> HarnessResult<ResultSnapshot> {
        let routine = self.tested()?;
        validate_parameters(params)?;
        self.run_setup()?;
        let stream = self.db.invoke(routine, params, true)?;
        let (sets, outputs) = drain(stream)?;
        log::debug!("Executed {} ({} result set(s))", routine, sets.len());
        Ok(ResultSnapshot::new(
            outputs.return_code,
            sets,
            params.to_vec(),
            outputs.output_values,
        ))
    }

    fn run_setup(&self) -> HarnessResult<()> {
        for step in &self.setup {
            match step {
                SetupStep::Sql(sql) => {
                    self.db.run_statement(sql)?;
                }
                SetupStep::Routine(reference) => {
                    let canonical = self.resolve(reference, &reference.to_string(), ObjectKind::Routine)?;
                    self.db
                        .run_statement(&render::setup_invocation(self.dialect, &canonical))?;
                }
            }
        }
        Ok(())
    }

    // ── Post-build queries ───────────────────────────────────────────────

    /// Generated name of the fake registered for `name`.
    pub fn fake_name(&self, kind: ObjectKind, name: &str) -> HarnessResult<&str> {
        self.ensure_built("fake_name")?;
        let fake = self.find_fake(kind, name)?;
        fake.generated
            .as_ref()
            .map(ObjectReference::name)
            .ok_or_else(|| {
                HarnessError::InvalidState(format!("{} fake '{}' was not created", kind, name))
            })
    }

    /// Calls recorded by the spy for routine `name`, oldest first.
    pub fn spy_log(&self, name: &str) -> HarnessResult<TabularResult> {
        self.ensure_built("spy_log")?;
        let fake = self.find_fake(ObjectKind::Routine, name)?;
        let log = fake.spy_log.as_ref().ok_or_else(|| HarnessError::NotFound {
            kind: "Spy log",
            name: name.to_string(),
        })?;
        Ok(self
            .db
            .query(&render::select_ordered(self.dialect, &log.table, SPY_ID_COLUMN))?)
    }

    /// Run a query and return its result set.
    pub fn query(&self, sql: &str) -> HarnessResult<TabularResult> {
        require_text(sql, "query")?;
        Ok(self.db.query(sql)?)
    }

    /// Run a statement and return the number of rows affected.
    pub fn execute_non_query(&self, sql: &str) -> HarnessResult<usize> {
        require_text(sql, "statement")?;
        Ok(self.db.run_statement(sql)?)
    }

    /// Generated name of the routine under test.
    pub fn tested_routine_name(&self) -> HarnessResult<&str> {
        Ok(self.tested()?.name())
    }

    // ── Teardown ─────────────────────────────────────────────────────────

    /// Drop every object this context created. Failures are logged and
    /// skipped; calling this again is a no-op.
    pub fn cleanup(&mut self) {
        if self.created.is_empty() {
            return;
        }
        let mut failed = 0;
        let total = self.created.len();
        for (kind, reference) in self.created.drain(..).rev() {
            if let Err(e) = self.db.drop_object_if_exists(kind, &reference) {
                failed += 1;
                log::warn!("Failed to drop {} {}: {}", kind, reference, e);
            }
        }
        log::info!(
            "Cleaned up test context: {} object(s) dropped, {} failed",
            total - failed,
            failed
        );
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn parse(&self, name: &str, what: &str) -> HarnessResult<ObjectReference> {
        require_text(name, what)?;
        Ok(ObjectReference::parse(name, &self.default_schema)?)
    }

    fn resolve(&self, reference: &ObjectReference, raw: &str, kind: ObjectKind) -> HarnessResult<ObjectReference> {
        self.db
            .resolve_canonical_name(reference)?
            .ok_or_else(|| HarnessError::NotFound {
                kind: kind.display_name(),
                name: raw.to_string(),
            })
    }

    fn generated_reference(&self, name: &str) -> HarnessResult<ObjectReference> {
        Ok(ObjectReference::new(self.default_schema.clone(), name)?)
    }

    fn find_fake(&self, kind: ObjectKind, name: &str) -> HarnessResult<&FakeSpec> {
        require_text(name, "object name")?;
        let parsed = ObjectReference::parse(name, &self.default_schema).ok();
        self.fakes
            .iter()
            .rev()
            .filter(|f| f.kind == kind)
            .find(|f| f.answers_to(name, parsed.as_ref()))
            .ok_or_else(|| HarnessError::NotFound {
                kind: kind.display_name(),
                name: format!("{} (no fake registered)", name),
            })
    }

    fn tested(&self) -> HarnessResult<&ObjectReference> {
        self.ensure_built("execution")?;
        self.tested_routine
            .as_ref()
            .ok_or_else(|| HarnessError::InvalidState("routine under test was not created".to_string()))
    }

    fn ensure_unbuilt(&self, operation: &str) -> HarnessResult<()> {
        if self.build_attempted {
            return Err(HarnessError::InvalidState(format!(
                "{} is not allowed after build()",
                operation
            )));
        }
        Ok(())
    }

    fn ensure_built(&self, operation: &str) -> HarnessResult<()> {
        match self.state {
            ContextState::Built => Ok(()),
            ContextState::Unbuilt => Err(HarnessError::InvalidState(format!(
                "call build() before {}",
                operation
            ))),
        }
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl std::fmt::Debug for TestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext")
            .field("db", &self.db.db_type())
            .field("target", &self.target.as_ref().map(|(raw, _)| raw))
            .field("fakes", &self.fakes.len())
            .field("state", &self.state)
            .finish()
    }
}

/// Read every result set, then the outputs.
fn drain(mut stream: Box<dyn ResultStream>) -> HarnessResult<(Vec<TabularResult>, InvocationOutputs)> {
    let mut sets = Vec::new();
    while let Some(set) = stream.next_result_set()? {
        sets.push(set);
    }
    Ok((sets, stream.finish()?))
}

fn validate_parameters(params: &[Parameter]) -> HarnessResult<()> {
    if params.iter().any(|p| p.name().is_empty()) {
        return Err(HarnessError::InvalidArgument(
            "every parameter must have a name".to_string(),
        ));
    }
    Ok(())
}

fn require_text(value: &str, what: &str) -> HarnessResult<()> {
    if value.trim().is_empty() {
        return Err(HarnessError::InvalidArgument(format!("{} must not be empty", what)));
    }
    Ok(())
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
