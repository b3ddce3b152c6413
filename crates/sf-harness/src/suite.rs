//! Shared setup across many test contexts

use crate::context::TestContext;
use crate::error::HarnessResult;
use sf_core::Config;
use sf_db::Database;
use std::sync::Arc;

type SetupAction = Box<dyn Fn(&mut TestContext) -> HarnessResult<()> + Send + Sync>;

/// A group of tests against one database that share setup.
///
/// Every context created through [`TestSuite::for_routine`] gets the suite's
/// setup actions applied in registration order. Fakes registered later on
/// the context override the suite's (last registration wins).
pub struct TestSuite {
    db: Arc<dyn Database>,
    config: Option<Config>,
    setup: Vec<SetupAction>,
}

impl TestSuite {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            config: None,
            setup: Vec::new(),
        }
    }

    /// Contexts are created with `TestContext::with_config`.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Register an action applied to every new context.
    pub fn setup<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(&mut TestContext) -> HarnessResult<()> + Send + Sync + 'static,
    {
        self.setup.push(Box::new(action));
        self
    }

    /// New context for `name` with the suite setup applied.
    pub fn for_routine(&self, name: &str) -> HarnessResult<TestContext> {
        let mut context = match &self.config {
            Some(config) => TestContext::with_config(self.db.clone(), config)?,
            None => TestContext::new(self.db.clone()),
        };
        context.for_routine(name)?;
        for action in &self.setup {
            action(&mut context)?;
        }
        Ok(context)
    }
}
