//! Scenario registry and execution.
//!
//! A scenario is one assertion about the runner, built on exactly one runner
//! invocation. Scenarios are grouped into [`ScenarioSet`]s, each bound to the
//! directory its relative suite paths resolve against.

pub mod fixture;
mod runner;

pub use fixture::{CountExpectation, ExitExpectation, Expectation, ScenarioFile, ScenarioSpec};
pub use runner::{Outcome, RunSummary, ScenarioResult, ScenarioRunner, SetSummary};

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;
use crate::invoker::{Invocation, Invoker, RawResult};
use crate::report::{Report, ReportParser};

/// Name prefix marking a registered scenario as runnable.
pub const SCENARIO_PREFIX: &str = "test_";

/// Future returned by a scenario predicate.
pub type ScenarioFuture = Pin<Box<dyn Future<Output = Result<bool>> + Send>>;

type Check = Box<dyn Fn(Chili) -> ScenarioFuture + Send + Sync>;

/// Boxes an async scenario body.
///
/// Passing the `async` block through this bound fixes its output type, so
/// bodies can use `?` without annotations.
pub fn predicate<F>(body: F) -> ScenarioFuture
where
    F: Future<Output = Result<bool>> + Send + 'static,
{
    Box::pin(body)
}

/// Handle to the runner under test, passed to every scenario.
#[derive(Clone)]
pub struct Chili {
    invoker: Arc<dyn Invoker>,
    parser: Arc<ReportParser>,
}

impl Chili {
    /// Creates a handle that parses output with the default formats.
    pub fn new(invoker: Arc<dyn Invoker>) -> Self {
        Self::with_parser(invoker, Arc::new(ReportParser::new()))
    }

    /// Creates a handle with a custom report parser.
    pub fn with_parser(invoker: Arc<dyn Invoker>, parser: Arc<ReportParser>) -> Self {
        Self { invoker, parser }
    }

    /// Returns the runner binary path.
    pub fn binary(&self) -> &Path {
        self.invoker.binary()
    }

    /// Runs the runner and returns its raw output without parsing.
    pub async fn invoke(&self, invocation: impl Into<Invocation>) -> Result<RawResult> {
        let invocation = invocation.into();
        self.invoker.invoke(&invocation).await
    }

    /// Runs the runner and parses its summary.
    pub async fn run(&self, invocation: impl Into<Invocation>) -> Result<Report> {
        let raw = self.invoke(invocation).await?;
        self.parser.parse(&raw)
    }
}

/// A named predicate over one runner invocation.
pub struct Scenario {
    name: String,
    check: Check,
}

impl Scenario {
    /// Creates a scenario from a name and a predicate.
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(Chili) -> ScenarioFuture + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }

    /// Returns the registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name shown in output.
    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }

    /// Returns true if the name carries the runnable prefix.
    pub fn is_runnable(&self) -> bool {
        self.name.starts_with(SCENARIO_PREFIX)
    }

    /// Evaluates the predicate.
    pub async fn check(&self, chili: Chili) -> Result<bool> {
        (self.check)(chili).await
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario").field("name", &self.name).finish()
    }
}

/// Strips the runnable prefix and turns underscores into spaces.
pub fn display_name(name: &str) -> String {
    name.strip_prefix(SCENARIO_PREFIX)
        .unwrap_or(name)
        .replace('_', " ")
}

/// An ordered registry of scenarios sharing one working directory.
#[derive(Debug)]
pub struct ScenarioSet {
    name: String,
    dir: PathBuf,
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    /// Creates an empty set whose scenarios run inside `dir`.
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            scenarios: Vec::new(),
        }
    }

    /// Registers a scenario after the ones already registered.
    pub fn register<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(Chili) -> ScenarioFuture + Send + Sync + 'static,
    {
        self.push(Scenario::new(name, check));
        self
    }

    /// Appends an already-built scenario.
    pub fn push(&mut self, scenario: Scenario) {
        self.scenarios.push(scenario);
    }

    /// Returns the set name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the directory scenarios run in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns every registered scenario in registration order.
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Returns the runnable scenarios in registration order.
    pub fn runnable(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter().filter(|s| s.is_runnable())
    }

    /// Returns the number of registered scenarios.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
