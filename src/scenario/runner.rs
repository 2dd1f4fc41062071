//! Sequential scenario execution.

use std::io::Write;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scoped_dir::ScopedDirectory;

use super::{Chili, Scenario, ScenarioSet};

/// Terminal state of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The predicate held.
    Pass,
    /// The predicate did not hold.
    Fail,
    /// The runner did not exit within the configured timeout.
    TimedOut,
}

impl Outcome {
    /// Label printed after the scenario name.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass => "ok",
            Outcome::Fail => "fail",
            Outcome::TimedOut => "timeout",
        }
    }

    /// Returns true for [`Outcome::Pass`].
    pub fn passed(&self) -> bool {
        *self == Outcome::Pass
    }
}

/// Outcome of one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Registered scenario name.
    pub name: String,
    /// Terminal state.
    pub outcome: Outcome,
    /// Time spent evaluating the predicate.
    pub duration: Duration,
}

/// Outcomes of one scenario set, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSummary {
    /// Scenario set name.
    pub set: String,
    /// Per-scenario results.
    pub results: Vec<ScenarioResult>,
}

impl SetSummary {
    /// Returns true if every scenario passed.
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.outcome.passed())
    }

    /// Returns the number of scenarios that did not pass.
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.outcome.passed()).count()
    }
}

/// Aggregated outcomes of a whole harness run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub sets: Vec<SetSummary>,
}

impl RunSummary {
    /// Returns true if every scenario of every set passed.
    pub fn passed(&self) -> bool {
        self.sets.iter().all(SetSummary::passed)
    }

    /// Returns the number of scenarios run.
    pub fn total(&self) -> usize {
        self.sets.iter().map(|s| s.results.len()).sum()
    }

    /// Returns the number of scenarios that did not pass.
    pub fn failures(&self) -> usize {
        self.sets.iter().map(SetSummary::failures).sum()
    }

    /// One-line tally for the end of a run.
    pub fn tally(&self) -> String {
        format!(
            "{} scenarios, {} passed, {} failed",
            self.total(),
            self.total() - self.failures(),
            self.failures()
        )
    }
}

/// Runs scenario sets one scenario at a time.
pub struct ScenarioRunner {
    chili: Chili,
    /// Only scenarios whose name contains this text run.
    filter: Option<String>,
}

impl ScenarioRunner {
    /// Creates a runner driving the given runner handle.
    pub fn new(chili: Chili) -> Self {
        Self {
            chili,
            filter: None,
        }
    }

    /// Restricts execution to scenarios whose name contains `filter`.
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    /// Returns the scenarios of `set` that will run, in order.
    pub fn selected<'a>(&'a self, set: &'a ScenarioSet) -> impl Iterator<Item = &'a Scenario> + 'a {
        set.runnable().filter(move |scenario| {
            self.filter
                .as_deref()
                .map_or(true, |filter| scenario.name().contains(filter))
        })
    }

    /// Runs every selected scenario of `set` inside the set's directory,
    /// writing one `Verifying:` line per scenario to `out`.
    ///
    /// Assertion failures and timeouts are recorded; any other error aborts
    /// the set and is returned after the working directory is restored.
    pub async fn run_set<W: Write>(&self, set: &ScenarioSet, out: &mut W) -> Result<SetSummary> {
        let _dir = ScopedDirectory::enter(set.dir())?;

        tracing::info!(set = %set.name(), dir = %set.dir().display(), "running scenario set");

        let mut results = Vec::new();
        for scenario in self.selected(set) {
            let started = Instant::now();
            let outcome = match scenario.check(self.chili.clone()).await {
                Ok(true) => Outcome::Pass,
                Ok(false) => {
                    tracing::info!(
                        scenario = %scenario.name(),
                        runner = %self.chili.binary().display(),
                        "scenario failed"
                    );
                    Outcome::Fail
                }
                Err(e @ Error::Timeout { .. }) => {
                    tracing::warn!(scenario = %scenario.name(), error = %e, "scenario timed out");
                    Outcome::TimedOut
                }
                Err(e) => {
                    tracing::error!(
                        set = %set.name(),
                        scenario = %scenario.name(),
                        error = %e,
                        "aborting run"
                    );
                    return Err(e);
                }
            };
            let duration = started.elapsed();

            writeln!(out, "Verifying: {} -> {}", scenario.display_name(), outcome.label())?;
            tracing::debug!(scenario = %scenario.name(), ?outcome, ?duration, "scenario finished");

            results.push(ScenarioResult {
                name: scenario.name().to_string(),
                outcome,
                duration,
            });
        }

        Ok(SetSummary {
            set: set.name().to_string(),
            results,
        })
    }

    /// Runs the sets in order and aggregates their outcomes.
    pub async fn run_all<W: Write>(&self, sets: &[ScenarioSet], out: &mut W) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for set in sets {
            summary.sets.push(self.run_set(set, out).await?);
        }

        tracing::info!(
            total = summary.total(),
            failures = summary.failures(),
            "scenario run complete"
        );

        Ok(summary)
    }
}
