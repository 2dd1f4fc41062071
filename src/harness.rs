//! Top-level orchestration: configuration in, run summary out.

use std::io::Write;
use std::sync::Arc;

use crate::config::{resolve_runner, HarnessConfig, Validate};
use crate::error::{Error, Result};
use crate::invoker::{Invoker, ProcessInvoker};
use crate::scenario::{Chili, RunSummary, ScenarioFile, ScenarioRunner, ScenarioSet};
use crate::suites;

/// Runs the configured scenario sets against one runner binary.
pub struct Harness {
    config: HarnessConfig,
    invoker: Arc<dyn Invoker>,
}

impl Harness {
    /// Validates the configuration and builds a subprocess-backed harness.
    ///
    /// Relative paths are anchored at the current directory before any set
    /// changes it.
    pub fn new(config: HarnessConfig) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let mut config = config;
        config.runner = resolve_runner(&config.runner, &cwd);
        config.suite_dir = cwd.join(&config.suite_dir);
        config.fixtures = config.fixtures.iter().map(|f| cwd.join(f)).collect();

        for warning in config.validate().into_result()? {
            tracing::warn!(%warning, "configuration warning");
        }

        let invoker = ProcessInvoker::new(&config.runner).with_timeout(config.timeout());
        tracing::info!(
            runner = %config.runner.display(),
            suite_dir = %config.suite_dir.display(),
            timeout = ?invoker.timeout(),
            "harness configured"
        );

        Ok(Self {
            config,
            invoker: Arc::new(invoker),
        })
    }

    /// Builds a harness around an existing invoker without validation.
    pub fn with_invoker(config: HarnessConfig, invoker: Arc<dyn Invoker>) -> Self {
        Self { config, invoker }
    }

    /// Returns the effective configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Builds the selected built-in sets followed by the fixture sets.
    pub fn scenario_sets(&self) -> Result<Vec<ScenarioSet>> {
        let mut sets = Vec::new();

        if self.config.builtin && self.config.sets.is_empty() {
            sets.extend(suites::builtin(&self.config.suite_dir));
        } else if self.config.builtin {
            for name in &self.config.sets {
                let set = suites::by_name(name, &self.config.suite_dir)
                    .ok_or_else(|| Error::Config(format!("unknown scenario set '{}'", name)))?;
                sets.push(set);
            }
        }

        for fixture in &self.config.fixtures {
            sets.push(ScenarioFile::load_set(fixture)?);
        }

        Ok(sets)
    }

    fn runner(&self) -> ScenarioRunner {
        ScenarioRunner::new(Chili::new(self.invoker.clone())).with_filter(self.config.filter.clone())
    }

    /// Writes `set: scenario` for every scenario that would run.
    pub fn list<W: Write>(&self, out: &mut W) -> Result<usize> {
        let runner = self.runner();
        let mut count = 0;
        for set in self.scenario_sets()? {
            for scenario in runner.selected(&set) {
                writeln!(out, "{}: {}", set.name(), scenario.name())?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Runs every selected scenario and prints the tally line.
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<RunSummary> {
        let sets = self.scenario_sets()?;
        let summary = self.runner().run_all(&sets, out).await?;
        writeln!(out, "{}", summary.tally())?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use crate::invoker::mock::ScriptedInvoker;
    use crate::scoped_dir::test_support::cwd_lock;

    fn config_in(temp: &TempDir) -> HarnessConfig {
        HarnessConfig::new("chili").with_suite_dir(temp.path())
    }

    #[test]
    fn selected_sets_keep_requested_order() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config.sets = vec!["exit_codes".to_string(), "execution".to_string()];
        let harness = Harness::with_invoker(config, Arc::new(ScriptedInvoker::new()));

        let names: Vec<_> = harness
            .scenario_sets()
            .unwrap()
            .iter()
            .map(|s| s.name().to_string())
            .collect();

        assert_eq!(names, ["exit_codes", "execution"]);
    }

    #[test]
    fn no_selection_runs_every_builtin_set() {
        let temp = TempDir::new().unwrap();
        let harness = Harness::with_invoker(config_in(&temp), Arc::new(ScriptedInvoker::new()));

        let names: Vec<_> = harness
            .scenario_sets()
            .unwrap()
            .iter()
            .map(|s| s.name().to_string())
            .collect();

        assert_eq!(names, suites::NAMES);
    }

    #[test]
    fn fixtures_follow_builtin_sets() {
        let temp = TempDir::new().unwrap();
        let fixture = temp.path().join("extra.yaml");
        std::fs::write(
            &fixture,
            "name: extra\nscenarios:\n  - name: test_no_args\n    args: []\n    expect:\n      exit: nonzero\n",
        )
        .unwrap();

        let mut config = config_in(&temp);
        config.sets = vec!["process".to_string()];
        config.fixtures = vec![fixture];
        let harness = Harness::with_invoker(config, Arc::new(ScriptedInvoker::new()));

        let sets = harness.scenario_sets().unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[1].name(), "extra");
        assert_eq!(sets[1].dir(), temp.path().canonicalize().unwrap());
    }

    #[test]
    fn unknown_set_is_a_config_error() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config.sets = vec!["nope".to_string()];
        let harness = Harness::with_invoker(config, Arc::new(ScriptedInvoker::new()));

        assert!(matches!(harness.scenario_sets(), Err(Error::Config(_))));
    }

    #[test]
    fn list_honors_filter() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config.sets = vec!["process".to_string(), "named_process".to_string()];
        config.filter = Some("suite_setup".to_string());
        let harness = Harness::with_invoker(config, Arc::new(ScriptedInvoker::new()));

        let mut out = Vec::new();
        let count = harness.list(&mut out).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "process: test_process_returns_non_0_on_suite_setup_error\n\
             named_process: test_named_process_returns_non_0_on_suite_setup_error\n"
        );
    }

    #[test]
    fn new_rejects_invalid_config() {
        let _lock = cwd_lock();
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp).with_timeout(std::time::Duration::ZERO);

        assert!(matches!(Harness::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn new_rejects_invalid_fixture_before_running() {
        let _lock = cwd_lock();
        let temp = TempDir::new().unwrap();
        let fixture = temp.path().join("bad.yaml");
        std::fs::write(&fixture, "name: \"\"\nscenarios: []\n").unwrap();

        let mut config = config_in(&temp);
        config.fixtures = vec![fixture];

        match Harness::new(config) {
            Err(Error::Config(message)) => assert!(message.contains("name cannot be empty")),
            other => panic!("expected config error, got {:?}", other.err()),
        }
    }

    #[test]
    fn new_anchors_relative_runner() {
        let _lock = cwd_lock();
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config.runner = PathBuf::from("./build/chili");

        let harness = Harness::new(config).unwrap();

        assert!(harness.config().runner.is_absolute());
        assert!(harness.config().runner.ends_with("build/chili"));
    }

    #[tokio::test]
    async fn run_prints_tally() {
        let _lock = cwd_lock();
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config.sets = vec!["exit_codes".to_string()];
        let harness = Harness::with_invoker(
            config,
            Arc::new(
                ScriptedInvoker::new().respond(3, "Executed: 3, Succeeded: 0, Failed: 3, Errors: 0\n"),
            ),
        );

        let mut out = Vec::new();
        let summary = harness.run(&mut out).await.unwrap();

        assert!(summary.passed());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Verifying: exit code equals failed count -> ok\n1 scenarios, 1 passed, 0 failed\n"
        );
    }
}
