//! Declarative scenario files.
//!
//! A scenario file lists runner invocations and the exit code and counts each
//! one must produce. Suite paths inside the file are relative to the file's
//! own directory.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{Validate, ValidationResult};
use crate::error::{Error, Result};
use crate::invoker::{Invocation, RawResult};
use crate::report::Report;

use super::{predicate, Chili, Scenario, ScenarioSet, SCENARIO_PREFIX};

/// Expected exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExitExpectation {
    /// Exactly this exit code.
    Code(i32),
    /// Zero or any nonzero code.
    Kind(ExitKind),
}

/// Coarse exit status class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitKind {
    Zero,
    Nonzero,
}

impl ExitExpectation {
    /// Returns true if `code` satisfies the expectation.
    pub fn matches(&self, code: i32) -> bool {
        match self {
            ExitExpectation::Code(expected) => code == *expected,
            ExitExpectation::Kind(ExitKind::Zero) => code == 0,
            ExitExpectation::Kind(ExitKind::Nonzero) => code != 0,
        }
    }
}

/// Expected value of one report count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountExpectation {
    /// Exactly this many.
    Exact(u32),
    /// At least this many.
    AtLeast { min: u32 },
}

impl CountExpectation {
    /// Returns true if `count` satisfies the expectation.
    pub fn matches(&self, count: u32) -> bool {
        match self {
            CountExpectation::Exact(expected) => count == *expected,
            CountExpectation::AtLeast { min } => count >= *min,
        }
    }
}

/// Constraints on one invocation's outcome. Unset fields are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    #[serde(default)]
    pub exit: Option<ExitExpectation>,
    #[serde(default)]
    pub executed: Option<CountExpectation>,
    #[serde(default)]
    pub succeeded: Option<CountExpectation>,
    #[serde(default)]
    pub failed: Option<CountExpectation>,
    /// Fails against reports whose format does not track errors.
    #[serde(default)]
    pub errors: Option<CountExpectation>,
}

impl Expectation {
    /// Returns true if any count is constrained, which requires a parsed report.
    pub fn needs_report(&self) -> bool {
        self.executed.is_some()
            || self.succeeded.is_some()
            || self.failed.is_some()
            || self.errors.is_some()
    }

    /// Checks the exit code of an unparsed invocation.
    pub fn check_raw(&self, raw: &RawResult) -> Vec<String> {
        let mut mismatches = Vec::new();
        if let Some(exit) = &self.exit {
            if !exit.matches(raw.exit_code) {
                mismatches.push(format!("exit code {} does not match {:?}", raw.exit_code, exit));
            }
        }
        mismatches
    }

    /// Checks a parsed report, returning one message per violated constraint.
    pub fn check_report(&self, report: &Report) -> Vec<String> {
        let mut mismatches = Vec::new();

        if let Some(exit) = &self.exit {
            if !exit.matches(report.process_return) {
                mismatches.push(format!(
                    "exit code {} does not match {:?}",
                    report.process_return, exit
                ));
            }
        }

        let counts = [
            ("executed", self.executed, Some(report.num_executed)),
            ("succeeded", self.succeeded, Some(report.num_succeeded)),
            ("failed", self.failed, Some(report.num_failed)),
            ("errors", self.errors, report.num_errors),
        ];
        for (label, expected, actual) in counts {
            let Some(expected) = expected else { continue };
            match actual {
                Some(actual) if expected.matches(actual) => {}
                Some(actual) => {
                    mismatches.push(format!("{} = {} does not match {:?}", label, actual, expected))
                }
                None => mismatches.push(format!("{} not reported by this summary format", label)),
            }
        }

        mismatches
    }
}

/// One scenario entry in a scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Scenario name; only names starting with `test_` run.
    pub name: String,
    /// Runner arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Expected outcome.
    #[serde(default)]
    pub expect: Expectation,
}

impl ScenarioSpec {
    /// Builds the scenario predicate.
    pub fn into_scenario(self) -> Scenario {
        let name = self.name;
        let invocation = Invocation::new(self.args);
        let expect = self.expect;
        let label = name.clone();

        Scenario::new(name, move |chili: Chili| {
            let invocation = invocation.clone();
            let expect = expect.clone();
            let label = label.clone();
            predicate(async move {
                let mismatches = if expect.needs_report() {
                    let report = chili.run(invocation).await?;
                    expect.check_report(&report)
                } else {
                    let raw = chili.invoke(invocation).await?;
                    expect.check_raw(&raw)
                };

                for mismatch in &mismatches {
                    tracing::info!(scenario = %label, %mismatch, "expectation not met");
                }
                Ok(mismatches.is_empty())
            })
        })
    }
}

/// A scenario file as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    /// Set name shown in logs and summaries.
    pub name: String,
    /// What this file covers.
    #[serde(default)]
    pub description: String,
    /// Scenarios in execution order.
    #[serde(default)]
    pub scenarios: Vec<ScenarioSpec>,
}

impl ScenarioFile {
    /// Parses a scenario file from YAML text.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Loads a scenario file and compiles it into a set that runs in the
    /// file's directory.
    pub fn load_set(path: impl AsRef<Path>) -> Result<ScenarioSet> {
        let path = path.as_ref();
        let invalid = |reason: String| Error::Fixture {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path)?;
        let file = Self::from_yaml(&content).map_err(|e| invalid(e.to_string()))?;

        let validation = file.validate();
        for warning in &validation.warnings {
            tracing::warn!(fixture = %path.display(), %warning, "scenario file warning");
        }
        if !validation.is_valid() {
            return Err(invalid(validation.errors.join("; ")));
        }

        let dir = std::fs::canonicalize(path)?
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| invalid("scenario file has no parent directory".to_string()))?;

        Ok(file.into_set(dir))
    }

    /// Compiles the file into a set that runs inside `dir`.
    pub fn into_set(self, dir: impl Into<std::path::PathBuf>) -> ScenarioSet {
        let mut set = ScenarioSet::new(self.name, dir);
        for spec in self.scenarios {
            set.push(spec.into_scenario());
        }
        set
    }
}

impl Validate for ScenarioFile {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.name.trim().is_empty() {
            result.add_error("scenario file name cannot be empty");
        }

        if self.scenarios.is_empty() {
            result.add_warning(format!("scenario file '{}' has no scenarios", self.name));
        }

        let mut seen = HashSet::new();
        for spec in &self.scenarios {
            if !seen.insert(spec.name.as_str()) {
                result.add_error(format!("duplicate scenario name '{}'", spec.name));
            }

            if !spec.name.starts_with(SCENARIO_PREFIX) {
                result.add_warning(format!(
                    "scenario '{}' does not start with '{}' and will not run",
                    spec.name, SCENARIO_PREFIX
                ));
            }

            let invocation = Invocation::new(spec.args.iter().cloned());
            for selector in invocation.selectors().filter(|s| !s.is_well_formed()) {
                result.add_warning(format!(
                    "scenario '{}' has malformed selector '{}:{}'",
                    spec.name,
                    selector.path,
                    selector.test.unwrap_or_default()
                ));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::invoker::mock::ScriptedInvoker;

    const NAMED: &str = r#"
name: named-crash
description: "Crashing tests are counted as errors"
scenarios:
  - name: test_named_executes_all_tests_even_when_test_crashes
    args:
      - "./chili_crash.so:test_crash_one"
      - "./chili_crash.so:test_crash_two"
    expect:
      executed: 2
      errors: 2
  - name: test_returns_non_0_when_no_test_suite
    expect:
      exit: nonzero
  - name: test_succeeds_at_least_once
    args: ["./chili_success.so"]
    expect:
      exit: 0
      succeeded: { min: 1 }
"#;

    #[test]
    fn parses_expectations() {
        let file = ScenarioFile::from_yaml(NAMED).unwrap();

        assert_eq!(file.name, "named-crash");
        assert_eq!(file.scenarios.len(), 3);
        assert_eq!(file.scenarios[0].args.len(), 2);
        assert_eq!(file.scenarios[0].expect.executed, Some(CountExpectation::Exact(2)));
        assert_eq!(
            file.scenarios[1].expect.exit,
            Some(ExitExpectation::Kind(ExitKind::Nonzero))
        );
        assert!(file.scenarios[1].args.is_empty());
        assert!(!file.scenarios[1].expect.needs_report());
        assert_eq!(file.scenarios[2].expect.exit, Some(ExitExpectation::Code(0)));
        assert_eq!(
            file.scenarios[2].expect.succeeded,
            Some(CountExpectation::AtLeast { min: 1 })
        );
    }

    #[test]
    fn report_mismatches_are_listed() {
        let expect = Expectation {
            exit: Some(ExitExpectation::Code(3)),
            failed: Some(CountExpectation::Exact(3)),
            errors: Some(CountExpectation::Exact(0)),
            ..Expectation::default()
        };
        let report = Report {
            num_executed: 3,
            num_succeeded: 1,
            num_failed: 2,
            num_errors: None,
            process_return: 2,
        };

        let mismatches = expect.check_report(&report);

        assert_eq!(mismatches.len(), 3);
        assert!(mismatches[0].contains("exit code 2"));
        assert!(mismatches[1].contains("failed = 2"));
        assert!(mismatches[2].contains("errors not reported"));
    }

    #[test]
    fn duplicate_names_are_invalid() {
        let file = ScenarioFile::from_yaml(
            r#"
name: dupes
scenarios:
  - name: test_same
  - name: test_same
  - name: helper
    args: ["./lib.so:"]
"#,
        )
        .unwrap();

        let result = file.validate();

        assert!(!result.is_valid());
        assert!(result.errors[0].contains("test_same"));
        assert!(result.warnings.iter().any(|w| w.contains("will not run")));
        assert!(result.warnings.iter().any(|w| w.contains("malformed selector")));
    }

    #[test]
    fn load_binds_set_to_file_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("named.yaml");
        std::fs::write(&path, NAMED).unwrap();

        let set = ScenarioFile::load_set(&path).unwrap();

        assert_eq!(set.name(), "named-crash");
        assert_eq!(set.dir(), temp.path().canonicalize().unwrap());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn load_rejects_malformed_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yaml");
        std::fs::write(&path, "name: [unterminated").unwrap();

        let err = ScenarioFile::load_set(&path).unwrap_err();

        assert!(matches!(err, Error::Fixture { .. }));
    }

    #[tokio::test]
    async fn compiled_scenarios_evaluate_expectations() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .respond(2, "Executed 2 tests, all with errors\n")
                .respond(1, "")
                .respond(0, "Executed 1 tests, all succeeded\n"),
        );
        let chili = Chili::new(invoker.clone());
        let set = ScenarioFile::from_yaml(NAMED).unwrap().into_set(".");

        let mut outcomes = Vec::new();
        for scenario in set.runnable() {
            outcomes.push(scenario.check(chili.clone()).await.unwrap());
        }

        assert_eq!(outcomes, [true, true, true]);
        assert!(invoker.calls()[1].is_empty());
    }
}
