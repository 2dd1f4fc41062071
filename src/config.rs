//! Harness configuration and validation.
//!
//! The runner path is the only setting the scenarios depend on; everything
//! else selects what runs and how long an invocation may take.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scenario::ScenarioFile;
use crate::suites;

/// Validation result containing all found issues.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation errors (fatal).
    pub errors: Vec<String>,
    /// List of validation warnings (non-fatal).
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Merges another validation result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Converts to a Result, failing if there are errors.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.is_valid() {
            Ok(self.warnings)
        } else {
            Err(Error::Config(self.errors.join("; ")))
        }
    }
}

/// Trait for validatable configuration types.
pub trait Validate {
    /// Validates the configuration and returns any issues found.
    fn validate(&self) -> ValidationResult;
}

/// Configuration for one harness run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Runner binary. Bare names are looked up on `PATH`.
    #[serde(default = "default_runner")]
    pub runner: PathBuf,

    /// Directory the built-in scenario sets run in.
    #[serde(default = "default_suite_dir")]
    pub suite_dir: PathBuf,

    /// Per-invocation timeout in seconds; unset waits forever.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Whether the built-in scenario sets run.
    #[serde(default = "default_builtin")]
    pub builtin: bool,

    /// Built-in sets to run; empty runs all of them.
    #[serde(default)]
    pub sets: Vec<String>,

    /// Scenario files to run after the built-in sets.
    #[serde(default)]
    pub fixtures: Vec<PathBuf>,

    /// Only scenarios whose name contains this text run.
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_runner() -> PathBuf {
    PathBuf::from("./chili")
}

fn default_suite_dir() -> PathBuf {
    PathBuf::from("test/scenarios")
}

fn default_builtin() -> bool {
    true
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            runner: default_runner(),
            suite_dir: default_suite_dir(),
            timeout_secs: None,
            builtin: default_builtin(),
            sets: Vec::new(),
            fixtures: Vec::new(),
            filter: None,
        }
    }
}

impl HarnessConfig {
    /// Creates a configuration for the given runner with default settings.
    pub fn new(runner: impl Into<PathBuf>) -> Self {
        Self {
            runner: runner.into(),
            ..Self::default()
        }
    }

    /// Sets the directory built-in sets run in.
    pub fn with_suite_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.suite_dir = dir.into();
        self
    }

    /// Sets the per-invocation timeout, rounded up to whole seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let partial = u64::from(timeout.subsec_nanos() > 0);
        self.timeout_secs = Some(timeout.as_secs().saturating_add(partial));
        self
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }

    /// Loads a TOML configuration file.
    ///
    /// Relative paths in the file are resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.resolve_paths(base))
    }

    /// Anchors relative paths at `base`, leaving bare runner names alone so
    /// they still resolve through `PATH`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        self.runner = resolve_runner(&self.runner, base);
        self.suite_dir = base.join(&self.suite_dir);
        self.fixtures = self.fixtures.iter().map(|f| base.join(f)).collect();
        self
    }

    /// Returns the per-invocation timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Joins a runner path onto `base` unless it is absolute or a bare name.
pub fn resolve_runner(runner: &Path, base: &Path) -> PathBuf {
    if runner.is_absolute() || (runner.components().count() <= 1 && !runner.starts_with(".")) {
        runner.to_path_buf()
    } else {
        base.join(runner)
    }
}

impl Validate for HarnessConfig {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.runner.as_os_str().is_empty() {
            result.add_error("runner path cannot be empty");
        } else if self.runner.components().count() > 1 && !self.runner.exists() {
            result.add_warning(format!(
                "runner '{}' does not exist; every scenario will see a missing binary",
                self.runner.display()
            ));
        }

        match self.timeout_secs {
            Some(0) => result.add_error("timeout_secs must be at least 1"),
            None => result.add_warning("no timeout configured; a hung runner blocks the harness"),
            Some(_) => {}
        }

        if self.builtin {
            if !self.suite_dir.is_dir() {
                result.add_error(format!(
                    "suite directory '{}' does not exist",
                    self.suite_dir.display()
                ));
            }
            for set in &self.sets {
                if !suites::NAMES.contains(&set.as_str()) {
                    result.add_error(format!(
                        "unknown scenario set '{}' (known: {})",
                        set,
                        suites::NAMES.join(", ")
                    ));
                }
            }
        } else if self.fixtures.is_empty() {
            result.add_error("built-in sets disabled and no scenario files given");
        }

        for fixture in &self.fixtures {
            result.merge(validate_fixture(fixture));
        }

        result
    }
}

/// Checks that a scenario file exists, parses, and is itself valid.
fn validate_fixture(path: &Path) -> ValidationResult {
    let mut result = ValidationResult::default();

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) if !path.is_file() => {
            result.add_error(format!("scenario file '{}' not found", path.display()));
            return result;
        }
        Err(e) => {
            result.add_error(format!("scenario file '{}' unreadable: {}", path.display(), e));
            return result;
        }
    };

    match ScenarioFile::from_yaml(&content) {
        Ok(file) => result.merge(file.validate()),
        Err(e) => result.add_error(format!("scenario file '{}': {}", path.display(), e)),
    }

    result
}
