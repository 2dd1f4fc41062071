use std::path::PathBuf;

use clap::Parser;

use crate::config::HarnessConfig;
use crate::error::Result;

const LONG_ABOUT: &str = r#"Checks that a chili test runner honors its command-line contract.

Each scenario starts the runner once, reads the summary line it prints and
checks the exit status and counts. Built-in sets run inside the suite
directory, where the chili_*.so test artifacts live; scenario files run in
their own directory.

EXIT STATUS:
    0  every scenario passed
    1  at least one scenario failed or timed out
    2  the run could not complete (bad config, unreadable output, spawn fault)

EXAMPLES:
    chili-conformance --runner ./build/chili --suite-dir test/scenarios
    chili-conformance --set named_execution --timeout 10
    chili-conformance --no-builtin regressions.yaml"#;

#[derive(Debug, Parser)]
#[command(name = "chili-conformance")]
#[command(author, version)]
#[command(about = "Conformance scenarios for the chili test runner")]
#[command(long_about = LONG_ABOUT)]
pub struct Cli {
    /// Scenario files to run after the built-in sets
    pub fixtures: Vec<PathBuf>,

    /// Runner binary (default: ./chili)
    #[arg(long, env = "CHILI_RUNNER")]
    pub runner: Option<PathBuf>,

    /// Directory containing the suite artifacts
    #[arg(long)]
    pub suite_dir: Option<PathBuf>,

    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Per-invocation timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Built-in set to run (repeatable; default: all)
    #[arg(long = "set", value_name = "NAME")]
    pub sets: Vec<String>,

    /// Skip the built-in sets
    #[arg(long)]
    pub no_builtin: bool,

    /// Only run scenarios whose name contains TEXT
    #[arg(short, long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Print the run summary as JSON after the run
    #[arg(long)]
    pub json: bool,

    /// List the selected scenarios without running them
    #[arg(long)]
    pub list: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the effective configuration: file values first, then flags.
    pub fn harness_config(&self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };

        if let Some(runner) = &self.runner {
            config.runner = runner.clone();
        }
        if let Some(dir) = &self.suite_dir {
            config.suite_dir = dir.clone();
        }
        if self.timeout.is_some() {
            config.timeout_secs = self.timeout;
        }
        if !self.sets.is_empty() {
            config.sets = self.sets.clone();
        }
        if self.no_builtin {
            config.builtin = false;
        }
        if self.filter.is_some() {
            config.filter = self.filter.clone();
        }
        config.fixtures.extend(self.fixtures.iter().cloned());

        Ok(config)
    }
}
