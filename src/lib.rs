//! Chili conformance harness
//!
//! Drives the chili test runner as a black box: starts it with suite
//! arguments, parses the summary line it prints, and checks exit codes and
//! counts against registered scenarios.

pub mod cli;
pub mod config;
pub mod error;
pub mod harness;
pub mod invoker;
pub mod report;
pub mod scenario;
pub mod scoped_dir;
pub mod suites;

pub use config::{HarnessConfig, Validate, ValidationResult};
pub use error::{Error, Result};
pub use harness::Harness;
pub use invoker::{Invocation, Invoker, ProcessInvoker, RawResult, Selector};
pub use report::{Report, ReportParser, SummaryCounts, SummaryFormat};
pub use scenario::{
    predicate, Chili, Outcome, RunSummary, Scenario, ScenarioFile, ScenarioFuture,
    ScenarioResult, ScenarioRunner, ScenarioSet, SetSummary,
};
pub use scoped_dir::ScopedDirectory;
