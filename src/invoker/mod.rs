//! Runner invocation.
//!
//! An [`Invoker`] starts the runner once per [`Invocation`] and hands back the
//! captured [`RawResult`]. Nothing here interprets the output; that is the
//! job of [`crate::report::ReportParser`].

mod process;

pub use process::{ProcessInvoker, EXIT_NOT_EXECUTABLE, EXIT_NOT_FOUND};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Ordered arguments for one runner invocation.
///
/// Each argument is either a suite artifact path or a `path:testname`
/// named selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Invocation {
    args: Vec<String>,
}

impl Invocation {
    /// Creates an invocation from the given arguments, preserving order.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the arguments in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns true if the runner will be started without arguments.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Splits every argument into the suite path and optional test name.
    pub fn selectors(&self) -> impl Iterator<Item = Selector<'_>> {
        self.args.iter().map(|arg| Selector::parse(arg))
    }
}

impl<const N: usize> From<[&str; N]> for Invocation {
    fn from(args: [&str; N]) -> Self {
        Invocation::new(args)
    }
}

impl From<Vec<String>> for Invocation {
    fn from(args: Vec<String>) -> Self {
        Invocation::new(args)
    }
}

/// One argument of an invocation, split at the first `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector<'a> {
    /// Path to the suite artifact.
    pub path: &'a str,
    /// Test name for named selectors.
    pub test: Option<&'a str>,
}

impl<'a> Selector<'a> {
    /// Parses an argument, trimming whitespace around both halves the way
    /// the runner's named-test reader does.
    pub fn parse(arg: &'a str) -> Self {
        match arg.split_once(':') {
            Some((path, test)) => Self {
                path: path.trim(),
                test: Some(test.trim()),
            },
            None => Self {
                path: arg.trim(),
                test: None,
            },
        }
    }

    /// Returns true if both halves of a named selector are non-empty.
    pub fn is_well_formed(&self) -> bool {
        !self.path.is_empty() && self.test.map_or(true, |t| !t.is_empty())
    }
}

/// Captured outcome of a single runner process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResult {
    /// Process exit code; `128 + signal` when killed by a signal.
    pub exit_code: i32,
    /// Everything the runner wrote to stdout.
    pub stdout: Vec<u8>,
    /// Everything the runner wrote to stderr.
    pub stderr: Vec<u8>,
    /// Wall-clock time from spawn to exit.
    pub duration: Duration,
}

impl RawResult {
    /// Creates a raw result with zero duration.
    pub fn new(exit_code: i32, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration: Duration::ZERO,
        }
    }

    /// Sets the measured duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns stdout decoded as UTF-8, replacing invalid sequences.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Returns stderr decoded as UTF-8, replacing invalid sequences.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Returns true if the runner exited 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait for starting the runner under test.
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Runs the runner once with the given arguments and waits for it to exit.
    async fn invoke(&self, invocation: &Invocation) -> Result<RawResult>;

    /// Returns the path of the runner binary.
    fn binary(&self) -> &Path;
}

#[cfg(test)]
pub mod mock {
    //! Scripted invoker for exercising scenarios without a runner binary.

    use super::*;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use crate::error::Error;

    /// Replays queued responses and records every invocation it receives.
    pub struct ScriptedInvoker {
        binary: PathBuf,
        responses: Mutex<VecDeque<Result<RawResult>>>,
        calls: Mutex<Vec<Invocation>>,
    }

    impl Default for ScriptedInvoker {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ScriptedInvoker {
        pub fn new() -> Self {
            Self {
                binary: PathBuf::from("scripted-chili"),
                responses: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Queues a response with the given exit code and stdout.
        pub fn respond(self, exit_code: i32, stdout: &str) -> Self {
            self.push(Ok(RawResult::new(exit_code, stdout, Vec::new())))
        }

        /// Queues a timeout.
        pub fn time_out(self) -> Self {
            let binary = self.binary.clone();
            self.push(Err(Error::Timeout {
                binary,
                timeout: Duration::from_millis(10),
            }))
        }

        fn push(self, response: Result<RawResult>) -> Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        /// Returns the invocations received so far.
        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Invoker for ScriptedInvoker {
        async fn invoke(&self, invocation: &Invocation) -> Result<RawResult> {
            self.calls.lock().unwrap().push(invocation.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("no scripted response for {:?}", invocation))
        }

        fn binary(&self) -> &Path {
            &self.binary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_preserves_argument_order() {
        let invocation = Invocation::new(["./b.so", "./a.so:test_one"]);
        assert_eq!(invocation.args(), &["./b.so", "./a.so:test_one"]);
        assert!(!invocation.is_empty());
        assert!(Invocation::default().is_empty());
    }

    #[test]
    fn selector_splits_named_tests() {
        let invocation = Invocation::new(["./chili_crash.so:test_crash_one", "./chili_success.so"]);
        let selectors: Vec<_> = invocation.selectors().collect();

        assert_eq!(selectors[0].path, "./chili_crash.so");
        assert_eq!(selectors[0].test, Some("test_crash_one"));
        assert_eq!(selectors[1].path, "./chili_success.so");
        assert_eq!(selectors[1].test, None);
    }

    #[test]
    fn selector_trims_whitespace() {
        let selector = Selector::parse("  ./lib.so :  test_x ");
        assert_eq!(selector.path, "./lib.so");
        assert_eq!(selector.test, Some("test_x"));
        assert!(selector.is_well_formed());
    }

    #[test]
    fn selector_with_empty_half_is_malformed() {
        assert!(!Selector::parse("./lib.so:").is_well_formed());
        assert!(!Selector::parse(":test_x").is_well_formed());
    }

    #[test]
    fn invocation_serializes_as_plain_list() {
        let invocation = Invocation::new(["./chili_success.so"]);
        assert_eq!(
            serde_json::to_string(&invocation).unwrap(),
            r#"["./chili_success.so"]"#
        );
    }

    #[test]
    fn raw_result_decodes_lossily() {
        let raw = RawResult::new(0, b"ok \xff".to_vec(), Vec::new());
        assert!(raw.success());
        assert_eq!(raw.stdout_text(), "ok \u{fffd}");
    }
}
