//! Subprocess-backed runner invocation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};

use super::{Invocation, Invoker, RawResult};

/// Exit code reported when the runner binary does not exist.
pub const EXIT_NOT_FOUND: i32 = 127;

/// Exit code reported when the runner binary cannot be executed.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;

// errno values shared by Linux, macOS and the BSDs.
const ENOEXEC: i32 = 8;
const ENOTDIR: i32 = 20;

/// Shell-style exit code for an exec failure caused by the binary itself.
///
/// Returns `None` for resource faults (descriptor or process exhaustion,
/// out of memory), which are not a property of the runner.
fn unlaunchable_exit_code(error: &std::io::Error) -> Option<i32> {
    match (error.kind(), error.raw_os_error()) {
        (ErrorKind::NotFound, _) | (_, Some(ENOTDIR)) => Some(EXIT_NOT_FOUND),
        (ErrorKind::PermissionDenied, _) | (_, Some(ENOEXEC)) => Some(EXIT_NOT_EXECUTABLE),
        _ => None,
    }
}

/// Starts the runner as a child process and captures its output.
///
/// The environment is inherited untouched and stdin is closed. Without a
/// timeout a hung runner blocks the caller indefinitely.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    /// Path to the runner binary.
    binary: PathBuf,
    /// Upper bound on a single invocation.
    timeout: Option<Duration>,
}

impl ProcessInvoker {
    /// Creates an invoker for the given runner binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    /// Sets the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Converts a failed spawn into a raw result when the binary is missing
    /// or cannot be executed.
    fn unlaunchable(&self, error: std::io::Error, started: Instant) -> Result<RawResult> {
        let Some(exit_code) = unlaunchable_exit_code(&error) else {
            return Err(Error::Spawn {
                binary: self.binary.clone(),
                source: error,
            });
        };

        tracing::warn!(
            binary = %self.binary.display(),
            exit_code,
            error = %error,
            "runner could not be started"
        );

        Ok(RawResult::new(exit_code, Vec::new(), error.to_string()).with_duration(started.elapsed()))
    }
}

#[async_trait]
impl Invoker for ProcessInvoker {
    async fn invoke(&self, invocation: &Invocation) -> Result<RawResult> {
        tracing::debug!(
            binary = %self.binary.display(),
            args = ?invocation.args(),
            "invoking runner"
        );

        let started = Instant::now();
        let child = Command::new(&self.binary)
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => return self.unlaunchable(e, started),
        };

        let waited = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(waited) => waited,
                Err(_) => {
                    // Dropping the wait future drops the child, which kills it.
                    tracing::warn!(
                        binary = %self.binary.display(),
                        timeout = ?timeout,
                        "runner timed out"
                    );
                    return Err(Error::Timeout {
                        binary: self.binary.clone(),
                        timeout,
                    });
                }
            },
            None => child.wait_with_output().await,
        };
        let output = waited?;

        let result = RawResult::new(exit_code(output.status), output.stdout, output.stderr)
            .with_duration(started.elapsed());

        tracing::debug!(
            exit_code = result.exit_code,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            duration = ?result.duration,
            "runner exited"
        );

        Ok(result)
    }

    fn binary(&self) -> &Path {
        &self.binary
    }
}

/// Maps an exit status to an integer, using `128 + signal` for processes
/// terminated by a signal.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
