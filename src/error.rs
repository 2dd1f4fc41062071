//! Error types for the chili conformance harness.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type for harness operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The runner exited 0 without printing a summary line.
    ///
    /// A successful run is contracted to always report, so this means the
    /// runner's output protocol changed or broke.
    #[error("runner exited with {exit_code} but printed no recognizable summary:\n{stdout}")]
    MissingSummary { exit_code: i32, stdout: String },

    /// The runner did not terminate within the configured timeout.
    #[error("runner {} did not exit within {timeout:?}", binary.display())]
    Timeout { binary: PathBuf, timeout: Duration },

    /// The runner could not be started for a reason other than a missing or
    /// non-executable binary.
    #[error("failed to spawn {}: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error while managing the working directory or reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A run summary could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Harness configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A scenario fixture could not be loaded.
    #[error("invalid scenario fixture {}: {reason}", path.display())]
    Fixture { path: PathBuf, reason: String },
}

impl Error {
    /// Returns true if the error must abort the whole run.
    ///
    /// Only timeouts are local to the scenario that hit them.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Timeout { .. })
    }
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, Error>;
