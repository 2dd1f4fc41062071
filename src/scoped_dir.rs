//! Scoped working-directory changes.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Changes the process working directory and restores it on drop.
///
/// Scenario sets refer to suite artifacts by relative path, so each set runs
/// inside its own directory. The previous directory is restored on every exit
/// path, including early returns and panics.
#[derive(Debug)]
pub struct ScopedDirectory {
    /// Directory that was active before entering.
    previous: PathBuf,
    /// Directory entered.
    current: PathBuf,
}

impl ScopedDirectory {
    /// Records the current directory and changes into `dir`.
    pub fn enter(dir: impl AsRef<Path>) -> Result<Self> {
        let previous = std::env::current_dir()?;
        let current = dir.as_ref().to_path_buf();
        std::env::set_current_dir(&current)?;

        tracing::debug!(
            from = %previous.display(),
            to = %current.display(),
            "entered scenario directory"
        );

        Ok(Self { previous, current })
    }

    /// Returns the directory that will be restored.
    pub fn previous(&self) -> &Path {
        &self.previous
    }

    /// Returns the directory that was entered.
    pub fn current(&self) -> &Path {
        &self.current
    }
}

impl Drop for ScopedDirectory {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            tracing::error!(
                dir = %self.previous.display(),
                error = %e,
                "failed to restore working directory"
            );
        }
    }
}
