//! Engine-owned temporary working directories.

use std::path::Path;

use tempfile::TempDir;

use crate::ArchiveError;
use crate::Result;

/// Temporary directory holding intermediate files of a conversion.
///
/// The directory and its contents are deleted when the value is dropped or
/// [`closed`](Self::close), on every exit path.
#[derive(Debug)]
pub struct WorkingDirectory {
    dir: TempDir,
}

impl WorkingDirectory {
    /// Creates a working directory under `root`, or under the system
    /// temporary directory when `root` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    pub fn new(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("repack-");
        let dir = match root {
            Some(root) => builder
                .tempdir_in(root)
                .map_err(|e| ArchiveError::io(root, e))?,
            None => builder
                .tempdir()
                .map_err(|e| ArchiveError::io(std::env::temp_dir(), e))?,
        };
        tracing::debug!(path = %dir.path().display(), "created working directory");
        Ok(Self { dir })
    }

    /// Path of the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Deletes the directory, returning a warning if removal failed.
    #[must_use]
    pub fn close(self) -> Option<String> {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed working directory");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove working directory");
                Some(format!(
                    "could not remove working directory {}: {e}",
                    path.display()
                ))
            }
        }
    }
}
