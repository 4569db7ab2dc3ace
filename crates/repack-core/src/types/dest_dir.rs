//! Validated destination directory type.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use super::SafePath;
use crate::ArchiveError;
use crate::Result;

/// A canonical, existing destination directory for extraction.
///
/// # Examples
///
/// ```no_run
/// use repack_core::types::DestDir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::create("/tmp/extraction")?;
/// println!("Extracting to: {}", dest.as_path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir(PathBuf);

impl DestDir {
    /// Creates the directory (and missing parents) and canonicalizes it.
    ///
    /// # Errors
    ///
    /// Returns `DestinationExists` if the path is an existing non-directory,
    /// or `Io` if it cannot be created or resolved.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() && !path.is_dir() {
            return Err(ArchiveError::DestinationExists { path });
        }
        fs::create_dir_all(&path).map_err(|e| ArchiveError::io(&path, e))?;
        let canonical = path.canonicalize().map_err(|e| ArchiveError::io(&path, e))?;
        Ok(Self(canonical))
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Joins a `SafePath` to this destination directory.
    #[inline]
    #[must_use]
    pub fn join(&self, safe_path: &SafePath) -> PathBuf {
        self.0.join(safe_path.as_path())
    }

    /// Creates the parent directories of `safe_path` and returns its target.
    ///
    /// Parents are walked one component at a time with `symlink_metadata`
    /// and created only after the component above them was checked, so a
    /// symlink already present in the destination can neither redirect a
    /// write nor cause directories to appear outside it. A symlink at the
    /// target itself is rejected as well.
    ///
    /// # Errors
    ///
    /// Returns `PathTraversal` if any existing component of the path is a
    /// symlink, or `Io` if directories cannot be created.
    pub fn prepare(&self, safe_path: &SafePath) -> Result<PathBuf> {
        let traversal = || ArchiveError::PathTraversal {
            entry: safe_path.as_path().to_path_buf(),
        };

        let mut current = self.0.clone();
        let mut components = safe_path.as_path().components().peekable();
        while let Some(component) = components.next() {
            current.push(component);
            let is_leaf = components.peek().is_none();
            match fs::symlink_metadata(&current) {
                Ok(meta) if meta.file_type().is_symlink() => return Err(traversal()),
                Ok(meta) if !is_leaf && !meta.is_dir() => {
                    return Err(ArchiveError::io(
                        &current,
                        io::Error::other("path component is not a directory"),
                    ));
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    if !is_leaf {
                        fs::create_dir(&current).map_err(|e| ArchiveError::io(&current, e))?;
                    }
                }
                Err(e) => return Err(ArchiveError::io(&current, e)),
            }
        }
        Ok(current)
    }

    /// Converts into the inner `PathBuf`.
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}
