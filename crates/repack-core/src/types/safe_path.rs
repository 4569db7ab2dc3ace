//! Validated relative path for archive entries.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveError;
use crate::ExtractConfig;
use crate::Result;

/// An archive entry name that is safe to join onto a destination directory.
///
/// A `SafePath` is relative, contains no `..` component and no null byte,
/// and has been normalized (`.` components and redundant separators
/// removed). Validation is purely lexical and touches no filesystem state;
/// symlinked parents are caught later by [`DestDir::prepare`].
///
/// [`DestDir::prepare`]: super::DestDir::prepare
///
/// # Examples
///
/// ```
/// use repack_core::ExtractConfig;
/// use repack_core::types::SafePath;
/// use std::path::Path;
///
/// let config = ExtractConfig::default();
/// let safe = SafePath::validate("docs/./readme.txt", &config).unwrap();
/// assert_eq!(safe.as_path(), Path::new("docs/readme.txt"));
///
/// assert!(SafePath::validate("../etc/passwd", &config).is_err());
/// assert!(SafePath::validate("/etc/passwd", &config).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath(PathBuf);

impl SafePath {
    /// Validates an entry name.
    ///
    /// Backslashes are treated as separators, so `..\evil` is rejected on
    /// every platform.
    ///
    /// # Errors
    ///
    /// - `PathTraversal` for `..` components, null bytes, drive prefixes, or
    ///   a leading `/` unless `allow_absolute_paths` is set
    /// - `UnsupportedOperation` if the name is deeper than `max_path_depth`
    pub fn validate(name: &str, config: &ExtractConfig) -> Result<Self> {
        let traversal = || ArchiveError::PathTraversal {
            entry: PathBuf::from(name),
        };

        if name.contains('\0') {
            return Err(traversal());
        }

        let unified = name.replace('\\', "/");
        let mut normalized = PathBuf::new();
        let mut depth = 0usize;

        for component in Path::new(&unified).components() {
            match component {
                Component::Normal(part) => {
                    depth += 1;
                    normalized.push(part);
                }
                Component::CurDir => {}
                Component::RootDir if config.allow_absolute_paths => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(traversal());
                }
            }
        }

        // Drive-relative names such as `C:evil` parse as a normal component
        // on Unix.
        if has_drive_letter(&unified) {
            return Err(traversal());
        }

        if depth > config.max_path_depth {
            return Err(ArchiveError::unsupported(format!(
                "entry {name} is nested {depth} levels deep (limit {})",
                config.max_path_depth
            )));
        }

        Ok(Self(normalized))
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Returns `true` if the name normalized to nothing (such as `./`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.as_os_str().is_empty()
    }
}

fn has_drive_letter(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
