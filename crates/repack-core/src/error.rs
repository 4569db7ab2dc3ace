//! Error types for archive operations.
//!
//! Every failure that leaves the engine is an [`ArchiveError`]. Raw I/O and
//! codec errors are wrapped with the path they concern, so a caller can always
//! render a one-line message naming the offending file.

use std::fmt;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Classification of an [`ArchiveError`].
///
/// Shells branch on the kind (for instance to offer installing a missing tool)
/// and display the error's message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// File extension does not name a supported format.
    UnsupportedFormat,
    /// The request cannot be carried out (for instance creating RAR).
    UnsupportedOperation,
    /// Archive structure or an entry checksum is invalid.
    CorruptArchive,
    /// An entry would be written outside the destination directory.
    PathTraversal,
    /// The output path is already occupied.
    DestinationExists,
    /// A required external tool is not installed.
    MissingDependency,
    /// The external tool ran and reported failure.
    ExternalToolError,
    /// A filesystem or process I/O operation failed.
    Io,
    /// The engine is already running a task.
    Busy,
    /// The task was cancelled between entries.
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnsupportedFormat => "unsupported format",
            Self::UnsupportedOperation => "unsupported operation",
            Self::CorruptArchive => "corrupt archive",
            Self::PathTraversal => "path traversal",
            Self::DestinationExists => "destination exists",
            Self::MissingDependency => "missing dependency",
            Self::ExternalToolError => "external tool error",
            Self::Io => "I/O error",
            Self::Busy => "busy",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Errors returned by engine operations.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Archive format is unsupported or unrecognized.
    #[error("unsupported archive format: {path}")]
    UnsupportedFormat {
        /// The file whose format could not be determined.
        path: PathBuf,
    },

    /// The requested operation is not supported.
    #[error("unsupported operation: {reason}")]
    UnsupportedOperation {
        /// Why the operation was rejected.
        reason: String,
    },

    /// Archive is corrupted or invalid.
    #[error("corrupt archive {archive}{}: {reason}", entry_suffix(.entry.as_deref()))]
    CorruptArchive {
        /// The archive being read.
        archive: PathBuf,
        /// The entry being read when corruption was detected, if any.
        entry: Option<PathBuf>,
        /// Codec-provided description.
        reason: String,
    },

    /// Path traversal attempt detected.
    #[error("path traversal detected: {entry}")]
    PathTraversal {
        /// The entry name that would escape the destination.
        entry: PathBuf,
    },

    /// Output path already occupied.
    #[error("destination already exists: {path}")]
    DestinationExists {
        /// The occupied path.
        path: PathBuf,
    },

    /// Required external tool not found.
    #[error("required tool '{tool}' not found; install it with: brew install unar")]
    MissingDependency {
        /// Name of the missing executable.
        tool: String,
    },

    /// External tool exited unsuccessfully.
    #[error("{tool} failed ({status}): {message}")]
    ExternalToolError {
        /// Name of the executable.
        tool: String,
        /// Rendered exit status.
        status: String,
        /// Message derived from the tool's stderr.
        message: String,
    },

    /// I/O operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Engine already running a task.
    #[error("engine is busy with another task")]
    Busy,

    /// Task cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

fn entry_suffix(entry: Option<&Path>) -> String {
    entry.map_or_else(String::new, |e| format!(" (entry {})", e.display()))
}

impl ArchiveError {
    /// Wraps an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds an `UnsupportedOperation` error.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            reason: reason.into(),
        }
    }

    /// Returns the classification of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use repack_core::ArchiveError;
    /// use repack_core::FailureKind;
    ///
    /// assert_eq!(ArchiveError::Busy.kind(), FailureKind::Busy);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::UnsupportedFormat { .. } => FailureKind::UnsupportedFormat,
            Self::UnsupportedOperation { .. } => FailureKind::UnsupportedOperation,
            Self::CorruptArchive { .. } => FailureKind::CorruptArchive,
            Self::PathTraversal { .. } => FailureKind::PathTraversal,
            Self::DestinationExists { .. } => FailureKind::DestinationExists,
            Self::MissingDependency { .. } => FailureKind::MissingDependency,
            Self::ExternalToolError { .. } => FailureKind::ExternalToolError,
            Self::Io { .. } => FailureKind::Io,
            Self::Busy => FailureKind::Busy,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }

    /// Returns the file or entry the failure concerns, when known.
    #[must_use]
    pub fn offending_entry(&self) -> Option<&Path> {
        match self {
            Self::UnsupportedFormat { path }
            | Self::DestinationExists { path }
            | Self::Io { path, .. } => Some(path),
            Self::PathTraversal { entry } => Some(entry),
            Self::CorruptArchive { archive, entry, .. } => {
                Some(entry.as_deref().unwrap_or(archive))
            }
            Self::UnsupportedOperation { .. }
            | Self::MissingDependency { .. }
            | Self::ExternalToolError { .. }
            | Self::Busy
            | Self::Cancelled => None,
        }
    }

    /// Returns `true` if this error means the archive is hostile.
    ///
    /// # Examples
    ///
    /// ```
    /// use repack_core::ArchiveError;
    /// use std::path::PathBuf;
    ///
    /// let err = ArchiveError::PathTraversal {
    ///     entry: PathBuf::from("../etc/passwd"),
    /// };
    /// assert!(err.is_security_violation());
    /// assert!(!ArchiveError::Busy.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::PathTraversal { .. })
    }

    /// Converts a `zip` codec error raised while reading `archive`.
    pub(crate) fn from_zip(
        archive: &Path,
        entry: Option<&Path>,
        err: zip::result::ZipError,
    ) -> Self {
        match err {
            zip::result::ZipError::Io(source) if source.kind() != io::ErrorKind::InvalidData => {
                Self::io(entry.unwrap_or(archive), source)
            }
            other => Self::CorruptArchive {
                archive: archive.to_path_buf(),
                entry: entry.map(Path::to_path_buf),
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ArchiveError::UnsupportedFormat {
            path: PathBuf::from("notes.7z"),
        };
        assert_eq!(err.to_string(), "unsupported archive format: notes.7z");
    }

    #[test]
    fn test_path_traversal_error() {
        let err = ArchiveError::PathTraversal {
            entry: PathBuf::from("../../etc/passwd"),
        };
        assert!(err.to_string().contains("path traversal"));
        assert!(err.to_string().contains("../../etc/passwd"));
        assert_eq!(err.kind(), FailureKind::PathTraversal);
        assert_eq!(
            err.offending_entry(),
            Some(Path::new("../../etc/passwd"))
        );
    }

    #[test]
    fn test_corrupt_archive_names_entry() {
        let err = ArchiveError::CorruptArchive {
            archive: PathBuf::from("a.zip"),
            entry: Some(PathBuf::from("b/c.txt")),
            reason: "Invalid checksum".into(),
        };
        let display = err.to_string();
        assert!(display.contains("a.zip"));
        assert!(display.contains("b/c.txt"));
        assert_eq!(err.offending_entry(), Some(Path::new("b/c.txt")));

        let err = ArchiveError::CorruptArchive {
            archive: PathBuf::from("a.zip"),
            entry: None,
            reason: "bad central directory".into(),
        };
        assert!(!err.to_string().contains("entry"));
        assert_eq!(err.offending_entry(), Some(Path::new("a.zip")));
    }

    #[test]
    fn test_missing_dependency_names_tool() {
        let err = ArchiveError::MissingDependency {
            tool: "unar".into(),
        };
        assert!(err.to_string().contains("'unar'"));
        assert_eq!(err.kind(), FailureKind::MissingDependency);
        assert_eq!(err.offending_entry(), None);
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error;

        let err = ArchiveError::io(
            "/tmp/missing.txt",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        assert_eq!(err.kind(), FailureKind::Io);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/tmp/missing.txt"));
    }

    #[test]
    fn test_from_zip_classifies_checksum_as_corrupt() {
        let io_err = io::Error::new(io::ErrorKind::InvalidData, "Invalid checksum");
        let err = ArchiveError::from_zip(
            Path::new("a.zip"),
            Some(Path::new("x.txt")),
            zip::result::ZipError::Io(io_err),
        );
        assert_eq!(err.kind(), FailureKind::CorruptArchive);

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = ArchiveError::from_zip(Path::new("a.zip"), None, zip::result::ZipError::Io(io_err));
        assert_eq!(err.kind(), FailureKind::Io);
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::DestinationExists.to_string(), "destination exists");
        assert_eq!(FailureKind::Io.to_string(), "I/O error");
    }
}
