//! Archive task descriptions.

use std::path::PathBuf;

use serde::Serialize;

use crate::ArchiveFormat;

/// Kind of work a task asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Unpack one archive into a directory.
    Extract,
    /// Pack files and directories into a new archive.
    Compress,
    /// Repack an archive into another format.
    Convert,
}

impl Operation {
    /// Lowercase name used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Compress => "compress",
            Self::Convert => "convert",
        }
    }
}

/// Lifecycle of a submitted task.
///
/// `Pending -> Running -> {Succeeded | Failed | Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Submitted and being validated; nothing touched on disk yet.
    Pending,
    /// Emitting progress.
    Running,
    /// Finished with a success result.
    Succeeded,
    /// Finished with a failure result.
    Failed,
    /// Stopped on request.
    Cancelled,
}

impl TaskState {
    /// Returns `true` for the three final states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// A request submitted to the engine.
///
/// Tasks are built once and passed by reference; the engine never modifies
/// them.
///
/// # Examples
///
/// ```
/// use repack_core::ArchiveFormat;
/// use repack_core::ArchiveTask;
/// use repack_core::Operation;
///
/// let task = ArchiveTask::convert("photos.rar", "photos.zip", ArchiveFormat::Zip);
/// assert_eq!(task.operation, Operation::Convert);
/// assert!(!task.overwrite);
///
/// let task = ArchiveTask::compress(["docs", "notes.txt"], "bundle.zip").with_overwrite(true);
/// assert_eq!(task.source_paths.len(), 2);
/// assert_eq!(task.target_format, Some(ArchiveFormat::Zip));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTask {
    /// Requested operation.
    pub operation: Operation,
    /// Input files, directories or the archive to read.
    pub source_paths: Vec<PathBuf>,
    /// Output directory (Extract) or archive file (Compress, Convert).
    pub destination: PathBuf,
    /// Source archive format; detected from the extension when `None`.
    pub source_format: Option<ArchiveFormat>,
    /// Format to write; required for Compress and Convert.
    pub target_format: Option<ArchiveFormat>,
    /// Replace an existing destination archive.
    pub overwrite: bool,
}

impl ArchiveTask {
    /// Extract `archive` into the directory `destination`.
    pub fn extract(archive: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            operation: Operation::Extract,
            source_paths: vec![archive.into()],
            destination: destination.into(),
            source_format: None,
            target_format: None,
            overwrite: false,
        }
    }

    /// Compress `sources` into a ZIP archive at `destination`.
    pub fn compress<I, P>(sources: I, destination: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            operation: Operation::Compress,
            source_paths: sources.into_iter().map(Into::into).collect(),
            destination: destination.into(),
            source_format: None,
            target_format: Some(ArchiveFormat::Zip),
            overwrite: false,
        }
    }

    /// Convert `archive` into a `target` archive at `destination`.
    pub fn convert(
        archive: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        target: ArchiveFormat,
    ) -> Self {
        Self {
            operation: Operation::Convert,
            source_paths: vec![archive.into()],
            destination: destination.into(),
            source_format: None,
            target_format: Some(target),
            overwrite: false,
        }
    }

    /// Pins the source format instead of detecting it.
    #[must_use]
    pub fn with_source_format(mut self, format: ArchiveFormat) -> Self {
        self.source_format = Some(format);
        self
    }

    /// Sets the target format.
    #[must_use]
    pub fn with_target_format(mut self, format: ArchiveFormat) -> Self {
        self.target_format = Some(format);
        self
    }

    /// Sets whether an existing destination archive may be replaced.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}
