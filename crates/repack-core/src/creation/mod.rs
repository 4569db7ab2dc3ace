//! Archive creation from files and directories.

pub mod filters;
pub mod walker;
pub mod zip;

use std::path::Path;
use std::path::PathBuf;

use crate::CompressConfig;
use crate::progress::CancellationToken;

pub use walker::EntryType;
pub use walker::FilteredEntry;
pub use walker::FilteredWalker;
pub use walker::collect_entries;

/// Inputs for creating an archive.
#[derive(Debug, Clone, Copy)]
pub struct CompressRequest<'a> {
    /// Files and directories to archive, in order.
    pub sources: &'a [PathBuf],
    /// Archive file to create.
    pub destination: &'a Path,
    /// Replace an existing destination file.
    pub overwrite: bool,
    /// Write an empty archive instead of failing when nothing was collected.
    pub allow_empty: bool,
    /// Creation settings.
    pub config: &'a CompressConfig,
    /// Checked between entries.
    pub cancel: &'a CancellationToken,
}
