//! Archive inspection without extraction.
//!
//! ZIP archives are read through the codec; RAR archives are listed with
//! `lsar`. Nothing is written to disk.

use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::Result;
use crate::ToolAvailability;
use crate::extraction;
use crate::tools;

/// One entry of an archive listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    /// Name as stored in the archive.
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Compressed size in bytes.
    pub compressed_size: u64,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// Summary of an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveInfo {
    /// Path of the archive.
    pub path: PathBuf,
    /// File name of the archive.
    pub name: String,
    /// Size of the archive file in bytes.
    pub size: u64,
    /// Archive format.
    pub format: ArchiveFormat,
    /// Entries in archive order.
    pub entries: Vec<EntryInfo>,
    /// Number of non-directory entries.
    pub total_files: usize,
    /// Sum of uncompressed sizes.
    pub total_size: u64,
}

/// Lists an archive of the given format.
///
/// # Errors
///
/// - `Io` if the archive cannot be read
/// - `CorruptArchive` if a ZIP central directory is invalid
/// - `MissingDependency` for RAR when `lsar` is not installed
/// - `ExternalToolError` if `lsar` fails
pub fn inspect_archive(
    archive: &Path,
    format: ArchiveFormat,
    tools: &ToolAvailability,
) -> Result<ArchiveInfo> {
    let metadata = std::fs::metadata(archive).map_err(|e| ArchiveError::io(archive, e))?;

    let entries = match format {
        ArchiveFormat::Zip => list_zip(archive)?,
        ArchiveFormat::Rar => {
            let lsar = tools.require_lsar()?;
            tools::list_entries(lsar, archive)?
                .into_iter()
                .map(|entry| EntryInfo {
                    name: entry.name,
                    size: entry.size,
                    compressed_size: entry.compressed_size,
                    is_dir: entry.is_dir,
                })
                .collect()
        }
    };

    let files = entries.iter().filter(|entry| !entry.is_dir);
    let total_files = files.clone().count();
    let total_size = files.map(|entry| entry.size).sum();

    Ok(ArchiveInfo {
        path: archive.to_path_buf(),
        name: archive
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size: metadata.len(),
        format,
        entries,
        total_files,
        total_size,
    })
}

fn list_zip(archive: &Path) -> Result<Vec<EntryInfo>> {
    let mut zip = extraction::zip::open(archive)?;
    (0..zip.len())
        .map(|index| {
            let entry = zip
                .by_index_raw(index)
                .map_err(|e| ArchiveError::from_zip(archive, None, e))?;
            Ok(EntryInfo {
                name: entry.name().to_string(),
                size: entry.size(),
                compressed_size: entry.compressed_size(),
                is_dir: entry.is_dir(),
            })
        })
        .collect()
}
