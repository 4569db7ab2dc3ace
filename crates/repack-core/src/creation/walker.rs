//! Source collection for archive creation.
//!
//! Directory sources are walked recursively with symlinks followed and
//! children visited in file-name order, so archives are reproducible.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::ArchiveError;
use crate::CompressConfig;
use crate::Result;
use crate::creation::filters;

/// Kind of a collected entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// Regular file (or a symlink resolved to one).
    File,
    /// Directory with no included children.
    Directory,
}

/// A source entry ready to be added to an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredEntry {
    /// Full filesystem path to the entry.
    pub path: PathBuf,
    /// Relative path inside the archive.
    pub archive_path: PathBuf,
    /// File or directory.
    pub entry_type: EntryType,
    /// Size in bytes (0 for directories).
    pub size: u64,
}

/// Walks one directory source, applying the configured filters.
pub struct FilteredWalker<'a> {
    root: &'a Path,
    prefix: Option<&'a Path>,
    config: &'a CompressConfig,
}

impl<'a> FilteredWalker<'a> {
    /// Creates a walker for `root`.
    ///
    /// Entries are stored at the archive root, or under `prefix` when given.
    #[must_use]
    pub fn new(root: &'a Path, prefix: Option<&'a Path>, config: &'a CompressConfig) -> Self {
        Self {
            root,
            prefix,
            config,
        }
    }

    /// Returns the included entries in walk order.
    ///
    /// # Errors
    ///
    /// Returns `Io` naming the path that could not be read, including broken
    /// symlinks and symlink loops.
    pub fn walk(&self) -> Result<Vec<FilteredEntry>> {
        let walker = WalkDir::new(self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry
                    .path()
                    .strip_prefix(self.root)
                    .map_or(true, |relative| {
                        relative.as_os_str().is_empty() || !filters::should_skip(relative, self.config)
                    })
            });

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.root).to_path_buf();
                ArchiveError::io(path, e.into())
            })?;
            let path = entry.path();
            let relative = path.strip_prefix(self.root).unwrap_or(path);
            if relative.as_os_str().is_empty() && self.prefix.is_none() {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| {
                ArchiveError::io(path, e.into())
            })?;
            let entry_type = if metadata.is_dir() {
                EntryType::Directory
            } else {
                EntryType::File
            };

            entries.push(FilteredEntry {
                path: path.to_path_buf(),
                archive_path: filters::compute_archive_path(path, self.root, self.prefix)?,
                entry_type,
                size: if entry_type == EntryType::File {
                    metadata.len()
                } else {
                    0
                },
            });
        }
        Ok(entries)
    }
}

/// Collects the entries of every source, in source order.
///
/// A single directory source contributes its contents at the archive root.
/// With several sources each directory is nested under its own base name.
/// Plain files are stored under their file name. Only directories that end
/// up with no included children are kept as explicit entries.
///
/// Filters apply inside directory sources; sources named explicitly are
/// always included.
///
/// # Errors
///
/// Returns `Io` if a source is missing or unreadable.
pub fn collect_entries<P: AsRef<Path>>(
    sources: &[P],
    config: &CompressConfig,
) -> Result<Vec<FilteredEntry>> {
    let single_source = sources.len() == 1;
    let mut entries = Vec::new();

    for source in sources {
        let path = source.as_ref();
        let metadata = fs::metadata(path).map_err(|e| ArchiveError::io(path, e))?;

        if metadata.is_dir() {
            if single_source {
                entries.extend(FilteredWalker::new(path, None, config).walk()?);
            } else {
                let name = base_name(path)?;
                entries.extend(FilteredWalker::new(path, Some(&name), config).walk()?);
            }
        } else {
            entries.push(FilteredEntry {
                path: path.to_path_buf(),
                archive_path: base_name(path)?,
                entry_type: EntryType::File,
                size: metadata.len(),
            });
        }
    }

    Ok(prune_parent_directories(entries))
}

/// Base name of a source; `..` and `.` are resolved first.
fn base_name(path: &Path) -> Result<PathBuf> {
    if let Some(name) = path.file_name() {
        return Ok(PathBuf::from(name));
    }
    let canonical = path.canonicalize().map_err(|e| ArchiveError::io(path, e))?;
    canonical
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| {
            ArchiveError::unsupported(format!("cannot archive {} without a name", path.display()))
        })
}

/// Drops directory entries that have included descendants.
fn prune_parent_directories(entries: Vec<FilteredEntry>) -> Vec<FilteredEntry> {
    let ancestors: HashSet<PathBuf> = entries
        .iter()
        .flat_map(|entry| entry.archive_path.ancestors().skip(1))
        .filter(|ancestor| !ancestor.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .collect();

    entries
        .into_iter()
        .filter(|entry| {
            entry.entry_type == EntryType::File || !ancestors.contains(&entry.archive_path)
        })
        .collect()
}
