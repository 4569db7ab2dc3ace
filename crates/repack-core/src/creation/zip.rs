//! ZIP archive creation.
//!
//! The archive is written to a temporary file next to the destination and
//! renamed into place only once it is complete. Any failure, including
//! cancellation, drops the temporary file, so an existing destination is never
//! touched and no partial archive is left behind.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::CompressRequest;
use crate::ArchiveError;
use crate::CompressConfig;
use crate::OperationReport;
use crate::Result;
use crate::copy::CopyBuffer;
use crate::copy::CopyError;
use crate::copy::copy_with_buffer;
use crate::creation::filters;
use crate::creation::walker::EntryType;
use crate::creation::walker::FilteredEntry;
use crate::creation::walker::collect_entries;
use crate::progress::Phase;
use crate::progress::ProgressSink;
use crate::progress::ProgressTracker;

/// Fails with `DestinationExists` if `destination` may not be written.
///
/// An existing directory is never replaced; an existing file only with
/// `overwrite`.
pub fn check_destination(destination: &Path, overwrite: bool) -> Result<()> {
    match std::fs::symlink_metadata(destination) {
        Ok(metadata) if metadata.is_dir() || !overwrite => Err(ArchiveError::DestinationExists {
            path: destination.to_path_buf(),
        }),
        _ => Ok(()),
    }
}

/// Creates a ZIP archive from the request's sources.
///
/// # Errors
///
/// - `DestinationExists` if the destination is occupied and `overwrite` is
///   not set
/// - `UnsupportedOperation` if nothing is left to archive after filtering
///   and `allow_empty` is not set, or two sources map to the same entry name
/// - `Io` naming the source or destination that failed
/// - `Cancelled` if the token was triggered between entries
pub fn create_zip(
    request: &CompressRequest<'_>,
    sink: &mut dyn ProgressSink,
) -> Result<OperationReport> {
    let destination = request.destination;
    request.config.validate()?;
    check_destination(destination, request.overwrite)?;

    let entries = without_destination(collect_entries(request.sources, request.config)?, destination);
    if entries.is_empty() && !request.allow_empty {
        return Err(ArchiveError::unsupported("no files to compress"));
    }
    let names = entry_names(&entries)?;

    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = tempfile::Builder::new()
        .prefix(".repack-")
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(|e| ArchiveError::io(parent, e))?;

    let mut zip = ZipWriter::new(BufWriter::with_capacity(64 * 1024, temp));
    let options = file_options(request.config);
    let mut tracker = ProgressTracker::new(sink, request.cancel, Phase::Compressing, Some(entries.len()));
    let mut report = OperationReport::new(destination);
    let mut buffer = CopyBuffer::new();

    for (entry, name) in entries.iter().zip(&names) {
        tracker.checkpoint()?;
        match entry.entry_type {
            EntryType::Directory => {
                zip.add_directory(name.as_str(), options)
                    .map_err(|e| write_error(destination, e))?;
            }
            EntryType::File => {
                report.bytes_processed +=
                    add_file(&mut zip, entry, name, options, request, &mut buffer)?;
            }
        }
        tracing::debug!(entry = %name, "added entry");
        tracker.entry_done(name);
    }

    let writer = zip.finish().map_err(|e| write_error(destination, e))?;
    let temp = writer
        .into_inner()
        .map_err(|e| ArchiveError::io(destination, e.into_error()))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| ArchiveError::io(destination, e))?;

    let persisted = if request.overwrite {
        temp.persist(destination)
    } else {
        temp.persist_noclobber(destination)
    };
    persisted.map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            ArchiveError::DestinationExists {
                path: destination.to_path_buf(),
            }
        } else {
            ArchiveError::io(destination, e.error)
        }
    })?;

    report.entries_processed = tracker.completed();
    Ok(report)
}

fn file_options(config: &CompressConfig) -> SimpleFileOptions {
    match config.compression_level {
        Some(0) => SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        level => SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(level.map(i64::from)),
    }
}

fn add_file<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    entry: &FilteredEntry,
    name: &str,
    options: SimpleFileOptions,
    request: &CompressRequest<'_>,
    buffer: &mut CopyBuffer,
) -> Result<u64> {
    let mut file = File::open(&entry.path).map_err(|e| ArchiveError::io(&entry.path, e))?;
    let metadata = file
        .metadata()
        .map_err(|e| ArchiveError::io(&entry.path, e))?;

    let mut options = options.large_file(metadata.len() >= u64::from(u32::MAX));
    #[cfg(unix)]
    if request.config.preserve_permissions {
        use std::os::unix::fs::PermissionsExt;
        options = options.unix_permissions(metadata.permissions().mode());
    }

    zip.start_file(name, options)
        .map_err(|e| write_error(request.destination, e))?;
    copy_with_buffer(&mut file, zip, buffer).map_err(|e| match e {
        CopyError::Read(source) => ArchiveError::io(&entry.path, source),
        CopyError::Write(source) => ArchiveError::io(request.destination, source),
    })
}

fn write_error(destination: &Path, err: zip::result::ZipError) -> ArchiveError {
    let source = match err {
        zip::result::ZipError::Io(source) => source,
        other => std::io::Error::other(other),
    };
    ArchiveError::io(destination, source)
}

/// Drops the destination itself when it lives inside a source directory.
fn without_destination(entries: Vec<FilteredEntry>, destination: &Path) -> Vec<FilteredEntry> {
    let Ok(target) = destination.canonicalize() else {
        return entries;
    };
    entries
        .into_iter()
        .filter(|entry| entry.path.canonicalize().map_or(true, |p| p != target))
        .collect()
}

/// Computes entry names, rejecting duplicates.
fn entry_names(entries: &[FilteredEntry]) -> Result<Vec<String>> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .iter()
        .map(|entry| {
            let mut name = filters::zip_entry_name(&entry.archive_path)?;
            if entry.entry_type == EntryType::Directory {
                name.push('/');
            }
            if !seen.insert(name.clone()) {
                return Err(ArchiveError::unsupported(format!(
                    "two sources map to the same entry name: {name}"
                )));
            }
            Ok(name)
        })
        .collect()
}
