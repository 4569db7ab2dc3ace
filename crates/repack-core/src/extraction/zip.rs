//! ZIP extraction through the `zip` crate.
//!
//! Every entry name is validated before anything is written, so a hostile
//! archive fails with zero files on disk. Entries are then materialized in
//! central-directory order, one progress event per entry.

use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;

use zip::ZipArchive;

use super::ExtractRequest;
use crate::ArchiveError;
use crate::OperationReport;
use crate::Result;
use crate::copy::CopyBuffer;
use crate::copy::CopyError;
use crate::copy::copy_with_buffer;
use crate::progress::Phase;
use crate::progress::ProgressSink;
use crate::progress::ProgressTracker;
use crate::types::DestDir;
use crate::types::SafePath;

/// An entry that passed validation.
struct PlannedEntry {
    name: String,
    safe_path: SafePath,
    is_dir: bool,
}

/// Opens a ZIP archive for reading.
pub(crate) fn open(archive: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(archive).map_err(|e| ArchiveError::io(archive, e))?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| ArchiveError::from_zip(archive, None, e))
}

/// Extracts a ZIP archive.
pub fn extract(request: &ExtractRequest<'_>, sink: &mut dyn ProgressSink) -> Result<OperationReport> {
    let archive_path = request.archive;
    let mut archive = open(archive_path)?;
    let plan = plan_entries(&mut archive, archive_path, request)?;

    let dest = DestDir::create(request.destination)?;
    let mut tracker = ProgressTracker::new(sink, request.cancel, Phase::Extracting, Some(plan.len()));
    let mut report = OperationReport::new(request.destination);
    let mut buffer = CopyBuffer::new();

    for (index, entry) in plan.iter().enumerate() {
        tracker.checkpoint()?;

        if entry.is_dir {
            if !entry.safe_path.is_empty() {
                let target = dest.prepare(&entry.safe_path)?;
                std::fs::create_dir_all(&target).map_err(|e| ArchiveError::io(&target, e))?;
            }
        } else {
            report.bytes_processed +=
                extract_file(&mut archive, index, entry, &dest, request, &mut buffer)?;
        }

        tracing::debug!(entry = %entry.name, "extracted entry");
        tracker.entry_done(&entry.name);
    }

    report.entries_processed = tracker.completed();
    Ok(report)
}

/// Validates every entry name without decompressing anything.
fn plan_entries<R: std::io::Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    archive_path: &Path,
    request: &ExtractRequest<'_>,
) -> Result<Vec<PlannedEntry>> {
    let mut plan = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|e| ArchiveError::from_zip(archive_path, None, e))?;
        let name = entry.name().to_string();
        let safe_path = SafePath::validate(&name, request.config)?;
        plan.push(PlannedEntry {
            is_dir: entry.is_dir(),
            name,
            safe_path,
        });
    }
    Ok(plan)
}

fn extract_file<R: std::io::Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    entry: &PlannedEntry,
    dest: &DestDir,
    request: &ExtractRequest<'_>,
    buffer: &mut CopyBuffer,
) -> Result<u64> {
    let entry_path = PathBuf::from(&entry.name);
    let mut reader = archive
        .by_index(index)
        .map_err(|e| ArchiveError::from_zip(request.archive, Some(&entry_path), e))?;
    let mode = reader.unix_mode();

    let target = dest.prepare(&entry.safe_path)?;
    let file = File::create(&target).map_err(|e| ArchiveError::io(&target, e))?;
    let mut writer = BufWriter::with_capacity(64 * 1024, file);

    let written = copy_with_buffer(&mut reader, &mut writer, buffer).map_err(|e| match e {
        CopyError::Read(source) => ArchiveError::from_zip(
            request.archive,
            Some(&entry_path),
            zip::result::ZipError::Io(source),
        ),
        CopyError::Write(source) => ArchiveError::io(&target, source),
    })?;
    drop(writer);

    #[cfg(unix)]
    if request.config.preserve_permissions
        && let Some(mode) = mode
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode & 0o777))
            .map_err(|e| ArchiveError::io(&target, e))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::CancellationToken;
    use crate::ExtractConfig;
    use crate::FailureKind;
    use crate::ProgressEvent;
    use crate::test_utils::ZipTestBuilder;
    use crate::test_utils::create_test_zip;
    use std::fs;
    use tempfile::TempDir;

    fn run(
        archive: &Path,
        dest: &Path,
        config: &ExtractConfig,
    ) -> (Result<OperationReport>, Vec<ProgressEvent>) {
        let cancel = CancellationToken::new();
        let request = ExtractRequest {
            archive,
            destination: dest,
            config,
            cancel: &cancel,
        };
        let mut events = Vec::new();
        let result = extract(&request, &mut |event: ProgressEvent| events.push(event));
        (result, events)
    }

    #[test]
    fn test_extract_files_and_directories() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("sample.zip");
        fs::write(
            &archive,
            create_test_zip(vec![("a.txt", b"hello"), ("b/c.txt", b"0123456789")]),
        )
        .unwrap();
        let dest = temp.path().join("out");

        let (result, events) = run(&archive, &dest, &ExtractConfig::default());
        let report = result.unwrap();

        assert_eq!(report.entries_processed, 2);
        assert_eq!(report.bytes_processed, 15);
        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"hello");
        assert_eq!(fs::read(dest.join("b/c.txt")).unwrap(), b"0123456789");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].entries_completed, 2);
        assert_eq!(events[1].entries_total, Some(2));
    }

    #[test]
    fn test_explicit_directory_entry() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("dirs.zip");
        fs::write(
            &archive,
            ZipTestBuilder::new()
                .add_directory("empty/")
                .add_file("x.txt", b"x")
                .build(),
        )
        .unwrap();
        let dest = temp.path().join("out");

        let (result, events) = run(&archive, &dest, &ExtractConfig::default());
        assert_eq!(result.unwrap().entries_processed, 2);
        assert!(dest.join("empty").is_dir());
        assert_eq!(events[0].current_entry_name, "empty/");
    }

    #[test]
    fn test_traversal_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.zip");
        fs::write(
            &archive,
            create_test_zip(vec![("ok.txt", b"fine"), ("../../etc/passwd", b"root")]),
        )
        .unwrap();
        let dest = temp.path().join("out");

        let (result, events) = run(&archive, &dest, &ExtractConfig::default());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), FailureKind::PathTraversal);
        assert_eq!(err.offending_entry(), Some(Path::new("../../etc/passwd")));
        assert!(events.is_empty());
        assert!(!dest.exists());
    }

    #[test]
    fn test_corrupt_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, b"this is not a zip archive").unwrap();

        let (result, _) = run(&archive, &temp.path().join("out"), &ExtractConfig::default());
        assert_eq!(result.unwrap_err().kind(), FailureKind::CorruptArchive);
    }

    #[test]
    fn test_missing_archive_is_io() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("missing.zip");
        let (result, _) = run(&archive, &temp.path().join("out"), &ExtractConfig::default());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Io);
        assert_eq!(err.offending_entry(), Some(archive.as_path()));
    }

    #[test]
    fn test_checksum_mismatch_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("crc.zip");
        let mut data = create_test_zip(vec![("a.txt", b"hello world")]);
        let pos = data
            .windows(11)
            .position(|w| w == b"hello world")
            .unwrap();
        data[pos] = b'j';
        fs::write(&archive, data).unwrap();

        let (result, _) = run(&archive, &temp.path().join("out"), &ExtractConfig::default());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), FailureKind::CorruptArchive);
        assert_eq!(err.offending_entry(), Some(Path::new("a.txt")));
    }

    #[test]
    fn test_cancellation_before_first_entry() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("sample.zip");
        fs::write(&archive, create_test_zip(vec![("a.txt", b"hello")])).unwrap();
        let dest = temp.path().join("out");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let config = ExtractConfig::default();
        let request = ExtractRequest {
            archive: &archive,
            destination: &dest,
            config: &config,
            cancel: &cancel,
        };
        let err = extract(&request, &mut crate::NoopProgress).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Cancelled);
        assert!(!dest.join("a.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_preserve_permissions_masks_special_bits() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("modes.zip");
        fs::write(
            &archive,
            ZipTestBuilder::new()
                .add_file_with_mode("run.sh", b"#!/bin/sh\n", 0o4755)
                .build(),
        )
        .unwrap();
        let dest = temp.path().join("out");

        let config = ExtractConfig::default().with_preserve_permissions(true);
        let (result, _) = run(&archive, &dest, &config);
        result.unwrap();

        let mode = fs::metadata(dest.join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_symlinks_in_destination_are_not_followed() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let victim = outside.path().join("victim.txt");
        fs::write(&victim, "original").unwrap();

        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();
        std::os::unix::fs::symlink(&victim, dest.join("a.txt")).unwrap();
        std::os::unix::fs::symlink(outside.path(), dest.join("d")).unwrap();

        for (name, data) in [("a.txt", &b"PWNED"[..]), ("d/new/x.txt", &b"PWNED"[..])] {
            let archive = temp.path().join("links.zip");
            fs::write(&archive, create_test_zip(vec![(name, data)])).unwrap();
            let (result, _) = run(&archive, &dest, &ExtractConfig::default());
            assert_eq!(result.unwrap_err().kind(), FailureKind::PathTraversal);
        }

        assert_eq!(fs::read_to_string(&victim).unwrap(), "original");
        assert!(!outside.path().join("new").exists());
    }
}
