//! Archive conversion: extract into a working directory, then repack.

use std::path::Path;

use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::CompressConfig;
use crate::EngineConfig;
use crate::OperationReport;
use crate::Result;
use crate::ToolAvailability;
use crate::creation::CompressRequest;
use crate::creation::zip::create_zip;
use crate::extraction::ExtractRequest;
use crate::extraction::extract_archive;
use crate::progress::CancellationToken;
use crate::progress::PhaseWindow;
use crate::progress::ProgressSink;
use crate::workdir::WorkingDirectory;

/// Inputs for a conversion.
#[derive(Debug, Clone, Copy)]
pub struct ConvertRequest<'a> {
    /// Archive to read.
    pub archive: &'a Path,
    /// Format of `archive`.
    pub source_format: ArchiveFormat,
    /// Archive file to create.
    pub destination: &'a Path,
    /// Format to write.
    pub target_format: ArchiveFormat,
    /// Replace an existing destination file.
    pub overwrite: bool,
    /// Checked between entries.
    pub cancel: &'a CancellationToken,
}

/// Converts an archive into another format.
///
/// Extraction progress spans `[0.0, 0.5]` and compression `[0.5, 1.0]`. The
/// working directory is removed whatever the outcome, and a failure in either
/// phase leaves no destination file behind.
pub fn convert(
    request: &ConvertRequest<'_>,
    tools: &ToolAvailability,
    config: &EngineConfig,
    sink: &mut dyn ProgressSink,
) -> Result<OperationReport> {
    if !request.target_format.is_writable() {
        return Err(ArchiveError::unsupported(format!(
            "creating {} archives is not supported",
            request.target_format
        )));
    }

    let workdir = WorkingDirectory::new(config.working_dir_root.as_deref())?;
    let result = run_phases(request, tools, config, workdir.path(), sink);
    let warning = workdir.close();

    let mut report = result?;
    if let Some(warning) = warning {
        report.add_warning(warning);
    }
    Ok(report)
}

fn run_phases(
    request: &ConvertRequest<'_>,
    tools: &ToolAvailability,
    config: &EngineConfig,
    workdir: &Path,
    sink: &mut dyn ProgressSink,
) -> Result<OperationReport> {
    let extract_request = ExtractRequest {
        archive: request.archive,
        destination: workdir,
        config: &config.extract,
        cancel: request.cancel,
    };
    let mut first = PhaseWindow::first_half(sink);
    let extracted = extract_archive(request.source_format, tools, &extract_request, &mut first)?;
    let offset = first.completed();
    tracing::debug!(entries = extracted.entries_processed, "extraction phase finished");

    // Conversion keeps every extracted entry, whatever the creation filters say.
    let compress_config = CompressConfig {
        include_hidden: true,
        exclude_patterns: Vec::new(),
        ..config.compress.clone()
    };
    let sources = [workdir.to_path_buf()];
    let compress_request = CompressRequest {
        sources: &sources,
        destination: request.destination,
        overwrite: request.overwrite,
        allow_empty: true,
        config: &compress_config,
        cancel: request.cancel,
    };
    let mut second = PhaseWindow::second_half(sink, offset);
    let mut report = match request.target_format {
        ArchiveFormat::Zip => create_zip(&compress_request, &mut second)?,
        ArchiveFormat::Rar => {
            return Err(ArchiveError::unsupported("creating RAR archives is not supported"));
        }
    };
    let mut warnings = extracted.warnings;
    warnings.append(&mut report.warnings);
    report.warnings = warnings;
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::FailureKind;
    use crate::ProgressEvent;
    use crate::test_utils::create_test_zip;
    use std::fs;
    use tempfile::TempDir;

    fn request<'a>(
        archive: &'a Path,
        source_format: ArchiveFormat,
        destination: &'a Path,
        cancel: &'a CancellationToken,
    ) -> ConvertRequest<'a> {
        ConvertRequest {
            archive,
            source_format,
            destination,
            target_format: ArchiveFormat::Zip,
            overwrite: false,
            cancel,
        }
    }

    #[test]
    fn test_zip_to_zip_repack_progress() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("in.zip");
        fs::write(
            &archive,
            create_test_zip(vec![("a.txt", b"hello"), ("b/c.txt", b"0123456789")]),
        )
        .unwrap();
        let dest = temp.path().join("out.zip");
        let workroot = temp.path().join("work");
        fs::create_dir(&workroot).unwrap();
        let config = EngineConfig::default().with_working_dir_root(&workroot);
        let cancel = CancellationToken::new();

        let mut events = Vec::new();
        let report = convert(
            &request(&archive, ArchiveFormat::Zip, &dest, &cancel),
            &ToolAvailability::absent(),
            &config,
            &mut |event: ProgressEvent| events.push(event),
        )
        .unwrap();

        assert_eq!(report.entries_processed, 2);
        assert!(dest.exists());
        assert_eq!(fs::read_dir(&workroot).unwrap().count(), 0);

        let completed: Vec<_> = events.iter().map(|e| e.entries_completed).collect();
        assert_eq!(completed, vec![1, 2, 3, 4]);
        assert!(events[..2].iter().all(|e| e.fraction_complete <= 0.5));
        assert!(events[2..].iter().all(|e| e.fraction_complete > 0.5));
        assert!((events[3].fraction_complete - 1.0).abs() < f64::EPSILON);
        assert_eq!(events[3].entries_total, Some(4));
    }

    #[test]
    fn test_empty_archive_converts_to_empty_zip() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("empty.zip");
        fs::write(&archive, create_test_zip(vec![])).unwrap();
        let dest = temp.path().join("out.zip");
        let cancel = CancellationToken::new();

        let report = convert(
            &request(&archive, ArchiveFormat::Zip, &dest, &cancel),
            &ToolAvailability::absent(),
            &EngineConfig::default(),
            &mut crate::NoopProgress,
        )
        .unwrap();

        assert_eq!(report.entries_processed, 0);
        let written = zip::ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
        assert_eq!(written.len(), 0);
    }

    #[test]
    fn test_extract_failure_cleans_up() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, b"not a zip").unwrap();
        let dest = temp.path().join("out.zip");
        let workroot = temp.path().join("work");
        fs::create_dir(&workroot).unwrap();
        let config = EngineConfig::default().with_working_dir_root(&workroot);
        let cancel = CancellationToken::new();

        let err = convert(
            &request(&archive, ArchiveFormat::Zip, &dest, &cancel),
            &ToolAvailability::absent(),
            &config,
            &mut crate::NoopProgress,
        )
        .unwrap_err();

        assert_eq!(err.kind(), FailureKind::CorruptArchive);
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(&workroot).unwrap().count(), 0);
    }

    #[test]
    fn test_rar_target_rejected() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("in.zip");
        let dest = temp.path().join("out.rar");
        let cancel = CancellationToken::new();
        let mut req = request(&archive, ArchiveFormat::Zip, &dest, &cancel);
        req.target_format = ArchiveFormat::Rar;

        let err = convert(
            &req,
            &ToolAvailability::absent(),
            &EngineConfig::default(),
            &mut crate::NoopProgress,
        )
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnsupportedOperation);
    }

    #[cfg(unix)]
    #[test]
    fn test_rar_to_zip_with_fake_tools() {
        use crate::test_utils::FakeRarTools;

        let temp = TempDir::new().unwrap();
        let fake = FakeRarTools::install(temp.path());
        let archive = fake.write_archive(
            temp.path(),
            "photos.rar",
            &[("a.txt", b"hello"), ("b/c.txt", b"0123456789")],
        );
        let dest = temp.path().join("photos.zip");
        let cancel = CancellationToken::new();

        let report = convert(
            &request(&archive, ArchiveFormat::Rar, &dest, &cancel),
            &fake.tools(),
            &EngineConfig::default(),
            &mut crate::NoopProgress,
        )
        .unwrap();

        assert_eq!(report.entries_processed, 2);
        let mut zip = zip::ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
        let mut names: Vec<_> = zip.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b/c.txt"]);
        let mut content = String::new();
        std::io::Read::read_to_string(&mut zip.by_name("b/c.txt").unwrap(), &mut content).unwrap();
        assert_eq!(content, "0123456789");
    }
}
