//! Error conversion utilities for CLI.
//!
//! Converts repack-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use repack_core::ArchiveError;
use std::path::Path;

/// Converts `ArchiveError` to a user-friendly anyhow error with context.
pub fn convert_archive_error(err: ArchiveError, archive: &Path) -> anyhow::Error {
    match err {
        ArchiveError::PathTraversal { entry } => anyhow!(
            "Security violation: archive '{}' has an entry escaping the destination: '{}'\n\
             HINT: This archive may be malicious. Do not extract from untrusted sources.",
            archive.display(),
            entry.display()
        ),
        ArchiveError::UnsupportedFormat { path } => anyhow!(
            "Archive format not supported: {}\n\
             HINT: Supported formats: zip (read and write), rar (read only)",
            path.display()
        ),
        ArchiveError::MissingDependency { tool } => anyhow!(
            "Required tool '{tool}' is not installed\n\
             HINT: Install it with `brew install unar` (macOS) or `apt install unar` (Debian/Ubuntu)."
        ),
        ArchiveError::DestinationExists { path } => anyhow!(
            "Destination already exists: {}\n\
             HINT: Use --force to replace an existing archive, or choose another output path.",
            path.display()
        ),
        err @ ArchiveError::CorruptArchive { .. } => anyhow!(
            "Invalid archive '{}': {err}\n\
             HINT: The archive may be corrupted or incomplete.",
            archive.display()
        ),
        err @ ArchiveError::ExternalToolError { .. } => anyhow!(
            "Could not read '{}': {err}\n\
             HINT: Encrypted or multi-volume RAR archives are not supported.",
            archive.display()
        ),
        ArchiveError::Io { path, source } => anyhow!(
            "I/O error while processing '{}': {source}",
            path.display()
        ),
        _ => anyhow::Error::from(err)
            .context(format!("Error processing archive '{}'", archive.display())),
    }
}

/// Adds archive context to a core result.
pub fn add_archive_context<T>(
    result: repack_core::Result<T>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_archive_error(e, archive))
}
