//! Archive extraction, dispatched by format.

pub mod rar;
pub mod zip;

use std::path::Path;

use crate::ArchiveFormat;
use crate::ExtractConfig;
use crate::OperationReport;
use crate::Result;
use crate::ToolAvailability;
use crate::progress::CancellationToken;
use crate::progress::ProgressSink;

/// Inputs shared by the format-specific extractors.
#[derive(Debug, Clone, Copy)]
pub struct ExtractRequest<'a> {
    /// Archive to read.
    pub archive: &'a Path,
    /// Directory to extract into; created if absent.
    pub destination: &'a Path,
    /// Extraction settings.
    pub config: &'a ExtractConfig,
    /// Checked between entries.
    pub cancel: &'a CancellationToken,
}

/// Extracts an archive of the given format.
///
/// Files already written when a failure occurs are left in place.
pub fn extract_archive(
    format: ArchiveFormat,
    tools: &ToolAvailability,
    request: &ExtractRequest<'_>,
    sink: &mut dyn ProgressSink,
) -> Result<OperationReport> {
    match format {
        ArchiveFormat::Zip => zip::extract(request, sink),
        ArchiveFormat::Rar => rar::extract(tools, request, sink),
    }
}
