//! Output formatter trait for CLI results.

use anyhow::Result;
use repack_core::ArchiveFormat;
use repack_core::ArchiveInfo;
use repack_core::Operation;
use repack_core::OperationReport;
use repack_core::ToolAvailability;
use serde::Serialize;

/// Read/write support for one format.
#[derive(Debug, Clone, Serialize)]
pub struct FormatSupport {
    pub format: ArchiveFormat,
    pub extension: &'static str,
    pub read: bool,
    pub write: bool,
}

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the result of extract, compress or convert
    fn format_operation_result(&self, operation: Operation, report: &OperationReport)
    -> Result<()>;

    /// Format an archive listing
    fn format_archive_info(&self, info: &ArchiveInfo, long: bool) -> Result<()>;

    /// Format the supported formats table
    fn format_formats(&self, formats: &[FormatSupport], tools: &ToolAvailability) -> Result<()>;
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
        }
    }
}

/// Converts bytes to human-readable format (B, KB, MB, GB, TB).
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
