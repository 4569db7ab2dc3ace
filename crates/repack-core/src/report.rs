//! Operation reporting.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Statistics returned by a successful operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationReport {
    /// Extraction directory or created archive.
    pub output_path: PathBuf,

    /// Number of entries extracted or added.
    pub entries_processed: usize,

    /// Uncompressed bytes written or read.
    pub bytes_processed: u64,

    /// Wall-clock duration of the operation.
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,

    /// Non-fatal problems, such as a working directory that could not be
    /// removed.
    pub warnings: Vec<String>,
}

impl OperationReport {
    /// Creates an empty report for `output_path`.
    #[must_use]
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            ..Self::default()
        }
    }

    /// Adds a warning message to the report.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u128(duration.as_millis())
}
