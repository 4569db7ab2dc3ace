//! RAR extraction through the external `unar` tool.
//!
//! When `lsar` is installed the archive is listed first, which gives the
//! entry total for progress and lets entry names be validated before the
//! extractor runs. A listing that fails is skipped rather than fatal. Cancellation is only observed once `unar` has exited.

use super::ExtractRequest;
use crate::OperationReport;
use crate::Result;
use crate::ToolAvailability;
use crate::progress::Phase;
use crate::progress::ProgressSink;
use crate::progress::ProgressTracker;
use crate::tools;
use crate::types::DestDir;
use crate::types::SafePath;

/// Extracts a RAR archive.
pub fn extract(
    tools: &ToolAvailability,
    request: &ExtractRequest<'_>,
    sink: &mut dyn ProgressSink,
) -> Result<OperationReport> {
    let unar = tools.require_unar()?;

    let listing = match tools.lsar() {
        Some(lsar) => match tools::list_entries(lsar, request.archive) {
            Ok(entries) => Some(entries),
            Err(e) => {
                tracing::warn!(error = %e, "lsar listing failed, extracting without a listing");
                None
            }
        },
        None => {
            tracing::debug!("lsar not available, extracting without a listing");
            None
        }
    };

    if let Some(entries) = &listing {
        for entry in entries {
            SafePath::validate(&entry.name, request.config)?;
        }
    }

    request.cancel.check()?;
    let dest = DestDir::create(request.destination)?;
    let mut tracker = ProgressTracker::new(
        sink,
        request.cancel,
        Phase::Extracting,
        listing.as_ref().map(Vec::len),
    );

    tools::run_unar(unar, request.archive, dest.as_path(), |name| {
        tracing::debug!(entry = name, "extracted entry");
        tracker.entry_done(name);
    })?;
    tracker.checkpoint()?;

    let mut report = OperationReport::new(request.destination);
    report.entries_processed = tracker.completed();
    report.bytes_processed = listing
        .iter()
        .flatten()
        .filter(|entry| !entry.is_dir)
        .map(|entry| entry.size)
        .sum();
    Ok(report)
}
