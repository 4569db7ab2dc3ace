//! Progress reporting and cooperative cancellation.
//!
//! Every engine operation reports to a [`ProgressSink`]. Closures taking a
//! [`ProgressEvent`] are sinks, so the simplest caller looks like:
//!
//! ```
//! use repack_core::ProgressEvent;
//! use repack_core::ProgressSink;
//!
//! let mut seen = Vec::new();
//! let mut sink = |event: ProgressEvent| seen.push(event.current_entry_name);
//! sink.on_progress(ProgressEvent::default());
//! ```

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde::Serialize;

use crate::ArchiveError;
use crate::Result;

/// Which half of an operation an event belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Entries are being read out of an archive.
    #[default]
    Extracting,
    /// Entries are being written into an archive.
    Compressing,
}

/// Immutable snapshot emitted after each entry is processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Archive-relative name of the entry just processed.
    pub current_entry_name: String,
    /// Entries finished so far, including this one.
    pub entries_completed: usize,
    /// Total entries, when known in advance.
    pub entries_total: Option<usize>,
    /// Overall completion in `[0.0, 1.0]`.
    pub fraction_complete: f64,
    /// Phase of the operation.
    pub phase: Phase,
}

/// Receiver of progress events.
///
/// Sinks are called on the thread running the operation, in entry order.
pub trait ProgressSink: Send {
    /// Called once per processed entry.
    fn on_progress(&mut self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressEvent) + Send,
{
    fn on_progress(&mut self, event: ProgressEvent) {
        self(event);
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_progress(&mut self, _event: ProgressEvent) {}
}

/// Shared flag requesting that a running task stop.
///
/// The engine checks the flag between entries, never in the middle of
/// writing one.
///
/// # Examples
///
/// ```
/// use repack_core::CancellationToken;
///
/// let token = CancellationToken::new();
/// let for_worker = token.clone();
/// token.cancel();
/// assert!(for_worker.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Fails with `Cancelled` if cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ArchiveError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Counts entries and turns them into events for one phase.
pub(crate) struct ProgressTracker<'a> {
    sink: &'a mut dyn ProgressSink,
    cancel: &'a CancellationToken,
    phase: Phase,
    completed: usize,
    total: Option<usize>,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(
        sink: &'a mut dyn ProgressSink,
        cancel: &'a CancellationToken,
        phase: Phase,
        total: Option<usize>,
    ) -> Self {
        Self {
            sink,
            cancel,
            phase,
            completed: 0,
            total,
        }
    }

    /// Fails with `Cancelled` if cancellation was requested.
    pub(crate) fn checkpoint(&self) -> Result<()> {
        self.cancel.check()
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed
    }

    /// Records one finished entry and emits its event.
    pub(crate) fn entry_done(&mut self, name: &str) {
        self.completed += 1;
        if let Some(total) = self.total
            && self.completed > total
        {
            // The listing undercounted; keep completed <= total.
            self.total = Some(self.completed);
        }
        let fraction_complete = match self.total {
            Some(0) => 1.0,
            Some(total) => self.completed as f64 / total as f64,
            None => 0.0,
        };
        self.sink.on_progress(ProgressEvent {
            current_entry_name: name.to_string(),
            entries_completed: self.completed,
            entries_total: self.total,
            fraction_complete,
            phase: self.phase,
        });
    }
}

/// Maps the events of one conversion phase into a window of the whole.
///
/// The extraction phase occupies `[0.0, 0.5]` and hides its total, since the
/// compression count is not known yet. The compression phase occupies
/// `[0.5, 1.0]`, continues counting from the entries already extracted and
/// reports the combined total.
pub(crate) struct PhaseWindow<'a> {
    inner: &'a mut dyn ProgressSink,
    start: f64,
    width: f64,
    offset: usize,
    report_total: bool,
    last_completed: usize,
}

impl<'a> PhaseWindow<'a> {
    pub(crate) fn first_half(inner: &'a mut dyn ProgressSink) -> Self {
        Self {
            inner,
            start: 0.0,
            width: 0.5,
            offset: 0,
            report_total: false,
            last_completed: 0,
        }
    }

    pub(crate) fn second_half(inner: &'a mut dyn ProgressSink, offset: usize) -> Self {
        Self {
            inner,
            start: 0.5,
            width: 0.5,
            offset,
            report_total: true,
            last_completed: offset,
        }
    }

    /// Entries completed so far, counted across both phases.
    pub(crate) fn completed(&self) -> usize {
        self.last_completed
    }
}

impl ProgressSink for PhaseWindow<'_> {
    fn on_progress(&mut self, event: ProgressEvent) {
        let entries_completed = self.offset + event.entries_completed;
        self.last_completed = entries_completed;
        let entries_total = if self.report_total {
            event.entries_total.map(|total| total + self.offset)
        } else {
            None
        };
        let fraction = event.fraction_complete.clamp(0.0, 1.0);
        self.inner.on_progress(ProgressEvent {
            entries_completed,
            entries_total,
            fraction_complete: self.start + fraction * self.width,
            ..event
        });
    }
}
