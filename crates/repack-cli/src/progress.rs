//! Progress bar for CLI operations.

use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use repack_core::Operation;
use repack_core::Phase;
use repack_core::ProgressEvent;
use repack_core::ProgressSink;

/// Progress bar implementing `ProgressSink`.
///
/// Shows entry counts when the total is known and a spinner otherwise.
/// Cleared on drop.
pub struct CliProgress {
    bar: ProgressBar,
    has_length: bool,
}

impl CliProgress {
    /// Creates a progress bar for `operation`.
    #[must_use]
    pub fn new(operation: Operation) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(label(operation, Phase::default()).to_string());
        Self {
            bar,
            has_length: false,
        }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stdout().is_term()
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for CliProgress {
    fn on_progress(&mut self, event: ProgressEvent) {
        if let Some(total) = event.entries_total {
            if !self.has_length {
                self.bar.set_style(bar_style());
                self.has_length = true;
            }
            self.bar.set_length(total as u64);
        }
        self.bar.set_position(event.entries_completed as u64);
        self.bar.set_message(format!(
            "{} {}",
            phase_label(event.phase),
            event.current_entry_name
        ));
    }
}

fn bar_style() -> ProgressStyle {
    // "Extracting b/c.txt [████████░░░░] 42/100 (12s)"
    ProgressStyle::default_bar()
        .template("{msg:40!} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner} {msg} {pos} entries")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

const fn label(operation: Operation, phase: Phase) -> &'static str {
    match operation {
        Operation::Extract => "Extracting",
        Operation::Compress => "Compressing",
        Operation::Convert => phase_label(phase),
    }
}

const fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Extracting => "Extracting",
        Phase::Compressing => "Compressing",
    }
}
