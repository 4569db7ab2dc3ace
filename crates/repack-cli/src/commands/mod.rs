//! Subcommand implementations.

pub mod completion;
pub mod compress;
pub mod convert;
pub mod extract;
pub mod formats;
pub mod info;

use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use repack_core::ArchiveTask;
use repack_core::Engine;
use repack_core::NoopProgress;
use repack_core::OperationResult;
use repack_core::ToolAvailability;

/// State shared by every subcommand.
pub struct Context<'a> {
    pub tools: &'a ToolAvailability,
    pub formatter: &'a dyn OutputFormatter,
    pub show_progress: bool,
}

impl Context<'_> {
    /// Runs a task, drawing a progress bar when enabled.
    pub fn run(&self, engine: &Engine, task: &ArchiveTask) -> OperationResult {
        if self.show_progress {
            let mut progress = CliProgress::new(task.operation);
            engine.run(task, &mut progress)
        } else {
            engine.run(task, &mut NoopProgress)
        }
    }
}
