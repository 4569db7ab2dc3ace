//! The archive operations engine.
//!
//! An [`Engine`] runs one task at a time. Each task is validated while
//! `Pending` without touching the filesystem, then runs, emitting progress
//! events, and ends in exactly one [`OperationResult`].

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam::channel;
use crossbeam::channel::Receiver;
use crossbeam::channel::Sender;
use parking_lot::Mutex;

use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::ArchiveInfo;
use crate::ArchiveTask;
use crate::EngineConfig;
use crate::FailureKind;
use crate::Operation;
use crate::OperationResult;
use crate::ProgressEvent;
use crate::Result;
use crate::TaskState;
use crate::ToolAvailability;
use crate::conversion;
use crate::conversion::ConvertRequest;
use crate::creation::CompressRequest;
use crate::creation::zip::check_destination;
use crate::creation::zip::create_zip;
use crate::extraction::ExtractRequest;
use crate::extraction::extract_archive;
use crate::formats::detect_format;
use crate::inspection;
use crate::progress::CancellationToken;
use crate::progress::ProgressSink;

/// Message sent from a spawned task.
#[derive(Debug)]
pub enum TaskEvent {
    /// Progress after an entry was processed.
    Progress(ProgressEvent),
    /// Terminal result; always the last event.
    Finished(OperationResult),
}

/// Runs archive tasks.
///
/// Clones share the busy flag, so at most one task runs across all of them.
///
/// # Examples
///
/// ```
/// use repack_core::ArchiveFormat;
/// use repack_core::Engine;
/// use repack_core::EngineConfig;
/// use repack_core::ToolAvailability;
///
/// let engine = Engine::new(ToolAvailability::absent(), EngineConfig::default());
/// assert!(engine.supports_format(ArchiveFormat::Zip, true));
/// assert!(!engine.supports_format(ArchiveFormat::Rar, false));
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    tools: ToolAvailability,
    config: EngineConfig,
    busy: Arc<AtomicBool>,
}

impl Engine {
    /// Creates an engine with explicit tool availability and settings.
    #[must_use]
    pub fn new(tools: ToolAvailability, config: EngineConfig) -> Self {
        Self {
            tools,
            config,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates an engine with probed tools and default settings.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ToolAvailability::probe(), EngineConfig::default())
    }

    /// Tools found at construction.
    #[must_use]
    pub const fn tools(&self) -> &ToolAvailability {
        &self.tools
    }

    /// Engine settings.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether `format` can be read, or written when `for_writing` is set.
    ///
    /// RAR is never writable and is readable only when `unar` is installed.
    #[must_use]
    pub fn supports_format(&self, format: ArchiveFormat, for_writing: bool) -> bool {
        match format {
            ArchiveFormat::Zip => true,
            ArchiveFormat::Rar => !for_writing && self.tools.unar().is_some(),
        }
    }

    /// Extracts the task's archive.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` if the task is not an extraction, otherwise any
    /// failure of [`Engine::run`].
    pub fn extract(&self, task: &ArchiveTask, sink: &mut dyn ProgressSink) -> OperationResult {
        expect_operation(task, Operation::Extract)?;
        self.run(task, sink)
    }

    /// Compresses the task's sources.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` if the task is not a compression, otherwise any
    /// failure of [`Engine::run`].
    pub fn compress(&self, task: &ArchiveTask, sink: &mut dyn ProgressSink) -> OperationResult {
        expect_operation(task, Operation::Compress)?;
        self.run(task, sink)
    }

    /// Converts the task's archive.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` if the task is not a conversion, otherwise any
    /// failure of [`Engine::run`].
    pub fn convert(&self, task: &ArchiveTask, sink: &mut dyn ProgressSink) -> OperationResult {
        expect_operation(task, Operation::Convert)?;
        self.run(task, sink)
    }

    /// Runs a task on the calling thread.
    ///
    /// # Errors
    ///
    /// `Busy` if another task is running, or the task's failure.
    pub fn run(&self, task: &ArchiveTask, sink: &mut dyn ProgressSink) -> OperationResult {
        self.run_with_cancel(task, sink, &CancellationToken::new())
    }

    /// Runs a task on the calling thread, stopping between entries once
    /// `cancel` is triggered.
    ///
    /// # Errors
    ///
    /// `Busy` if another task is running, `Cancelled` if the token fired, or
    /// the task's failure.
    pub fn run_with_cancel(
        &self,
        task: &ArchiveTask,
        sink: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> OperationResult {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let state = Mutex::new(TaskState::Pending);
        self.perform(task, sink, cancel, &state)
    }

    /// Runs a task on a worker thread.
    ///
    /// The busy flag is taken before returning, so a second submission fails
    /// immediately.
    ///
    /// # Errors
    ///
    /// `Busy` if another task is running, or `Io` if the worker thread could
    /// not be started.
    pub fn spawn(&self, task: ArchiveTask) -> Result<TaskHandle> {
        let guard = BusyGuard::acquire(&self.busy)?;
        let (sender, receiver) = channel::unbounded();
        let state = Arc::new(Mutex::new(TaskState::Pending));
        let cancel = CancellationToken::new();
        let destination = task.destination.clone();

        let engine = self.clone();
        let worker_state = Arc::clone(&state);
        let worker_cancel = cancel.clone();
        let thread = thread::Builder::new()
            .name(format!("repack-{}", task.operation.as_str()))
            .spawn(move || {
                let mut sink = ChannelSink {
                    sender: sender.clone(),
                };
                let result = engine.perform(&task, &mut sink, &worker_cancel, &worker_state);
                // Released before `Finished` so an observer can submit again at once.
                drop(guard);
                // The receiver may already be gone; the result is then dropped.
                let _ = sender.send(TaskEvent::Finished(result));
            })
            .map_err(|e| ArchiveError::io(&destination, e))?;

        Ok(TaskHandle {
            events: receiver,
            state,
            cancel,
            destination,
            thread: Some(thread),
        })
    }

    /// Lists an archive without extracting it.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` for unknown extensions, or any failure of the
    /// listing.
    pub fn inspect(&self, archive: &Path) -> Result<ArchiveInfo> {
        let format = detect_format(archive)?;
        inspection::inspect_archive(archive, format, &self.tools)
    }

    fn perform(
        &self,
        task: &ArchiveTask,
        sink: &mut dyn ProgressSink,
        cancel: &CancellationToken,
        state: &Mutex<TaskState>,
    ) -> OperationResult {
        let started = Instant::now();
        let result = self.validate(task).and_then(|plan| {
            *state.lock() = TaskState::Running;
            tracing::info!(
                operation = task.operation.as_str(),
                destination = %task.destination.display(),
                "task started"
            );
            self.dispatch(task, plan, sink, cancel)
        });

        let result = result.map(|mut report| {
            report.duration = started.elapsed();
            report
        });
        *state.lock() = terminal_state(&result);

        match &result {
            Ok(report) => tracing::info!(
                operation = task.operation.as_str(),
                entries = report.entries_processed,
                duration_ms = report.duration.as_millis(),
                "task succeeded"
            ),
            Err(err) => tracing::info!(
                operation = task.operation.as_str(),
                kind = %err.kind(),
                error = %err,
                "task failed"
            ),
        }
        result
    }

    /// Checks a task before anything is written.
    fn validate<'t>(&self, task: &'t ArchiveTask) -> Result<Plan<'t>> {
        self.config.validate()?;

        match task.operation {
            Operation::Extract => {
                let archive = single_source(task)?;
                let format = source_format(task, archive)?;
                require_source(archive)?;
                if format == ArchiveFormat::Rar {
                    self.tools.require_unar()?;
                }
                if task.destination.exists() && !task.destination.is_dir() {
                    return Err(ArchiveError::DestinationExists {
                        path: task.destination.clone(),
                    });
                }
                Ok(Plan::Extract { archive, format })
            }
            Operation::Compress => {
                let target = task.target_format.unwrap_or(ArchiveFormat::Zip);
                require_writable(target)?;
                if task.source_paths.is_empty() {
                    return Err(ArchiveError::unsupported("no files to compress"));
                }
                for source in &task.source_paths {
                    require_source(source)?;
                }
                check_destination(&task.destination, task.overwrite)?;
                Ok(Plan::Compress)
            }
            Operation::Convert => {
                let target = task
                    .target_format
                    .ok_or_else(|| ArchiveError::unsupported("conversion needs a target format"))?;
                require_writable(target)?;
                let archive = single_source(task)?;
                let source = source_format(task, archive)?;
                if source == target {
                    return Err(ArchiveError::unsupported(format!(
                        "archive is already in {target} format"
                    )));
                }
                require_source(archive)?;
                if source == ArchiveFormat::Rar {
                    self.tools.require_unar()?;
                }
                check_destination(&task.destination, task.overwrite)?;
                Ok(Plan::Convert {
                    archive,
                    source,
                    target,
                })
            }
        }
    }

    fn dispatch(
        &self,
        task: &ArchiveTask,
        plan: Plan<'_>,
        sink: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> OperationResult {
        match plan {
            Plan::Extract { archive, format } => {
                let request = ExtractRequest {
                    archive,
                    destination: &task.destination,
                    config: &self.config.extract,
                    cancel,
                };
                extract_archive(format, &self.tools, &request, sink)
            }
            Plan::Compress => {
                let request = CompressRequest {
                    sources: &task.source_paths,
                    destination: &task.destination,
                    overwrite: task.overwrite,
                    allow_empty: false,
                    config: &self.config.compress,
                    cancel,
                };
                create_zip(&request, sink)
            }
            Plan::Convert {
                archive,
                source,
                target,
            } => {
                let request = ConvertRequest {
                    archive,
                    source_format: source,
                    destination: &task.destination,
                    target_format: target,
                    overwrite: task.overwrite,
                    cancel,
                };
                conversion::convert(&request, &self.tools, &self.config, sink)
            }
        }
    }
}

/// A validated task.
#[derive(Debug, Clone, Copy)]
enum Plan<'t> {
    Extract {
        archive: &'t Path,
        format: ArchiveFormat,
    },
    Compress,
    Convert {
        archive: &'t Path,
        source: ArchiveFormat,
        target: ArchiveFormat,
    },
}

fn expect_operation(task: &ArchiveTask, expected: Operation) -> Result<()> {
    if task.operation == expected {
        Ok(())
    } else {
        Err(ArchiveError::unsupported(format!(
            "expected a {} task, got {}",
            expected.as_str(),
            task.operation.as_str()
        )))
    }
}

fn single_source(task: &ArchiveTask) -> Result<&Path> {
    match task.source_paths.as_slice() {
        [archive] => Ok(archive),
        _ => Err(ArchiveError::unsupported(format!(
            "{} takes exactly one archive",
            task.operation.as_str()
        ))),
    }
}

fn source_format(task: &ArchiveTask, archive: &Path) -> Result<ArchiveFormat> {
    task.source_format.map_or_else(|| detect_format(archive), Ok)
}

fn require_source(path: &Path) -> Result<()> {
    std::fs::metadata(path)
        .map(drop)
        .map_err(|e| ArchiveError::io(path, e))
}

fn require_writable(format: ArchiveFormat) -> Result<()> {
    if format.is_writable() {
        Ok(())
    } else {
        Err(ArchiveError::unsupported(format!(
            "creating {format} archives is not supported"
        )))
    }
}

fn terminal_state(result: &OperationResult) -> TaskState {
    match result {
        Ok(_) => TaskState::Succeeded,
        Err(err) if err.kind() == FailureKind::Cancelled => TaskState::Cancelled,
        Err(_) => TaskState::Failed,
    }
}

/// Holds the engine's busy flag until dropped.
#[derive(Debug)]
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ArchiveError::Busy)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct ChannelSink {
    sender: Sender<TaskEvent>,
}

impl ProgressSink for ChannelSink {
    fn on_progress(&mut self, event: ProgressEvent) {
        let _ = self.sender.send(TaskEvent::Progress(event));
    }
}

/// Handle to a task running on a worker thread.
///
/// The event channel carries [`TaskEvent::Progress`] values in entry order,
/// followed by exactly one [`TaskEvent::Finished`].
#[derive(Debug)]
pub struct TaskHandle {
    events: Receiver<TaskEvent>,
    state: Arc<Mutex<TaskState>>,
    cancel: CancellationToken,
    destination: std::path::PathBuf,
    thread: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// The task's event stream.
    #[must_use]
    pub const fn events(&self) -> &Receiver<TaskEvent> {
        &self.events
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        *self.state.lock()
    }

    /// Requests cancellation; observed between entries.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Blocks until the task finishes and returns its result, discarding
    /// remaining progress events.
    ///
    /// # Errors
    ///
    /// The task's failure, or `Io` if the worker stopped without reporting
    /// (for example because `Finished` was already taken from
    /// [`TaskHandle::events`]).
    pub fn wait(mut self) -> OperationResult {
        let mut finished = None;
        for event in &self.events {
            if let TaskEvent::Finished(result) = event {
                finished = Some(result);
                break;
            }
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        finished.unwrap_or_else(|| {
            Err(ArchiveError::io(
                &self.destination,
                std::io::Error::other("worker stopped without a result"),
            ))
        })
    }
}
