//! Archive operations engine for ZIP and RAR archives.
//!
//! `repack-core` extracts, creates and converts archives behind a single
//! [`Engine`]. ZIP archives are read and written through the `zip` crate; RAR
//! archives are read through the external `unar`/`lsar` tools. Every operation
//! reports per-entry [`ProgressEvent`]s and ends in exactly one
//! [`OperationResult`].
//!
//! # Examples
//!
//! ```no_run
//! use repack_core::ArchiveTask;
//! use repack_core::Engine;
//! use repack_core::ProgressEvent;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::with_defaults();
//! let task = ArchiveTask::extract("sample.zip", "/tmp/out");
//!
//! let report = engine.extract(&task, &mut |event: ProgressEvent| {
//!     println!("{:>3.0}% {}", event.fraction_complete * 100.0, event.current_entry_name);
//! })?;
//! println!("extracted {} entries to {}", report.entries_processed, report.output_path.display());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod conversion;
pub mod copy;
pub mod creation;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod formats;
pub mod inspection;
pub mod progress;
pub mod report;
pub mod task;
pub mod tools;
pub mod types;
pub mod workdir;

#[doc(hidden)]
pub mod test_utils;

pub use config::CompressConfig;
pub use config::EngineConfig;
pub use config::ExtractConfig;
pub use engine::Engine;
pub use engine::TaskEvent;
pub use engine::TaskHandle;
pub use error::ArchiveError;
pub use error::FailureKind;
pub use error::Result;
pub use formats::ArchiveFormat;
pub use formats::default_extract_dir;
pub use formats::default_output_path;
pub use formats::detect_format;
pub use inspection::ArchiveInfo;
pub use inspection::EntryInfo;
pub use progress::CancellationToken;
pub use progress::NoopProgress;
pub use progress::Phase;
pub use progress::ProgressEvent;
pub use progress::ProgressSink;
pub use report::OperationReport;
pub use task::ArchiveTask;
pub use task::Operation;
pub use task::TaskState;
pub use tools::ToolAvailability;

/// Terminal outcome of an engine operation.
///
/// `Ok` carries the output path and statistics; `Err` carries the failure
/// kind, a one-line message and the offending entry when known.
pub type OperationResult = Result<OperationReport>;
