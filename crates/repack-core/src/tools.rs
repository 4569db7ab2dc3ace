//! External RAR tooling (`unar` and `lsar`).
//!
//! Tool discovery happens once, when an engine is built, and the result is
//! passed around as a [`ToolAvailability`] value. Tests inject fake tools
//! through [`ToolAvailability::new`].

use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;
use std::thread;

use serde::Deserialize;
use serde::Deserializer;

use crate::ArchiveError;
use crate::Result;

/// Name of the extraction tool.
pub const UNAR: &str = "unar";

/// Name of the listing tool.
pub const LSAR: &str = "lsar";

/// Directories searched when a tool is not on `PATH`.
///
/// GUI applications launched from Finder inherit a minimal `PATH` that
/// omits Homebrew prefixes.
const FALLBACK_DIRS: [&str; 3] = ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

/// Locations of the external RAR tools, if installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolAvailability {
    unar: Option<PathBuf>,
    lsar: Option<PathBuf>,
}

impl ToolAvailability {
    /// Searches `PATH`, then the fallback directories, for both tools.
    #[must_use]
    pub fn probe() -> Self {
        let tools = Self {
            unar: find_tool(UNAR),
            lsar: find_tool(LSAR),
        };
        tracing::debug!(unar = ?tools.unar, lsar = ?tools.lsar, "probed RAR tools");
        tools
    }

    /// Availability with neither tool installed.
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// Availability with explicit tool locations.
    #[must_use]
    pub fn new(unar: Option<PathBuf>, lsar: Option<PathBuf>) -> Self {
        Self { unar, lsar }
    }

    /// Path of `unar`, if available.
    #[must_use]
    pub fn unar(&self) -> Option<&Path> {
        self.unar.as_deref()
    }

    /// Path of `lsar`, if available.
    #[must_use]
    pub fn lsar(&self) -> Option<&Path> {
        self.lsar.as_deref()
    }

    /// Path of `unar`, or `MissingDependency`.
    pub fn require_unar(&self) -> Result<&Path> {
        self.unar().ok_or_else(|| missing(UNAR))
    }

    /// Path of `lsar`, or `MissingDependency`.
    pub fn require_lsar(&self) -> Result<&Path> {
        self.lsar().ok_or_else(|| missing(LSAR))
    }
}

fn missing(tool: &str) -> ArchiveError {
    ArchiveError::MissingDependency {
        tool: tool.to_string(),
    }
}

fn find_tool(name: &str) -> Option<PathBuf> {
    which::which(name).ok().or_else(|| {
        FALLBACK_DIRS
            .iter()
            .map(|dir| Path::new(dir).join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// One entry of an `lsar -j` listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ListedEntry {
    #[serde(rename = "XADFileName")]
    pub name: String,
    #[serde(rename = "XADFileSize", default)]
    pub size: u64,
    #[serde(rename = "XADCompressedSize", default)]
    pub compressed_size: u64,
    #[serde(rename = "XADIsDirectory", default, deserialize_with = "truthy")]
    pub is_dir: bool,
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(rename = "lsarContents", default)]
    contents: Vec<ListedEntry>,
}

/// Accepts `true`/`false` as well as the `0`/`1` integers `lsar` emits.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}

/// Lists the entries of a RAR archive with `lsar -j`.
pub(crate) fn list_entries(lsar: &Path, archive: &Path) -> Result<Vec<ListedEntry>> {
    tracing::debug!(tool = %lsar.display(), archive = %archive.display(), "listing archive");
    let output = Command::new(lsar)
        .arg("-j")
        .arg(archive)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ArchiveError::io(lsar, e))?;

    if !output.status.success() {
        return Err(tool_failure(LSAR, output.status, &output.stderr, &output.stdout));
    }

    let listing: Listing =
        serde_json::from_slice(&output.stdout).map_err(|e| ArchiveError::ExternalToolError {
            tool: LSAR.to_string(),
            status: output.status.to_string(),
            message: format!("unreadable listing: {e}"),
        })?;
    Ok(listing.contents)
}

/// Runs `unar` to extract `archive` into `dest`.
///
/// `on_entry` is called with the name of each entry as `unar` reports it.
/// Both pipes are drained and the child is reaped before this returns.
pub(crate) fn run_unar(
    unar: &Path,
    archive: &Path,
    dest: &Path,
    mut on_entry: impl FnMut(&str),
) -> Result<()> {
    tracing::debug!(tool = %unar.display(), archive = %archive.display(), "spawning extractor");
    let mut child = Command::new(unar)
        .arg("-o")
        .arg(dest)
        .args(["-f", "-D", "-nr"])
        .arg(archive)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ArchiveError::io(unar, e))?;

    let stderr = child.stderr.take();
    let stderr_reader = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_end(&mut buf);
        }
        buf
    });

    let mut last_stdout_line = String::new();
    if let Some(stdout) = child.stdout.take() {
        let mut reader = BufReader::new(stdout);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&raw);
                    let trimmed = line.trim_end_matches(['\r', '\n']);
                    if let Some(name) = parse_progress_line(trimmed) {
                        on_entry(name);
                    } else if !trimmed.trim().is_empty() {
                        last_stdout_line = trimmed.trim().to_string();
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable extractor output");
                    let _ = std::io::copy(&mut reader, &mut std::io::sink());
                    break;
                }
            }
        }
    }

    let status = child.wait().map_err(|e| ArchiveError::io(unar, e));
    let stderr = stderr_reader.join().unwrap_or_default();
    let status = status?;

    if status.success() {
        Ok(())
    } else {
        Err(tool_failure(UNAR, status, &stderr, last_stdout_line.as_bytes()))
    }
}

/// Extracts the entry name from an `unar` progress line.
///
/// Lines look like `  docs/readme.txt  (1024 B)... OK.`.
fn parse_progress_line(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("  ")?;
    let (name, tail) = rest.rsplit_once("  (")?;
    (tail.ends_with("... OK.") && !name.is_empty()).then_some(name)
}

fn tool_failure(tool: &str, status: ExitStatus, stderr: &[u8], stdout: &[u8]) -> ArchiveError {
    let mut message = one_line(stderr);
    if message.is_empty() {
        message = one_line(stdout);
    }
    if message.is_empty() {
        message = "no diagnostic output".to_string();
    }
    ArchiveError::ExternalToolError {
        tool: tool.to_string(),
        status: status.to_string(),
        message,
    }
}

fn one_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}
