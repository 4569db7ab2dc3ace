//! Archive format detection.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveError;
use crate::Result;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// ZIP archive, read and written in-process.
    Zip,
    /// RAR archive, read through the external `unar` tool.
    Rar,
}

impl ArchiveFormat {
    /// All formats, in display order.
    pub const ALL: [Self; 2] = [Self::Zip, Self::Rar];

    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Rar => "rar",
        }
    }

    /// Returns `true` if archives of this format can be created.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        match self {
            Self::Zip => true,
            Self::Rar => false,
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zip => f.write_str("ZIP"),
            Self::Rar => f.write_str("RAR"),
        }
    }
}

/// Detects the archive format from a file extension, ignoring case.
///
/// # Errors
///
/// Returns `UnsupportedFormat` if the extension is missing or is neither
/// `.zip` nor `.rar`.
///
/// # Examples
///
/// ```
/// use repack_core::ArchiveFormat;
/// use repack_core::detect_format;
/// use std::path::Path;
///
/// assert_eq!(detect_format(Path::new("Photos.ZIP")).unwrap(), ArchiveFormat::Zip);
/// assert!(detect_format(Path::new("notes.7z")).is_err());
/// ```
pub fn detect_format(path: &Path) -> Result<ArchiveFormat> {
    let unsupported = || ArchiveError::UnsupportedFormat {
        path: path.to_path_buf(),
    };
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(unsupported)?;

    match extension.to_ascii_lowercase().as_str() {
        "zip" => Ok(ArchiveFormat::Zip),
        "rar" => Ok(ArchiveFormat::Rar),
        _ => Err(unsupported()),
    }
}

/// Default extraction directory: a sibling of the archive named after its stem.
///
/// `/data/photos.zip` extracts to `/data/photos`.
#[must_use]
pub fn default_extract_dir(archive: &Path) -> PathBuf {
    let stem = archive.file_stem().unwrap_or(archive.as_os_str());
    archive
        .parent()
        .map_or_else(|| PathBuf::from(stem), |parent| parent.join(stem))
}

/// Default output path: the source path with its extension replaced.
///
/// `/data/photos.rar` converts to `/data/photos.zip`.
#[must_use]
pub fn default_output_path(source: &Path, format: ArchiveFormat) -> PathBuf {
    source.with_extension(format.extension())
}
