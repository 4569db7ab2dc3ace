//! Engine configuration.

use std::path::PathBuf;

use crate::ArchiveError;
use crate::Result;

/// Configuration for extraction.
///
/// # Examples
///
/// ```
/// use repack_core::ExtractConfig;
///
/// let config = ExtractConfig::default()
///     .with_preserve_permissions(true)
///     .with_max_path_depth(16);
/// assert!(!config.allow_absolute_paths);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Maximum number of components in an entry name.
    ///
    /// Default: `32`.
    pub max_path_depth: usize,

    /// Apply Unix permission bits stored in the archive.
    ///
    /// Only the `0o777` bits are applied; setuid, setgid and sticky bits are
    /// always dropped.
    ///
    /// Default: `false`.
    pub preserve_permissions: bool,

    /// Accept entry names with a leading `/`, extracting them relative to the
    /// destination.
    ///
    /// Default: `false` (such entries fail with `PathTraversal`).
    pub allow_absolute_paths: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_path_depth: 32,
            preserve_permissions: false,
            allow_absolute_paths: false,
        }
    }
}

impl ExtractConfig {
    /// Sets the maximum entry path depth.
    #[must_use]
    pub fn with_max_path_depth(mut self, depth: usize) -> Self {
        self.max_path_depth = depth;
        self
    }

    /// Sets whether to apply stored permissions.
    #[must_use]
    pub fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Sets whether absolute entry names are accepted.
    #[must_use]
    pub fn with_allow_absolute_paths(mut self, allow: bool) -> Self {
        self.allow_absolute_paths = allow;
        self
    }
}

/// Configuration for archive creation.
///
/// # Examples
///
/// ```
/// use repack_core::CompressConfig;
///
/// let config = CompressConfig::default()
///     .with_compression_level(9)
///     .with_exclude_patterns(vec!["*.tmp".to_string()]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressConfig {
    /// Deflate level (1-9), or `0` to store entries uncompressed.
    ///
    /// `None` uses the codec default.
    ///
    /// Default: `Some(6)`.
    pub compression_level: Option<u8>,

    /// Include files and directories whose name starts with `.`.
    ///
    /// Default: `true`.
    pub include_hidden: bool,

    /// Patterns to exclude (`*.ext`, `prefix*`, or an exact name).
    ///
    /// Default: empty.
    pub exclude_patterns: Vec<String>,

    /// Store Unix permission bits of source files.
    ///
    /// Default: `true`.
    pub preserve_permissions: bool,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            compression_level: Some(6),
            include_hidden: true,
            exclude_patterns: Vec::new(),
            preserve_permissions: true,
        }
    }
}

impl CompressConfig {
    /// Sets the compression level.
    ///
    /// Out-of-range levels are reported by [`CompressConfig::validate`].
    #[must_use]
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = Some(level);
        self
    }

    /// Sets whether to include hidden files.
    #[must_use]
    pub fn with_include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Sets the exclude patterns.
    #[must_use]
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Sets whether to store permissions.
    #[must_use]
    pub fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if the compression level is above 9.
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = self.compression_level
            && level > 9
        {
            return Err(ArchiveError::unsupported(format!(
                "compression level {level} is out of range 0-9"
            )));
        }
        Ok(())
    }
}

/// Top-level engine configuration.
///
/// # Examples
///
/// ```
/// use repack_core::CompressConfig;
/// use repack_core::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_compress(CompressConfig::default().with_compression_level(0))
///     .with_working_dir_root("/var/tmp");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Extraction settings.
    pub extract: ExtractConfig,
    /// Archive creation settings.
    pub compress: CompressConfig,
    /// Directory under which conversion working directories are created.
    ///
    /// `None` uses the system temporary directory.
    pub working_dir_root: Option<PathBuf>,
}

impl EngineConfig {
    /// Sets the extraction settings.
    #[must_use]
    pub fn with_extract(mut self, extract: ExtractConfig) -> Self {
        self.extract = extract;
        self
    }

    /// Sets the archive creation settings.
    #[must_use]
    pub fn with_compress(mut self, compress: CompressConfig) -> Self {
        self.compress = compress;
        self
    }

    /// Sets the root for working directories.
    #[must_use]
    pub fn with_working_dir_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.working_dir_root = Some(root.into());
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the compression level is out of range or the
    /// maximum path depth is zero.
    pub fn validate(&self) -> Result<()> {
        if self.extract.max_path_depth == 0 {
            return Err(ArchiveError::unsupported("max path depth must be at least 1"));
        }
        self.compress.validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::FailureKind;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.extract.max_path_depth, 32);
        assert!(!config.extract.preserve_permissions);
        assert!(!config.extract.allow_absolute_paths);
        assert_eq!(config.compress.compression_level, Some(6));
        assert!(config.compress.include_hidden);
        assert!(config.compress.exclude_patterns.is_empty());
        assert!(config.working_dir_root.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::default()
            .with_extract(ExtractConfig::default().with_allow_absolute_paths(true))
            .with_compress(
                CompressConfig::default()
                    .with_include_hidden(false)
                    .with_preserve_permissions(false),
            )
            .with_working_dir_root("/scratch");

        assert!(config.extract.allow_absolute_paths);
        assert!(!config.compress.include_hidden);
        assert!(!config.compress.preserve_permissions);
        assert_eq!(config.working_dir_root, Some(PathBuf::from("/scratch")));
    }

    #[test]
    fn test_stored_level_is_valid() {
        let config = CompressConfig::default().with_compression_level(0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_level_above_nine() {
        let config = CompressConfig::default().with_compression_level(10);
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnsupportedOperation);
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_validate_rejects_zero_depth() {
        let config =
            EngineConfig::default().with_extract(ExtractConfig::default().with_max_path_depth(0));
        assert!(config.validate().is_err());
    }
}
