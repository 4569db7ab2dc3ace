//! Path filtering for archive creation.
//!
//! Filters are applied to paths relative to the directory being walked, so
//! the location of the source tree itself never affects what is included.

use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveError;
use crate::CompressConfig;
use crate::Result;

/// Checks if a relative path should be left out of the archive.
///
/// # Examples
///
/// ```
/// use repack_core::CompressConfig;
/// use repack_core::creation::filters;
/// use std::path::Path;
///
/// let config = CompressConfig::default()
///     .with_include_hidden(false)
///     .with_exclude_patterns(vec!["*.tmp".to_string()]);
/// assert!(filters::should_skip(Path::new("src/.cache"), &config));
/// assert!(filters::should_skip(Path::new("build/out.tmp"), &config));
/// assert!(!filters::should_skip(Path::new("src/main.rs"), &config));
/// ```
#[must_use]
pub fn should_skip(relative: &Path, config: &CompressConfig) -> bool {
    if !config.include_hidden && is_hidden(relative) {
        return true;
    }

    config
        .exclude_patterns
        .iter()
        .any(|pattern| matches_pattern(relative, pattern))
}

/// Checks if the last component of a path starts with `.`.
#[must_use]
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Matches any component of `path` against a simple glob.
///
/// Supports an exact name (`.git`), a suffix wildcard (`*.txt`) and a prefix
/// wildcard (`temp*`).
#[must_use]
pub fn matches_pattern(path: &Path, pattern: &str) -> bool {
    path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| pattern_matches(name, pattern))
    })
}

fn pattern_matches(s: &str, pattern: &str) -> bool {
    if pattern == s {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return s.starts_with(prefix);
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        return s.ends_with(suffix);
    }
    false
}

/// Computes the archive path of `source_path` found under `root`.
///
/// With a `prefix` (the base name of a directory source when several
/// sources are archived together) the relative path is nested under it.
///
/// # Errors
///
/// Returns `UnsupportedOperation` if `source_path` is not under `root`.
///
/// # Examples
///
/// ```
/// use repack_core::creation::filters;
/// use std::path::Path;
///
/// let root = Path::new("/home/user/project");
/// let source = Path::new("/home/user/project/src/main.rs");
///
/// let plain = filters::compute_archive_path(source, root, None).unwrap();
/// assert_eq!(plain, Path::new("src/main.rs"));
///
/// let nested = filters::compute_archive_path(source, root, Some(Path::new("project"))).unwrap();
/// assert_eq!(nested, Path::new("project/src/main.rs"));
/// ```
pub fn compute_archive_path(
    source_path: &Path,
    root: &Path,
    prefix: Option<&Path>,
) -> Result<PathBuf> {
    let relative = source_path.strip_prefix(root).map_err(|_| {
        ArchiveError::unsupported(format!(
            "{} is not under {}",
            source_path.display(),
            root.display()
        ))
    })?;

    Ok(match prefix {
        Some(prefix) => prefix.join(relative),
        None => relative.to_path_buf(),
    })
}

/// Converts an archive path to a ZIP entry name with `/` separators.
///
/// # Errors
///
/// Returns `UnsupportedOperation` if the path is not valid UTF-8.
pub fn zip_entry_name(path: &Path) -> Result<String> {
    let mut name = String::new();
    for component in path.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            ArchiveError::unsupported(format!("path is not valid UTF-8: {}", path.display()))
        })?;
        if !name.is_empty() {
            name.push('/');
        }
        name.push_str(part);
    }
    Ok(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new(".gitignore")));
        assert!(is_hidden(Path::new("dir/.DS_Store")));
        assert!(!is_hidden(Path::new("dir/normal.rs")));
        assert!(!is_hidden(Path::new("")));
    }

    #[test]
    fn test_matches_pattern_exact() {
        assert!(matches_pattern(Path::new(".git"), ".git"));
        assert!(matches_pattern(Path::new("src/.git/config"), ".git"));
        assert!(!matches_pattern(Path::new(".github"), ".git"));
    }

    #[test]
    fn test_matches_pattern_wildcards() {
        assert!(matches_pattern(Path::new("dir/file.log"), "*.log"));
        assert!(!matches_pattern(Path::new("txtfile"), "*.txt"));
        assert!(matches_pattern(Path::new("dir/temp_data"), "temp*"));
        assert!(!matches_pattern(Path::new("file_temp"), "temp*"));
    }

    #[test]
    fn test_hidden_included_by_default() {
        let config = CompressConfig::default();
        assert!(!should_skip(Path::new(".env"), &config));
    }

    #[test]
    fn test_compute_archive_path_outside_root() {
        let err = compute_archive_path(Path::new("/etc/passwd"), Path::new("/home"), None)
            .unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::UnsupportedOperation);
    }

    #[test]
    fn test_zip_entry_name() {
        assert_eq!(zip_entry_name(Path::new("b/c.txt")).unwrap(), "b/c.txt");
        assert_eq!(zip_entry_name(Path::new("a.txt")).unwrap(), "a.txt");
    }
}
