//! Test utilities for building archives and fake RAR tools.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;

use zip::write::SimpleFileOptions;
use zip::write::ZipWriter;

/// Creates an in-memory ZIP archive from a list of entries.
///
/// Each entry is a tuple of (path, content). Files are stored uncompressed
/// with mode 0o644.
///
/// # Examples
///
/// ```
/// use repack_core::test_utils::create_test_zip;
///
/// let zip_data = create_test_zip(vec![("file.txt", b"hello"), ("dir/nested.txt", b"world")]);
/// ```
#[must_use]
pub fn create_test_zip(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    let mut builder = ZipTestBuilder::new();
    for (path, data) in entries {
        builder = builder.add_file(path, data);
    }
    builder.build()
}

/// Builder for ZIP test archives with directories and custom modes.
///
/// # Examples
///
/// ```
/// use repack_core::test_utils::ZipTestBuilder;
///
/// let zip_data = ZipTestBuilder::new()
///     .add_directory("empty/")
///     .add_file("file.txt", b"content")
///     .add_file_with_mode("run.sh", b"#!/bin/sh\n", 0o755)
///     .build();
/// ```
pub struct ZipTestBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipTestBuilder {
    /// Creates a new ZIP test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Adds a stored regular file with mode 0o644.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_file_with_mode(path, data, 0o644)
    }

    /// Adds a stored regular file with a custom mode.
    #[must_use]
    pub fn add_file_with_mode(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(mode);
        self.writer.start_file(path, options).unwrap();
        self.writer.write_all(data).unwrap();
        self
    }

    /// Adds an explicit directory entry.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        self.writer
            .add_directory(path, SimpleFileOptions::default())
            .unwrap();
        self
    }

    /// Finishes the archive and returns its bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.writer.finish().unwrap().into_inner()
    }
}

impl Default for ZipTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shell-script stand-ins for `unar` and `lsar`.
///
/// A fake RAR archive is a text manifest with one `name|content` line per
/// entry (names ending in `/` are directories), plus a `<archive>.json`
/// sidecar that the fake `lsar` prints verbatim.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct FakeRarTools {
    /// Path of the fake `unar`.
    pub unar: std::path::PathBuf,
    /// Path of the fake `lsar`.
    pub lsar: std::path::PathBuf,
}

#[cfg(unix)]
const FAKE_UNAR: &str = r#"#!/bin/sh
dest="$2"
eval "archive=\${$#}"
if [ ! -f "$archive" ]; then
  echo "Couldn't open archive $archive" >&2
  exit 1
fi
while IFS='|' read -r name content; do
  [ -z "$name" ] && continue
  case "$name" in
    */)
      mkdir -p "$dest/$name"
      echo "  $name  (dir)... OK."
      ;;
    *)
      mkdir -p "$dest/$(dirname "$name")"
      printf '%s' "$content" > "$dest/$name"
      echo "  $name  (${#content} B)... OK."
      ;;
  esac
done < "$archive"
echo "Successfully extracted to \"$dest\"."
"#;

#[cfg(unix)]
const FAKE_LSAR: &str = r#"#!/bin/sh
eval "archive=\${$#}"
cat "$archive.json"
"#;

#[cfg(unix)]
impl FakeRarTools {
    /// Writes working fake tools into `dir/bin`.
    pub fn install(dir: &std::path::Path) -> Self {
        Self::install_with_unar(dir, FAKE_UNAR)
    }

    /// Writes fake tools whose `unar` reports `message` and exits 1.
    pub fn install_failing(dir: &std::path::Path, message: &str) -> Self {
        let script = format!("#!/bin/sh\necho '{message}' >&2\nexit 1\n");
        Self::install_with_unar(dir, &script)
    }

    fn install_with_unar(dir: &std::path::Path, unar_script: &str) -> Self {
        let bin = dir.join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let unar = bin.join("unar");
        let lsar = bin.join("lsar");
        write_script(&unar, unar_script);
        write_script(&lsar, FAKE_LSAR);
        Self { unar, lsar }
    }

    /// Availability with both fake tools.
    #[must_use]
    pub fn tools(&self) -> crate::ToolAvailability {
        crate::ToolAvailability::new(Some(self.unar.clone()), Some(self.lsar.clone()))
    }

    /// Availability with the fake `unar` only.
    #[must_use]
    pub fn tools_without_lsar(&self) -> crate::ToolAvailability {
        crate::ToolAvailability::new(Some(self.unar.clone()), None)
    }

    /// Writes a fake archive and its listing sidecar.
    pub fn write_archive(
        &self,
        dir: &std::path::Path,
        name: &str,
        entries: &[(&str, &[u8])],
    ) -> std::path::PathBuf {
        let archive = dir.join(name);
        let mut manifest = String::new();
        let mut contents = Vec::new();
        for (entry, data) in entries {
            let text = String::from_utf8_lossy(data);
            manifest.push_str(&format!("{entry}|{text}\n"));
            let is_dir = entry.ends_with('/');
            contents.push(serde_json::json!({
                "XADFileName": entry.trim_end_matches('/'),
                "XADFileSize": data.len(),
                "XADCompressedSize": data.len(),
                "XADIsDirectory": u8::from(is_dir),
            }));
        }
        std::fs::write(&archive, manifest).unwrap();

        let listing = serde_json::json!({
            "lsarFormatVersion": 2,
            "lsarFormatName": "RAR",
            "lsarContents": contents,
        });
        let mut sidecar = archive.clone().into_os_string();
        sidecar.push(".json");
        std::fs::write(sidecar, serde_json::to_vec_pretty(&listing).unwrap()).unwrap();
        archive
    }
}

#[cfg(unix)]
fn write_script(path: &std::path::Path, script: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, script).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_zip() {
        let data = create_test_zip(vec![("a.txt", b"hello")]);
        let archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_builder_directory_entry() {
        let data = ZipTestBuilder::new().add_directory("dir/").build();
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
        assert!(archive.by_index(0).unwrap().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_fake_archive_sidecar() {
        let temp = tempfile::TempDir::new().unwrap();
        let fake = FakeRarTools::install(temp.path());
        let archive = fake.write_archive(temp.path(), "x.rar", &[("a.txt", b"hi")]);
        assert!(archive.exists());
        assert!(temp.path().join("x.rar.json").exists());
        assert!(fake.unar.exists());
    }
}
