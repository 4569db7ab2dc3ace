//! Integration tests for repack-cli.
//!
//! Note: Tests use `unwrap`/`expect` which is acceptable in test code.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn repack_cmd() -> Command {
    cargo_bin_cmd!("repack")
}

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    fs::write(path, writer.finish().unwrap().into_inner()).unwrap();
}

fn sample_zip(dir: &Path) -> PathBuf {
    let archive = dir.join("sample.zip");
    write_zip(&archive, &[("a.txt", b"hello"), ("b/c.txt", b"0123456789")]);
    archive
}

fn zip_names(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

#[test]
fn test_version_flag() {
    repack_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("repack"));
}

#[test]
fn test_help_lists_subcommands() {
    repack_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("compress"))
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("info"));
}

#[test]
fn test_extract_to_explicit_directory() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_zip(temp.path());
    let out = temp.path().join("out");

    repack_cmd()
        .arg("extract")
        .arg(&archive)
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Extraction complete"));

    assert_eq!(fs::read_to_string(out.join("a.txt")).unwrap(), "hello");
    assert_eq!(fs::read_to_string(out.join("b/c.txt")).unwrap(), "0123456789");
}

#[test]
fn test_extract_default_directory_next_to_archive() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_zip(temp.path());

    repack_cmd().arg("extract").arg(&archive).assert().success();

    assert!(temp.path().join("sample/a.txt").exists());
}

#[test]
fn test_extract_json_output() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_zip(temp.path());

    let output = repack_cmd()
        .arg("--json")
        .arg("extract")
        .arg(&archive)
        .arg(temp.path().join("out"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["operation"], "extract");
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["entries_processed"], 2);
    assert_eq!(json["data"]["bytes_processed"], 15);
}

#[test]
fn test_extract_quiet_prints_nothing() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_zip(temp.path());

    repack_cmd()
        .arg("--quiet")
        .arg("extract")
        .arg(&archive)
        .arg(temp.path().join("out"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_extract_path_traversal_fails_with_hint() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = temp.path().join("evil.zip");
    write_zip(&archive, &[("../../etc/passwd", b"root")]);
    let out = temp.path().join("out");

    repack_cmd()
        .arg("extract")
        .arg(&archive)
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Security violation"))
        .stderr(predicate::str::contains("HINT"));

    assert!(!out.exists());
}

#[test]
fn test_extract_unsupported_format() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = temp.path().join("notes.7z");
    fs::write(&archive, b"7z").unwrap();

    repack_cmd()
        .arg("extract")
        .arg(&archive)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_extract_missing_archive() {
    let temp = TempDir::new().expect("failed to create temp dir");

    repack_cmd()
        .arg("extract")
        .arg(temp.path().join("missing.zip"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("I/O error"));
}

#[test]
fn test_compress_directory() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let source = temp.path().join("project");
    fs::create_dir_all(source.join("b")).unwrap();
    fs::write(source.join("a.txt"), "hello").unwrap();
    fs::write(source.join("b/c.txt"), "0123456789").unwrap();
    let output = temp.path().join("project.zip");

    repack_cmd()
        .arg("compress")
        .arg(&output)
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("Archive created"));

    assert_eq!(zip_names(&output), vec!["a.txt", "b/c.txt"]);
}

#[test]
fn test_compress_excludes_and_hidden() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let source = temp.path().join("project");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("keep.txt"), "k").unwrap();
    fs::write(source.join("debug.log"), "l").unwrap();
    fs::write(source.join(".env"), "secret").unwrap();
    let output = temp.path().join("project.zip");

    repack_cmd()
        .arg("compress")
        .arg("--exclude-hidden")
        .arg("-x")
        .arg("*.log")
        .arg(&output)
        .arg(&source)
        .assert()
        .success();

    assert_eq!(zip_names(&output), vec!["keep.txt"]);
}

#[test]
fn test_compress_refuses_existing_output() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let source = temp.path().join("a.txt");
    fs::write(&source, "hello").unwrap();
    let output = temp.path().join("out.zip");
    fs::write(&output, b"keep me").unwrap();

    repack_cmd()
        .arg("compress")
        .arg(&output)
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    assert_eq!(fs::read(&output).unwrap(), b"keep me");

    repack_cmd()
        .arg("compress")
        .arg("--force")
        .arg(&output)
        .arg(&source)
        .assert()
        .success();
    assert_eq!(zip_names(&output), vec!["a.txt"]);
}

#[test]
fn test_compress_stored_level() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let source = temp.path().join("a.txt");
    fs::write(&source, "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
    let output = temp.path().join("out.zip");

    repack_cmd()
        .args(["compress", "-l", "0"])
        .arg(&output)
        .arg(&source)
        .assert()
        .success();

    let mut archive = zip::ZipArchive::new(fs::File::open(&output).unwrap()).unwrap();
    let entry = archive.by_index(0).unwrap();
    assert_eq!(entry.compression(), zip::CompressionMethod::Stored);
}

#[test]
fn test_convert_zip_to_rar_unsupported() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_zip(temp.path());

    repack_cmd()
        .arg("convert")
        .arg(&archive)
        .args(["--to", "rar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RAR"));

    assert!(!temp.path().join("sample.rar").exists());
}

#[test]
fn test_convert_rejects_unknown_target() {
    repack_cmd()
        .args(["convert", "a.zip", "--to", "7z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn test_info_lists_entries() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_zip(temp.path());

    repack_cmd()
        .arg("info")
        .arg("--long")
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("sample.zip (ZIP)"))
        .stdout(predicate::str::contains("b/c.txt"))
        .stdout(predicate::str::contains("15 B"));
}

#[test]
fn test_info_json() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_zip(temp.path());

    let output = repack_cmd()
        .arg("--json")
        .arg("info")
        .arg(&archive)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["data"]["format"], "zip");
    assert_eq!(json["data"]["total_files"], 2);
    assert_eq!(json["data"]["entries"][1]["name"], "b/c.txt");
}

#[test]
fn test_info_corrupt_archive() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = temp.path().join("broken.zip");
    fs::write(&archive, b"not a zip at all").unwrap();

    repack_cmd()
        .arg("info")
        .arg(&archive)
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupted"));
}

#[test]
fn test_formats_json() {
    let output = repack_cmd().args(["--json", "formats"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let formats = json["data"]["formats"].as_array().unwrap();
    assert_eq!(formats.len(), 2);
    assert_eq!(formats[0]["format"], "zip");
    assert_eq!(formats[0]["write"], true);
    assert_eq!(formats[1]["format"], "rar");
    assert_eq!(formats[1]["write"], false);
}

#[test]
fn test_round_trip_through_cli() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_zip(temp.path());
    let out = temp.path().join("sample");
    let repacked = temp.path().join("repacked.zip");

    repack_cmd().arg("extract").arg(&archive).arg(&out).assert().success();
    repack_cmd()
        .arg("compress")
        .arg(&repacked)
        .arg(&out)
        .assert()
        .success();

    let mut zip = zip::ZipArchive::new(fs::File::open(&repacked).unwrap()).unwrap();
    let mut content = String::new();
    zip.by_name("b/c.txt")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "0123456789");
}

#[test]
fn test_completion_bash() {
    repack_cmd()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("repack"));
}
