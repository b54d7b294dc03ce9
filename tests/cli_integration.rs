use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::process::Command;

use docshrink::tools::{NativeTools, Toolkit};
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_docshrink").to_string()
}

/// A small ODF-style document with no images; repacking cannot shrink it.
fn imageless_document(dir: &Path, name: &str) -> std::path::PathBuf {
    let src = dir.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("mimetype"), b"application/vnd.oasis.opendocument.text").unwrap();
    fs::write(src.join("content.xml"), "<text:p>hello</text:p>".repeat(50)).unwrap();
    let packed = NativeTools::default()
        .pack(&src, OsStr::new(name))
        .unwrap();
    let target = dir.join(name);
    fs::rename(packed, &target).unwrap();
    target
}

#[test]
fn cli_without_arguments_prints_usage() {
    let out = Command::new(bin()).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Usage"));
}

#[test]
fn cli_with_two_paths_prints_usage() {
    let dir = tempdir().unwrap();
    let cache = dir.path().join("cache");
    let out = Command::new(bin())
        .args(["a.docx", "b.docx", "--cache-dir"])
        .arg(&cache)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Usage"));
    assert!(!cache.exists());
}

#[test]
fn cli_missing_file_fails() {
    let dir = tempdir().unwrap();
    let out = Command::new(bin())
        .arg(dir.path().join("absent.docx"))
        .arg("--cache-dir")
        .arg(dir.path().join("cache"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("docshrink:"));
}

#[test]
fn cli_unchanged_document_exits_zero() {
    let dir = tempdir().unwrap();
    let target = imageless_document(dir.path(), "memo.odt");
    let original = fs::read(&target).unwrap();

    let out = Command::new(bin())
        .arg(&target)
        .arg("--cache-dir")
        .arg(dir.path().join("cache"))
        .arg("--json")
        .output()
        .unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Extracting document..."));
    assert!(stdout.contains("Compressing 0 images..."));
    assert!(stdout.contains("File size unchanged"));
    assert!(String::from_utf8_lossy(&out.stderr).contains("\"status\": \"unchanged\""));
    assert_eq!(fs::read(&target).unwrap(), original);
}

#[cfg(unix)]
#[test]
fn cli_accepts_quoted_backslash_paths() {
    let dir = tempdir().unwrap();
    let target = imageless_document(dir.path(), "memo.odt");
    let mangled = format!("\"{}\"", target.display().to_string().replace('/', "\\"));

    let out = Command::new(bin())
        .arg(mangled)
        .arg("--quiet")
        .arg("--cache-dir")
        .arg(dir.path().join("cache"))
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(out.stdout.is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn cli_commits_through_trash_command() {
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    let dir = tempdir().unwrap();
    let trash = dir.path().join("trash");
    fs::create_dir(&trash).unwrap();

    // Stored entries deflate well on repack.
    let target = dir.path().join("report.docx");
    let mut zip = ZipWriter::new(fs::File::create(&target).unwrap());
    zip.start_file(
        "word/document.xml",
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
    )
    .unwrap();
    zip.write_all("<w:t>numbers</w:t>".repeat(500).as_bytes())
        .unwrap();
    zip.finish().unwrap();
    let original = fs::read(&target).unwrap();

    let out = Command::new(bin())
        .arg(&target)
        .arg("--cache-dir")
        .arg(dir.path().join("cache"))
        .arg("--trash-command")
        .arg(format!("mv -t {}", trash.display()))
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Done: "));
    assert!(fs::metadata(&target).unwrap().len() < original.len() as u64);
    assert_eq!(fs::read(trash.join("report.docx")).unwrap(), original);
}

#[test]
fn cli_version_works() {
    let out = Command::new(bin()).arg("--version").output().unwrap();
    assert!(out.status.success());
}
