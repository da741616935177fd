use std::fs;

use grab_engine::{ensure_output_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("downloads");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_and_is_atomic() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("clip.mp4", b"first bytes").unwrap();
    assert_eq!(first.file_name().unwrap(), "clip.mp4");
    assert_eq!(fs::read(&first).unwrap(), b"first bytes");

    // Replace existing
    let second = writer.write("clip.mp4", b"second bytes").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"second bytes");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("clip.mp4", b"data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("clip.mp4").exists());
}
