//! Tests for the filesystem primitives
//!
//! Tests cover:
//! - Directory creation and writability checks
//! - File writes creating parents and replacing content
//! - Idempotent deletes
//! - Recursive directory removal
//! - Directory validation messages

use geoip2_update::{Error, FileStore};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_ensure_dir_creates_nested_directories() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new();
    let nested = temp.path().join("a/b/c");

    store.ensure_dir(&nested).unwrap();
    assert!(nested.is_dir());

    // Second call is a no-op
    store.ensure_dir(&nested).unwrap();
}

#[cfg(unix)]
#[test]
fn test_ensure_dir_rejects_unwritable_directory() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let locked = temp.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // Root ignores permission bits
    let probe = locked.join(".probe");
    if fs::write(&probe, b"x").is_ok() {
        fs::remove_file(&probe).unwrap();
        return;
    }

    let err = FileStore::new().ensure_dir(&locked).unwrap_err();
    assert!(matches!(err, Error::File { .. }));
    assert!(err.to_string().contains("not writable"));

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn test_write_file_creates_parent_and_replaces_content() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new();
    let file = temp.path().join("GeoLite2-City/VERSION.txt");

    store.write_file(&file, "2024-01-08").unwrap();
    store.write_file(&file, "2024-01-15").unwrap();

    assert_eq!(fs::read_to_string(&file).unwrap(), "2024-01-15");
}

#[test]
fn test_delete_file_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new();
    let file = temp.path().join("archive.tar.gz");
    fs::write(&file, b"data").unwrap();

    store.delete_file(&file).unwrap();
    assert!(!file.exists());
    store.delete_file(&file).unwrap();
}

#[test]
fn test_delete_dir_removes_tree() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new();
    let root = temp.path().join("extract");
    fs::create_dir_all(root.join("wrapper/nested")).unwrap();
    fs::write(root.join("wrapper/a.mmdb"), b"a").unwrap();
    fs::write(root.join("wrapper/nested/b.txt"), b"b").unwrap();

    store.delete_dir(&root).unwrap();
    assert!(!root.exists());

    // Missing directory is not an error
    store.delete_dir(&root).unwrap();
}

#[test]
fn test_temp_artifacts_live_under_temp_root() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::with_temp_root(temp.path());

    let file = store.temp_file("GeoLite2-ASN.tar.gz");
    let dir = store.temp_dir().unwrap();

    assert_eq!(file.parent().unwrap(), temp.path());
    assert_eq!(dir.parent().unwrap(), temp.path());
    assert!(dir.is_dir());
}

#[test]
fn test_validate_dir_accepts_writable_directory() {
    let temp = TempDir::new().unwrap();
    assert!(FileStore::new().validate_dir(temp.path()).is_empty());
}

#[test]
fn test_validate_dir_reports_problems() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new();

    let empty = store.validate_dir(std::path::Path::new(""));
    assert_eq!(empty, vec!["Directory path is empty".to_string()]);

    let missing = temp.path().join("missing");
    let errors = store.validate_dir(&missing);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Directory does not exist:"));

    let file = temp.path().join("file.txt");
    fs::write(&file, b"x").unwrap();
    let errors = store.validate_dir(&file);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Path is not a directory:"));
}
