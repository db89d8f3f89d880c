//! Filesystem primitives used by the update pipeline
//!
//! Temporary artifacts are created under a configurable root (the system
//! temp directory by default) with process-unique names, so concurrent
//! processes never collide on downloads or extraction directories.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Prefix of every temporary path created by the store
const TEMP_PREFIX: &str = "geoip2_";

/// Filesystem operations with [`Error::File`] reporting
#[derive(Debug, Clone)]
pub struct FileStore {
    temp_root: PathBuf,
}

impl FileStore {
    /// Store using the system temp directory
    pub fn new() -> Self {
        Self {
            temp_root: std::env::temp_dir(),
        }
    }

    /// Store placing temporary artifacts under `temp_root`
    pub fn with_temp_root(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: temp_root.into(),
        }
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Create `path` and its parents if missing; the result must be writable
    pub fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.is_dir() {
            fs::create_dir_all(path).map_err(|e| {
                Error::file(format!("Failed to create directory: {}", path.display()), e)
            })?;
        }

        if !is_writable(path) {
            return Err(Error::file_msg(format!(
                "Directory is not writable: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Write `content` to `path`, replacing any existing file
    pub fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.ensure_dir(parent)?;
        }

        fs::write(path, content)
            .map_err(|e| Error::file(format!("Failed to write file: {}", path.display()), e))
    }

    /// Delete a file; absent files are not an error
    pub fn delete_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::file(
                format!("Failed to delete file: {}", path.display()),
                e,
            )),
        }
    }

    /// Delete a directory tree, children before parents
    pub fn delete_dir(&self, path: &Path) -> Result<()> {
        if !path.is_dir() {
            return Ok(());
        }

        for entry in walkdir::WalkDir::new(path)
            .min_depth(1)
            .contents_first(true)
        {
            let entry = entry.map_err(|e| {
                let message = format!("Failed to read directory: {}", path.display());
                match e.into_io_error() {
                    Some(io) => Error::file(message, io),
                    None => Error::file_msg(message),
                }
            })?;

            let entry_path = entry.path();
            let removed = if entry.file_type().is_dir() {
                fs::remove_dir(entry_path)
            } else {
                fs::remove_file(entry_path)
            };
            removed.map_err(|e| {
                Error::file(format!("Failed to delete: {}", entry_path.display()), e)
            })?;
        }

        fs::remove_dir(path).map_err(|e| {
            Error::file(format!("Failed to delete directory: {}", path.display()), e)
        })
    }

    /// Process-unique temporary file path; the file is not created
    pub fn temp_file(&self, name_hint: &str) -> PathBuf {
        self.temp_root
            .join(format!("{}{}_{}", TEMP_PREFIX, uuid::Uuid::new_v4().simple(), name_hint))
    }

    /// Create a process-unique temporary directory
    pub fn temp_dir(&self) -> Result<PathBuf> {
        let path = self
            .temp_root
            .join(format!("{}{}", TEMP_PREFIX, uuid::Uuid::new_v4().simple()));
        self.ensure_dir(&path)?;
        debug!("Created temporary directory: {}", path.display());
        Ok(path)
    }

    /// Problems preventing `path` from being used as the database folder
    ///
    /// Never fails; an empty list means the directory is usable.
    pub fn validate_dir(&self, path: &Path) -> Vec<String> {
        let mut errors = Vec::new();

        if path.as_os_str().is_empty() {
            errors.push("Directory path is empty".to_string());
        } else if !path.exists() {
            errors.push(format!("Directory does not exist: {}", path.display()));
        } else if !path.is_dir() {
            errors.push(format!("Path is not a directory: {}", path.display()));
        } else if !is_writable(path) {
            errors.push(format!("Directory is not writable: {}", path.display()));
        }

        errors
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Probe writability by creating (and dropping) a temporary file
fn is_writable(dir: &Path) -> bool {
    tempfile::Builder::new()
        .prefix(".geoip2-probe")
        .tempfile_in(dir)
        .is_ok()
}
