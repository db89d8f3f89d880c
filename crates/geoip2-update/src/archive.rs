//! Archive installation
//!
//! Database archives are gzipped tarballs whose entries usually live under a
//! dated wrapper folder (`GeoLite2-City_20240115/GeoLite2-City.mmdb`). The
//! installer unpacks into a temporary directory, strips that wrapper and
//! copies the payload into the edition directory.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Component, Path};
use tar::Archive;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fs::FileStore;

/// Installs a downloaded archive into a destination directory
pub trait Installer: Send + Sync {
    fn install(&self, archive_path: &Path, destination: &Path) -> Result<()>;
}

/// Installs `.tar.gz` archives, flattening one wrapper folder
#[derive(Debug, Clone, Default)]
pub struct ArchiveInstaller {
    files: FileStore,
}

impl ArchiveInstaller {
    pub fn new(files: FileStore) -> Self {
        Self { files }
    }

    /// Top-level folder shared by every entry of the archive, if any
    ///
    /// Entries without a normal path component (such as `./`) are ignored.
    /// Returns `None` as soon as two entries disagree on their first segment.
    pub fn wrapper_folder(&self, archive_path: &Path) -> Result<Option<String>> {
        let mut archive = open_archive(archive_path)?;
        let entries = archive.entries().map_err(extract_failed)?;

        let mut common: Option<String> = None;
        for entry in entries {
            let entry = entry.map_err(extract_failed)?;
            let path = entry.path().map_err(extract_failed)?;

            let Some(first) = path.components().find_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            }) else {
                continue;
            };

            match &common {
                None => common = Some(first),
                Some(existing) if *existing == first => {}
                Some(_) => return Ok(None),
            }
        }

        Ok(common)
    }

    fn unpack_and_copy(
        &self,
        archive_path: &Path,
        temp_dir: &Path,
        wrapper: Option<&str>,
        destination: &Path,
    ) -> Result<()> {
        let mut archive = open_archive(archive_path)?;
        archive.unpack(temp_dir).map_err(extract_failed)?;

        let source = match wrapper.map(|w| temp_dir.join(w)) {
            Some(dir) if dir.is_dir() => {
                debug!("Stripping wrapper folder {}", dir.display());
                dir
            }
            _ => temp_dir.to_path_buf(),
        };

        self.copy_tree(&source, destination)
    }

    /// Copy the contents of `source` into `destination`, creating directories first
    fn copy_tree(&self, source: &Path, destination: &Path) -> Result<()> {
        for entry in walkdir::WalkDir::new(source).min_depth(1) {
            let entry = entry.map_err(|e| {
                Error::extract(format!("Failed to read extracted files: {}", e), e)
            })?;

            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|e| Error::extract("Extracted path escaped its directory", e))?;
            let target = destination.join(relative);

            if entry.file_type().is_dir() {
                self.files.ensure_dir(&target)?;
            } else if entry.file_type().is_file() {
                if let Some(parent) = target.parent() {
                    self.files.ensure_dir(parent)?;
                }
                fs::copy(entry.path(), &target).map_err(|e| {
                    Error::extract(
                        format!(
                            "Failed to copy file: {} to {}",
                            entry.path().display(),
                            target.display()
                        ),
                        e,
                    )
                })?;
            } else {
                debug!("Skipping non-regular entry {}", entry.path().display());
            }
        }

        Ok(())
    }
}

impl Installer for ArchiveInstaller {
    fn install(&self, archive_path: &Path, destination: &Path) -> Result<()> {
        if !archive_path.exists() {
            return Err(Error::archive_not_found(archive_path));
        }

        self.files.ensure_dir(destination)?;

        let wrapper = self.wrapper_folder(archive_path)?;
        let temp_dir = self.files.temp_dir().map_err(into_extract)?;

        let result = self
            .unpack_and_copy(archive_path, &temp_dir, wrapper.as_deref(), destination)
            .map_err(into_extract);

        if let Err(e) = self.files.delete_dir(&temp_dir) {
            warn!(
                "Failed to remove extraction directory {}: {}",
                temp_dir.display(),
                e
            );
        }

        if result.is_ok() {
            debug!(
                "Installed {} into {}",
                archive_path.display(),
                destination.display()
            );
        }
        result
    }
}

fn open_archive(path: &Path) -> Result<Archive<GzDecoder<File>>> {
    let file = File::open(path).map_err(extract_failed)?;
    Ok(Archive::new(GzDecoder::new(file)))
}

fn extract_failed(e: std::io::Error) -> Error {
    Error::extract(format!("Failed to extract archive: {}", e), e)
}

/// Report any failure inside the extraction step as an extract error
fn into_extract(e: Error) -> Error {
    match e {
        Error::Extract { .. } => e,
        other => Error::extract(format!("Failed to extract archive: {}", other), other),
    }
}
