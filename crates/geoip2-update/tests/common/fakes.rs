//! In-process doubles for the engine's collaborators
//!
//! Each double keeps its counters behind `Arc`s so a test can hold a handle
//! after moving the double into an `UpdateEngine`.

use async_trait::async_trait;
use geoip2_core::{Config, Edition};
use geoip2_update::{ArchiveInstaller, Error, Installer, ProgressFn, ProgressReporter};
use geoip2_update::{RemoteInfo, RemoteSource, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::archives::create_database_archive;

/// Remote catalog serving generated archives from a local directory
#[derive(Clone)]
pub struct FakeRemote {
    work_dir: PathBuf,
    dates: HashMap<Edition, String>,
    broken_downloads: HashSet<Edition>,
    pub lookups: Arc<Mutex<Vec<Edition>>>,
    pub fetches: Arc<Mutex<Vec<Edition>>>,
}

impl FakeRemote {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            dates: HashMap::new(),
            broken_downloads: HashSet::new(),
            lookups: Arc::default(),
            fetches: Arc::default(),
        }
    }

    /// Serve `date` as the latest version of `edition`
    pub fn with_date(mut self, edition: Edition, date: &str) -> Self {
        self.dates.insert(edition, date.to_string());
        self
    }

    /// Serve `date` for every edition
    pub fn with_date_for_all(mut self, date: &str) -> Self {
        for edition in Edition::ALL {
            self.dates.insert(edition, date.to_string());
        }
        self
    }

    /// Make downloads of `edition` fail
    pub fn with_broken_download(mut self, edition: Edition) -> Self {
        self.broken_downloads.insert(edition);
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn fetched(&self) -> Vec<Edition> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteSource for FakeRemote {
    async fn latest_version(&self, _config: &Config, edition: Edition) -> Option<RemoteInfo> {
        self.lookups.lock().unwrap().push(edition);
        self.dates
            .get(&edition)
            .map(|date| RemoteInfo::new(edition, date.clone()))
    }

    async fn fetch(
        &self,
        _config: &Config,
        edition: Edition,
        info: &RemoteInfo,
        progress: Option<&ProgressFn<'_>>,
    ) -> Option<PathBuf> {
        self.fetches.lock().unwrap().push(edition);
        if self.broken_downloads.contains(&edition) {
            return None;
        }

        if let Some(callback) = progress {
            callback(200, 100);
            callback(200, 200);
        }

        let dir = self.work_dir.join(format!("fetch-{}", self.fetch_count()));
        std::fs::create_dir_all(&dir).ok()?;
        Some(create_database_archive(&dir, edition, &info.date))
    }
}

/// Installer failing its first `failures` calls, then delegating
pub struct FlakyInstaller {
    inner: ArchiveInstaller,
    failures: usize,
    always_fail: HashSet<String>,
    pub attempts: Arc<AtomicUsize>,
}

impl FlakyInstaller {
    pub fn failing(failures: usize) -> Self {
        Self {
            inner: ArchiveInstaller::default(),
            failures,
            always_fail: HashSet::new(),
            attempts: Arc::default(),
        }
    }

    /// Installer that always fails for `edition` and works for the others
    pub fn failing_for(edition: Edition) -> Self {
        let mut installer = Self::failing(0);
        installer.always_fail.insert(edition.as_str().to_string());
        installer
    }

    pub fn attempt_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

impl Installer for FlakyInstaller {
    fn install(&self, archive_path: &Path, destination: &Path) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);

        let targeted = destination
            .file_name()
            .is_some_and(|name| self.always_fail.contains(&*name.to_string_lossy()));

        if targeted || attempt < self.failures {
            return Err(Error::extract(
                "Corrupt archive",
                std::io::Error::other("invalid gzip header"),
            ));
        }

        self.inner.install(archive_path, destination)
    }
}

/// Progress reporter recording every call
#[derive(Clone, Default)]
pub struct RecordingProgress {
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingProgress {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingProgress {
    fn start(&self, edition: Edition) {
        self.calls.lock().unwrap().push(format!("start {}", edition));
    }

    fn update(&self, total: u64, so_far: u64) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("update {}/{}", so_far, total));
    }

    fn complete(&self) {
        self.calls.lock().unwrap().push("complete".to_string());
    }

    fn fail(&self, reason: &str) {
        self.calls.lock().unwrap().push(format!("fail {}", reason));
    }
}
