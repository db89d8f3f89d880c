//! Multi-edition update orchestration
//!
//! For every edition the engine:
//! - Looks up the latest remote version
//! - Compares it with the local `VERSION.txt` marker
//! - Downloads and installs the archive when needed
//! - Routes install failures through the error event (retry, stop or continue)
//!
//! Editions are processed strictly one after another. The database folder
//! itself must exist; only per-edition subfolders are created here.

use geoip2_core::{Config, Edition};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::archive::{ArchiveInstaller, Installer};
use crate::error::Result;
use crate::events::{Event, EventBus};
use crate::fs::FileStore;
use crate::progress::{NoProgress, ProgressReporter};
use crate::remote::{ProgressFn, RemoteInfo, RemoteSource};
use crate::results::{UpdateResult, UpdateResults};

/// Name of the per-edition version marker
pub const VERSION_FILE: &str = "VERSION.txt";

/// Old version reported when an edition was never installed
const NO_VERSION: &str = "none";

/// Update orchestrator
///
/// Collaborators are passed in at construction; nothing is shared between
/// engine instances.
pub struct UpdateEngine {
    remote: Box<dyn RemoteSource>,
    installer: Box<dyn Installer>,
    custom_installer: bool,
    files: FileStore,
    events: EventBus,
    progress: Box<dyn ProgressReporter>,
}

impl UpdateEngine {
    /// Engine with the default installer, file store, no listeners and no progress output
    pub fn new(remote: impl RemoteSource + 'static) -> Self {
        Self {
            remote: Box::new(remote),
            installer: Box::new(ArchiveInstaller::default()),
            custom_installer: false,
            files: FileStore::new(),
            events: EventBus::new(),
            progress: Box::new(NoProgress),
        }
    }

    pub fn with_installer(mut self, installer: impl Installer + 'static) -> Self {
        self.installer = Box::new(installer);
        self.custom_installer = true;
        self
    }

    /// Use `files` for markers and downloads
    ///
    /// The default installer is rebuilt on the same store so extraction
    /// shares its temp root. An installer set with `with_installer` is kept.
    pub fn with_files(mut self, files: FileStore) -> Self {
        if !self.custom_installer {
            self.installer = Box::new(ArchiveInstaller::new(files.clone()));
        }
        self.files = files;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn with_progress(mut self, progress: impl ProgressReporter + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Directory an edition is installed into
    pub fn edition_path(config: &Config, edition: Edition) -> PathBuf {
        config.database_folder().join(edition.as_str())
    }

    /// Version recorded by the last successful install, if any
    pub fn local_version(edition_path: &Path) -> Option<String> {
        let content = fs::read_to_string(edition_path.join(VERSION_FILE)).ok()?;
        let version = content.trim();
        (!version.is_empty()).then(|| version.to_string())
    }

    /// Update every configured edition
    ///
    /// Never fails: each edition's outcome is in the returned results. An
    /// empty result set means a listener skipped the whole run. A missing or
    /// unwritable database folder fails every edition without creating it.
    pub async fn update(&self, config: &Config, force: bool) -> UpdateResults {
        let mut results = UpdateResults::new();

        let mut pre_update = Event::pre_update(config, config.editions().to_vec(), force);
        self.events.publish(&mut pre_update);

        let Some(pre) = pre_update.as_pre_update() else {
            return results;
        };
        if pre.should_skip_update() {
            info!("Update skipped by event listener");
            return results;
        }
        let editions = pre.editions().to_vec();
        let force = pre.is_force();

        info!(
            "Updating {} edition(s){}",
            editions.len(),
            if force { " (forced)" } else { "" }
        );

        let problems = self.files.validate_dir(config.database_folder());
        if problems.is_empty() {
            for edition in editions {
                let (result, proceed) = self.update_edition(config, edition, force).await;
                results.insert(edition, result);

                if !proceed {
                    warn!("Remaining updates stopped after {}", edition);
                    break;
                }
            }
        } else {
            let reason = problems.join("; ");
            warn!("Database folder is unusable: {}", reason);
            for edition in editions {
                results.insert(
                    edition,
                    UpdateResult::failure(format!("Failed to update {}: {}", edition, reason)),
                );
            }
        }

        let mut post_update = Event::post_update(config, results.clone());
        self.events.publish(&mut post_update);

        results
    }

    /// Process one edition; the flag is false when remaining editions must be skipped
    async fn update_edition(
        &self,
        config: &Config,
        edition: Edition,
        force: bool,
    ) -> (UpdateResult, bool) {
        let Some(remote) = self.remote.latest_version(config, edition).await else {
            return (
                UpdateResult::failure(format!("Failed to get remote info for {}", edition)),
                true,
            );
        };

        let edition_path = Self::edition_path(config, edition);
        let current = Self::local_version(&edition_path);
        debug!(
            "{}: local version {:?}, remote version {}",
            edition, current, remote.date
        );

        let mut database_update =
            Event::database_update(config, edition, current.clone(), Some(remote.date.clone()));
        self.events.publish(&mut database_update);

        let skipped = database_update
            .as_database_update()
            .is_some_and(|e| e.should_skip_database());
        if skipped {
            return (
                UpdateResult::success(format!("{} update skipped by event listener", edition))
                    .with_versions(current, Some(remote.date)),
                true,
            );
        }

        if let Some(current_version) = current.as_deref() {
            if !force && current_version >= remote.date.as_str() {
                return (
                    UpdateResult::success(format!("{} is up to date", edition))
                        .with_versions(current, Some(remote.date)),
                    true,
                );
            }
        }

        match self
            .install(config, edition, &remote, &edition_path, current.as_deref())
            .await
        {
            Ok(result) => (result, true),
            Err(error) => {
                self.recover(config, edition, &remote, &edition_path, current.as_deref(), error)
                    .await
            }
        }
    }

    /// Download, install and record the new version
    ///
    /// A failed download is an ordinary failed result. Only install and
    /// marker failures are returned as errors, after removing the archive.
    async fn install(
        &self,
        config: &Config,
        edition: Edition,
        remote: &RemoteInfo,
        edition_path: &Path,
        current: Option<&str>,
    ) -> Result<UpdateResult> {
        self.progress.start(edition);
        let progress: &ProgressFn<'_> = &|total, so_far| self.progress.update(total, so_far);

        let Some(archive) = self
            .remote
            .fetch(config, edition, remote, Some(progress))
            .await
        else {
            self.progress.fail("Download failed");
            return Ok(UpdateResult::failure(format!("Failed to download {}", edition)));
        };
        self.progress.complete();

        let installed = self
            .installer
            .install(&archive, edition_path)
            .and_then(|()| {
                self.files
                    .write_file(&edition_path.join(VERSION_FILE), &remote.date)
            });

        if let Err(e) = installed {
            if let Err(cleanup) = self.files.delete_file(&archive) {
                warn!("Failed to remove archive {}: {}", archive.display(), cleanup);
            }
            return Err(e);
        }

        self.files.delete_file(&archive)?;
        info!("{} updated to {}", edition, remote.date);

        Ok(
            UpdateResult::success(format!("{} has been updated", edition)).with_versions(
                Some(current.unwrap_or(NO_VERSION).to_string()),
                Some(remote.date.clone()),
            ),
        )
    }

    /// Publish the error event and apply the listeners' decision
    async fn recover(
        &self,
        config: &Config,
        edition: Edition,
        remote: &RemoteInfo,
        edition_path: &Path,
        current: Option<&str>,
        error: crate::Error,
    ) -> (UpdateResult, bool) {
        warn!("Failed to install {}: {}", edition, error);

        let mut update_error = Event::update_error(config, edition, error);
        self.events.publish(&mut update_error);

        let (retry, proceed) = update_error
            .as_update_error()
            .map_or((false, true), |e| (e.should_retry(), e.should_continue()));
        let mut message = update_error
            .as_update_error()
            .map(|e| e.error().to_string())
            .unwrap_or_default();

        if retry {
            info!("Retrying {} as requested by event listener", edition);
            match self.install(config, edition, remote, edition_path, current).await {
                Ok(result) => return (result, true),
                Err(retry_error) => {
                    warn!("Retry of {} failed: {}", edition, retry_error);
                    message = retry_error.to_string();
                }
            }
        }

        (
            UpdateResult::failure(format!("Failed to update {}: {}", edition, message)),
            proceed,
        )
    }
}

impl std::fmt::Debug for UpdateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateEngine")
            .field("files", &self.files)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
