//! Remote catalog access
//!
//! Provides the [`RemoteSource`] seam used by the engine plus the HTTP
//! implementation talking to the MaxMind download service:
//! - `GET <base>/geoip/databases/<edition>/update` for the latest version
//! - `GET <base>/geoip/databases/<edition>/download?date=<YYYYMMDD>&suffix=tar.gz`
//!
//! Both requests use HTTP Basic auth with the account id and license key.
//! Failures are not errors here: they come back as `None` and the engine
//! records a failed result for the edition.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use futures_util::StreamExt;
use geoip2_core::{Config, Edition, NetworkSettings};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::fs::FileStore;

/// Progress callback receiving `(total_bytes, bytes_so_far)`
pub type ProgressFn<'a> = dyn Fn(u64, u64) + Send + Sync + 'a;

/// Latest version of an edition according to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteInfo {
    /// Edition the query was made for
    pub edition_id: String,

    /// Sortable version token, `YYYY-MM-DD`
    pub date: String,
}

impl RemoteInfo {
    pub fn new(edition: Edition, date: impl Into<String>) -> Self {
        Self {
            edition_id: edition.as_str().to_string(),
            date: date.into(),
        }
    }

    /// Version token in the compact form the download endpoint expects
    ///
    /// Falls back to today's date when the token is not an ISO date.
    pub fn download_date(&self) -> String {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .unwrap_or_else(|_| Utc::now().date_naive())
            .format("%Y%m%d")
            .to_string()
    }
}

/// Source of version information and database archives
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Latest version of `edition`, or `None` when unavailable
    async fn latest_version(&self, config: &Config, edition: Edition) -> Option<RemoteInfo>;

    /// Download the archive for `info` to a temporary file
    ///
    /// Returns `None` on transport failure or a non-success status; any
    /// partial file is removed first. `progress` is only invoked once the
    /// total size is known.
    async fn fetch(
        &self,
        config: &Config,
        edition: Edition,
        info: &RemoteInfo,
        progress: Option<&ProgressFn<'_>>,
    ) -> Option<PathBuf>;
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    date: Option<String>,
}

/// HTTP client for the MaxMind download service
pub struct MaxMindClient {
    client: reqwest::Client,
    settings: NetworkSettings,
    files: FileStore,
}

impl MaxMindClient {
    pub fn new(settings: NetworkSettings) -> anyhow::Result<Self> {
        Self::with_file_store(settings, FileStore::new())
    }

    /// Client writing downloads through the given store
    pub fn with_file_store(settings: NetworkSettings, files: FileStore) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            settings,
            files,
        })
    }

    pub fn settings(&self) -> &NetworkSettings {
        &self.settings
    }

    fn update_url(&self, edition: Edition) -> String {
        format!(
            "{}/geoip/databases/{}/update",
            self.settings.base_url, edition
        )
    }

    fn download_url(&self, edition: Edition, info: &RemoteInfo) -> String {
        format!(
            "{}/geoip/databases/{}/download?date={}&suffix=tar.gz",
            self.settings.base_url,
            edition,
            info.download_date()
        )
    }

    async fn stream_to_file(
        &self,
        config: &Config,
        url: &str,
        target: &Path,
        progress: Option<&ProgressFn<'_>>,
    ) -> anyhow::Result<()> {
        use anyhow::{anyhow, Context};

        let response = self
            .client
            .get(url)
            .basic_auth(config.account_id(), Some(config.license_key()))
            .timeout(Duration::from_secs(self.settings.download_timeout_secs))
            .send()
            .await
            .context("Failed to send download request")?;

        if !response.status().is_success() {
            return Err(anyhow!("Download failed with status: {}", response.status()));
        }

        let total = response.content_length().unwrap_or(0);
        let mut file = File::create(target).context("Failed to create temporary file")?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk: bytes::Bytes = chunk.context("Failed to read download chunk")?;
            file.write_all(&chunk)
                .context("Failed to write to temporary file")?;
            downloaded += chunk.len() as u64;

            if let Some(callback) = progress {
                if total > 0 {
                    callback(total, downloaded);
                }
            }
        }

        file.flush().context("Failed to flush temporary file")?;
        Ok(())
    }
}

#[async_trait]
impl RemoteSource for MaxMindClient {
    async fn latest_version(&self, config: &Config, edition: Edition) -> Option<RemoteInfo> {
        let url = self.update_url(edition);
        debug!("Fetching remote info from: {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(config.account_id(), Some(config.license_key()))
            .timeout(Duration::from_secs(self.settings.http_timeout_secs))
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!("Remote info request for {} failed: {}", edition, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "Remote info for {} unavailable: status {}",
                edition,
                response.status()
            );
            return None;
        }

        match response.json::<UpdateResponse>().await {
            Ok(body) => {
                let date = body
                    .date
                    .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());
                Some(RemoteInfo::new(edition, date))
            }
            Err(e) => {
                warn!("Malformed remote info for {}: {}", edition, e);
                None
            }
        }
    }

    async fn fetch(
        &self,
        config: &Config,
        edition: Edition,
        info: &RemoteInfo,
        progress: Option<&ProgressFn<'_>>,
    ) -> Option<PathBuf> {
        let url = self.download_url(edition, info);
        let target = self.files.temp_file(&format!("{}.tar.gz", edition));
        debug!("Downloading {} to {}", url, target.display());

        match self.stream_to_file(config, &url, &target, progress).await {
            Ok(()) => Some(target),
            Err(e) => {
                warn!("Download of {} failed: {:#}", edition, e);
                if let Err(cleanup) = self.files.delete_file(&target) {
                    warn!("Failed to remove partial download: {}", cleanup);
                }
                None
            }
        }
    }
}
