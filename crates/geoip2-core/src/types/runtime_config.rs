//! Runtime settings for talking to the remote catalog

use serde::{Deserialize, Serialize};

/// Network and HTTP configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkSettings {
    /// Catalog base URL, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for catalog queries in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Timeout for archive downloads in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

impl NetworkSettings {
    /// Replace the base URL, trimming any trailing slash
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            http_timeout_secs: default_http_timeout(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://download.maxmind.com".to_string()
}

fn default_user_agent() -> String {
    format!("geoip2-update/{}", env!("CARGO_PKG_VERSION"))
}

fn default_http_timeout() -> u64 {
    60
}

fn default_download_timeout() -> u64 {
    600 // 10 minutes, City archives are large
}
