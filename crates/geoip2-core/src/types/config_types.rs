//! Configuration types for database updates

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A GeoLite2 database product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Edition {
    #[serde(rename = "GeoLite2-ASN")]
    Asn,
    #[serde(rename = "GeoLite2-City")]
    City,
    #[serde(rename = "GeoLite2-Country")]
    Country,
}

impl Edition {
    /// Every edition the remote catalog serves
    pub const ALL: [Edition; 3] = [Edition::Asn, Edition::City, Edition::Country];

    /// Edition used when none is configured
    pub const DEFAULT: Edition = Edition::Country;

    /// Identifier used in URLs and on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            Edition::Asn => "GeoLite2-ASN",
            Edition::City => "GeoLite2-City",
            Edition::Country => "GeoLite2-Country",
        }
    }

    /// Comma separated list of valid identifiers, quoted
    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|e| format!("\"{}\"", e.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Edition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Edition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| Error::invalid_edition(s))
    }
}

/// Resolved updater configuration
///
/// Built by [`crate::config::ConfigBuilder`]; never mutated afterwards. The
/// edition list is deduplicated and only contains canonical editions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    account_id: String,
    #[serde(skip_serializing)]
    license_key: String,
    editions: Vec<Edition>,
    database_folder: PathBuf,
}

impl Config {
    pub fn new(
        account_id: impl Into<String>,
        license_key: impl Into<String>,
        editions: Vec<Edition>,
        database_folder: impl Into<PathBuf>,
    ) -> Self {
        let mut deduped: Vec<Edition> = Vec::with_capacity(editions.len());
        for edition in editions {
            if !deduped.contains(&edition) {
                deduped.push(edition);
            }
        }
        if deduped.is_empty() {
            deduped.push(Edition::DEFAULT);
        }

        Self {
            account_id: account_id.into(),
            license_key: license_key.into(),
            editions: deduped,
            database_folder: database_folder.into(),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn license_key(&self) -> &str {
        &self.license_key
    }

    pub fn editions(&self) -> &[Edition] {
        &self.editions
    }

    pub fn database_folder(&self) -> &Path {
        &self.database_folder
    }

    /// Copy of this configuration restricted to other editions
    pub fn with_editions(&self, editions: Vec<Edition>) -> Self {
        Self::new(
            self.account_id.clone(),
            self.license_key.clone(),
            editions,
            self.database_folder.clone(),
        )
    }

    /// Copy of this configuration with overridden credentials
    pub fn with_credentials(
        &self,
        account_id: impl Into<String>,
        license_key: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            license_key: license_key.into(),
            ..self.clone()
        }
    }

    /// Credentials present and at least one edition configured
    pub fn is_valid(&self) -> bool {
        !self.account_id.is_empty() && !self.license_key.is_empty() && !self.editions.is_empty()
    }
}
