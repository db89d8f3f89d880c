//! Configuration discovery
//!
//! Looks for configuration with the following precedence (first hit wins):
//! 1. Explicit path given by the caller
//! 2. Local project file (`geoip2-update.yaml` in the start dir or a parent)
//! 3. Global file (`~/.geoip2-update/config.yaml`, or `config.yaml` under
//!    `GEOIP2_UPDATE_HOME`)
//!
//! Environment variables (`GEOIP2_UPDATE_*` prefix) are applied on top of
//! whichever file was found.

use crate::config::builder::ConfigBuilder;
use crate::error::{Error, Result};
use crate::types::{Config, NetworkSettings};
use crate::utils::global_config_dir;
use serde_yaml_ng::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration file names searched in project directories
pub const CONFIG_FILE_NAMES: &[&str] = &["geoip2-update.yaml", "geoip2-update.yml"];

/// Directory under the home directory holding the global configuration
pub const GLOBAL_DIR_NAME: &str = ".geoip2-update";

/// Global configuration file name
pub const GLOBAL_FILE_NAME: &str = "config.yaml";

/// Key holding optional network settings in a configuration file
const KEY_NETWORK: &str = "network";

pub const ENV_ACCOUNT_ID: &str = "GEOIP2_UPDATE_ACCOUNT_ID";
pub const ENV_LICENSE_KEY: &str = "GEOIP2_UPDATE_LICENSE_KEY";
pub const ENV_BASE_URL: &str = "GEOIP2_UPDATE_BASE_URL";

/// Where a configuration was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Explicit,
    Local,
    Global,
}

/// A configuration together with where it came from
#[derive(Debug, Clone)]
pub struct LocatedConfig {
    pub config: Config,
    pub network: NetworkSettings,
    pub path: PathBuf,
    pub scope: ConfigScope,
    /// Warnings produced while building the configuration
    pub warnings: Vec<String>,
}

/// Finds and loads the updater configuration
pub struct ConfigLocator {
    start_dir: PathBuf,
    global_dir: Option<PathBuf>,
    cache: Option<Option<LocatedConfig>>,
}

impl ConfigLocator {
    /// Locator rooted at the current directory and the user's home
    pub fn new() -> Result<Self> {
        let start_dir = env::current_dir()?;
        Ok(Self::with_dirs(start_dir, global_config_dir()))
    }

    /// Locator with explicit search roots
    pub fn with_dirs(start_dir: impl Into<PathBuf>, global_dir: Option<PathBuf>) -> Self {
        Self {
            start_dir: start_dir.into(),
            global_dir,
            cache: None,
        }
    }

    /// Locate configuration, caching the outcome for this locator
    pub fn locate(&mut self) -> Result<Option<LocatedConfig>> {
        if let Some(cached) = &self.cache {
            return Ok(cached.clone());
        }

        let found = match self.find_local() {
            Some(path) => Some(Self::load_file(&path, ConfigScope::Local)?),
            None => match self.find_global() {
                Some(path) => Some(Self::load_file(&path, ConfigScope::Global)?),
                None => None,
            },
        };

        self.cache = Some(found.clone());
        Ok(found)
    }

    /// Load a configuration file from an explicit path
    pub fn load_path(path: &Path) -> Result<LocatedConfig> {
        if !path.exists() {
            return Err(Error::config_not_found(path.display().to_string()));
        }
        Self::load_file(path, ConfigScope::Explicit)
    }

    fn find_local(&self) -> Option<PathBuf> {
        let mut current = Some(self.start_dir.as_path());

        while let Some(dir) = current {
            for name in CONFIG_FILE_NAMES {
                let path = dir.join(name);
                if path.is_file() {
                    debug!("Found local configuration: {}", path.display());
                    return Some(path);
                }
            }
            current = dir.parent();
        }

        None
    }

    fn find_global(&self) -> Option<PathBuf> {
        let path = self.global_dir.as_ref()?.join(GLOBAL_FILE_NAME);
        if path.is_file() {
            debug!("Found global configuration: {}", path.display());
            Some(path)
        } else {
            None
        }
    }

    fn load_file(path: &Path, scope: ConfigScope) -> Result<LocatedConfig> {
        let content = fs::read_to_string(path)?;
        let raw: Value = if content.trim().is_empty() {
            Value::Mapping(Default::default())
        } else {
            serde_yaml_ng::from_str(&content)?
        };

        if !raw.is_mapping() {
            return Err(Error::invalid_config(format!(
                "{} must contain a mapping at the top level",
                path.display()
            )));
        }

        let network = match raw.get(KEY_NETWORK) {
            Some(value) => serde_yaml_ng::from_value::<NetworkSettings>(value.clone())
                .map_err(|e| {
                    Error::invalid_config(format!("Invalid \"{}\" section: {}", KEY_NETWORK, e))
                })?,
            None => NetworkSettings::default(),
        };

        let mut builder = ConfigBuilder::new();
        let config = builder.build(&raw, path.parent());
        let mut located = LocatedConfig {
            config,
            network,
            path: path.to_path_buf(),
            scope,
            warnings: builder.warnings().to_vec(),
        };
        apply_env_overrides(&mut located);

        Ok(located)
    }
}

/// Apply `GEOIP2_UPDATE_*` environment variables on top of a loaded file
fn apply_env_overrides(located: &mut LocatedConfig) {
    let account_id = non_empty_env(ENV_ACCOUNT_ID);
    let license_key = non_empty_env(ENV_LICENSE_KEY);

    if account_id.is_some() || license_key.is_some() {
        let config = &located.config;
        let account_id = account_id.unwrap_or_else(|| config.account_id().to_string());
        let license_key = license_key.unwrap_or_else(|| config.license_key().to_string());
        located.config = config.with_credentials(account_id, license_key);
        // Credentials now come from the environment; file warnings about them are stale
        located.warnings.retain(|w| {
            !(w.contains("maxmind-account-id") && !located.config.account_id().is_empty())
                && !(w.contains("maxmind-license-key") && !located.config.license_key().is_empty())
        });
    }

    if let Some(base_url) = non_empty_env(ENV_BASE_URL) {
        located.network = located.network.clone().with_base_url(base_url);
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Edition;
    use serial_test::serial;
    use tempfile::TempDir;

    const VALID: &str = r#"
maxmind-account-id: "42"
maxmind-license-key: secret
maxmind-database-editions: [GeoLite2-ASN]
maxmind-database-folder: db
"#;

    fn clear_env() {
        env::remove_var(ENV_ACCOUNT_ID);
        env::remove_var(ENV_LICENSE_KEY);
        env::remove_var(ENV_BASE_URL);
    }

    #[test]
    #[serial]
    fn test_local_config_in_parent_dir() {
        clear_env();
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("geoip2-update.yaml"), VALID).unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let mut locator = ConfigLocator::with_dirs(&nested, None);
        let located = locator.locate().unwrap().expect("config should be found");

        assert_eq!(located.scope, ConfigScope::Local);
        assert_eq!(located.config.editions(), &[Edition::Asn]);
        assert_eq!(located.config.database_folder(), temp.path().join("db"));
        assert_eq!(located.network, NetworkSettings::default());
    }

    #[test]
    #[serial]
    fn test_global_config_fallback() {
        clear_env();
        let project = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        fs::write(home.path().join(GLOBAL_FILE_NAME), VALID).unwrap();

        let mut locator =
            ConfigLocator::with_dirs(project.path(), Some(home.path().to_path_buf()));
        let located = locator.locate().unwrap().unwrap();

        assert_eq!(located.scope, ConfigScope::Global);
        assert_eq!(located.config.account_id(), "42");
    }

    #[test]
    #[serial]
    fn test_nothing_found() {
        clear_env();
        let project = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();

        let mut locator =
            ConfigLocator::with_dirs(project.path(), Some(home.path().to_path_buf()));
        assert!(locator.locate().unwrap().is_none());
    }

    #[test]
    #[serial]
    fn test_result_is_cached() {
        clear_env();
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("geoip2-update.yml");
        fs::write(&file, VALID).unwrap();

        let mut locator = ConfigLocator::with_dirs(temp.path(), None);
        assert!(locator.locate().unwrap().is_some());

        fs::remove_file(&file).unwrap();
        assert!(locator.locate().unwrap().is_some());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("geoip2-update.yaml"),
            "maxmind-database-folder: db\nnetwork:\n  user-agent: test-agent\n",
        )
        .unwrap();

        env::set_var(ENV_ACCOUNT_ID, "7");
        env::set_var(ENV_LICENSE_KEY, "from-env");
        env::set_var(ENV_BASE_URL, "http://127.0.0.1:9999/");

        let mut locator = ConfigLocator::with_dirs(temp.path(), None);
        let located = locator.locate().unwrap().unwrap();
        clear_env();

        assert_eq!(located.config.account_id(), "7");
        assert_eq!(located.config.license_key(), "from-env");
        assert!(located.config.is_valid());
        assert!(located.warnings.is_empty());
        assert_eq!(located.network.base_url, "http://127.0.0.1:9999");
        assert_eq!(located.network.user_agent, "test-agent");
    }

    #[test]
    #[serial]
    fn test_explicit_path() {
        clear_env();
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("custom.yaml");
        fs::write(&file, VALID).unwrap();

        let located = ConfigLocator::load_path(&file).unwrap();
        assert_eq!(located.scope, ConfigScope::Explicit);

        let missing = ConfigLocator::load_path(&temp.path().join("missing.yaml"));
        assert!(matches!(missing, Err(Error::ConfigNotFound { .. })));
    }

    #[test]
    #[serial]
    fn test_non_mapping_rejected() {
        clear_env();
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("geoip2-update.yaml");
        fs::write(&file, "- just\n- a list\n").unwrap();

        let err = ConfigLocator::load_path(&file).unwrap_err();
        assert!(err.to_string().contains("mapping"));
    }
}
