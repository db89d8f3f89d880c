//! Build a [`Config`] from a raw configuration mapping
//!
//! The builder never fails on bad input. Problems are collected as
//! human-readable warnings and the offending value falls back to its default,
//! so callers can report everything at once and decide via
//! [`Config::is_valid`] whether to proceed.

use crate::types::{Config, Edition};
use serde_yaml_ng::Value;
use std::path::Path;

pub const KEY_ACCOUNT_ID: &str = "maxmind-account-id";
pub const KEY_LICENSE_KEY: &str = "maxmind-license-key";
pub const KEY_EDITIONS: &str = "maxmind-database-editions";
pub const KEY_FOLDER: &str = "maxmind-database-folder";

/// Database folder used when none is configured
pub const DEFAULT_DATABASE_FOLDER: &str = "var/maxmind";

/// Builds configurations and remembers the warnings of the last build
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    warnings: Vec<String>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from a YAML mapping
    ///
    /// A relative database folder is resolved against `base_dir` when given.
    pub fn build(&mut self, raw: &Value, base_dir: Option<&Path>) -> Config {
        self.warnings.clear();

        let account_id = self.credential(raw, KEY_ACCOUNT_ID, "account ID");
        let license_key = self.credential(raw, KEY_LICENSE_KEY, "license key");
        let editions = self.editions(raw);

        let folder = match raw.get(KEY_FOLDER).map(scalar_to_string) {
            Some(Some(folder)) if !folder.trim().is_empty() => folder,
            Some(_) => {
                self.warnings
                    .push(format!("\"{}\" is specified but empty. Ignoring.", KEY_FOLDER));
                DEFAULT_DATABASE_FOLDER.to_string()
            }
            None => DEFAULT_DATABASE_FOLDER.to_string(),
        };

        let folder_path = Path::new(&folder);
        let database_folder = match base_dir {
            Some(base) if folder_path.is_relative() => base.join(folder_path),
            _ => folder_path.to_path_buf(),
        };

        Config::new(account_id, license_key, editions, database_folder)
    }

    /// Warnings collected during the last call to [`ConfigBuilder::build`]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn credential(&mut self, raw: &Value, key: &str, what: &str) -> String {
        match raw.get(key) {
            None => {
                self.warnings.push(format!(
                    "\"{}\" is not specified. Please add a valid {}.",
                    key, what
                ));
                String::new()
            }
            Some(value) => match scalar_to_string(value) {
                Some(s) if !s.trim().is_empty() => s,
                _ => {
                    self.warnings.push(format!(
                        "\"{}\" is specified but empty. Please add a valid {}.",
                        key, what
                    ));
                    String::new()
                }
            },
        }
    }

    fn editions(&mut self, raw: &Value) -> Vec<Edition> {
        let mut editions = Vec::new();

        let Some(value) = raw.get(KEY_EDITIONS) else {
            return editions;
        };

        let Some(items) = value.as_sequence() else {
            self.warnings.push(format!(
                "\"{}\" is specified but should be a list. Ignoring.",
                KEY_EDITIONS
            ));
            return editions;
        };

        for item in items {
            let name = scalar_to_string(item).unwrap_or_else(|| format!("{:?}", item));
            match name.parse::<Edition>() {
                Ok(edition) => {
                    if !editions.contains(&edition) {
                        editions.push(edition);
                    }
                }
                Err(_) => self.warnings.push(format!(
                    "Invalid value \"{}\" for option \"{}\". Valid options are {}.",
                    name,
                    KEY_EDITIONS,
                    Edition::valid_values()
                )),
            }
        }

        editions
    }
}

/// Render a YAML scalar as a string; numeric account ids are common
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
