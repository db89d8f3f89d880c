//! Configuration helpers

use geoip2_core::{Config, Edition};
use std::path::Path;

use super::constants::*;

/// Valid configuration installing into `folder`
pub fn test_config(folder: &Path, editions: &[Edition]) -> Config {
    Config::new(ACCOUNT_ID, LICENSE_KEY, editions.to_vec(), folder)
}

/// Write a `VERSION.txt` marker as a previous install would have
pub fn write_local_version(folder: &Path, edition: Edition, version: &str) {
    let dir = folder.join(edition.as_str());
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(geoip2_update::VERSION_FILE), version).unwrap();
}

/// Read the `VERSION.txt` marker of an edition
pub fn read_local_version(folder: &Path, edition: Edition) -> Option<String> {
    std::fs::read_to_string(folder.join(edition.as_str()).join(geoip2_update::VERSION_FILE)).ok()
}
