//! Filesystem locations used by geoip2-update

use std::env;
use std::path::PathBuf;

use crate::config::GLOBAL_DIR_NAME;

/// Overrides the directory holding the global configuration
pub const ENV_HOME: &str = "GEOIP2_UPDATE_HOME";

/// Directory holding the global configuration
///
/// `GEOIP2_UPDATE_HOME` wins when set. Otherwise `~/.geoip2-update`, where
/// `~` comes from `HOME` before the platform lookup so redirected homes in
/// containers and CI are respected.
pub fn global_config_dir() -> Option<PathBuf> {
    if let Some(dir) = non_empty_var(ENV_HOME) {
        return Some(PathBuf::from(dir));
    }

    non_empty_var("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .map(|home| home.join(GLOBAL_DIR_NAME))
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
