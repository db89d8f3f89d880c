//! Type definitions for updater configuration

mod config_types;
mod runtime_config;

pub use config_types::*;
pub use runtime_config::*;
