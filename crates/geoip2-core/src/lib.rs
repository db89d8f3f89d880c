//! # geoip2-core
//!
//! Core library for geoip2-update providing:
//! - The configuration model (credentials, editions, database folder)
//! - Configuration building with collected warnings
//! - Configuration discovery (project file, global file, environment)
//! - Network settings for the remote catalog

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::{ConfigBuilder, ConfigLocator, LocatedConfig};
pub use error::{Error, Result};
pub use types::{Config, Edition, NetworkSettings};
pub use utils::global_config_dir;
