//! Error types for geoip2-core

use thiserror::Error;

/// Result type alias using geoip2-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for configuration handling
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Edition outside the canonical set
    #[error("Unknown edition: {edition}. Valid editions: GeoLite2-ASN, GeoLite2-City, GeoLite2-Country")]
    InvalidEdition { edition: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid edition error
    pub fn invalid_edition(edition: impl Into<String>) -> Self {
        Self::InvalidEdition {
            edition: edition.into(),
        }
    }
}
