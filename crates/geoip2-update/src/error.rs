//! Error types for the update pipeline
//!
//! Only failures that happen after a successful download are errors. A
//! missing catalog entry or a failed transfer is reported through `None`
//! from the [`crate::remote::RemoteSource`] instead.

use std::path::Path;
use thiserror::Error;

/// Result type alias using geoip2-update's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause of an extraction failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    /// A filesystem primitive failed
    #[error("{message}")]
    File {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The archive could not be opened, decoded or installed
    #[error("{message}")]
    Extract {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl Error {
    /// Create a file error wrapping an IO error
    pub fn file(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::File {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a file error without an underlying cause
    pub fn file_msg(message: impl Into<String>) -> Self {
        Self::File {
            message: message.into(),
            source: None,
        }
    }

    /// Create an extract error wrapping any underlying cause
    pub fn extract(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Extract {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create an extract error for a missing archive
    pub fn archive_not_found(path: &Path) -> Self {
        Self::Extract {
            message: format!("Archive file not found: {}", path.display()),
            source: None,
        }
    }
}
