//! JSON lines event log
//!
//! An [`EventBridge`] appending one record per forwarded event, so runs can
//! be audited or consumed by other tooling.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use geoip2_core::{Config, Edition};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::events::{Event, EventBridge, EventPayload};

/// One line of the event log
#[derive(Debug, Serialize)]
pub struct LogRecord<'a> {
    /// Unique record ID (UUID v4)
    pub event_id: String,

    pub timestamp: DateTime<Utc>,

    /// Dotted event name, e.g. `geoip2.database_update`
    pub event: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition: Option<Edition>,

    /// Tool version that wrote the record
    pub cli_version: &'static str,

    pub config: &'a Config,

    pub payload: &'a EventPayload,
}

impl<'a> LogRecord<'a> {
    pub fn new(event: &'a Event) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event: event.name().as_str(),
            edition: event.edition(),
            cli_version: env!("CARGO_PKG_VERSION"),
            config: event.config(),
            payload: event.payload(),
        }
    }
}

/// Appends forwarded events to a file
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: &Event) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create event log directory: {}", parent.display())
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open event log: {}", self.path.display()))?;

        let json_line =
            serde_json::to_string(&LogRecord::new(event)).context("Failed to serialize event")?;
        writeln!(file, "{}", json_line).context("Failed to write event to log")?;

        Ok(())
    }
}

impl EventBridge for EventLog {
    fn forward(&self, event: &Event) -> Result<()> {
        self.append(event)
    }
}
