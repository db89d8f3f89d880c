//! Per-edition outcomes of an update run

use geoip2_core::Edition;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Outcome of processing one edition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,
}

impl UpdateResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            old_version: None,
            new_version: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            old_version: None,
            new_version: None,
        }
    }

    pub fn with_versions(mut self, old: Option<String>, new: Option<String>) -> Self {
        self.old_version = old;
        self.new_version = new;
        self
    }

    /// True when this result installed a different version than before
    pub fn is_version_change(&self) -> bool {
        match (&self.old_version, &self.new_version) {
            (Some(old), Some(new)) => self.success && old != new,
            _ => false,
        }
    }
}

/// Results keyed by edition, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateResults {
    entries: Vec<(Edition, UpdateResult)>,
}

impl UpdateResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result for `edition`, replacing an earlier one in place
    pub fn insert(&mut self, edition: Edition, result: UpdateResult) {
        match self.entries.iter_mut().find(|(e, _)| *e == edition) {
            Some((_, existing)) => *existing = result,
            None => self.entries.push((edition, result)),
        }
    }

    pub fn get(&self, edition: Edition) -> Option<&UpdateResult> {
        self.entries
            .iter()
            .find(|(e, _)| *e == edition)
            .map(|(_, r)| r)
    }

    pub fn contains(&self, edition: Edition) -> bool {
        self.get(edition).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Edition, &UpdateResult)> {
        self.entries.iter().map(|(e, r)| (*e, r))
    }

    pub fn editions(&self) -> Vec<Edition> {
        self.entries.iter().map(|(e, _)| *e).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|(_, r)| r.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.entries.iter().filter(|(_, r)| !r.success).count()
    }

    pub fn has_errors(&self) -> bool {
        self.failure_count() > 0
    }

    /// Editions whose installed version actually changed
    pub fn updated_editions(&self) -> Vec<Edition> {
        self.entries
            .iter()
            .filter(|(_, r)| r.is_version_change())
            .map(|(e, _)| *e)
            .collect()
    }
}

impl Serialize for UpdateResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (edition, result) in &self.entries {
            map.serialize_entry(edition.as_str(), result)?;
        }
        map.end()
    }
}
