//! Update lifecycle events and the bus delivering them
//!
//! Four events are published per run:
//! - `geoip2.pre_update`: observers may change the edition list and the
//!   force flag, or skip the whole run
//! - `geoip2.database_update`: once per edition after the version lookup;
//!   observers may skip the edition
//! - `geoip2.update_error`: after an install failure; observers may request
//!   one retry or stop the remaining editions
//! - `geoip2.post_update`: the aggregated results, read-only
//!
//! Handlers run highest priority first, then in registration order. A
//! failing handler is logged and delivery continues. Once a handler stops
//! propagation nothing else sees the event, including the bridge.

use geoip2_core::{Config, Edition};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use crate::error::Error;
use crate::results::UpdateResults;

/// Names handlers subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    PreUpdate,
    DatabaseUpdate,
    PostUpdate,
    UpdateError,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::PreUpdate => "geoip2.pre_update",
            EventName::DatabaseUpdate => "geoip2.database_update",
            EventName::PostUpdate => "geoip2.post_update",
            EventName::UpdateError => "geoip2.update_error",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Published before any edition is processed
#[derive(Debug, Clone, Serialize)]
pub struct PreUpdate {
    editions: Vec<Edition>,
    force: bool,
    skip_update: bool,
}

impl PreUpdate {
    pub fn editions(&self) -> &[Edition] {
        &self.editions
    }

    pub fn set_editions(&mut self, editions: Vec<Edition>) {
        self.editions = editions;
    }

    pub fn is_force(&self) -> bool {
        self.force
    }

    pub fn set_force(&mut self, force: bool) {
        self.force = force;
    }

    pub fn should_skip_update(&self) -> bool {
        self.skip_update
    }
}

/// Published once per edition after the remote lookup
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseUpdate {
    edition: Edition,
    current_version: Option<String>,
    remote_version: Option<String>,
    skip_database: bool,
}

impl DatabaseUpdate {
    pub fn edition(&self) -> Edition {
        self.edition
    }

    pub fn current_version(&self) -> Option<&str> {
        self.current_version.as_deref()
    }

    pub fn remote_version(&self) -> Option<&str> {
        self.remote_version.as_deref()
    }

    pub fn skip_database(&mut self) {
        self.skip_database = true;
    }

    pub fn should_skip_database(&self) -> bool {
        self.skip_database
    }

    /// True unless the local version is at least the remote one
    pub fn is_update_required(&self) -> bool {
        match (&self.current_version, &self.remote_version) {
            (Some(current), Some(remote)) => current < remote,
            _ => true,
        }
    }
}

/// Published after the last edition with every recorded result
#[derive(Debug, Clone, Serialize)]
pub struct PostUpdate {
    results: UpdateResults,
}

impl PostUpdate {
    pub fn results(&self) -> &UpdateResults {
        &self.results
    }

    pub fn has_errors(&self) -> bool {
        self.results.has_errors()
    }

    pub fn success_count(&self) -> usize {
        self.results.success_count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.failure_count()
    }

    pub fn updated_editions(&self) -> Vec<Edition> {
        self.results.updated_editions()
    }
}

/// Published when installing a downloaded archive failed
#[derive(Debug, Serialize)]
pub struct UpdateError {
    edition: Edition,
    #[serde(serialize_with = "serialize_error")]
    error: Error,
    retry: bool,
    #[serde(rename = "continue")]
    proceed: bool,
}

impl UpdateError {
    pub fn edition(&self) -> Edition {
        self.edition
    }

    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Ask the engine to run the install once more
    pub fn retry(&mut self) {
        self.retry = true;
    }

    pub fn should_retry(&self) -> bool {
        self.retry
    }

    pub fn should_continue(&self) -> bool {
        self.proceed
    }
}

fn serialize_error<S: Serializer>(error: &Error, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Variant specific part of an [`Event`]
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    PreUpdate(PreUpdate),
    DatabaseUpdate(DatabaseUpdate),
    PostUpdate(PostUpdate),
    UpdateError(UpdateError),
}

/// An event in flight
///
/// Constructed right before publishing and inspected by the engine once
/// [`EventBus::publish`] returns.
#[derive(Debug)]
pub struct Event {
    config: Config,
    propagation_stopped: bool,
    payload: EventPayload,
}

impl Event {
    fn new(config: &Config, payload: EventPayload) -> Self {
        Self {
            config: config.clone(),
            propagation_stopped: false,
            payload,
        }
    }

    pub fn pre_update(config: &Config, editions: Vec<Edition>, force: bool) -> Self {
        Self::new(
            config,
            EventPayload::PreUpdate(PreUpdate {
                editions,
                force,
                skip_update: false,
            }),
        )
    }

    pub fn database_update(
        config: &Config,
        edition: Edition,
        current_version: Option<String>,
        remote_version: Option<String>,
    ) -> Self {
        Self::new(
            config,
            EventPayload::DatabaseUpdate(DatabaseUpdate {
                edition,
                current_version,
                remote_version,
                skip_database: false,
            }),
        )
    }

    pub fn post_update(config: &Config, results: UpdateResults) -> Self {
        Self::new(config, EventPayload::PostUpdate(PostUpdate { results }))
    }

    pub fn update_error(config: &Config, edition: Edition, error: Error) -> Self {
        Self::new(
            config,
            EventPayload::UpdateError(UpdateError {
                edition,
                error,
                retry: false,
                proceed: true,
            }),
        )
    }

    pub fn name(&self) -> EventName {
        match &self.payload {
            EventPayload::PreUpdate(_) => EventName::PreUpdate,
            EventPayload::DatabaseUpdate(_) => EventName::DatabaseUpdate,
            EventPayload::PostUpdate(_) => EventName::PostUpdate,
            EventPayload::UpdateError(_) => EventName::UpdateError,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn into_payload(self) -> EventPayload {
        self.payload
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Edition the event refers to, if any
    pub fn edition(&self) -> Option<Edition> {
        match &self.payload {
            EventPayload::DatabaseUpdate(e) => Some(e.edition),
            EventPayload::UpdateError(e) => Some(e.edition),
            _ => None,
        }
    }

    pub fn as_pre_update(&self) -> Option<&PreUpdate> {
        match &self.payload {
            EventPayload::PreUpdate(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_pre_update_mut(&mut self) -> Option<&mut PreUpdate> {
        match &mut self.payload {
            EventPayload::PreUpdate(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_database_update(&self) -> Option<&DatabaseUpdate> {
        match &self.payload {
            EventPayload::DatabaseUpdate(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_database_update_mut(&mut self) -> Option<&mut DatabaseUpdate> {
        match &mut self.payload {
            EventPayload::DatabaseUpdate(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_post_update(&self) -> Option<&PostUpdate> {
        match &self.payload {
            EventPayload::PostUpdate(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_update_error(&self) -> Option<&UpdateError> {
        match &self.payload {
            EventPayload::UpdateError(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_update_error_mut(&mut self) -> Option<&mut UpdateError> {
        match &mut self.payload {
            EventPayload::UpdateError(e) => Some(e),
            _ => None,
        }
    }

    /// Skip the whole run; only meaningful on a pre-update event
    ///
    /// Also stops propagation.
    pub fn skip_update(&mut self) {
        if let EventPayload::PreUpdate(e) = &mut self.payload {
            e.skip_update = true;
            self.propagation_stopped = true;
        }
    }

    /// Stop processing the remaining editions; only meaningful on an error event
    ///
    /// Also stops propagation.
    pub fn stop_updates(&mut self) {
        if let EventPayload::UpdateError(e) = &mut self.payload {
            e.proceed = false;
            self.propagation_stopped = true;
        }
    }

    /// Alias of [`Event::stop_updates`]
    pub fn stop_processing(&mut self) {
        self.stop_updates();
    }

    /// One line description used for verbose logging
    pub fn summary(&self) -> String {
        match &self.payload {
            EventPayload::PreUpdate(e) => format!(
                "{} (editions: {}, force: {})",
                self.name(),
                e.editions
                    .iter()
                    .map(Edition::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
                if e.force { "yes" } else { "no" }
            ),
            EventPayload::DatabaseUpdate(e) => format!(
                "{} (edition: {}, current: {}, remote: {})",
                self.name(),
                e.edition,
                e.current_version.as_deref().unwrap_or("none"),
                e.remote_version.as_deref().unwrap_or("unknown")
            ),
            EventPayload::UpdateError(e) => format!(
                "{} (edition: {}, error: {})",
                self.name(),
                e.edition,
                e.error
            ),
            EventPayload::PostUpdate(e) => format!(
                "{} (success: {}, failed: {})",
                self.name(),
                e.success_count(),
                e.failure_count()
            ),
        }
    }
}

/// Receives events after local delivery unless propagation was stopped
pub trait EventBridge: Send + Sync {
    fn forward(&self, event: &Event) -> anyhow::Result<()>;
}

/// Event handler
pub type Handler = Box<dyn Fn(&mut Event) -> anyhow::Result<()> + Send + Sync>;

struct Registration {
    priority: i32,
    handler: Handler,
}

/// Priority ordered event delivery
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventName, Vec<Registration>>,
    bridge: Option<Box<dyn EventBridge>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `name`; higher priorities run first
    pub fn subscribe<F>(&mut self, name: EventName, priority: i32, handler: F)
    where
        F: Fn(&mut Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let registrations = self.handlers.entry(name).or_default();
        // After every handler of equal or higher priority
        let position = registrations.partition_point(|r| r.priority >= priority);
        registrations.insert(
            position,
            Registration {
                priority,
                handler: Box::new(handler),
            },
        );
    }

    pub fn set_bridge(&mut self, bridge: impl EventBridge + 'static) {
        self.bridge = Some(Box::new(bridge));
    }

    pub fn has_bridge(&self) -> bool {
        self.bridge.is_some()
    }

    pub fn handler_count(&self, name: EventName) -> usize {
        self.handlers.get(&name).map_or(0, Vec::len)
    }

    /// Deliver `event` to its handlers, then to the bridge
    ///
    /// A handler returning `Err` or panicking is logged and skipped. Panics
    /// are only caught in unwinding builds.
    pub fn publish(&self, event: &mut Event) {
        let name = event.name();
        debug!("Event: {}", event.summary());

        if let Some(registrations) = self.handlers.get(&name) {
            for registration in registrations {
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| (registration.handler)(event)));
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!("Error in event listener for {}: {:#}", name, e),
                    Err(_) => warn!("Event listener for {} panicked", name),
                }

                if event.is_propagation_stopped() {
                    debug!("Propagation of {} stopped by listener", name);
                    return;
                }
            }
        }

        if let Some(bridge) = &self.bridge {
            if let Err(e) = bridge.forward(event) {
                warn!("Failed to forward {} to event bridge: {:#}", name, e);
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self
            .handlers
            .iter()
            .map(|(name, regs)| (name.as_str(), regs.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("handlers", &counts)
            .field("bridge", &self.bridge.is_some())
            .finish()
    }
}
