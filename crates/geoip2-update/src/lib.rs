//! Update engine for GeoLite2 databases
//!
//! Provides:
//! - Filesystem primitives with process-unique temporary paths
//! - `.tar.gz` installation with wrapper folder flattening
//! - The MaxMind catalog and download client
//! - Lifecycle events with priorities, propagation control and a JSON lines log
//! - Download progress reporting
//! - The sequential multi-edition update engine

pub mod archive;
pub mod error;
pub mod event_log;
pub mod events;
pub mod fs;
pub mod progress;
pub mod remote;
pub mod results;
pub mod updater;

pub use archive::{ArchiveInstaller, Installer};
pub use error::{Error, Result};
pub use event_log::EventLog;
pub use events::{Event, EventBridge, EventBus, EventName, EventPayload};
pub use fs::FileStore;
pub use progress::{ConsoleProgress, NoProgress, ProgressReporter};
pub use remote::{MaxMindClient, ProgressFn, RemoteInfo, RemoteSource};
pub use results::{UpdateResult, UpdateResults};
pub use updater::{UpdateEngine, VERSION_FILE};

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
