//! Common test infrastructure for geoip2-update tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: Credentials, version tokens and payload bytes
//! - `archives`: `.tar.gz` fixture builders
//! - `builders`: Configuration helpers
//! - `fakes`: In-process `RemoteSource`, `Installer` and progress doubles
//! - `mock_server`: Wiremock setup helpers for the catalog endpoints

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod archives;
pub mod builders;
pub mod constants;
pub mod fakes;
pub mod mock_server;

pub use archives::*;
pub use builders::*;
pub use constants::*;
pub use fakes::*;
pub use mock_server::*;
