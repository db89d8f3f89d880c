//! Configuration building and discovery

mod builder;
mod locator;

pub use builder::*;
pub use locator::*;
