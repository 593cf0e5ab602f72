//! Nodeharness Common Library
//!
//! Shared configuration, error types and the poll-with-timeout primitive
//! used by the UI-automation and load-test drivers.

pub mod config;
pub mod error;
pub mod poll;

pub use config::Config;
pub use error::{Error, Result};
pub use poll::{poll_until, PollOutcome};

/// Nodeharness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
