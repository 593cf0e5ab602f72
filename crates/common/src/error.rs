//! Error types shared across the harness

use thiserror::Error;

/// Result type alias using the common Error
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },

    #[error("invalid value for environment variable {name}: {reason}")]
    InvalidEnv { name: &'static str, reason: String },

    #[error("timed out after {millis}ms waiting for {what}")]
    Timeout { what: String, millis: u64 },
}

impl Error {
    /// Timeout error for a named wait.
    pub fn timeout(what: impl Into<String>, wait: std::time::Duration) -> Self {
        Error::Timeout {
            what: what.into(),
            millis: wait.as_millis() as u64,
        }
    }
}
