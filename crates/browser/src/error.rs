//! Error types for browser automation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("node runtime not found; install Node.js and `npm install playwright`")]
    NodeNotFound,

    #[error("bridge command failed: {0}")]
    Bridge(String),

    #[error("bridge process exited before replying")]
    BridgeClosed,

    #[error("timed out after {millis}ms waiting for {what}")]
    Timeout { what: String, millis: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BrowserError {
    pub fn timeout(what: impl Into<String>, wait: std::time::Duration) -> Self {
        BrowserError::Timeout {
            what: what.into(),
            millis: wait.as_millis() as u64,
        }
    }
}
