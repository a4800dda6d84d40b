//! Error types for the domwatch system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for domwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the domwatch system
#[derive(Error, Debug)]
pub enum Error {
    /// WHOIS transport-level errors (connect, read, timeout, or the
    /// registrar's in-band "Socket not responding" condition)
    #[error("WHOIS transport error: {0}")]
    WhoisTransport(String),

    /// DNS resolution errors
    #[error("DNS resolution error: {0}")]
    Dns(String),

    /// Snapshot store-related errors
    #[error("Snapshot store error: {0}")]
    SnapshotStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a WHOIS transport error
    pub fn whois_transport(msg: impl Into<String>) -> Self {
        Self::WhoisTransport(msg.into())
    }

    /// Create a DNS resolution error
    pub fn dns(msg: impl Into<String>) -> Self {
        Self::Dns(msg.into())
    }

    /// Create a snapshot store error
    pub fn snapshot_store(msg: impl Into<String>) -> Self {
        Self::SnapshotStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check whether this error is a WHOIS transport failure
    ///
    /// The engine retries these with backoff; everything else is either
    /// recovered differently (DNS) or surfaced to the caller.
    pub fn is_whois_transport(&self) -> bool {
        matches!(self, Self::WhoisTransport(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
