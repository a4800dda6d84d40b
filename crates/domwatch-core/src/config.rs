//! Configuration types for the domwatch system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main monitor configuration
///
/// Passed explicitly into [`crate::MonitorEngine::new`]; there are no
/// module-level constants to edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Domain to monitor
    pub domain: String,

    /// Seconds to sleep between completed poll cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Initial wait after a failed WHOIS fetch; doubles per consecutive failure
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,

    /// Ceiling for the doubling backoff. 0 disables the cap and restores
    /// unbounded growth.
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Snapshot store configuration
    #[serde(default)]
    pub snapshot_store: SnapshotStoreConfig,

    /// WHOIS client configuration
    #[serde(default)]
    pub whois: WhoisConfig,

    /// Capacity of the engine event channel. When full, new events are
    /// dropped (with a warning log) rather than blocking the loop.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl MonitorConfig {
    /// Create a configuration for one domain with default settings
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            poll_interval_secs: default_poll_interval_secs(),
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            snapshot_store: SnapshotStoreConfig::default(),
            whois: WhoisConfig::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domain.is_empty() {
            return Err(crate::Error::config("Domain cannot be empty"));
        }

        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }

        if self.initial_backoff_secs == 0 {
            return Err(crate::Error::config("Initial backoff must be > 0"));
        }

        if self.max_backoff_secs != 0 && self.max_backoff_secs < self.initial_backoff_secs {
            return Err(crate::Error::config(
                "Max backoff must be 0 (uncapped) or >= initial backoff",
            ));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        self.snapshot_store.validate()?;
        self.whois.validate()?;

        Ok(())
    }
}

/// Snapshot store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SnapshotStoreConfig {
    /// File-based snapshot store
    File {
        /// Path to the snapshot file
        path: String,
    },

    /// In-memory snapshot store (not persistent)
    Memory,
}

impl SnapshotStoreConfig {
    /// Validate the snapshot store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SnapshotStoreConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("Snapshot file path cannot be empty"));
                }
                Ok(())
            }
            SnapshotStoreConfig::Memory => Ok(()),
        }
    }
}

impl Default for SnapshotStoreConfig {
    fn default() -> Self {
        SnapshotStoreConfig::File {
            path: default_snapshot_path(),
        }
    }
}

/// WHOIS client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoisConfig {
    /// WHOIS server to query. When unset, the server for the domain's TLD
    /// is discovered through whois.iana.org.
    #[serde(default)]
    pub server: Option<String>,

    /// Per-query connect/read timeout in seconds
    #[serde(default = "default_whois_timeout_secs")]
    pub timeout_secs: u64,
}

impl WhoisConfig {
    /// Validate the WHOIS configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if let Some(server) = &self.server
            && server.is_empty()
        {
            return Err(crate::Error::config("WHOIS server cannot be empty"));
        }

        if self.timeout_secs == 0 {
            return Err(crate::Error::config("WHOIS timeout must be > 0"));
        }

        Ok(())
    }
}

impl Default for WhoisConfig {
    fn default() -> Self {
        Self {
            server: None,
            timeout_secs: default_whois_timeout_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    1800
}

fn default_initial_backoff_secs() -> u64 {
    60
}

fn default_max_backoff_secs() -> u64 {
    3600
}

fn default_snapshot_path() -> String {
    "domain_data.json".to_string()
}

fn default_whois_timeout_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    64
}
