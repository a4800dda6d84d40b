//! Core traits for the domwatch system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`WhoisSource`]: Fetch parsed WHOIS registration data
//! - [`MxSource`]: Resolve MX records for a domain
//! - [`SnapshotStore`]: Persist the last observed snapshot

pub mod mx_source;
pub mod snapshot_store;
pub mod whois_source;

pub use mx_source::MxSource;
pub use snapshot_store::SnapshotStore;
pub use whois_source::WhoisSource;
