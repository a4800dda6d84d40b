// # domwatch-core
//
// Core library for the domwatch domain-metadata change detector.
//
// ## Architecture Overview
//
// This library provides the core functionality for WHOIS/MX change
// detection:
// - **WhoisSource**: Trait for fetching parsed WHOIS registration data
// - **MxSource**: Trait for resolving a domain's MX records
// - **SnapshotStore**: Trait for persisting the last observed snapshot
// - **MonitorEngine**: Core engine that drives the fetch → diff → report →
//   persist cycle
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Wire protocols live in collaborator
//    crates; policy lives here
// 2. **Engine-Owned Retry**: Sources perform one fetch per call; backoff
//    and scheduling belong to the engine
// 3. **Library-First**: The engine can be embedded and driven one cycle at
//    a time
// 4. **Single Baseline**: Exactly one snapshot is persisted; each cycle
//    replaces it

pub mod config;
pub mod engine;
pub mod error;
pub mod snapshot;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{MonitorConfig, SnapshotStoreConfig, WhoisConfig};
pub use engine::{CycleOutcome, EngineEvent, MonitorEngine};
pub use error::{Error, Result};
pub use snapshot::{ChangeReport, Snapshot, WhoisFields};
pub use state::{FileSnapshotStore, MemorySnapshotStore};
pub use traits::{MxSource, SnapshotStore, WhoisSource};
