// # Snapshot Store Trait
//
// Defines the interface for persisting the last observed snapshot.
//
// ## Purpose
//
// The store holds exactly one snapshot: the comparison baseline for the
// next poll cycle. Every completed cycle overwrites it, whether or not a
// change was detected. No history is retained.
//
// ## Implementations
//
// - File-based: single JSON file (`state::FileSnapshotStore`)
// - In-memory: testing / ephemeral runs (`state::MemorySnapshotStore`)

use crate::snapshot::Snapshot;
use async_trait::async_trait;

/// Trait for snapshot store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks, even
/// though the engine itself is a single sequential reader/writer.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the previously persisted snapshot
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Snapshot))`: the last persisted snapshot
    /// - `Ok(None)`: no prior state exists (first run)
    /// - `Err(Error)`: storage error
    async fn load(&self) -> Result<Option<Snapshot>, crate::Error>;

    /// Persist a snapshot, replacing any previous one unconditionally
    ///
    /// # Returns
    ///
    /// - `Ok(())`: successfully persisted
    /// - `Err(Error)`: storage error
    async fn save(&self, snapshot: &Snapshot) -> Result<(), crate::Error>;

    /// Persist any pending changes
    ///
    /// Some implementations may buffer writes. This ensures all changes are
    /// flushed to persistent storage.
    async fn flush(&self) -> Result<(), crate::Error>;
}
