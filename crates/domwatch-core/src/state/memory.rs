// # Memory Snapshot Store
//
// In-memory implementation of SnapshotStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing or ephemeral runs where the first cycle after a
// restart may harmlessly re-baseline.
//
// ## Crash Behavior
//
// - The snapshot is lost on restart/crash
// - The first cycle after a restart sees "no previous data" and reports
//   nothing

use std::sync::Arc;
use tokio::sync::RwLock;

use async_trait::async_trait;

use crate::Error;
use crate::snapshot::Snapshot;
use crate::traits::snapshot_store::SnapshotStore;

/// In-memory snapshot store implementation
///
/// # Example
///
/// ```rust,no_run
/// use domwatch_core::state::MemorySnapshotStore;
/// use domwatch_core::traits::SnapshotStore;
/// use domwatch_core::Snapshot;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemorySnapshotStore::new();
///
///     let snapshot = Snapshot::new(Default::default(), vec![]);
///     store.save(&snapshot).await?;
///     assert_eq!(store.load().await?, Some(snapshot));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<RwLock<Option<Snapshot>>>,
}

impl MemorySnapshotStore {
    /// Create a new empty memory snapshot store
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a snapshot is held
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_none()
    }

    /// Drop any held snapshot
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Option<Snapshot>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), Error> {
        *self.inner.write().await = Some(snapshot.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        // No-op for memory store (everything is already "persisted")
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::WhoisFields;
    use serde_json::Value;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemorySnapshotStore::new();

        assert!(store.is_empty().await);
        assert_eq!(store.load().await.unwrap(), None);

        let mut whois = WhoisFields::new();
        whois.insert("registrar".to_string(), Value::String("A".to_string()));
        let snapshot = Snapshot::new(whois, vec!["mail1.derp.com".to_string()]);

        store.save(&snapshot).await.unwrap();
        assert!(!store.is_empty().await);
        assert_eq!(store.load().await.unwrap(), Some(snapshot));

        store.clear().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_store_save_replaces() {
        let store = MemorySnapshotStore::new();

        let first = Snapshot::new(WhoisFields::new(), vec!["mail1.derp.com".to_string()]);
        let second = Snapshot::new(WhoisFields::new(), vec!["mail2.derp.com".to_string()]);

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(second));
    }
}
