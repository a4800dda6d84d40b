// # File Snapshot Store
//
// File-based implementation of SnapshotStore with crash recovery.
//
// ## Purpose
//
// Persists the last observed snapshot across daemon restarts so the first
// cycle after a restart still has a comparison baseline.
//
// ## Crash Recovery
//
// - Atomic writes: uses write-then-rename for atomicity
// - Corruption detection: validates JSON on load
// - Automatic backup: keeps .backup of last known good state
// - Recovery: falls back to backup if corruption detected
//
// ## File Format
//
// The file is the snapshot itself, a single JSON object with two keys:
//
// ```json
// {
//   "whois": { "registrar": "Example Registrar, Inc." },
//   "mx_records": ["mail1.derp.com.", "mail2.derp.com."]
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::snapshot::Snapshot;
use crate::traits::snapshot_store::SnapshotStore;

/// File-based snapshot store with crash recovery
///
/// The snapshot is cached in memory and written atomically (temp file +
/// rename) on every save, with the previous file kept as `.backup`.
///
/// # Example
///
/// ```rust,no_run
/// use domwatch_core::state::FileSnapshotStore;
/// use domwatch_core::traits::SnapshotStore;
/// use domwatch_core::Snapshot;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSnapshotStore::new("domain_data.json").await?;
///
///     let snapshot = Snapshot::new(Default::default(), vec!["mail1.derp.com".into()]);
///     store.save(&snapshot).await?;
///
///     assert_eq!(store.load().await?, Some(snapshot));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSnapshotStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

/// Internal state for the file-based store
#[derive(Debug)]
struct FileState {
    snapshot: Option<Snapshot>,
    dirty: bool,
}

impl FileSnapshotStore {
    /// Create or load a file snapshot store
    ///
    /// This will:
    /// 1. Try to load an existing snapshot file
    /// 2. If corruption is detected, try to load from backup
    /// 3. If both fail, start with no snapshot
    /// 4. Create parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create snapshot directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let snapshot = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                snapshot,
                dirty: false,
            })),
        })
    }

    /// Load the snapshot from disk with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load the main snapshot file
    /// 2. On a JSON parse error, try loading the backup
    /// 3. If the backup also fails, start with no snapshot
    async fn load_with_recovery(path: &Path) -> Result<Option<Snapshot>, Error> {
        match Self::load_file(path).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                let error_str = e.to_string().to_lowercase();
                let corrupted = error_str.contains("json")
                    || error_str.contains("parse")
                    || error_str.contains("expected value")
                    || error_str.contains("eof");

                if !corrupted {
                    return Err(e);
                }

                tracing::warn!(
                    "Snapshot file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with no snapshot.");
                    return Ok(None);
                }

                match Self::load_file(&backup_path).await {
                    Ok(snapshot) => {
                        tracing::info!("Recovered snapshot from backup");
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "Failed to restore snapshot file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(snapshot)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also corrupted: {}. Starting with no snapshot.",
                            backup_err
                        );
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Load the snapshot file, if present
    async fn load_file(path: &Path) -> Result<Option<Snapshot>, Error> {
        if !path.exists() {
            tracing::debug!("Snapshot file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::snapshot_store(format!(
                "Failed to read snapshot file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
            Error::snapshot_store(format!(
                "Failed to parse snapshot file {}: {}. \
                File may be corrupted. Try restoring from backup.",
                path.display(),
                e
            ))
        })?;

        // External edits may break the sort invariant
        snapshot.normalize();

        Ok(Some(snapshot))
    }

    /// Write the cached snapshot to disk atomically
    async fn write_state(&self) -> Result<(), Error> {
        let json = {
            let state_guard = self.state.read().await;
            let Some(snapshot) = &state_guard.snapshot else {
                return Ok(());
            };

            serde_json::to_string_pretty(snapshot)
                .map_err(|e| Error::snapshot_store(format!("Failed to serialize snapshot: {}", e)))?
        };

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::snapshot_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::snapshot_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::snapshot_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::snapshot_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        {
            let mut state_guard = self.state.write().await;
            state_guard.dirty = false;
        }

        tracing::trace!("Snapshot written to file: {}", self.path.display());
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> Result<Option<Snapshot>, Error> {
        let state_guard = self.state.read().await;
        Ok(state_guard.snapshot.clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            state_guard.snapshot = Some(snapshot.clone());
            state_guard.dirty = true;
        }

        // Immediate write for durability
        self.write_state().await
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty { self.write_state().await } else { Ok(()) }
    }
}
