//! Test doubles and common utilities for the monitor contract tests
//!
//! These doubles script the collaborator behavior so tests can drive the
//! engine deterministically without any network or disk access.

use domwatch_core::config::{MonitorConfig, SnapshotStoreConfig};
use domwatch_core::error::Result;
use domwatch_core::snapshot::{Snapshot, WhoisFields};
use domwatch_core::traits::{MxSource, SnapshotStore, WhoisSource};
use domwatch_core::Error;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted WHOIS fetch outcome
#[derive(Debug, Clone)]
pub enum WhoisScript {
    /// Return these fields
    Succeed(WhoisFields),
    /// Fail with a transport error carrying this message
    FailTransport(&'static str),
}

/// A WHOIS source that replays a fixed script, then keeps returning the
/// last successful fields
pub struct ScriptedWhoisSource {
    script: Arc<Mutex<VecDeque<WhoisScript>>>,
    fallback: WhoisFields,
    fetch_count: Arc<AtomicUsize>,
}

impl ScriptedWhoisSource {
    pub fn new(script: Vec<WhoisScript>, fallback: WhoisFields) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fallback,
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times fetch() was called
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Create a ScriptedWhoisSource that shares script and counters with
    /// an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            fallback: other.fallback.clone(),
            fetch_count: Arc::clone(&other.fetch_count),
        }
    }
}

#[async_trait::async_trait]
impl WhoisSource for ScriptedWhoisSource {
    async fn fetch(&self, _domain: &str) -> Result<WhoisFields> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        match self.script.lock().unwrap().pop_front() {
            Some(WhoisScript::Succeed(fields)) => Ok(fields),
            Some(WhoisScript::FailTransport(msg)) => Err(Error::whois_transport(msg)),
            None => Ok(self.fallback.clone()),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// An MX source that always returns the same record list
pub struct StaticMxSource {
    records: Vec<String>,
    lookup_count: Arc<AtomicUsize>,
}

impl StaticMxSource {
    pub fn new(records: &[&str]) -> Self {
        Self {
            records: records.iter().map(|s| s.to_string()).collect(),
            lookup_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times lookup_mx() was called
    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }

    /// Create a StaticMxSource that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            records: other.records.clone(),
            lookup_count: Arc::clone(&other.lookup_count),
        }
    }
}

#[async_trait::async_trait]
impl MxSource for StaticMxSource {
    async fn lookup_mx(&self, _domain: &str) -> Result<Vec<String>> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An MX source that always fails resolution
pub struct FailingMxSource;

#[async_trait::async_trait]
impl MxSource for FailingMxSource {
    async fn lookup_mx(&self, _domain: &str) -> Result<Vec<String>> {
        Err(Error::dns("resolution failed"))
    }

    fn source_name(&self) -> &'static str {
        "failing"
    }
}

/// A snapshot store that tracks calls
pub struct MockSnapshotStore {
    snapshot: Arc<Mutex<Option<Snapshot>>>,
    load_count: Arc<AtomicUsize>,
    save_count: Arc<AtomicUsize>,
    /// When true, the next save() fails once
    fail_next_save: Arc<Mutex<bool>>,
}

impl MockSnapshotStore {
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(None)),
            load_count: Arc::new(AtomicUsize::new(0)),
            save_count: Arc::new(AtomicUsize::new(0)),
            fail_next_save: Arc::new(Mutex::new(false)),
        }
    }

    /// Pre-populate the baseline snapshot
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        *store.snapshot.lock().unwrap() = Some(snapshot);
        store
    }

    /// Get the number of times load() was called
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    /// Get the number of times save() succeeded or failed
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Read the currently held snapshot
    pub fn held_snapshot(&self) -> Option<Snapshot> {
        self.snapshot.lock().unwrap().clone()
    }

    /// Make the next save() fail once
    pub fn fail_next_save(&self) {
        *self.fail_next_save.lock().unwrap() = true;
    }

    /// Create a MockSnapshotStore that shares state and counters with an
    /// existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            snapshot: Arc::clone(&other.snapshot),
            load_count: Arc::clone(&other.load_count),
            save_count: Arc::clone(&other.save_count),
            fail_next_save: Arc::clone(&other.fail_next_save),
        }
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MockSnapshotStore {
    async fn load(&self) -> Result<Option<Snapshot>> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        self.save_count.fetch_add(1, Ordering::SeqCst);

        let mut fail = self.fail_next_save.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(Error::snapshot_store("injected save failure"));
        }
        drop(fail);

        *self.snapshot.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// WHOIS fields with a single registrar entry
pub fn registrar_fields(registrar: &str) -> WhoisFields {
    let mut fields = WhoisFields::new();
    fields.insert(
        "registrar".to_string(),
        Value::String(registrar.to_string()),
    );
    fields
}

/// Helper to create a minimal MonitorConfig for testing
pub fn minimal_config(domain: &str) -> MonitorConfig {
    let mut config = MonitorConfig::new(domain);
    config.snapshot_store = SnapshotStoreConfig::Memory;
    config
}

/// Collect every event currently buffered on the channel
pub fn drain_events(
    rx: &mut tokio::sync::mpsc::Receiver<domwatch_core::EngineEvent>,
) -> Vec<domwatch_core::EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
