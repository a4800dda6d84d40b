//! Core monitor engine
//!
//! The MonitorEngine is responsible for:
//! - Fetching WHOIS data and MX records via the source traits
//! - Retrying failed WHOIS fetches with doubling backoff
//! - Diffing the fresh snapshot against the persisted baseline
//! - Reporting changes and persisting the new snapshot
//!
//! ## Cycle
//!
//! ```text
//! ┌──────────────┐   transport error    ┌──────────────┐
//! │   Fetching   │─────────────────────▶│   Backoff    │
//! │ (WHOIS + MX) │◀─────────────────────│ (wait, x2)   │
//! └──────────────┘      retry           └──────────────┘
//!        │ WHOIS ok
//!        ▼
//! ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//! │  Comparing   │─────▶│  Persisting  │─────▶│    Sleep     │
//! │ (load, diff) │      │ (save always)│      │ (poll, reset)│
//! └──────────────┘      └──────────────┘      └──────────────┘
//! ```
//!
//! MX lookups are re-queried afresh on every WHOIS attempt, but an MX
//! error is logged and replaced with an empty record list; it never
//! triggers backoff on its own.

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::snapshot::{Snapshot, WhoisFields};
use crate::traits::{MxSource, SnapshotStore, WhoisSource};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the MonitorEngine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        domain: String,
    },

    /// A WHOIS fetch attempt failed; the engine will retry after the wait
    WhoisFetchFailed {
        attempt: usize,
        error: String,
        retry_in_secs: u64,
    },

    /// An MX lookup failed and was treated as "no records"
    MxLookupFailed {
        error: String,
    },

    /// The WHOIS section differs from the persisted baseline
    WhoisChanged {
        previous: WhoisFields,
        current: WhoisFields,
    },

    /// The MX section differs from the persisted baseline
    MxChanged {
        previous: Vec<String>,
        current: Vec<String>,
    },

    /// The cycle completed and the snapshot was persisted
    SnapshotPersisted {
        changed: bool,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Outcome of one completed poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Whether any section differed from the baseline
    pub changed: bool,

    /// Whether no baseline existed (first ever run)
    pub first_run: bool,
}

/// Core monitor engine
///
/// Orchestrates the fetch → diff → report → persist cycle for a single
/// domain. Retry policy lives here and only here: sources perform one
/// fetch per call and return errors for the engine to handle.
///
/// ## Lifecycle
///
/// 1. Create with [`MonitorEngine::new()`]
/// 2. Start with [`MonitorEngine::run()`] (or drive single cycles via
///    [`MonitorEngine::check_for_changes()`] when embedding)
/// 3. The loop runs until a shutdown signal is received
///
/// ## Threading
///
/// The engine runs all operations on a single async task; nothing happens
/// concurrently within a cycle.
pub struct MonitorEngine {
    /// WHOIS source for registration data
    whois_source: Box<dyn WhoisSource>,

    /// MX source for mail-exchanger records
    mx_source: Box<dyn MxSource>,

    /// Snapshot store holding the comparison baseline
    snapshot_store: Box<dyn SnapshotStore>,

    /// Monitor configuration
    config: MonitorConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl MonitorEngine {
    /// Create a new monitor engine
    ///
    /// # Parameters
    ///
    /// - `whois_source`: WHOIS source implementation
    /// - `mx_source`: MX source implementation
    /// - `snapshot_store`: snapshot store implementation
    /// - `config`: monitor configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events
    pub fn new(
        whois_source: Box<dyn WhoisSource>,
        mx_source: Box<dyn MxSource>,
        snapshot_store: Box<dyn SnapshotStore>,
        config: MonitorConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            whois_source,
            mx_source,
            snapshot_store,
            config,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the monitor loop until ctrl-c
    ///
    /// # Returns
    ///
    /// - `Ok(())`: clean shutdown
    /// - `Err(Error)`: fatal error (engine setup only; cycle errors are
    ///   logged and the loop continues)
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the monitor loop with an external shutdown signal
    ///
    /// Used by the daemon (which owns SIGTERM/SIGINT handling) and by
    /// contract tests that need deterministic termination.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            domain: self.config.domain.clone(),
        });
        info!(domain = %self.config.domain, "monitor started");

        let poll_interval = Duration::from_secs(self.config.poll_interval_secs);

        if let Some(mut rx) = shutdown_rx {
            loop {
                tokio::select! {
                    result = self.check_for_changes() => {
                        if let Err(e) = result {
                            error!("Poll cycle failed: {}", e);
                            // Continue running despite errors
                        }
                    }

                    _ = &mut rx => {
                        self.stop("Shutdown signal").await?;
                        return Ok(());
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(poll_interval) => {}

                    _ = &mut rx => {
                        self.stop("Shutdown signal").await?;
                        return Ok(());
                    }
                }
            }
        } else {
            loop {
                tokio::select! {
                    result = self.check_for_changes() => {
                        if let Err(e) = result {
                            error!("Poll cycle failed: {}", e);
                        }
                    }

                    _ = tokio::signal::ctrl_c() => {
                        self.stop("ctrl-c").await?;
                        return Ok(());
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(poll_interval) => {}

                    _ = tokio::signal::ctrl_c() => {
                        self.stop("ctrl-c").await?;
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn stop(&self, reason: &str) -> Result<()> {
        info!("Shutdown signal received");
        self.emit_event(EngineEvent::Stopped {
            reason: reason.to_string(),
        });

        // Flush state before exiting
        self.snapshot_store.flush().await?;
        info!("State flushed, monitor stopped");
        Ok(())
    }

    /// Run one poll cycle: fetch (with WHOIS retry), diff, report, persist
    ///
    /// The backoff starts at the configured initial value and doubles per
    /// consecutive WHOIS failure; each cycle starts fresh. MX errors are
    /// swallowed into an empty record list and never retried on their own.
    pub async fn check_for_changes(&self) -> Result<CycleOutcome> {
        let domain = &self.config.domain;
        let mut backoff = Duration::from_secs(self.config.initial_backoff_secs);
        let mut attempt = 0usize;

        let (whois_fields, mx_records) = loop {
            attempt += 1;

            // Re-queried afresh alongside WHOIS on every attempt
            let mx_records = match self.mx_source.lookup_mx(domain).await {
                Ok(records) => records,
                Err(e) => {
                    warn!(%domain, "Error fetching MX records: {}", e);
                    self.emit_event(EngineEvent::MxLookupFailed {
                        error: e.to_string(),
                    });
                    Vec::new()
                }
            };

            match self.whois_source.fetch(domain).await {
                Ok(fields) => break (fields, mx_records),
                Err(e) => {
                    warn!(
                        %domain,
                        attempt,
                        "WHOIS query failed: {}. Retrying in {} seconds",
                        e,
                        backoff.as_secs()
                    );
                    self.emit_event(EngineEvent::WhoisFetchFailed {
                        attempt,
                        error: e.to_string(),
                        retry_in_secs: backoff.as_secs(),
                    });

                    tokio::time::sleep(backoff).await;
                    backoff = self.next_backoff(backoff);
                }
            }
        };

        let current = Snapshot::new(whois_fields, mx_records);
        let previous = self.snapshot_store.load().await?;
        let first_run = previous.is_none();

        let changed = match &previous {
            Some(previous) => {
                let report = previous.diff(&current);
                let has_changes = !report.is_empty();

                if has_changes {
                    info!(%domain, "Changes detected");
                }

                if let Some((old, new)) = report.whois {
                    info!(previous = ?old, current = ?new, "WHOIS information has changed");
                    self.emit_event(EngineEvent::WhoisChanged {
                        previous: old,
                        current: new,
                    });
                }

                if let Some((old, new)) = report.mx_records {
                    info!(previous = ?old, current = ?new, "MX records have changed");
                    self.emit_event(EngineEvent::MxChanged {
                        previous: old,
                        current: new,
                    });
                }

                has_changes
            }
            None => {
                debug!(%domain, "No previous snapshot, establishing baseline");
                false
            }
        };

        // Persist unconditionally, changed or not
        self.snapshot_store.save(&current).await?;
        self.emit_event(EngineEvent::SnapshotPersisted { changed });

        Ok(CycleOutcome { changed, first_run })
    }

    /// Double the backoff, honoring the configured ceiling (0 = uncapped)
    fn next_backoff(&self, current: Duration) -> Duration {
        let doubled = current.saturating_mul(2);
        match self.config.max_backoff_secs {
            0 => doubled,
            cap => doubled.min(Duration::from_secs(cap)),
        }
    }

    /// Emit an engine event
    ///
    /// Monitoring must never block or kill the loop: a full channel drops
    /// the event with a warning, and a closed channel (observer detached)
    /// is ignored.
    fn emit_event(&self, event: EngineEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!(
                "Event channel full, dropping event. Consider increasing event_channel_capacity."
            );
        }
    }
}
