// # domwatchd - Domain Watch Daemon
//
// The domwatchd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime
// 3. Wiring the WHOIS and DNS sources to the monitor engine
// 4. Running the engine until SIGTERM/SIGINT
//
// This is a thin integration layer: all monitoring logic lives in
// domwatch-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `DOMWATCH_DOMAIN`: Domain to monitor (required)
// - `DOMWATCH_POLL_INTERVAL_SECS`: Seconds between poll cycles (default 1800)
// - `DOMWATCH_INITIAL_BACKOFF_SECS`: First retry wait after a WHOIS
//   failure (default 60)
// - `DOMWATCH_MAX_BACKOFF_SECS`: Backoff ceiling, 0 = uncapped (default 3600)
// - `DOMWATCH_SNAPSHOT_PATH`: Path to the snapshot file (default
//   domain_data.json)
// - `DOMWATCH_WHOIS_SERVER`: Explicit WHOIS server (default: IANA discovery)
// - `DOMWATCH_WHOIS_TIMEOUT_SECS`: Per-query WHOIS timeout (default 30)
// - `DOMWATCH_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DOMWATCH_DOMAIN=derp.com
// export DOMWATCH_SNAPSHOT_PATH=/var/lib/domwatch/domain_data.json
//
// domwatchd
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use domwatch_core::config::{MonitorConfig, SnapshotStoreConfig, WhoisConfig};
use domwatch_core::{FileSnapshotStore, MemorySnapshotStore, MonitorEngine, SnapshotStore};
use domwatch_dns::HickoryMxSource;
use domwatch_whois::WhoisClient;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    domain: String,
    poll_interval_secs: Option<u64>,
    initial_backoff_secs: Option<u64>,
    max_backoff_secs: Option<u64>,
    snapshot_path: Option<String>,
    whois_server: Option<String>,
    whois_timeout_secs: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            domain: env::var("DOMWATCH_DOMAIN").map_err(|_| {
                anyhow::anyhow!(
                    "DOMWATCH_DOMAIN is required. \
                    Set it via: export DOMWATCH_DOMAIN=example.com"
                )
            })?,
            poll_interval_secs: parse_env_u64("DOMWATCH_POLL_INTERVAL_SECS")?,
            initial_backoff_secs: parse_env_u64("DOMWATCH_INITIAL_BACKOFF_SECS")?,
            max_backoff_secs: parse_env_u64("DOMWATCH_MAX_BACKOFF_SECS")?,
            snapshot_path: env::var("DOMWATCH_SNAPSHOT_PATH").ok(),
            whois_server: env::var("DOMWATCH_WHOIS_SERVER").ok(),
            whois_timeout_secs: parse_env_u64("DOMWATCH_WHOIS_TIMEOUT_SECS")?,
            log_level: env::var("DOMWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// This performs comprehensive validation including:
    /// - Domain name format (RFC 1035)
    /// - Numeric range validation
    /// - Snapshot path checks
    fn validate(&self) -> Result<()> {
        validate_domain_name(&self.domain)?;

        if let Some(interval) = self.poll_interval_secs
            && !(10..=86400).contains(&interval)
        {
            anyhow::bail!(
                "DOMWATCH_POLL_INTERVAL_SECS must be between 10 and 86400 seconds. Got: {}",
                interval
            );
        }

        if let Some(backoff) = self.initial_backoff_secs
            && !(1..=3600).contains(&backoff)
        {
            anyhow::bail!(
                "DOMWATCH_INITIAL_BACKOFF_SECS must be between 1 and 3600 seconds. Got: {}",
                backoff
            );
        }

        if let (Some(max), Some(initial)) = (self.max_backoff_secs, self.initial_backoff_secs)
            && max != 0
            && max < initial
        {
            anyhow::bail!(
                "DOMWATCH_MAX_BACKOFF_SECS must be 0 (uncapped) or >= the initial backoff. \
                Got: {} < {}",
                max,
                initial
            );
        }

        if let Some(timeout) = self.whois_timeout_secs
            && !(1..=300).contains(&timeout)
        {
            anyhow::bail!(
                "DOMWATCH_WHOIS_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                timeout
            );
        }

        if let Some(path) = &self.snapshot_path {
            if path.is_empty() {
                anyhow::bail!("DOMWATCH_SNAPSHOT_PATH cannot be empty");
            }

            if let Some(parent) = std::path::Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                anyhow::bail!(
                    "DOMWATCH_SNAPSHOT_PATH parent directory does not exist: {}. \
                    Create it first: mkdir -p {}",
                    parent.display(),
                    parent.display()
                );
            }
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DOMWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the core monitor configuration, applying defaults for any
    /// unset value
    fn to_monitor_config(&self) -> MonitorConfig {
        let mut config = MonitorConfig::new(self.domain.clone());

        if let Some(interval) = self.poll_interval_secs {
            config.poll_interval_secs = interval;
        }
        if let Some(backoff) = self.initial_backoff_secs {
            config.initial_backoff_secs = backoff;
        }
        if let Some(max) = self.max_backoff_secs {
            config.max_backoff_secs = max;
        }
        if let Some(path) = &self.snapshot_path {
            config.snapshot_store = SnapshotStoreConfig::File { path: path.clone() };
        }

        config.whois = WhoisConfig {
            server: self.whois_server.clone(),
            timeout_secs: self
                .whois_timeout_secs
                .unwrap_or(WhoisConfig::default().timeout_secs),
        };

        config
    }
}

/// Parse an optional numeric environment variable, rejecting garbage
/// instead of silently substituting a default
fn parse_env_u64(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(raw) => {
            let value = raw
                .parse()
                .map_err(|_| anyhow::anyhow!("{} must be a number. Got: {}", name, raw))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}

/// Validate that a string is a valid domain name
///
/// This implements basic DNS domain name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting domwatchd daemon");
    info!("Monitoring domain: {}", config.domain);

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let monitor_config = config.to_monitor_config();

    let snapshot_store: Box<dyn SnapshotStore> = match &monitor_config.snapshot_store {
        SnapshotStoreConfig::File { path } => {
            info!("Snapshot file: {}", path);
            Box::new(FileSnapshotStore::new(path).await?)
        }
        SnapshotStoreConfig::Memory => {
            info!("Snapshot store: in-memory (state lost on restart)");
            Box::new(MemorySnapshotStore::new())
        }
    };

    let whois_source = WhoisClient::from_config(&monitor_config.whois);
    match &monitor_config.whois.server {
        Some(server) => info!("WHOIS server: {}", server),
        None => info!("WHOIS server: IANA discovery"),
    }

    let mx_source = match HickoryMxSource::from_system_conf() {
        Ok(source) => source,
        Err(e) => {
            info!("System resolver config unavailable ({}), using defaults", e);
            HickoryMxSource::new()
        }
    };

    let (engine, mut event_rx) = MonitorEngine::new(
        Box::new(whois_source),
        Box::new(mx_source),
        snapshot_store,
        monitor_config,
    )?;

    // Surface engine events at debug level; the engine's own log lines
    // carry the operator-facing output
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "engine event");
        }
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal_name) => info!("Received shutdown signal: {}", signal_name),
            Err(e) => error!("Shutdown handler error: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    info!("Starting monitor engine");
    engine.run_with_shutdown(Some(shutdown_rx)).await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(received)
}

/// Wait for shutdown signals (ctrl-c only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
