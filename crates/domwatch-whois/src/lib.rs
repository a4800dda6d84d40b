// # WHOIS Source
//
// This crate provides the WHOIS source implementation for the domwatch
// system: a port-43 client with IANA-based server discovery and registrar
// referral following.
//
// ## Query flow
//
// 1. Pick a server: the configured one, or discover the TLD's registry
//    server through whois.iana.org
// 2. Query the registry server
// 3. If the record names a `Registrar WHOIS Server`, query it once and
//    prefer its (usually richer) response
// 4. Strip the database-update timestamp line and flatten into fields
//
// ## Architectural Constraints
//
// - ✅ One lookup per `fetch()` call (referral hop included)
// - ✅ Full error propagation to the engine (engine owns backoff and retry)
// - ✅ Connect/read timeouts on every query
// - ❌ NO retry logic (intentionally omitted - owned by MonitorEngine)
// - ❌ NO backoff logic (intentionally omitted - owned by MonitorEngine)
// - ❌ NO caching (intentionally omitted - state owned by SnapshotStore)
//
// ## Failure semantics
//
// Every transport problem (connect or read errors, timeouts, and the
// registrar answering "Socket not responding" inside an otherwise valid
// response) maps to `Error::WhoisTransport`, the condition the engine
// retries with backoff. A failed fetch yields no data, never a partial
// record.

mod parser;

use async_trait::async_trait;
use domwatch_core::config::WhoisConfig;
use domwatch_core::traits::WhoisSource;
use domwatch_core::{Error, Result, WhoisFields};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// IANA's root WHOIS server, used to discover per-TLD registry servers
pub const IANA_WHOIS_SERVER: &str = "whois.iana.org";

/// Standard WHOIS port
const WHOIS_PORT: u16 = 43;

/// Default per-query connect/read timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on response size; registrars occasionally stream garbage
const MAX_RESPONSE_BYTES: usize = 256 * 1024;

/// The in-band failure some registries return with a 200-OK-looking
/// response (observed in the wild; must be treated as transport failure)
const SOCKET_NOT_RESPONDING: &str = "Socket not responding";

/// Port-43 WHOIS client
///
/// # Example
///
/// ```rust,no_run
/// use domwatch_whois::WhoisClient;
/// use domwatch_core::traits::WhoisSource;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = WhoisClient::default();
///     let fields = client.fetch("derp.com").await?;
///     println!("registrar: {:?}", fields.get("registrar"));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct WhoisClient {
    /// Explicit server; when None the TLD's server is discovered via IANA
    server: Option<String>,

    /// Per-query connect/read timeout
    timeout: Duration,
}

impl WhoisClient {
    /// Create a new WHOIS client
    ///
    /// # Parameters
    ///
    /// - `server`: explicit WHOIS server, or None to discover per-TLD
    /// - `timeout`: per-query connect/read timeout
    pub fn new(server: Option<String>, timeout: Duration) -> Self {
        Self { server, timeout }
    }

    /// Create a client from the core configuration
    pub fn from_config(config: &WhoisConfig) -> Self {
        Self {
            server: config.server.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Send one query to one server and read the full response
    async fn query_server(&self, server: &str, query: &str) -> Result<String> {
        let address = format!("{}:{}", server, WHOIS_PORT);
        trace!(%address, %query, "whois query");

        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| Error::whois_transport(format!("Connect timeout to {}", address)))?
            .map_err(|e| Error::whois_transport(format!("Connect to {} failed: {}", address, e)))?;

        stream
            .write_all(format!("{}\r\n", query).as_bytes())
            .await
            .map_err(|e| Error::whois_transport(format!("Write to {} failed: {}", address, e)))?;

        let mut response = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = tokio::time::timeout(self.timeout, stream.read(&mut buf))
                .await
                .map_err(|_| Error::whois_transport(format!("Read timeout from {}", address)))?
                .map_err(|e| {
                    Error::whois_transport(format!("Read from {} failed: {}", address, e))
                })?;

            if n == 0 {
                break;
            }

            response.extend_from_slice(&buf[..n]);
            if response.len() > MAX_RESPONSE_BYTES {
                return Err(Error::whois_transport(format!(
                    "Response from {} exceeded {} bytes",
                    address, MAX_RESPONSE_BYTES
                )));
            }
        }

        Ok(String::from_utf8_lossy(&response).into_owned())
    }

    /// Discover the registry WHOIS server for a domain's TLD via IANA
    async fn discover_server(&self, domain: &str) -> Result<String> {
        let tld = domain.rsplit('.').next().unwrap_or(domain);
        let response = self.query_server(IANA_WHOIS_SERVER, tld).await?;

        parser::iana_referral(&response).ok_or_else(|| {
            Error::whois_transport(format!("IANA lists no WHOIS server for .{}", tld))
        })
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new(None, DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl WhoisSource for WhoisClient {
    async fn fetch(&self, domain: &str) -> Result<WhoisFields> {
        let server = match &self.server {
            Some(server) => server.clone(),
            None => self.discover_server(domain).await?,
        };

        let mut text = self.query_server(&server, domain).await?;

        // Registrar records are usually richer than registry ones; follow
        // one referral hop, keeping the registry response if the hop fails
        if let Some(referral) = parser::registrar_referral(&text)
            && !referral.eq_ignore_ascii_case(&server)
        {
            match self.query_server(&referral, domain).await {
                Ok(referred) => text = referred,
                Err(e) => {
                    debug!(%referral, "Registrar referral failed, keeping registry response: {}", e);
                }
            }
        }

        if text.contains(SOCKET_NOT_RESPONDING) {
            return Err(Error::whois_transport(SOCKET_NOT_RESPONDING));
        }

        let fields = parser::parse_fields(&parser::strip_database_timestamp(&text));
        if fields.is_empty() {
            return Err(Error::whois_transport(format!(
                "Empty WHOIS response from {}",
                server
            )));
        }

        Ok(fields)
    }

    fn source_name(&self) -> &'static str {
        "whois-port43"
    }
}
