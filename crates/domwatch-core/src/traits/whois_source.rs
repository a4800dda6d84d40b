// # WHOIS Source Trait
//
// Defines the interface for fetching domain registration data.
//
// ## Implementations
//
// - Port-43 client with IANA server discovery: `domwatch-whois` crate
//
// ## Usage
//
// ```rust,ignore
// use domwatch_core::WhoisSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* WhoisSource implementation */;
//
//     let fields = source.fetch("derp.com").await?;
//     println!("registrar: {:?}", fields.get("registrar"));
//
//     Ok(())
// }
// ```

use crate::snapshot::WhoisFields;
use async_trait::async_trait;

/// Trait for WHOIS source implementations
///
/// A WHOIS source turns a domain name into the flattened field mapping the
/// change detector compares. Implementations own the wire protocol, server
/// selection, and parsing; they must NOT retry, back off, or sleep. Retry
/// policy is owned by the engine.
///
/// # Failure contract
///
/// Any transport-level problem (connect or read error, timeout, or a
/// registrar answering "Socket not responding" in-band) must surface as
/// [`crate::Error::WhoisTransport`]. A failed fetch returns no data, never
/// a partial record.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait WhoisSource: Send + Sync {
    /// Fetch and parse the WHOIS record for a domain
    ///
    /// # Returns
    ///
    /// - `Ok(WhoisFields)`: the flattened field mapping
    /// - `Err(Error)`: if the lookup failed (no partial data)
    async fn fetch(&self, domain: &str) -> Result<WhoisFields, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
