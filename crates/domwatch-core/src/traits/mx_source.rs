// # MX Source Trait
//
// Defines the interface for resolving a domain's mail exchangers.
//
// ## Implementations
//
// - hickory-resolver backed: `domwatch-dns` crate

use async_trait::async_trait;

/// Trait for MX source implementations
///
/// Returns the exchange hostnames for a domain, in whatever order the
/// resolver produced them. Sorting is the [`crate::Snapshot`]
/// constructor's job.
///
/// # Failure contract
///
/// Resolution problems surface as [`crate::Error::Dns`]. The engine treats
/// any MX error as "no records" and logs it; unlike WHOIS failures, an MX
/// error never triggers backoff. Implementations must not hide errors by
/// returning an empty list themselves.
#[async_trait]
pub trait MxSource: Send + Sync {
    /// Resolve the MX exchange hostnames for a domain
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: exchange hostnames (possibly empty, unsorted)
    /// - `Err(Error)`: if resolution failed
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<String>, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
