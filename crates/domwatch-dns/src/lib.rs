// # MX Source
//
// This crate provides the MX source implementation for the domwatch
// system, backed by hickory-resolver.
//
// ## Architectural Constraints
//
// - ✅ One resolver query per `lookup_mx()` call
// - ✅ Full error propagation to the engine (which substitutes an empty
//   record list; MX failures never trigger backoff)
// - ❌ NO retry logic (intentionally omitted - owned by MonitorEngine)
// - ❌ NO caching beyond the resolver's own (state owned by SnapshotStore)
//
// ## Resolver configuration
//
// `from_system_conf()` reads /etc/resolv.conf and is the daemon default;
// `new()` falls back to the public default configuration for environments
// without a usable system configuration.

use async_trait::async_trait;
use domwatch_core::traits::MxSource;
use domwatch_core::{Error, Result};
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use tracing::trace;

/// MX source backed by hickory-resolver
///
/// # Example
///
/// ```rust,no_run
/// use domwatch_dns::HickoryMxSource;
/// use domwatch_core::traits::MxSource;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = HickoryMxSource::from_system_conf()?;
///     let records = source.lookup_mx("derp.com").await?;
///     println!("mx: {:?}", records);
///     Ok(())
/// }
/// ```
pub struct HickoryMxSource {
    resolver: TokioAsyncResolver,
}

impl HickoryMxSource {
    /// Create a source using the default public resolver configuration
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }

    /// Create a source from the system resolver configuration
    /// (/etc/resolv.conf)
    pub fn from_system_conf() -> Result<Self> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| Error::dns(format!("Failed to read system resolver config: {}", e)))?;

        Ok(Self { resolver })
    }
}

impl Default for HickoryMxSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MxSource for HickoryMxSource {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<String>> {
        trace!(%domain, "mx lookup");

        let response = self
            .resolver
            .mx_lookup(domain)
            .await
            .map_err(|e| Error::dns(e.to_string()))?;

        Ok(response.iter().map(|mx| mx.exchange().to_string()).collect())
    }

    fn source_name(&self) -> &'static str {
        "hickory"
    }
}
