use async_trait::async_trait;
use relay_dns_domain::DomainError;
use std::net::Ipv4Addr;

/// Best-effort external IP lookup for a domain name.
///
/// `Ok(None)` means the lookup completed but produced nothing usable.
/// Implementations may return the loopback address verbatim; the
/// dispatcher treats it as the "no real answer" sentinel.
#[async_trait]
pub trait ExternalResolver: Send + Sync {
    async fn resolve(&self, domain: &str) -> Result<Option<Ipv4Addr>, DomainError>;
}
