use async_trait::async_trait;
use relay_dns_domain::DomainError;

/// Relays a raw query datagram to the configured upstream DNS server.
///
/// Implementations must send `raw_query` unmodified and return the reply
/// datagram unmodified. Each call must use its own ephemeral socket: no
/// source-address correlation is performed, so a socket shared between
/// in-flight forwards could hand a reply to the wrong query.
#[async_trait]
pub trait UpstreamForwarder: Send + Sync {
    async fn forward(&self, raw_query: &[u8]) -> Result<Vec<u8>, DomainError>;
}
