use async_trait::async_trait;
use relay_dns_application::ports::UpstreamForwarder;
use relay_dns_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

/// Maximum upstream reply size we accept over UDP.
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// Forwards raw query datagrams to a fixed upstream DNS server.
///
/// Every call binds a fresh ephemeral socket, so concurrently in-flight
/// forwards can never pick up each other's replies. The socket is dropped
/// on every exit path; `timeout` bounds its lifetime.
pub struct UdpForwarder {
    upstream: SocketAddr,
    timeout: Duration,
}

impl UdpForwarder {
    pub fn new(upstream: SocketAddr, timeout: Duration) -> Self {
        Self { upstream, timeout }
    }
}

#[async_trait]
impl UpstreamForwarder for UdpForwarder {
    async fn forward(&self, raw_query: &[u8]) -> Result<Vec<u8>, DomainError> {
        let bind_addr: SocketAddr = if self.upstream.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::IoError(format!("failed to bind forward socket: {}", e)))?;

        socket.connect(self.upstream).await.map_err(|e| {
            DomainError::IoError(format!("failed to connect to {}: {}", self.upstream, e))
        })?;

        socket.send(raw_query).await.map_err(|e| {
            DomainError::IoError(format!("failed to send to {}: {}", self.upstream, e))
        })?;

        debug!(upstream = %self.upstream, bytes = raw_query.len(), "Query forwarded");

        let mut reply = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let len = tokio::time::timeout(self.timeout, socket.recv(&mut reply))
            .await
            .map_err(|_| DomainError::QueryTimeout)?
            .map_err(|e| {
                DomainError::IoError(format!("failed to receive from {}: {}", self.upstream, e))
            })?;

        reply.truncate(len);
        debug!(upstream = %self.upstream, bytes = len, "Upstream reply received");
        Ok(reply)
    }
}
