use relay_dns_application::HandleQueryUseCase;
use relay_dns_domain::DomainError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, info};

/// Receive buffer size. DNS over UDP tops out well below this, but the
/// listener accepts anything up to a full 64 KiB datagram.
const RECV_BUF_SIZE: usize = 64 * 1024;

/// Single-socket UDP DNS listener.
///
/// Each datagram is copied out and handled on its own task so a slow
/// upstream or web lookup never blocks reception. A bind failure is fatal
/// and propagates from [`DnsServer::bind`]; per-query failures are logged
/// and skipped.
pub struct DnsServer {
    socket: Arc<UdpSocket>,
    use_case: Arc<HandleQueryUseCase>,
}

impl DnsServer {
    pub async fn bind(
        bind_addr: SocketAddr,
        use_case: Arc<HandleQueryUseCase>,
    ) -> Result<Self, DomainError> {
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::IoError(format!("failed to bind {}: {}", bind_addr, e)))?;
        Ok(Self {
            socket: Arc::new(socket),
            use_case,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DomainError> {
        self.socket
            .local_addr()
            .map_err(|e| DomainError::IoError(e.to_string()))
    }

    /// Serves queries until the process exits.
    pub async fn serve(self) -> Result<(), DomainError> {
        let bind_address = self.local_addr()?;
        info!(bind_address = %bind_address, "DNS server listening");

        let mut recv_buf = [0u8; RECV_BUF_SIZE];
        loop {
            let (n, peer) = match self.socket.recv_from(&mut recv_buf).await {
                Ok(received) => received,
                Err(e) => {
                    error!(error = %e, "Receive error");
                    continue;
                }
            };

            let raw = recv_buf[..n].to_vec();
            let socket = self.socket.clone();
            let use_case = self.use_case.clone();

            tokio::spawn(async move {
                debug!(client = %peer, bytes = n, "Query received");
                if let Some(reply) = use_case.execute(&raw).await {
                    if let Err(e) = socket.send_to(&reply, peer).await {
                        error!(client = %peer, error = %e, "Failed to send reply");
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_dns_domain::wire::DnsHeader;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn a_query(id: u16) -> Vec<u8> {
        let mut buf = Vec::new();
        DnsHeader {
            id,
            flags: 0x0100,
            qd_count: 1,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
        .write(&mut buf);
        buf.extend_from_slice(b"\x07example\x03com\x00\x00\x01\x00\x01");
        buf
    }

    #[tokio::test]
    async fn answers_a_query_end_to_end() {
        let use_case = Arc::new(HandleQueryUseCase::local_answer(
            Ipv4Addr::new(1, 2, 3, 4),
            None,
        ));

        let server = DnsServer::bind("127.0.0.1:0".parse().unwrap(), use_case)
            .await
            .unwrap();
        let server_addr = server.local_addr().unwrap();
        tokio::spawn(server.serve());

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(&a_query(0x4242), server_addr).await.unwrap();

        let mut buf = [0u8; 512];
        let (n, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();

        let reply = &buf[..n];
        assert_eq!(&reply[0..2], &[0x42, 0x42]);
        assert_eq!(&reply[n - 4..], &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn malformed_datagram_gets_no_reply_but_server_keeps_going() {
        let use_case = Arc::new(HandleQueryUseCase::local_answer(
            Ipv4Addr::new(9, 9, 9, 9),
            None,
        ));

        let server = DnsServer::bind("127.0.0.1:0".parse().unwrap(), use_case)
            .await
            .unwrap();
        let server_addr = server.local_addr().unwrap();
        tokio::spawn(server.serve());

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(&[0x12, 0x34, 0x00], server_addr).await.unwrap();

        // The short datagram is dropped silently.
        let mut buf = [0u8; 512];
        let timed_out =
            tokio::time::timeout(Duration::from_millis(100), client.recv_from(&mut buf))
                .await
                .is_err();
        assert!(timed_out);

        // A well-formed query right after still gets answered.
        client.send_to(&a_query(7), server_addr).await.unwrap();
        let (n, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[n - 4..n], &[9, 9, 9, 9]);
    }
}
