use crate::ports::{ExternalResolver, UpstreamForwarder};
use relay_dns_domain::wire::{self, DecodedQuery};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Terminal routing state for one query. Every datagram ends in exactly
/// one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Fully encoded answer datagram, ready to send to the client.
    Answer(Vec<u8>),
    /// Relay the original raw bytes to the upstream server.
    Forward,
    /// Malformed or unanswerable query. No response is sent; the client's
    /// own retry/timeout policy governs recovery.
    Drop,
}

enum Mode {
    /// Answer every resolvable query with one fixed address.
    LocalAnswer { address: Ipv4Addr },
    /// Ask the external resolver first, proxy upstream when it produces
    /// nothing usable.
    LookupWithFallback { resolver: Arc<dyn ExternalResolver> },
}

/// Per-query resolution dispatcher.
///
/// Decodes the datagram, picks a strategy outcome, and (in [`Self::execute`])
/// performs the upstream forward when one is called for. Holds no per-query
/// state; a single instance serves all in-flight queries.
pub struct HandleQueryUseCase {
    mode: Mode,
    forwarder: Option<Arc<dyn UpstreamForwarder>>,
}

impl HandleQueryUseCase {
    pub fn local_answer(
        address: Ipv4Addr,
        forwarder: Option<Arc<dyn UpstreamForwarder>>,
    ) -> Self {
        Self {
            mode: Mode::LocalAnswer { address },
            forwarder,
        }
    }

    pub fn lookup_with_fallback(
        resolver: Arc<dyn ExternalResolver>,
        forwarder: Arc<dyn UpstreamForwarder>,
    ) -> Self {
        Self {
            mode: Mode::LookupWithFallback { resolver },
            forwarder: Some(forwarder),
        }
    }

    /// Routes one raw query datagram to its terminal state without
    /// performing the forward itself.
    pub async fn dispatch(&self, raw: &[u8]) -> Resolution {
        let decoded = match wire::decode_query(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(error = %e, len = raw.len(), "Dropping malformed query");
                return Resolution::Drop;
            }
        };

        let question = match decoded {
            DecodedQuery::Question(q) => q,
            DecodedQuery::MultiQuestion { id } => {
                debug!(id, "Multi-question query, proxying upstream");
                return Resolution::Forward;
            }
            DecodedQuery::UnsupportedType { id, qtype, qclass } => {
                debug!(id, qtype, qclass, "Unsupported question, proxying upstream");
                return Resolution::Forward;
            }
        };

        let address = match &self.mode {
            Mode::LocalAnswer { address } => *address,
            Mode::LookupWithFallback { resolver } => {
                match resolver.resolve(&question.domain).await {
                    Ok(Some(ip)) if !ip.is_loopback() => ip,
                    Ok(Some(_)) => {
                        debug!(domain = %question.domain, "Lookup returned loopback sentinel, proxying");
                        return Resolution::Forward;
                    }
                    Ok(None) => {
                        debug!(domain = %question.domain, "Lookup found no address, proxying");
                        return Resolution::Forward;
                    }
                    Err(e) => {
                        debug!(domain = %question.domain, error = %e, "Lookup failed, proxying");
                        return Resolution::Forward;
                    }
                }
            }
        };

        match wire::build_answer(question.id, &question.domain, address) {
            Ok(bytes) => Resolution::Answer(bytes),
            Err(e) => {
                warn!(domain = %question.domain, error = %e, "Failed to encode answer, dropping");
                Resolution::Drop
            }
        }
    }

    /// Handles one raw query datagram end to end. Returns the datagram to
    /// send back, or `None` when the query is dropped (including forward
    /// failures: the client retries on its own).
    pub async fn execute(&self, raw: &[u8]) -> Option<Vec<u8>> {
        match self.dispatch(raw).await {
            Resolution::Answer(bytes) => Some(bytes),
            Resolution::Drop => None,
            Resolution::Forward => {
                let forwarder = match &self.forwarder {
                    Some(f) => f,
                    None => {
                        debug!("No upstream configured, dropping unanswerable query");
                        return None;
                    }
                };
                match forwarder.forward(raw).await {
                    Ok(reply) => Some(reply),
                    Err(e) => {
                        warn!(error = %e, "Upstream forward failed, dropping query");
                        None
                    }
                }
            }
        }
    }
}
