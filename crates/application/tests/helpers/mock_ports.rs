#![allow(dead_code)]

use async_trait::async_trait;
use relay_dns_application::ports::{ExternalResolver, UpstreamForwarder};
use relay_dns_domain::DomainError;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Upstream forwarder that records every raw query it receives and
/// returns a canned reply.
pub struct MockForwarder {
    reply: Vec<u8>,
    should_fail: bool,
    call_count: Arc<AtomicU64>,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockForwarder {
    pub fn new(reply: Vec<u8>) -> Self {
        Self {
            reply,
            should_fail: false,
            call_count: Arc::new(AtomicU64::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Vec::new(),
            should_fail: true,
            call_count: Arc::new(AtomicU64::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamForwarder for MockForwarder {
    async fn forward(&self, raw_query: &[u8]) -> Result<Vec<u8>, DomainError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.received.lock().unwrap().push(raw_query.to_vec());
        if self.should_fail {
            return Err(DomainError::QueryTimeout);
        }
        Ok(self.reply.clone())
    }
}

/// External resolver with a fixed outcome.
pub struct MockResolver {
    result: Result<Option<Ipv4Addr>, DomainError>,
    call_count: Arc<AtomicU64>,
}

impl MockResolver {
    pub fn returning(ip: Ipv4Addr) -> Self {
        Self {
            result: Ok(Some(ip)),
            call_count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self {
            result: Ok(None),
            call_count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(DomainError::LookupFailed("connection refused".to_string())),
            call_count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ExternalResolver for MockResolver {
    async fn resolve(&self, _domain: &str) -> Result<Option<Ipv4Addr>, DomainError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.result.clone()
    }
}
