use async_trait::async_trait;
use fancy_regex::Regex;
use relay_dns_application::ports::ExternalResolver;
use relay_dns_domain::DomainError;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::debug;

const IPV4_PATTERN: &str = r"\b(?:\d{1,3}\.){3}\d{1,3}\b";

/// Web-based IP lookup: POSTs the domain to a third-party endpoint and
/// scans the HTML body for the first dotted-quad that is not the loopback
/// sentinel.
///
/// The HTTP client and the compiled pattern are owned per instance and
/// injected into the dispatcher, so the fallback path stays testable with
/// a fake resolver.
pub struct HttpIpLookup {
    client: reqwest::Client,
    url: String,
    pattern: Regex,
}

impl HttpIpLookup {
    pub fn new(url: String, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .user_agent("relay-dns/0.2 (ip-lookup)")
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::LookupFailed(e.to_string()))?;

        let pattern = Regex::new(IPV4_PATTERN)
            .map_err(|e| DomainError::LookupFailed(format!("bad pattern: {}", e)))?;

        Ok(Self {
            client,
            url,
            pattern,
        })
    }

    /// Returns the first parseable non-loopback IPv4 address in `body`.
    fn extract_address(&self, body: &str) -> Option<Ipv4Addr> {
        let mut pos = 0;
        while let Ok(Some(m)) = self.pattern.find_from_pos(body, pos) {
            pos = m.end();
            // Components over 255 match the pattern but fail the parse.
            if let Ok(ip) = m.as_str().parse::<Ipv4Addr>() {
                if !ip.is_loopback() {
                    return Some(ip);
                }
            }
        }
        None
    }
}

#[async_trait]
impl ExternalResolver for HttpIpLookup {
    async fn resolve(&self, domain: &str) -> Result<Option<Ipv4Addr>, DomainError> {
        let response = self
            .client
            .post(&self.url)
            .form(&[("domain", domain)])
            .send()
            .await
            .map_err(|e| DomainError::LookupFailed(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| DomainError::LookupFailed(e.to_string()))?;

        let found = self.extract_address(&body);
        debug!(domain, address = ?found, "Web lookup completed");
        Ok(found)
    }
}
