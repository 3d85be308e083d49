mod external_resolver;
mod upstream_forwarder;

pub use external_resolver::ExternalResolver;
pub use upstream_forwarder::UpstreamForwarder;
