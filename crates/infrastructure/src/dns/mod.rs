pub mod forwarder;
pub mod lookup;
pub mod server;

pub use forwarder::UdpForwarder;
pub use lookup::HttpIpLookup;
pub use server::DnsServer;
