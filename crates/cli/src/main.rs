use clap::Parser;
use relay_dns_application::ports::UpstreamForwarder;
use relay_dns_application::HandleQueryUseCase;
use relay_dns_domain::{wire, CliOverrides, Strategy};
use relay_dns_infrastructure::dns::{DnsServer, HttpIpLookup, UdpForwarder};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod bootstrap;

#[derive(Parser)]
#[command(name = "relay-dns")]
#[command(version)]
#[command(about = "Minimal DNS responder/proxy")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// DNS listen port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Resolution strategy (local_answer, lookup_with_fallback)
    #[arg(short = 's', long)]
    strategy: Option<String>,

    /// Fixed answer address for local_answer mode
    #[arg(long)]
    answer_ip: Option<String>,

    /// Upstream DNS server (host:port)
    #[arg(short = 'u', long)]
    upstream: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let strategy = match cli.strategy.as_deref() {
        Some(s) => Some(
            Strategy::from_str(s)
                .ok_or_else(|| anyhow::anyhow!("unknown strategy: {}", s))?,
        ),
        None => None,
    };

    let cli_overrides = CliOverrides {
        bind_address: cli.bind.clone(),
        dns_port: cli.port,
        strategy,
        answer_address: cli.answer_ip.clone(),
        upstream_server: cli.upstream.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config);

    info!("Starting relay-dns v{}", env!("CARGO_PKG_VERSION"));

    let forwarder: Option<Arc<dyn UpstreamForwarder>> = match &config.dns.upstream_server {
        Some(upstream) => {
            let addr: SocketAddr = upstream.parse()?;
            let timeout = Duration::from_secs(config.dns.query_timeout);
            Some(Arc::new(UdpForwarder::new(addr, timeout)))
        }
        None => None,
    };

    let use_case = match config.dns.strategy {
        Strategy::LocalAnswer => {
            let address = wire::parse_ipv4(&config.dns.answer_address)?;
            info!(strategy = "local_answer", answer = %address, "Resolution strategy configured");
            HandleQueryUseCase::local_answer(address, forwarder)
        }
        Strategy::LookupWithFallback => {
            // validate() guarantees both the URL and the upstream exist.
            let url = config
                .dns
                .lookup_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("lookup URL missing"))?;
            let forwarder =
                forwarder.ok_or_else(|| anyhow::anyhow!("upstream server missing"))?;
            let lookup = Arc::new(HttpIpLookup::new(
                url,
                Duration::from_secs(config.dns.lookup_timeout),
            )?);
            info!(strategy = "lookup_with_fallback", "Resolution strategy configured");
            HandleQueryUseCase::lookup_with_fallback(lookup, forwarder)
        }
    };

    let bind_addr: SocketAddr =
        format!("{}:{}", config.server.bind_address, config.server.dns_port).parse()?;

    let server = DnsServer::bind(bind_addr, Arc::new(use_case)).await?;
    server.serve().await?;

    Ok(())
}
