use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_dns_port")]
    pub dns_port: u16,
}

/// Resolution strategy, fixed at startup. Never switched per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Answer every resolvable A/IN query with the configured address.
    LocalAnswer,
    /// Try the external web lookup first, fall back to proxying.
    LookupWithFallback,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::LocalAnswer => "local_answer",
            Strategy::LookupWithFallback => "lookup_with_fallback",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "local_answer" => Some(Strategy::LocalAnswer),
            "lookup_with_fallback" => Some(Strategy::LookupWithFallback),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    #[serde(default = "default_strategy")]
    pub strategy: Strategy,
    /// Address returned for every resolvable query in `local_answer` mode.
    #[serde(default = "default_answer_address")]
    pub answer_address: String,
    pub upstream_server: Option<String>,
    /// Per-forward deadline in seconds. Bounds socket lifetime under flood.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,
    pub lookup_url: Option<String>,
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_bind_address() -> String { "127.0.0.1".to_string() }
fn default_dns_port() -> u16 { 53 }
fn default_strategy() -> Strategy { Strategy::LocalAnswer }
fn default_answer_address() -> String { "1.2.3.4".to_string() }
fn default_query_timeout() -> u64 { 3 }
fn default_lookup_timeout() -> u64 { 5 }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            dns_port: default_dns_port(),
        }
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            answer_address: default_answer_address(),
            upstream_server: None,
            query_timeout: default_query_timeout(),
            lookup_url: None,
            lookup_timeout: default_lookup_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            dns: DnsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("relay-dns.toml").exists() {
            Self::from_file("relay-dns.toml")?
        } else if std::path::Path::new("/etc/relay-dns/config.toml").exists() {
            Self::from_file("/etc/relay-dns/config.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(strategy) = overrides.strategy {
            self.dns.strategy = strategy;
        }
        if let Some(answer) = overrides.answer_address {
            self.dns.answer_address = answer;
        }
        if let Some(upstream) = overrides.upstream_server {
            self.dns.upstream_server = Some(upstream);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }
        crate::wire::parse_ipv4(&self.dns.answer_address).map_err(|e| {
            ConfigError::Validation(format!("answer_address: {}", e))
        })?;
        if self.dns.strategy == Strategy::LookupWithFallback {
            if self.dns.upstream_server.is_none() {
                return Err(ConfigError::Validation(
                    "lookup_with_fallback requires an upstream server".to_string(),
                ));
            }
            if self.dns.lookup_url.is_none() {
                return Err(ConfigError::Validation(
                    "lookup_with_fallback requires a lookup URL".to_string(),
                ));
            }
        }
        if let Some(upstream) = &self.dns.upstream_server {
            upstream.parse::<std::net::SocketAddr>().map_err(|_| {
                ConfigError::Validation(format!("invalid upstream server address: {}", upstream))
            })?;
        }
        if self.dns.query_timeout == 0 {
            return Err(ConfigError::Validation(
                "query_timeout cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub dns_port: Option<u16>,
    pub strategy: Option<Strategy>,
    pub answer_address: Option<String>,
    pub upstream_server: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    FileRead(String, String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Configuration validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.dns_port, 53);
        assert_eq!(config.dns.strategy, Strategy::LocalAnswer);
        assert_eq!(config.dns.query_timeout, 3);
        config.validate().unwrap();
    }

    #[test]
    fn parses_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            bind_address = "0.0.0.0"
            dns_port = 5353

            [dns]
            strategy = "lookup_with_fallback"
            upstream_server = "8.8.8.8:53"
            lookup_url = "https://ip.example/query"
            query_timeout = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.server.dns_port, 5353);
        assert_eq!(config.dns.strategy, Strategy::LookupWithFallback);
        assert_eq!(config.dns.upstream_server.as_deref(), Some("8.8.8.8:53"));
        assert_eq!(config.dns.query_timeout, 2);
        assert_eq!(config.logging.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let mut config = Config::default();
        config.apply_cli_overrides(CliOverrides {
            bind_address: Some("0.0.0.0".to_string()),
            dns_port: Some(1053),
            strategy: Some(Strategy::LookupWithFallback),
            answer_address: None,
            upstream_server: Some("1.1.1.1:53".to_string()),
            log_level: Some("debug".to_string()),
        });

        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.dns_port, 1053);
        assert_eq!(config.dns.strategy, Strategy::LookupWithFallback);
        assert_eq!(config.dns.upstream_server.as_deref(), Some("1.1.1.1:53"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn lookup_mode_requires_upstream_and_url() {
        let mut config = Config::default();
        config.dns.strategy = Strategy::LookupWithFallback;
        assert!(config.validate().is_err());

        config.dns.upstream_server = Some("8.8.8.8:53".to_string());
        assert!(config.validate().is_err());

        config.dns.lookup_url = Some("https://ip.example/query".to_string());
        config.validate().unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = Config::default();
        config.dns.answer_address = "1.2.3.999".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dns.upstream_server = Some("not-an-addr".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.dns_port = 0;
        assert!(config.validate().is_err());
    }
}
