use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid upstream server address: {0}")]
    InvalidServerAddress(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("External lookup failed: {0}")]
    LookupFailed(String),

    #[error("External lookup returned no usable address")]
    NoUsableResult,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
