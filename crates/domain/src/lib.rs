//! Relay DNS Domain Layer
pub mod config;
pub mod errors;
pub mod wire;

pub use config::{CliOverrides, Config, ConfigError, Strategy};
pub use errors::DomainError;
pub use wire::{DecodedQuery, DnsHeader, QuestionRecord, WireError};
