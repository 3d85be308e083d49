//! Relay DNS Infrastructure Layer
pub mod dns;
