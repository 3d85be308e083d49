//! Relay DNS Application Layer
pub mod ports;
pub mod use_cases;

pub use use_cases::handle_query::{HandleQueryUseCase, Resolution};
