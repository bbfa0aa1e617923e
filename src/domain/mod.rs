//! Domain layer for the progressive overload system
//!
//! This module contains the core training models and the ports that
//! adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult, ProviderError};
