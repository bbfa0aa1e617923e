//! Adapters implementing the domain ports.

pub mod cache;
pub mod generators;
pub mod sqlite;
