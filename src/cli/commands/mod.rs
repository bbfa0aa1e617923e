//! CLI command implementations.

pub mod cache;
pub mod init;
pub mod plan;
pub mod plateau;
pub mod progress;
pub mod suggestion;
pub mod workout;
