//! Infrastructure: the Gemini HTTP client, configuration loading, and
//! logging setup.

pub mod config;
pub mod gemini;
pub mod logging;
