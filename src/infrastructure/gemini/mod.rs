//! Gemini `generateContent` adapter.

pub mod client;
pub mod types;

pub use client::{is_placeholder_key, scrub_key, GeminiClient, GeminiClientConfig};
pub use types::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};
