//! Text generation port for the external analysis provider.

use async_trait::async_trait;

use crate::domain::errors::ProviderError;

/// A single prompt-in, text-out call. No streaming.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}
