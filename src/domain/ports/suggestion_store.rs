//! Per-user suggestions document port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::AiSuggestionsDocument;

/// Storage for the per-user interactions log, plateau alerts, and
/// notification settings.
#[async_trait]
pub trait SuggestionStore: Send + Sync {
    /// Load the user's document, `None` when never written.
    async fn load(&self, user_id: &str) -> DomainResult<Option<AiSuggestionsDocument>>;

    /// Replace the user's document.
    async fn save(&self, user_id: &str, document: &AiSuggestionsDocument) -> DomainResult<()>;
}
