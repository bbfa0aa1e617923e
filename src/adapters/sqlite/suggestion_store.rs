//! SQLite implementation of the SuggestionStore.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::DomainResult;
use crate::domain::models::AiSuggestionsDocument;
use crate::domain::ports::SuggestionStore;

use super::parse_json;

/// One JSON document per user in `ai_suggestions`.
#[derive(Clone)]
pub struct SqliteSuggestionStore {
    pool: SqlitePool,
}

impl SqliteSuggestionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SuggestionStore for SqliteSuggestionStore {
    async fn load(&self, user_id: &str) -> DomainResult<Option<AiSuggestionsDocument>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT document FROM ai_suggestions WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(document,)| parse_json(&document)).transpose()
    }

    async fn save(&self, user_id: &str, document: &AiSuggestionsDocument) -> DomainResult<()> {
        let json = serde_json::to_string(document)?;
        let updated_at = document.updated_at.unwrap_or_else(chrono::Utc::now);

        sqlx::query(
            r#"INSERT INTO ai_suggestions (user_id, document, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   document = excluded.document,
                   updated_at = excluded.updated_at"#,
        )
        .bind(user_id)
        .bind(&json)
        .bind(updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
