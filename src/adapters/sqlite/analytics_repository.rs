//! SQLite implementation of the AnalyticsRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::DomainResult;
use crate::domain::models::ExerciseAnalytics;
use crate::domain::ports::AnalyticsRepository;

use super::parse_json;

#[derive(Clone)]
pub struct SqliteAnalyticsRepository {
    pool: SqlitePool,
}

impl SqliteAnalyticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for SqliteAnalyticsRepository {
    async fn get(&self, user_id: &str, exercise_id: &str) -> DomainResult<Option<ExerciseAnalytics>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT document FROM exercise_analytics WHERE id = ?")
            .bind(ExerciseAnalytics::document_id(user_id, exercise_id))
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(document,)| parse_json(&document)).transpose()
    }

    async fn upsert(&self, analytics: &ExerciseAnalytics) -> DomainResult<()> {
        let json = serde_json::to_string(analytics)?;

        sqlx::query(
            r#"INSERT INTO exercise_analytics (id, user_id, exercise_id, document, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   document = excluded.document,
                   updated_at = excluded.updated_at"#,
        )
        .bind(analytics.id())
        .bind(&analytics.user_id)
        .bind(&analytics.exercise_id)
        .bind(&json)
        .bind(analytics.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<ExerciseAnalytics>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT document FROM exercise_analytics WHERE user_id = ? ORDER BY exercise_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|(document,)| parse_json(document)).collect()
    }
}
