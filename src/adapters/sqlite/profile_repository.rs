//! SQLite implementation of the ProfileRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::DomainResult;
use crate::domain::models::UserProgressionProfile;
use crate::domain::ports::ProfileRepository;

use super::parse_json;

#[derive(Clone)]
pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn get(&self, user_id: &str) -> DomainResult<Option<UserProgressionProfile>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT profile FROM progression_profiles WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(profile,)| parse_json(&profile)).transpose()
    }

    async fn save(&self, profile: &UserProgressionProfile) -> DomainResult<()> {
        let json = serde_json::to_string(profile)?;

        sqlx::query(
            r#"INSERT INTO progression_profiles (user_id, profile, created_at, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   profile = excluded.profile,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&profile.user_id)
        .bind(&json)
        .bind(profile.created_at.to_rfc3339())
        .bind(profile.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::InteractionAction;
    use chrono::Utc;

    #[tokio::test]
    async fn test_save_and_update_profile() {
        let repo = SqliteProfileRepository::new(create_migrated_test_pool().await.unwrap());
        let mut profile = UserProgressionProfile::new("u1", Utc::now());
        repo.save(&profile).await.unwrap();

        profile.performance_metrics.record(InteractionAction::Accepted);
        repo.save(&profile).await.unwrap();

        let loaded = repo.get("u1").await.unwrap().unwrap();
        assert_eq!(loaded.performance_metrics.suggestions_accepted, 1);
        assert!(repo.get("u2").await.unwrap().is_none());
    }
}
