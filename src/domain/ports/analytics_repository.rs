//! Per-exercise analytics repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::ExerciseAnalytics;

/// Analytics documents keyed by user and exercise.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn get(&self, user_id: &str, exercise_id: &str) -> DomainResult<Option<ExerciseAnalytics>>;

    /// Insert or replace the document.
    async fn upsert(&self, analytics: &ExerciseAnalytics) -> DomainResult<()>;

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<ExerciseAnalytics>>;
}
