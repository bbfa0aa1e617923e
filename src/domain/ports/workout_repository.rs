//! Workout log repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::WorkoutLog;

/// Repository interface for logged workouts.
#[async_trait]
pub trait WorkoutRepository: Send + Sync {
    /// Store a workout log.
    async fn save(&self, workout: &WorkoutLog) -> DomainResult<()>;

    /// Get a workout log by ID.
    async fn get(&self, id: &str) -> DomainResult<Option<WorkoutLog>>;

    /// A user's most recent workouts, newest first.
    async fn recent(&self, user_id: &str, limit: u32) -> DomainResult<Vec<WorkoutLog>>;

    /// Delete a workout log by ID.
    async fn delete(&self, id: &str) -> DomainResult<()>;
}
