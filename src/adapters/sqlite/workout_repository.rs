//! SQLite implementation of the WorkoutRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ExerciseEntry, WorkoutLog};
use crate::domain::ports::WorkoutRepository;

use super::{parse_datetime, parse_json};

#[derive(Clone)]
pub struct SqliteWorkoutRepository {
    pool: SqlitePool,
}

impl SqliteWorkoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkoutRepository for SqliteWorkoutRepository {
    async fn save(&self, workout: &WorkoutLog) -> DomainResult<()> {
        let exercises_json = serde_json::to_string(&workout.exercises)?;

        sqlx::query(
            r#"INSERT INTO workouts (id, user_id, timestamp, completed, exercises)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   user_id = excluded.user_id,
                   timestamp = excluded.timestamp,
                   completed = excluded.completed,
                   exercises = excluded.exercises"#,
        )
        .bind(&workout.id)
        .bind(&workout.user_id)
        .bind(workout.timestamp.to_rfc3339())
        .bind(workout.completed)
        .bind(&exercises_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<WorkoutLog>> {
        let row: Option<WorkoutRow> = sqlx::query_as(
            "SELECT id, user_id, timestamp, completed, exercises FROM workouts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn recent(&self, user_id: &str, limit: u32) -> DomainResult<Vec<WorkoutLog>> {
        let rows: Vec<WorkoutRow> = sqlx::query_as(
            "SELECT id, user_id, timestamp, completed, exercises FROM workouts WHERE user_id = ? ORDER BY timestamp DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM workouts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::WorkoutNotFound(id.to_string()));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct WorkoutRow {
    id: String,
    user_id: String,
    timestamp: String,
    completed: bool,
    exercises: String,
}

impl TryFrom<WorkoutRow> for WorkoutLog {
    type Error = DomainError;

    fn try_from(row: WorkoutRow) -> Result<Self, Self::Error> {
        let exercises: Vec<ExerciseEntry> = parse_json(&row.exercises)?;

        Ok(WorkoutLog {
            id: row.id,
            user_id: row.user_id,
            timestamp: parse_datetime(&row.timestamp)?,
            completed: row.completed,
            exercises,
        })
    }
}
