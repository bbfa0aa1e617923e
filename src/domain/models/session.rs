//! Workout log and exercise session models.
//!
//! A workout log is the persisted unit: one training session holding every
//! exercise the user performed. Analysis works on the flattened
//! [`ExerciseSession`] view, one per exercise per workout.
//!
//! Exercise identity is the exercise name. Two spellings of the same movement
//! form two separate series.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single logged set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight: f64,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub reps: u32,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub completed: bool,
}

impl SetRecord {
    pub fn new(weight: f64, reps: u32) -> Self {
        Self {
            weight,
            reps,
            completed: true,
        }
    }

    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

/// One exercise as performed inside a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    #[serde(alias = "exerciseName", alias = "name")]
    pub exercise_name: String,
    #[serde(default, deserialize_with = "lenient_sets")]
    pub sets: Vec<SetRecord>,
}

/// A logged workout: the unit stored per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutLog {
    pub id: String,
    #[serde(alias = "userId")]
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_completed")]
    pub completed: bool,
    #[serde(default)]
    pub exercises: Vec<ExerciseEntry>,
}

const fn default_completed() -> bool {
    true
}

impl WorkoutLog {
    pub fn new(user_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            timestamp,
            completed: true,
            exercises: Vec::new(),
        }
    }

    pub fn with_exercise(mut self, name: impl Into<String>, sets: Vec<SetRecord>) -> Self {
        self.exercises.push(ExerciseEntry {
            exercise_name: name.into(),
            sets,
        });
        self
    }

    /// Flatten into one session per exercise entry.
    pub fn sessions(&self) -> Vec<ExerciseSession> {
        self.exercises
            .iter()
            .map(|entry| ExerciseSession {
                exercise_name: entry.exercise_name.clone(),
                timestamp: self.timestamp,
                sets: entry.sets.clone(),
            })
            .collect()
    }
}

/// One logged performance of one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSession {
    #[serde(alias = "exerciseName")]
    pub exercise_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_sets")]
    pub sets: Vec<SetRecord>,
}

impl ExerciseSession {
    pub fn new(exercise_name: impl Into<String>, timestamp: DateTime<Utc>, sets: Vec<SetRecord>) -> Self {
        Self {
            exercise_name: exercise_name.into(),
            timestamp,
            sets,
        }
    }

    /// Heaviest weight across all sets, 0 when there are none.
    pub fn max_weight(&self) -> f64 {
        self.sets.iter().map(|s| s.weight).fold(0.0, f64::max)
    }

    pub fn max_reps(&self) -> u32 {
        self.sets.iter().map(|s| s.reps).max().unwrap_or(0)
    }

    /// Sum of weight × reps across all sets.
    pub fn total_volume(&self) -> f64 {
        self.sets.iter().map(SetRecord::volume).sum()
    }
}

/// Group sessions by exercise name, keeping the order in which each name is
/// first seen and each group's session order.
pub fn group_sessions_by_exercise(workouts: &[WorkoutLog]) -> Vec<(String, Vec<ExerciseSession>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<ExerciseSession>)> = Vec::new();

    for session in workouts.iter().flat_map(WorkoutLog::sessions) {
        match index.get(&session.exercise_name) {
            Some(&i) => groups[i].1.push(session),
            None => {
                index.insert(session.exercise_name.clone(), groups.len());
                groups.push((session.exercise_name.clone(), vec![session]));
            }
        }
    }

    groups
}

/// Sessions of a single exercise across the given workouts.
pub fn sessions_for_exercise(workouts: &[WorkoutLog], exercise_name: &str) -> Vec<ExerciseSession> {
    workouts
        .iter()
        .flat_map(WorkoutLog::sessions)
        .filter(|s| s.exercise_name == exercise_name)
        .collect()
}

// ============================================================================
// Lenient deserialization
// ============================================================================

fn number_from_value(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or(0.0, number_from_value).max(0.0))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let n = value.as_ref().map_or(0.0, number_from_value);
    Ok(n.round().clamp(0.0, f64::from(u32::MAX)) as u32)
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(Value::Bool(true))))
}

fn lenient_sets<'de, D>(deserializer: D) -> Result<Vec<SetRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value::<SetRecord>(item).unwrap_or_default())
        .collect())
}
