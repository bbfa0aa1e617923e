//! Whole-workout suggestions.

use serde::{Deserialize, Serialize};

/// Default cap on exercises in a suggested workout.
pub const DEFAULT_MAX_EXERCISES: usize = 5;

/// Constraints for the next workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutContext {
    #[serde(default = "default_max_exercises")]
    pub max_exercises: usize,
    /// Time available, in minutes.
    #[serde(default)]
    pub available_minutes: Option<u32>,
    /// Free-text focus such as "upper body".
    #[serde(default)]
    pub focus: Option<String>,
}

const fn default_max_exercises() -> usize {
    DEFAULT_MAX_EXERCISES
}

impl Default for WorkoutContext {
    fn default() -> Self {
        Self {
            max_exercises: DEFAULT_MAX_EXERCISES,
            available_minutes: None,
            focus: None,
        }
    }
}

/// Where a workout suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutSuggestionSource {
    Provider,
    RuleBased,
}

/// One exercise in a suggested workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSuggestion {
    pub exercise_name: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    pub rest_seconds: u32,
    pub notes: String,
    pub source: WorkoutSuggestionSource,
}
