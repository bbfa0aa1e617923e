//! Per-exercise analytics documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::escape_key_segment;

use super::interaction::InteractionAction;
use super::progression::{ProgressionAnalysis, ProgressionSuggestion};

/// Rolling record of analysis and suggestion outcomes for one user's exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseAnalytics {
    pub user_id: String,
    pub exercise_id: String,
    #[serde(default)]
    pub last_analysis: Option<ProgressionAnalysis>,
    #[serde(default)]
    pub last_suggestion: Option<ProgressionSuggestion>,
    #[serde(default)]
    pub suggestions_generated: u64,
    #[serde(default)]
    pub accepted: u64,
    #[serde(default)]
    pub dismissed: u64,
    #[serde(default)]
    pub modified: u64,
    pub updated_at: DateTime<Utc>,
}

impl ExerciseAnalytics {
    pub fn new(user_id: impl Into<String>, exercise_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            exercise_id: exercise_id.into(),
            last_analysis: None,
            last_suggestion: None,
            suggestions_generated: 0,
            accepted: 0,
            dismissed: 0,
            modified: 0,
            updated_at: now,
        }
    }

    /// Document key: `{user}_{exercise}` with both segments escaped.
    pub fn document_id(user_id: &str, exercise_id: &str) -> String {
        format!("{}_{}", escape_key_segment(user_id), escape_key_segment(exercise_id))
    }

    pub fn id(&self) -> String {
        Self::document_id(&self.user_id, &self.exercise_id)
    }

    pub fn record_suggestion(
        &mut self,
        analysis: &ProgressionAnalysis,
        suggestion: &ProgressionSuggestion,
        now: DateTime<Utc>,
    ) {
        self.last_analysis = Some(analysis.clone());
        self.last_suggestion = Some(suggestion.clone());
        self.suggestions_generated += 1;
        self.updated_at = now;
    }

    pub fn record_interaction(&mut self, action: InteractionAction, now: DateTime<Utc>) {
        match action {
            InteractionAction::Accepted => self.accepted += 1,
            InteractionAction::Dismissed => self.dismissed += 1,
            InteractionAction::Modified => self.modified += 1,
            InteractionAction::Viewed => {}
        }
        self.updated_at = now;
    }
}
