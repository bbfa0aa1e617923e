//! User progression profile.
//!
//! Profiles are created lazily with defaults and every nested section fills
//! missing fields on read, so partially written documents stay usable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::interaction::InteractionAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionStyle {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl ProgressionStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalMetrics {
    pub bodyweight_kg: Option<f64>,
    pub age: Option<u32>,
    pub experience_level: ExperienceLevel,
    /// Sessions per week.
    pub training_frequency: u32,
}

impl Default for PersonalMetrics {
    fn default() -> Self {
        Self {
            bodyweight_kg: None,
            age: None,
            experience_level: ExperienceLevel::default(),
            training_frequency: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionPreferences {
    pub style: ProgressionStyle,
    /// Sessions of stagnation tolerated before alerting.
    pub plateau_tolerance: u32,
    pub preferred_rep_min: u32,
    pub preferred_rep_max: u32,
}

impl Default for ProgressionPreferences {
    fn default() -> Self {
        Self {
            style: ProgressionStyle::default(),
            plateau_tolerance: 3,
            preferred_rep_min: 6,
            preferred_rep_max: 12,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMetrics {
    /// Mean kg/week across analyzed exercises.
    pub average_progression_rate: f64,
    /// Plateaus detected per analyzed exercise, last detection run.
    pub plateau_frequency: f64,
    pub suggestions_shown: u64,
    pub suggestions_accepted: u64,
    pub suggestions_dismissed: u64,
    pub suggestions_modified: u64,
    pub acceptance_rate: f64,
    pub dismissal_rate: f64,
}

impl PerformanceMetrics {
    /// Count a response and recompute the rolling rates.
    #[allow(clippy::cast_precision_loss)]
    pub fn record(&mut self, action: InteractionAction) {
        match action {
            InteractionAction::Accepted => self.suggestions_accepted += 1,
            InteractionAction::Dismissed => self.suggestions_dismissed += 1,
            InteractionAction::Modified => self.suggestions_modified += 1,
            InteractionAction::Viewed => return,
        }
        self.suggestions_shown += 1;
        let total = self.suggestions_shown as f64;
        self.acceptance_rate = self.suggestions_accepted as f64 / total;
        self.dismissal_rate = self.suggestions_dismissed as f64 / total;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiModelData {
    pub last_provider_call: Option<DateTime<Utc>>,
    pub provider_suggestions_served: u64,
    pub fallback_suggestions_served: u64,
}

/// Everything the engine and provider know about one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgressionProfile {
    pub user_id: String,
    #[serde(default)]
    pub personal_metrics: PersonalMetrics,
    #[serde(default)]
    pub progression_preferences: ProgressionPreferences,
    #[serde(default)]
    pub performance_metrics: PerformanceMetrics,
    #[serde(default)]
    pub ai_model_data: AiModelData,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl UserProgressionProfile {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            personal_metrics: PersonalMetrics::default(),
            progression_preferences: ProgressionPreferences::default(),
            performance_metrics: PerformanceMetrics::default(),
            ai_model_data: AiModelData::default(),
            created_at: now,
            updated_at: now,
        }
    }
}
