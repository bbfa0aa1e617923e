//! Progression analysis and suggestion models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of recent performance for one exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionTrend {
    Improving,
    #[default]
    Maintaining,
    Declining,
}

impl ProgressionTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Maintaining => "maintaining",
            Self::Declining => "declining",
        }
    }
}

/// Derived statistics over one exercise's session history.
///
/// Recomputed on demand; never the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionAnalysis {
    pub exercise_id: String,
    pub current_weight: f64,
    pub current_reps: u32,
    pub current_sets: u32,
    pub progression_trend: ProgressionTrend,
    /// Kilograms gained per week between the oldest and newest session.
    pub progression_rate: f64,
    pub confidence_level: f64,
    pub last_progress_date: Option<DateTime<Utc>>,
    pub total_sessions: usize,
}

impl ProgressionAnalysis {
    /// Zero-valued analysis for an exercise with no history.
    pub fn empty(exercise_id: impl Into<String>) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            current_weight: 0.0,
            current_reps: 0,
            current_sets: 0,
            progression_trend: ProgressionTrend::Maintaining,
            progression_rate: 0.0,
            confidence_level: 0.0,
            last_progress_date: None,
            total_sessions: 0,
        }
    }

    pub fn has_history(&self) -> bool {
        self.total_sessions > 0
    }
}

/// What a suggestion changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionType {
    Weight,
    Reps,
    Deload,
}

impl ProgressionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Reps => "reps",
            Self::Deload => "deload",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "weight" => Some(Self::Weight),
            "reps" | "rep" => Some(Self::Reps),
            "deload" => Some(Self::Deload),
            _ => None,
        }
    }
}

/// Priority used to order alternatives and interventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "normal" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// An alternative to the primary suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeOption {
    pub weight: f64,
    pub reps: u32,
    pub reasoning: String,
    pub priority: Priority,
    pub estimated_effectiveness: f64,
}

/// Sort by priority then effectiveness, both descending.
pub fn sort_alternatives(options: &mut [AlternativeOption]) {
    options.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.estimated_effectiveness.total_cmp(&a.estimated_effectiveness))
    });
}

/// A concrete next-session prescription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionSuggestion {
    pub exercise_id: String,
    pub current_weight: f64,
    pub suggested_weight: f64,
    pub suggested_reps: u32,
    pub suggested_sets: u32,
    pub progression_type: ProgressionType,
    pub reasoning: String,
    pub confidence_level: f64,
    pub alternative_options: Vec<AlternativeOption>,
}
