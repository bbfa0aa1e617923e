//! Plateau detection and intervention models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::progression::Priority;

/// Minimum number of sessions a plateau spans.
pub const MIN_PLATEAU_DURATION: u32 = 3;

/// Which metric a plateau is classified by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateauType {
    Weight,
    Reps,
    Volume,
}

impl PlateauType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Reps => "reps",
            Self::Volume => "volume",
        }
    }
}

/// How entrenched a plateau is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateauSeverity {
    Mild = 1,
    Moderate = 2,
    Severe = 3,
}

impl PlateauSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mild" => Some(Self::Mild),
            "moderate" => Some(Self::Moderate),
            "severe" => Some(Self::Severe),
            _ => None,
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Mild, Self::Moderate, Self::Severe]
    }
}

/// Metrics that showed no meaningful change across the detection window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagnantMetrics {
    pub weight: bool,
    pub reps: bool,
    pub volume: bool,
}

impl StagnantMetrics {
    pub fn count(&self) -> u32 {
        u32::from(self.weight) + u32::from(self.reps) + u32::from(self.volume)
    }

    /// First stagnant metric in weight > volume > reps order.
    pub fn primary(&self) -> Option<PlateauType> {
        if self.weight {
            Some(PlateauType::Weight)
        } else if self.volume {
            Some(PlateauType::Volume)
        } else if self.reps {
            Some(PlateauType::Reps)
        } else {
            None
        }
    }
}

/// A detected plateau on one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateauDetection {
    pub exercise_id: String,
    /// Sessions without a weight increase; never below [`MIN_PLATEAU_DURATION`].
    pub plateau_duration: u32,
    pub last_progress_date: Option<DateTime<Utc>>,
    pub plateau_type: PlateauType,
    pub severity: PlateauSeverity,
    pub confidence_level: f64,
    pub stagnant_metrics: StagnantMetrics,
    pub current_weight: f64,
    pub current_reps: u32,
    pub current_sets: u32,
    #[serde(default)]
    pub suggested_interventions: Vec<InterventionSuggestion>,
}

/// Kinds of plateau intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionType {
    Deload,
    RepRangeModification,
    VolumeIncrease,
    ExerciseVariation,
    TechniqueFocus,
    RestOptimization,
    FrequencyChange,
    Periodization,
    ExerciseSubstitution,
}

impl InterventionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deload => "deload",
            Self::RepRangeModification => "rep_range_modification",
            Self::VolumeIncrease => "volume_increase",
            Self::ExerciseVariation => "exercise_variation",
            Self::TechniqueFocus => "technique_focus",
            Self::RestOptimization => "rest_optimization",
            Self::FrequencyChange => "frequency_change",
            Self::Periodization => "periodization",
            Self::ExerciseSubstitution => "exercise_substitution",
        }
    }

    /// Parse loosely, accepting the spellings a text model tends to produce.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "deload" => Some(Self::Deload),
            "rep_range_modification" | "rep_range" | "rep_range_change" => {
                Some(Self::RepRangeModification)
            }
            "volume_increase" | "volume" => Some(Self::VolumeIncrease),
            "exercise_variation" | "variation" => Some(Self::ExerciseVariation),
            "technique_focus" | "technique" => Some(Self::TechniqueFocus),
            "rest_optimization" | "rest" | "recovery" => Some(Self::RestOptimization),
            "frequency_change" | "frequency" => Some(Self::FrequencyChange),
            "periodization" => Some(Self::Periodization),
            "exercise_substitution" | "substitution" => Some(Self::ExerciseSubstitution),
            _ => None,
        }
    }
}

/// A variation with the weight expected to transfer to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationOption {
    pub name: String,
    pub weight_multiplier: f64,
    pub suggested_weight: f64,
}

/// Structured parameters for carrying out an intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterventionPlan {
    Deload {
        reduction_percent: f64,
        target_weight: f64,
        duration_weeks: u32,
    },
    RepRange {
        target_min_reps: u32,
        target_max_reps: u32,
        target_weight: f64,
    },
    Volume {
        current_sets: u32,
        target_sets: u32,
    },
    Variation {
        options: Vec<VariationOption>,
    },
    Technique {
        focus_points: Vec<String>,
    },
    Rest {
        rest_between_sets_seconds: u32,
        sleep_hours: f64,
    },
    Frequency {
        additional_sessions_per_week: u32,
    },
    Periodization {
        model: String,
        block_weeks: u32,
    },
    Substitution {
        replacement: String,
        suggested_weight: f64,
        duration_weeks: u32,
    },
    /// Parameters supplied by the analysis provider, kept verbatim.
    Freeform {
        details: serde_json::Value,
    },
}

/// One concrete way to break a plateau.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionSuggestion {
    #[serde(rename = "type")]
    pub intervention_type: InterventionType,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub implementation: InterventionPlan,
    pub reasoning: String,
    pub expected_outcome: String,
    pub confidence_level: f64,
    pub estimated_effectiveness: f64,
}

/// Sort by priority then effectiveness, both descending.
pub fn sort_interventions(interventions: &mut [InterventionSuggestion]) {
    interventions.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.estimated_effectiveness.total_cmp(&a.estimated_effectiveness))
    });
}
