//! Suggestion results with explicit provenance.
//!
//! A suggestion returned to callers is either purely rule-based (possibly
//! because the analysis provider was unavailable) or the combination of a
//! rule-based and a provider suggestion. The two shapes are distinct types so
//! that which field came from which source is never ambiguous.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::progression::{ProgressionSuggestion, ProgressionType};

/// Notice attached to rule-based results served while the provider is degraded.
pub const FALLBACK_NOTICE: &str = "AI suggestions are temporarily using smart fallbacks";

/// Why the analysis provider was not used for a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Feature flag off or emergency disable set.
    Disabled,
    /// Daily hard cap reached.
    EmergencyBrake,
    CircuitOpen,
    /// Hourly or per-user cap reached.
    RateLimited,
    Timeout,
    /// Network, HTTP, or parse failure.
    ProviderError,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::EmergencyBrake => "emergency_brake",
            Self::CircuitOpen => "circuit_open",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::ProviderError => "provider_error",
        }
    }

    /// Whether the fallback reflects a degraded provider rather than a
    /// deliberate configuration choice.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Suggestion as proposed by the analysis provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSuggestion {
    pub exercise_id: String,
    pub suggested_weight: f64,
    pub suggested_reps: u32,
    pub suggested_sets: u32,
    pub progression_type: ProgressionType,
    pub reasoning: String,
    /// Provider's own confidence, before blending.
    pub confidence: f64,
    pub tips: Vec<String>,
    pub risk_notes: Vec<String>,
}

/// Rule-based output, enriched with tips and risk notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBasedSuggestion {
    pub suggestion: ProgressionSuggestion,
    pub tips: Vec<String>,
    pub risk_notes: Vec<String>,
    /// Set when the provider was wanted but could not be used.
    pub fallback_reason: Option<FallbackReason>,
    pub notice: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Rule-based and provider suggestions merged into one prescription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSuggestion {
    pub rule: ProgressionSuggestion,
    pub provider: ProviderSuggestion,
    /// The prescription shown to the user.
    pub blended: ProgressionSuggestion,
    pub rule_confidence: f64,
    pub provider_confidence: f64,
    pub tips: Vec<String>,
    pub risk_notes: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// A suggestion returned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SuggestionResult {
    RuleBased(RuleBasedSuggestion),
    Combined(CombinedSuggestion),
}

impl SuggestionResult {
    /// The prescription to present, whatever the source.
    pub fn suggestion(&self) -> &ProgressionSuggestion {
        match self {
            Self::RuleBased(r) => &r.suggestion,
            Self::Combined(c) => &c.blended,
        }
    }

    pub fn exercise_id(&self) -> &str {
        &self.suggestion().exercise_id
    }

    pub fn confidence(&self) -> f64 {
        self.suggestion().confidence_level
    }

    pub fn is_combined(&self) -> bool {
        matches!(self, Self::Combined(_))
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            Self::RuleBased(r) => r.fallback_reason,
            Self::Combined(_) => None,
        }
    }

    pub fn tips(&self) -> &[String] {
        match self {
            Self::RuleBased(r) => &r.tips,
            Self::Combined(c) => &c.tips,
        }
    }

    pub fn risk_notes(&self) -> &[String] {
        match self {
            Self::RuleBased(r) => &r.risk_notes,
            Self::Combined(c) => &c.risk_notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(exercise_id: &str) -> ProgressionSuggestion {
        ProgressionSuggestion {
            exercise_id: exercise_id.to_string(),
            current_weight: 60.0,
            suggested_weight: 62.5,
            suggested_reps: 8,
            suggested_sets: 3,
            progression_type: ProgressionType::Weight,
            reasoning: "steady gains".to_string(),
            confidence_level: 0.75,
            alternative_options: vec![],
        }
    }

    #[test]
    fn test_result_tagged_serialization() {
        let result = SuggestionResult::RuleBased(RuleBasedSuggestion {
            suggestion: suggestion("squat"),
            tips: vec![],
            risk_notes: vec![],
            fallback_reason: Some(FallbackReason::CircuitOpen),
            notice: Some(FALLBACK_NOTICE.to_string()),
            generated_at: Utc::now(),
        });

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["source"], "rule_based");
        assert_eq!(json["fallback_reason"], "circuit_open");

        let back: SuggestionResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
        assert_eq!(back.exercise_id(), "squat");
    }

    #[test]
    fn test_disabled_is_not_degraded() {
        assert!(!FallbackReason::Disabled.is_degraded());
        assert!(FallbackReason::Timeout.is_degraded());
    }
}
