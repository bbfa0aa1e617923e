//! Merging rule-based and provider output.
//!
//! The provider never replaces the rule engine outright. Its prescription is
//! bounded by the rule engine's view of the lifter, confidence is a weighted
//! blend of both sources, and the rule engine's own prescription is kept as
//! an alternative.

use chrono::{DateTime, Utc};

use crate::domain::models::{
    sort_alternatives, sort_interventions, AlternativeOption, CombinedSuggestion, FallbackReason,
    InterventionSuggestion, Priority, ProgressionAnalysis, ProgressionSuggestion,
    ProviderSuggestion, RuleBasedSuggestion, FALLBACK_NOTICE,
};
use crate::services::progression_engine::{rule_enhancements, MAX_CONFIDENCE};

/// Largest jump over the current weight accepted from the provider.
pub const MAX_PROVIDER_JUMP: f64 = 0.10;

/// `rule * rule_weight + provider * (1 - rule_weight)`, clamped to
/// `[0, MAX_CONFIDENCE]`.
pub fn blend_confidence(rule: f64, provider: f64, rule_weight: f64) -> f64 {
    let rule_weight = rule_weight.clamp(0.0, 1.0);
    let blended = rule * rule_weight + provider * (1.0 - rule_weight);
    if blended.is_nan() {
        return 0.0;
    }
    blended.clamp(0.0, MAX_CONFIDENCE)
}

/// Combine a rule suggestion with the provider's.
///
/// In hybrid mode the confidence is blended and the rule prescription is
/// offered as an alternative; otherwise the provider's confidence is used
/// directly (still capped).
pub fn merge_suggestions(
    analysis: &ProgressionAnalysis,
    rule: &ProgressionSuggestion,
    provider: &ProviderSuggestion,
    rule_weight: f64,
    hybrid: bool,
    now: DateTime<Utc>,
) -> CombinedSuggestion {
    let provider_confidence = provider.confidence.clamp(0.0, 1.0);
    let confidence = if hybrid {
        blend_confidence(rule.confidence_level, provider_confidence, rule_weight)
    } else {
        provider_confidence.min(MAX_CONFIDENCE)
    };

    let mut alternatives = rule.alternative_options.clone();
    if hybrid && !same_prescription(rule, provider) {
        alternatives.push(AlternativeOption {
            weight: rule.suggested_weight,
            reps: rule.suggested_reps,
            reasoning: format!("Rule-based: {}", rule.reasoning),
            priority: Priority::High,
            estimated_effectiveness: rule.confidence_level,
        });
    }
    sort_alternatives(&mut alternatives);

    let reasoning = if hybrid {
        format!("{} (Rule-based analysis: {})", provider.reasoning.trim(), rule.reasoning)
    } else {
        provider.reasoning.trim().to_string()
    };

    let blended = ProgressionSuggestion {
        exercise_id: rule.exercise_id.clone(),
        current_weight: rule.current_weight,
        suggested_weight: bounded_weight(rule, provider.suggested_weight),
        suggested_reps: nonzero_or(provider.suggested_reps, rule.suggested_reps),
        suggested_sets: nonzero_or(provider.suggested_sets, rule.suggested_sets),
        progression_type: provider.progression_type,
        reasoning,
        confidence_level: confidence,
        alternative_options: alternatives,
    };

    let (mut tips, mut risk_notes) = rule_enhancements(analysis, rule);
    merge_unique(&mut tips, &provider.tips);
    merge_unique(&mut risk_notes, &provider.risk_notes);

    CombinedSuggestion {
        rule: rule.clone(),
        provider: provider.clone(),
        blended,
        rule_confidence: rule.confidence_level,
        provider_confidence,
        tips,
        risk_notes,
        generated_at: now,
    }
}

/// Rule suggestion enriched with tips and risk notes, tagged with why the
/// provider was not used.
pub fn enhanced_fallback(
    analysis: &ProgressionAnalysis,
    rule: ProgressionSuggestion,
    reason: Option<FallbackReason>,
    now: DateTime<Utc>,
) -> RuleBasedSuggestion {
    let (tips, risk_notes) = rule_enhancements(analysis, &rule);
    let notice = reason
        .filter(FallbackReason::is_degraded)
        .map(|_| FALLBACK_NOTICE.to_string());

    RuleBasedSuggestion {
        suggestion: rule,
        tips,
        risk_notes,
        fallback_reason: reason,
        notice,
        generated_at: now,
    }
}

/// Merge provider interventions into the rule baseline. A provider entry of a
/// type the baseline already has contributes its reasoning to that entry;
/// new types are appended. The result is sorted.
pub fn merge_interventions(
    mut baseline: Vec<InterventionSuggestion>,
    provider: Vec<InterventionSuggestion>,
    rule_weight: f64,
) -> Vec<InterventionSuggestion> {
    for incoming in provider {
        match baseline
            .iter_mut()
            .find(|existing| existing.intervention_type == incoming.intervention_type)
        {
            Some(existing) => {
                let insight = incoming.reasoning.trim();
                if !insight.is_empty() && !existing.reasoning.contains(insight) {
                    existing.reasoning = format!("{} Coach insight: {}", existing.reasoning, insight);
                }
                existing.confidence_level = blend_confidence(
                    existing.confidence_level,
                    incoming.confidence_level,
                    rule_weight,
                );
            }
            None => baseline.push(InterventionSuggestion {
                confidence_level: incoming.confidence_level.clamp(0.0, MAX_CONFIDENCE),
                estimated_effectiveness: incoming.estimated_effectiveness.clamp(0.0, 1.0),
                ..incoming
            }),
        }
    }
    sort_interventions(&mut baseline);
    baseline
}

fn bounded_weight(rule: &ProgressionSuggestion, proposed: f64) -> f64 {
    if !proposed.is_finite() || proposed <= 0.0 {
        return rule.suggested_weight;
    }
    if rule.current_weight > 0.0 {
        let ceiling = rule.current_weight * (1.0 + MAX_PROVIDER_JUMP);
        if proposed > ceiling {
            tracing::debug!(
                exercise = %rule.exercise_id,
                proposed,
                ceiling,
                "Provider weight above safe jump; capping"
            );
            return ceiling;
        }
    }
    proposed
}

fn nonzero_or(value: u32, fallback: u32) -> u32 {
    if value == 0 {
        fallback
    } else {
        value
    }
}

fn same_prescription(rule: &ProgressionSuggestion, provider: &ProviderSuggestion) -> bool {
    (rule.suggested_weight - provider.suggested_weight).abs() < f64::EPSILON
        && rule.suggested_reps == provider.suggested_reps
}

fn merge_unique(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        let item = item.trim();
        if !item.is_empty() && !target.iter().any(|t| t == item) {
            target.push(item.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        InterventionPlan, InterventionType, ProgressionTrend, ProgressionType,
    };
    use serde_json::json;

    fn analysis() -> ProgressionAnalysis {
        ProgressionAnalysis {
            current_weight: 60.0,
            current_reps: 8,
            current_sets: 3,
            progression_trend: ProgressionTrend::Improving,
            confidence_level: 0.75,
            total_sessions: 8,
            ..ProgressionAnalysis::empty("Bench Press")
        }
    }

    fn rule() -> ProgressionSuggestion {
        ProgressionSuggestion {
            exercise_id: "Bench Press".into(),
            current_weight: 60.0,
            suggested_weight: 62.5,
            suggested_reps: 8,
            suggested_sets: 3,
            progression_type: ProgressionType::Weight,
            reasoning: "Steady gains".into(),
            confidence_level: 0.75,
            alternative_options: Vec::new(),
        }
    }

    fn provider(weight: f64, confidence: f64) -> ProviderSuggestion {
        ProviderSuggestion {
            exercise_id: "Bench Press".into(),
            suggested_weight: weight,
            suggested_reps: 6,
            suggested_sets: 0,
            progression_type: ProgressionType::Weight,
            reasoning: "Ready for a heavier triple".into(),
            confidence,
            tips: vec!["Brace hard".into()],
            risk_notes: Vec::new(),
        }
    }

    #[test]
    fn test_blend_confidence_weights_and_cap() {
        assert!((blend_confidence(0.5, 1.0, 0.6) - 0.7).abs() < 1e-9);
        assert!((blend_confidence(1.0, 1.0, 0.6) - MAX_CONFIDENCE).abs() < 1e-9);
        assert!(blend_confidence(-1.0, 0.0, 0.6).abs() < 1e-9);
        assert!(blend_confidence(f64::NAN, 0.5, 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_merge_caps_provider_jump() {
        let merged = merge_suggestions(&analysis(), &rule(), &provider(80.0, 0.9), 0.6, true, Utc::now());
        assert!((merged.blended.suggested_weight - 66.0).abs() < 1e-9);
        assert_eq!(merged.blended.suggested_reps, 6);
        // zero sets from the provider keep the rule's sets
        assert_eq!(merged.blended.suggested_sets, 3);
    }

    #[test]
    fn test_merge_blends_and_keeps_rule_as_alternative() {
        let merged = merge_suggestions(&analysis(), &rule(), &provider(62.5, 0.9), 0.6, true, Utc::now());
        assert!((merged.blended.confidence_level - (0.75 * 0.6 + 0.9 * 0.4)).abs() < 1e-9);
        assert_eq!(merged.blended.alternative_options.len(), 1);
        assert_eq!(merged.blended.alternative_options[0].priority, Priority::High);
        assert!(merged.blended.reasoning.contains("Steady gains"));
        assert!(merged.tips.iter().any(|t| t == "Brace hard"));
        assert!((merged.provider_confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_non_hybrid_uses_provider_confidence() {
        let merged = merge_suggestions(&analysis(), &rule(), &provider(62.5, 0.99), 0.6, false, Utc::now());
        assert!((merged.blended.confidence_level - MAX_CONFIDENCE).abs() < 1e-9);
        assert!(merged.blended.alternative_options.is_empty());
        assert_eq!(merged.blended.reasoning, "Ready for a heavier triple");
    }

    #[test]
    fn test_invalid_provider_weight_keeps_rule_weight() {
        let merged = merge_suggestions(&analysis(), &rule(), &provider(-5.0, 0.5), 0.6, true, Utc::now());
        assert!((merged.blended.suggested_weight - 62.5).abs() < 1e-9);
    }

    #[test]
    fn test_enhanced_fallback_notice_only_when_degraded() {
        let degraded = enhanced_fallback(&analysis(), rule(), Some(FallbackReason::Timeout), Utc::now());
        assert_eq!(degraded.notice.as_deref(), Some(FALLBACK_NOTICE));
        assert!(!degraded.tips.is_empty());

        let disabled = enhanced_fallback(&analysis(), rule(), Some(FallbackReason::Disabled), Utc::now());
        assert!(disabled.notice.is_none());

        let plain = enhanced_fallback(&analysis(), rule(), None, Utc::now());
        assert!(plain.fallback_reason.is_none());
    }

    fn intervention(kind: InterventionType, reasoning: &str, effectiveness: f64) -> InterventionSuggestion {
        InterventionSuggestion {
            intervention_type: kind,
            priority: Priority::Medium,
            title: kind.as_str().to_string(),
            description: String::new(),
            implementation: InterventionPlan::Freeform { details: json!({}) },
            reasoning: reasoning.to_string(),
            expected_outcome: String::new(),
            confidence_level: 0.6,
            estimated_effectiveness: effectiveness,
        }
    }

    #[test]
    fn test_merge_interventions_dedups_by_type() {
        let baseline = vec![
            intervention(InterventionType::Deload, "Reduce load", 0.8),
            intervention(InterventionType::TechniqueFocus, "Film your sets", 0.6),
        ];
        let provider = vec![
            intervention(InterventionType::Deload, "Fatigue is masking strength", 0.9),
            intervention(InterventionType::Periodization, "Switch to blocks", 0.7),
        ];

        let merged = merge_interventions(baseline, provider, 0.6);
        assert_eq!(merged.len(), 3);
        let deload = merged
            .iter()
            .find(|i| i.intervention_type == InterventionType::Deload)
            .expect("deload kept");
        assert!(deload.reasoning.starts_with("Reduce load"));
        assert!(deload.reasoning.contains("Fatigue is masking strength"));
        assert_eq!(merged[0].intervention_type, InterventionType::Deload);
    }
}
