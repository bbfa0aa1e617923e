//! Rule-based plateau interventions.
//!
//! Every intervention is a pure function of the [`PlateauDetection`].
//! Effectiveness starts from a per-type base score and is nudged ten percent
//! up or down depending on whether the intervention suits the severity.

use crate::domain::models::{
    sort_interventions, InterventionPlan, InterventionSuggestion, InterventionType,
    PlateauDetection, PlateauSeverity, PlateauType, Priority, VariationOption,
};
use crate::services::exercise_catalog::{classify, variations, ExerciseKind};

/// Hard cap on working sets from a volume increase.
const MAX_SETS: u32 = 5;

const MIN_DELOAD: f64 = 0.10;
const MAX_DELOAD: f64 = 0.25;

/// Build the full rule-based intervention list, sorted.
pub fn generate_interventions(plateau: &PlateauDetection) -> Vec<InterventionSuggestion> {
    let mut interventions = vec![deload(plateau), rep_range_modification(plateau)];
    interventions.extend(volume_increase(plateau));
    interventions.extend(exercise_variation(plateau));
    interventions.extend(severity_specific(plateau));

    sort_interventions(&mut interventions);
    interventions
}

fn base_effectiveness(kind: InterventionType) -> f64 {
    match kind {
        InterventionType::Deload => 0.8,
        InterventionType::RepRangeModification => 0.7,
        InterventionType::VolumeIncrease => 0.65,
        InterventionType::ExerciseVariation => 0.7,
        InterventionType::TechniqueFocus => 0.55,
        InterventionType::RestOptimization => 0.5,
        InterventionType::FrequencyChange => 0.65,
        InterventionType::Periodization => 0.85,
        InterventionType::ExerciseSubstitution => 0.75,
    }
}

/// Heavy interventions pay off on entrenched plateaus, light ones on fresh ones.
fn is_heavy(kind: InterventionType) -> bool {
    matches!(
        kind,
        InterventionType::Deload
            | InterventionType::FrequencyChange
            | InterventionType::Periodization
            | InterventionType::ExerciseSubstitution
    )
}

pub fn estimated_effectiveness(kind: InterventionType, severity: PlateauSeverity) -> f64 {
    let base = base_effectiveness(kind);
    let adjustment = match (severity, is_heavy(kind)) {
        (PlateauSeverity::Moderate, _) => 1.0,
        (PlateauSeverity::Severe, true) | (PlateauSeverity::Mild, false) => 1.1,
        (PlateauSeverity::Severe, false) | (PlateauSeverity::Mild, true) => 0.9,
    };
    (base * adjustment).clamp(0.0, 1.0)
}

fn round_weight(weight: f64) -> f64 {
    (weight * 2.0).round() / 2.0
}

#[allow(clippy::too_many_arguments)]
fn suggestion(
    plateau: &PlateauDetection,
    kind: InterventionType,
    priority: Priority,
    title: impl Into<String>,
    description: impl Into<String>,
    implementation: InterventionPlan,
    reasoning: impl Into<String>,
    expected_outcome: impl Into<String>,
) -> InterventionSuggestion {
    InterventionSuggestion {
        intervention_type: kind,
        priority,
        title: title.into(),
        description: description.into(),
        implementation,
        reasoning: reasoning.into(),
        expected_outcome: expected_outcome.into(),
        confidence_level: plateau.confidence_level.clamp(0.0, 1.0),
        estimated_effectiveness: estimated_effectiveness(kind, plateau.severity),
    }
}

/// Load reduction for a plateau: 10% mild, 15% moderate, 20% severe, plus one
/// point per session beyond the minimum window, within 10-25%.
pub fn deload_reduction(plateau: &PlateauDetection) -> f64 {
    let base = match plateau.severity {
        PlateauSeverity::Mild => 0.10,
        PlateauSeverity::Moderate => 0.15,
        PlateauSeverity::Severe => 0.20,
    };
    let extra = 0.01 * f64::from(plateau.plateau_duration.saturating_sub(3));
    (base + extra).clamp(MIN_DELOAD, MAX_DELOAD)
}

fn deload(plateau: &PlateauDetection) -> InterventionSuggestion {
    let kind = classify(&plateau.exercise_id);
    let reduction = deload_reduction(plateau);
    let target = round_weight(plateau.current_weight * (1.0 - reduction)).max(kind.minimum_weight());
    let weeks = if plateau.severity == PlateauSeverity::Severe { 2 } else { 1 };
    let priority = match plateau.severity {
        PlateauSeverity::Severe => Priority::High,
        PlateauSeverity::Moderate => Priority::Medium,
        PlateauSeverity::Mild => Priority::Low,
    };

    suggestion(
        plateau,
        InterventionType::Deload,
        priority,
        "Take a deload",
        format!(
            "Drop to {target:.1}kg ({:.0}% lighter) for {weeks} week(s), then rebuild.",
            reduction * 100.0
        ),
        InterventionPlan::Deload {
            reduction_percent: reduction * 100.0,
            target_weight: target,
            duration_weeks: weeks,
        },
        format!(
            "{} sessions without a weight increase suggests accumulated fatigue.",
            plateau.plateau_duration
        ),
        "Recovered joints and nervous system, usually followed by a new best within 2-3 weeks.",
    )
}

fn rep_range_modification(plateau: &PlateauDetection) -> InterventionSuggestion {
    let (min, max, weight_factor, label) = if plateau.current_reps <= 8 {
        (12, 15, 0.8, "hypertrophy")
    } else {
        (4, 6, 1.1, "strength")
    };
    let target_weight = round_weight(plateau.current_weight * weight_factor);

    suggestion(
        plateau,
        InterventionType::RepRangeModification,
        Priority::Medium,
        format!("Switch to the {label} rep range"),
        format!("Train {min}-{max} reps at about {target_weight:.1}kg for 3-4 weeks."),
        InterventionPlan::RepRange {
            target_min_reps: min,
            target_max_reps: max,
            target_weight,
        },
        format!(
            "A new rep range changes the stimulus after {} reps stopped producing gains.",
            plateau.current_reps
        ),
        "Fresh adaptation that carries back over when you return to your usual range.",
    )
}

fn volume_increase(plateau: &PlateauDetection) -> Option<InterventionSuggestion> {
    let current_sets = plateau.current_sets.max(1);
    if current_sets >= MAX_SETS {
        return None;
    }
    let target_sets = current_sets.saturating_add(1);
    let priority = if plateau.plateau_type == PlateauType::Volume {
        Priority::Medium
    } else {
        Priority::Low
    };

    Some(suggestion(
        plateau,
        InterventionType::VolumeIncrease,
        priority,
        "Add a working set",
        format!("Go from {current_sets} to {target_sets} sets at the current weight."),
        InterventionPlan::Volume {
            current_sets,
            target_sets,
        },
        "More total work is the simplest lever when intensity has stalled.",
        "Higher weekly volume that supports the next weight increase.",
    ))
}

fn exercise_variation(plateau: &PlateauDetection) -> Option<InterventionSuggestion> {
    let options: Vec<VariationOption> = variations(&plateau.exercise_id)
        .iter()
        .map(|v| VariationOption {
            name: v.name.to_string(),
            weight_multiplier: v.weight_multiplier,
            suggested_weight: round_weight(plateau.current_weight * v.weight_multiplier),
        })
        .collect();
    let first = options.first()?.name.clone();
    let priority = if plateau.severity == PlateauSeverity::Mild {
        Priority::Low
    } else {
        Priority::Medium
    };

    Some(suggestion(
        plateau,
        InterventionType::ExerciseVariation,
        priority,
        "Rotate in a variation",
        format!("Swap in {first} (or another listed variation) for 2-4 weeks."),
        InterventionPlan::Variation { options },
        "A close variation trains the same pattern while targeting the sticking point.",
        "Stronger weak points that transfer back to the main lift.",
    ))
}

fn severity_specific(plateau: &PlateauDetection) -> Vec<InterventionSuggestion> {
    match plateau.severity {
        PlateauSeverity::Mild => vec![
            suggestion(
                plateau,
                InterventionType::TechniqueFocus,
                Priority::Low,
                "Tighten technique",
                "Film a set and fix bar path, bracing, and tempo before adding load.",
                InterventionPlan::Technique {
                    focus_points: vec![
                        "consistent bar path".to_string(),
                        "full range of motion".to_string(),
                        "controlled eccentric".to_string(),
                    ],
                },
                "Short plateaus are often technique leaks rather than strength limits.",
                "Smoother reps that make the next increment feel lighter.",
            ),
            suggestion(
                plateau,
                InterventionType::RestOptimization,
                Priority::Low,
                "Optimize rest and recovery",
                "Rest 2-3 minutes between heavy sets and prioritize 7-9 hours of sleep.",
                InterventionPlan::Rest {
                    rest_between_sets_seconds: 180,
                    sleep_hours: 8.0,
                },
                "Incomplete recovery between sets and sessions caps output.",
                "Better set-to-set performance within a week or two.",
            ),
        ],
        PlateauSeverity::Moderate => vec![suggestion(
            plateau,
            InterventionType::FrequencyChange,
            Priority::Medium,
            "Train the lift more often",
            "Add one extra lighter session for this exercise each week.",
            InterventionPlan::Frequency {
                additional_sessions_per_week: 1,
            },
            "More frequent practice builds skill and spreads volume.",
            "Improved movement efficiency and a gradual strength increase.",
        )],
        PlateauSeverity::Severe => {
            let kind = classify(&plateau.exercise_id);
            let replacement = variations(&plateau.exercise_id).first().map_or_else(
                || ("a similar movement".to_string(), 0.8),
                |v| (v.name.to_string(), v.weight_multiplier),
            );
            let substitution_weight =
                round_weight(plateau.current_weight * replacement.1).max(if replacement.1 > 0.0 {
                    kind.minimum_weight()
                } else {
                    0.0
                });
            vec![
                suggestion(
                    plateau,
                    InterventionType::Periodization,
                    Priority::High,
                    "Start a periodized block",
                    "Run a 4-week undulating block alternating heavy, moderate, and light days.",
                    InterventionPlan::Periodization {
                        model: if kind == ExerciseKind::Compound {
                            "daily undulating".to_string()
                        } else {
                            "linear".to_string()
                        },
                        block_weeks: 4,
                    },
                    format!(
                        "A {}-session plateau needs a structured change, not another small tweak.",
                        plateau.plateau_duration
                    ),
                    "Renewed progress once the block ends and you test again.",
                ),
                suggestion(
                    plateau,
                    InterventionType::ExerciseSubstitution,
                    Priority::High,
                    "Substitute the exercise",
                    format!("Replace it with {} for 4-6 weeks.", replacement.0),
                    InterventionPlan::Substitution {
                        replacement: replacement.0.clone(),
                        suggested_weight: substitution_weight,
                        duration_weeks: 4,
                    },
                    "A full break from the stalled movement removes accumulated staleness.",
                    "Returning to the original lift fresher and usually stronger.",
                ),
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::StagnantMetrics;

    fn plateau(exercise: &str, severity: PlateauSeverity, duration: u32) -> PlateauDetection {
        PlateauDetection {
            exercise_id: exercise.to_string(),
            plateau_duration: duration,
            last_progress_date: None,
            plateau_type: PlateauType::Weight,
            severity,
            confidence_level: 0.8,
            stagnant_metrics: StagnantMetrics {
                weight: true,
                reps: true,
                volume: false,
            },
            current_weight: 100.0,
            current_reps: 5,
            current_sets: 3,
            suggested_interventions: vec![],
        }
    }

    fn find(list: &[InterventionSuggestion], kind: InterventionType) -> Option<&InterventionSuggestion> {
        list.iter().find(|i| i.intervention_type == kind)
    }

    #[test]
    fn test_sorted_by_priority_then_effectiveness() {
        for severity in PlateauSeverity::all() {
            let list = generate_interventions(&plateau("squat", severity, 5));
            for pair in list.windows(2) {
                assert!(
                    pair[0].priority > pair[1].priority
                        || (pair[0].priority == pair[1].priority
                            && pair[0].estimated_effectiveness >= pair[1].estimated_effectiveness)
                );
            }
        }
    }

    #[test]
    fn test_deload_scales_with_severity_and_duration() {
        assert!((deload_reduction(&plateau("squat", PlateauSeverity::Mild, 3)) - 0.10).abs() < 1e-9);
        assert!((deload_reduction(&plateau("squat", PlateauSeverity::Moderate, 4)) - 0.16).abs() < 1e-9);
        assert!((deload_reduction(&plateau("squat", PlateauSeverity::Severe, 12)) - 0.25).abs() < 1e-9);

        let list = generate_interventions(&plateau("squat", PlateauSeverity::Severe, 6));
        let deload = find(&list, InterventionType::Deload).unwrap();
        assert_eq!(deload.priority, Priority::High);
        match &deload.implementation {
            InterventionPlan::Deload {
                target_weight,
                duration_weeks,
                ..
            } => {
                assert!((target_weight - 77.0).abs() < 1e-9);
                assert_eq!(*duration_weeks, 2);
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_deload_floored_at_minimum_weight() {
        let mut light = plateau("squat", PlateauSeverity::Severe, 6);
        light.current_weight = 20.0;
        let list = generate_interventions(&light);
        match &find(&list, InterventionType::Deload).unwrap().implementation {
            InterventionPlan::Deload { target_weight, .. } => {
                assert!((target_weight - 20.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_rep_range_direction() {
        let list = generate_interventions(&plateau("squat", PlateauSeverity::Mild, 3));
        match &find(&list, InterventionType::RepRangeModification).unwrap().implementation {
            InterventionPlan::RepRange {
                target_min_reps,
                target_max_reps,
                ..
            } => assert_eq!((*target_min_reps, *target_max_reps), (12, 15)),
            other => panic!("unexpected plan {other:?}"),
        }

        let mut high_reps = plateau("bicep-curl", PlateauSeverity::Mild, 3);
        high_reps.current_reps = 12;
        let list = generate_interventions(&high_reps);
        match &find(&list, InterventionType::RepRangeModification).unwrap().implementation {
            InterventionPlan::RepRange { target_min_reps, .. } => assert_eq!(*target_min_reps, 4),
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_volume_increase_capped() {
        let mut at_cap = plateau("squat", PlateauSeverity::Moderate, 4);
        at_cap.current_sets = 5;
        assert!(find(&generate_interventions(&at_cap), InterventionType::VolumeIncrease).is_none());

        let list = generate_interventions(&plateau("squat", PlateauSeverity::Moderate, 4));
        match &find(&list, InterventionType::VolumeIncrease).unwrap().implementation {
            InterventionPlan::Volume { target_sets, .. } => assert_eq!(*target_sets, 4),
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_variations_only_for_known_exercises() {
        let known = generate_interventions(&plateau("bench-press", PlateauSeverity::Mild, 3));
        let variation = find(&known, InterventionType::ExerciseVariation).unwrap();
        match &variation.implementation {
            InterventionPlan::Variation { options } => {
                let incline = options.iter().find(|o| o.name == "incline-bench-press").unwrap();
                assert!((incline.suggested_weight - 80.0).abs() < 1e-9);
            }
            other => panic!("unexpected plan {other:?}"),
        }

        let unknown = generate_interventions(&plateau("cable-fly", PlateauSeverity::Mild, 3));
        assert!(find(&unknown, InterventionType::ExerciseVariation).is_none());
    }

    #[test]
    fn test_severity_specific_interventions() {
        let mild = generate_interventions(&plateau("squat", PlateauSeverity::Mild, 3));
        assert!(find(&mild, InterventionType::TechniqueFocus).is_some());
        assert!(find(&mild, InterventionType::RestOptimization).is_some());
        assert!(find(&mild, InterventionType::Periodization).is_none());

        let moderate = generate_interventions(&plateau("squat", PlateauSeverity::Moderate, 4));
        assert!(find(&moderate, InterventionType::FrequencyChange).is_some());

        let severe = generate_interventions(&plateau("squat", PlateauSeverity::Severe, 6));
        assert!(find(&severe, InterventionType::Periodization).is_some());
        assert!(find(&severe, InterventionType::ExerciseSubstitution).is_some());
    }

    #[test]
    fn test_effectiveness_adjusted_by_severity() {
        let mild = estimated_effectiveness(InterventionType::Deload, PlateauSeverity::Mild);
        let moderate = estimated_effectiveness(InterventionType::Deload, PlateauSeverity::Moderate);
        let severe = estimated_effectiveness(InterventionType::Deload, PlateauSeverity::Severe);
        assert!((mild - 0.72).abs() < 1e-9);
        assert!((moderate - 0.8).abs() < 1e-9);
        assert!((severe - 0.88).abs() < 1e-9);

        let technique_mild = estimated_effectiveness(InterventionType::TechniqueFocus, PlateauSeverity::Mild);
        assert!(technique_mild > base_effectiveness(InterventionType::TechniqueFocus));
        assert!(estimated_effectiveness(InterventionType::Periodization, PlateauSeverity::Severe) <= 1.0);
    }
}
