//! Rule-based progression engine.
//!
//! Pure functions over an exercise's session history: trend and rate
//! analysis, confidence, and the next-session suggestion. Nothing here does
//! I/O or fails; malformed sessions have already been read as zero-valued.

use chrono::{DateTime, Utc};

use crate::domain::models::{
    sort_alternatives, AlternativeOption, ExerciseSession, Priority, ProgressionAnalysis,
    ProgressionSuggestion, ProgressionTrend, ProgressionType,
};
use crate::services::exercise_catalog::{classify, ExerciseKind};

/// Confidence above which an improving trend earns a weight increase.
const WEIGHT_JUMP_CONFIDENCE: f64 = 0.7;

/// Confidence above which the aggressive alternative is offered.
const AGGRESSIVE_CONFIDENCE: f64 = 0.8;

/// Fraction of weight kept on a deload.
const DELOAD_FACTOR: f64 = 0.9;

/// Sets suggested when the latest session logged none.
const DEFAULT_SETS: u32 = 3;

/// Upper bound on any confidence value.
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Confidence earned by a history of `sessions` sessions.
///
/// Never decreases as `sessions` grows.
#[allow(clippy::cast_precision_loss)]
pub fn confidence_for_sessions(sessions: usize) -> f64 {
    match sessions {
        0 => 0.0,
        1..=2 => 0.3,
        3..=4 => 0.6,
        n => (0.6 + 0.05 * (n - 5) as f64).min(MAX_CONFIDENCE),
    }
}

/// Sort sessions newest-first.
pub fn sort_newest_first(sessions: &mut [ExerciseSession]) {
    sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Analyze one exercise's history. Sessions may arrive in any order.
pub fn analyze_sessions(exercise_id: &str, sessions: &[ExerciseSession]) -> ProgressionAnalysis {
    if sessions.is_empty() {
        return ProgressionAnalysis::empty(exercise_id);
    }

    let mut sorted = sessions.to_vec();
    sort_newest_first(&mut sorted);

    let latest = &sorted[0];
    ProgressionAnalysis {
        exercise_id: exercise_id.to_string(),
        current_weight: latest.max_weight(),
        current_reps: latest.max_reps(),
        current_sets: u32::try_from(latest.sets.len()).unwrap_or(u32::MAX),
        progression_trend: trend(&sorted),
        progression_rate: progression_rate(&sorted),
        confidence_level: confidence_for_sessions(sorted.len()),
        last_progress_date: last_progress_date(&sorted),
        total_sessions: sorted.len(),
    }
}

/// Newest session's max weight against the third most recent (or the
/// oldest available when only two exist).
fn trend(newest_first: &[ExerciseSession]) -> ProgressionTrend {
    if newest_first.len() < 2 {
        return ProgressionTrend::Maintaining;
    }
    let newest = newest_first[0].max_weight();
    let reference = newest_first[newest_first.len().min(3) - 1].max_weight();

    if newest > reference {
        ProgressionTrend::Improving
    } else if newest < reference {
        ProgressionTrend::Declining
    } else {
        ProgressionTrend::Maintaining
    }
}

/// Kilograms per week between the oldest and newest session.
#[allow(clippy::cast_precision_loss)]
fn progression_rate(newest_first: &[ExerciseSession]) -> f64 {
    let (Some(newest), Some(oldest)) = (newest_first.first(), newest_first.last()) else {
        return 0.0;
    };
    if newest_first.len() < 2 {
        return 0.0;
    }

    let elapsed_secs = (newest.timestamp - oldest.timestamp).num_seconds();
    if elapsed_secs <= 0 {
        return 0.0;
    }
    let weeks = elapsed_secs as f64 / (7.0 * 24.0 * 3600.0);
    (newest.max_weight() - oldest.max_weight()) / weeks
}

/// Date of the most recent session that beat the one before it.
fn last_progress_date(newest_first: &[ExerciseSession]) -> Option<DateTime<Utc>> {
    newest_first
        .windows(2)
        .find(|pair| pair[0].max_weight() > pair[1].max_weight())
        .map(|pair| pair[0].timestamp)
}

fn round_weight(weight: f64) -> f64 {
    (weight * 100.0).round() / 100.0
}

/// Suggest the next session's prescription from an analysis.
pub fn generate_progression_suggestion(analysis: &ProgressionAnalysis) -> ProgressionSuggestion {
    let kind = classify(&analysis.exercise_id);
    let increment = kind.weight_increment();
    let current_weight = analysis.current_weight;
    let current_reps = analysis.current_reps;
    let sets = if analysis.current_sets == 0 {
        DEFAULT_SETS
    } else {
        analysis.current_sets
    };

    let (suggested_weight, suggested_reps, progression_type, reasoning) = if !analysis.has_history() {
        (
            0.0,
            kind.rep_baseline(),
            ProgressionType::Reps,
            format!(
                "No sessions logged yet. Start light and aim for {} clean reps per set to establish a baseline.",
                kind.rep_baseline()
            ),
        )
    } else {
        match analysis.progression_trend {
            ProgressionTrend::Improving if analysis.confidence_level > WEIGHT_JUMP_CONFIDENCE => (
                current_weight + increment,
                current_reps,
                ProgressionType::Weight,
                format!(
                    "Strength is trending up across {} sessions. Add {}kg and hold {} reps.",
                    analysis.total_sessions, increment, current_reps
                ),
            ),
            ProgressionTrend::Improving | ProgressionTrend::Maintaining => {
                maintaining_step(kind, current_weight, current_reps, analysis.progression_trend)
            }
            ProgressionTrend::Declining => {
                let deloaded = (current_weight * DELOAD_FACTOR).max(increment);
                (
                    round_weight(deloaded),
                    current_reps,
                    ProgressionType::Deload,
                    format!(
                        "Top weight has dropped over recent sessions. Deload 10% to {:.1}kg to recover before building back up.",
                        deloaded
                    ),
                )
            }
        }
    };

    let mut alternative_options = alternatives(analysis, kind, current_weight, current_reps);
    sort_alternatives(&mut alternative_options);

    ProgressionSuggestion {
        exercise_id: analysis.exercise_id.clone(),
        current_weight,
        suggested_weight: round_weight(suggested_weight),
        suggested_reps,
        suggested_sets: sets,
        progression_type,
        reasoning,
        confidence_level: analysis.confidence_level.clamp(0.0, 1.0),
        alternative_options,
    }
}

fn maintaining_step(
    kind: ExerciseKind,
    current_weight: f64,
    current_reps: u32,
    trend: ProgressionTrend,
) -> (f64, u32, ProgressionType, String) {
    let lead = match trend {
        ProgressionTrend::Improving => "Progress looks promising but the history is still thin.",
        _ => "Performance is holding steady.",
    };

    if current_reps < kind.rep_ceiling() {
        let reps = current_reps.saturating_add(2);
        (
            current_weight,
            reps,
            ProgressionType::Reps,
            format!("{lead} Build reps to {reps} at {current_weight:.1}kg before adding weight."),
        )
    } else {
        let increment = kind.weight_increment();
        (
            current_weight + increment,
            kind.rep_baseline(),
            ProgressionType::Weight,
            format!(
                "{lead} You have reached {} reps; add {}kg and restart at {} reps.",
                current_reps,
                increment,
                kind.rep_baseline()
            ),
        )
    }
}

fn alternatives(
    analysis: &ProgressionAnalysis,
    kind: ExerciseKind,
    current_weight: f64,
    current_reps: u32,
) -> Vec<AlternativeOption> {
    let increment = kind.weight_increment();
    let mut options = vec![
        AlternativeOption {
            weight: round_weight(current_weight + increment / 2.0),
            reps: current_reps,
            reasoning: format!("Conservative: add only {}kg.", increment / 2.0),
            priority: Priority::Medium,
            estimated_effectiveness: 0.7,
        },
        AlternativeOption {
            weight: round_weight(current_weight),
            reps: current_reps.saturating_add(1),
            reasoning: "Rep-focused: keep the weight and add one rep per set.".to_string(),
            priority: Priority::Medium,
            estimated_effectiveness: 0.65,
        },
    ];

    if analysis.confidence_level > AGGRESSIVE_CONFIDENCE {
        options.push(AlternativeOption {
            weight: round_weight(current_weight + increment * 2.0),
            reps: current_reps,
            reasoning: format!("Aggressive: add {}kg while momentum is high.", increment * 2.0),
            priority: Priority::Low,
            estimated_effectiveness: 0.55,
        });
    }

    options
}

/// Tips and risk notes that accompany a rule-based suggestion.
pub fn rule_enhancements(
    analysis: &ProgressionAnalysis,
    suggestion: &ProgressionSuggestion,
) -> (Vec<String>, Vec<String>) {
    let kind = classify(&analysis.exercise_id);
    let mut tips = Vec::new();
    let mut risk_notes = Vec::new();

    match suggestion.progression_type {
        ProgressionType::Weight => tips.push(format!(
            "Keep every rep of all {} sets at {:.1}kg as clean as your last session.",
            suggestion.suggested_sets, suggestion.suggested_weight
        )),
        ProgressionType::Reps => tips.push(format!(
            "Aim for {} reps per set; add weight once every set reaches it.",
            suggestion.suggested_reps
        )),
        ProgressionType::Deload => tips.push(
            "Use the lighter week to rebuild bar speed and groove technique.".to_string(),
        ),
    }
    if kind == ExerciseKind::Compound {
        tips.push("Warm up with two or three progressively heavier sets.".to_string());
    }

    if analysis.confidence_level < 0.5 {
        risk_notes.push("Limited history; treat this suggestion as an estimate.".to_string());
    }
    if analysis.progression_trend == ProgressionTrend::Declining {
        risk_notes.push(
            "Performance is trending down; check sleep, nutrition, and recovery.".to_string(),
        );
    }
    if analysis.progression_rate > kind.weight_increment() {
        risk_notes.push("Progress is unusually fast; watch for form breakdown.".to_string());
    }

    (tips, risk_notes)
}
