//! Rule-based whole-workout suggestions.
//!
//! Used when the analysis provider is off or unavailable, and as the
//! provider client's fallback payload for workout plans.

use crate::domain::models::{
    ProgressionAnalysis, WorkoutContext, WorkoutSuggestion, WorkoutSuggestionSource,
};
use crate::services::exercise_catalog::{classify, ExerciseKind, DEFAULT_TEMPLATE};
use crate::services::progression_engine::generate_progression_suggestion;

/// Below this many minutes the session switches to shorter rests and
/// fewer sets.
const SHORT_SESSION_MINUTES: u32 = 45;

/// Rough minutes one exercise takes, used to cap the exercise count.
const MINUTES_PER_EXERCISE: u32 = 10;

/// Build a workout from per-exercise analyses, taken in the order given.
/// With no analyses the default template is used.
pub fn rule_based_workout(
    analyses: &[ProgressionAnalysis],
    context: &WorkoutContext,
) -> Vec<WorkoutSuggestion> {
    let limit = exercise_limit(context);
    let short = context
        .available_minutes
        .is_some_and(|minutes| minutes < SHORT_SESSION_MINUTES);

    if analyses.is_empty() {
        return DEFAULT_TEMPLATE
            .iter()
            .take(limit)
            .map(|(name, weight)| {
                let kind = classify(name);
                prescription(
                    name,
                    kind,
                    *weight,
                    kind.rep_baseline(),
                    3,
                    short,
                    "Starter weight; adjust so the last rep is challenging but clean.",
                )
            })
            .collect();
    }

    analyses
        .iter()
        .take(limit)
        .map(|analysis| {
            let kind = classify(&analysis.exercise_id);
            let next = generate_progression_suggestion(analysis);
            prescription(
                &analysis.exercise_id,
                kind,
                next.suggested_weight,
                next.suggested_reps,
                next.suggested_sets,
                short,
                &next.reasoning,
            )
        })
        .collect()
}

fn exercise_limit(context: &WorkoutContext) -> usize {
    let by_time = context
        .available_minutes
        .map_or(usize::MAX, |minutes| (minutes / MINUTES_PER_EXERCISE).max(1) as usize);
    context.max_exercises.min(by_time)
}

fn prescription(
    name: &str,
    kind: ExerciseKind,
    weight: f64,
    reps: u32,
    sets: u32,
    short: bool,
    notes: &str,
) -> WorkoutSuggestion {
    let (sets, reps, rest_seconds) = match (short, kind) {
        // short sessions trade one set for two extra reps and shorter rests
        (true, _) => (sets.saturating_sub(1).max(2), reps.saturating_add(2), 60),
        (false, ExerciseKind::Compound) => (sets, reps, 180),
        (false, ExerciseKind::Isolation) => (sets, reps, 90),
    };

    WorkoutSuggestion {
        exercise_name: name.to_string(),
        sets,
        reps,
        weight,
        rest_seconds,
        notes: notes.to_string(),
        source: WorkoutSuggestionSource::RuleBased,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ProgressionTrend;

    fn analysis(name: &str, weight: f64) -> ProgressionAnalysis {
        ProgressionAnalysis {
            current_weight: weight,
            current_reps: 8,
            current_sets: 3,
            progression_trend: ProgressionTrend::Maintaining,
            confidence_level: 0.6,
            total_sessions: 4,
            ..ProgressionAnalysis::empty(name)
        }
    }

    #[test]
    fn test_template_when_no_history() {
        let plan = rule_based_workout(&[], &WorkoutContext::default());
        assert_eq!(plan.len(), 5);
        assert_eq!(plan[0].exercise_name, "squat");
        assert!(plan.iter().all(|s| s.source == WorkoutSuggestionSource::RuleBased));
    }

    #[test]
    fn test_respects_max_exercises() {
        let analyses: Vec<_> = (0..8).map(|i| analysis(&format!("lift-{i}"), 20.0)).collect();
        let context = WorkoutContext {
            max_exercises: 3,
            ..WorkoutContext::default()
        };
        let plan = rule_based_workout(&analyses, &context);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].exercise_name, "lift-0");
    }

    #[test]
    fn test_short_session_adjusts_targets() {
        let context = WorkoutContext {
            max_exercises: 5,
            available_minutes: Some(30),
            focus: None,
        };
        let plan = rule_based_workout(&[analysis("Bench Press", 60.0)], &context);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].rest_seconds, 60);
        assert_eq!(plan[0].sets, 2);

        let long = rule_based_workout(&[analysis("Bench Press", 60.0)], &WorkoutContext::default());
        assert_eq!(long[0].rest_seconds, 180);
        assert_eq!(plan[0].reps, long[0].reps + 2);
    }

    #[test]
    fn test_short_session_reps_saturate() {
        let heavy = ProgressionAnalysis {
            current_reps: u32::MAX,
            progression_trend: ProgressionTrend::Declining,
            ..analysis("Squat", 100.0)
        };
        let context = WorkoutContext {
            max_exercises: 5,
            available_minutes: Some(30),
            focus: None,
        };
        let plan = rule_based_workout(&[heavy], &context);
        assert_eq!(plan[0].reps, u32::MAX);
    }

    #[test]
    fn test_time_caps_exercise_count() {
        let context = WorkoutContext {
            max_exercises: 5,
            available_minutes: Some(25),
            focus: None,
        };
        assert_eq!(rule_based_workout(&[], &context).len(), 2);
    }
}
