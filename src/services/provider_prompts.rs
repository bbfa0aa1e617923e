//! Prompt construction for the analysis provider.
//!
//! Every prompt embeds the user's profile and the rule-based analysis, then
//! asks for a single JSON object in a fixed shape. The response parsers in
//! `analysis_provider` accept both camelCase and snake_case field names.

use crate::domain::models::{
    ExerciseSession, PlateauDetection, ProgressionAnalysis, UserProgressionProfile, WorkoutContext,
};

/// Sessions of history included per exercise.
pub const PROMPT_HISTORY_SESSIONS: usize = 5;

pub fn format_profile_for_prompt(profile: &UserProgressionProfile) -> String {
    let metrics = &profile.personal_metrics;
    let prefs = &profile.progression_preferences;

    let mut output = format!("Experience: {}\n", metrics.experience_level.as_str());
    output.push_str(&format!(
        "Training frequency: {} sessions/week\n",
        metrics.training_frequency
    ));
    if let Some(bodyweight) = metrics.bodyweight_kg {
        output.push_str(&format!("Bodyweight: {}\n", format_weight(bodyweight)));
    }
    if let Some(age) = metrics.age {
        output.push_str(&format!("Age: {age}\n"));
    }
    output.push_str(&format!("Progression style: {}\n", prefs.style.as_str()));
    output.push_str(&format!(
        "Preferred rep range: {}-{}\n",
        prefs.preferred_rep_min, prefs.preferred_rep_max
    ));
    output
}

pub fn format_analysis_for_prompt(analysis: &ProgressionAnalysis) -> String {
    let mut output = format!("Exercise: {}\n", analysis.exercise_id);
    output.push_str(&format!(
        "Current: {} x {} reps x {} sets\n",
        format_weight(analysis.current_weight),
        analysis.current_reps,
        analysis.current_sets
    ));
    output.push_str(&format!(
        "Trend: {} ({:+.2} kg/week)\n",
        analysis.progression_trend.as_str(),
        analysis.progression_rate
    ));
    output.push_str(&format!("Sessions analyzed: {}\n", analysis.total_sessions));
    output.push_str(&format!(
        "Rule-based confidence: {:.2}\n",
        analysis.confidence_level
    ));
    if let Some(date) = analysis.last_progress_date {
        output.push_str(&format!("Last progress: {}\n", date.format("%Y-%m-%d")));
    }
    output
}

fn format_history_for_prompt(sessions: &[ExerciseSession]) -> String {
    if sessions.is_empty() {
        return "  (no recent sessions)\n".to_string();
    }
    sessions
        .iter()
        .take(PROMPT_HISTORY_SESSIONS)
        .map(|session| {
            let sets = session
                .sets
                .iter()
                .map(|set| format!("{} x {}", format_weight(set.weight), set.reps))
                .collect::<Vec<_>>()
                .join(", ");
            format!("  * {}: {}\n", session.timestamp.format("%Y-%m-%d"), sets)
        })
        .collect::<Vec<_>>()
        .join("")
}

fn format_weight(weight: f64) -> String {
    if weight.fract().abs() > f64::EPSILON {
        format!("{weight:.1}kg")
    } else {
        format!("{weight:.0}kg")
    }
}

pub fn build_progression_prompt(
    analysis: &ProgressionAnalysis,
    profile: &UserProgressionProfile,
    recent_history: &[ExerciseSession],
) -> String {
    format!(
        r#"You are a strength coach reviewing one lifter's progress on a single exercise.

LIFTER PROFILE:
{}
RULE-BASED ANALYSIS:
{}
RECENT SESSIONS (newest first):
{}
RULES:
1. Barbell increments are 2.5kg, dumbbell and isolation increments 1kg
2. Never suggest more than a 10% jump over the current weight
3. Prefer adding reps before weight when the lifter is below their preferred rep range
4. If performance is declining, suggest a deload

OUTPUT FORMAT:
Return ONLY a JSON object with this exact structure:
{{
    "suggestedWeight": 62.5,
    "suggestedReps": 8,
    "suggestedSets": 3,
    "progressionType": "weight",
    "reasoning": "one or two sentences",
    "confidence": 0.8,
    "tips": ["short tip"],
    "riskNotes": ["short caution"]
}}
"progressionType" is one of "weight", "reps", "deload". "confidence" is between 0 and 1."#,
        format_profile_for_prompt(profile),
        format_analysis_for_prompt(analysis),
        format_history_for_prompt(recent_history),
    )
}

pub fn build_batch_progression_prompt(
    analyses: &[ProgressionAnalysis],
    profile: &UserProgressionProfile,
) -> String {
    let exercises = analyses
        .iter()
        .map(format_analysis_for_prompt)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a strength coach planning the next session's loads for several exercises.

LIFTER PROFILE:
{}
RULE-BASED ANALYSIS PER EXERCISE:
{}
RULES:
1. Return one entry per exercise, using the exercise name exactly as given
2. Never suggest more than a 10% jump over the current weight
3. If performance is declining, suggest a deload

OUTPUT FORMAT:
Return ONLY a JSON object with this exact structure:
{{
    "suggestions": [
        {{
            "exerciseId": "Exercise Name",
            "suggestedWeight": 62.5,
            "suggestedReps": 8,
            "suggestedSets": 3,
            "progressionType": "weight",
            "reasoning": "one sentence",
            "confidence": 0.8,
            "tips": [],
            "riskNotes": []
        }}
    ]
}}"#,
        format_profile_for_prompt(profile),
        exercises,
    )
}

pub fn build_plateau_prompt(
    plateau: &PlateauDetection,
    profile: &UserProgressionProfile,
    recent_history: &[ExerciseSession],
) -> String {
    let stagnant = [
        ("weight", plateau.stagnant_metrics.weight),
        ("reps", plateau.stagnant_metrics.reps),
        ("volume", plateau.stagnant_metrics.volume),
    ]
    .iter()
    .filter(|(_, stagnant)| *stagnant)
    .map(|(name, _)| *name)
    .collect::<Vec<_>>()
    .join(", ");

    format!(
        r#"You are a strength coach helping a lifter break through a training plateau.

LIFTER PROFILE:
{}
PLATEAU:
Exercise: {}
Type: {} plateau, {} severity
Duration: {} sessions without progress
Stagnant metrics: {}
Current: {} x {} reps x {} sets

RECENT SESSIONS (newest first):
{}
OUTPUT FORMAT:
Return ONLY a JSON object with this exact structure:
{{
    "interventions": [
        {{
            "type": "deload",
            "priority": "high",
            "title": "short title",
            "description": "what to do",
            "reasoning": "why it helps this lifter",
            "expectedOutcome": "what should happen",
            "confidence": 0.8,
            "effectiveness": 0.75
        }}
    ]
}}
"type" is one of "deload", "rep_range_modification", "volume_increase", "exercise_variation", "technique_focus", "rest_optimization", "frequency_change", "periodization", "exercise_substitution". "priority" is "low", "medium" or "high"."#,
        format_profile_for_prompt(profile),
        plateau.exercise_id,
        plateau.plateau_type.as_str(),
        plateau.severity.as_str(),
        plateau.plateau_duration,
        stagnant,
        format_weight(plateau.current_weight),
        plateau.current_reps,
        plateau.current_sets,
        format_history_for_prompt(recent_history),
    )
}

pub fn build_workout_plan_prompt(
    analyses: &[ProgressionAnalysis],
    profile: &UserProgressionProfile,
    context: &WorkoutContext,
) -> String {
    let exercises = analyses
        .iter()
        .map(format_analysis_for_prompt)
        .collect::<Vec<_>>()
        .join("\n");
    let time = context
        .available_minutes
        .map_or_else(|| "not specified".to_string(), |m| format!("{m} minutes"));
    let focus = context.focus.as_deref().unwrap_or("balanced");

    format!(
        r#"You are a strength coach writing the lifter's next workout.

LIFTER PROFILE:
{}
TRAINING HISTORY BY EXERCISE:
{}
CONSTRAINTS:
- At most {} exercises
- Time available: {}
- Focus: {}
- Use exercises from the training history where possible

OUTPUT FORMAT:
Return ONLY a JSON object with this exact structure:
{{
    "exercises": [
        {{
            "exerciseName": "Exercise Name",
            "sets": 3,
            "reps": 8,
            "weight": 60.0,
            "restSeconds": 120,
            "notes": "RPE 8"
        }}
    ]
}}"#,
        format_profile_for_prompt(profile),
        exercises,
        context.max_exercises,
        time,
        focus,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ProgressionTrend, SetRecord};
    use chrono::{TimeZone, Utc};

    fn analysis() -> ProgressionAnalysis {
        ProgressionAnalysis {
            current_weight: 62.5,
            current_reps: 8,
            current_sets: 3,
            progression_trend: ProgressionTrend::Improving,
            progression_rate: 1.25,
            confidence_level: 0.75,
            total_sessions: 8,
            ..ProgressionAnalysis::empty("Bench Press")
        }
    }

    #[test]
    fn test_progression_prompt_embeds_context() {
        let profile = UserProgressionProfile::new("u1", Utc::now());
        let session = ExerciseSession::new(
            "Bench Press",
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            vec![SetRecord::new(62.5, 8)],
        );
        let prompt = build_progression_prompt(&analysis(), &profile, &[session]);

        assert!(prompt.contains("Exercise: Bench Press"));
        assert!(prompt.contains("Current: 62.5kg x 8 reps x 3 sets"));
        assert!(prompt.contains("Trend: improving (+1.25 kg/week)"));
        assert!(prompt.contains("2024-03-01: 62.5kg x 8"));
        assert!(prompt.contains("\"suggestedWeight\""));
    }

    #[test]
    fn test_workout_plan_prompt_constraints() {
        let profile = UserProgressionProfile::new("u1", Utc::now());
        let context = WorkoutContext {
            max_exercises: 4,
            available_minutes: Some(45),
            focus: None,
        };
        let prompt = build_workout_plan_prompt(&[analysis()], &profile, &context);

        assert!(prompt.contains("At most 4 exercises"));
        assert!(prompt.contains("Time available: 45 minutes"));
        assert!(prompt.contains("Focus: balanced"));
    }

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(60.0), "60kg");
        assert_eq!(format_weight(62.5), "62.5kg");
    }
}
