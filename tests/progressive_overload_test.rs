//! Integration tests for the progressive overload service.
//!
//! Runs the service over in-memory SQLite with a manual clock and, where a
//! provider is involved, a scripted text generator.

mod common;

use chrono::Duration;
use common::{progression_reply, provider_config, Harness};
use overload::adapters::generators::{MockReply, MockTextGenerator};
use overload::domain::models::{
    AiSuggestionsDocument, AlertStatus, FallbackReason, InteractionAction, PlateauSeverity,
    SetRecord, WorkoutContext, WorkoutLog, WorkoutSuggestionSource,
};
use overload::domain::ports::{
    AnalyticsRepository, Clock, ProfileRepository, SuggestionStore, WorkoutRepository,
};
use serde_json::json;

const USER: &str = "lifter-1";

fn names(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| (*s).to_string()).collect()
}

// ============================================================================
// Progression suggestions
// ============================================================================

#[tokio::test]
async fn test_rules_only_progression() {
    let h = Harness::rules_only().await;
    h.log_progression(USER, "Squat", &[100.0, 102.5, 105.0], 5).await;

    let result = h.service.calculate_next_progression(USER, "Squat").await.unwrap();

    assert!(!result.is_combined());
    assert_eq!(result.exercise_id(), "Squat");
    assert_eq!(result.fallback_reason(), None);
    assert!(result.suggestion().suggested_weight >= 105.0);

    let analytics = h.analytics.get(USER, "Squat").await.unwrap().unwrap();
    assert_eq!(analytics.suggestions_generated, 1);
}

#[tokio::test]
async fn test_provider_result_is_combined_and_cached() {
    let h = Harness::with_generator(
        MockTextGenerator::new(progression_reply(107.5, 0.8)),
        &provider_config(),
    )
    .await;
    h.log_progression(USER, "Squat", &[100.0, 102.5, 105.0], 5).await;

    let first = h.service.calculate_next_progression(USER, "Squat").await.unwrap();
    assert!(first.is_combined());
    assert_eq!(h.generator.call_count(), 1);

    let second = h.service.calculate_next_progression(USER, "Squat").await.unwrap();
    assert!(second.is_combined());
    assert_eq!(h.generator.call_count(), 1);

    let profile = h.profiles.get(USER).await.unwrap().unwrap();
    assert_eq!(profile.ai_model_data.provider_suggestions_served, 1);
}

#[tokio::test]
async fn test_disabled_provider_tags_fallback() {
    let h = Harness::with_generator(
        MockTextGenerator::new(progression_reply(107.5, 0.8)),
        &provider_config(),
    )
    .await;
    h.log_progression(USER, "Squat", &[100.0, 102.5, 105.0], 5).await;
    h.provider.as_ref().unwrap().set_kill_switch(true);

    let result = h.service.calculate_next_progression(USER, "Squat").await.unwrap();

    assert!(!result.is_combined());
    assert_eq!(result.fallback_reason(), Some(FallbackReason::Disabled));
    assert_eq!(h.generator.call_count(), 0);
}

#[tokio::test]
async fn test_provider_failure_falls_back_to_rules() {
    let h = Harness::with_generator(MockTextGenerator::replying("not json at all"), &provider_config()).await;
    h.log_progression(USER, "Squat", &[100.0, 102.5, 105.0], 5).await;

    let result = h.service.calculate_next_progression(USER, "Squat").await.unwrap();

    assert_eq!(result.fallback_reason(), Some(FallbackReason::ProviderError));
    let profile = h.profiles.get(USER).await.unwrap().unwrap();
    assert_eq!(profile.ai_model_data.fallback_suggestions_served, 1);
}

#[tokio::test]
async fn test_exercise_without_history_skips_provider() {
    let h = Harness::with_generator(
        MockTextGenerator::new(progression_reply(107.5, 0.8)),
        &provider_config(),
    )
    .await;

    let result = h.service.calculate_next_progression(USER, "Deadlift").await.unwrap();

    assert!(!result.is_combined());
    assert_eq!(result.fallback_reason(), None);
    assert_eq!(h.generator.call_count(), 0);
}

#[tokio::test]
async fn test_batch_keeps_input_order_and_fills_gaps() {
    let reply = MockReply::json(&json!({
        "suggestions": [
            { "exerciseId": "Squat", "suggestedWeight": 107.5, "confidence": 0.8 }
        ]
    }));
    let h = Harness::with_generator(MockTextGenerator::new(reply), &provider_config()).await;
    h.log_progression(USER, "Squat", &[100.0, 102.5, 105.0], 5).await;
    h.log_progression(USER, "Bench Press", &[60.0, 62.5, 65.0], 8).await;

    let results = h
        .service
        .calculate_batch_progressions(USER, &names(&["Bench Press", "Squat", "Deadlift"]))
        .await
        .unwrap();

    let order: Vec<&str> = results.iter().map(|r| r.exercise_id()).collect();
    assert_eq!(order, ["Bench Press", "Squat", "Deadlift"]);
    assert_eq!(results[0].fallback_reason(), Some(FallbackReason::ProviderError));
    assert!(results[1].is_combined());
    assert_eq!(results[2].fallback_reason(), None);
    assert_eq!(h.generator.call_count(), 1);
}

#[tokio::test]
async fn test_batch_reuses_cached_results() {
    let h = Harness::rules_only().await;
    h.log_progression(USER, "Squat", &[100.0, 102.5, 105.0], 5).await;

    h.service.calculate_next_progression(USER, "Squat").await.unwrap();
    let batch = h
        .service
        .calculate_batch_progressions(USER, &names(&["Squat", "Squat"]))
        .await
        .unwrap();

    assert_eq!(batch.len(), 2);
    assert!(batch.iter().all(|r| r.exercise_id() == "Squat"));
    let analytics = h.analytics.get(USER, "Squat").await.unwrap().unwrap();
    assert_eq!(analytics.suggestions_generated, 1);
}

// ============================================================================
// Plateaus
// ============================================================================

#[tokio::test]
async fn test_plateau_detection_needs_three_completed_workouts() {
    let h = Harness::rules_only().await;
    h.log_progression(USER, "Bench Press", &[80.0, 80.0], 8).await;
    assert!(h.service.detect_plateaus(USER).await.unwrap().is_empty());

    let mut incomplete = WorkoutLog::new(USER, h.clock.now() - Duration::hours(2))
        .with_exercise("Bench Press", vec![SetRecord::new(80.0, 8); 3]);
    incomplete.completed = false;
    h.workouts.save(&incomplete).await.unwrap();
    assert!(h.service.detect_plateaus(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_plateau_detected_and_frequency_recorded() {
    let h = Harness::rules_only().await;
    h.log_progression(USER, "Bench Press", &[80.0, 80.0, 80.0], 8).await;
    h.log_progression(USER, "Squat", &[100.0, 105.0, 110.0], 5).await;

    let plateaus = h.service.detect_plateaus(USER).await.unwrap();

    assert_eq!(plateaus.len(), 1);
    assert_eq!(plateaus[0].exercise_id, "Bench Press");
    assert_eq!(plateaus[0].severity, PlateauSeverity::Mild);
    assert_eq!(plateaus[0].plateau_duration, 3);

    let profile = h.profiles.get(USER).await.unwrap().unwrap();
    assert!((profile.performance_metrics.plateau_frequency - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_rule_interventions_without_user() {
    let h = Harness::rules_only().await;
    h.log_progression(USER, "Bench Press", &[80.0, 80.0, 80.0], 8).await;
    let plateau = h.service.detect_plateaus(USER).await.unwrap().remove(0);

    let interventions = h.service.suggest_plateau_interventions(&plateau, None).await;

    assert!(!interventions.is_empty());
    assert!(interventions
        .windows(2)
        .all(|pair| pair[0].priority >= pair[1].priority));
}

#[tokio::test]
async fn test_notifications_are_created_once_per_open_plateau() {
    let h = Harness::rules_only().await;
    h.log_progression(USER, "Bench Press", &[80.0, 80.0, 80.0], 8).await;
    let plateaus = h.service.detect_plateaus(USER).await.unwrap();

    let created = h.service.create_plateau_warning_notifications(USER, &plateaus).await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].exercise_id, "Bench Press");
    assert!(!created[0].interventions.is_empty());

    let again = h.service.create_plateau_warning_notifications(USER, &plateaus).await;
    assert!(again.is_empty());
    assert_eq!(h.service.plateau_alerts(USER).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_notifications_respect_daily_cap() {
    let h = Harness::rules_only().await;
    h.log_progression(USER, "Bench Press", &[80.0, 80.0, 80.0], 8).await;
    h.log_progression(USER, "Barbell Row", &[60.0, 60.0, 60.0], 10).await;

    let mut document = AiSuggestionsDocument::default();
    document.notification_settings.max_daily_reminders = 1;
    h.suggestions.save(USER, &document).await.unwrap();

    let plateaus = h.service.detect_plateaus(USER).await.unwrap();
    assert_eq!(plateaus.len(), 2);

    let created = h.service.create_plateau_warning_notifications(USER, &plateaus).await;
    assert_eq!(created.len(), 1);

    // next UTC day the cap starts over
    h.clock.advance(Duration::days(1));
    let created = h.service.create_plateau_warning_notifications(USER, &plateaus).await;
    assert_eq!(created.len(), 1);
    let mut exercises: Vec<String> = h
        .service
        .plateau_alerts(USER)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.exercise_id)
        .collect();
    exercises.sort();
    assert_eq!(exercises, ["Barbell Row", "Bench Press"]);
}

#[tokio::test]
async fn test_notifications_respect_plateau_tolerance() {
    let h = Harness::rules_only().await;
    h.log_progression(USER, "Bench Press", &[80.0, 80.0, 80.0], 8).await;

    let mut profile = h.service.load_profile(USER).await;
    profile.progression_preferences.plateau_tolerance = 4;
    h.profiles.save(&profile).await.unwrap();

    let plateaus = h.service.detect_plateaus(USER).await.unwrap();
    let created = h.service.create_plateau_warning_notifications(USER, &plateaus).await;
    assert!(created.is_empty());
}

#[tokio::test]
async fn test_acknowledge_and_dismiss_alerts() {
    let h = Harness::rules_only().await;
    h.log_progression(USER, "Bench Press", &[80.0, 80.0, 80.0], 8).await;
    h.log_progression(USER, "Barbell Row", &[60.0, 60.0, 60.0], 10).await;
    let plateaus = h.service.detect_plateaus(USER).await.unwrap();
    let created = h.service.create_plateau_warning_notifications(USER, &plateaus).await;
    assert_eq!(created.len(), 2);

    let active = h.service.active_plateau_alerts(USER).await.unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|a| a.show_count == 1));

    assert!(h.service.acknowledge_plateau_alert(USER, &created[0].id).await.unwrap());
    assert!(h
        .service
        .dismiss_plateau_alert(USER, &created[1].id, Some("deload planned".to_string()))
        .await
        .unwrap());
    assert!(!h.service.acknowledge_plateau_alert(USER, "missing").await.unwrap());

    let alerts = h.service.plateau_alerts(USER).await.unwrap();
    let by_id = |id: &str| alerts.iter().find(|a| a.id == id).unwrap();
    assert_eq!(by_id(&created[0].id).status, AlertStatus::Acknowledged);
    let dismissed = by_id(&created[1].id);
    assert_eq!(dismissed.status, AlertStatus::Dismissed);
    assert_eq!(dismissed.dismiss_reason.as_deref(), Some("deload planned"));

    assert!(h.service.active_plateau_alerts(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_completed_workout_resolves_recovered_alert() {
    let h = Harness::rules_only().await;
    h.log_progression(USER, "Bench Press", &[80.0, 80.0, 80.0], 8).await;
    let plateaus = h.service.detect_plateaus(USER).await.unwrap();
    h.service.create_plateau_warning_notifications(USER, &plateaus).await;
    h.service.calculate_next_progression(USER, "Bench Press").await.unwrap();

    let breakthrough = WorkoutLog::new(USER, h.clock.now())
        .with_exercise("Bench Press", vec![SetRecord::new(85.0, 8); 3]);
    h.workouts.save(&breakthrough).await.unwrap();

    let resolved = h
        .service
        .handle_workout_completed(USER, &names(&["Bench Press"]))
        .await
        .unwrap();

    assert_eq!(resolved, 1);
    let alerts = h.service.plateau_alerts(USER).await.unwrap();
    assert_eq!(alerts[0].status, AlertStatus::Resolved);
    assert!(h.cache.get(USER, "Bench Press").await.unwrap().is_none());
}

#[tokio::test]
async fn test_completed_workout_keeps_alert_while_plateaued() {
    let h = Harness::rules_only().await;
    h.log_progression(USER, "Bench Press", &[80.0, 80.0, 80.0], 8).await;
    let plateaus = h.service.detect_plateaus(USER).await.unwrap();
    h.service.create_plateau_warning_notifications(USER, &plateaus).await;

    let same_again = WorkoutLog::new(USER, h.clock.now())
        .with_exercise("Bench Press", vec![SetRecord::new(80.0, 8); 3]);
    h.workouts.save(&same_again).await.unwrap();

    let resolved = h
        .service
        .handle_workout_completed(USER, &names(&["Bench Press"]))
        .await
        .unwrap();

    assert_eq!(resolved, 0);
    assert!(h.service.plateau_alerts(USER).await.unwrap()[0].is_active());
}

// ============================================================================
// Interactions
// ============================================================================

#[tokio::test]
async fn test_tracking_updates_every_store() {
    let h = Harness::rules_only().await;
    h.log_progression(USER, "Squat", &[100.0, 102.5, 105.0], 5).await;
    h.service.calculate_next_progression(USER, "Squat").await.unwrap();
    assert!(h.cache.get(USER, "Squat").await.unwrap().is_some());

    h.service
        .track_suggestion_interaction(USER, "Squat", InteractionAction::Viewed, json!({}))
        .await;
    h.service
        .track_suggestion_interaction(USER, "Squat", InteractionAction::Accepted, json!({ "weight": 107.5 }))
        .await;

    let document = h.suggestions.load(USER).await.unwrap().unwrap();
    assert_eq!(document.interactions.len(), 2);
    assert_eq!(document.interactions[1].metadata["weight"], 107.5);

    let profile = h.profiles.get(USER).await.unwrap().unwrap();
    assert_eq!(profile.performance_metrics.suggestions_shown, 1);
    assert_eq!(profile.performance_metrics.suggestions_accepted, 1);

    let analytics = h.analytics.get(USER, "Squat").await.unwrap().unwrap();
    assert_eq!(analytics.accepted, 1);

    assert!(h.cache.get(USER, "Squat").await.unwrap().is_none());
}

#[tokio::test]
async fn test_effectiveness_from_logged_responses() {
    let h = Harness::rules_only().await;
    for _ in 0..4 {
        h.service
            .track_suggestion_interaction(USER, "Squat", InteractionAction::Accepted, json!({}))
            .await;
    }
    h.service
        .track_suggestion_interaction(USER, "Squat", InteractionAction::Dismissed, json!({}))
        .await;
    h.service
        .track_suggestion_interaction(USER, "Squat", InteractionAction::Viewed, json!({}))
        .await;

    let stats = h.service.suggestion_effectiveness(USER).await.unwrap();

    assert_eq!(stats.total_suggestions, 5);
    assert_eq!(stats.accepted, 4);
    assert_eq!(stats.dismissed, 1);
    assert!((stats.acceptance_rate - 0.8).abs() < 1e-9);
    assert!((stats.effectiveness_score - 0.635).abs() < 1e-9);
    assert!(stats.recommendations.is_empty());
}

// ============================================================================
// Workout suggestions
// ============================================================================

#[tokio::test]
async fn test_rule_workout_starts_with_least_recent_exercise() {
    let h = Harness::rules_only().await;
    let now = h.clock.now();
    let squat = WorkoutLog::new(USER, now - Duration::days(10))
        .with_exercise("Squat", vec![SetRecord::new(100.0, 5); 3]);
    let bench = WorkoutLog::new(USER, now - Duration::days(2))
        .with_exercise("Bench Press", vec![SetRecord::new(60.0, 8); 3]);
    h.workouts.save(&squat).await.unwrap();
    h.workouts.save(&bench).await.unwrap();

    let plan = h
        .service
        .generate_workout_suggestions(USER, &WorkoutContext::default())
        .await
        .unwrap();

    let order: Vec<&str> = plan.iter().map(|s| s.exercise_name.as_str()).collect();
    assert_eq!(order, ["Squat", "Bench Press"]);
    assert!(plan.iter().all(|s| s.source == WorkoutSuggestionSource::RuleBased));
}

#[tokio::test]
async fn test_workout_without_history_uses_template() {
    let h = Harness::rules_only().await;
    let context = WorkoutContext {
        max_exercises: 2,
        ..WorkoutContext::default()
    };

    let plan = h.service.generate_workout_suggestions(USER, &context).await.unwrap();

    assert_eq!(plan.len(), 2);
    assert!(plan.iter().all(|s| s.weight > 0.0));
}

#[tokio::test]
async fn test_provider_workout_plan() {
    let reply = MockReply::json(&json!({
        "exercises": [
            { "exerciseName": "Squat", "sets": 5, "reps": 5, "weight": 105, "restSeconds": 180 },
            { "exerciseName": "Bench Press", "sets": 3, "reps": 8, "weight": 62.5 },
            { "exerciseName": "Pull Up", "sets": 3, "reps": 8, "weight": 0 }
        ]
    }));
    let h = Harness::with_generator(MockTextGenerator::new(reply), &provider_config()).await;
    h.log_progression(USER, "Squat", &[100.0, 102.5], 5).await;
    let context = WorkoutContext {
        max_exercises: 2,
        ..WorkoutContext::default()
    };

    let plan = h.service.generate_workout_suggestions(USER, &context).await.unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].exercise_name, "Squat");
    assert_eq!(plan[0].source, WorkoutSuggestionSource::Provider);
}
