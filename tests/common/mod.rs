//! Shared fixtures for integration tests.
//!
//! Builds the progressive overload service over an in-memory SQLite
//! database, a manual clock, and a scripted text generator.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use overload::adapters::cache::{MemoryKeyValueStore, SuggestionCache};
use overload::adapters::generators::{MockReply, MockTextGenerator};
use overload::adapters::sqlite::{
    create_migrated_test_pool, SqliteAnalyticsRepository, SqliteProfileRepository,
    SqliteSuggestionStore, SqliteWorkoutRepository,
};
use overload::domain::models::{Config, ExerciseSession, ProgressionAnalysis, SetRecord, WorkoutLog};
use overload::domain::ports::{Clock, ManualClock, WorkoutRepository};
use overload::services::progression_engine::analyze_sessions;
use overload::services::{AnalysisProviderClient, OverloadRepositories, ProgressiveOverloadService};
use serde_json::json;

/// Monday 2024-03-04 09:00 UTC.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
}

/// Provider enabled, no pacing, no retries, short timeout.
pub fn provider_config() -> Config {
    let mut config = Config::default();
    config.ai.enabled = true;
    config.ai.request_timeout_ms = 200;
    config.limits.min_request_interval_ms = 0;
    config.limits.max_requests_per_hour = 100;
    config.limits.max_requests_per_user_per_day = 100;
    config.limits.max_requests_per_day = 100;
    config.retry.max_retries = 0;
    config.retry.initial_backoff_ms = 1;
    config.retry.max_backoff_ms = 1;
    config
}

/// Sessions two days apart, oldest first, three sets each.
pub fn sessions(exercise: &str, weights: &[f64], reps: u32) -> Vec<ExerciseSession> {
    weights
        .iter()
        .enumerate()
        .map(|(i, &weight)| {
            let at = start() - Duration::days(2 * (weights.len() - i) as i64);
            ExerciseSession::new(exercise, at, vec![SetRecord::new(weight, reps); 3])
        })
        .collect()
}

pub fn analysis(exercise: &str, weights: &[f64], reps: u32) -> ProgressionAnalysis {
    analyze_sessions(exercise, &sessions(exercise, weights, reps))
}

pub fn progression_reply(weight: f64, confidence: f64) -> MockReply {
    MockReply::json(&json!({
        "suggestedWeight": weight,
        "suggestedReps": 5,
        "suggestedSets": 3,
        "progressionType": "weight",
        "reasoning": "Bar speed looked good last session.",
        "confidence": confidence,
        "tips": ["Film your top set"],
        "riskNotes": []
    }))
}

pub struct Harness {
    pub service: ProgressiveOverloadService,
    pub clock: Arc<ManualClock>,
    pub generator: Arc<MockTextGenerator>,
    pub workouts: Arc<SqliteWorkoutRepository>,
    pub suggestions: Arc<SqliteSuggestionStore>,
    pub profiles: Arc<SqliteProfileRepository>,
    pub analytics: Arc<SqliteAnalyticsRepository>,
    pub cache: Arc<SuggestionCache>,
    pub provider: Option<AnalysisProviderClient>,
}

impl Harness {
    /// Rule-only service: no provider attached.
    pub async fn rules_only() -> Self {
        Self::build(None, &Config::default()).await
    }

    pub async fn with_generator(generator: MockTextGenerator, config: &Config) -> Self {
        Self::build(Some(generator), config).await
    }

    async fn build(generator: Option<MockTextGenerator>, config: &Config) -> Self {
        let pool = create_migrated_test_pool().await.unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();

        let workouts = Arc::new(SqliteWorkoutRepository::new(pool.clone()));
        let suggestions = Arc::new(SqliteSuggestionStore::new(pool.clone()));
        let profiles = Arc::new(SqliteProfileRepository::new(pool.clone()));
        let analytics = Arc::new(SqliteAnalyticsRepository::new(pool));
        let cache = Arc::new(SuggestionCache::with_ttl(
            Arc::new(MemoryKeyValueStore::new()),
            dyn_clock.clone(),
            config.cache.suggestion_ttl_secs,
        ));

        let repos = OverloadRepositories {
            workouts: workouts.clone(),
            suggestions: suggestions.clone(),
            profiles: profiles.clone(),
            analytics: analytics.clone(),
        };
        let mut service =
            ProgressiveOverloadService::new(repos, cache.clone(), dyn_clock.clone(), config.analysis.clone());

        let has_generator = generator.is_some();
        let generator = Arc::new(generator.unwrap_or_default());
        let provider = has_generator
            .then(|| AnalysisProviderClient::new(generator.clone(), dyn_clock, config));
        if let Some(provider) = &provider {
            service = service.with_provider(provider.clone());
        }

        Self {
            service,
            clock,
            generator,
            workouts,
            suggestions,
            profiles,
            analytics,
            cache,
            provider,
        }
    }

    /// Log one completed workout per weight, two days apart, ending a day
    /// before the clock's current time.
    pub async fn log_progression(&self, user: &str, exercise: &str, weights: &[f64], reps: u32) {
        let now = self.clock.now();
        for (i, &weight) in weights.iter().enumerate() {
            let at = now - Duration::days(1 + 2 * (weights.len() - 1 - i) as i64);
            let workout = WorkoutLog::new(user, at).with_exercise(exercise, vec![SetRecord::new(weight, reps); 3]);
            self.workouts.save(&workout).await.unwrap();
        }
    }
}
