//! Progressive overload service.
//!
//! Coordinates the rule engine, the analysis provider, the suggestion cache,
//! and persistence. Essential reads (workout history, alert documents) return
//! their errors; bookkeeping writes (cache, analytics, profile counters) are
//! logged and swallowed. Provider failures never surface: they arrive here
//! already converted into rule-based fallbacks.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::adapters::cache::SuggestionCache;
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    group_sessions_by_exercise, sessions_for_exercise, sort_interventions, AiSuggestionsDocument,
    AnalysisConfig, ExerciseAnalytics, ExerciseSession, FallbackReason, InteractionAction,
    InterventionSuggestion, PlateauAlert, PlateauDetection, ProgressionAnalysis,
    ProgressionSuggestion, ProviderSuggestion, SuggestionEffectiveness, SuggestionInteraction,
    SuggestionResult, UserProgressionProfile, WorkoutContext, WorkoutLog, WorkoutSuggestion,
};
use crate::domain::ports::{
    AnalyticsRepository, Clock, ProfileRepository, SuggestionStore, WorkoutRepository,
};
use crate::services::analysis_provider::{AnalysisProviderClient, ProviderResponse};
use crate::services::interventions::generate_interventions;
use crate::services::plateau_detector::detect_plateau;
use crate::services::progression_engine::{
    analyze_sessions, generate_progression_suggestion, sort_newest_first,
};
use crate::services::suggestion_merge::{enhanced_fallback, merge_interventions, merge_suggestions};
use crate::services::workout_planner::rule_based_workout;

/// Responses needed before the acceptance rate is trusted.
const MIN_EFFECTIVENESS_SAMPLE: u64 = 5;

/// Responses at which the sample-size component of effectiveness saturates.
const EFFECTIVENESS_SAMPLE_TARGET: f64 = 20.0;

const LOW_ACCEPTANCE: f64 = 0.3;
const HIGH_ACCEPTANCE: f64 = 0.8;

/// Persistence ports the service reads and writes.
#[derive(Clone)]
pub struct OverloadRepositories {
    pub workouts: Arc<dyn WorkoutRepository>,
    pub suggestions: Arc<dyn SuggestionStore>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
}

pub struct ProgressiveOverloadService {
    repos: OverloadRepositories,
    cache: Arc<SuggestionCache>,
    provider: Option<AnalysisProviderClient>,
    clock: Arc<dyn Clock>,
    analysis: AnalysisConfig,
}

impl ProgressiveOverloadService {
    pub fn new(
        repos: OverloadRepositories,
        cache: Arc<SuggestionCache>,
        clock: Arc<dyn Clock>,
        analysis: AnalysisConfig,
    ) -> Self {
        Self {
            repos,
            cache,
            provider: None,
            clock,
            analysis,
        }
    }

    /// Attach the analysis provider. Without one every result is rule-based.
    pub fn with_provider(mut self, provider: AnalysisProviderClient) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn provider(&self) -> Option<&AnalysisProviderClient> {
        self.provider.as_ref()
    }

    pub fn cache(&self) -> &SuggestionCache {
        &self.cache
    }

    // ========================================================================
    // History and analysis
    // ========================================================================

    async fn load_history(&self, user_id: &str, limit: u32) -> DomainResult<Vec<WorkoutLog>> {
        self.repos
            .workouts
            .recent(user_id, limit)
            .await
            .inspect_err(|e| warn!(user_id, error = %e, "Failed to load workout history"))
    }

    /// Progression analysis for every exercise in the user's recent history,
    /// in first-seen order.
    #[instrument(skip(self))]
    pub async fn analyze_workout_history(&self, user_id: &str) -> DomainResult<Vec<ProgressionAnalysis>> {
        let workouts = self.load_history(user_id, self.analysis.history_limit).await?;
        Ok(group_sessions_by_exercise(&workouts)
            .into_iter()
            .map(|(exercise, sessions)| analyze_sessions(&exercise, &sessions))
            .collect())
    }

    /// Analysis of one exercise. Zero-valued when the exercise has no history.
    #[instrument(skip(self))]
    pub async fn analyze_exercise_history(
        &self,
        user_id: &str,
        exercise_id: &str,
    ) -> DomainResult<ProgressionAnalysis> {
        let workouts = self.load_history(user_id, self.analysis.history_limit).await?;
        let sessions = sessions_for_exercise(&workouts, exercise_id);
        Ok(analyze_sessions(exercise_id, &sessions))
    }

    // ========================================================================
    // Progression suggestions
    // ========================================================================

    /// Next-session suggestion for one exercise.
    ///
    /// Served from cache when fresh. Otherwise the rule engine runs, the
    /// provider is consulted when enabled, and the merged or fallback result
    /// is cached.
    #[instrument(skip(self))]
    pub async fn calculate_next_progression(
        &self,
        user_id: &str,
        exercise_id: &str,
    ) -> DomainResult<SuggestionResult> {
        if let Some(cached) = self.cached(user_id, exercise_id).await {
            debug!(user_id, exercise_id, "Suggestion served from cache");
            return Ok(cached);
        }

        let workouts = self.load_history(user_id, self.analysis.history_limit).await?;
        let mut sessions = sessions_for_exercise(&workouts, exercise_id);
        sort_newest_first(&mut sessions);
        let analysis = analyze_sessions(exercise_id, &sessions);
        let rule = generate_progression_suggestion(&analysis);

        let result = match self.active_provider(&analysis) {
            Ok(provider) => {
                let profile = self.load_profile(user_id).await;
                let response = provider
                    .request_progression_suggestion(user_id, &analysis, &profile, &sessions)
                    .await;
                self.record_provider_outcome(profile, 1, response.is_fallback()).await;
                self.combine(&analysis, rule, response)
            }
            Err(reason) => SuggestionResult::RuleBased(enhanced_fallback(
                &analysis,
                rule,
                reason,
                self.clock.now(),
            )),
        };

        self.remember(user_id, &analysis, &result).await;
        Ok(result)
    }

    /// Suggestions for several exercises, in input order.
    ///
    /// History is loaded once and every uncached exercise with history goes
    /// to the provider in a single call.
    #[instrument(skip(self, exercise_ids), fields(count = exercise_ids.len()))]
    pub async fn calculate_batch_progressions(
        &self,
        user_id: &str,
        exercise_ids: &[String],
    ) -> DomainResult<Vec<SuggestionResult>> {
        let mut cached: HashMap<&str, SuggestionResult> = HashMap::new();
        for exercise_id in exercise_ids {
            if cached.contains_key(exercise_id.as_str()) {
                continue;
            }
            if let Some(result) = self.cached(user_id, exercise_id).await {
                cached.insert(exercise_id.as_str(), result);
            }
        }

        let workouts = self.load_history(user_id, self.analysis.history_limit).await?;
        let mut pending: Vec<ProgressionAnalysis> = Vec::new();
        for exercise_id in exercise_ids {
            let already = cached.contains_key(exercise_id.as_str())
                || pending.iter().any(|a| &a.exercise_id == exercise_id);
            if !already {
                let sessions = sessions_for_exercise(&workouts, exercise_id);
                pending.push(analyze_sessions(exercise_id, &sessions));
            }
        }

        let with_history: Vec<ProgressionAnalysis> =
            pending.iter().filter(|a| a.has_history()).cloned().collect();

        let provider_batch = match self.provider.as_ref() {
            Some(provider) if provider.is_enabled() && !with_history.is_empty() => {
                let profile = self.load_profile(user_id).await;
                let response = provider
                    .request_batch_progressions(user_id, &with_history, &profile)
                    .await;
                let count = u64::try_from(with_history.len()).unwrap_or(u64::MAX);
                self.record_provider_outcome(profile, count, response.is_fallback()).await;
                Some(response)
            }
            _ => None,
        };

        let now = self.clock.now();
        let mut fresh: HashMap<String, SuggestionResult> = HashMap::new();
        for analysis in &pending {
            let rule = generate_progression_suggestion(analysis);
            let result = match (&provider_batch, self.active_provider(analysis)) {
                (_, Err(reason)) => {
                    SuggestionResult::RuleBased(enhanced_fallback(analysis, rule, reason, now))
                }
                (Some(batch), Ok(_)) => match batch.fallback_reason() {
                    Some(reason) => SuggestionResult::RuleBased(enhanced_fallback(
                        analysis,
                        rule,
                        Some(reason),
                        now,
                    )),
                    None => match batch.payload.iter().find(|p| p.exercise_id == analysis.exercise_id) {
                        Some(entry) => self.combine(analysis, rule, ProviderResponse::provider(entry.clone())),
                        None => SuggestionResult::RuleBased(enhanced_fallback(
                            analysis,
                            rule,
                            Some(FallbackReason::ProviderError),
                            now,
                        )),
                    },
                },
                (None, Ok(_)) => {
                    SuggestionResult::RuleBased(enhanced_fallback(analysis, rule, None, now))
                }
            };
            self.remember(user_id, analysis, &result).await;
            fresh.insert(analysis.exercise_id.clone(), result);
        }

        Ok(exercise_ids
            .iter()
            .filter_map(|id| {
                cached
                    .get(id.as_str())
                    .or_else(|| fresh.get(id))
                    .cloned()
            })
            .collect())
    }

    /// The provider to consult for `analysis`, or the fallback reason to tag
    /// the rule result with. Exercises without history skip the provider
    /// and carry no reason.
    fn active_provider(
        &self,
        analysis: &ProgressionAnalysis,
    ) -> Result<&AnalysisProviderClient, Option<FallbackReason>> {
        if !analysis.has_history() {
            return Err(None);
        }
        match self.provider.as_ref() {
            Some(provider) if provider.is_enabled() => Ok(provider),
            Some(_) => Err(Some(FallbackReason::Disabled)),
            None => Err(None),
        }
    }

    fn combine(
        &self,
        analysis: &ProgressionAnalysis,
        rule: ProgressionSuggestion,
        response: ProviderResponse<ProviderSuggestion>,
    ) -> SuggestionResult {
        let now = self.clock.now();
        match (response.fallback_reason(), self.provider.as_ref()) {
            (None, Some(provider)) => SuggestionResult::Combined(merge_suggestions(
                analysis,
                &rule,
                &response.payload,
                provider.blend_priority(),
                provider.hybrid_mode(),
                now,
            )),
            (reason, _) => SuggestionResult::RuleBased(enhanced_fallback(analysis, rule, reason, now)),
        }
    }

    async fn cached(&self, user_id: &str, exercise_id: &str) -> Option<SuggestionResult> {
        self.cache
            .get(user_id, exercise_id)
            .await
            .unwrap_or_else(|e| {
                warn!(user_id, exercise_id, error = %e, "Suggestion cache read failed");
                None
            })
    }

    /// Cache the result and update the exercise analytics document.
    async fn remember(&self, user_id: &str, analysis: &ProgressionAnalysis, result: &SuggestionResult) {
        if let Err(e) = self.cache.set(user_id, &analysis.exercise_id, result).await {
            warn!(user_id, exercise_id = %analysis.exercise_id, error = %e, "Suggestion cache write failed");
        }

        let now = self.clock.now();
        let update = async {
            let mut analytics = self
                .repos
                .analytics
                .get(user_id, &analysis.exercise_id)
                .await?
                .unwrap_or_else(|| ExerciseAnalytics::new(user_id, &analysis.exercise_id, now));
            analytics.record_suggestion(analysis, result.suggestion(), now);
            self.repos.analytics.upsert(&analytics).await
        };
        if let Err(e) = update.await {
            warn!(user_id, exercise_id = %analysis.exercise_id, error = %e, "Analytics update failed");
        }
    }

    // ========================================================================
    // Profiles
    // ========================================================================

    /// The user's profile, created with defaults on first access. Storage
    /// errors yield an unsaved default profile.
    pub async fn load_profile(&self, user_id: &str) -> UserProgressionProfile {
        match self.repos.profiles.get(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                let profile = UserProgressionProfile::new(user_id, self.clock.now());
                if let Err(e) = self.repos.profiles.save(&profile).await {
                    warn!(user_id, error = %e, "Failed to create progression profile");
                }
                profile
            }
            Err(e) => {
                warn!(user_id, error = %e, "Failed to load progression profile");
                UserProgressionProfile::new(user_id, self.clock.now())
            }
        }
    }

    async fn record_provider_outcome(&self, mut profile: UserProgressionProfile, served: u64, fallback: bool) {
        let now = self.clock.now();
        if fallback {
            profile.ai_model_data.fallback_suggestions_served += served;
        } else {
            profile.ai_model_data.provider_suggestions_served += served;
            profile.ai_model_data.last_provider_call = Some(now);
        }
        profile.updated_at = now;
        if let Err(e) = self.repos.profiles.save(&profile).await {
            warn!(user_id = %profile.user_id, error = %e, "Failed to record provider outcome");
        }
    }

    // ========================================================================
    // Plateaus
    // ========================================================================

    /// Plateaued exercises in the user's recent completed workouts. Empty
    /// until enough completed workouts exist.
    #[instrument(skip(self))]
    pub async fn detect_plateaus(&self, user_id: &str) -> DomainResult<Vec<PlateauDetection>> {
        let workouts: Vec<WorkoutLog> = self
            .load_history(user_id, self.analysis.plateau_history_limit)
            .await?
            .into_iter()
            .filter(|w| w.completed)
            .collect();

        if workouts.len() < self.analysis.min_completed_workouts {
            debug!(user_id, completed = workouts.len(), "Not enough completed workouts for plateau detection");
            return Ok(Vec::new());
        }

        let groups = group_sessions_by_exercise(&workouts);
        let analyzed = groups.len();
        let plateaus: Vec<PlateauDetection> = groups
            .into_iter()
            .filter_map(|(exercise, sessions)| detect_plateau(&exercise, &sessions))
            .collect();

        if !plateaus.is_empty() {
            info!(user_id, plateaus = plateaus.len(), analyzed, "Plateaus detected");
        }
        self.record_plateau_frequency(user_id, plateaus.len(), analyzed).await;
        Ok(plateaus)
    }

    #[allow(clippy::cast_precision_loss)]
    async fn record_plateau_frequency(&self, user_id: &str, plateaus: usize, analyzed: usize) {
        if analyzed == 0 {
            return;
        }
        let mut profile = self.load_profile(user_id).await;
        profile.performance_metrics.plateau_frequency = plateaus as f64 / analyzed as f64;
        profile.updated_at = self.clock.now();
        if let Err(e) = self.repos.profiles.save(&profile).await {
            warn!(user_id, error = %e, "Failed to record plateau frequency");
        }
    }

    /// Interventions for a plateau: the rule baseline, merged with provider
    /// interventions when a user is given and the provider is enabled.
    #[instrument(skip(self, plateau), fields(exercise_id = %plateau.exercise_id))]
    pub async fn suggest_plateau_interventions(
        &self,
        plateau: &PlateauDetection,
        user_id: Option<&str>,
    ) -> Vec<InterventionSuggestion> {
        let mut baseline = generate_interventions(plateau);
        sort_interventions(&mut baseline);

        let (Some(user_id), Some(provider)) = (user_id, self.provider.as_ref()) else {
            return baseline;
        };
        if !provider.is_enabled() {
            return baseline;
        }

        let profile = self.load_profile(user_id).await;
        let history = match self.load_history(user_id, self.analysis.history_limit).await {
            Ok(workouts) => {
                let mut sessions = sessions_for_exercise(&workouts, &plateau.exercise_id);
                sort_newest_first(&mut sessions);
                sessions
            }
            Err(_) => Vec::new(),
        };

        let response = provider
            .request_plateau_interventions(user_id, plateau, &profile, &history)
            .await;
        match response.fallback_reason() {
            None => merge_interventions(baseline, response.payload, provider.blend_priority()),
            Some(reason) => {
                debug!(user_id, reason = reason.as_str(), "Using rule-based interventions");
                baseline
            }
        }
    }

    /// Turn plateaus into persisted alerts, subject to the user's
    /// notification settings, plateau tolerance, and daily reminder cap.
    /// Returns the alerts created; storage failures are logged and yield
    /// an empty list.
    #[instrument(skip(self, plateaus), fields(count = plateaus.len()))]
    pub async fn create_plateau_warning_notifications(
        &self,
        user_id: &str,
        plateaus: &[PlateauDetection],
    ) -> Vec<PlateauAlert> {
        match self.try_create_notifications(user_id, plateaus).await {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!(user_id, error = %e, "Failed to create plateau notifications");
                Vec::new()
            }
        }
    }

    async fn try_create_notifications(
        &self,
        user_id: &str,
        plateaus: &[PlateauDetection],
    ) -> DomainResult<Vec<PlateauAlert>> {
        let mut document = self.load_document(user_id).await?;
        let profile = self.load_profile(user_id).await;
        let settings = document.notification_settings.clone();
        let tolerance = profile.progression_preferences.plateau_tolerance;
        let now = self.clock.now();

        let sent_today = document.alerts_created_since(start_of_day(now));
        let mut remaining = usize::try_from(settings.max_daily_reminders)
            .unwrap_or(usize::MAX)
            .saturating_sub(sent_today);

        let mut created = Vec::new();
        for plateau in plateaus {
            if remaining == 0 {
                debug!(user_id, "Daily plateau reminder limit reached");
                break;
            }
            if !settings.allows(plateau.severity) || plateau.plateau_duration < tolerance {
                continue;
            }
            let already_open = document.plateau_alerts.iter().any(|a| {
                a.exercise_id == plateau.exercise_id && a.is_active() && a.severity == plateau.severity
            });
            if already_open {
                continue;
            }

            let interventions = self.suggest_plateau_interventions(plateau, Some(user_id)).await;
            created.push(PlateauAlert::new(plateau, interventions, now));
            remaining -= 1;
        }

        if created.is_empty() {
            return Ok(created);
        }

        document.merge_alerts(created.clone());
        document.updated_at = Some(now);
        self.repos.suggestions.save(user_id, &document).await?;
        info!(user_id, created = created.len(), "Plateau alerts created");
        Ok(created)
    }

    async fn load_document(&self, user_id: &str) -> DomainResult<AiSuggestionsDocument> {
        Ok(self
            .repos
            .suggestions
            .load(user_id)
            .await?
            .unwrap_or_default())
    }

    /// Apply `change` to one alert and persist. `false` when no alert has
    /// that id.
    async fn update_alert(
        &self,
        user_id: &str,
        alert_id: &str,
        change: impl FnOnce(&mut PlateauAlert, DateTime<Utc>),
    ) -> DomainResult<bool> {
        let mut document = self.load_document(user_id).await?;
        let now = self.clock.now();
        let Some(alert) = document.alert_mut(alert_id) else {
            return Ok(false);
        };
        change(alert, now);
        document.updated_at = Some(now);
        self.repos.suggestions.save(user_id, &document).await?;
        Ok(true)
    }

    pub async fn acknowledge_plateau_alert(&self, user_id: &str, alert_id: &str) -> DomainResult<bool> {
        self.update_alert(user_id, alert_id, |alert, _| alert.acknowledge())
            .await
    }

    pub async fn dismiss_plateau_alert(
        &self,
        user_id: &str,
        alert_id: &str,
        reason: Option<String>,
    ) -> DomainResult<bool> {
        self.update_alert(user_id, alert_id, |alert, now| alert.dismiss(reason, now))
            .await
    }

    /// Every stored alert, whatever its status, newest first.
    pub async fn plateau_alerts(&self, user_id: &str) -> DomainResult<Vec<PlateauAlert>> {
        Ok(self.load_document(user_id).await?.plateau_alerts)
    }

    /// Active alerts, newest first. Each returned alert counts as shown.
    pub async fn active_plateau_alerts(&self, user_id: &str) -> DomainResult<Vec<PlateauAlert>> {
        let mut document = self.load_document(user_id).await?;
        let now = self.clock.now();
        let mut shown = Vec::new();
        for alert in document.plateau_alerts.iter_mut().filter(|a| a.is_active()) {
            alert.mark_shown(now);
            shown.push(alert.clone());
        }
        if !shown.is_empty() {
            document.updated_at = Some(now);
            self.repos.suggestions.save(user_id, &document).await?;
        }
        Ok(shown)
    }

    /// Refresh state after a workout: drop cached suggestions for the
    /// exercises trained and resolve open alerts on exercises that are no
    /// longer plateaued. Returns how many alerts were resolved.
    #[instrument(skip(self, exercise_ids), fields(count = exercise_ids.len()))]
    pub async fn handle_workout_completed(
        &self,
        user_id: &str,
        exercise_ids: &[String],
    ) -> DomainResult<usize> {
        match self.cache.invalidate_many(user_id, exercise_ids).await {
            Ok(removed) => debug!(user_id, removed, "Invalidated cached suggestions"),
            Err(e) => warn!(user_id, error = %e, "Failed to invalidate cached suggestions"),
        }

        let mut document = self.load_document(user_id).await?;
        let open: Vec<&str> = document
            .plateau_alerts
            .iter()
            .filter(|a| !a.status.is_terminal() && exercise_ids.contains(&a.exercise_id))
            .map(|a| a.exercise_id.as_str())
            .collect();
        if open.is_empty() {
            return Ok(0);
        }

        let workouts = self.load_history(user_id, self.analysis.plateau_history_limit).await?;
        let recovered: Vec<String> = open
            .into_iter()
            .filter(|exercise| {
                let sessions = sessions_for_exercise(&workouts, exercise);
                detect_plateau(exercise, &sessions).is_none()
            })
            .map(str::to_string)
            .collect();

        let mut resolved = 0;
        for alert in document
            .plateau_alerts
            .iter_mut()
            .filter(|a| !a.status.is_terminal() && recovered.contains(&a.exercise_id))
        {
            alert.resolve();
            resolved += 1;
        }

        if resolved > 0 {
            document.updated_at = Some(self.clock.now());
            self.repos.suggestions.save(user_id, &document).await?;
            info!(user_id, resolved, "Plateau alerts resolved");
        }
        Ok(resolved)
    }

    // ========================================================================
    // Interactions
    // ========================================================================

    /// Record what the user did with a suggestion. Never fails; each store
    /// is updated independently.
    #[instrument(skip(self, metadata))]
    pub async fn track_suggestion_interaction(
        &self,
        user_id: &str,
        exercise_id: &str,
        action: InteractionAction,
        metadata: Value,
    ) {
        let now = self.clock.now();

        let log = async {
            let mut document = self.load_document(user_id).await?;
            document.push_interaction(SuggestionInteraction {
                exercise_id: exercise_id.to_string(),
                action,
                metadata,
                timestamp: now,
            });
            document.updated_at = Some(now);
            self.repos.suggestions.save(user_id, &document).await
        };
        if let Err(e) = log.await {
            warn!(user_id, exercise_id, error = %e, "Failed to log suggestion interaction");
        }

        if action.is_response() {
            let mut profile = self.load_profile(user_id).await;
            profile.performance_metrics.record(action);
            profile.updated_at = now;
            if let Err(e) = self.repos.profiles.save(&profile).await {
                warn!(user_id, error = %e, "Failed to update acceptance statistics");
            }
        }

        let analytics = async {
            let mut analytics = self
                .repos
                .analytics
                .get(user_id, exercise_id)
                .await?
                .unwrap_or_else(|| ExerciseAnalytics::new(user_id, exercise_id, now));
            analytics.record_interaction(action, now);
            self.repos.analytics.upsert(&analytics).await
        };
        if let Err(e) = analytics.await {
            warn!(user_id, exercise_id, error = %e, "Failed to update exercise analytics");
        }

        if action == InteractionAction::Accepted {
            if let Err(e) = self.cache.invalidate(user_id, exercise_id).await {
                warn!(user_id, exercise_id, error = %e, "Failed to invalidate accepted suggestion");
            }
        }
    }

    /// Acceptance statistics over the logged interactions.
    pub async fn suggestion_effectiveness(&self, user_id: &str) -> DomainResult<SuggestionEffectiveness> {
        let document = self.load_document(user_id).await?;
        Ok(effectiveness_from(&document.interactions))
    }

    // ========================================================================
    // Workout suggestions
    // ========================================================================

    /// Exercises for the next workout. Provider-planned when history exists
    /// and the provider is enabled; otherwise rule-based from the least
    /// recently trained exercises, or a default template without history.
    #[instrument(skip(self, context))]
    pub async fn generate_workout_suggestions(
        &self,
        user_id: &str,
        context: &WorkoutContext,
    ) -> DomainResult<Vec<WorkoutSuggestion>> {
        let workouts = self.load_history(user_id, self.analysis.history_limit).await?;
        let analyses = least_recent_first(&workouts);

        match self.provider.as_ref() {
            Some(provider) if provider.is_enabled() && !analyses.is_empty() => {
                let profile = self.load_profile(user_id).await;
                let response = provider
                    .request_workout_plan(user_id, &analyses, &profile, context)
                    .await;
                if let Some(reason) = response.fallback_reason() {
                    debug!(user_id, reason = reason.as_str(), "Using rule-based workout");
                }
                Ok(response.payload)
            }
            _ => Ok(rule_based_workout(&analyses, context)),
        }
    }
}

impl std::fmt::Debug for ProgressiveOverloadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressiveOverloadService")
            .field("provider", &self.provider)
            .field("analysis", &self.analysis)
            .finish_non_exhaustive()
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Analyses ordered by the date each exercise was last trained, oldest first.
fn least_recent_first(workouts: &[WorkoutLog]) -> Vec<ProgressionAnalysis> {
    let mut groups: Vec<(String, Vec<ExerciseSession>)> = group_sessions_by_exercise(workouts);
    let last_trained = |sessions: &[ExerciseSession]| sessions.iter().map(|s| s.timestamp).max();
    groups.sort_by_key(|(_, sessions)| last_trained(sessions));
    groups
        .into_iter()
        .map(|(exercise, sessions)| analyze_sessions(&exercise, &sessions))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
pub fn effectiveness_from(interactions: &[SuggestionInteraction]) -> SuggestionEffectiveness {
    let count = |action: InteractionAction| -> u64 {
        interactions.iter().filter(|i| i.action == action).count() as u64
    };
    let accepted = count(InteractionAction::Accepted);
    let dismissed = count(InteractionAction::Dismissed);
    let modified = count(InteractionAction::Modified);
    let total = accepted + dismissed + modified;

    let (acceptance_rate, dismissal_rate) = if total == 0 {
        (0.0, 0.0)
    } else {
        (accepted as f64 / total as f64, dismissed as f64 / total as f64)
    };
    let sample = (total as f64 / EFFECTIVENESS_SAMPLE_TARGET).min(1.0);
    let effectiveness_score = acceptance_rate * 0.7 + sample * 0.3;

    let mut recommendations = Vec::new();
    if total < MIN_EFFECTIVENESS_SAMPLE {
        recommendations.push(
            "Keep responding to suggestions; a few more are needed before they can be tuned to you."
                .to_string(),
        );
    }
    if total > 0 && acceptance_rate < LOW_ACCEPTANCE {
        recommendations.push(
            "Most suggestions are being declined; consider a more conservative progression style."
                .to_string(),
        );
    }
    if acceptance_rate > HIGH_ACCEPTANCE {
        recommendations.push(
            "Suggestions are landing well; you may be ready for a more aggressive progression style."
                .to_string(),
        );
    }

    SuggestionEffectiveness {
        total_suggestions: total,
        accepted,
        dismissed,
        modified,
        acceptance_rate,
        dismissal_rate,
        effectiveness_score,
        recommendations,
    }
}
