//! Client for the external analysis provider.
//!
//! Wraps a [`TextGenerator`] with the protections every provider call goes
//! through, in this order:
//!
//! 1. kill switch (config or runtime)
//! 2. memoized result for the same request key
//! 3. joining an identical in-flight request
//! 4. emergency brake, hourly and per-user caps, circuit breaker
//! 5. single-flight FIFO queue with minimum spacing
//! 6. retry of transient errors, each attempt raced against a timeout
//! 7. JSON extraction and typed validation
//!
//! Steps 3 and 4 happen inside one synchronous critical section, so counters
//! and breaker state are never read and written across an await. The call
//! itself runs in a spawned task that always records its outcome in the
//! breaker, even when every caller waiting on it has gone away.
//!
//! No public method returns an error. When the provider cannot be used the
//! response carries a rule-based payload of the same shape and the reason.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use moka::future::Cache;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::errors::ProviderError;
use crate::domain::models::{
    bounded_secs, AiConfig, Config, ExerciseSession, FallbackReason, InterventionSuggestion, PlateauDetection,
    ProgressionAnalysis, ProviderSuggestion, UserProgressionProfile, WorkoutContext,
    WorkoutSuggestion,
};
use crate::domain::ports::{escape_key_segment as seg, Clock, TextGenerator};
use crate::services::circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitCheckResult,
};
use crate::services::emergency_brake::{EmergencyBrake, EmergencyBrakeConfig, EmergencyBrakeStats};
use crate::services::exercise_catalog::normalize_name;
use crate::services::interventions::generate_interventions;
use crate::services::json_extraction::extract_json;
use crate::services::progression_engine::{generate_progression_suggestion, rule_enhancements};
use crate::services::provider_prompts::{
    build_batch_progression_prompt, build_plateau_prompt, build_progression_prompt,
    build_workout_plan_prompt,
};
use crate::services::provider_responses::{
    parse_batch_progressions, parse_interventions, parse_progression, parse_workout_plan,
    ResponseKind,
};
use crate::services::request_queue::RequestQueue;
use crate::services::retry::RetryPolicy;
use crate::services::usage_limits::UsageLimits;
use crate::services::workout_planner::rule_based_workout;

/// Upper bound on memoized provider responses.
const MEMO_CAPACITY: u64 = 1_000;

type SharedCall = Shared<BoxFuture<'static, Result<Value, ProviderError>>>;

/// Where a provider response payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOrigin {
    Provider,
    Fallback(FallbackReason),
}

/// A provider payload, or a rule-based payload of the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse<T> {
    pub payload: T,
    pub origin: ResponseOrigin,
}

impl<T> ProviderResponse<T> {
    pub fn provider(payload: T) -> Self {
        Self {
            payload,
            origin: ResponseOrigin::Provider,
        }
    }

    pub fn fallback(payload: T, reason: FallbackReason) -> Self {
        Self {
            payload,
            origin: ResponseOrigin::Fallback(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, ResponseOrigin::Fallback(_))
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self.origin {
            ResponseOrigin::Provider => None,
            ResponseOrigin::Fallback(reason) => Some(reason),
        }
    }
}

/// Provider suggestion derived from the rule engine, used as the fallback
/// payload for progression requests.
pub fn rule_fallback_suggestion(analysis: &ProgressionAnalysis) -> ProviderSuggestion {
    let rule = generate_progression_suggestion(analysis);
    let (tips, risk_notes) = rule_enhancements(analysis, &rule);
    ProviderSuggestion {
        exercise_id: rule.exercise_id,
        suggested_weight: rule.suggested_weight,
        suggested_reps: rule.suggested_reps,
        suggested_sets: rule.suggested_sets,
        progression_type: rule.progression_type,
        reasoning: rule.reasoning,
        confidence: rule.confidence_level,
        tips,
        risk_notes,
    }
}

fn fallback_reason_for(error: &ProviderError) -> FallbackReason {
    match error {
        ProviderError::Timeout(_) => FallbackReason::Timeout,
        ProviderError::RateLimited(_) => FallbackReason::RateLimited,
        _ => FallbackReason::ProviderError,
    }
}

// ============================================================================
// Gate state
// ============================================================================

struct GateState {
    brake: EmergencyBrake,
    circuit: CircuitBreaker,
    limits: UsageLimits,
    in_flight: HashMap<String, SharedCall>,
}

impl GateState {
    /// Decide whether a new call may go out and, if so, count it.
    fn admit(&mut self, user_id: &str, now: chrono::DateTime<chrono::Utc>) -> Result<(), FallbackReason> {
        if self.brake.is_engaged(now) {
            debug!(user_id, "Emergency brake engaged; skipping provider");
            return Err(FallbackReason::EmergencyBrake);
        }
        if let Err(limit) = self.limits.check(user_id, now) {
            debug!(user_id, ?limit, "Provider usage cap reached; skipping provider");
            return Err(FallbackReason::RateLimited);
        }
        match self.circuit.check(now) {
            CircuitCheckResult::Blocked { retry_after } => {
                debug!(user_id, %retry_after, "Circuit open; skipping provider");
                return Err(FallbackReason::CircuitOpen);
            }
            CircuitCheckResult::Testing => {
                info!(user_id, "Circuit cooldown elapsed; sending probe request");
            }
            CircuitCheckResult::Allowed => {}
        }

        self.brake.record_call(now);
        self.limits.record(user_id, now);
        Ok(())
    }
}

struct ClientInner {
    generator: Arc<dyn TextGenerator>,
    clock: Arc<dyn Clock>,
    ai: AiConfig,
    kill_switch: AtomicBool,
    gates: Mutex<GateState>,
    queue: RequestQueue,
    retry: RetryPolicy,
    memo: Cache<String, Value>,
    timeout: Duration,
}

impl ClientInner {
    fn lock_gates(&self) -> MutexGuard<'_, GateState> {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_call(inner: Arc<Self>, key: String, kind: ResponseKind, prompt: String) -> SharedCall {
        let worker = {
            let inner = Arc::clone(&inner);
            let key = key.clone();
            tokio::spawn(async move { inner.run_call(key, kind, prompt).await })
        };
        // a worker that panics never settles its gate state, so do it here
        let supervisor = tokio::spawn(async move {
            match worker.await {
                Ok(result) => result,
                Err(err) => {
                    let result = Err(ProviderError::Network(format!("provider task failed: {err}")));
                    inner.settle(&key, kind, &result);
                    result
                }
            }
        });
        async move {
            supervisor.await.unwrap_or_else(|err| {
                Err(ProviderError::Network(format!("provider task failed: {err}")))
            })
        }
        .boxed()
        .shared()
    }

    async fn run_call(&self, key: String, kind: ResponseKind, prompt: String) -> Result<Value, ProviderError> {
        if self.ai.logging_enabled {
            debug!(kind = kind.as_str(), prompt_chars = prompt.len(), "Sending provider request");
        }

        let result = self.call_provider(&prompt).await.and_then(|text| {
            if self.ai.logging_enabled {
                debug!(kind = kind.as_str(), response_chars = text.len(), "Provider responded");
            }
            let value = extract_json(&text).ok_or_else(|| {
                ProviderError::InvalidResponse("no JSON payload in provider response".to_string())
            })?;
            kind.validate(&value)?;
            Ok(value)
        });

        // memo first so a caller arriving between the two steps finds it
        if let Ok(value) = &result {
            self.memo.insert(key.clone(), value.clone()).await;
        }

        self.settle(&key, kind, &result);
        result
    }

    /// Release the in-flight slot and record the outcome in the breaker.
    fn settle(&self, key: &str, kind: ResponseKind, result: &Result<Value, ProviderError>) {
        let mut gates = self.lock_gates();
        gates.in_flight.remove(key);
        match result {
            Ok(_) => {
                gates.circuit.record_success();
                debug!(kind = kind.as_str(), generator = self.generator.name(), "Provider call succeeded");
            }
            Err(err) => {
                gates.circuit.record_failure(err.to_string(), self.clock.now());
                warn!(
                    kind = kind.as_str(),
                    generator = self.generator.name(),
                    error = %err,
                    consecutive_failures = gates.circuit.consecutive_failures(),
                    "Provider call failed; serving rule-based fallback"
                );
            }
        }
    }

    async fn call_provider(&self, prompt: &str) -> Result<String, ProviderError> {
        let generator = &self.generator;
        let retry = &self.retry;
        let timeout = self.timeout;
        let timeout_ms = self.ai.request_timeout_ms;

        self.queue
            .run(move || async move {
                retry
                    .execute(move || async move {
                        match tokio::time::timeout(timeout, generator.generate(prompt)).await {
                            Ok(result) => result,
                            Err(_) => Err(ProviderError::Timeout(timeout_ms)),
                        }
                    })
                    .await
            })
            .await
    }
}

// ============================================================================
// Client
// ============================================================================

/// Protected client for the analysis provider. Cheap to clone; clones share
/// all gate state.
#[derive(Clone)]
pub struct AnalysisProviderClient {
    inner: Arc<ClientInner>,
}

impl AnalysisProviderClient {
    pub fn new(generator: Arc<dyn TextGenerator>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        let now = clock.now();
        let limits = &config.limits;

        let gates = GateState {
            brake: EmergencyBrake::new(
                EmergencyBrakeConfig {
                    activation_threshold: limits.max_requests_per_day.max(1),
                    ..EmergencyBrakeConfig::default()
                },
                now,
            ),
            circuit: CircuitBreaker::new(CircuitBreakerConfig::from(&config.circuit_breaker)),
            limits: UsageLimits::new(
                limits.max_requests_per_hour,
                limits.max_requests_per_user_per_day,
                now,
            ),
            in_flight: HashMap::new(),
        };

        let memo = Cache::builder()
            .max_capacity(MEMO_CAPACITY)
            .time_to_live(Duration::from_secs(bounded_secs(config.cache.provider_memo_ttl_secs).max(1)))
            .build();

        Self {
            inner: Arc::new(ClientInner {
                generator,
                clock,
                ai: config.ai.clone(),
                kill_switch: AtomicBool::new(false),
                gates: Mutex::new(gates),
                queue: RequestQueue::new(Duration::from_millis(limits.min_request_interval_ms)),
                retry: RetryPolicy::from(&config.retry),
                memo,
                timeout: Duration::from_millis(config.ai.request_timeout_ms.max(1)),
            }),
        }
    }

    /// Whether calls may reach the provider at all.
    pub fn is_enabled(&self) -> bool {
        self.inner.ai.is_active() && !self.inner.kill_switch.load(Ordering::SeqCst)
    }

    /// Runtime kill switch. While engaged every request falls back.
    pub fn set_kill_switch(&self, engaged: bool) {
        self.inner.kill_switch.store(engaged, Ordering::SeqCst);
        info!(engaged, "Provider kill switch updated");
    }

    pub fn hybrid_mode(&self) -> bool {
        self.inner.ai.hybrid_mode
    }

    pub fn blend_priority(&self) -> f64 {
        self.inner.ai.blend_priority
    }

    pub fn generator_name(&self) -> &str {
        self.inner.generator.name()
    }

    pub fn circuit_stats(&self) -> CircuitBreakerStats {
        self.inner.lock_gates().circuit.stats()
    }

    pub fn brake_stats(&self) -> EmergencyBrakeStats {
        self.inner.lock_gates().brake.stats()
    }

    pub fn reset_circuit(&self) {
        self.inner.lock_gates().circuit.reset();
    }

    /// Resolve one request key to a validated JSON payload.
    async fn fetch<P>(&self, user_id: &str, key: String, kind: ResponseKind, prompt: P) -> Result<Value, FallbackReason>
    where
        P: FnOnce() -> String,
    {
        if !self.is_enabled() {
            return Err(FallbackReason::Disabled);
        }
        if let Some(value) = self.inner.memo.get(&key).await {
            debug!(key = %key, "Serving memoized provider response");
            return Ok(value);
        }

        let call = {
            let mut gates = self.inner.lock_gates();
            if let Some(existing) = gates.in_flight.get(&key) {
                debug!(key = %key, "Joining in-flight provider request");
                existing.clone()
            } else {
                gates.admit(user_id, self.inner.clock.now())?;
                let call = ClientInner::spawn_call(Arc::clone(&self.inner), key.clone(), kind, prompt());
                gates.in_flight.insert(key, call.clone());
                call
            }
        };

        call.await.map_err(|err| fallback_reason_for(&err))
    }

    /// Next-session suggestion for one exercise.
    pub async fn request_progression_suggestion(
        &self,
        user_id: &str,
        analysis: &ProgressionAnalysis,
        profile: &UserProgressionProfile,
        recent_history: &[ExerciseSession],
    ) -> ProviderResponse<ProviderSuggestion> {
        let key = format!(
            "progression:{}:{}:{}:{}",
            seg(user_id),
            seg(&analysis.exercise_id),
            analysis.current_weight,
            analysis.current_reps
        );
        let fetched = self
            .fetch(user_id, key, ResponseKind::Progression, || {
                build_progression_prompt(analysis, profile, recent_history)
            })
            .await;

        match fetched.and_then(|value| parse_progression(&value).map_err(|_| FallbackReason::ProviderError)) {
            Ok(mut suggestion) => {
                suggestion.exercise_id.clone_from(&analysis.exercise_id);
                ProviderResponse::provider(suggestion)
            }
            Err(reason) => ProviderResponse::fallback(rule_fallback_suggestion(analysis), reason),
        }
    }

    /// Suggestions for several exercises in one provider call. Provider
    /// entries are matched to the requested exercises by name; unmatched
    /// entries are dropped. The fallback covers every requested exercise in
    /// input order.
    pub async fn request_batch_progressions(
        &self,
        user_id: &str,
        analyses: &[ProgressionAnalysis],
        profile: &UserProgressionProfile,
    ) -> ProviderResponse<Vec<ProviderSuggestion>> {
        let fallback = || analyses.iter().map(rule_fallback_suggestion).collect::<Vec<_>>();
        if analyses.is_empty() {
            return ProviderResponse::provider(Vec::new());
        }

        let mut ids: Vec<_> = analyses.iter().map(|a| seg(&a.exercise_id)).collect();
        ids.sort_unstable();
        ids.dedup();
        let key = format!("batch:{}:{}", seg(user_id), ids.join(","));

        let fetched = self
            .fetch(user_id, key, ResponseKind::BatchProgression, || {
                build_batch_progression_prompt(analyses, profile)
            })
            .await;

        match fetched.and_then(|value| parse_batch_progressions(&value).map_err(|_| FallbackReason::ProviderError)) {
            Ok(entries) => {
                let matched = entries
                    .into_iter()
                    .filter_map(|mut entry| {
                        let wanted = normalize_name(&entry.exercise_id);
                        let analysis = analyses
                            .iter()
                            .find(|a| normalize_name(&a.exercise_id) == wanted)?;
                        entry.exercise_id.clone_from(&analysis.exercise_id);
                        Some(entry)
                    })
                    .collect();
                ProviderResponse::provider(matched)
            }
            Err(reason) => ProviderResponse::fallback(fallback(), reason),
        }
    }

    /// Provider interventions for a plateau. The fallback is the rule-based
    /// intervention list.
    pub async fn request_plateau_interventions(
        &self,
        user_id: &str,
        plateau: &PlateauDetection,
        profile: &UserProgressionProfile,
        recent_history: &[ExerciseSession],
    ) -> ProviderResponse<Vec<InterventionSuggestion>> {
        let key = format!(
            "plateau:{}:{}:{}:{}",
            seg(user_id),
            seg(&plateau.exercise_id),
            plateau.severity.as_str(),
            plateau.plateau_duration
        );
        let fetched = self
            .fetch(user_id, key, ResponseKind::PlateauInterventions, || {
                build_plateau_prompt(plateau, profile, recent_history)
            })
            .await;

        match fetched.and_then(|value| parse_interventions(&value).map_err(|_| FallbackReason::ProviderError)) {
            Ok(interventions) => ProviderResponse::provider(interventions),
            Err(reason) => ProviderResponse::fallback(generate_interventions(plateau), reason),
        }
    }

    /// A whole workout. Provider output is cut to `context.max_exercises`.
    pub async fn request_workout_plan(
        &self,
        user_id: &str,
        analyses: &[ProgressionAnalysis],
        profile: &UserProgressionProfile,
        context: &WorkoutContext,
    ) -> ProviderResponse<Vec<WorkoutSuggestion>> {
        let key = format!(
            "workout:{}:{}:{}:{}",
            seg(user_id),
            context.max_exercises,
            context.available_minutes.unwrap_or(0),
            seg(context.focus.as_deref().unwrap_or(""))
        );
        let fetched = self
            .fetch(user_id, key, ResponseKind::WorkoutPlan, || {
                build_workout_plan_prompt(analyses, profile, context)
            })
            .await;

        match fetched.and_then(|value| parse_workout_plan(&value).map_err(|_| FallbackReason::ProviderError)) {
            Ok(mut plan) => {
                plan.truncate(context.max_exercises);
                ProviderResponse::provider(plan)
            }
            Err(reason) => ProviderResponse::fallback(rule_based_workout(analyses, context), reason),
        }
    }
}

impl std::fmt::Debug for AnalysisProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisProviderClient")
            .field("generator", &self.inner.generator.name())
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}
