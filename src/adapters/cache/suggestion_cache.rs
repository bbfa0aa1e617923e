//! Per-exercise suggestion cache over the durable key-value store.
//!
//! Entries live under `progression_cache:{user}:{exercise}`, each segment
//! escaped with [`escape_key_segment`], and hold the suggestion plus its
//! write time. Expiry is checked against the injected
//! clock on read, so an expired entry is deleted the first time it is seen.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::{bounded_secs, SuggestionResult};
use crate::domain::ports::{escape_key_segment, Clock, KeyValueStore};

/// Key namespace shared by every cache entry.
pub const CACHE_PREFIX: &str = "progression_cache";

/// Default entry lifetime.
pub const DEFAULT_SUGGESTION_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: SuggestionResult,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
    /// hits / (hits + misses) for this process, 0 before any lookup.
    pub hit_rate: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct HitCounter {
    hits: u64,
    misses: u64,
}

pub struct SuggestionCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    counters: Mutex<HashMap<String, HitCounter>>,
}

impl SuggestionCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(store, clock, DEFAULT_SUGGESTION_TTL_SECS)
    }

    pub fn with_ttl(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, ttl_secs: u64) -> Self {
        Self {
            store,
            clock,
            ttl: Duration::seconds(i64::try_from(bounded_secs(ttl_secs)).unwrap_or(0)),
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn key(user_id: &str, exercise_id: &str) -> String {
        format!(
            "{CACHE_PREFIX}:{}:{}",
            escape_key_segment(user_id),
            escape_key_segment(exercise_id)
        )
    }

    fn user_prefix(user_id: &str) -> String {
        format!("{CACHE_PREFIX}:{}:", escape_key_segment(user_id))
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.timestamp > self.ttl
    }

    fn count(&self, user_id: &str, hit: bool) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = counters.entry(user_id.to_string()).or_default();
        if hit {
            counter.hits += 1;
        } else {
            counter.misses += 1;
        }
    }

    /// Read an entry. Returns `None` and deletes unreadable entries.
    async fn read_entry(&self, key: &str) -> DomainResult<Option<CacheEntry>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Dropping unreadable cache entry");
                self.store.remove(key).await?;
                Ok(None)
            }
        }
    }

    pub async fn get(&self, user_id: &str, exercise_id: &str) -> DomainResult<Option<SuggestionResult>> {
        let key = Self::key(user_id, exercise_id);
        let entry = match self.read_entry(&key).await? {
            Some(entry) if self.is_expired(&entry, self.clock.now()) => {
                self.store.remove(&key).await?;
                tracing::debug!(key, "Cache entry expired");
                None
            }
            other => other,
        };

        self.count(user_id, entry.is_some());
        Ok(entry.map(|e| e.data))
    }

    pub async fn set(&self, user_id: &str, exercise_id: &str, suggestion: &SuggestionResult) -> DomainResult<()> {
        let entry = CacheEntry {
            data: suggestion.clone(),
            timestamp: self.clock.now(),
        };
        let json = serde_json::to_string(&entry)?;
        self.store.set(&Self::key(user_id, exercise_id), &json).await
    }

    pub async fn invalidate(&self, user_id: &str, exercise_id: &str) -> DomainResult<bool> {
        self.store.remove(&Self::key(user_id, exercise_id)).await
    }

    /// Remove several entries, returning how many existed.
    pub async fn invalidate_many(&self, user_id: &str, exercise_ids: &[String]) -> DomainResult<usize> {
        let mut removed = 0;
        for exercise_id in exercise_ids {
            if self.invalidate(user_id, exercise_id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub async fn clear_user(&self, user_id: &str) -> DomainResult<usize> {
        let keys = self.store.keys_with_prefix(&Self::user_prefix(user_id)).await?;
        let mut removed = 0;
        for key in keys {
            if self.store.remove(&key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Delete every expired or unreadable entry across all users.
    pub async fn clear_expired(&self) -> DomainResult<usize> {
        let now = self.clock.now();
        let keys = self.store.keys_with_prefix(&format!("{CACHE_PREFIX}:")).await?;
        let mut removed = 0;
        for key in keys {
            let stale = match self.read_entry(&key).await? {
                Some(entry) => self.is_expired(&entry, now),
                // read_entry already removed it
                None => {
                    removed += 1;
                    continue;
                }
            };
            if stale && self.store.remove(&key).await? {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, "Pruned expired suggestion cache entries");
        }
        Ok(removed)
    }

    pub async fn stats(&self, user_id: &str) -> DomainResult<CacheStats> {
        let now = self.clock.now();
        let keys = self.store.keys_with_prefix(&Self::user_prefix(user_id)).await?;
        let mut valid = 0;
        let mut expired = 0;
        for key in &keys {
            let Some(raw) = self.store.get(key).await? else {
                continue;
            };
            match serde_json::from_str::<CacheEntry>(&raw) {
                Ok(entry) if !self.is_expired(&entry, now) => valid += 1,
                _ => expired += 1,
            }
        }

        let counter = self
            .counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .copied()
            .unwrap_or_default();
        let lookups = counter.hits + counter.misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            counter.hits as f64 / lookups as f64
        };

        Ok(CacheStats {
            total: valid + expired,
            valid,
            expired,
            hit_rate,
        })
    }
}

impl std::fmt::Debug for SuggestionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionCache")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::MemoryKeyValueStore;
    use crate::domain::models::{ProgressionSuggestion, ProgressionType, RuleBasedSuggestion};
    use crate::domain::ports::ManualClock;

    fn result(exercise: &str) -> SuggestionResult {
        SuggestionResult::RuleBased(RuleBasedSuggestion {
            suggestion: ProgressionSuggestion {
                exercise_id: exercise.to_string(),
                current_weight: 60.0,
                suggested_weight: 62.5,
                suggested_reps: 8,
                suggested_sets: 3,
                progression_type: ProgressionType::Weight,
                reasoning: "steady".to_string(),
                confidence_level: 0.8,
                alternative_options: vec![],
            },
            tips: vec![],
            risk_notes: vec![],
            fallback_reason: None,
            notice: None,
            generated_at: Utc::now(),
        })
    }

    fn setup() -> (SuggestionCache, Arc<ManualClock>, Arc<MemoryKeyValueStore>) {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemoryKeyValueStore::new());
        let cache = SuggestionCache::new(store.clone(), clock.clone());
        (cache, clock, store)
    }

    #[tokio::test]
    async fn test_hit_then_expire_after_ttl() {
        let (cache, clock, store) = setup();
        cache.set("u1", "squat", &result("squat")).await.unwrap();

        clock.advance(Duration::minutes(59));
        assert!(cache.get("u1", "squat").await.unwrap().is_some());

        clock.advance(Duration::minutes(2));
        assert!(cache.get("u1", "squat").await.unwrap().is_none());
        assert!(store.get(&SuggestionCache::key("u1", "squat")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_huge_ttl_is_clamped() {
        let clock = Arc::new(ManualClock::default());
        let cache = SuggestionCache::with_ttl(Arc::new(MemoryKeyValueStore::new()), clock.clone(), u64::MAX);
        cache.set("u1", "squat", &result("squat")).await.unwrap();

        clock.advance(Duration::days(365));
        assert!(cache.get("u1", "squat").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let (cache, _, _) = setup();
        cache.set("u1", "squat", &result("squat")).await.unwrap();
        assert!(cache.get("u2", "squat").await.unwrap().is_none());
        assert_eq!(cache.clear_user("u2").await.unwrap(), 0);
        assert_eq!(cache.clear_user("u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_colon_in_user_id_does_not_alias_other_users() {
        let (cache, _, _) = setup();
        cache.set("alice:x", "squat", &result("squat")).await.unwrap();

        assert!(cache.get("alice", "x:squat").await.unwrap().is_none());
        assert_eq!(cache.clear_user("alice").await.unwrap(), 0);
        assert!(cache.get("alice:x", "squat").await.unwrap().is_some());
        assert_eq!(cache.clear_user("alice:x").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_many_counts_existing() {
        let (cache, _, _) = setup();
        cache.set("u1", "squat", &result("squat")).await.unwrap();
        cache.set("u1", "bench", &result("bench")).await.unwrap();
        let removed = cache
            .invalidate_many("u1", &["squat".to_string(), "deadlift".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_stats_and_prune() {
        let (cache, clock, store) = setup();
        cache.set("u1", "squat", &result("squat")).await.unwrap();
        clock.advance(Duration::minutes(90));
        cache.set("u1", "bench", &result("bench")).await.unwrap();
        store.set(&SuggestionCache::key("u2", "row"), "not json").await.unwrap();

        cache.get("u1", "bench").await.unwrap();
        cache.get("u1", "press").await.unwrap();

        let stats = cache.stats("u1").await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.expired, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);

        assert_eq!(cache.clear_expired().await.unwrap(), 2);
        assert_eq!(cache.stats("u1").await.unwrap().total, 1);
    }
}
