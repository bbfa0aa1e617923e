//! Suggestion cache behaviour over the SQLite key-value store.

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{start, Harness};
use overload::adapters::cache::SuggestionCache;
use overload::adapters::sqlite::{create_migrated_test_pool, SqliteKeyValueStore};
use overload::domain::models::SuggestionResult;
use overload::domain::ports::{Clock, KeyValueStore, ManualClock};

async fn squat_suggestion() -> SuggestionResult {
    let h = Harness::rules_only().await;
    h.log_progression("u1", "Squat", &[100.0, 102.5, 105.0], 5).await;
    h.service.calculate_next_progression("u1", "Squat").await.unwrap()
}

#[tokio::test]
async fn test_entries_survive_a_new_cache_instance() {
    let pool = create_migrated_test_pool().await.unwrap();
    let clock = Arc::new(ManualClock::new(start()));
    let suggestion = squat_suggestion().await;

    let writer = SuggestionCache::new(Arc::new(SqliteKeyValueStore::new(pool.clone())), clock.clone());
    writer.set("u1", "Squat", &suggestion).await.unwrap();

    let reader = SuggestionCache::new(Arc::new(SqliteKeyValueStore::new(pool)), clock.clone());
    let cached = reader.get("u1", "Squat").await.unwrap().unwrap();
    assert_eq!(cached.exercise_id(), "Squat");
    assert!((cached.confidence() - suggestion.confidence()).abs() < 1e-9);
}

#[tokio::test]
async fn test_ttl_expiry_removes_the_row() {
    let pool = create_migrated_test_pool().await.unwrap();
    let clock = Arc::new(ManualClock::new(start()));
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let store = Arc::new(SqliteKeyValueStore::new(pool));
    let cache = SuggestionCache::with_ttl(store.clone(), dyn_clock, 600);

    cache.set("u1", "Squat", &squat_suggestion().await).await.unwrap();
    clock.advance(Duration::seconds(599));
    assert!(cache.get("u1", "Squat").await.unwrap().is_some());

    clock.advance(Duration::seconds(2));
    assert!(cache.get("u1", "Squat").await.unwrap().is_none());
    assert!(store
        .get(&SuggestionCache::key("u1", "Squat"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_wildcard_characters_in_user_ids_are_literal() {
    let pool = create_migrated_test_pool().await.unwrap();
    let clock = Arc::new(ManualClock::new(start()));
    let cache = SuggestionCache::new(Arc::new(SqliteKeyValueStore::new(pool)), clock);
    let suggestion = squat_suggestion().await;

    cache.set("a_%", "Squat", &suggestion).await.unwrap();
    cache.set("ab", "Squat", &suggestion).await.unwrap();
    cache.set("abc", "Squat", &suggestion).await.unwrap();

    assert_eq!(cache.stats("a_%").await.unwrap().total, 1);
    assert_eq!(cache.clear_user("a_%").await.unwrap(), 1);
    assert!(cache.get("ab", "Squat").await.unwrap().is_some());
    assert!(cache.get("abc", "Squat").await.unwrap().is_some());
}

#[tokio::test]
async fn test_colons_in_ids_keep_users_apart() {
    let pool = create_migrated_test_pool().await.unwrap();
    let clock = Arc::new(ManualClock::new(start()));
    let cache = SuggestionCache::new(Arc::new(SqliteKeyValueStore::new(pool)), clock);
    let suggestion = squat_suggestion().await;

    cache.set("alice:x", "squat", &suggestion).await.unwrap();
    cache.set("alice", "bench", &suggestion).await.unwrap();

    assert!(cache.get("alice", "x:squat").await.unwrap().is_none());
    assert_eq!(cache.stats("alice").await.unwrap().total, 1);
    assert_eq!(cache.clear_user("alice").await.unwrap(), 1);
    assert!(cache.get("alice:x", "squat").await.unwrap().is_some());
}

#[tokio::test]
async fn test_prune_counts_expired_and_unreadable_entries() {
    let pool = create_migrated_test_pool().await.unwrap();
    let clock = Arc::new(ManualClock::new(start()));
    let store = Arc::new(SqliteKeyValueStore::new(pool));
    let cache = SuggestionCache::new(store.clone(), clock.clone());
    let suggestion = squat_suggestion().await;

    cache.set("u1", "Squat", &suggestion).await.unwrap();
    clock.advance(Duration::hours(2));
    cache.set("u1", "Bench Press", &suggestion).await.unwrap();
    store
        .set(&SuggestionCache::key("u2", "Row"), "{ truncated")
        .await
        .unwrap();
    store.set("unrelated", "kept").await.unwrap();

    assert_eq!(cache.clear_expired().await.unwrap(), 2);
    assert!(cache.get("u1", "Bench Press").await.unwrap().is_some());
    assert_eq!(store.get("unrelated").await.unwrap().as_deref(), Some("kept"));
}
