//! Suggestion caching over the key-value store port.

pub mod memory_store;
pub mod suggestion_cache;

pub use memory_store::MemoryKeyValueStore;
pub use suggestion_cache::{CacheEntry, CacheStats, SuggestionCache, CACHE_PREFIX};
