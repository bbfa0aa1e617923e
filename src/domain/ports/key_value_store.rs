//! Durable key-value storage port.

use std::borrow::Cow;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// String key to string value storage that survives restarts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> DomainResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> DomainResult<()>;

    /// Remove a key. Returns whether it existed.
    async fn remove(&self, key: &str) -> DomainResult<bool>;

    /// All keys starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> DomainResult<Vec<String>>;
}

/// Percent-encode the separator characters of one key segment.
///
/// Composite keys join segments with `:` or `_` (and lists with `,`).
/// Escaping every joiner plus `%` makes the encoding injective, so two
/// different segment tuples never produce the same key and a `{segment}:`
/// prefix never matches a key whose first segment merely starts with it.
pub fn escape_key_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains(['%', ':', ',', '_']) {
        return Cow::Borrowed(segment);
    }
    let mut escaped = String::with_capacity(segment.len() + 8);
    for c in segment.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            ':' => escaped.push_str("%3A"),
            ',' => escaped.push_str("%2C"),
            '_' => escaped.push_str("%5F"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_segment_is_borrowed() {
        assert!(matches!(escape_key_segment("Bench Press"), Cow::Borrowed("Bench Press")));
    }

    #[test]
    fn test_separators_are_escaped() {
        assert_eq!(escape_key_segment("alice:x"), "alice%3Ax");
        assert_eq!(escape_key_segment("a,b"), "a%2Cb");
        assert_eq!(escape_key_segment("lifter_1"), "lifter%5F1");
        assert_eq!(escape_key_segment("100%3A"), "100%253A");
    }

    #[test]
    fn test_joined_segments_do_not_collide() {
        let join = |a: &str, b: &str| format!("{}:{}", escape_key_segment(a), escape_key_segment(b));
        assert_ne!(join("alice:x", "squat"), join("alice", "x:squat"));
        assert_ne!(join("a%3A", "b"), join("a:", "b"));
    }
}
