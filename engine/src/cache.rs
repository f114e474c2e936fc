//! Translation result cache.
//!
//! An in-memory, append-only map from the semantic identity of a request
//! (see [`crate::classify::cache_key`]) to its accepted translation. Entries
//! live for the process lifetime and are never evicted or overwritten; this
//! is a deliberate choice for session-scale workloads and a known
//! memory-growth limitation for long-running reuse.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared, append-only cache of accepted translations.
///
/// Concurrent access needs only insert-if-absent semantics: the first
/// accepted value for a key wins and later writes for the same key are
/// dropped.
#[derive(Clone, Default)]
pub struct TranslationCache {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl TranslationCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the accepted translation for a key, if any.
    pub fn get(&self, key: &str) -> Option<String> {
        let cache = self.inner.read().expect("TranslationCache lock poisoned");
        cache.get(key).cloned()
    }

    /// Stores a translation unless the key is already present.
    ///
    /// Returns the value now held for the key, which is the existing entry
    /// when one was written first by another worker.
    pub fn insert_if_absent(&self, key: &str, value: String) -> String {
        let mut cache = self.inner.write().expect("TranslationCache lock poisoned");
        cache.entry(key.to_string()).or_insert(value).clone()
    }

    /// Number of cached translations.
    pub fn len(&self) -> usize {
        let cache = self.inner.read().expect("TranslationCache lock poisoned");
        cache.len()
    }

    /// True when nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_miss_then_hit() {
        let cache = TranslationCache::new();
        assert!(cache.get("k").is_none());

        cache.insert_if_absent("k", "v".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_write_wins() {
        let cache = TranslationCache::new();
        let first = cache.insert_if_absent("k", "first".to_string());
        let second = cache.insert_if_absent("k", "second".to_string());

        assert_eq!(first, "first");
        assert_eq!(second, "first");
        assert_eq!(cache.get("k").as_deref(), Some("first"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = TranslationCache::new();
        let clone = cache.clone();
        clone.insert_if_absent("k", "v".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }
}
