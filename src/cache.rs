//! Generic TTL result cache behind the invocation engine.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;

/// Key-value store for memoized results.
///
/// `Value::Null` is reserved to mean "absent": implementations never see
/// it stored (the engine rejects null results) and a miss is `None`.
/// Implementations must tolerate concurrent population of the same key;
/// the engine writes deterministic values, so last-write-wins is fine.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value, ttl: Duration);
}

/// A memoized result with its expiry deadline.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// In-process [`ResultCache`] with lazy TTL expiry.
///
/// Expired entries are dropped when probed again; [`MemoryCache::purge_expired`]
/// sweeps the rest. No eviction beyond TTL expiry.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.lock().retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        debug_assert!(!value.is_null(), "null is reserved for cache absence");
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().insert(key.to_string(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(600);

    #[test]
    fn test_get_absent_key() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("calc.a:00:00"), None);
    }

    #[test]
    fn test_set_then_get() {
        let cache = MemoryCache::new();
        cache.set("calc.a:00:00", json!({"Population": 656000}), TTL);
        assert_eq!(
            cache.get("calc.a:00:00"),
            Some(json!({"Population": 656000}))
        );
    }

    #[test]
    fn test_overwrite_same_key() {
        let cache = MemoryCache::new();
        cache.set("calc.a:00:00", json!(1), TTL);
        cache.set("calc.a:00:00", json!(2), TTL);
        assert_eq!(cache.get("calc.a:00:00"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache.set("calc.a:00:00", json!(1), Duration::ZERO);
        assert_eq!(cache.get("calc.a:00:00"), None);
        // The probe also reclaimed the slot.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired_keeps_live_entries() {
        let cache = MemoryCache::new();
        cache.set("stale", json!(1), Duration::ZERO);
        cache.set("live", json!(2), TTL);
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("live"), Some(json!(2)));
    }
}
