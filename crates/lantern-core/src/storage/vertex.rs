//! # Vertex Store
//!
//! Key → (value, expiration). Sharded with `DashMap`, so a write locks only
//! the shard that owns its key and reads never wait on a store-wide lock.

use crate::types::{CacheKey, CacheValue};
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone)]
struct VertexEntry<V> {
    value: V,
    expiration: DateTime<Utc>,
}

impl<V> VertexEntry<V> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expiration
    }
}

/// Concurrent vertex storage with per-entry expiration.
pub struct VertexStore<K, V> {
    entries: DashMap<K, VertexEntry<V>>,
}

impl<K: CacheKey, V: CacheValue> VertexStore<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert or replace. Value and expiration are swapped in together.
    pub fn put(&self, key: K, value: V, expiration: DateTime<Utc>) {
        self.entries.insert(key, VertexEntry { value, expiration });
    }

    /// Current value, or `None` if absent or already expired.
    ///
    /// Expired entries read as absent even before the sweeper removes them.
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    /// Current value with its expiration.
    pub fn get_entry(&self, key: &K, now: DateTime<Utc>) -> Option<(V, DateTime<Utc>)> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| (entry.value.clone(), entry.expiration))
    }

    /// Remove immediately. Returns whether an entry (live or not) existed.
    pub fn delete(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the stored keys, used to sweep shard by shard.
    pub fn keys(&self) -> Vec<K> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Remove `key` if it has expired by `now`.
    ///
    /// The expiration is re-checked under the shard lock, so an entry
    /// refreshed by a concurrent put survives.
    pub fn evict_if_expired(&self, key: &K, now: DateTime<Utc>) -> bool {
        self.entries
            .remove_if(key, |_, entry| !entry.is_live(now))
            .is_some()
    }
}

impl<K: CacheKey, V: CacheValue> Default for VertexStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn put_then_get() {
        let store: VertexStore<String, i64> = VertexStore::new();
        let now = Utc::now();
        store.put("a".into(), 1, now + TimeDelta::seconds(10));

        assert_eq!(store.get(&"a".into(), now), Some(1));
        assert_eq!(store.get(&"b".into(), now), None);
    }

    #[test]
    fn overwrite_replaces_value_and_expiration() {
        let store: VertexStore<String, i64> = VertexStore::new();
        let now = Utc::now();
        store.put("a".into(), 1, now + TimeDelta::seconds(10));
        store.put("a".into(), 2, now + TimeDelta::seconds(1));

        assert_eq!(store.get(&"a".into(), now), Some(2));
        assert_eq!(store.get(&"a".into(), now + TimeDelta::seconds(2)), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn expired_reads_as_absent_before_eviction() {
        let store: VertexStore<String, i64> = VertexStore::new();
        let now = Utc::now();
        let expiration = now + TimeDelta::seconds(1);
        store.put("a".into(), 1, expiration);

        assert_eq!(store.get(&"a".into(), expiration), None);
        assert_eq!(store.len(), 1);

        assert!(store.evict_if_expired(&"a".into(), expiration));
        assert!(store.is_empty());
    }

    #[test]
    fn eviction_spares_live_entries() {
        let store: VertexStore<String, i64> = VertexStore::new();
        let now = Utc::now();
        store.put("a".into(), 1, now + TimeDelta::seconds(5));

        assert!(!store.evict_if_expired(&"a".into(), now));
        assert_eq!(store.get(&"a".into(), now), Some(1));
    }

    #[test]
    fn delete_is_idempotent() {
        let store: VertexStore<String, i64> = VertexStore::new();
        store.put("a".into(), 1, Utc::now() + TimeDelta::seconds(5));

        assert!(store.delete(&"a".into()));
        assert!(!store.delete(&"a".into()));
    }
}
