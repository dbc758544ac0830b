//! Generic bounded map with per-entry absolute expiry.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

pub struct TTLCache<K, V> {
    entries: HashMap<K, (V, Instant)>,
    max_size: usize,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V> TTLCache<K, V> {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_size,
            ttl,
        }
    }

    /// Returns the value if present and not expired. Does not extend TTL.
    /// An expired entry found on read is removed and treated as absent.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if let Some((_, deadline)) = self.entries.get(key) {
            if *deadline <= Instant::now() {
                self.entries.remove(key);
                return None;
            }
        }
        self.entries.get(key).map(|(v, _)| v)
    }

    /// Removes and returns the value if present and not expired.
    pub fn pop(&mut self, key: &K) -> Option<V> {
        match self.entries.remove(key) {
            Some((value, deadline)) if deadline > Instant::now() => Some(value),
            _ => None,
        }
    }

    /// Inserts or replaces, resetting TTL. Evicts the entry closest to
    /// expiry when the cache is full and `key` is not already present.
    pub fn set(&mut self, key: K, value: V) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_closest_to_expiry();
        }
        let deadline = Instant::now() + self.ttl;
        self.entries.insert(key, (value, deadline));
    }

    /// Idempotent.
    pub fn delete(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry whose deadline has passed, returning them so the
    /// caller can release any resources they hold.
    pub fn expire(&mut self) -> Vec<(K, V)> {
        let now = Instant::now();
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, (_, deadline))| *deadline <= now)
            .map(|(k, _)| k.clone())
            .collect();
        expired_keys
            .into_iter()
            .filter_map(|k| self.entries.remove(&k).map(|(v, _)| (k, v)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sweeps expired entries, then returns an iterator over what remains.
    /// Expired entries are dropped in place, not returned to the caller;
    /// use `expire()` directly when the evicted values must be cleaned up.
    pub fn iter_live(&mut self) -> impl Iterator<Item = (&K, &V)> {
        let _ = self.expire();
        self.entries.iter().map(|(k, (v, _))| (k, v))
    }

    fn evict_closest_to_expiry(&mut self) {
        if let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, (_, deadline))| *deadline)
            .map(|(k, _)| k.clone())
        {
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut cache: TTLCache<&str, i32> = TTLCache::new(4, Duration::from_secs(60));
        cache.set("a", 1);
        assert_eq!(cache.get(&"a"), Some(&1));
    }

    #[test]
    fn pop_removes_entry() {
        let mut cache: TTLCache<&str, i32> = TTLCache::new(4, Duration::from_secs(60));
        cache.set("a", 1);
        assert_eq!(cache.pop(&"a"), Some(1));
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn expired_entries_are_treated_as_absent() {
        let mut cache: TTLCache<&str, i32> = TTLCache::new(4, Duration::from_millis(1));
        cache.set("a", 1);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.pop(&"a"), None);
    }

    #[test]
    fn full_cache_evicts_closest_to_expiry() {
        let mut cache: TTLCache<&str, i32> = TTLCache::new(2, Duration::from_millis(30));
        cache.set("soon", 1);
        std::thread::sleep(Duration::from_millis(10));
        cache.set("later", 2);
        cache.set("newest", 3);
        // "soon" had the earliest deadline and should have been evicted.
        assert_eq!(cache.get(&"soon"), None);
        assert_eq!(cache.get(&"later"), Some(&2));
        assert_eq!(cache.get(&"newest"), Some(&3));
    }

    #[test]
    fn expire_sweeps_all_past_deadlines_and_returns_them() {
        let mut cache: TTLCache<&str, i32> = TTLCache::new(4, Duration::from_millis(1));
        cache.set("a", 1);
        cache.set("b", 2);
        std::thread::sleep(Duration::from_millis(20));
        let mut expired = cache.expire();
        expired.sort_by_key(|(k, _)| *k);
        assert_eq!(expired, vec![("a", 1), ("b", 2)]);
        assert_eq!(cache.len(), 0);
    }
}
