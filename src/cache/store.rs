//! Cache Store Module
//!
//! Generic cache engine combining HashMap storage with oldest-first capacity
//! eviction and age-based expiration.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::cache::{CacheEntry, CacheStats, EvictionOrder, EvictionQueue, DEFAULT_EXPIRY_SECONDS};
use crate::error::{AuthError, Result};

// == Bounded Timed Cache ==
/// Cache bounded both by entry count and by entry age.
///
/// Once a `put` pushes the entry count above `max_size`, the oldest entries
/// are evicted in one sweep until exactly `size` remain. An entry added more
/// than the expiry ago is treated as absent by every read, however recently it
/// was touched, but keeps its capacity slot until a read or a purge removes it.
#[derive(Debug)]
pub struct BoundedTimedCache<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Eviction candidates, oldest at the back
    queue: EvictionQueue<K>,
    /// Performance statistics
    stats: CacheStats,
    /// Entry count restored by an eviction sweep
    size: usize,
    /// Entry count that triggers an eviction sweep once exceeded
    max_size: usize,
    expiry_seconds: u64,
    expiry: Duration,
    eviction_order: EvictionOrder,
}

impl<K, V> BoundedTimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `size` - Entry count left after an eviction sweep
    /// * `max_size` - Entry count above which a sweep runs
    ///
    /// Both must be positive and `size` must be below `max_size`.
    pub fn new(size: usize, max_size: usize) -> Result<Self> {
        if size == 0 || max_size == 0 {
            return Err(AuthError::invalid("size and maxsize must be > 0"));
        }
        if size >= max_size {
            return Err(AuthError::invalid("size must be < maxsize"));
        }
        Ok(Self {
            entries: HashMap::new(),
            queue: EvictionQueue::new(),
            stats: CacheStats::new(),
            size,
            max_size,
            expiry_seconds: DEFAULT_EXPIRY_SECONDS,
            expiry: Duration::seconds(DEFAULT_EXPIRY_SECONDS as i64),
            eviction_order: EvictionOrder::default(),
        })
    }

    /// Selects which event moves an entry to the back of the eviction line.
    pub fn with_eviction_order(mut self, order: EvictionOrder) -> Self {
        self.eviction_order = order;
        self
    }

    // == Expiry ==
    /// Returns the age, in seconds, after which entries expire.
    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    /// Sets the age, in seconds, after which entries expire.
    pub fn set_expiry(&mut self, seconds: u64) -> Result<()> {
        if seconds == 0 {
            return Err(AuthError::invalid("seconds must be > 0"));
        }
        let expiry = i64::try_from(seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AuthError::invalid(format!("expiry of {} seconds is too large", seconds)))?;
        self.expiry_seconds = seconds;
        self.expiry = expiry;
        Ok(())
    }

    // == Put ==
    /// Stores a value, replacing any previous entry for the key.
    ///
    /// The entry starts fresh: both timestamps are set to now and the key
    /// becomes the newest eviction candidate.
    pub fn put(&mut self, key: K, value: V) {
        self.put_at(key, value, Utc::now());
    }

    pub(crate) fn put_at(&mut self, key: K, value: V, now: DateTime<Utc>) {
        self.entries.insert(key.clone(), CacheEntry::new(value, now));
        self.queue.push_newest(key);

        if self.entries.len() > self.max_size {
            self.evict_to_size();
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the value for a live entry and touches it.
    ///
    /// Absent and expired entries both return `None`; an expired entry is
    /// removed on the way out.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_at(key, Utc::now())
    }

    pub(crate) fn get_at<Q>(&mut self, key: &Q, now: DateTime<Utc>) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(self.expiry, now),
        };

        if expired {
            if let Some((stale_key, entry)) = self.entries.remove_entry(key) {
                debug!(
                    age_ms = entry.age(now).num_milliseconds(),
                    "dropping expired cache entry"
                );
                self.queue.remove(&stale_key);
            }
            self.stats.record_miss();
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.touch(now);
        let value = entry.value.clone();

        if self.eviction_order == EvictionOrder::LastTouched {
            if let Some((live_key, _)) = self.entries.get_key_value(key) {
                self.queue.push_newest(live_key.clone());
            }
        }

        self.stats.record_hit();
        Some(value)
    }

    // == Contains ==
    /// Returns true for a live entry, touching it like `get`.
    pub fn contains<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    #[cfg(test)]
    pub(crate) fn contains_at<Q>(&mut self, key: &Q, now: DateTime<Utc>) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_at(key, now).is_some()
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub(crate) fn purge_expired_at(&mut self, now: DateTime<Utc>) -> usize {
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(self.expiry, now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
            self.queue.remove(&key);
        }

        self.stats.record_expirations(count);
        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Evict To Size ==
    /// Drops the oldest entries until only `size` remain.
    fn evict_to_size(&mut self) {
        let before = self.entries.len();

        while self.entries.len() > self.size {
            match self.queue.pop_oldest() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }

        let evicted = before - self.entries.len();
        self.stats.record_evictions(evicted);
        info!(
            evicted,
            remaining = self.entries.len(),
            hit_rate = self.stats.hit_rate(),
            "cache over capacity, evicted oldest entries"
        );
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the number of entries physically present, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn keys(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn test_construct_fail() {
        let cases = [
            (0, 1, "size and maxsize must be > 0"),
            (1, 0, "size and maxsize must be > 0"),
            (2, 1, "size must be < maxsize"),
            (3, 3, "size must be < maxsize"),
        ];
        for (size, max_size, expected) in cases {
            let err = BoundedTimedCache::<String, u32>::new(size, max_size).unwrap_err();
            assert!(matches!(err, AuthError::InvalidArgument(_)));
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = BoundedTimedCache::new(2, 4).unwrap();

        cache.put("key1".to_string(), 7u32);

        assert_eq!(cache.get("key1"), Some(7));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("nonexistent"), None);
    }

    #[test]
    fn test_overwrite() {
        let mut cache = BoundedTimedCache::new(2, 4).unwrap();

        cache.put("key1".to_string(), "value1");
        cache.put("key1".to_string(), "value2");

        assert_eq!(cache.get("key1"), Some("value2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_to_low_water_mark() {
        let mut cache = BoundedTimedCache::new(2, 4).unwrap();
        let k = keys("k", 5);

        for key in &k[..4] {
            cache.put(key.clone(), ());
        }
        assert_eq!(cache.len(), 4);

        cache.put(k[4].clone(), ());

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("k1"));
        assert!(!cache.contains("k2"));
        assert!(!cache.contains("k3"));
        assert!(cache.contains("k4"));
        assert!(cache.contains("k5"));
        assert_eq!(cache.stats().evictions, 3);
    }

    #[test]
    fn test_eviction_ignores_touch_by_default() {
        let mut cache = BoundedTimedCache::new(2, 4).unwrap();
        let k = keys("k", 5);

        for key in &k[..4] {
            cache.put(key.clone(), ());
        }
        // Reading k1 extends its life but keeps its place in line.
        assert!(cache.contains("k1"));
        cache.put(k[4].clone(), ());

        assert!(!cache.contains("k1"));
        assert!(cache.contains("k4"));
        assert!(cache.contains("k5"));
    }

    #[test]
    fn test_eviction_reinsert_resets_position() {
        let mut cache = BoundedTimedCache::new(2, 4).unwrap();
        let k = keys("k", 5);

        for key in &k[..4] {
            cache.put(key.clone(), ());
        }
        cache.put(k[0].clone(), ());
        assert!(cache.contains("k2"));
        cache.put(k[4].clone(), ());

        let present: Vec<bool> = k.iter().map(|key| cache.contains(key.as_str())).collect();
        assert_eq!(present, vec![true, false, false, false, true]);
    }

    #[test]
    fn test_eviction_last_touched_protects_reads() {
        let mut cache = BoundedTimedCache::new(2, 4)
            .unwrap()
            .with_eviction_order(EvictionOrder::LastTouched);
        let k = keys("s", 5);

        cache.put(k[0].clone(), ());
        cache.put(k[1].clone(), ());
        assert!(cache.contains("s1"));
        cache.put(k[2].clone(), ());
        cache.put(k[3].clone(), ());
        assert!(cache.contains("s1"));
        cache.put(k[4].clone(), ());

        let present: Vec<bool> = k.iter().map(|key| cache.contains(key.as_str())).collect();
        assert_eq!(present, vec![true, false, false, false, true]);
    }

    #[test]
    fn test_expiry_measured_from_insertion() {
        let mut cache = BoundedTimedCache::new(2, 3).unwrap();
        cache.set_expiry(2).unwrap();
        let t0 = Utc::now();

        cache.put_at("key".to_string(), 1u8, t0);

        // Touching at 1.5s refreshes recency but not the lifetime.
        assert!(cache.contains_at("key", t0 + Duration::milliseconds(1500)));
        assert!(!cache.contains_at("key", t0 + Duration::milliseconds(2500)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expiry_then_refill() {
        let mut cache = BoundedTimedCache::new(2, 3).unwrap();
        cache.set_expiry(2).unwrap();
        let t0 = Utc::now();
        let k = keys("s", 4);

        cache.put_at(k[0].clone(), (), t0);
        assert!(cache.contains_at("s1", t0 + Duration::milliseconds(1500)));
        let t1 = t0 + Duration::milliseconds(2500);
        assert!(!cache.contains_at("s1", t1));

        // The expired read freed s1's slot, so three more puts fit.
        cache.put_at(k[1].clone(), (), t1);
        cache.put_at(k[2].clone(), (), t1 + Duration::milliseconds(50));
        cache.put_at(k[3].clone(), (), t1 + Duration::milliseconds(100));

        let now = t1 + Duration::milliseconds(150);
        let present: Vec<bool> = k.iter().map(|key| cache.contains_at(key.as_str(), now)).collect();
        assert_eq!(present, vec![false, true, true, true]);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_reinsert_restarts_lifetime() {
        let mut cache = BoundedTimedCache::new(2, 3).unwrap();
        cache.set_expiry(2).unwrap();
        let t0 = Utc::now();

        cache.put_at("key".to_string(), 1u8, t0);
        cache.put_at("key".to_string(), 2u8, t0 + Duration::seconds(1));

        assert_eq!(cache.get_at("key", t0 + Duration::milliseconds(2500)), Some(2));
    }

    #[test]
    fn test_expired_miss_removes_entry() {
        let mut cache = BoundedTimedCache::new(2, 3).unwrap();
        cache.set_expiry(1).unwrap();
        let t0 = Utc::now();

        cache.put_at("key".to_string(), 1u8, t0);
        assert_eq!(cache.get_at("key", t0 + Duration::seconds(2)), None);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_expired_entries_still_hold_capacity() {
        let mut cache = BoundedTimedCache::new(2, 3).unwrap();
        cache.set_expiry(1).unwrap();
        let t0 = Utc::now();

        cache.put_at("a".to_string(), (), t0);
        cache.put_at("b".to_string(), (), t0);
        cache.put_at("c".to_string(), (), t0 + Duration::seconds(5));
        assert_eq!(cache.len(), 3);

        cache.put_at("d".to_string(), (), t0 + Duration::seconds(5));

        assert_eq!(cache.len(), 2);
        let later = t0 + Duration::seconds(5);
        assert!(cache.contains_at("c", later));
        assert!(cache.contains_at("d", later));
    }

    #[test]
    fn test_purge_expired() {
        let mut cache = BoundedTimedCache::new(5, 10).unwrap();
        cache.set_expiry(10).unwrap();
        let t0 = Utc::now();

        cache.put_at("old".to_string(), (), t0);
        cache.put_at("new".to_string(), (), t0 + Duration::seconds(8));

        let removed = cache.purge_expired_at(t0 + Duration::seconds(12));

        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_at("new", t0 + Duration::seconds(12)));
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_set_expiry() {
        let mut cache = BoundedTimedCache::<String, ()>::new(1, 2).unwrap();
        assert_eq!(cache.expiry_seconds(), DEFAULT_EXPIRY_SECONDS);

        cache.set_expiry(2).unwrap();
        assert_eq!(cache.expiry_seconds(), 2);

        let err = cache.set_expiry(0).unwrap_err();
        assert_eq!(err.to_string(), "seconds must be > 0");
        assert!(cache.set_expiry(u64::MAX).is_err());
        assert_eq!(cache.expiry_seconds(), 2);
    }

    #[test]
    fn test_stats() {
        let mut cache = BoundedTimedCache::new(2, 4).unwrap();

        cache.put("key1".to_string(), 1u8);
        cache.get("key1");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
