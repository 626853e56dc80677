//! TTL Cache - sharded, capacity-bounded, least-recently-used eviction
//!
//! Each shard is an `lru::LruCache` behind its own `parking_lot::Mutex`, so
//! concurrent readers and writers on different keys rarely contend. The
//! capacity bound is global: a shared length counter triggers eviction, and
//! the victim is an expired entry of the inserting shard if there is one,
//! else the least recently used entry across all shards (global stamps).
//! Values are handed out as `Arc<V>`: a hit returns the very object that
//! was stored.
//!
//! Expired entries are unreachable: `get` drops them on sight and
//! `purge_expired` sweeps the rest.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};

const DEFAULT_SHARDS: usize = 16;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

struct Entry<V> {
    value: Arc<V>,
    expires_at: Instant,
    /// Global recency stamp, larger is newer
    stamp: u64,
}

type Shard<K, V> = LruCache<K, Entry<V>>;

/// Remove expired entries from one shard, returns how many went
fn purge_shard<K: Hash + Eq + Clone, V>(shard: &mut Shard<K, V>, now: Instant) -> usize {
    let expired: Vec<K> = shard.iter()
        .filter(|(_, e)| e.expires_at <= now)
        .map(|(k, _)| k.clone())
        .collect();
    for key in &expired {
        shard.pop(key);
    }
    expired.len()
}

/// Cache counters for health endpoints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub size: usize,
    pub capacity: usize,
}

// ============================================================================
// TTL CACHE
// ============================================================================

pub struct TtlCache<K, V> {
    shards: Box<[Mutex<Shard<K, V>>]>,
    capacity: usize,
    len: AtomicUsize,
    tick: AtomicU64,
    hasher: RandomState,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K: Hash + Eq + Clone, V> TtlCache<K, V> {
    /// Cache on the system clock with the default shard count
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self::with_shards(capacity, DEFAULT_SHARDS, clock)
    }

    /// Shard count only affects lock contention; the bound and LRU order are global
    pub fn with_shards(capacity: usize, shards: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = capacity.max(1);
        let shards = shards.clamp(1, capacity);

        Self {
            shards: (0..shards).map(|_| Mutex::new(LruCache::unbounded())).collect(),
            capacity,
            len: AtomicUsize::new(0),
            tick: AtomicU64::new(0),
            hasher: RandomState::new(),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn shard_index(&self, key: &K) -> usize {
        (self.hasher.hash_one(key) as usize) % self.shards.len()
    }

    fn next_stamp(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Look up a live entry and mark it most recently used
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let now = self.clock.now();
        let stamp = self.next_stamp();
        let mut shard = self.shards[self.shard_index(key)].lock();

        let found = shard.get_mut(key).map(|entry| {
            if entry.expires_at <= now {
                None
            } else {
                entry.stamp = stamp;
                Some(Arc::clone(&entry.value))
            }
        });

        match found {
            Some(Some(value)) => {
                drop(shard);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Some(None) => {
                shard.pop(key);
                self.len.fetch_sub(1, Ordering::AcqRel);
                drop(shard);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                drop(shard);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Peek without touching recency or counters
    pub fn contains(&self, key: &K) -> bool {
        let now = self.clock.now();
        self.shards[self.shard_index(key)].lock().peek(key).is_some_and(|e| e.expires_at > now)
    }

    pub fn insert(&self, key: K, value: V, ttl: Duration) -> Arc<V> {
        let value = Arc::new(value);
        self.insert_arc(key, Arc::clone(&value), ttl);
        value
    }

    /// Store a shared value; replaces any previous entry for the key
    pub fn insert_arc(&self, key: K, value: Arc<V>, ttl: Duration) {
        let now = self.clock.now();
        let home = self.shard_index(&key);
        let entry = Entry { value, expires_at: now + ttl, stamp: self.next_stamp() };

        {
            let mut shard = self.shards[home].lock();
            if shard.put(key, entry).is_none() {
                self.len.fetch_add(1, Ordering::AcqRel);
            }
        }

        while self.len.load(Ordering::Acquire) > self.capacity {
            if !self.evict_one(home, now) {
                break;
            }
        }
    }

    /// Free one slot: expired entries of `home` first, else the global LRU entry.
    /// Never holds two shard locks at once.
    fn evict_one(&self, home: usize, now: Instant) -> bool {
        {
            let mut shard = self.shards[home].lock();
            let purged = purge_shard(&mut shard, now);
            if purged > 0 {
                self.len.fetch_sub(purged, Ordering::AcqRel);
                return true;
            }
        }

        let oldest = self.shards.iter()
            .enumerate()
            .filter_map(|(idx, shard)| shard.lock().peek_lru().map(|(_, e)| (e.stamp, idx)))
            .min();

        let Some((_, idx)) = oldest else {
            return false;
        };
        let mut shard = self.shards[idx].lock();
        if shard.pop_lru().is_some() {
            self.len.fetch_sub(1, Ordering::AcqRel);
        }
        true
    }

    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        let mut shard = self.shards[self.shard_index(key)].lock();
        let entry = shard.pop(key)?;
        self.len.fetch_sub(1, Ordering::AcqRel);
        Some(entry.value)
    }

    /// Drop every expired entry, returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.shards.iter()
            .map(|s| {
                let mut shard = s.lock();
                let purged = purge_shard(&mut shard, now);
                self.len.fetch_sub(purged, Ordering::AcqRel);
                purged
            })
            .sum()
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        for shard in self.shards.iter() {
            let mut shard = shard.lock();
            let n = shard.len();
            shard.clear();
            self.len.fetch_sub(n, Ordering::AcqRel);
        }
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            hits,
            misses,
            hit_rate: if total > 0 { hits as f64 / total as f64 } else { 0.0 },
            size: self.len(),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::cache::ManualClock;

    #[test]
    fn test_get_returns_same_object() {
        let cache: TtlCache<String, String> = TtlCache::new(8);
        let stored = cache.insert("k".into(), "v".into(), Duration::from_secs(60));
        let fetched = cache.get(&"k".to_string()).unwrap();
        assert!(Arc::ptr_eq(&stored, &fetched));
    }

    #[test]
    fn test_entry_expires_with_clock() {
        let clock = ManualClock::new();
        let cache: TtlCache<u32, u32> = TtlCache::with_clock(8, clock.clone());
        cache.insert(1, 10, Duration::from_secs(30));

        clock.advance(Duration::from_secs(29));
        assert_eq!(cache.get(&1).as_deref(), Some(&10));

        clock.advance(Duration::from_secs(1));
        assert!(cache.get(&1).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_eviction_single_shard() {
        let clock = ManualClock::new();
        let cache: TtlCache<u32, u32> = TtlCache::with_shards(2, 1, clock);
        let ttl = Duration::from_secs(60);

        cache.insert(1, 1, ttl);
        cache.insert(2, 2, ttl);
        // touch 1 so 2 becomes the oldest
        assert!(cache.get(&1).is_some());
        cache.insert(3, 3, ttl);

        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_expired_entries_evicted_before_live_ones() {
        let clock = ManualClock::new();
        let cache: TtlCache<u32, u32> = TtlCache::with_shards(2, 1, clock.clone());

        cache.insert(1, 1, Duration::from_secs(60));
        cache.insert(2, 2, Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));
        cache.insert(3, 3, Duration::from_secs(60));

        assert!(cache.contains(&1));
        assert!(cache.contains(&3));
    }

    #[test]
    fn test_purge_and_stats() {
        let clock = ManualClock::new();
        let cache: TtlCache<u32, u32> = TtlCache::with_clock(32, clock.clone());
        for i in 0..10 {
            cache.insert(i, i, Duration::from_secs(if i < 4 { 1 } else { 100 }));
        }
        clock.advance(Duration::from_secs(5));
        assert_eq!(cache.purge_expired(), 4);
        assert_eq!(cache.len(), 6);

        cache.get(&5);
        cache.get(&0);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 6);
        assert!((stats.hit_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_access() {
        let cache: Arc<TtlCache<u32, u32>> = Arc::new(TtlCache::new(1024));
        let handles: Vec<_> = (0..8u32)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200u32 {
                        let key = t * 1000 + i;
                        cache.insert(key, i, Duration::from_secs(60));
                        assert_eq!(cache.get(&key).as_deref(), Some(&i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(cache.len() <= cache.capacity());
    }

    #[test]
    fn test_capacity_bound_is_global() {
        let cache: TtlCache<u32, u32> = TtlCache::new(20);
        for i in 0..200 {
            cache.insert(i, i, Duration::from_secs(60));
            assert!(cache.len() <= cache.capacity());
        }
        assert_eq!(cache.len(), 20);
        assert_eq!(cache.stats().size, 20);
        // the 20 most recent survive
        assert!((180..200).all(|i| cache.contains(&i)));
        assert!(!cache.contains(&179));
    }

    #[test]
    fn test_no_eviction_below_capacity() {
        let cache: TtlCache<u32, u32> = TtlCache::new(16);
        for i in 0..16 {
            cache.insert(i, i, Duration::from_secs(60));
        }
        assert_eq!(cache.len(), 16);
        assert!((0..16).all(|i| cache.contains(&i)));
    }

    #[test]
    fn test_lru_order_spans_shards() {
        let cache: TtlCache<u32, u32> = TtlCache::with_shards(4, 4, ManualClock::new());
        let ttl = Duration::from_secs(60);
        for i in 1..=4 {
            cache.insert(i, i, ttl);
        }
        assert!(cache.get(&1).is_some());
        cache.insert(5, 5, ttl);

        assert!(!cache.contains(&2));
        assert!([1, 3, 4, 5].iter().all(|k| cache.contains(k)));
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_replace_and_remove_keep_length() {
        let cache: TtlCache<u32, u32> = TtlCache::new(8);
        let ttl = Duration::from_secs(60);
        cache.insert(1, 1, ttl);
        cache.insert(1, 2, ttl);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1).as_deref(), Some(&2));
        assert_eq!(cache.remove(&1).as_deref(), Some(&2));
        assert!(cache.is_empty());
        cache.insert(2, 2, ttl);
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
