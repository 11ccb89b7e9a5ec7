// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Adaptive replacement cache (Megiddo & Modha, FAST '03).
//!
//! Resident entries live in two lists: `t1` holds keys seen once recently,
//! `t2` keys seen at least twice. The ghost lists `b1` and `b2` remember keys
//! recently evicted from `t1` and `t2` respectively, without their values. A hit
//! in a ghost list shifts the adaptive target `p` (the preferred size of `t1`)
//! towards recency or frequency, so a long scan of one-off keys cannot flush
//! the frequently used ones.

use std::{hash::Hash, num::NonZeroUsize};

use hashlink::{LinkedHashMap, LinkedHashSet};
use parking_lot::Mutex;

/// Thread-safe, bounded adaptive replacement cache. All list manipulation
/// happens under one mutex; no I/O is performed while it is held.
pub struct ArcCache<K, V> {
    inner: Mutex<ArcState<K, V>>,
}

struct ArcState<K, V> {
    capacity: usize,
    /// Target size of `t1`.
    p: usize,
    t1: LinkedHashMap<K, V>,
    t2: LinkedHashMap<K, V>,
    b1: LinkedHashSet<K>,
    b2: LinkedHashSet<K>,
}

impl<K, V> ArcCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(ArcState {
                capacity: capacity.get(),
                p: 0,
                t1: LinkedHashMap::new(),
                t2: LinkedHashMap::new(),
                b1: LinkedHashSet::new(),
                b2: LinkedHashSet::new(),
            }),
        }
    }

    /// Looks up a key, promoting it to the frequency list on a hit.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.inner.lock();
        if let Some(value) = state.t1.remove(key) {
            state.t2.insert(key.clone(), value.clone());
            return Some(value);
        }
        state.t2.to_back(key).map(|value| value.clone())
    }

    /// Returns `true` if the key is resident. Does not update recency.
    pub fn contains(&self, key: &K) -> bool {
        let state = self.inner.lock();
        state.t1.contains_key(key) || state.t2.contains_key(key)
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.lock().insert(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut state = self.inner.lock();
        state.t1.remove(key).or_else(|| state.t2.remove(key))
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        let state = self.inner.lock();
        state.t1.len() + state.t2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.p = 0;
        state.t1.clear();
        state.t2.clear();
        state.b1.clear();
        state.b2.clear();
    }

    #[cfg(test)]
    fn recency_target(&self) -> usize {
        self.inner.lock().p
    }
}

impl<K, V> ArcState<K, V>
where
    K: Hash + Eq + Clone,
{
    fn is_full(&self) -> bool {
        self.t1.len() + self.t2.len() >= self.capacity
    }

    fn insert(&mut self, key: K, value: V) {
        if self.t1.remove(&key).is_some() {
            self.t2.insert(key, value);
            return;
        }
        if self.t2.contains_key(&key) {
            self.t2.insert(key, value);
            return;
        }

        if self.b1.contains(&key) {
            let delta = match (self.b1.len(), self.b2.len()) {
                (b1, b2) if b2 > b1 => b2 / b1,
                _ => 1,
            };
            self.p = (self.p + delta).min(self.capacity);
            if self.is_full() {
                self.replace(false);
            }
            self.b1.remove(&key);
            self.t2.insert(key, value);
            return;
        }

        if self.b2.contains(&key) {
            let delta = match (self.b1.len(), self.b2.len()) {
                (b1, b2) if b1 > b2 => b1 / b2,
                _ => 1,
            };
            self.p = self.p.saturating_sub(delta);
            if self.is_full() {
                self.replace(true);
            }
            self.b2.remove(&key);
            self.t2.insert(key, value);
            return;
        }

        if self.is_full() {
            self.replace(false);
        }
        if self.b1.len() > self.capacity - self.p {
            self.b1.pop_front();
        }
        if self.b2.len() > self.p {
            self.b2.pop_front();
        }
        self.t1.insert(key, value);
    }

    /// Evicts one resident entry into the matching ghost list.
    fn replace(&mut self, ghost_hit_in_b2: bool) {
        let t1_len = self.t1.len();
        let evict_t1 = t1_len > 0
            && (t1_len > self.p || (t1_len == self.p && ghost_hit_in_b2) || self.t2.is_empty());
        if evict_t1 {
            if let Some((key, _)) = self.t1.pop_front() {
                push_ghost(&mut self.b1, key, self.capacity);
            }
        } else if let Some((key, _)) = self.t2.pop_front() {
            push_ghost(&mut self.b2, key, self.capacity);
        }
    }
}

fn push_ghost<K: Hash + Eq>(ghosts: &mut LinkedHashSet<K>, key: K, capacity: usize) {
    ghosts.insert(key);
    while ghosts.len() > capacity {
        ghosts.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nonzero_ext::nonzero;
    use std::sync::Arc;

    #[test]
    fn get_and_insert() {
        let cache = ArcCache::new(nonzero!(4usize));
        assert!(cache.is_empty());
        cache.insert(1, "one");
        cache.insert(2, "two");
        assert_eq!(cache.get(&1), Some("one"));
        assert_eq!(cache.get(&3), None);
        assert_eq!(cache.len(), 2);
        cache.insert(1, "uno");
        assert_eq!(cache.get(&1), Some("uno"));
        assert_eq!(cache.remove(&2), Some("two"));
        assert!(!cache.contains(&2));
    }

    #[test]
    fn never_exceeds_capacity() {
        let cache = ArcCache::new(nonzero!(16usize));
        for i in 0..1000u32 {
            cache.insert(i % 97, i);
            if i % 3 == 0 {
                cache.get(&(i % 13));
            }
            assert!(cache.len() <= 16);
        }
        assert_eq!(cache.capacity(), 16);
    }

    #[test]
    fn frequent_entries_survive_a_scan() {
        let cache = ArcCache::new(nonzero!(4usize));
        cache.insert("hot-a".to_string(), 0);
        cache.insert("hot-b".to_string(), 0);
        assert!(cache.get(&"hot-a".to_string()).is_some());
        assert!(cache.get(&"hot-b".to_string()).is_some());

        let scan: Vec<String> = (0..100).map(|i| format!("scan-{i}")).collect();
        for key in &scan {
            cache.insert(key.clone(), 1);
        }
        assert!(cache.contains(&"hot-a".to_string()));
        assert!(cache.contains(&"hot-b".to_string()));
        assert!(!cache.contains(&scan[0]));
        assert!(cache.contains(&scan[99]));
    }

    #[test]
    fn ghost_hit_adapts_towards_recency() {
        let cache = ArcCache::new(nonzero!(2usize));
        cache.insert(1, ());
        cache.insert(2, ());
        // evicts 1 into the recency ghost list
        cache.insert(3, ());
        assert!(!cache.contains(&1));
        assert_eq!(cache.recency_target(), 0);
        cache.insert(1, ());
        assert_eq!(cache.recency_target(), 1);
        assert!(cache.contains(&1));
        assert!(cache.len() <= 2);
    }

    #[test]
    fn clear_resets() {
        let cache = ArcCache::new(nonzero!(2usize));
        cache.insert(1, ());
        cache.insert(2, ());
        cache.insert(3, ());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.recency_target(), 0);
    }

    #[test]
    fn concurrent_access() {
        let cache = Arc::new(ArcCache::new(nonzero!(64usize)));
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..2_000u64 {
                        let key = (i * 7 + t) % 200;
                        if cache.get(&key).is_none() {
                            cache.insert(key, key * 2);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 64);
        for key in 0..200u64 {
            if let Some(value) = cache.get(&key) {
                assert_eq!(value, key * 2);
            }
        }
    }
}
