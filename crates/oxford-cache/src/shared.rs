//! A concurrently readable cache over [`WeightBalancedTree`].
//!
//! Readers load the current root and search it without taking any lock.
//! Writers serialize on a mutex, build a new tree from the current one, and
//! publish it with a single atomic store, so a reader always sees either the
//! old tree or the new one in full.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::tree::WeightBalancedTree;

/// Specialization cache keyed by `i64`.
pub struct SpecializationCache<V> {
    root: ArcSwap<WeightBalancedTree<V>>,
    writer: Mutex<()>,
}

impl<V> Default for SpecializationCache<V> {
    fn default() -> Self {
        Self {
            root: ArcSwap::from_pointee(WeightBalancedTree::new()),
            writer: Mutex::new(()),
        }
    }
}

impl<V> std::fmt::Debug for SpecializationCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecializationCache")
            .field("len", &self.root.load().len())
            .finish()
    }
}

impl<V> SpecializationCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current tree. Later updates do not affect it.
    pub fn snapshot(&self) -> Arc<WeightBalancedTree<V>> {
        self.root.load_full()
    }

    pub fn len(&self) -> usize {
        self.root.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.load().is_empty()
    }
}

impl<V: Clone> SpecializationCache<V> {
    /// Lock-free lookup.
    pub fn get(&self, key: i64) -> Option<V> {
        self.root.load().get(key).cloned()
    }

    /// Bind `key` to `value` unless it is already bound.
    ///
    /// Returns whichever value the cache holds for `key` afterwards, so
    /// racing callers all observe the first value published.
    pub fn put_if_absent(&self, key: i64, value: V) -> V {
        if let Some(existing) = self.get(key) {
            return existing;
        }
        let _guard = self.writer.lock();
        let current = self.root.load_full();
        if let Some(existing) = current.get(key) {
            return existing.clone();
        }
        self.root.store(Arc::new(current.insert(key, value.clone())));
        value
    }

    /// Bind `key` to `value`, replacing any previous binding.
    pub fn insert(&self, key: i64, value: V) {
        let _guard = self.writer.lock();
        let current = self.root.load_full();
        self.root.store(Arc::new(current.insert(key, value)));
    }

    /// Remove `key`, returning the value it was bound to.
    pub fn remove(&self, key: i64) -> Option<V> {
        let _guard = self.writer.lock();
        let current = self.root.load_full();
        let (next, value) = current.remove(key)?;
        self.root.store(Arc::new(next));
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn first_value_wins() {
        let cache = SpecializationCache::new();
        assert_eq!(cache.put_if_absent(3, "first"), "first");
        assert_eq!(cache.put_if_absent(3, "second"), "first");
        assert_eq!(cache.get(3), Some("first"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn snapshots_are_stable() {
        let cache = SpecializationCache::new();
        cache.insert(1, 10);
        let before = cache.snapshot();
        cache.insert(2, 20);
        assert_eq!(cache.remove(1), Some(10));
        assert_eq!(before.len(), 1);
        assert_eq!(before.get(1), Some(&10));
        assert_eq!(cache.get(1), None);
        assert_eq!(cache.remove(1), None);
    }

    #[test]
    fn racing_writers_agree_on_one_value() {
        let cache = Arc::new(SpecializationCache::new());
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    cache.put_if_absent(42, Arc::new(i))
                })
            })
            .collect();
        let winners: Vec<Arc<i32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let stored = cache.get(42).unwrap();
        assert!(winners.iter().all(|w| Arc::ptr_eq(w, &stored)));
    }

    #[test]
    fn concurrent_distinct_keys_all_land() {
        let cache = Arc::new(SpecializationCache::new());
        std::thread::scope(|scope| {
            for t in 0..4i64 {
                let cache = Arc::clone(&cache);
                scope.spawn(move || {
                    for k in 0..250 {
                        cache.put_if_absent(t * 1000 + k, k);
                    }
                });
            }
        });
        assert_eq!(cache.len(), 1000);
        cache.snapshot().check_invariants().unwrap();
    }
}
