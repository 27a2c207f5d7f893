//! Hash-bucketed secondary index
//!
//! Maps an index key (tag key, endpoint key, edge type) to the ordered set of
//! entity keys carrying it. Empty buckets are dropped so that a missing bucket
//! and an empty one are indistinguishable to callers.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct SecondaryIndex<K, V> {
    buckets: FxHashMap<K, BTreeSet<V>>,
}

impl<K, V> SecondaryIndex<K, V>
where
    K: Eq + Hash + Clone,
    V: Ord + Clone,
{
    pub fn new() -> Self {
        Self {
            buckets: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.buckets.entry(key).or_default().insert(value);
    }

    pub fn remove(&mut self, key: &K, value: &V) {
        if let Some(values) = self.buckets.get_mut(key) {
            values.remove(value);
            if values.is_empty() {
                self.buckets.remove(key);
            }
        }
    }

    /// Bucket for `key`, never empty when present
    pub fn get(&self, key: &K) -> Option<&BTreeSet<V>> {
        self.buckets.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.buckets.contains_key(key)
    }

    /// Number of distinct index keys
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl<K, V> Default for SecondaryIndex<K, V>
where
    K: Eq + Hash + Clone,
    V: Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
