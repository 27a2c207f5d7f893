//! Edge store with endpoint, type and tag indexes

use super::secondary::SecondaryIndex;
use crate::graph::{Edge, EdgeKey, EdgeType, EntityStore, TagKey};
use crate::metrics::{IndexLookup, StoreMetrics};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct EdgeIndex {
    store: EntityStore<EdgeKey, Edge>,
    from: SecondaryIndex<String, EdgeKey>,
    to: SecondaryIndex<String, EdgeKey>,
    types: SecondaryIndex<EdgeType, EdgeKey>,
    tags: SecondaryIndex<TagKey, EdgeKey>,
}

impl EdgeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &EdgeKey) -> Option<&Arc<Edge>> {
        self.store.get(key)
    }

    pub fn contains_key(&self, key: &EdgeKey) -> bool {
        self.store.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn all(&self) -> Vec<Arc<Edge>> {
        self.store.values_sorted()
    }

    pub fn lookup_key(&self, key: &EdgeKey, metrics: &StoreMetrics) -> Option<Arc<Edge>> {
        let found = self.store.get(key).cloned();
        metrics.record_probe(found.is_some());
        found
    }

    pub fn lookup_by_from_key(&self, node_key: &str, metrics: &StoreMetrics) -> BTreeSet<EdgeKey> {
        probe(self.from.get(&node_key.to_string()), metrics)
    }

    pub fn lookup_by_to_key(&self, node_key: &str, metrics: &StoreMetrics) -> BTreeSet<EdgeKey> {
        probe(self.to.get(&node_key.to_string()), metrics)
    }

    pub fn lookup_by_edge_type(
        &self,
        edge_type: &EdgeType,
        metrics: &StoreMetrics,
    ) -> BTreeSet<EdgeKey> {
        probe(self.types.get(edge_type), metrics)
    }

    pub fn lookup_tag(&self, tag: &TagKey, metrics: &StoreMetrics) -> BTreeSet<EdgeKey> {
        probe(self.tags.get(tag), metrics)
    }

    pub fn scan(&self, metrics: &StoreMetrics) -> Vec<Arc<Edge>> {
        metrics.record_lookup(IndexLookup::Scan);
        self.store.values_sorted()
    }

    /// Unmetered: edges leaving `node_key`
    pub fn outgoing(&self, node_key: &str) -> BTreeSet<EdgeKey> {
        self.from
            .get(&node_key.to_string())
            .cloned()
            .unwrap_or_default()
    }

    /// Unmetered: edges with `node_key` at either end
    pub fn incident(&self, node_key: &str) -> BTreeSet<EdgeKey> {
        let key = node_key.to_string();
        let mut keys = self.from.get(&key).cloned().unwrap_or_default();
        if let Some(incoming) = self.to.get(&key) {
            keys.extend(incoming.iter().cloned());
        }
        keys
    }

    /// Insert or replace an edge. Returns the replaced record.
    pub fn put(&mut self, edge: Edge, metrics: &StoreMetrics) -> Option<Arc<Edge>> {
        let key = edge.key();
        let new_tags: BTreeSet<TagKey> = edge.tags.keys().cloned().collect();

        let previous = self.store.put(key.clone(), edge);
        match &previous {
            Some(old) => {
                for tag in old.tags.keys() {
                    if !new_tags.contains(tag) {
                        self.tags.remove(tag, &key);
                    }
                }
                metrics.record_updated();
            }
            None => {
                self.from.insert(key.from_key.clone(), key.clone());
                self.to.insert(key.to_key.clone(), key.clone());
                self.types.insert(key.edge_type.clone(), key.clone());
                metrics.record_added();
            }
        }

        for tag in new_tags {
            self.tags.insert(tag, key.clone());
        }
        previous
    }

    pub fn remove(&mut self, key: &EdgeKey, metrics: &StoreMetrics) -> Option<Arc<Edge>> {
        let removed = self.store.remove(key)?;
        self.from.remove(&key.from_key, key);
        self.to.remove(&key.to_key, key);
        self.types.remove(&key.edge_type, key);
        for tag in removed.tags.keys() {
            self.tags.remove(tag, key);
        }
        metrics.record_deleted();
        Some(removed)
    }

    pub fn deep_clone(&self) -> Self {
        Self {
            store: self.store.deep_clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            types: self.types.clone(),
            tags: self.tags.clone(),
        }
    }
}

fn probe(bucket: Option<&BTreeSet<EdgeKey>>, metrics: &StoreMetrics) -> BTreeSet<EdgeKey> {
    let keys = bucket.cloned().unwrap_or_default();
    metrics.record_probe(!keys.is_empty());
    keys
}
