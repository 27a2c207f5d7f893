//! Node store with its tag and unique indexes
//!
//! Writes are check-then-apply: `put` validates every unique claim of the new
//! record before touching the store or any index.

use super::secondary::SecondaryIndex;
use super::unique::UniqueIndex;
use crate::graph::{EntityStore, GraphResult, Node, TagKey};
use crate::metrics::{IndexLookup, StoreMetrics};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    store: EntityStore<String, Node>,
    tags: SecondaryIndex<TagKey, String>,
    unique: UniqueIndex,
}

impl NodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unmetered key access for internal existence checks
    pub fn get(&self, key: &str) -> Option<&Arc<Node>> {
        self.store.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// All nodes ordered by key, unmetered
    pub fn all(&self) -> Vec<Arc<Node>> {
        self.store.values_sorted()
    }

    pub fn lookup_key(&self, key: &str, metrics: &StoreMetrics) -> Option<Arc<Node>> {
        let found = self.store.get(key).cloned();
        metrics.record_probe(found.is_some());
        found
    }

    /// Keys of every node carrying `tag`
    pub fn lookup_tag(&self, tag: &TagKey, metrics: &StoreMetrics) -> BTreeSet<String> {
        let bucket = self.tags.get(tag).cloned().unwrap_or_default();
        metrics.record_probe(!bucket.is_empty());
        bucket
    }

    pub fn lookup_unique(
        &self,
        tag: &TagKey,
        value: Option<&str>,
        metrics: &StoreMetrics,
    ) -> Option<String> {
        let found = self.unique.get(tag, value).map(str::to_string);
        metrics.record_probe(found.is_some());
        found
    }

    pub fn has_unique_index(&self, tag: &TagKey) -> bool {
        self.unique.has_tag(tag)
    }

    /// True when every node carrying `tag` also claims it in the unique
    /// index, so a unique probe answers a `tag=value` search completely
    pub fn unique_covers(&self, tag: &TagKey) -> bool {
        let tagged = self.tags.get(tag).map(|bucket| bucket.len()).unwrap_or(0);
        tagged > 0 && self.unique.count(tag) == tagged
    }

    /// Full scan, ordered by key
    pub fn scan(&self, metrics: &StoreMetrics) -> Vec<Arc<Node>> {
        metrics.record_lookup(IndexLookup::Scan);
        self.store.values_sorted()
    }

    /// Validate the unique claims of `node` without applying anything
    pub fn check(&self, node: &Node) -> GraphResult<()> {
        self.unique.check(&node.key, &node.unique_entries())
    }

    /// Insert or replace a node, keeping both indexes in step.
    /// Returns the replaced record.
    pub fn put(&mut self, node: Node, metrics: &StoreMetrics) -> GraphResult<Option<Arc<Node>>> {
        self.check(&node)?;

        let key = node.key.clone();
        let new_claims = node.unique_entries();
        let new_tags: BTreeSet<TagKey> = node.tags.keys().cloned().collect();

        let previous = self.store.put(key.clone(), node);
        match &previous {
            Some(old) => {
                for (tag, value) in old.unique_entries() {
                    if !new_claims.contains(&(tag.clone(), value.clone())) {
                        self.unique.remove(&tag, &value, &key);
                    }
                }
                for tag in old.tags.keys() {
                    if !new_tags.contains(tag) {
                        self.tags.remove(tag, &key);
                    }
                }
                metrics.record_updated();
            }
            None => metrics.record_added(),
        }

        for (tag, value) in new_claims {
            self.unique.insert(tag, value, &key);
        }
        for tag in new_tags {
            self.tags.insert(tag, key.clone());
        }
        Ok(previous)
    }

    pub fn remove(&mut self, key: &str, metrics: &StoreMetrics) -> Option<Arc<Node>> {
        let removed = self.store.remove(key)?;
        for (tag, value) in removed.unique_entries() {
            self.unique.remove(&tag, &value, key);
        }
        for tag in removed.tags.keys() {
            self.tags.remove(tag, &key.to_string());
        }
        metrics.record_deleted();
        Some(removed)
    }

    /// Independent copy with cloned records
    pub fn deep_clone(&self) -> Self {
        Self {
            store: self.store.deep_clone(),
            tags: self.tags.clone(),
            unique: self.unique.clone(),
        }
    }

    pub fn unique_entry_count(&self) -> usize {
        self.unique.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphError, Tags};

    fn indexed(key: &str, tags: &str, unique: &[&str]) -> Node {
        let mut node = Node::new_with_tags(key, Tags::parse(tags));
        node.indexes = unique.iter().map(|t| TagKey::from(*t)).collect();
        node
    }

    #[test]
    fn test_put_maintains_tag_index() {
        let metrics = StoreMetrics::new();
        let mut index = NodeIndex::new();
        index.put(Node::new_with_tags("n1", Tags::parse("a,b=1")), &metrics).unwrap();
        index.put(Node::new_with_tags("n2", Tags::parse("b=2")), &metrics).unwrap();

        let probe = StoreMetrics::new();
        assert_eq!(index.lookup_tag(&TagKey::from("B"), &probe).len(), 2);

        index.put(Node::new_with_tags("n1", Tags::parse("a")), &metrics).unwrap();
        let bucket = index.lookup_tag(&TagKey::from("b"), &probe);
        assert_eq!(bucket.into_iter().collect::<Vec<_>>(), vec!["n2".to_string()]);

        let snapshot = metrics.snapshot(index.len());
        assert_eq!(snapshot.added, 2);
        assert_eq!(snapshot.updated, 1);
        assert_eq!(probe.snapshot(0).index_hit, 2);
    }

    #[test]
    fn test_unique_violation_leaves_state_untouched() {
        let metrics = StoreMetrics::new();
        let mut index = NodeIndex::new();
        index.put(indexed("node1", "t1=v1", &["t1"]), &metrics).unwrap();

        let err = index.put(indexed("node2", "t1=v1,x", &["t1"]), &metrics).unwrap_err();
        assert!(matches!(err, GraphError::UniqueIndexViolation { .. }));
        assert!(!index.contains_key("node2"));
        assert!(index.lookup_tag(&TagKey::from("x"), &metrics).is_empty());
        assert_eq!(index.unique_entry_count(), 1);
    }

    #[test]
    fn test_value_change_moves_unique_entry() {
        let metrics = StoreMetrics::new();
        let mut index = NodeIndex::new();
        index.put(indexed("node1", "t1=v1", &["t1"]), &metrics).unwrap();
        index.put(indexed("node1", "t1=v2", &["t1"]), &metrics).unwrap();

        assert_eq!(index.lookup_unique(&TagKey::from("t1"), Some("v1"), &metrics), None);
        assert_eq!(
            index.lookup_unique(&TagKey::from("t1"), Some("v2"), &metrics),
            Some("node1".to_string())
        );

        // v1 is free again
        index.put(indexed("node2", "t1=v1", &["t1"]), &metrics).unwrap();
        assert_eq!(index.unique_entry_count(), 2);
        assert!(index.unique_covers(&TagKey::from("t1")));

        index.put(Node::new_with_tags("node3", Tags::parse("t1=v3")), &metrics).unwrap();
        assert!(!index.unique_covers(&TagKey::from("t1")));
    }

    #[test]
    fn test_remove_clears_indexes() {
        let metrics = StoreMetrics::new();
        let mut index = NodeIndex::new();
        index.put(indexed("node1", "t1=v1", &["t1"]), &metrics).unwrap();
        assert!(index.remove("node1", &metrics).is_some());
        assert!(index.remove("node1", &metrics).is_none());

        assert_eq!(index.unique_entry_count(), 0);
        assert!(!index.has_unique_index(&TagKey::from("t1")));
        assert_eq!(metrics.snapshot(0).deleted, 1);
    }

    #[test]
    fn test_lookup_metrics() {
        let metrics = StoreMetrics::new();
        let mut index = NodeIndex::new();
        index.put(Node::new("n1"), &metrics).unwrap();

        assert!(index.lookup_key("n1", &metrics).is_some());
        assert!(index.lookup_key("zz", &metrics).is_none());
        assert_eq!(index.scan(&metrics).len(), 1);

        let snapshot = metrics.snapshot(index.len());
        assert_eq!((snapshot.index_hit, snapshot.index_missed, snapshot.index_scan), (1, 1, 1));
    }
}
