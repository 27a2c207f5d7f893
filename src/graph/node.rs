//! Node record
//!
//! Nodes are immutable values: every write produces a new `Node` that replaces
//! the stored one wholesale, so a snapshot never observes a half-applied
//! update.

use super::data::DataLink;
use super::glob::GlobPattern;
use super::tags::{TagKey, Tags};
use super::types::EdgeType;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A node in the property graph
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// Globally unique primary key
    pub key: String,

    pub tags: Tags,

    /// Opaque links, in insertion order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,

    /// Data name -> blob reference
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data_map: BTreeMap<String, DataLink>,

    /// Edge type -> tag key glob pattern
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub foreign_keys: BTreeMap<EdgeType, String>,

    /// Tag keys enforced as unique for this node
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub indexes: BTreeSet<TagKey>,

    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl Node {
    /// Create a new node with no tags
    pub fn new(key: impl Into<String>) -> Self {
        let now = Utc::now();
        Node {
            key: key.into(),
            tags: Tags::new(),
            links: Vec::new(),
            data_map: BTreeMap::new(),
            foreign_keys: BTreeMap::new(),
            indexes: BTreeSet::new(),
            created_date: now,
            updated_date: now,
        }
    }

    /// Create a new node with tags
    pub fn new_with_tags(key: impl Into<String>, tags: Tags) -> Self {
        Node {
            tags,
            ..Node::new(key)
        }
    }

    /// Copy of this node marked as modified now; `created_date` is kept
    pub fn touched(&self) -> Self {
        Node {
            updated_date: Utc::now(),
            ..self.clone()
        }
    }

    /// `(tag key, value)` pairs this node claims in the unique index
    pub fn unique_entries(&self) -> Vec<(TagKey, Option<String>)> {
        self.indexes
            .iter()
            .filter_map(|index_key| {
                self.tags
                    .get_by_key(index_key)
                    .map(|value| (index_key.clone(), value.map(str::to_string)))
            })
            .collect()
    }

    /// Compiled tag-key pattern for a declared foreign key
    pub fn foreign_key_pattern(&self, edge_type: &EdgeType) -> Option<GlobPattern> {
        self.foreign_keys
            .get(edge_type)
            .map(|pattern| GlobPattern::new_ignore_case(pattern))
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    pub fn get_tag(&self, key: &str) -> Option<Option<&str>> {
        self.tags.get(key)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.tags == other.tags
            && self.links == other.links
            && self.data_map == other.data_map
            && self.foreign_keys == other.foreign_keys
            && self.indexes == other.indexes
    }
}

impl Eq for Node {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_node() {
        let node = Node::new_with_tags("node1", Tags::parse("t1,t2=v2"));
        assert_eq!(node.key, "node1");
        assert_eq!(node.tags.to_string(), "t1,t2=v2");
        assert!(node.has_tag("T1"));
        assert_eq!(node.get_tag("t2"), Some(Some("v2")));
        assert_eq!(node.created_date, node.updated_date);
    }

    #[test]
    fn test_touched_keeps_created_date() {
        let node = Node::new("n");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let touched = node.touched();
        assert_eq!(touched.created_date, node.created_date);
        assert!(touched.updated_date > node.updated_date);
    }

    #[test]
    fn test_unique_entries_skip_missing_tags() {
        let mut node = Node::new_with_tags("n", Tags::parse("email=a@x,name"));
        node.indexes.insert(TagKey::from("email"));
        node.indexes.insert(TagKey::from("name"));
        node.indexes.insert(TagKey::from("phone"));

        let entries = node.unique_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], (TagKey::from("email"), Some("a@x".to_string())));
        assert_eq!(entries[1], (TagKey::from("name"), None));
    }

    #[test]
    fn test_foreign_key_pattern() {
        let mut node = Node::new("n");
        node.foreign_keys.insert(EdgeType::new("email"), "email*".to_string());
        let pattern = node.foreign_key_pattern(&EdgeType::new("email")).unwrap();
        assert!(pattern.matches("Email2"));
        assert!(node.foreign_key_pattern(&EdgeType::new("other")).is_none());
    }

    #[test]
    fn test_node_equality_ignores_dates() {
        let a = Node::new("n");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = Node::new("n");
        assert_eq!(a, b);
        assert_ne!(a, Node::new("m"));
    }
}
