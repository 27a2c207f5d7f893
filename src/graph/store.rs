//! Entity storage and graph errors
//!
//! `EntityStore` is the authoritative collection for one entity kind. Values
//! are held behind `Arc` and never mutated in place: `put` swaps in a new
//! record. Index maintenance is the caller's job.

use super::types::{EdgeKey, EdgeType};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use thiserror::Error;

/// Outcome class of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    Ok,
    NotFound,
    Conflict,
    BadRequest,
    InternalError,
}

impl StatusCode {
    pub fn is_ok(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "NotFound",
            StatusCode::Conflict => "Conflict",
            StatusCode::BadRequest => "BadRequest",
            StatusCode::InternalError => "InternalError",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(String),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeKey),

    #[error("Node {0} already exists")]
    NodeAlreadyExists(String),

    #[error("Edge {0} already exists")]
    EdgeAlreadyExists(EdgeKey),

    #[error("Unique index violation: {tag}={value} already belongs to node {existing}")]
    UniqueIndexViolation {
        tag: String,
        value: String,
        existing: String,
    },

    #[error("Foreign key {edge_type}: tag {tag} references missing node {target}")]
    ForeignKeyTargetMissing {
        edge_type: EdgeType,
        tag: String,
        target: String,
    },

    #[error("Invalid edge {edge}: node {node} does not exist")]
    MissingEdgeNode { edge: EdgeKey, node: String },

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GraphError {
    pub fn status(&self) -> StatusCode {
        match self {
            GraphError::NodeNotFound(_) | GraphError::EdgeNotFound(_) => StatusCode::NotFound,
            GraphError::NodeAlreadyExists(_)
            | GraphError::EdgeAlreadyExists(_)
            | GraphError::UniqueIndexViolation { .. }
            | GraphError::ForeignKeyTargetMissing { .. }
            | GraphError::MissingEdgeNode { .. }
            | GraphError::QuotaExceeded(_) => StatusCode::Conflict,
            GraphError::BadRequest(_) => StatusCode::BadRequest,
            GraphError::Internal(_) => StatusCode::InternalError,
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Key -> immutable record map with O(1) lookup
#[derive(Debug)]
pub struct EntityStore<K, V> {
    entries: FxHashMap<K, Arc<V>>,
}

impl<K, V> EntityStore<K, V>
where
    K: Eq + Hash + Ord + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Replace (or insert) the record under `key`, returning the previous one
    pub fn put(&mut self, key: K, value: V) -> Option<Arc<V>> {
        self.entries.insert(key, Arc::new(value))
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unordered enumeration
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Arc<V>)> {
        self.entries.iter()
    }

    /// All records ordered by key
    pub fn values_sorted(&self) -> Vec<Arc<V>> {
        let mut entries: Vec<(&K, &Arc<V>)> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, v)| Arc::clone(v)).collect()
    }

    /// Fully independent copy: records are cloned, not shared
    pub fn deep_clone(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), Arc::new(V::clone(v))))
                .collect(),
        }
    }
}

/// Shallow copy: a new map sharing the immutable records
impl<K: Clone, V> Clone for EntityStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<K, V> Default for EntityStore<K, V>
where
    K: Eq + Hash + Ord + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Node, Tags};

    #[test]
    fn test_put_replaces_record() {
        let mut store: EntityStore<String, Node> = EntityStore::new();
        assert!(store.put("n1".to_string(), Node::new("n1")).is_none());

        let before = Arc::clone(store.get("n1").unwrap());
        let prior = store.put("n1".to_string(), Node::new_with_tags("n1", Tags::parse("a")));

        assert!(Arc::ptr_eq(&prior.unwrap(), &before));
        assert_eq!(before.tags.to_string(), "");
        assert_eq!(store.get("n1").unwrap().tags.to_string(), "a");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_and_contains() {
        let mut store: EntityStore<String, Node> = EntityStore::new();
        store.put("n1".to_string(), Node::new("n1"));
        assert!(store.contains_key("n1"));
        assert!(store.remove("n1").is_some());
        assert!(!store.contains_key("n1"));
        assert!(store.remove("n1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_shallow_and_deep_copies() {
        let mut store: EntityStore<String, Node> = EntityStore::new();
        store.put("n1".to_string(), Node::new("n1"));

        let shallow = store.clone();
        let deep = store.deep_clone();
        assert!(Arc::ptr_eq(shallow.get("n1").unwrap(), store.get("n1").unwrap()));
        assert!(!Arc::ptr_eq(deep.get("n1").unwrap(), store.get("n1").unwrap()));

        store.put("n2".to_string(), Node::new("n2"));
        assert_eq!(shallow.len(), 1);
        assert_eq!(deep.len(), 1);
    }

    #[test]
    fn test_values_sorted() {
        let mut store: EntityStore<String, Node> = EntityStore::new();
        for key in ["c", "a", "b"] {
            store.put(key.to_string(), Node::new(key));
        }
        let keys: Vec<String> = store.values_sorted().iter().map(|n| n.key.clone()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_error_status() {
        assert_eq!(GraphError::NodeNotFound("x".into()).status(), StatusCode::NotFound);
        assert_eq!(GraphError::NodeAlreadyExists("x".into()).status(), StatusCode::Conflict);
        assert_eq!(GraphError::BadRequest("x".into()).status(), StatusCode::BadRequest);
        assert_eq!(GraphError::Internal("x".into()).status(), StatusCode::InternalError);
    }
}
