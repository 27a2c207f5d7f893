//! Core type definitions for the graph engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge type used when a statement does not name one
pub const DEFAULT_EDGE_TYPE: &str = "default";

/// Edge type (relationship type, e.g., "owns", "email")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeType(String);

impl EdgeType {
    pub fn new(edge_type: impl Into<String>) -> Self {
        EdgeType(edge_type.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_EDGE_TYPE
    }
}

impl Default for EdgeType {
    fn default() -> Self {
        EdgeType(DEFAULT_EDGE_TYPE.to_string())
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EdgeType {
    fn from(s: String) -> Self {
        EdgeType(s)
    }
}

impl From<&str> for EdgeType {
    fn from(s: &str) -> Self {
        EdgeType(s.to_string())
    }
}

/// Primary key of an edge: `(from, to, type)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeKey {
    pub from_key: String,
    pub to_key: String,
    pub edge_type: EdgeType,
}

impl EdgeKey {
    pub fn new(
        from_key: impl Into<String>,
        to_key: impl Into<String>,
        edge_type: impl Into<EdgeType>,
    ) -> Self {
        EdgeKey {
            from_key: from_key.into(),
            to_key: to_key.into(),
            edge_type: edge_type.into(),
        }
    }

    /// True when either endpoint is `node_key`
    pub fn touches(&self, node_key: &str) -> bool {
        self.from_key == node_key || self.to_key == node_key
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}({})", self.from_key, self.to_key, self.edge_type)
    }
}

/// Which collection an entity lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    Edge,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Edge => "edge",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_type_default() {
        let edge_type = EdgeType::default();
        assert_eq!(edge_type.as_str(), "default");
        assert!(edge_type.is_default());
        assert!(!EdgeType::new("owns").is_default());
    }

    #[test]
    fn test_edge_key_display() {
        let key = EdgeKey::new("a", "b", "knows");
        assert_eq!(format!("{}", key), "a->b(knows)");
        assert!(key.touches("a"));
        assert!(key.touches("b"));
        assert!(!key.touches("c"));
    }

    #[test]
    fn test_edge_key_ordering() {
        let k1 = EdgeKey::new("a", "b", "x");
        let k2 = EdgeKey::new("a", "c", "x");
        let k3 = EdgeKey::new("b", "a", "x");
        assert!(k1 < k2);
        assert!(k2 < k3);
    }
}
