//! Edge record
//!
//! An edge is identified by `(from, to, type)`; at most one edge of a given
//! type connects the same ordered pair of nodes.

use super::tags::Tags;
use super::types::{EdgeKey, EdgeType};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A directed edge in the property graph
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    /// Source node key (edge goes FROM this node)
    pub from_key: String,

    /// Target node key (edge goes TO this node)
    pub to_key: String,

    pub edge_type: EdgeType,

    pub tags: Tags,

    pub created_date: DateTime<Utc>,

    /// Set on edges created by a foreign-key declaration of the source node
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub derived: bool,
}

impl Edge {
    /// Create a new directed edge
    pub fn new(
        from_key: impl Into<String>,
        to_key: impl Into<String>,
        edge_type: impl Into<EdgeType>,
    ) -> Self {
        Edge {
            from_key: from_key.into(),
            to_key: to_key.into(),
            edge_type: edge_type.into(),
            tags: Tags::new(),
            created_date: Utc::now(),
            derived: false,
        }
    }

    /// Edge owned by the foreign-key cascade
    pub fn derived(
        from_key: impl Into<String>,
        to_key: impl Into<String>,
        edge_type: impl Into<EdgeType>,
    ) -> Self {
        Edge {
            derived: true,
            ..Edge::new(from_key, to_key, edge_type)
        }
    }

    /// Create a new edge with tags
    pub fn new_with_tags(
        from_key: impl Into<String>,
        to_key: impl Into<String>,
        edge_type: impl Into<EdgeType>,
        tags: Tags,
    ) -> Self {
        Edge {
            tags,
            ..Edge::new(from_key, to_key, edge_type)
        }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(
            self.from_key.clone(),
            self.to_key.clone(),
            self.edge_type.clone(),
        )
    }

    /// Copy of this edge carrying `tags`
    pub fn with_tags(&self, tags: Tags) -> Self {
        Edge {
            tags,
            ..self.clone()
        }
    }

    /// Check if this edge goes FROM a specific node
    pub fn starts_from(&self, node_key: &str) -> bool {
        self.from_key == node_key
    }

    /// Check if this edge goes TO a specific node
    pub fn ends_at(&self, node_key: &str) -> bool {
        self.to_key == node_key
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.from_key == other.from_key
            && self.to_key == other.to_key
            && self.edge_type == other.edge_type
            && self.tags == other.tags
            && self.derived == other.derived
    }
}

impl Eq for Edge {}
