//! `GraphMap`: aggregate root of the graph state
//!
//! Owns the node and edge collections with their indexes, plus the metrics
//! collector that records writes and lookups made through it.

use super::edge::Edge;
use super::node::Node;
use super::store::GraphResult;
use super::types::EdgeKey;
use crate::index::{EdgeIndex, NodeIndex};
use crate::metrics::{GraphMetrics, MetricsSnapshot};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct GraphMap {
    pub nodes: NodeIndex,
    pub edges: EdgeIndex,
    metrics: Arc<GraphMetrics>,
}

impl GraphMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &Arc<GraphMetrics> {
        &self.metrics
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.nodes.len(), self.edges.len())
    }

    /// Working copy for a batch: shares records, owns its collections and
    /// starts with zeroed counters.
    pub fn fork(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            metrics: Arc::new(GraphMetrics::new()),
        }
    }

    /// Copy sharing the stored records but no collection, index or counter
    /// state with `self`.
    pub fn shallow_copy(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            metrics: Arc::new(self.metrics.copy()),
        }
    }

    /// Fully independent copy
    pub fn deep_clone(&self) -> Self {
        Self {
            nodes: self.nodes.deep_clone(),
            edges: self.edges.deep_clone(),
            metrics: Arc::new(self.metrics.copy()),
        }
    }

    pub fn node(&self, key: &str) -> Option<&Arc<Node>> {
        self.nodes.get(key)
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<&Arc<Edge>> {
        self.edges.get(key)
    }

    pub fn put_node(&mut self, node: Node) -> GraphResult<Option<Arc<Node>>> {
        self.nodes.put(node, &self.metrics.nodes)
    }

    pub fn remove_node(&mut self, key: &str) -> Option<Arc<Node>> {
        self.nodes.remove(key, &self.metrics.nodes)
    }

    pub fn put_edge(&mut self, edge: Edge) -> Option<Arc<Edge>> {
        self.edges.put(edge, &self.metrics.edges)
    }

    pub fn remove_edge(&mut self, key: &EdgeKey) -> Option<Arc<Edge>> {
        self.edges.remove(key, &self.metrics.edges)
    }

    /// Remove a node together with every edge touching it.
    /// Returns the node and the removed edges.
    pub fn remove_node_cascading(&mut self, key: &str) -> Option<(Arc<Node>, Vec<Arc<Edge>>)> {
        let node = self.remove_node(key)?;
        let mut removed = Vec::new();
        for edge_key in self.edges.incident(key) {
            if let Some(edge) = self.remove_edge(&edge_key) {
                if edge.derived && edge.starts_from(key) {
                    self.metrics.nodes.record_foreign_key_removed();
                }
                removed.push(edge);
            }
        }
        Some((node, removed))
    }
}
