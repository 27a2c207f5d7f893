//! Foreign-key cascade
//!
//! A node declares foreign keys as `edge type -> tag key pattern`. Every tag
//! of the node whose key matches a declared pattern and whose value is set
//! names a target node, and the cascade keeps exactly one edge
//! `(node -> target, edge type)` per such tag.
//!
//! The engine works in two phases so that a failing statement leaves the
//! graph untouched:
//! 1. [`plan`] derives the wanted edges and validates every target.
//! 2. [`apply`] removes stale cascade edges and creates the missing ones.

use crate::graph::{Edge, EdgeKey, GraphError, GraphMap, GraphResult, Node};
use std::collections::BTreeSet;
use tracing::debug;

/// Cascade edges a node should have, computed from its current tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadePlan {
    source: String,
    wanted: BTreeSet<EdgeKey>,
}

impl CascadePlan {
    pub fn wanted(&self) -> &BTreeSet<EdgeKey> {
        &self.wanted
    }
}

/// Edges created and removed by one `apply`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub added: Vec<EdgeKey>,
    pub removed: Vec<EdgeKey>,
}

/// Wanted cascade edges of `node`, without validation
pub fn derive_edges(node: &Node) -> BTreeSet<EdgeKey> {
    let mut wanted = BTreeSet::new();
    for edge_type in node.foreign_keys.keys() {
        let Some(pattern) = node.foreign_key_pattern(edge_type) else {
            continue;
        };
        for (tag, value) in node.tags.iter() {
            // A null value names no target
            let Some(target) = value else {
                continue;
            };
            if pattern.matches(tag.as_str()) {
                wanted.insert(EdgeKey::new(node.key.clone(), target, edge_type.clone()));
            }
        }
    }
    wanted
}

/// Phase 1: derive the cascade edges of `new` and check that every target
/// exists. A node may reference itself.
pub fn plan(graph: &GraphMap, new: &Node) -> GraphResult<CascadePlan> {
    let wanted = derive_edges(new);
    for key in &wanted {
        if key.to_key != new.key && !graph.nodes.contains_key(&key.to_key) {
            let tag = new
                .tags
                .iter()
                .find(|(_, value)| *value == Some(key.to_key.as_str()))
                .map(|(tag, _)| tag.to_string())
                .unwrap_or_default();
            return Err(GraphError::ForeignKeyTargetMissing {
                edge_type: key.edge_type.clone(),
                tag,
                target: key.to_key.clone(),
            });
        }
    }

    Ok(CascadePlan {
        source: new.key.clone(),
        wanted,
    })
}

/// Phase 2: bring the graph's cascade edges in line with `plan`. The source
/// node must already be stored.
///
/// Only derived edges are removed. A wanted key already held by an edge
/// written with `add edge` is left as it is.
pub fn apply(graph: &mut GraphMap, plan: &CascadePlan) -> CascadeOutcome {
    let mut outcome = CascadeOutcome::default();

    let existing: Vec<EdgeKey> = graph
        .edges
        .outgoing(&plan.source)
        .into_iter()
        .filter(|key| graph.edge(key).is_some_and(|edge| edge.derived))
        .collect();

    for key in existing {
        if !plan.wanted.contains(&key) && graph.remove_edge(&key).is_some() {
            graph.metrics().nodes.record_foreign_key_removed();
            debug!("Foreign key edge removed: {}", key);
            outcome.removed.push(key);
        }
    }

    for key in &plan.wanted {
        if graph.edges.contains_key(key) {
            continue;
        }
        graph.put_edge(Edge::derived(
            key.from_key.clone(),
            key.to_key.clone(),
            key.edge_type.clone(),
        ));
        graph.metrics().nodes.record_foreign_key_added();
        debug!("Foreign key edge added: {}", key);
        outcome.added.push(key.clone());
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeType, Tags};

    fn node_with_fk(key: &str, tags: &str, fks: &[(&str, &str)]) -> Node {
        let mut node = Node::new_with_tags(key, Tags::parse(tags));
        for (edge_type, pattern) in fks {
            node.foreign_keys
                .insert(EdgeType::new(*edge_type), pattern.to_string());
        }
        node
    }

    fn sync(graph: &mut GraphMap, new: &Node) -> CascadeOutcome {
        let plan = plan(graph, new).unwrap();
        apply(graph, &plan)
    }

    fn graph_with(keys: &[&str]) -> GraphMap {
        let mut graph = GraphMap::new();
        for key in keys {
            graph.put_node(Node::new(*key)).unwrap();
        }
        graph
    }

    #[test]
    fn test_wildcard_pattern_derives_one_edge_per_tag() {
        let node = node_with_fk("n", "email1=A,email2=B,other=C", &[("email", "email*")]);
        let wanted = derive_edges(&node);
        assert_eq!(
            wanted.into_iter().collect::<Vec<_>>(),
            vec![EdgeKey::new("n", "A", "email"), EdgeKey::new("n", "B", "email")]
        );
    }

    #[test]
    fn test_literal_pattern_and_null_values() {
        let node = node_with_fk("n", "email=A,email2=B", &[("email", "email")]);
        assert_eq!(derive_edges(&node).len(), 1);

        let null = node_with_fk("n", "email", &[("email", "email")]);
        assert!(derive_edges(&null).is_empty());
    }

    #[test]
    fn test_missing_target_is_rejected() {
        let graph = graph_with(&[]);
        let node = node_with_fk("node8", "email=X", &[("email", "email")]);
        let err = plan(&graph, &node).unwrap_err();
        assert_eq!(
            err,
            GraphError::ForeignKeyTargetMissing {
                edge_type: EdgeType::new("email"),
                tag: "email".to_string(),
                target: "X".to_string(),
            }
        );
    }

    #[test]
    fn test_self_reference_allowed() {
        let graph = graph_with(&[]);
        let node = node_with_fk("n", "parent=n", &[("parent", "parent")]);
        assert!(plan(&graph, &node).is_ok());
    }

    #[test]
    fn test_apply_adds_and_removes() {
        let mut graph = graph_with(&["A", "B"]);
        let v1 = node_with_fk("n", "email1=A,email2=B", &[("email", "email*")]);
        graph.put_node(v1.clone()).unwrap();
        let outcome = sync(&mut graph, &v1);
        assert_eq!(outcome.added.len(), 2);
        assert_eq!(graph.edges.len(), 2);

        // Tag removal drops exactly its edge
        let v2 = node_with_fk("n", "email1=A", &[("email", "email*")]);
        graph.put_node(v2.clone()).unwrap();
        let outcome = sync(&mut graph, &v2);
        assert_eq!(outcome.removed, vec![EdgeKey::new("n", "B", "email")]);
        assert!(outcome.added.is_empty());

        // Declaration removal drops the rest
        let v3 = node_with_fk("n", "email1=A", &[]);
        graph.put_node(v3.clone()).unwrap();
        let outcome = sync(&mut graph, &v3);
        assert_eq!(outcome.removed, vec![EdgeKey::new("n", "A", "email")]);
        assert!(graph.edges.is_empty());

        let snapshot = graph.metrics_snapshot();
        assert_eq!(snapshot.nodes.foreign_key_added, 2);
        assert_eq!(snapshot.nodes.foreign_key_removed, 2);
    }

    #[test]
    fn test_unrelated_edges_untouched() {
        let mut graph = graph_with(&["A"]);
        graph.put_edge(Edge::new("n", "A", "knows"));
        let v1 = node_with_fk("n", "email=A", &[("email", "email")]);
        graph.put_node(v1.clone()).unwrap();
        sync(&mut graph, &v1);

        let v2 = node_with_fk("n", "", &[]);
        sync(&mut graph, &v2);
        assert!(graph.edges.contains_key(&EdgeKey::new("n", "A", "knows")));
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn test_manual_edge_of_foreign_key_type_is_kept() {
        let mut graph = graph_with(&["A", "Z"]);
        graph.put_edge(Edge::new("n", "Z", "email"));
        let v1 = node_with_fk("n", "email=A", &[("email", "email")]);
        graph.put_node(v1.clone()).unwrap();
        sync(&mut graph, &v1);
        assert!(graph.edge(&EdgeKey::new("n", "A", "email")).unwrap().derived);

        let v2 = node_with_fk("n", "email=A,note=1", &[("email", "email")]);
        graph.put_node(v2.clone()).unwrap();
        let outcome = sync(&mut graph, &v2);
        assert!(outcome.removed.is_empty());
        assert!(graph.edges.contains_key(&EdgeKey::new("n", "Z", "email")));
        assert_eq!(graph.metrics_snapshot().nodes.foreign_key_removed, 0);
    }

    #[test]
    fn test_existing_manual_edge_is_not_adopted() {
        let mut graph = graph_with(&["A"]);
        graph.put_edge(Edge::new("n", "A", "email"));
        let v1 = node_with_fk("n", "email=A", &[("email", "email")]);
        graph.put_node(v1.clone()).unwrap();
        assert!(sync(&mut graph, &v1).added.is_empty());

        let v2 = node_with_fk("n", "", &[]);
        assert!(sync(&mut graph, &v2).removed.is_empty());
        assert!(!graph.edge(&EdgeKey::new("n", "A", "email")).unwrap().derived);
    }
}
