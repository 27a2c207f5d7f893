//! Search chain evaluation
//!
//! A chain is evaluated left to right. The first step resolves its candidates
//! through the cheapest index that can serve one of its filters:
//!
//! | Step | Probe order |
//! |------|-------------|
//! | node | `key=` literal, unique `tag=value`, tag bucket, full scan |
//! | edge | `from=`, `to=`, `type=` literal, tag bucket, full scan |
//!
//! Later steps take their candidates from the previous step through the join
//! direction and only filter in memory. Each probe records exactly one of
//! hit, miss or scan.

use crate::graph::{
    Edge, EdgeKey, EdgeType, EntityKind, GlobPattern, GraphError, GraphMap, GraphResult, Node,
    TagKey, Tags,
};
use crate::metrics::GraphMetrics;
use crate::query::ast::{Direction, EdgeFilter, NodeFilter, SearchChain, SearchSpec};
use crate::query::executor::result::Selection;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Matches of one step
#[derive(Debug, Clone)]
pub enum StepMatches {
    Nodes(Vec<Arc<Node>>),
    Edges(Vec<Arc<Edge>>),
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub alias: Option<String>,
    pub matches: StepMatches,
}

impl StepResult {
    pub fn to_selection(&self) -> Selection {
        let (kind, nodes, edges) = match &self.matches {
            StepMatches::Nodes(nodes) => (
                EntityKind::Node,
                nodes.iter().map(|n| Node::clone(n)).collect(),
                Vec::new(),
            ),
            StepMatches::Edges(edges) => (
                EntityKind::Edge,
                Vec::new(),
                edges.iter().map(|e| Edge::clone(e)).collect(),
            ),
        };
        Selection {
            alias: self.alias.clone(),
            kind,
            nodes,
            edges,
        }
    }
}

/// Per-step matches of a whole chain
#[derive(Debug, Clone, Default)]
pub struct ChainResult {
    pub steps: Vec<StepResult>,
}

impl ChainResult {
    pub fn last(&self) -> Option<&StepResult> {
        self.steps.last()
    }

    /// Nodes of the final step (empty when it is an edge step)
    pub fn final_nodes(&self) -> Vec<Arc<Node>> {
        match self.last().map(|step| &step.matches) {
            Some(StepMatches::Nodes(nodes)) => nodes.clone(),
            _ => Vec::new(),
        }
    }

    /// Edges of every edge step, deduplicated, in key order
    pub fn all_edges(&self) -> Vec<Arc<Edge>> {
        let mut seen = BTreeSet::new();
        let mut edges = Vec::new();
        for step in &self.steps {
            if let StepMatches::Edges(step_edges) = &step.matches {
                for edge in step_edges {
                    if seen.insert(edge.key()) {
                        edges.push(Arc::clone(edge));
                    }
                }
            }
        }
        edges.sort_by_key(|edge| edge.key());
        edges
    }
}

/// What the previous step hands to the next one
enum Frontier {
    Nodes(BTreeSet<String>),
    Edges {
        edges: Vec<Arc<Edge>>,
        origin: Option<BTreeSet<String>>,
    },
}

pub struct QueryEvaluator<'a> {
    graph: &'a GraphMap,
    metrics: &'a GraphMetrics,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(graph: &'a GraphMap, metrics: &'a GraphMetrics) -> Self {
        Self { graph, metrics }
    }

    pub fn evaluate(&self, chain: &SearchChain) -> GraphResult<ChainResult> {
        if chain.steps.is_empty() {
            return Err(GraphError::BadRequest("Empty search".to_string()));
        }

        let mut result = ChainResult::default();
        let mut frontier: Option<Frontier> = None;

        for step in &chain.steps {
            let direction = step.join.unwrap_or(Direction::Forward);
            let (matches, next) = match &step.spec {
                SearchSpec::Node(filters) => {
                    let filters = NodeMatcher::compile(filters);
                    let nodes = match frontier.take() {
                        None => self.first_nodes(&filters),
                        Some(previous) => self.joined_nodes(previous, direction, &filters),
                    };
                    let keys = nodes.iter().map(|n| n.key.clone()).collect();
                    (StepMatches::Nodes(nodes), Frontier::Nodes(keys))
                }
                SearchSpec::Edge(filters) => {
                    let filters = EdgeMatcher::compile(filters);
                    let (edges, origin) = match frontier.take() {
                        None => (self.first_edges(&filters), None),
                        Some(previous) => {
                            let origin = self.origin_of(previous, direction);
                            (self.joined_edges(&origin, direction, &filters), Some(origin))
                        }
                    };
                    (
                        StepMatches::Edges(edges.clone()),
                        Frontier::Edges { edges, origin },
                    )
                }
            };
            frontier = Some(next);
            result.steps.push(StepResult {
                alias: step.alias.clone(),
                matches,
            });
        }

        Ok(result)
    }

    fn first_nodes(&self, matcher: &NodeMatcher) -> Vec<Arc<Node>> {
        let nodes = &self.graph.nodes;
        let metrics = &self.metrics.nodes;

        let candidates: Vec<Arc<Node>> = if let Some(key) = matcher.literal_key() {
            nodes.lookup_key(key, metrics).into_iter().collect()
        } else if let Some((tag, value)) = matcher.unique_probe(self.graph) {
            nodes
                .lookup_unique(&tag, value, metrics)
                .and_then(|key| nodes.get(&key).cloned())
                .into_iter()
                .collect()
        } else if let Some(tag) = matcher.literal_tag() {
            self.fetch_nodes(nodes.lookup_tag(&tag, metrics))
        } else {
            nodes.scan(metrics)
        };

        candidates
            .into_iter()
            .filter(|node| matcher.matches(node))
            .collect()
    }

    fn first_edges(&self, matcher: &EdgeMatcher) -> Vec<Arc<Edge>> {
        let edges = &self.graph.edges;
        let metrics = &self.metrics.edges;

        let candidates = if let Some(from) = matcher.literal(EdgeField::From) {
            self.fetch_edges(edges.lookup_by_from_key(from, metrics))
        } else if let Some(to) = matcher.literal(EdgeField::To) {
            self.fetch_edges(edges.lookup_by_to_key(to, metrics))
        } else if let Some(edge_type) = matcher.literal(EdgeField::Type) {
            self.fetch_edges(edges.lookup_by_edge_type(&EdgeType::new(edge_type), metrics))
        } else if let Some(tag) = matcher.tags.literal_tag() {
            self.fetch_edges(edges.lookup_tag(&tag, metrics))
        } else {
            edges.scan(metrics)
        };

        candidates
            .into_iter()
            .filter(|edge| matcher.matches(edge))
            .collect()
    }

    /// Node keys the next edge step starts from
    fn origin_of(&self, previous: Frontier, direction: Direction) -> BTreeSet<String> {
        match previous {
            Frontier::Nodes(keys) => keys,
            Frontier::Edges { edges, origin } => far_ends(&edges, direction, origin.as_ref()),
        }
    }

    fn joined_nodes(
        &self,
        previous: Frontier,
        direction: Direction,
        matcher: &NodeMatcher,
    ) -> Vec<Arc<Node>> {
        let keys = match previous {
            // Two adjacent node steps traverse any edge
            Frontier::Nodes(origin) => {
                let edges = self.edges_from(&origin, direction);
                far_ends(&edges, direction, Some(&origin))
            }
            Frontier::Edges { edges, origin } => far_ends(&edges, direction, origin.as_ref()),
        };
        self.fetch_nodes(keys)
            .into_iter()
            .filter(|node| matcher.matches(node))
            .collect()
    }

    fn joined_edges(
        &self,
        origin: &BTreeSet<String>,
        direction: Direction,
        matcher: &EdgeMatcher,
    ) -> Vec<Arc<Edge>> {
        self.edges_from(origin, direction)
            .into_iter()
            .filter(|edge| matcher.matches(edge))
            .collect()
    }

    /// Edges leaving (`->`), entering (`<-`) or touching (`<->`) the origin
    fn edges_from(&self, origin: &BTreeSet<String>, direction: Direction) -> Vec<Arc<Edge>> {
        let edges = &self.graph.edges;
        let metrics = &self.metrics.edges;
        let mut keys = BTreeSet::new();
        for node_key in origin {
            if matches!(direction, Direction::Forward | Direction::Both) {
                keys.extend(edges.lookup_by_from_key(node_key, metrics));
            }
            if matches!(direction, Direction::Reverse | Direction::Both) {
                keys.extend(edges.lookup_by_to_key(node_key, metrics));
            }
        }
        self.fetch_edges(keys)
    }

    fn fetch_nodes(&self, keys: BTreeSet<String>) -> Vec<Arc<Node>> {
        keys.iter()
            .filter_map(|key| self.graph.node(key).cloned())
            .collect()
    }

    fn fetch_edges(&self, keys: BTreeSet<EdgeKey>) -> Vec<Arc<Edge>> {
        keys.iter()
            .filter_map(|key| self.graph.edge(key).cloned())
            .collect()
    }
}

/// Endpoints reached by walking `edges` in `direction`. For `<->` the end
/// opposite to the origin is taken; without an origin both ends are.
fn far_ends(
    edges: &[Arc<Edge>],
    direction: Direction,
    origin: Option<&BTreeSet<String>>,
) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for edge in edges {
        match direction {
            Direction::Forward => {
                keys.insert(edge.to_key.clone());
            }
            Direction::Reverse => {
                keys.insert(edge.from_key.clone());
            }
            Direction::Both => match origin {
                Some(origin) => {
                    if origin.contains(&edge.from_key) {
                        keys.insert(edge.to_key.clone());
                    }
                    if origin.contains(&edge.to_key) {
                        keys.insert(edge.from_key.clone());
                    }
                }
                None => {
                    keys.insert(edge.from_key.clone());
                    keys.insert(edge.to_key.clone());
                }
            },
        }
    }
    keys
}

/// Compiled `tag` / `tag=value` filters
#[derive(Debug, Default)]
struct TagMatcher {
    filters: Vec<(GlobPattern, Option<GlobPattern>)>,
}

impl TagMatcher {
    fn push(&mut self, key: &str, value: Option<&str>) {
        self.filters.push((
            GlobPattern::new_ignore_case(key),
            value.map(GlobPattern::new),
        ));
    }

    fn matches(&self, tags: &Tags) -> bool {
        self.filters.iter().all(|(key, value)| {
            tags.iter().any(|(tag, tag_value)| {
                key.matches(tag.as_str())
                    && match value {
                        None => true,
                        Some(pattern) => tag_value.map(|v| pattern.matches(v)).unwrap_or(false),
                    }
            })
        })
    }

    /// First filter whose tag key has no wildcard
    fn literal_tag(&self) -> Option<TagKey> {
        self.filters
            .iter()
            .find(|(key, _)| !key.has_wildcard())
            .map(|(key, _)| TagKey::from(key.as_str()))
    }
}

struct NodeMatcher {
    keys: Vec<GlobPattern>,
    tags: TagMatcher,
}

impl NodeMatcher {
    fn compile(filters: &[NodeFilter]) -> Self {
        let mut matcher = NodeMatcher {
            keys: Vec::new(),
            tags: TagMatcher::default(),
        };
        for filter in filters {
            match filter {
                NodeFilter::Key(pattern) => matcher.keys.push(GlobPattern::new(pattern)),
                NodeFilter::Tag { key, value } => matcher.tags.push(key, value.as_deref()),
            }
        }
        matcher
    }

    fn matches(&self, node: &Node) -> bool {
        self.keys.iter().all(|pattern| pattern.matches(&node.key)) && self.tags.matches(&node.tags)
    }

    fn literal_key(&self) -> Option<&str> {
        self.keys
            .iter()
            .find(|pattern| !pattern.has_wildcard())
            .map(GlobPattern::as_str)
    }

    /// `tag=value` filter fully answerable by the unique index
    fn unique_probe<'m>(&'m self, graph: &GraphMap) -> Option<(TagKey, Option<&'m str>)> {
        self.tags.filters.iter().find_map(|(key, value)| {
            let value = value.as_ref()?;
            if key.has_wildcard() || value.has_wildcard() {
                return None;
            }
            let tag = TagKey::from(key.as_str());
            graph
                .nodes
                .unique_covers(&tag)
                .then(|| (tag, Some(value.as_str())))
        })
    }

    fn literal_tag(&self) -> Option<TagKey> {
        self.tags.literal_tag()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeField {
    From,
    To,
    Type,
}

struct EdgeMatcher {
    fields: Vec<(EdgeField, GlobPattern)>,
    tags: TagMatcher,
}

impl EdgeMatcher {
    fn compile(filters: &[EdgeFilter]) -> Self {
        let mut matcher = EdgeMatcher {
            fields: Vec::new(),
            tags: TagMatcher::default(),
        };
        for filter in filters {
            match filter {
                EdgeFilter::From(p) => matcher.fields.push((EdgeField::From, GlobPattern::new(p))),
                EdgeFilter::To(p) => matcher.fields.push((EdgeField::To, GlobPattern::new(p))),
                EdgeFilter::Type(p) => matcher.fields.push((EdgeField::Type, GlobPattern::new(p))),
                EdgeFilter::Tag { key, value } => matcher.tags.push(key, value.as_deref()),
            }
        }
        matcher
    }

    fn matches(&self, edge: &Edge) -> bool {
        self.fields.iter().all(|(field, pattern)| {
            let text = match field {
                EdgeField::From => edge.from_key.as_str(),
                EdgeField::To => edge.to_key.as_str(),
                EdgeField::Type => edge.edge_type.as_str(),
            };
            pattern.matches(text)
        }) && self.tags.matches(&edge.tags)
    }

    fn literal(&self, field: EdgeField) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, pattern)| *f == field && !pattern.has_wildcard())
            .map(|(_, pattern)| pattern.as_str())
    }
}
