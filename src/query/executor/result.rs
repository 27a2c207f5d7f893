//! Statement and batch results

use crate::graph::{DataLinkResult, Edge, EntityKind, GraphError, Node, StatusCode, Tags};
use crate::query::ast::CommandKind;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// Slot shared by every statement that carries no alias
pub const DEFAULT_ALIAS: &str = "_";

/// Matches of one search step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub kind: EntityKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<Edge>,
}

impl Selection {
    pub fn len(&self) -> usize {
        match self.kind {
            EntityKind::Node => self.nodes.len(),
            EntityKind::Edge => self.edges.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of one statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub kind: CommandKind,
    pub status: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<Edge>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_links: Vec<DataLinkResult>,
    /// Tags before an update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior_tags: Option<Tags>,
    /// Per-step matches of a search, in chain order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selections: Vec<Selection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    /// Successful result; upserts are reported as adds
    pub fn ok(kind: CommandKind) -> Self {
        Self {
            kind: kind.reported(),
            status: StatusCode::Ok,
            alias: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            data_links: Vec::new(),
            prior_tags: None,
            selections: Vec::new(),
            error: None,
        }
    }

    pub fn failed(kind: CommandKind, error: &GraphError) -> Self {
        Self {
            status: error.status(),
            error: Some(error.to_string()),
            ..Self::ok(kind)
        }
    }

    pub fn with_alias(mut self, alias: Option<&str>) -> Self {
        self.alias = alias.map(str::to_string);
        self
    }

    pub fn with_nodes<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = Arc<Node>>,
    {
        self.nodes
            .extend(nodes.into_iter().map(|node| Node::clone(&node)));
        self
    }

    pub fn with_edges<I>(mut self, edges: I) -> Self
    where
        I: IntoIterator<Item = Arc<Edge>>,
    {
        self.edges
            .extend(edges.into_iter().map(|edge| Edge::clone(&edge)));
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Result for an aliased intermediate step of a search
    fn from_selection(kind: CommandKind, selection: &Selection) -> Self {
        Self {
            alias: selection.alias.clone(),
            nodes: selection.nodes.clone(),
            edges: selection.edges.clone(),
            ..Self::ok(kind)
        }
    }
}

/// Outcome of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryBatchResult {
    pub status: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// One entry per executed statement, in order. After a failure the
    /// failing statement is the last entry.
    pub items: Vec<QueryResult>,
    /// Alias slot -> latest result stored under it
    pub aliases: IndexMap<String, QueryResult>,
}

impl QueryBatchResult {
    pub fn new() -> Self {
        Self {
            status: StatusCode::Ok,
            error: None,
            items: Vec::new(),
            aliases: IndexMap::new(),
        }
    }

    /// Batch rejected before any statement ran
    pub fn rejected(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: Some(error.into()),
            ..Self::new()
        }
    }

    /// Append a statement result and file it under its alias slot. Aliased
    /// intermediate steps of a search get their own slots too.
    pub fn push(&mut self, result: QueryResult) {
        if !result.is_ok() && self.status.is_ok() {
            self.status = result.status;
            self.error = result.error.clone();
        }

        let terminal = result.selections.len().saturating_sub(1);
        for (i, selection) in result.selections.iter().enumerate() {
            if i == terminal {
                continue;
            }
            if let Some(alias) = &selection.alias {
                self.aliases
                    .insert(alias.clone(), QueryResult::from_selection(result.kind, selection));
            }
        }

        let slot = result
            .alias
            .clone()
            .unwrap_or_else(|| DEFAULT_ALIAS.to_string());
        self.aliases.insert(slot, result.clone());
        self.items.push(result);
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn get(&self, alias: &str) -> Option<&QueryResult> {
        self.aliases.get(alias)
    }

    /// Latest result of an unaliased statement
    pub fn default_result(&self) -> Option<&QueryResult> {
        self.aliases.get(DEFAULT_ALIAS)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for QueryBatchResult {
    fn default() -> Self {
        Self::new()
    }
}
