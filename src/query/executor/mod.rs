//! Statement execution
//!
//! [`QueryExecutor`] evaluates selects against a shared snapshot.
//! [`MutQueryExecutor`] applies write statements to a batch's working copy.
//! Both return `GraphResult`; the engine turns errors into result status.

mod edge;
mod node;
pub mod result;
pub mod search;

pub use result::{QueryBatchResult, QueryResult, Selection, DEFAULT_ALIAS};
pub use search::{ChainResult, QueryEvaluator, StepMatches, StepResult};

use crate::config::EngineConfig;
use crate::graph::{DataLinkResult, GraphError, GraphMap, GraphResult};
use crate::metrics::GraphMetrics;
use crate::query::ast::{Command, CommandKind, SearchChain, SelectCommand};
use std::sync::Arc;
use tracing::debug;

/// How a write verb treats an existing record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// Fails when the record exists
    Add,
    /// Creates or merges
    Set,
    /// Fails when the record is missing
    Update,
}

impl WriteMode {
    fn of(kind: CommandKind) -> Self {
        match kind {
            CommandKind::AddNode | CommandKind::AddEdge => WriteMode::Add,
            CommandKind::UpdateNode | CommandKind::UpdateEdge => WriteMode::Update,
            _ => WriteMode::Set,
        }
    }
}

/// Read-only executor over a snapshot
pub struct QueryExecutor<'a> {
    graph: &'a GraphMap,
    metrics: &'a GraphMetrics,
}

impl<'a> QueryExecutor<'a> {
    /// Lookups are recorded into `metrics`, which need not belong to `graph`
    pub fn new(graph: &'a GraphMap, metrics: &'a GraphMetrics) -> Self {
        Self { graph, metrics }
    }

    pub fn execute(&self, command: &Command) -> GraphResult<QueryResult> {
        match command {
            Command::Select(select) => self.select(select),
            other => Err(GraphError::BadRequest(format!(
                "{} cannot run on a read-only snapshot",
                other.kind()
            ))),
        }
    }

    pub fn select(&self, command: &SelectCommand) -> GraphResult<QueryResult> {
        let chain = QueryEvaluator::new(self.graph, self.metrics).evaluate(&command.chain)?;
        let alias = command.chain.last().and_then(|step| step.alias.as_deref());

        let mut result = QueryResult::ok(CommandKind::Select).with_alias(alias);
        match chain.last().map(|step| &step.matches) {
            Some(StepMatches::Nodes(nodes)) => result = result.with_nodes(nodes.iter().cloned()),
            Some(StepMatches::Edges(edges)) => result = result.with_edges(edges.iter().cloned()),
            None => {}
        }
        result.selections = chain.steps.iter().map(StepResult::to_selection).collect();

        // Payloads are fetched by the engine once the snapshot is released
        for node in chain.final_nodes() {
            for name in &command.return_names {
                if let Some(link) = node.data_map.get(name) {
                    result.data_links.push(DataLinkResult {
                        node_key: node.key.clone(),
                        link: link.clone(),
                        payload: None,
                        error: None,
                    });
                }
            }
        }

        debug!(
            "Select matched {} nodes, {} edges",
            result.nodes.len(),
            result.edges.len()
        );
        Ok(result)
    }
}

/// Write executor over a batch's working copy
pub struct MutQueryExecutor<'a> {
    graph: &'a mut GraphMap,
    config: &'a EngineConfig,
}

impl<'a> MutQueryExecutor<'a> {
    pub fn new(graph: &'a mut GraphMap, config: &'a EngineConfig) -> Self {
        Self { graph, config }
    }

    /// Execute one statement. On error the working copy is unchanged by it.
    pub fn execute(&mut self, command: &Command) -> GraphResult<QueryResult> {
        let kind = command.kind();
        debug!("Executing {}", kind);
        match command {
            Command::AddNode(c)
            | Command::SetNode(c)
            | Command::UpsertNode(c)
            | Command::UpdateNode(c) => self.write_node(kind, WriteMode::of(kind), c),
            Command::DeleteNode(c) => self.delete_node(c),
            Command::AddEdge(c)
            | Command::SetEdge(c)
            | Command::UpsertEdge(c)
            | Command::UpdateEdge(c) => self.write_edge(kind, WriteMode::of(kind), c),
            Command::DeleteEdge(c) => self.delete_edge(c),
            Command::Select(select) => {
                let metrics = Arc::clone(self.graph.metrics());
                QueryExecutor::new(self.graph, &metrics).select(select)
            }
        }
    }

    /// Delete the final step's matches and every traversed edge. Nodes go
    /// with all their incident edges.
    fn delete_matches(
        &mut self,
        kind: CommandKind,
        chain: &SearchChain,
        alias: Option<&str>,
    ) -> GraphResult<QueryResult> {
        let metrics = Arc::clone(self.graph.metrics());
        let matches = QueryEvaluator::new(self.graph, &metrics).evaluate(chain)?;

        let mut deleted_edges = Vec::new();
        for edge in matches.all_edges() {
            if let Some(edge) = self.graph.remove_edge(&edge.key()) {
                deleted_edges.push(edge);
            }
        }

        let mut deleted_nodes = Vec::new();
        for node in matches.final_nodes() {
            if let Some((node, edges)) = self.graph.remove_node_cascading(&node.key) {
                deleted_nodes.push(node);
                deleted_edges.extend(edges);
            }
        }

        debug!(
            "Deleted {} nodes, {} edges by search",
            deleted_nodes.len(),
            deleted_edges.len()
        );
        Ok(QueryResult::ok(kind)
            .with_alias(alias)
            .with_nodes(deleted_nodes)
            .with_edges(deleted_edges))
    }
}
