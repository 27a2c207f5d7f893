//! Edge write and delete statements

use super::{MutQueryExecutor, QueryResult, WriteMode};
use crate::graph::{Edge, EdgeKey, GraphError, GraphResult, Tags};
use crate::query::ast::{CommandKind, DeleteCommand, DeleteTarget, EdgeCommand};
use tracing::debug;

impl<'a> MutQueryExecutor<'a> {
    pub(super) fn write_edge(
        &mut self,
        kind: CommandKind,
        mode: WriteMode,
        command: &EdgeCommand,
    ) -> GraphResult<QueryResult> {
        let key = command.key();
        if key.from_key.is_empty() || key.to_key.is_empty() {
            return Err(GraphError::BadRequest(
                "edge requires from and to keys".to_string(),
            ));
        }

        let existing = self.graph.edge(&key).cloned();
        let edge = match (mode, existing) {
            (WriteMode::Add, Some(_)) => return Err(GraphError::EdgeAlreadyExists(key)),
            (WriteMode::Update, None) => return Err(GraphError::EdgeNotFound(key)),
            (_, Some(existing)) => existing.with_tags(existing.tags.apply(&command.tags)),
            (_, None) => {
                self.check_endpoints(&key)?;
                self.config.check_edge_quota(self.graph.edges.len(), 1)?;
                Edge::new_with_tags(
                    key.from_key.clone(),
                    key.to_key.clone(),
                    key.edge_type.clone(),
                    Tags::new().apply(&command.tags),
                )
            }
        };

        let previous = self.graph.put_edge(edge);
        debug!(
            "{} {} ({})",
            kind,
            key,
            if previous.is_some() { "updated" } else { "created" }
        );

        let stored = self
            .graph
            .edge(&key)
            .cloned()
            .ok_or_else(|| GraphError::Internal(format!("edge {} vanished", key)))?;
        let mut result = QueryResult::ok(kind)
            .with_alias(command.alias.as_deref())
            .with_edges(Some(stored));
        if mode == WriteMode::Update {
            result.prior_tags = previous.map(|old| old.tags.clone());
        }
        Ok(result)
    }

    fn check_endpoints(&self, key: &EdgeKey) -> GraphResult<()> {
        for node in [&key.from_key, &key.to_key] {
            if !self.graph.nodes.contains_key(node) {
                return Err(GraphError::MissingEdgeNode {
                    edge: key.clone(),
                    node: node.clone(),
                });
            }
        }
        Ok(())
    }

    pub(super) fn delete_edge(
        &mut self,
        command: &DeleteCommand<EdgeKey>,
    ) -> GraphResult<QueryResult> {
        let key = match &command.target {
            DeleteTarget::Key(key) => key,
            DeleteTarget::Search(chain) => {
                return self.delete_matches(CommandKind::DeleteEdge, chain, command.alias.as_deref())
            }
        };

        match self.graph.remove_edge(key) {
            Some(edge) => {
                debug!("Deleted edge {}", key);
                Ok(QueryResult::ok(CommandKind::DeleteEdge)
                    .with_alias(command.alias.as_deref())
                    .with_edges(Some(edge)))
            }
            None if command.if_exist => {
                Ok(QueryResult::ok(CommandKind::DeleteEdge).with_alias(command.alias.as_deref()))
            }
            None => Err(GraphError::EdgeNotFound(key.clone())),
        }
    }
}
