//! Node write and delete statements

use super::{MutQueryExecutor, QueryResult, WriteMode};
use crate::cascade;
use crate::graph::{DataLink, EntityKind, FileId, GraphError, GraphResult, Node};
use crate::query::ast::{
    CommandKind, DeleteCommand, DeleteTarget, ForeignKeyCommand, IndexCommand, NodeCommand,
};
use tracing::debug;

impl<'a> MutQueryExecutor<'a> {
    /// Add, set, upsert or update a node.
    ///
    /// The new record is fully built and validated (unique claims, foreign-key
    /// targets, quotas) before the working copy is touched.
    pub(super) fn write_node(
        &mut self,
        kind: CommandKind,
        mode: WriteMode,
        command: &NodeCommand,
    ) -> GraphResult<QueryResult> {
        if command.key.is_empty() {
            return Err(GraphError::BadRequest("node key is required".to_string()));
        }

        let existing = self.graph.node(&command.key).cloned();
        match (mode, &existing) {
            (WriteMode::Add, Some(_)) => {
                return Err(GraphError::NodeAlreadyExists(command.key.clone()))
            }
            (WriteMode::Update, None) => return Err(GraphError::NodeNotFound(command.key.clone())),
            _ => {}
        }
        if existing.is_none() {
            self.config.check_node_quota(self.graph.nodes.len())?;
        }

        let node = self.build_node(existing.as_deref(), command);

        self.graph.nodes.check(&node)?;
        let plan = cascade::plan(self.graph, &node)?;
        let new_edges = plan
            .wanted()
            .iter()
            .filter(|key| !self.graph.edges.contains_key(key))
            .count();
        self.config
            .check_edge_quota(self.graph.edges.len(), new_edges)?;

        self.graph.put_node(node)?;
        let outcome = cascade::apply(self.graph, &plan);
        debug!(
            "{} {}: {} foreign key edges added, {} removed",
            kind,
            command.key,
            outcome.added.len(),
            outcome.removed.len()
        );

        let stored = self
            .graph
            .node(&command.key)
            .cloned()
            .ok_or_else(|| GraphError::Internal(format!("node {} vanished", command.key)))?;
        let mut result = QueryResult::ok(kind)
            .with_alias(command.alias.as_deref())
            .with_nodes(Some(stored));
        if mode == WriteMode::Update {
            result.prior_tags = existing.map(|old| old.tags.clone());
        }
        Ok(result)
    }

    fn build_node(&self, existing: Option<&Node>, command: &NodeCommand) -> Node {
        let mut node = existing
            .map(Node::touched)
            .unwrap_or_else(|| Node::new(command.key.clone()));

        node.tags = node.tags.apply(&command.tags);

        for index in &command.indexes {
            match index {
                IndexCommand::Add(tag) => {
                    node.indexes.insert(tag.clone());
                }
                IndexCommand::Remove(tag) => {
                    node.indexes.remove(tag);
                }
            }
        }

        for foreign_key in &command.foreign_keys {
            match foreign_key {
                ForeignKeyCommand::Declare { edge_type, pattern } => {
                    node.foreign_keys.insert(edge_type.clone(), pattern.clone());
                }
                ForeignKeyCommand::Remove(edge_type) => {
                    node.foreign_keys.remove(edge_type);
                }
            }
        }

        for link in &command.links {
            if !node.links.contains(link) {
                node.links.push(link.clone());
            }
        }

        for attachment in &command.data {
            let file_id = FileId::for_data(
                EntityKind::Node,
                &node.key,
                &attachment.name,
                &self.config.data_extension,
            );
            node.data_map.insert(
                attachment.name.clone(),
                DataLink {
                    name: attachment.name.clone(),
                    file_id,
                    type_name: attachment.type_name.clone(),
                },
            );
        }

        node
    }

    pub(super) fn delete_node(
        &mut self,
        command: &DeleteCommand<String>,
    ) -> GraphResult<QueryResult> {
        let key = match &command.target {
            DeleteTarget::Key(key) => key,
            DeleteTarget::Search(chain) => {
                return self.delete_matches(CommandKind::DeleteNode, chain, command.alias.as_deref())
            }
        };

        match self.graph.remove_node_cascading(key) {
            Some((node, edges)) => {
                debug!("Deleted node {} with {} edges", key, edges.len());
                Ok(QueryResult::ok(CommandKind::DeleteNode)
                    .with_alias(command.alias.as_deref())
                    .with_nodes(Some(node))
                    .with_edges(edges))
            }
            None if command.if_exist => {
                Ok(QueryResult::ok(CommandKind::DeleteNode).with_alias(command.alias.as_deref()))
            }
            None => Err(GraphError::NodeNotFound(key.clone())),
        }
    }
}
