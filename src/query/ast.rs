//! Typed command model
//!
//! One `Command` variant per verb. The parser produces these; the executor
//! consumes them and never sees command text.

use crate::graph::{DataAttachment, EdgeKey, EdgeType, TagCommand, TagKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statement kind, as reported in results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    AddNode,
    SetNode,
    UpsertNode,
    UpdateNode,
    DeleteNode,
    AddEdge,
    SetEdge,
    UpsertEdge,
    UpdateEdge,
    DeleteEdge,
    Select,
}

impl CommandKind {
    /// Kind shown in results: upserts report as adds
    pub fn reported(self) -> Self {
        match self {
            CommandKind::UpsertNode => CommandKind::AddNode,
            CommandKind::UpsertEdge => CommandKind::AddEdge,
            other => other,
        }
    }

    pub fn is_read_only(self) -> bool {
        self == CommandKind::Select
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Entry of an `index` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexCommand {
    /// Enforce uniqueness of this tag key for the node
    Add(TagKey),
    /// `-key`: stop enforcing
    Remove(TagKey),
}

/// Entry of a `foreignkey` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignKeyCommand {
    /// `type` or `type=pattern`; the pattern defaults to the edge type name
    Declare {
        edge_type: EdgeType,
        pattern: String,
    },
    /// `-type`
    Remove(EdgeType),
}

impl ForeignKeyCommand {
    pub fn declare(edge_type: impl Into<EdgeType>, pattern: Option<&str>) -> Self {
        let edge_type = edge_type.into();
        let pattern = pattern
            .map(str::to_string)
            .unwrap_or_else(|| edge_type.as_str().to_string());
        ForeignKeyCommand::Declare { edge_type, pattern }
    }
}

/// Body of the four node write verbs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeCommand {
    pub key: String,
    pub tags: Vec<TagCommand>,
    pub indexes: Vec<IndexCommand>,
    pub foreign_keys: Vec<ForeignKeyCommand>,
    /// Links appended to the node, in order
    pub links: Vec<String>,
    pub data: Vec<DataAttachment>,
    pub alias: Option<String>,
}

impl NodeCommand {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = TagCommand::parse_list(tags);
        self
    }

    pub fn with_index(mut self, tag: &str) -> Self {
        self.indexes.push(IndexCommand::Add(TagKey::from(tag)));
        self
    }

    pub fn with_foreign_key(mut self, edge_type: &str, pattern: Option<&str>) -> Self {
        self.foreign_keys
            .push(ForeignKeyCommand::declare(edge_type, pattern));
        self
    }

    pub fn with_data(mut self, attachment: DataAttachment) -> Self {
        self.data.push(attachment);
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }
}

/// Body of the four edge write verbs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeCommand {
    pub from_key: String,
    pub to_key: String,
    pub edge_type: EdgeType,
    pub tags: Vec<TagCommand>,
    pub alias: Option<String>,
}

impl EdgeCommand {
    pub fn new(from_key: impl Into<String>, to_key: impl Into<String>) -> Self {
        Self {
            from_key: from_key.into(),
            to_key: to_key.into(),
            edge_type: EdgeType::default(),
            tags: Vec::new(),
            alias: None,
        }
    }

    pub fn with_type(mut self, edge_type: &str) -> Self {
        self.edge_type = EdgeType::new(edge_type);
        self
    }

    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = TagCommand::parse_list(tags);
        self
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(
            self.from_key.clone(),
            self.to_key.clone(),
            self.edge_type.clone(),
        )
    }
}

/// What a delete statement removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget<K> {
    Key(K),
    /// Final step's matches plus every traversed edge
    Search(SearchChain),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCommand<K> {
    pub target: DeleteTarget<K>,
    pub if_exist: bool,
    pub alias: Option<String>,
}

impl<K> DeleteCommand<K> {
    pub fn key(key: K) -> Self {
        Self {
            target: DeleteTarget::Key(key),
            if_exist: false,
            alias: None,
        }
    }

    pub fn search(chain: SearchChain) -> Self {
        Self {
            target: DeleteTarget::Search(chain),
            if_exist: false,
            alias: None,
        }
    }

    pub fn if_exist(mut self) -> Self {
        self.if_exist = true;
        self
    }
}

/// Join between two search steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `->`
    Forward,
    /// `<-`
    Reverse,
    /// `<->`
    Both,
}

/// A `key=value` style filter; the value may be absent (`(tag)`) and either
/// side may contain `*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeFilter {
    Key(String),
    Tag { key: String, value: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeFilter {
    From(String),
    To(String),
    Type(String),
    Tag { key: String, value: Option<String> },
}

/// `( ... )` or `[ ... ]`; no filters means `*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchSpec {
    Node(Vec<NodeFilter>),
    Edge(Vec<EdgeFilter>),
}

impl SearchSpec {
    pub fn all_nodes() -> Self {
        SearchSpec::Node(Vec::new())
    }

    pub fn all_edges() -> Self {
        SearchSpec::Edge(Vec::new())
    }

    pub fn is_node(&self) -> bool {
        matches!(self, SearchSpec::Node(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchStep {
    /// Join from the previous step; `None` only on the first step
    pub join: Option<Direction>,
    pub spec: SearchSpec,
    pub alias: Option<String>,
}

/// Node and edge specs joined by `->`, `<-` or `<->`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchChain {
    pub steps: Vec<SearchStep>,
}

impl SearchChain {
    pub fn new(spec: SearchSpec) -> Self {
        Self {
            steps: vec![SearchStep {
                join: None,
                spec,
                alias: None,
            }],
        }
    }

    pub fn join(mut self, direction: Direction, spec: SearchSpec) -> Self {
        self.steps.push(SearchStep {
            join: Some(direction),
            spec,
            alias: None,
        });
        self
    }

    /// Alias the most recently added step
    pub fn alias(mut self, alias: &str) -> Self {
        if let Some(step) = self.steps.last_mut() {
            step.alias = Some(alias.to_string());
        }
        self
    }

    pub fn last(&self) -> Option<&SearchStep> {
        self.steps.last()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectCommand {
    pub chain: SearchChain,
    /// Data link names to return for the final step's nodes
    pub return_names: Vec<String>,
}

/// One statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddNode(NodeCommand),
    SetNode(NodeCommand),
    UpsertNode(NodeCommand),
    UpdateNode(NodeCommand),
    DeleteNode(DeleteCommand<String>),
    AddEdge(EdgeCommand),
    SetEdge(EdgeCommand),
    UpsertEdge(EdgeCommand),
    UpdateEdge(EdgeCommand),
    DeleteEdge(DeleteCommand<EdgeKey>),
    Select(SelectCommand),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::AddNode(_) => CommandKind::AddNode,
            Command::SetNode(_) => CommandKind::SetNode,
            Command::UpsertNode(_) => CommandKind::UpsertNode,
            Command::UpdateNode(_) => CommandKind::UpdateNode,
            Command::DeleteNode(_) => CommandKind::DeleteNode,
            Command::AddEdge(_) => CommandKind::AddEdge,
            Command::SetEdge(_) => CommandKind::SetEdge,
            Command::UpsertEdge(_) => CommandKind::UpsertEdge,
            Command::UpdateEdge(_) => CommandKind::UpdateEdge,
            Command::DeleteEdge(_) => CommandKind::DeleteEdge,
            Command::Select(_) => CommandKind::Select,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.kind().is_read_only()
    }

    /// Statement-level alias. A select's alias is that of its final step.
    pub fn alias(&self) -> Option<&str> {
        match self {
            Command::AddNode(c)
            | Command::SetNode(c)
            | Command::UpsertNode(c)
            | Command::UpdateNode(c) => {
                c.alias.as_deref()
            }
            Command::AddEdge(c)
            | Command::SetEdge(c)
            | Command::UpsertEdge(c)
            | Command::UpdateEdge(c) => {
                c.alias.as_deref()
            }
            Command::DeleteNode(c) => c.alias.as_deref(),
            Command::DeleteEdge(c) => c.alias.as_deref(),
            Command::Select(c) => c.chain.last().and_then(|step| step.alias.as_deref()),
        }
    }

    /// Node write body, for commands that may carry data attachments
    pub fn node_command_mut(&mut self) -> Option<&mut NodeCommand> {
        match self {
            Command::AddNode(c)
            | Command::SetNode(c)
            | Command::UpsertNode(c)
            | Command::UpdateNode(c) => {
                Some(c)
            }
            _ => None,
        }
    }
}
