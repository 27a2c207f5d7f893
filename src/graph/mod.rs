//! Core graph data model
//!
//! This module implements the tag-based property graph:
//! - Nodes keyed by a string primary key, carrying tags, links, data links,
//!   foreign-key declarations and unique-index declarations
//! - Directed edges keyed by `(from, to, type)` with their own tags
//! - Copy-on-write entity stores and the `GraphMap` aggregate root

pub mod data;
pub mod edge;
pub mod glob;
pub mod map;
pub mod node;
pub mod store;
pub mod tags;
pub mod types;

// Re-export main types
pub use data::{DataAttachment, DataLink, DataLinkResult, FileId};
pub use edge::Edge;
pub use glob::GlobPattern;
pub use map::GraphMap;
pub use node::Node;
pub use store::{EntityStore, GraphError, GraphResult, StatusCode};
pub use tags::{TagCommand, TagKey, Tags};
pub use types::{EdgeKey, EdgeType, EntityKind, DEFAULT_EDGE_TYPE};
