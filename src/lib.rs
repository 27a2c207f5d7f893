//! Tag Graph
//!
//! An embeddable, in-memory, transactional property graph driven by a small
//! tag-based command language.
//!
//! # Model
//!
//! - Nodes are identified by a string key and carry tags (`key` or
//!   `key=value`, case-insensitive keys), links and data links to blobs.
//! - Edges are identified by `(from, to, type)` and carry tags.
//! - A node may declare unique indexes over its tag keys and foreign keys that
//!   derive edges from tag values.
//!
//! # Execution
//!
//! A script is parsed into [`Command`]s and executed as one batch: statements
//! run in order against a working copy, and the copy is published only when
//! every statement succeeds. Selects see one consistent snapshot and never
//! wait for writers.
//!
//! ## Example Usage
//!
//! ```rust
//! use tag_graph::GraphEngine;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! runtime.block_on(async {
//!     let engine = GraphEngine::new();
//!     engine.execute("add node key=node1 set t1,t2=v2;").await;
//!
//!     let batch = engine.execute("select (key=node1);").await;
//!     let nodes = &batch.default_result().unwrap().nodes;
//!     assert_eq!(nodes[0].tags.to_string(), "t1,t2=v2");
//! });
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod blob;
pub mod cascade;
pub mod config;
pub mod engine;
pub mod graph;
pub mod index;
pub mod metrics;
pub mod query;
pub mod transaction;

// Re-export main types for convenience
pub use graph::{
    DataLink, Edge, EdgeKey, EdgeType, FileId, GraphError, GraphMap, GraphResult, Node,
    StatusCode, TagCommand, TagKey, Tags,
};

pub use query::{
    parse_script, Command, CommandKind, CommandParser, ParseError, PestCommandParser,
    QueryBatchResult, QueryResult,
};

pub use blob::{BlobError, BlobResult, BlobStore, MemoryBlobStore};
pub use config::{ConfigError, ConfigResult, EngineConfig};
pub use engine::GraphEngine;
pub use metrics::{GraphMetrics, MetricsSnapshot, StoreMetricsSnapshot};
pub use transaction::{BatchState, Transaction, TransactionError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.1.0");
    }
}
