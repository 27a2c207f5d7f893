//! Node and edge collections with their indexes
//!
//! Tag bucket indexes for nodes and edges, the unique `(tag, value)` index
//! for nodes, and edge endpoint/type indexes. Each collection owns its
//! indexes and updates them in `put`/`remove`.

pub mod edge_index;
pub mod node_index;
pub mod secondary;
pub mod unique;

pub use edge_index::EdgeIndex;
pub use node_index::NodeIndex;
pub use secondary::SecondaryIndex;
pub use unique::UniqueIndex;
