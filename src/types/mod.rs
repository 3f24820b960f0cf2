//! All data types for the graph-memory library.

pub mod edge;
pub mod error;
pub mod node;
pub mod record;
pub mod value;

pub use edge::{Direction, Edge};
pub use error::{error_frequencies, record_error, GraphError, GraphResult};
pub use node::{Node, NodeBuilder};
pub use record::{CrossGraphLink, CrossLinkType, EntityRecord, RelationshipRecord};
pub use value::PropertyValue;

/// Default embedding dimensionality.
pub const DEFAULT_DIMENSION: usize = 768;

/// Default cap on the node table.
pub const DEFAULT_MAX_NODES: usize = 100_000;

/// Default cap on outgoing edges per node.
pub const DEFAULT_MAX_EDGES_PER_NODE: usize = 1_000;

/// How many mutations the operation-history ring retains.
pub const OPERATION_HISTORY_SIZE: usize = 256;

/// Normalize an entity name for name-index lookups: trimmed, lowercased,
/// inner whitespace collapsed.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
