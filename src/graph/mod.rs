//! The graph store and traversal engine.

pub mod store;
pub mod traversal;

pub use store::{GraphMetrics, GraphStore, Neighbor, Operation, OperationKind};
pub use traversal::{
    all_paths, bfs, bidirectional_search, dfs, GraphView, PathSearchResult, TraversalConfig,
    VisitedNode,
};
