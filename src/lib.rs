//! graph-memory — in-process knowledge-graph memory engine for
//! conversational agents.
//!
//! Facts extracted from free-text memories accumulate in a directed,
//! attributed, temporally-versioned graph. A family of secondary indices
//! (label, property, text, vector, pattern) answers hybrid queries that
//! combine structure, token search, and embedding similarity; the temporal
//! layer invalidates conflicting relationships instead of deleting them, so
//! history stays queryable.

pub mod config;
pub mod engine;
pub mod graph;
pub mod index;
pub mod memory;
pub mod persist;
pub mod resolver;
pub mod temporal;
pub mod types;
pub mod vector;

// Re-export the common surface at the crate root.
pub use config::{
    ClusterAlgorithm, ClusterConfig, EngineConfig, EvictionStrategy, FusionStrategy, GraphConfig,
    IndexFlags, MemoryConfig, ResolutionConfig, StorageConfig, TemporalConfig,
};
pub use engine::{
    AddMemoryResult, Cluster, ClusterItem, ClusteringEngine, EngineMetrics, EntityExtractor,
    Extraction, MemoryContext, MemoryEngine, NoopExtractor, QueryMemoryOptions, QueryMemoryResult,
    QueryOptions, QueryProcessor, ScoredNode,
};
pub use graph::{
    all_paths, bfs, bidirectional_search, dfs, GraphMetrics, GraphStore, GraphView, Neighbor,
    Operation, OperationKind, PathSearchResult, TraversalConfig, VisitedNode,
};
pub use index::{
    DistanceMetric, GraphPattern, IndexSet, IndexStats, LabelIndex, PatternEdge, PatternIndex,
    PatternNode, PropertyIndex, PropertyOp, TextIndex, VectorIndex, VectorMatch,
};
pub use memory::MemoryManager;
pub use persist::{EdgeRecord, JsonlStore, LoadOptions, NodeRecord, StorageStats, StoreReport};
pub use resolver::{merge_entity_properties, EntityResolver, MatchMethod, ResolvedEntity};
pub use temporal::{
    EventPattern, EventSequence, EventSequenceLog, InvalidationReason, SequenceEvent,
    TemporalInsert, TemporalLayer, TemporalRecord, TemporalRelationship, TemporalSnapshot,
    TemporalType,
};
pub use types::{
    CrossGraphLink, CrossLinkType, Direction, Edge, EntityRecord, GraphError, GraphResult, Node,
    NodeBuilder, PropertyValue, RelationshipRecord, DEFAULT_DIMENSION,
};
pub use vector::{
    centroid, cosine_similarity, euclidean_distance, is_valid_vector, normalize,
    try_cosine_similarity, try_euclidean_distance,
};
