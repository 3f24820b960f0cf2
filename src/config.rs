//! Configuration records for every subsystem. Each is a closed set of
//! fields with documented defaults; unknown knobs do not exist.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{DEFAULT_DIMENSION, DEFAULT_MAX_EDGES_PER_NODE, DEFAULT_MAX_NODES};

/// Which secondary indices the store maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFlags {
    /// Node-type -> id-set index.
    pub label: bool,
    /// (property, value) -> id-set index with range support.
    pub property: bool,
    /// Inverted token index with fuzzy lookup.
    pub text: bool,
    /// Dense-vector similarity index.
    pub vector: bool,
}

impl Default for IndexFlags {
    fn default() -> Self {
        Self {
            label: true,
            property: true,
            text: true,
            vector: true,
        }
    }
}

/// Graph store configuration.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Hard cap on the node table. Default 100k.
    pub max_nodes: usize,
    /// Hard cap on outgoing edges per node. Default 1k.
    pub max_edges_per_node: usize,
    /// Embedding dimension for the vector index. Default 768.
    pub dimension: usize,
    /// Index enable flags.
    pub indexes: IndexFlags,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
            max_edges_per_node: DEFAULT_MAX_EDGES_PER_NODE,
            dimension: DEFAULT_DIMENSION,
            indexes: IndexFlags::default(),
        }
    }
}

/// Temporal layer configuration. Windows are in days.
#[derive(Debug, Clone)]
pub struct TemporalConfig {
    /// Default validity window for facts. Default 365 days.
    pub fact_window_days: i64,
    /// Default validity window for states. Default 90 days.
    pub state_window_days: i64,
    /// Default validity window for events. Default 30 days.
    pub event_window_days: i64,
    /// Invalidated records older than this are dropped by cleanup.
    /// Default 730 days.
    pub max_invalidated_age_days: i64,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            fact_window_days: 365,
            state_window_days: 90,
            event_window_days: 30,
            max_invalidated_age_days: 730,
        }
    }
}

/// Eviction strategy for the memory manager. `Lfu` and `Temporal` are
/// recognized but delegate to `Lru` in v1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Least-recently-used.
    #[default]
    Lru,
    /// Least-frequently-used.
    Lfu,
    /// Oldest-created-first.
    Temporal,
}

/// Memory manager configuration.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Soft cap on resident nodes before eviction kicks in. Default 10k.
    pub max_memory_nodes: usize,
    /// Extra nodes evicted beyond the overshoot, so eviction is not
    /// re-triggered by the very next insert. Default 100.
    pub eviction_buffer: usize,
    /// Eviction strategy. Default lru.
    pub strategy: EvictionStrategy,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_memory_nodes: 10_000,
            eviction_buffer: 100,
            strategy: EvictionStrategy::Lru,
        }
    }
}

/// Clustering algorithm choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterAlgorithm {
    /// k-means with k-means++ seeding.
    #[default]
    KMeans,
    /// Agglomerative single-linkage.
    Agglomerative,
}

/// Clustering engine configuration.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Algorithm choice. Default k-means.
    pub algorithm: ClusterAlgorithm,
    /// Minimum cosine similarity for a node to join a cluster. Default 0.5.
    pub similarity_threshold: f32,
    /// Lloyd iteration cap. Default 10.
    pub max_iterations: usize,
    /// Centroid-movement convergence tolerance (euclidean). Default 1e-3.
    pub tolerance: f32,
    /// Upper bound on cluster count for agglomerative merging. Default 10.
    pub max_clusters: usize,
    /// RNG seed for k-means++ so runs are reproducible. None = entropy.
    pub seed: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            algorithm: ClusterAlgorithm::KMeans,
            similarity_threshold: 0.5,
            max_iterations: 10,
            tolerance: 1e-3,
            max_clusters: 10,
            seed: None,
        }
    }
}

/// How the query processor combines signals for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionStrategy {
    /// Sum the weighted signals, capped at 1.0.
    #[default]
    WeightedSum,
    /// Take the strongest single signal.
    Max,
}

/// Persistence boundary configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage directory. Default `./data`.
    pub dir: PathBuf,
    /// Chunk rotation threshold in bytes. Default 8 MiB.
    pub max_file_size: u64,
    /// Chunk rotation threshold in records. Default 10k.
    pub max_items_per_file: usize,
    /// Timer-driven sync cadence in milliseconds. Default 30s.
    pub sync_interval_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data"),
            max_file_size: 8 * 1024 * 1024,
            max_items_per_file: 10_000,
            sync_interval_ms: 30_000,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Graph store caps and index flags.
    pub graph: GraphConfig,
    /// Temporal layer windows.
    pub temporal: TemporalConfig,
    /// Recency list and eviction policy.
    pub memory: MemoryConfig,
    /// Clustering defaults.
    pub cluster: ClusterConfig,
    /// Persistence boundary options. None = in-memory only.
    pub storage: Option<StorageConfig>,
    /// Entity-resolution thresholds.
    pub resolution: ResolutionConfig,
    /// Signal fusion strategy for the query processor.
    pub fusion: FusionStrategy,
    /// Whether relationship writes run conflict detection and validity
    /// tracking. Default true.
    pub enable_temporal: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            temporal: TemporalConfig::default(),
            memory: MemoryConfig::default(),
            cluster: ClusterConfig::default(),
            storage: None,
            resolution: ResolutionConfig::default(),
            fusion: FusionStrategy::default(),
            enable_temporal: true,
        }
    }
}

/// Entity-resolution thresholds.
#[derive(Debug, Clone)]
pub struct ResolutionConfig {
    /// Minimum cosine similarity for an embedding match. Default 0.85.
    pub fuzzy_threshold: f32,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.85,
        }
    }
}
