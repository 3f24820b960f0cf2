//! Error types for the graph-memory library.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// All errors that can occur in the graph-memory library.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Node capacity reached; no further nodes accepted.
    #[error("Node capacity exceeded: {0} nodes")]
    NodeCapacityExceeded(usize),

    /// Per-node edge capacity reached on the source node.
    #[error("Edge capacity exceeded on node {node}: max {max} outgoing edges")]
    EdgeCapacityExceeded { node: String, max: usize },

    /// Node not found by ID.
    #[error("Node {0} not found")]
    NodeNotFound(String),

    /// Edge not found by ID.
    #[error("Edge {0} not found")]
    EdgeNotFound(String),

    /// Backup not found by name.
    #[error("Backup {0} not found")]
    BackupNotFound(String),

    /// Vector dimension mismatch.
    #[error("Vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Malformed or out-of-order timestamp.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Operator not applicable to the given value type.
    #[error("Operator {op} not supported for {value_type} values")]
    UnsupportedOperator { op: String, value_type: String },

    /// Any other malformed argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal consistency violation. Surfaced by validate_consistency only.
    #[error("Consistency violation: {0}")]
    Consistency(String),

    /// Malformed regex pattern passed to a `matches` query.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// IO error at the persistence boundary.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse failure at the persistence boundary.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Foreign-collaborator extraction failure, surfaced opaquely.
    #[error("Extraction failed: {0}")]
    Extraction(String),
}

impl GraphError {
    /// Coarse category label used by the error-frequency counter.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NodeCapacityExceeded(_) | Self::EdgeCapacityExceeded { .. } => "capacity",
            Self::NodeNotFound(_) | Self::EdgeNotFound(_) | Self::BackupNotFound(_) => "not_found",
            Self::Consistency(_) => "invariant",
            Self::DimensionMismatch { .. }
            | Self::InvalidTimestamp(_)
            | Self::UnsupportedOperator { .. }
            | Self::InvalidArgument(_)
            | Self::InvalidPattern(_) => "invalid_argument",
            Self::Io(_) | Self::Parse(_) => "persistence",
            Self::Extraction(_) => "extraction",
        }
    }
}

/// Convenience result type for graph-memory operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Process-wide error frequency counters. Observability only — never
/// consulted for correctness. Zeroed on process start, not persisted.
pub struct ErrorStats {
    capacity: AtomicU64,
    not_found: AtomicU64,
    invariant: AtomicU64,
    invalid_argument: AtomicU64,
    persistence: AtomicU64,
    extraction: AtomicU64,
}

static ERROR_STATS: ErrorStats = ErrorStats {
    capacity: AtomicU64::new(0),
    not_found: AtomicU64::new(0),
    invariant: AtomicU64::new(0),
    invalid_argument: AtomicU64::new(0),
    persistence: AtomicU64::new(0),
    extraction: AtomicU64::new(0),
};

impl ErrorStats {
    fn counter(&self, category: &str) -> &AtomicU64 {
        match category {
            "capacity" => &self.capacity,
            "not_found" => &self.not_found,
            "invariant" => &self.invariant,
            "invalid_argument" => &self.invalid_argument,
            "persistence" => &self.persistence,
            _ => &self.extraction,
        }
    }
}

/// Record an error in the process-wide frequency counters.
pub fn record_error(err: &GraphError) {
    ERROR_STATS
        .counter(err.category())
        .fetch_add(1, Ordering::Relaxed);
}

/// Snapshot of the error frequency counters, keyed by category.
pub fn error_frequencies() -> HashMap<&'static str, u64> {
    let mut map = HashMap::new();
    for category in [
        "capacity",
        "not_found",
        "invariant",
        "invalid_argument",
        "persistence",
        "extraction",
    ] {
        map.insert(
            category,
            ERROR_STATS.counter(category).load(Ordering::Relaxed),
        );
    }
    map
}
