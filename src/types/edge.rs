//! The directed edge type.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value::PropertyValue;

/// A directed, weighted relationship between two nodes.
///
/// Both endpoints must exist in the graph at creation time. Temporal
/// metadata (validity interval, temporal class) is owned by the temporal
/// layer, keyed by edge id — not stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Stable opaque identifier.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Relation type tag ("works_at", "knows", ...).
    pub edge_type: String,
    /// Relationship strength, >= 0.
    pub weight: f32,
    /// Property map.
    pub properties: HashMap<String, PropertyValue>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Edge {
    /// Create a new edge with a minted id. Weight is clamped at 0 from below.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        edge_type: impl Into<String>,
        weight: f32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source: source.into(),
            target: target.into(),
            edge_type: edge_type.into(),
            weight: weight.max(0.0),
            properties: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new edge with an explicit id.
    pub fn with_id(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        edge_type: impl Into<String>,
        weight: f32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type: edge_type.into(),
            weight: weight.max(0.0),
            properties: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a property, builder-style.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Override the creation timestamp, builder-style.
    pub fn created_at(mut self, ts: DateTime<Utc>) -> Self {
        self.created_at = ts;
        self.updated_at = ts;
        self
    }
}

/// Which end of an edge a neighbor was reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Edge leaves the anchor node.
    Out,
    /// Edge enters the anchor node.
    In,
    /// Either direction (traversal config only; never appears in triples).
    Both,
}

impl Direction {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Out => "out",
            Self::In => "in",
            Self::Both => "both",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
