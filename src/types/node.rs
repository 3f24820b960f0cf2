//! The node type and its builder.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value::PropertyValue;

/// A typed, attributed node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable opaque identifier. Minted as uuid-v4 when the caller supplies none.
    pub id: String,
    /// Free-form domain class ("person", "organization", ...).
    pub node_type: String,
    /// Property map.
    pub properties: HashMap<String, PropertyValue>,
    /// Optional dense embedding, dimension fixed per graph.
    pub embedding: Option<Vec<f32>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// The node's display name: the `name` property when it is a string,
    /// otherwise the id.
    pub fn name(&self) -> &str {
        self.properties
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.id)
    }

    /// Touch the last-modified timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Builder for constructing nodes ergonomically.
pub struct NodeBuilder {
    id: Option<String>,
    node_type: String,
    properties: HashMap<String, PropertyValue>,
    embedding: Option<Vec<f32>>,
    created_at: Option<DateTime<Utc>>,
}

impl NodeBuilder {
    /// Create a new builder for a node of the given type.
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            id: None,
            node_type: node_type.into(),
            properties: HashMap::new(),
            embedding: None,
            created_at: None,
        }
    }

    /// Use a caller-supplied id instead of minting one.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the `name` property.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.properties
            .insert("name".to_string(), PropertyValue::Str(name.into()));
        self
    }

    /// Set a property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Replace the whole property map.
    pub fn properties(mut self, properties: HashMap<String, PropertyValue>) -> Self {
        self.properties = properties;
        self
    }

    /// Set the embedding.
    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Set the creation timestamp.
    pub fn created_at(mut self, ts: DateTime<Utc>) -> Self {
        self.created_at = Some(ts);
        self
    }

    /// Build the node, minting a uuid-v4 id if none was supplied.
    pub fn build(self) -> Node {
        let now = self.created_at.unwrap_or_else(Utc::now);
        Node {
            id: self
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            node_type: self.node_type,
            properties: self.properties,
            embedding: self.embedding,
            created_at: now,
            updated_at: now,
        }
    }
}
