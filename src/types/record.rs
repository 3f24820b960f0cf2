//! Extraction-boundary record shapes.
//!
//! The entity/relationship extractor is an external collaborator; these are
//! the shapes it hands over. The resolver and engine consume them, never the
//! extractor itself.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::value::PropertyValue;

/// An entity produced by the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Extractor-assigned id. May match an existing node id.
    pub id: String,
    /// Domain class.
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Display name.
    pub name: String,
    /// Property map.
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
    /// Optional embedding as an ordered float sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl EntityRecord {
    /// Create a record with the required fields.
    pub fn new(
        id: impl Into<String>,
        entity_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            name: name.into(),
            properties: HashMap::new(),
            embedding: None,
        }
    }

    /// Attach a property, builder-style.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Attach an embedding, builder-style.
    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// A relationship produced by the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Extractor-assigned id.
    pub id: String,
    /// Source entity id (extractor-scoped).
    pub source: String,
    /// Target entity id (extractor-scoped).
    pub target: String,
    /// Relation type tag.
    #[serde(rename = "type")]
    pub relation_type: String,
    /// Extraction confidence in [0, 1]. Clamped on construction.
    pub confidence: f32,
    /// Property map.
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

impl RelationshipRecord {
    /// Create a record with the required fields. Confidence is clamped to [0, 1].
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        relation_type: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            relation_type: relation_type.into(),
            confidence: confidence.clamp(0.0, 1.0),
            properties: HashMap::new(),
        }
    }
}

/// The kind of link connecting elements across two graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossLinkType {
    /// A lexical element mentions a domain entity.
    EntityMention,
    /// A lexical element supports a domain claim.
    EvidenceSupport,
    /// A domain entity grounds the meaning of a lexical element.
    SemanticGrounding,
    /// Two elements refer to the same point or span in time.
    TemporalAlignment,
}

impl CrossLinkType {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EntityMention => "entity_mention",
            Self::EvidenceSupport => "evidence_support",
            Self::SemanticGrounding => "semantic_grounding",
            Self::TemporalAlignment => "temporal_alignment",
        }
    }

    /// Parse from a string name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "entity_mention" => Some(Self::EntityMention),
            "evidence_support" => Some(Self::EvidenceSupport),
            "semantic_grounding" => Some(Self::SemanticGrounding),
            "temporal_alignment" => Some(Self::TemporalAlignment),
            _ => None,
        }
    }
}

impl std::fmt::Display for CrossLinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A typed, confidence-scored link between elements of two graphs, each
/// endpoint tagged with its graph of origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossGraphLink {
    /// Source element id.
    pub source: String,
    /// Graph the source element lives in.
    pub source_graph: String,
    /// Target element id.
    pub target: String,
    /// Graph the target element lives in.
    pub target_graph: String,
    /// Link type.
    pub link_type: CrossLinkType,
    /// Confidence in [0, 1].
    pub confidence: f32,
}

impl CrossGraphLink {
    /// Create a link. Confidence is clamped to [0, 1].
    pub fn new(
        source: impl Into<String>,
        source_graph: impl Into<String>,
        target: impl Into<String>,
        target_graph: impl Into<String>,
        link_type: CrossLinkType,
        confidence: f32,
    ) -> Self {
        Self {
            source: source.into(),
            source_graph: source_graph.into(),
            target: target.into(),
            target_graph: target_graph.into(),
            link_type,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}
