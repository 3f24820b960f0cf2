//! Entity resolver — matches incoming records against existing nodes.

use std::collections::HashMap;

use chrono::Utc;

use crate::config::ResolutionConfig;
use crate::graph::GraphStore;
use crate::memory::MemoryManager;
use crate::types::{EntityRecord, GraphResult, PropertyValue};

/// How a record was matched to an existing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// Exact id hit with matching type.
    Id,
    /// Normalized-name hit with matching type.
    Name,
    /// Embedding nearest-neighbor with matching type.
    Embedding,
}

impl MatchMethod {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Embedding => "embedding",
        }
    }
}

/// A successful resolution.
#[derive(Debug, Clone)]
pub struct ResolvedEntity {
    /// The existing node the record resolved to.
    pub node_id: String,
    /// Match confidence: 0.95 for id, 0.9 for name, the cosine similarity
    /// for embedding matches.
    pub confidence: f32,
    /// Which rung of the ladder matched.
    pub method: MatchMethod,
}

/// Resolves extraction records to existing nodes by id, then name, then
/// embedding similarity.
pub struct EntityResolver {
    fuzzy_threshold: f32,
}

impl EntityResolver {
    /// Create a resolver.
    pub fn new(config: &ResolutionConfig) -> Self {
        Self {
            fuzzy_threshold: config.fuzzy_threshold,
        }
    }

    /// The embedding-match threshold.
    pub fn fuzzy_threshold(&self) -> f32 {
        self.fuzzy_threshold
    }

    /// Try to match the record against an existing node. Each rung requires
    /// the node type to match; the first hit wins.
    pub fn resolve(
        &self,
        record: &EntityRecord,
        store: &GraphStore,
        memory: &MemoryManager,
    ) -> GraphResult<Option<ResolvedEntity>> {
        if let Some(node) = store.get_node(&record.id) {
            if node.node_type == record.entity_type {
                return Ok(Some(ResolvedEntity {
                    node_id: node.id.clone(),
                    confidence: 0.95,
                    method: MatchMethod::Id,
                }));
            }
        }

        if let Some(node_id) = memory.lookup_name(&record.name) {
            if let Some(node) = store.get_node(node_id) {
                if node.node_type == record.entity_type {
                    return Ok(Some(ResolvedEntity {
                        node_id: node.id.clone(),
                        confidence: 0.9,
                        method: MatchMethod::Name,
                    }));
                }
            }
        }

        if let Some(embedding) = &record.embedding {
            let matches = store
                .indexes()
                .vector()
                .query(embedding, 8, self.fuzzy_threshold)?;
            for candidate in matches {
                let Some(node) = store.get_node(&candidate.id) else {
                    continue;
                };
                if node.node_type == record.entity_type {
                    return Ok(Some(ResolvedEntity {
                        node_id: candidate.id,
                        confidence: candidate.score,
                        method: MatchMethod::Embedding,
                    }));
                }
            }
        }

        Ok(None)
    }
}

/// Merge incoming properties into an existing property map. Updates win on
/// collision; `last_updated` and `updated_by` audit fields are stamped.
pub fn merge_entity_properties(
    existing: &HashMap<String, PropertyValue>,
    updates: &HashMap<String, PropertyValue>,
    updated_by: &str,
) -> HashMap<String, PropertyValue> {
    let mut merged = existing.clone();
    for (key, value) in updates {
        merged.insert(key.clone(), value.clone());
    }
    merged.insert(
        "last_updated".to_string(),
        PropertyValue::Str(Utc::now().to_rfc3339()),
    );
    merged.insert(
        "updated_by".to_string(),
        PropertyValue::Str(updated_by.to_string()),
    );
    merged
}
