//! Query processor — combines structural, text, and vector signals into a
//! ranked node set.

use std::collections::HashMap;

use crate::config::FusionStrategy;
use crate::graph::GraphStore;
use crate::memory::MemoryManager;
use crate::types::{GraphResult, Node, PropertyValue};

/// Knobs for one query. The set is closed.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Maximum number of ranked results. Default 20.
    pub max_results: usize,
    /// Score floor; candidates below it are dropped. Default 0.05.
    pub min_score: f32,
    /// Restrict results to these node types. None = all.
    pub node_types: Option<Vec<String>>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_results: 20,
            min_score: 0.05,
            node_types: None,
        }
    }
}

/// A ranked query result.
#[derive(Debug, Clone)]
pub struct ScoredNode {
    /// The matched node.
    pub node: Node,
    /// Composite relevance in [0, 1].
    pub score: f32,
}

/// Per-candidate raw signals, fused into one score by the strategy.
#[derive(Debug, Clone, Copy, Default)]
struct Signals {
    exact_name: bool,
    partial_name: bool,
    resolver_confidence: f32,
    property_hits: usize,
    vector_similarity: f32,
}

impl Signals {
    /// Weighted components: exact name 1.0, partial name 0.7, resolver
    /// confidence x0.5, 0.2 per string-property hit, vector similarity
    /// x1.2. Capped at 1.0.
    fn score(&self, fusion: FusionStrategy) -> f32 {
        let components = [
            if self.exact_name { 1.0 } else { 0.0 },
            if self.partial_name && !self.exact_name { 0.7 } else { 0.0 },
            self.resolver_confidence * 0.5,
            self.property_hits as f32 * 0.2,
            if self.vector_similarity > 0.0 {
                self.vector_similarity * 1.2
            } else {
                0.0
            },
        ];
        let fused = match fusion {
            FusionStrategy::WeightedSum => components.iter().sum(),
            FusionStrategy::Max => components.iter().cloned().fold(0.0f32, f32::max),
        };
        fused.min(1.0)
    }
}

/// Minimum cosine similarity for the vector seeding path.
const VECTOR_SEED_THRESHOLD: f32 = 0.3;

/// The query processor.
pub struct QueryProcessor {
    fusion: FusionStrategy,
}

impl QueryProcessor {
    /// Create a processor with the given fusion strategy.
    pub fn new(fusion: FusionStrategy) -> Self {
        Self { fusion }
    }

    /// Collect, score, and rank the nodes relevant to a query text and
    /// optional query embedding.
    ///
    /// Candidates are seeded from (a) the name index, (b) substring hits on
    /// the node name or any string property, and (c) embedding similarity
    /// above 0.3 when a query embedding is supplied.
    pub fn find_relevant_nodes(
        &self,
        store: &GraphStore,
        memory: &MemoryManager,
        query: &str,
        embedding: Option<&[f32]>,
        options: &QueryOptions,
    ) -> GraphResult<Vec<ScoredNode>> {
        let needle = query.trim().to_lowercase();
        let mut signals: HashMap<String, Signals> = HashMap::new();

        // (a) Name-index resolution of the query as an entity name.
        if let Some(node_id) = memory.lookup_name(query) {
            signals.entry(node_id.to_string()).or_default().resolver_confidence = 0.9;
        }

        // (b) Substring scan over names and string properties.
        if !needle.is_empty() {
            for node in store.iter_nodes() {
                let name_lower = node.name().to_lowercase();
                let exact = name_lower == needle;
                let partial = !exact && name_lower.contains(&needle);
                let property_hits = count_property_hits(node, &needle);
                if exact || partial || property_hits > 0 {
                    let entry = signals.entry(node.id.clone()).or_default();
                    entry.exact_name |= exact;
                    entry.partial_name |= partial;
                    entry.property_hits = entry.property_hits.max(property_hits);
                }
            }
        }

        // (c) Vector seeding.
        if let Some(probe) = embedding {
            let matches =
                store
                    .indexes()
                    .vector()
                    .query(probe, store.node_count(), VECTOR_SEED_THRESHOLD)?;
            for m in matches {
                signals.entry(m.id).or_default().vector_similarity = m.score;
            }
        }

        let mut results: Vec<ScoredNode> = signals
            .into_iter()
            .filter_map(|(id, sig)| {
                let node = store.get_node(&id)?;
                if let Some(types) = &options.node_types {
                    if !types.iter().any(|t| *t == node.node_type) {
                        return None;
                    }
                }
                let score = sig.score(self.fusion);
                (score >= options.min_score).then(|| ScoredNode {
                    node: node.clone(),
                    score,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node.id.cmp(&b.node.id))
        });
        results.truncate(options.max_results);
        Ok(results)
    }
}

/// Count string properties (other than the name) containing the needle.
fn count_property_hits(node: &Node, needle: &str) -> usize {
    node.properties
        .iter()
        .filter(|(key, _)| key.as_str() != "name")
        .filter(|(_, value)| match value {
            PropertyValue::Str(s) => s.to_lowercase().contains(needle),
            _ => false,
        })
        .count()
}
