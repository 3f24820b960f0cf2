//! Vector index — dense embeddings with top-k similarity search.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{GraphError, GraphResult};
use crate::vector::{cosine_similarity, euclidean_distance, is_valid_vector};

/// Distance metric for similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity in [-1, 1].
    #[default]
    Cosine,
    /// Euclidean distance, reported as the similarity `1 / (1 + d)` so the
    /// threshold contract is `score >= threshold` under both metrics.
    Euclidean,
}

/// A scored match from a similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    /// The node ID.
    pub id: String,
    /// The similarity score.
    pub score: f32,
}

/// Maps node IDs to dense vectors of a fixed dimension.
pub struct VectorIndex {
    vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
    metric: DistanceMetric,
}

impl VectorIndex {
    /// Create a new index with the cosine metric.
    pub fn new(dimension: usize) -> Self {
        Self::with_metric(dimension, DistanceMetric::Cosine)
    }

    /// Create a new index with an explicit metric.
    pub fn with_metric(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            vectors: HashMap::new(),
            dimension,
            metric,
        }
    }

    /// Add (or replace) a vector. Rejects wrong dimensions and non-finite
    /// entries; callers never get silent truncation.
    pub fn add(&mut self, id: &str, vector: Vec<f32>) -> GraphResult<()> {
        if vector.len() != self.dimension {
            return Err(GraphError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        if !is_valid_vector(&vector) {
            return Err(GraphError::InvalidArgument(
                "vector contains non-finite entries".to_string(),
            ));
        }
        self.vectors.insert(id.to_string(), vector);
        Ok(())
    }

    /// Remove a vector.
    pub fn remove(&mut self, id: &str) {
        self.vectors.remove(id);
    }

    /// Get a stored vector.
    pub fn get(&self, id: &str) -> Option<&[f32]> {
        self.vectors.get(id).map(|v| v.as_slice())
    }

    /// Top-k entries scoring `>= threshold` against the probe, ordered by
    /// score descending with ties broken by id ascending.
    pub fn query(&self, probe: &[f32], top_k: usize, threshold: f32) -> GraphResult<Vec<VectorMatch>> {
        if probe.len() != self.dimension {
            return Err(GraphError::DimensionMismatch {
                expected: self.dimension,
                got: probe.len(),
            });
        }
        let mut matches: Vec<VectorMatch> = Vec::new();
        for (id, vector) in &self.vectors {
            let score = self.score(probe, vector);
            if score >= threshold {
                matches.push(VectorMatch {
                    id: id.clone(),
                    score,
                });
            }
        }
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    fn score(&self, probe: &[f32], vector: &[f32]) -> f32 {
        match self.metric {
            DistanceMetric::Cosine => cosine_similarity(probe, vector),
            DistanceMetric::Euclidean => 1.0 / (1.0 + euclidean_distance(probe, vector)),
        }
    }

    /// The configured metric.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// The fixed dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Clear the index.
    pub fn clear(&mut self) {
        self.vectors.clear();
    }

    /// Iterate over (id, vector) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.vectors.iter().map(|(id, v)| (id.as_str(), v.as_slice()))
    }
}
