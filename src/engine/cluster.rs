//! Clustering engine — k-means++ and agglomerative clustering over node
//! embeddings.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ClusterAlgorithm, ClusterConfig};
use crate::graph::GraphStore;
use crate::types::GraphResult;
use crate::vector::{cosine_similarity, euclidean_distance};

/// One item to cluster.
#[derive(Debug, Clone)]
pub struct ClusterItem {
    /// Node id.
    pub id: String,
    /// Node type, used for the cluster theme.
    pub node_type: String,
    /// Node display name, used for the cluster theme.
    pub name: String,
    /// Embedding.
    pub vector: Vec<f32>,
}

/// A cluster of nodes.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Member node ids.
    pub members: Vec<String>,
    /// Cluster centroid.
    pub centroid: Vec<f32>,
    /// "most-common-type: first, second…"
    pub theme: String,
    /// Mean member-to-centroid cosine similarity.
    pub confidence: f32,
}

/// The clustering engine.
pub struct ClusteringEngine {
    config: ClusterConfig,
}

impl ClusteringEngine {
    /// Create an engine.
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Cluster every node with a non-zero embedding, using the configured
    /// algorithm.
    pub fn cluster_store(&self, store: &GraphStore) -> GraphResult<Vec<Cluster>> {
        let items: Vec<ClusterItem> = store
            .iter_nodes()
            .filter_map(|node| {
                let vector = node.embedding.clone()?;
                if vector.iter().all(|&x| x == 0.0) {
                    return None;
                }
                Some(ClusterItem {
                    id: node.id.clone(),
                    node_type: node.node_type.clone(),
                    name: node.name().to_string(),
                    vector,
                })
            })
            .collect();
        match self.config.algorithm {
            ClusterAlgorithm::KMeans => {
                let k = ((items.len() as f64).sqrt().ceil() as usize)
                    .clamp(1, self.config.max_clusters.max(1));
                self.kmeans(&items, k)
            }
            ClusterAlgorithm::Agglomerative => self.agglomerative(&items),
        }
    }

    /// k-means with k-means++ seeding. At most `max_iterations` Lloyd
    /// rounds; converged when every centroid moves less than `tolerance`.
    /// An item joins its most-similar centroid only when the cosine
    /// similarity clears `similarity_threshold`; final clusters with fewer
    /// than 2 members are discarded.
    pub fn kmeans(&self, items: &[ClusterItem], k: usize) -> GraphResult<Vec<Cluster>> {
        if items.len() < 2 || k == 0 {
            return Ok(Vec::new());
        }
        let k = k.min(items.len());
        let mut rng: StdRng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut centroids = seed_centroids(items, k, &mut rng);
        let mut assignments: Vec<Option<usize>> = vec![None; items.len()];

        for _ in 0..self.config.max_iterations {
            // Assignment step.
            for (i, item) in items.iter().enumerate() {
                assignments[i] = nearest_centroid(&item.vector, &centroids)
                    .filter(|&(_, sim)| sim > self.config.similarity_threshold)
                    .map(|(ci, _)| ci);
            }

            // Update step.
            let mut converged = true;
            for (ci, centroid) in centroids.iter_mut().enumerate() {
                let members: Vec<&ClusterItem> = items
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| assignments[*i] == Some(ci))
                    .map(|(_, item)| item)
                    .collect();
                if members.is_empty() {
                    continue;
                }
                let mut updated = vec![0.0f32; centroid.len()];
                for member in &members {
                    for (acc, x) in updated.iter_mut().zip(member.vector.iter()) {
                        *acc += x;
                    }
                }
                let count = members.len() as f32;
                for x in &mut updated {
                    *x /= count;
                }
                if euclidean_distance(centroid, &updated) >= self.config.tolerance {
                    converged = false;
                }
                *centroid = updated;
            }
            if converged {
                break;
            }
        }

        // Final assignment against the converged centroids.
        for (i, item) in items.iter().enumerate() {
            assignments[i] = nearest_centroid(&item.vector, &centroids)
                .filter(|&(_, sim)| sim > self.config.similarity_threshold)
                .map(|(ci, _)| ci);
        }

        let mut clusters = Vec::new();
        for (ci, centroid) in centroids.iter().enumerate() {
            let members: Vec<&ClusterItem> = items
                .iter()
                .enumerate()
                .filter(|(i, _)| assignments[*i] == Some(ci))
                .map(|(_, item)| item)
                .collect();
            if members.len() < 2 {
                continue;
            }
            clusters.push(build_cluster(&members, centroid.clone()));
        }
        Ok(clusters)
    }

    /// Agglomerative single-linkage clustering by cosine similarity: each
    /// item starts as its own cluster; the most-similar pair is merged until
    /// the cluster count reaches `max_clusters` or no pair clears
    /// `similarity_threshold`. Singleton clusters are discarded.
    pub fn agglomerative(&self, items: &[ClusterItem]) -> GraphResult<Vec<Cluster>> {
        if items.len() < 2 {
            return Ok(Vec::new());
        }
        let mut groups: Vec<Vec<usize>> = (0..items.len()).map(|i| vec![i]).collect();

        while groups.len() > self.config.max_clusters.max(1) {
            let mut best: Option<(usize, usize, f32)> = None;
            for a in 0..groups.len() {
                for b in (a + 1)..groups.len() {
                    let sim = single_linkage(&groups[a], &groups[b], items);
                    if best.map(|(_, _, s)| sim > s).unwrap_or(true) {
                        best = Some((a, b, sim));
                    }
                }
            }
            let Some((a, b, sim)) = best else {
                break;
            };
            if sim < self.config.similarity_threshold {
                break;
            }
            let merged = groups.remove(b);
            groups[a].extend(merged);
        }

        let mut clusters = Vec::new();
        for group in groups {
            if group.len() < 2 {
                continue;
            }
            let members: Vec<&ClusterItem> = group.iter().map(|&i| &items[i]).collect();
            let vectors: Vec<&[f32]> = members.iter().map(|m| m.vector.as_slice()).collect();
            let centroid = crate::vector::centroid(&vectors)?;
            clusters.push(build_cluster(&members, centroid));
        }
        Ok(clusters)
    }
}

/// k-means++ seeding: the first centroid is uniform-random; each later one
/// is sampled with probability proportional to its squared distance from
/// the nearest already-chosen centroid.
fn seed_centroids(items: &[ClusterItem], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);
    let first = rng.gen_range(0..items.len());
    centroids.push(items[first].vector.clone());

    while centroids.len() < k {
        let weights: Vec<f64> = items
            .iter()
            .map(|item| {
                centroids
                    .iter()
                    .map(|c| euclidean_distance(&item.vector, c) as f64)
                    .fold(f64::INFINITY, f64::min)
                    .powi(2)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total == 0.0 {
            // All remaining points coincide with a centroid.
            break;
        }
        let mut pick = rng.gen_range(0.0..total);
        let mut chosen = items.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if pick < *w {
                chosen = i;
                break;
            }
            pick -= w;
        }
        centroids.push(items[chosen].vector.clone());
    }
    centroids
}

fn nearest_centroid(vector: &[f32], centroids: &[Vec<f32>]) -> Option<(usize, f32)> {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, cosine_similarity(vector, c)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

fn single_linkage(a: &[usize], b: &[usize], items: &[ClusterItem]) -> f32 {
    let mut best = f32::NEG_INFINITY;
    for &i in a {
        for &j in b {
            let sim = cosine_similarity(&items[i].vector, &items[j].vector);
            if sim > best {
                best = sim;
            }
        }
    }
    best
}

fn build_cluster(members: &[&ClusterItem], centroid: Vec<f32>) -> Cluster {
    let mut type_counts: HashMap<&str, usize> = HashMap::new();
    for member in members {
        *type_counts.entry(member.node_type.as_str()).or_insert(0) += 1;
    }
    let most_common_type = type_counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(t, _)| t.to_string())
        .unwrap_or_default();
    let names: Vec<&str> = members.iter().take(2).map(|m| m.name.as_str()).collect();
    let theme = format!("{}: {}…", most_common_type, names.join(", "));

    let confidence = members
        .iter()
        .map(|m| cosine_similarity(&m.vector, &centroid))
        .sum::<f32>()
        / members.len() as f32;

    Cluster {
        members: members.iter().map(|m| m.id.clone()).collect(),
        centroid,
        theme,
        confidence,
    }
}
