//! Pattern index — small typed graph templates keyed for retrieval.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// A variable-labelled node slot in a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternNode {
    /// Variable name scoped to the pattern.
    pub var: String,
    /// Required node type.
    pub node_type: String,
}

/// A typed, directed edge slot between two pattern variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEdge {
    /// Source variable.
    pub from_var: String,
    /// Target variable.
    pub to_var: String,
    /// Required edge type.
    pub edge_type: String,
    /// Required direction.
    pub direction: Direction,
}

/// A small node+edge template with variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPattern {
    /// Stable identifier.
    pub id: String,
    /// Node slots.
    pub nodes: Vec<PatternNode>,
    /// Edge slots.
    pub edges: Vec<PatternEdge>,
}

impl GraphPattern {
    /// Create a pattern with a minted id.
    pub fn new(nodes: Vec<PatternNode>, edges: Vec<PatternEdge>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            nodes,
            edges,
        }
    }

    /// The set of node types the pattern involves.
    pub fn node_types(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.node_type.as_str()).collect()
    }

    /// The set of edge types the pattern involves.
    pub fn edge_types(&self) -> HashSet<&str> {
        self.edges.iter().map(|e| e.edge_type.as_str()).collect()
    }
}

/// Stores graph patterns keyed by involved node and edge type.
pub struct PatternIndex {
    patterns: HashMap<String, GraphPattern>,
    by_node_type: HashMap<String, Vec<String>>,
    by_edge_type: HashMap<String, Vec<String>>,
}

impl PatternIndex {
    /// Create a new, empty pattern index.
    pub fn new() -> Self {
        Self {
            patterns: HashMap::new(),
            by_node_type: HashMap::new(),
            by_edge_type: HashMap::new(),
        }
    }

    /// Store a pattern, keyed under every node and edge type it involves.
    pub fn add(&mut self, pattern: GraphPattern) {
        for nt in pattern.node_types() {
            insert_sorted(
                self.by_node_type.entry(nt.to_string()).or_default(),
                &pattern.id,
            );
        }
        for et in pattern.edge_types() {
            insert_sorted(
                self.by_edge_type.entry(et.to_string()).or_default(),
                &pattern.id,
            );
        }
        self.patterns.insert(pattern.id.clone(), pattern);
    }

    /// Remove a pattern.
    pub fn remove(&mut self, id: &str) {
        let Some(pattern) = self.patterns.remove(id) else {
            return;
        };
        for nt in pattern.node_types() {
            remove_sorted(&mut self.by_node_type, nt, id);
        }
        for et in pattern.edge_types() {
            remove_sorted(&mut self.by_edge_type, et, id);
        }
    }

    /// Get a stored pattern.
    pub fn get(&self, id: &str) -> Option<&GraphPattern> {
        self.patterns.get(id)
    }

    /// Pattern ids keyed under a node type.
    pub fn by_node_type(&self, node_type: &str) -> &[String] {
        self.by_node_type
            .get(node_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Pattern ids keyed under an edge type.
    pub fn by_edge_type(&self, edge_type: &str) -> &[String] {
        self.by_edge_type
            .get(edge_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Stored patterns matching the probe: a stored pattern matches when its
    /// node-type set and edge-type set are both subsets of the probe's.
    /// Results sorted by pattern id.
    pub fn matches(&self, probe: &GraphPattern) -> Vec<String> {
        let probe_nodes = probe.node_types();
        let probe_edges = probe.edge_types();
        let mut ids: Vec<String> = self
            .patterns
            .values()
            .filter(|stored| {
                stored.node_types().is_subset(&probe_nodes)
                    && stored.edge_types().is_subset(&probe_edges)
            })
            .map(|stored| stored.id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of stored patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Clear the index.
    pub fn clear(&mut self) {
        self.patterns.clear();
        self.by_node_type.clear();
        self.by_edge_type.clear();
    }
}

impl Default for PatternIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_sorted(list: &mut Vec<String>, id: &str) {
    if let Err(pos) = list.binary_search_by(|probe| probe.as_str().cmp(id)) {
        list.insert(pos, id.to_string());
    }
}

fn remove_sorted(map: &mut HashMap<String, Vec<String>>, key: &str, id: &str) {
    if let Some(list) = map.get_mut(key) {
        if let Ok(pos) = list.binary_search_by(|probe| probe.as_str().cmp(id)) {
            list.remove(pos);
        }
        if list.is_empty() {
            map.remove(key);
        }
    }
}
