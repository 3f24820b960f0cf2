//! Label index — maps each node type tag to sorted node IDs.

use std::collections::HashMap;

/// Maps each node type to a sorted list of node IDs.
pub struct LabelIndex {
    index: HashMap<String, Vec<String>>,
}

impl LabelIndex {
    /// Create a new, empty label index.
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
        }
    }

    /// Get all node IDs with a given type tag.
    pub fn get(&self, node_type: &str) -> &[String] {
        self.index
            .get(node_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all node IDs matching any of the given types, merged and sorted.
    pub fn get_any(&self, node_types: &[String]) -> Vec<String> {
        let mut result: Vec<String> = Vec::new();
        for nt in node_types {
            if let Some(ids) = self.index.get(nt) {
                result.extend_from_slice(ids);
            }
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Count nodes of a given type.
    pub fn count(&self, node_type: &str) -> usize {
        self.index.get(node_type).map(|v| v.len()).unwrap_or(0)
    }

    /// All known type tags, sorted.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.index.keys().cloned().collect();
        labels.sort_unstable();
        labels
    }

    /// Incrementally add a node.
    pub fn add(&mut self, id: &str, node_type: &str) {
        let list = self.index.entry(node_type.to_string()).or_default();
        if let Err(pos) = list.binary_search_by(|probe| probe.as_str().cmp(id)) {
            list.insert(pos, id.to_string());
        }
    }

    /// Remove a node from the index.
    pub fn remove(&mut self, id: &str, node_type: &str) {
        if let Some(list) = self.index.get_mut(node_type) {
            if let Ok(pos) = list.binary_search_by(|probe| probe.as_str().cmp(id)) {
                list.remove(pos);
            }
            if list.is_empty() {
                self.index.remove(node_type);
            }
        }
    }

    /// Clear the index.
    pub fn clear(&mut self) {
        self.index.clear();
    }

    /// Number of total entries across all types.
    pub fn len(&self) -> usize {
        self.index.values().map(|v| v.len()).sum()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LabelIndex {
    fn default() -> Self {
        Self::new()
    }
}
