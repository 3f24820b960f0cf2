//! Inverted text index with exact-term and fuzzy lookup.

use std::collections::{HashMap, HashSet};

/// Split text into lowercased tokens on whitespace and punctuation.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Inverted index from lowercased token to sorted node IDs.
pub struct TextIndex {
    inverted: HashMap<String, Vec<String>>,
    docs: HashMap<String, HashSet<String>>,
}

impl TextIndex {
    /// Create a new, empty text index.
    pub fn new() -> Self {
        Self {
            inverted: HashMap::new(),
            docs: HashMap::new(),
        }
    }

    /// Index a piece of text under a node id. Repeated calls for the same
    /// id merge token sets.
    pub fn add(&mut self, id: &str, text: &str) {
        let tokens = tokenize(text);
        let doc = self.docs.entry(id.to_string()).or_default();
        for token in tokens {
            if doc.insert(token.clone()) {
                let list = self.inverted.entry(token).or_default();
                if let Err(pos) = list.binary_search_by(|probe| probe.as_str().cmp(id)) {
                    list.insert(pos, id.to_string());
                }
            }
        }
    }

    /// Remove a node from the index entirely.
    pub fn remove(&mut self, id: &str) {
        let Some(tokens) = self.docs.remove(id) else {
            return;
        };
        for token in tokens {
            if let Some(list) = self.inverted.get_mut(&token) {
                if let Ok(pos) = list.binary_search_by(|probe| probe.as_str().cmp(id)) {
                    list.remove(pos);
                }
                if list.is_empty() {
                    self.inverted.remove(&token);
                }
            }
        }
    }

    /// Exact-term lookup. The term is lowercased before lookup.
    pub fn query(&self, term: &str) -> &[String] {
        self.inverted
            .get(&term.to_lowercase())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Nodes containing every token of the query text, sorted by id.
    pub fn query_all(&self, text: &str) -> Vec<String> {
        let tokens = tokenize(text);
        let Some(first) = tokens.first() else {
            return Vec::new();
        };
        let mut result: Vec<String> = self.query(first).to_vec();
        for token in &tokens[1..] {
            let ids: HashSet<&str> = self.query(token).iter().map(|s| s.as_str()).collect();
            result.retain(|id| ids.contains(id.as_str()));
        }
        result
    }

    /// Fuzzy lookup: bag-of-words Jaccard ratio between the query tokens
    /// and each indexed node's token set, thresholded by `threshold` in
    /// [0, 1]. Results sorted by score descending, then id.
    pub fn query_fuzzy(&self, text: &str, threshold: f32) -> Vec<(String, f32)> {
        let query: HashSet<String> = tokenize(text).into_iter().collect();
        if query.is_empty() {
            return Vec::new();
        }
        let mut matches: Vec<(String, f32)> = Vec::new();
        for (id, doc) in &self.docs {
            let intersection = query.intersection(doc).count();
            if intersection == 0 {
                continue;
            }
            let union = query.union(doc).count();
            let score = intersection as f32 / union as f32;
            if score >= threshold {
                matches.push((id.clone(), score));
            }
        }
        matches.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        matches
    }

    /// Number of distinct tokens.
    pub fn token_count(&self) -> usize {
        self.inverted.len()
    }

    /// Number of indexed documents (nodes).
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Clear the index.
    pub fn clear(&mut self) {
        self.inverted.clear();
        self.docs.clear();
    }
}

impl Default for TextIndex {
    fn default() -> Self {
        Self::new()
    }
}
