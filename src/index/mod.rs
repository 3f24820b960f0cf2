//! Index structures for fast lookup. Each index is independent and
//! incrementally updateable; the store keeps them in sync on mutation.
//!
//! Indices hold node ids only — the graph store owns the nodes themselves.
//! Removing an id from one index never cascades to another.

pub mod label_index;
pub mod pattern_index;
pub mod property_index;
pub mod text_index;
pub mod vector_index;

pub use label_index::LabelIndex;
pub use pattern_index::{GraphPattern, PatternEdge, PatternIndex, PatternNode};
pub use property_index::{PropertyIndex, PropertyOp};
pub use text_index::{tokenize, TextIndex};
pub use vector_index::{DistanceMetric, VectorIndex, VectorMatch};

use serde::Serialize;

use crate::config::IndexFlags;
use crate::types::{GraphResult, Node, PropertyValue};

/// Per-index entry counts, for metrics.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    /// Entries in the label index.
    pub label_entries: usize,
    /// (node, property) entries in the property index.
    pub property_entries: usize,
    /// Documents in the text index.
    pub text_documents: usize,
    /// Distinct tokens in the text index.
    pub text_tokens: usize,
    /// Vectors in the vector index.
    pub vector_entries: usize,
    /// Stored patterns.
    pub pattern_entries: usize,
}

/// The unified index façade the query planner consults.
pub struct IndexSet {
    flags: IndexFlags,
    label: LabelIndex,
    property: PropertyIndex,
    text: TextIndex,
    vector: VectorIndex,
    pattern: PatternIndex,
}

impl IndexSet {
    /// Create an index set for embeddings of the given dimension.
    pub fn new(dimension: usize, flags: IndexFlags) -> Self {
        Self {
            flags,
            label: LabelIndex::new(),
            property: PropertyIndex::new(),
            text: TextIndex::new(),
            vector: VectorIndex::new(dimension),
            pattern: PatternIndex::new(),
        }
    }

    /// Index a node across every enabled index. The embedding dimension is
    /// validated by the store before it gets here.
    pub fn add_node(&mut self, node: &Node) -> GraphResult<()> {
        if self.flags.label {
            self.label.add(&node.id, &node.node_type);
        }
        if self.flags.property {
            for (key, value) in &node.properties {
                self.property.add(&node.id, key, value);
            }
        }
        if self.flags.text {
            for text in searchable_text(node) {
                self.text.add(&node.id, &text);
            }
        }
        if self.flags.vector {
            if let Some(embedding) = &node.embedding {
                self.vector.add(&node.id, embedding.clone())?;
            }
        }
        Ok(())
    }

    /// Drop a node from every index.
    pub fn remove_node(&mut self, node: &Node) {
        self.label.remove(&node.id, &node.node_type);
        for (key, value) in &node.properties {
            self.property.remove(&node.id, key, value);
        }
        self.text.remove(&node.id);
        self.vector.remove(&node.id);
    }

    /// Re-index a node after a property merge: drop the stale entries for
    /// the previous shape, then index the new one.
    pub fn update_node(&mut self, before: &Node, after: &Node) -> GraphResult<()> {
        self.remove_node(before);
        self.add_node(after)
    }

    /// The label index.
    pub fn label(&self) -> &LabelIndex {
        &self.label
    }

    /// The property index.
    pub fn property(&self) -> &PropertyIndex {
        &self.property
    }

    /// The text index.
    pub fn text(&self) -> &TextIndex {
        &self.text
    }

    /// The vector index.
    pub fn vector(&self) -> &VectorIndex {
        &self.vector
    }

    /// The pattern index.
    pub fn pattern(&self) -> &PatternIndex {
        &self.pattern
    }

    /// Mutable pattern index. Patterns are registered by callers, not
    /// derived from node mutations.
    pub fn pattern_mut(&mut self) -> &mut PatternIndex {
        &mut self.pattern
    }

    /// The configured enable flags.
    pub fn flags(&self) -> IndexFlags {
        self.flags
    }

    /// Merged per-index stats.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            label_entries: self.label.len(),
            property_entries: self.property.len(),
            text_documents: self.text.len(),
            text_tokens: self.text.token_count(),
            vector_entries: self.vector.len(),
            pattern_entries: self.pattern.len(),
        }
    }

    /// Clear every index.
    pub fn clear(&mut self) {
        self.label.clear();
        self.property.clear();
        self.text.clear();
        self.vector.clear();
        self.pattern.clear();
    }
}

/// The text fragments of a node that feed the text index: its name and
/// every string property value, including strings inside lists.
fn searchable_text(node: &Node) -> Vec<String> {
    let mut fragments = Vec::new();
    for value in node.properties.values() {
        collect_strings(value, &mut fragments);
    }
    fragments
}

fn collect_strings(value: &PropertyValue, out: &mut Vec<String>) {
    match value {
        PropertyValue::Str(s) => out.push(s.clone()),
        PropertyValue::List(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        _ => {}
    }
}
