//! Memory manager — recency tracking, eviction candidates, and the
//! name → id auxiliary index.

use std::collections::HashMap;

use lru::LruCache;

use crate::config::{EvictionStrategy, MemoryConfig};
use crate::types::normalize_name;

/// Tracks node recency and picks eviction candidates. The manager owns the
/// recency list and name index; the caller (the engine, via the store)
/// performs the actual removals.
pub struct MemoryManager {
    config: MemoryConfig,
    recency: LruCache<String, ()>,
    names: HashMap<String, String>,
}

impl MemoryManager {
    /// Create a manager.
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            recency: LruCache::unbounded(),
            names: HashMap::new(),
        }
    }

    /// Start tracking a node, optionally registering its name. A tracked
    /// node starts at the most-recent end.
    pub fn track(&mut self, id: &str, name: Option<&str>) {
        self.recency.put(id.to_string(), ());
        if let Some(name) = name {
            self.names.insert(normalize_name(name), id.to_string());
        }
    }

    /// Move a node to the most-recent end. Unknown ids start being tracked.
    pub fn mark_accessed(&mut self, id: &str) {
        if self.recency.get(id).is_none() {
            self.recency.put(id.to_string(), ());
        }
    }

    /// Stop tracking a node and drop any names that resolve to it.
    pub fn forget(&mut self, id: &str) {
        self.recency.pop(id);
        self.names.retain(|_, node_id| node_id != id);
    }

    /// Resolve a (raw) name to a node id via the normalized name index.
    pub fn lookup_name(&self, name: &str) -> Option<&str> {
        self.names.get(&normalize_name(name)).map(|s| s.as_str())
    }

    /// The ids to evict, oldest first: the oldest
    /// `tracked − max_memory_nodes + buffer` entries once the tracked count
    /// exceeds `max_memory_nodes`, else empty.
    pub fn nodes_to_evict(&self) -> Vec<String> {
        let tracked = self.recency.len();
        if tracked <= self.config.max_memory_nodes {
            return Vec::new();
        }
        let count = tracked - self.config.max_memory_nodes + self.config.eviction_buffer;
        let count = count.min(tracked);
        // lfu and temporal delegate to the lru ordering in v1.
        match self.config.strategy {
            EvictionStrategy::Lru | EvictionStrategy::Lfu | EvictionStrategy::Temporal => self
                .recency
                .iter()
                .rev()
                .take(count)
                .map(|(id, _)| id.clone())
                .collect(),
        }
    }

    /// Number of tracked nodes.
    pub fn len(&self) -> usize {
        self.recency.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.recency.is_empty()
    }

    /// Number of registered names.
    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Drop all tracking state.
    pub fn clear(&mut self) {
        self.recency.clear();
        self.names.clear();
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}
