//! The graph store — typed nodes, directed edges, dual adjacency lists.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use crate::config::GraphConfig;
use crate::index::{IndexSet, IndexStats};
use crate::types::{
    Direction, Edge, GraphError, GraphResult, Node, PropertyValue, OPERATION_HISTORY_SIZE,
};
use crate::vector::is_valid_vector;

/// A neighbor triple returned by `get_neighbors`.
#[derive(Debug, Clone)]
pub struct Neighbor {
    /// The adjacent node.
    pub node: Node,
    /// The connecting edge.
    pub edge: Edge,
    /// Whether the edge leaves (`Out`) or enters (`In`) the anchor node.
    pub direction: Direction,
}

/// What a history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// A node was added.
    AddNode,
    /// An edge was added.
    AddEdge,
    /// A node was removed (with its incident edges).
    RemoveNode,
    /// An edge was removed.
    RemoveEdge,
    /// Node properties were replaced.
    UpdateNode,
    /// The store was cleared.
    Clear,
}

/// One entry in the bounded operation-history ring. Post-mortem aid only;
/// not part of the correctness contract.
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    /// Mutation kind.
    pub kind: OperationKind,
    /// Commit timestamp.
    pub at: DateTime<Utc>,
    /// Affected ids and context.
    pub details: String,
}

/// Store-level counters for metrics.
#[derive(Debug, Clone, Serialize)]
pub struct GraphMetrics {
    /// Number of nodes.
    pub node_count: usize,
    /// Number of edges.
    pub edge_count: usize,
    /// Edge density `m / (n * (n - 1))`; 0 for graphs with < 2 nodes.
    pub density: f64,
    /// Per-index entry counts.
    pub indexes: IndexStats,
}

/// The core in-memory graph: id-keyed node and edge tables plus
/// insertion-ordered forward and reverse adjacency lists.
///
/// The store exclusively owns all nodes and edges. Indices hold ids only,
/// and every returned collection is a defensive copy.
pub struct GraphStore {
    config: GraphConfig,
    nodes: HashMap<String, Node>,
    edges: HashMap<String, Edge>,
    outgoing: HashMap<String, Vec<String>>,
    incoming: HashMap<String, Vec<String>>,
    indexes: IndexSet,
    history: VecDeque<Operation>,
}

impl GraphStore {
    /// Create an empty store.
    pub fn new(config: GraphConfig) -> Self {
        let indexes = IndexSet::new(config.dimension, config.indexes);
        Self {
            config,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            indexes,
            history: VecDeque::with_capacity(OPERATION_HISTORY_SIZE),
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The configured caps and flags.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Add a node. Fails with capacity when the node table is full, with
    /// a dimension error when the embedding does not match the configured
    /// dimension, and with invalid-argument on a duplicate id. The store
    /// is unchanged on failure.
    pub fn add_node(&mut self, node: Node) -> GraphResult<String> {
        if self.nodes.len() >= self.config.max_nodes {
            return Err(GraphError::NodeCapacityExceeded(self.config.max_nodes));
        }
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::InvalidArgument(format!(
                "node {} already exists",
                node.id
            )));
        }
        if let Some(embedding) = &node.embedding {
            if embedding.len() != self.config.dimension {
                return Err(GraphError::DimensionMismatch {
                    expected: self.config.dimension,
                    got: embedding.len(),
                });
            }
            if !is_valid_vector(embedding) {
                return Err(GraphError::InvalidArgument(
                    "embedding contains non-finite entries".to_string(),
                ));
            }
        }

        let id = node.id.clone();
        self.indexes.add_node(&node)?;
        self.outgoing.insert(id.clone(), Vec::new());
        self.incoming.insert(id.clone(), Vec::new());
        self.nodes.insert(id.clone(), node);
        self.record(OperationKind::AddNode, format!("node={id}"));
        debug!("added node {id}");
        Ok(id)
    }

    /// Add an edge between two existing nodes. Fails with not-found on a
    /// missing endpoint and with capacity when the source node's out-degree
    /// is at the cap. The store is unchanged on failure.
    pub fn add_edge(&mut self, edge: Edge) -> GraphResult<String> {
        if !self.nodes.contains_key(&edge.source) {
            return Err(GraphError::NodeNotFound(edge.source.clone()));
        }
        if !self.nodes.contains_key(&edge.target) {
            return Err(GraphError::NodeNotFound(edge.target.clone()));
        }
        if self.edges.contains_key(&edge.id) {
            return Err(GraphError::InvalidArgument(format!(
                "edge {} already exists",
                edge.id
            )));
        }
        if !edge.weight.is_finite() || edge.weight < 0.0 {
            return Err(GraphError::InvalidArgument(format!(
                "edge weight must be a finite non-negative number, got {}",
                edge.weight
            )));
        }
        let out_degree = self.outgoing.get(&edge.source).map(|v| v.len()).unwrap_or(0);
        if out_degree >= self.config.max_edges_per_node {
            return Err(GraphError::EdgeCapacityExceeded {
                node: edge.source.clone(),
                max: self.config.max_edges_per_node,
            });
        }

        let id = edge.id.clone();
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(id.clone());
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .push(id.clone());
        self.record(
            OperationKind::AddEdge,
            format!("edge={id} {}-[{}]->{}", edge.source, edge.edge_type, edge.target),
        );
        debug!("added edge {id} ({} -> {})", edge.source, edge.target);
        self.edges.insert(id.clone(), edge);
        Ok(id)
    }

    /// Get a node by id.
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get an edge by id.
    pub fn get_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Outgoing edges of a node in insertion order, optionally filtered by
    /// relation type. Copies.
    pub fn get_outgoing(&self, id: &str, edge_types: Option<&[String]>) -> GraphResult<Vec<Edge>> {
        let edge_ids = self
            .outgoing
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        Ok(self.collect_edges(edge_ids, edge_types))
    }

    /// Incoming edges of a node in insertion order, optionally filtered by
    /// relation type. Copies.
    pub fn get_incoming(&self, id: &str, edge_types: Option<&[String]>) -> GraphResult<Vec<Edge>> {
        let edge_ids = self
            .incoming
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        Ok(self.collect_edges(edge_ids, edge_types))
    }

    /// Neighbor triples (node, edge, direction), outgoing first, each side
    /// in edge insertion order.
    pub fn get_neighbors(
        &self,
        id: &str,
        edge_types: Option<&[String]>,
    ) -> GraphResult<Vec<Neighbor>> {
        let mut neighbors = Vec::new();
        for edge in self.get_outgoing(id, edge_types)? {
            if let Some(node) = self.nodes.get(&edge.target) {
                neighbors.push(Neighbor {
                    node: node.clone(),
                    edge,
                    direction: Direction::Out,
                });
            }
        }
        for edge in self.get_incoming(id, edge_types)? {
            if let Some(node) = self.nodes.get(&edge.source) {
                neighbors.push(Neighbor {
                    node: node.clone(),
                    edge,
                    direction: Direction::In,
                });
            }
        }
        Ok(neighbors)
    }

    /// Remove an edge.
    pub fn remove_edge(&mut self, id: &str) -> GraphResult<Edge> {
        let edge = self
            .edges
            .remove(id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.to_string()))?;
        if let Some(list) = self.outgoing.get_mut(&edge.source) {
            list.retain(|eid| eid != id);
        }
        if let Some(list) = self.incoming.get_mut(&edge.target) {
            list.retain(|eid| eid != id);
        }
        self.record(OperationKind::RemoveEdge, format!("edge={id}"));
        debug!("removed edge {id}");
        Ok(edge)
    }

    /// Remove a node, cascading to every incident edge (both directions)
    /// through the `remove_edge` path.
    pub fn remove_node(&mut self, id: &str) -> GraphResult<Node> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::NodeNotFound(id.to_string()));
        }
        let mut incident: Vec<String> = Vec::new();
        incident.extend(self.outgoing.get(id).cloned().unwrap_or_default());
        incident.extend(self.incoming.get(id).cloned().unwrap_or_default());
        incident.dedup();
        for edge_id in incident {
            // A self-referencing bucket pair can list an edge twice.
            if self.edges.contains_key(&edge_id) {
                self.remove_edge(&edge_id)?;
            }
        }

        let Some(node) = self.nodes.remove(id) else {
            return Err(GraphError::NodeNotFound(id.to_string()));
        };
        self.outgoing.remove(id);
        self.incoming.remove(id);
        self.indexes.remove_node(&node);
        self.record(OperationKind::RemoveNode, format!("node={id}"));
        debug!("removed node {id}");
        Ok(node)
    }

    /// Replace a node's properties (the entity-resolution merge path) and
    /// re-index it.
    pub fn set_properties(
        &mut self,
        id: &str,
        properties: HashMap<String, PropertyValue>,
    ) -> GraphResult<()> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        let before = node.clone();
        let mut after = before.clone();
        after.properties = properties;
        after.touch();
        self.indexes.update_node(&before, &after)?;
        self.nodes.insert(id.to_string(), after);
        self.record(OperationKind::UpdateNode, format!("node={id}"));
        Ok(())
    }

    /// All nodes. Copies.
    pub fn all_nodes(&self) -> Vec<Node> {
        self.nodes.values().cloned().collect()
    }

    /// All edges. Copies.
    pub fn all_edges(&self) -> Vec<Edge> {
        self.edges.values().cloned().collect()
    }

    /// Iterate nodes without copying. Read-only.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate edges without copying. Read-only.
    pub fn iter_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Drop everything, including index contents and history.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.outgoing.clear();
        self.incoming.clear();
        self.indexes.clear();
        self.history.clear();
        self.record(OperationKind::Clear, String::new());
    }

    /// Edge density `m / (n * (n - 1))`.
    pub fn density(&self) -> f64 {
        let n = self.nodes.len();
        if n < 2 {
            return 0.0;
        }
        self.edges.len() as f64 / (n as f64 * (n as f64 - 1.0))
    }

    /// Store-level metrics snapshot.
    pub fn metrics(&self) -> GraphMetrics {
        GraphMetrics {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            density: self.density(),
            indexes: self.indexes.stats(),
        }
    }

    /// The index set.
    pub fn indexes(&self) -> &IndexSet {
        &self.indexes
    }

    /// Mutable index set (pattern registration).
    pub fn indexes_mut(&mut self) -> &mut IndexSet {
        &mut self.indexes
    }

    /// The last K mutations, oldest first. Copy.
    pub fn history(&self) -> Vec<Operation> {
        self.history.iter().cloned().collect()
    }

    /// Check every structural invariant. Returns the list of violations;
    /// empty means the store is consistent. Diagnostics only — a non-empty
    /// result indicates a bug in the store itself.
    pub fn validate_consistency(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.nodes.len() != self.outgoing.len() {
            issues.push(format!(
                "node table has {} entries but out-adjacency has {}",
                self.nodes.len(),
                self.outgoing.len()
            ));
        }
        if self.nodes.len() != self.incoming.len() {
            issues.push(format!(
                "node table has {} entries but in-adjacency has {}",
                self.nodes.len(),
                self.incoming.len()
            ));
        }

        for (node_id, edge_ids) in &self.outgoing {
            if !self.nodes.contains_key(node_id) {
                issues.push(format!("out-adjacency references missing node {node_id}"));
            }
            for edge_id in edge_ids {
                match self.edges.get(edge_id) {
                    None => issues.push(format!(
                        "out-adjacency of {node_id} references missing edge {edge_id}"
                    )),
                    Some(edge) if edge.source != *node_id => issues.push(format!(
                        "edge {edge_id} filed under {node_id} but has source {}",
                        edge.source
                    )),
                    _ => {}
                }
            }
        }
        for (node_id, edge_ids) in &self.incoming {
            if !self.nodes.contains_key(node_id) {
                issues.push(format!("in-adjacency references missing node {node_id}"));
            }
            for edge_id in edge_ids {
                match self.edges.get(edge_id) {
                    None => issues.push(format!(
                        "in-adjacency of {node_id} references missing edge {edge_id}"
                    )),
                    Some(edge) if edge.target != *node_id => issues.push(format!(
                        "edge {edge_id} filed under {node_id} but has target {}",
                        edge.target
                    )),
                    _ => {}
                }
            }
        }

        for (edge_id, edge) in &self.edges {
            let out_count = self
                .outgoing
                .get(&edge.source)
                .map(|v| v.iter().filter(|eid| *eid == edge_id).count())
                .unwrap_or(0);
            if out_count != 1 {
                issues.push(format!(
                    "edge {edge_id} appears {out_count} times in out-adjacency of {}",
                    edge.source
                ));
            }
            let in_count = self
                .incoming
                .get(&edge.target)
                .map(|v| v.iter().filter(|eid| *eid == edge_id).count())
                .unwrap_or(0);
            if in_count != 1 {
                issues.push(format!(
                    "edge {edge_id} appears {in_count} times in in-adjacency of {}",
                    edge.target
                ));
            }
        }

        issues
    }

    fn collect_edges(&self, edge_ids: &[String], edge_types: Option<&[String]>) -> Vec<Edge> {
        edge_ids
            .iter()
            .filter_map(|eid| self.edges.get(eid))
            .filter(|edge| match edge_types {
                Some(types) => types.iter().any(|t| *t == edge.edge_type),
                None => true,
            })
            .cloned()
            .collect()
    }

    fn record(&mut self, kind: OperationKind, details: String) {
        if self.history.len() == OPERATION_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(Operation {
            kind,
            at: Utc::now(),
            details,
        });
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

impl super::traversal::GraphView for GraphStore {
    fn node(&self, id: &str) -> Option<Node> {
        self.nodes.get(id).cloned()
    }

    fn neighbors(&self, id: &str, edge_types: Option<&[String]>) -> Vec<Neighbor> {
        self.get_neighbors(id, edge_types).unwrap_or_default()
    }

    fn outgoing(&self, id: &str) -> Vec<Edge> {
        self.get_outgoing(id, None).unwrap_or_default()
    }

    fn incoming(&self, id: &str) -> Vec<Edge> {
        self.get_incoming(id, None).unwrap_or_default()
    }
}
