//! The memory engine — the public façade composing the store, indices,
//! temporal layer, memory manager, resolver, query processor, clustering,
//! and the persistence boundary.

pub mod cluster;
pub mod query;

pub use cluster::{Cluster, ClusterItem, ClusteringEngine};
pub use query::{QueryOptions, QueryProcessor, ScoredNode};

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::graph::{
    bfs, GraphMetrics, GraphStore, Neighbor, TraversalConfig, VisitedNode,
};
use crate::memory::MemoryManager;
use crate::persist::{EdgeRecord, JsonlStore, LoadOptions, NodeRecord, StoreReport};
use crate::resolver::{merge_entity_properties, EntityResolver};
use crate::temporal::{TemporalLayer, TemporalRelationship, TemporalSnapshot};
use crate::types::{
    record_error, Edge, EntityRecord, GraphError, GraphResult, Node, NodeBuilder, PropertyValue,
    RelationshipRecord,
};

/// Context accompanying a raw memory: where it came from and when.
#[derive(Debug, Clone, Default)]
pub struct MemoryContext {
    /// Origin tag ("conversation", "document", ...).
    pub source: Option<String>,
    /// Session identifier, if the caller tracks one.
    pub session: Option<String>,
    /// Event time; defaults to now. Relationship validity starts here.
    pub timestamp: Option<DateTime<Utc>>,
}

/// What an extractor pulled out of a raw memory.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Entities mentioned in the text.
    pub entities: Vec<EntityRecord>,
    /// Relationships between those entities.
    pub relationships: Vec<RelationshipRecord>,
}

/// The extraction collaborator. Runs outside the core; only the record
/// shapes are contractual.
pub trait EntityExtractor {
    /// Extract entity and relationship records from a raw memory.
    fn extract(&self, text: &str, context: &MemoryContext) -> GraphResult<Extraction>;
}

/// The default extractor: extracts nothing, so every memory lands as a raw
/// text node. Real deployments plug in an NLP/LLM-backed implementation.
pub struct NoopExtractor;

impl EntityExtractor for NoopExtractor {
    fn extract(&self, _text: &str, _context: &MemoryContext) -> GraphResult<Extraction> {
        Ok(Extraction::default())
    }
}

/// Outcome of `add_memory`.
#[derive(Debug, Clone, Serialize)]
pub struct AddMemoryResult {
    /// Nodes created.
    pub entities_created: usize,
    /// Existing nodes updated through entity resolution.
    pub entities_merged: usize,
    /// Edges created.
    pub relationships_created: usize,
    /// Wall-clock processing time in milliseconds.
    pub processing_ms: u64,
}

/// Knobs for `query_memory`.
#[derive(Debug, Clone, Default)]
pub struct QueryMemoryOptions {
    /// Ranking knobs.
    pub query: QueryOptions,
    /// Optional query embedding for the vector seeding path.
    pub embedding: Option<Vec<f32>>,
    /// Evaluate edges against the temporal view at this instant instead of
    /// now.
    pub at_time: Option<DateTime<Utc>>,
    /// Expand the neighborhood of the top seeds this many hops. 0 = off.
    pub expand_depth: u32,
}

/// Outcome of `query_memory`.
#[derive(Debug, Clone)]
pub struct QueryMemoryResult {
    /// Ranked nodes.
    pub nodes: Vec<ScoredNode>,
    /// Time-valid edges among the returned nodes.
    pub edges: Vec<Edge>,
    /// Wall-clock processing time in milliseconds.
    pub took_ms: u64,
}

/// Outcome of a sync or snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncReport {
    /// Node records written.
    pub nodes: StoreReport,
    /// Edge records written.
    pub edges: StoreReport,
}

/// Outcome of a restore.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreReport {
    /// Nodes loaded into the store.
    pub nodes_loaded: usize,
    /// Edges loaded (into the base graph or the temporal history).
    pub edges_loaded: usize,
}

/// Engine-wide metrics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct EngineMetrics {
    /// Store counts, density, and index stats.
    pub graph: GraphMetrics,
    /// Temporal records tracked (active and historical).
    pub temporal_records: usize,
    /// Nodes tracked by the memory manager.
    pub tracked_nodes: usize,
    /// Names registered in the auxiliary index.
    pub registered_names: usize,
    /// Nodes awaiting sync.
    pub dirty_nodes: usize,
    /// Edges awaiting sync.
    pub dirty_edges: usize,
}

/// Relevance discount applied to nodes pulled in by neighborhood expansion.
const EXPANSION_DISCOUNT: f32 = 0.3;
/// How many top seeds get their neighborhood expanded.
const EXPANSION_SEEDS: usize = 5;
/// Batch size for restore loads.
const RESTORE_BATCH: usize = 1000;

/// The knowledge-graph memory engine.
pub struct MemoryEngine {
    config: EngineConfig,
    store: GraphStore,
    temporal: TemporalLayer,
    memory: MemoryManager,
    resolver: EntityResolver,
    query: QueryProcessor,
    clustering: ClusteringEngine,
    extractor: Box<dyn EntityExtractor>,
    persist: Option<JsonlStore>,
    dirty_nodes: HashSet<String>,
    dirty_edges: HashSet<String>,
    last_sync: Instant,
}

impl MemoryEngine {
    /// Create an engine with the default (no-op) extractor.
    pub fn new(config: EngineConfig) -> GraphResult<Self> {
        Self::with_extractor(config, Box::new(NoopExtractor))
    }

    /// Create an engine with a caller-supplied extractor.
    pub fn with_extractor(
        config: EngineConfig,
        extractor: Box<dyn EntityExtractor>,
    ) -> GraphResult<Self> {
        let persist = match &config.storage {
            Some(storage) => Some(JsonlStore::new(storage.clone())?),
            None => None,
        };
        Ok(Self {
            store: GraphStore::new(config.graph.clone()),
            temporal: TemporalLayer::new(config.temporal.clone()),
            memory: MemoryManager::new(config.memory.clone()),
            resolver: EntityResolver::new(&config.resolution),
            query: QueryProcessor::new(config.fusion),
            clustering: ClusteringEngine::new(config.cluster.clone()),
            extractor,
            persist,
            dirty_nodes: HashSet::new(),
            dirty_edges: HashSet::new(),
            last_sync: Instant::now(),
            config,
        })
    }

    /// Ingest a raw text memory: extract records, resolve entities, mutate
    /// the graph and indices, track temporal validity, and queue dirty
    /// records for sync. A failed or empty extraction still produces a raw
    /// node carrying the text.
    pub fn add_memory(
        &mut self,
        text: &str,
        context: &MemoryContext,
    ) -> GraphResult<AddMemoryResult> {
        let started = Instant::now();
        let extraction = match self.extractor.extract(text, context) {
            Ok(extraction) => extraction,
            Err(err) => {
                record_error(&err);
                warn!("extraction failed, storing raw memory: {err}");
                Extraction::default()
            }
        };

        let mut entities_created = 0usize;
        let mut entities_merged = 0usize;
        let mut relationships_created = 0usize;

        if extraction.entities.is_empty() {
            let node = self.raw_memory_node(text, context);
            let id = self.store.add_node(node)?;
            self.memory.track(&id, None);
            self.dirty_nodes.insert(id);
            entities_created += 1;
        } else {
            let mut id_map: HashMap<String, String> = HashMap::new();
            for record in &extraction.entities {
                match self.ingest_entity(record)? {
                    IngestOutcome::Created(id) => {
                        entities_created += 1;
                        id_map.insert(record.id.clone(), id);
                    }
                    IngestOutcome::Merged(id) => {
                        entities_merged += 1;
                        id_map.insert(record.id.clone(), id);
                    }
                }
            }
            for record in &extraction.relationships {
                if self.ingest_relationship(record, &id_map, context)? {
                    relationships_created += 1;
                }
            }
        }

        self.evict();
        self.maybe_sync();

        Ok(AddMemoryResult {
            entities_created,
            entities_merged,
            relationships_created,
            processing_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Bulk-add entity records through the resolution pipeline. Returns the
    /// resolved or created node ids in input order.
    pub fn add_entities(&mut self, records: &[EntityRecord]) -> GraphResult<Vec<String>> {
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let outcome = self.ingest_entity(record)?;
            ids.push(outcome.into_id());
        }
        self.evict();
        Ok(ids)
    }

    /// Bulk-add relationship records. Endpoints must already exist; records
    /// with missing endpoints are skipped with a warning. Returns how many
    /// edges were created.
    pub fn add_relationships(&mut self, records: &[RelationshipRecord]) -> GraphResult<usize> {
        let context = MemoryContext::default();
        let id_map = HashMap::new();
        let mut created = 0usize;
        for record in records {
            if self.ingest_relationship(record, &id_map, &context)? {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Rank nodes relevant to a query, with the related time-valid edges.
    pub fn query_memory(
        &mut self,
        text: &str,
        options: &QueryMemoryOptions,
    ) -> GraphResult<QueryMemoryResult> {
        let started = Instant::now();
        let mut nodes = self.query.find_relevant_nodes(
            &self.store,
            &self.memory,
            text,
            options.embedding.as_deref(),
            &options.query,
        )?;

        if options.expand_depth > 0 {
            self.expand_neighborhood(&mut nodes, options);
        }

        let at = options.at_time.unwrap_or_else(Utc::now);
        let edges = self.related_edges(&nodes, at);

        for scored in &nodes {
            self.memory.mark_accessed(&scored.node.id);
        }

        Ok(QueryMemoryResult {
            nodes,
            edges,
            took_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Bounded BFS from a node. See [`crate::graph::bfs`].
    pub fn bfs_traversal(
        &self,
        node_id: &str,
        config: &TraversalConfig,
    ) -> GraphResult<Vec<VisitedNode>> {
        bfs(&self.store, node_id, config)
    }

    /// Neighbor triples of a node, outgoing first.
    pub fn get_neighbors(
        &self,
        node_id: &str,
        edge_types: Option<&[String]>,
    ) -> GraphResult<Vec<Neighbor>> {
        self.store.get_neighbors(node_id, edge_types)
    }

    /// A node by id. Copy.
    pub fn get_node(&self, node_id: &str) -> Option<Node> {
        self.store.get_node(node_id).cloned()
    }

    /// All nodes. Copies.
    pub fn get_all_nodes(&self) -> Vec<Node> {
        self.store.all_nodes()
    }

    /// All edges in the base graph. Copies.
    pub fn get_all_edges(&self) -> Vec<Edge> {
        self.store.all_edges()
    }

    /// The edges active at `t` and the nodes they reference.
    pub fn graph_state_at(&self, t: DateTime<Utc>) -> TemporalSnapshot {
        self.temporal.graph_state_at(&self.store, t)
    }

    /// Cluster node embeddings with the configured algorithm.
    pub fn cluster_memories(&self) -> GraphResult<Vec<Cluster>> {
        self.clustering.cluster_store(&self.store)
    }

    /// Engine-wide metrics.
    pub fn get_metrics(&self) -> EngineMetrics {
        EngineMetrics {
            graph: self.store.metrics(),
            temporal_records: self.temporal.record_count(),
            tracked_nodes: self.memory.len(),
            registered_names: self.memory.name_count(),
            dirty_nodes: self.dirty_nodes.len(),
            dirty_edges: self.dirty_edges.len(),
        }
    }

    /// Drop all in-memory state. Persisted chunks are untouched.
    pub fn clear(&mut self) {
        self.store.clear();
        self.temporal.clear();
        self.memory.clear();
        self.dirty_nodes.clear();
        self.dirty_edges.clear();
    }

    /// The graph store (read access).
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// The temporal layer (read access).
    pub fn temporal(&self) -> &TemporalLayer {
        &self.temporal
    }

    /// Mutable temporal layer, for sequence logging and manual
    /// invalidation via [`TemporalLayer`] methods that do not touch the
    /// base graph.
    pub fn temporal_mut(&mut self) -> &mut TemporalLayer {
        &mut self.temporal
    }

    /// Insert a fully-formed node, bypassing entity resolution. The seed
    /// and restore paths use this.
    pub fn store_node_direct(&mut self, node: Node) -> GraphResult<String> {
        let name = node.name().to_string();
        let id = self.store.add_node(node)?;
        self.memory.track(&id, Some(&name));
        self.dirty_nodes.insert(id.clone());
        Ok(id)
    }

    /// Insert a fully-formed edge without temporal tracking.
    pub fn store_edge_direct(&mut self, edge: Edge) -> GraphResult<String> {
        let id = self.store.add_edge(edge)?;
        self.dirty_edges.insert(id.clone());
        Ok(id)
    }

    /// Insert one relationship through the temporal layer.
    pub fn add_temporal_relationship(
        &mut self,
        spec: TemporalRelationship,
    ) -> GraphResult<crate::temporal::TemporalInsert> {
        let insert = self.temporal.add_relationship(&mut self.store, spec)?;
        self.dirty_edges.insert(insert.edge_id.clone());
        Ok(insert)
    }

    /// Write dirty records to the persistence boundary. Always available;
    /// the timer only decides when it happens automatically.
    pub fn sync(&mut self) -> GraphResult<SyncReport> {
        let Some(persist) = &self.persist else {
            return Ok(SyncReport::default());
        };
        let node_records: Vec<NodeRecord> = self
            .dirty_nodes
            .iter()
            .filter_map(|id| self.store.get_node(id))
            .map(NodeRecord::from)
            .collect();
        let edge_records: Vec<EdgeRecord> = self
            .dirty_edges
            .iter()
            .filter_map(|id| {
                let temporal = self.temporal.get_record(id);
                match (self.store.get_edge(id), temporal) {
                    (Some(edge), t) => Some(EdgeRecord::from_parts(edge, t)),
                    (None, Some(t)) => Some(EdgeRecord::from_parts(&t.edge, Some(t))),
                    (None, None) => None,
                }
            })
            .collect();

        let report = SyncReport {
            nodes: persist.store_nodes(&node_records)?,
            edges: persist.store_edges(&edge_records)?,
        };
        self.dirty_nodes.clear();
        self.dirty_edges.clear();
        self.last_sync = Instant::now();
        info!(
            "synced {} node and {} edge records",
            report.nodes.written, report.edges.written
        );
        Ok(report)
    }

    /// Rewrite the chunk set from scratch with the full graph.
    pub fn snapshot(&mut self) -> GraphResult<SyncReport> {
        let Some(persist) = &self.persist else {
            return Ok(SyncReport::default());
        };
        persist.reset()?;
        let node_records: Vec<NodeRecord> =
            self.store.iter_nodes().map(NodeRecord::from).collect();
        // Historical (invalidated) edges are part of the snapshot too.
        let mut edge_records: Vec<EdgeRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for record in self.temporal.all_records() {
            seen.insert(record.edge.id.clone());
            edge_records.push(EdgeRecord::from_parts(&record.edge, Some(&record)));
        }
        for edge in self.store.iter_edges() {
            if !seen.contains(&edge.id) {
                edge_records.push(EdgeRecord::from_parts(edge, None));
            }
        }

        let report = SyncReport {
            nodes: persist.store_nodes(&node_records)?,
            edges: persist.store_edges(&edge_records)?,
        };
        self.dirty_nodes.clear();
        self.dirty_edges.clear();
        self.last_sync = Instant::now();
        Ok(report)
    }

    /// Cold-start: clear in-memory state and stream the chunk set back in,
    /// batch by batch.
    pub fn restore(&mut self) -> GraphResult<RestoreReport> {
        if self.persist.is_none() {
            return Ok(RestoreReport::default());
        }
        self.clear();
        let mut report = RestoreReport::default();

        let mut offset = 0usize;
        loop {
            let batch = {
                let Some(persist) = &self.persist else { break };
                persist.load_nodes(&LoadOptions {
                    limit: RESTORE_BATCH,
                    offset,
                    ..LoadOptions::default()
                })?
            };
            if batch.is_empty() {
                break;
            }
            offset += batch.len();
            for record in batch {
                let node = record.into_node();
                let name = node.name().to_string();
                // Append-mostly chunks: the last record for an id wins.
                if self.store.get_node(&node.id).is_some() {
                    self.store.remove_node(&node.id)?;
                }
                let id = self.store.add_node(node)?;
                self.memory.track(&id, Some(&name));
                report.nodes_loaded += 1;
            }
        }

        let mut offset = 0usize;
        loop {
            let batch = {
                let Some(persist) = &self.persist else { break };
                persist.load_edges(&LoadOptions {
                    limit: RESTORE_BATCH,
                    offset,
                    ..LoadOptions::default()
                })?
            };
            if batch.is_empty() {
                break;
            }
            offset += batch.len();
            for record in batch {
                if self.restore_edge(record)? {
                    report.edges_loaded += 1;
                }
            }
        }

        Ok(report)
    }

    /// Create a named backup of the chunk set.
    pub fn create_backup(&self, name: Option<&str>) -> GraphResult<String> {
        match &self.persist {
            Some(persist) => persist.create_backup(name),
            None => Err(GraphError::InvalidArgument(
                "no storage configured".to_string(),
            )),
        }
    }

    /// Restore the chunk set from a named backup, then reload it.
    pub fn restore_from_backup(&mut self, name: &str) -> GraphResult<RestoreReport> {
        match &self.persist {
            Some(persist) => persist.restore_from_backup(name)?,
            None => {
                return Err(GraphError::InvalidArgument(
                    "no storage configured".to_string(),
                ))
            }
        }
        self.restore()
    }

    /// Apply one loaded edge record: temporally-tracked records replay
    /// through the temporal layer (an already-closed interval stays out of
    /// the base graph), bare records go straight to the store.
    fn restore_edge(&mut self, record: EdgeRecord) -> GraphResult<bool> {
        if self.store.get_node(&record.source).is_none()
            || self.store.get_node(&record.target).is_none()
        {
            warn!(
                "skipping edge {}: endpoint missing ({} -> {})",
                record.id, record.source, record.target
            );
            return Ok(false);
        }
        if record.valid_from.is_some() && self.config.enable_temporal {
            if self.temporal.get_record(&record.id).is_some() {
                return Ok(false);
            }
            let spec = TemporalRelationship {
                valid_from: record.valid_from,
                valid_until: record.valid_until,
                temporal_type: record.temporal_type,
                edge: record.into_edge(),
            };
            self.temporal.add_relationship(&mut self.store, spec)?;
        } else {
            if self.store.get_edge(&record.id).is_some() {
                self.store.remove_edge(&record.id)?;
            }
            self.store.add_edge(record.into_edge())?;
        }
        Ok(true)
    }

    fn raw_memory_node(&self, text: &str, context: &MemoryContext) -> Node {
        let mut builder = NodeBuilder::new("memory")
            .property("content", text)
            .property(
                "source",
                context.source.clone().unwrap_or_else(|| "unknown".to_string()),
            );
        if let Some(session) = &context.session {
            builder = builder.property("session", session.clone());
        }
        if let Some(ts) = context.timestamp {
            builder = builder.created_at(ts);
        }
        builder.build()
    }

    fn ingest_entity(&mut self, record: &EntityRecord) -> GraphResult<IngestOutcome> {
        if let Some(resolved) = self.resolver.resolve(record, &self.store, &self.memory)? {
            let node_id = resolved.node_id;
            if let Some(node) = self.store.get_node(&node_id) {
                let merged =
                    merge_entity_properties(&node.properties, &record.properties, "resolver");
                self.store.set_properties(&node_id, merged)?;
            }
            self.memory.track(&node_id, Some(&record.name));
            self.memory.mark_accessed(&node_id);
            self.dirty_nodes.insert(node_id.clone());
            return Ok(IngestOutcome::Merged(node_id));
        }

        let mut builder = NodeBuilder::new(record.entity_type.clone())
            .name(record.name.clone())
            .properties({
                let mut props = record.properties.clone();
                props.insert(
                    "name".to_string(),
                    PropertyValue::Str(record.name.clone()),
                );
                props
            });
        // Keep the extractor's id when it is free; mint otherwise.
        if !record.id.is_empty() && self.store.get_node(&record.id).is_none() {
            builder = builder.id(record.id.clone());
        }
        if let Some(embedding) = &record.embedding {
            builder = builder.embedding(embedding.clone());
        }
        let id = self.store.add_node(builder.build())?;
        self.memory.track(&id, Some(&record.name));
        self.dirty_nodes.insert(id.clone());
        Ok(IngestOutcome::Created(id))
    }

    fn ingest_relationship(
        &mut self,
        record: &RelationshipRecord,
        id_map: &HashMap<String, String>,
        context: &MemoryContext,
    ) -> GraphResult<bool> {
        let source = self.map_endpoint(&record.source, id_map);
        let target = self.map_endpoint(&record.target, id_map);
        let (Some(source), Some(target)) = (source, target) else {
            warn!(
                "skipping relationship {}: unresolved endpoint {} -> {}",
                record.relation_type, record.source, record.target
            );
            return Ok(false);
        };

        let mut edge = Edge::with_id(
            record.id.clone(),
            source,
            target,
            record.relation_type.clone(),
            record.confidence,
        );
        if self.store.get_edge(&edge.id).is_some()
            || self.temporal.get_record(&edge.id).is_some()
            || edge.id.is_empty()
        {
            edge.id = uuid::Uuid::new_v4().to_string();
        }
        edge.properties = record.properties.clone();

        if self.config.enable_temporal {
            let mut spec = TemporalRelationship::new(edge);
            if let Some(ts) = context.timestamp {
                spec = spec.valid_from(ts);
            }
            let insert = self.temporal.add_relationship(&mut self.store, spec)?;
            self.dirty_edges.insert(insert.edge_id);
            for invalidated in insert.invalidated {
                self.dirty_edges.insert(invalidated);
            }
        } else {
            let id = self.store.add_edge(edge)?;
            self.dirty_edges.insert(id);
        }
        Ok(true)
    }

    fn map_endpoint(&self, endpoint: &str, id_map: &HashMap<String, String>) -> Option<String> {
        if let Some(mapped) = id_map.get(endpoint) {
            return Some(mapped.clone());
        }
        if self.store.get_node(endpoint).is_some() {
            return Some(endpoint.to_string());
        }
        self.memory.lookup_name(endpoint).map(|id| id.to_string())
    }

    fn expand_neighborhood(&self, nodes: &mut Vec<ScoredNode>, options: &QueryMemoryOptions) {
        let mut present: HashSet<String> = nodes.iter().map(|s| s.node.id.clone()).collect();
        let seeds: Vec<(String, f32)> = nodes
            .iter()
            .take(EXPANSION_SEEDS)
            .map(|s| (s.node.id.clone(), s.score))
            .collect();
        for (seed_id, seed_score) in seeds {
            let config = TraversalConfig {
                max_depth: options.expand_depth,
                max_nodes: options.query.max_results,
                include_start: false,
                ..TraversalConfig::default()
            };
            let Ok(visited) = bfs(&self.store, &seed_id, &config) else {
                continue;
            };
            for v in visited {
                if present.contains(&v.node.id) {
                    continue;
                }
                let score = seed_score * EXPANSION_DISCOUNT;
                if score < options.query.min_score {
                    continue;
                }
                present.insert(v.node.id.clone());
                nodes.push(ScoredNode {
                    node: v.node,
                    score,
                });
            }
        }
        nodes.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node.id.cmp(&b.node.id))
        });
        nodes.truncate(options.query.max_results);
    }

    /// Edges connecting any two returned nodes, filtered through the
    /// temporal view at `at` when the edge is temporally tracked.
    fn related_edges(&self, nodes: &[ScoredNode], at: DateTime<Utc>) -> Vec<Edge> {
        let ids: HashSet<&str> = nodes.iter().map(|s| s.node.id.as_str()).collect();
        let mut edges: Vec<Edge> = self
            .store
            .iter_edges()
            .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
            .filter(|e| {
                self.temporal
                    .get_record(&e.id)
                    .map(|r| r.active_at(at))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        edges
    }

    fn evict(&mut self) {
        if self.store.node_count() <= self.config.memory.max_memory_nodes {
            return;
        }
        let candidates = self.memory.nodes_to_evict();
        if candidates.is_empty() {
            return;
        }
        info!("evicting {} nodes", candidates.len());
        for id in candidates {
            if self.store.get_node(&id).is_some() {
                if let Err(err) = self.store.remove_node(&id) {
                    warn!("eviction of {id} failed: {err}");
                    continue;
                }
            }
            self.memory.forget(&id);
            self.dirty_nodes.remove(&id);
        }
    }

    fn maybe_sync(&mut self) {
        if self.persist.is_none() {
            return;
        }
        let interval = Duration::from_millis(
            self.config
                .storage
                .as_ref()
                .map(|s| s.sync_interval_ms)
                .unwrap_or(u64::MAX),
        );
        if self.last_sync.elapsed() < interval {
            return;
        }
        if let Err(err) = self.sync() {
            record_error(&err);
            warn!("timer-driven sync failed: {err}");
        }
    }
}

enum IngestOutcome {
    Created(String),
    Merged(String),
}

impl IngestOutcome {
    fn into_id(self) -> String {
        match self {
            Self::Created(id) | Self::Merged(id) => id,
        }
    }
}
