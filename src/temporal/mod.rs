//! Temporal layer — validity-interval edges, conflict-driven invalidation,
//! time-aware views.
//!
//! The layer wraps the graph store without changing its base contract: it
//! owns only temporal metadata keyed by edge id. An invalidated edge is
//! removed from the base graph but retained here for historical queries.

pub mod events;

pub use events::{EventPattern, EventSequence, EventSequenceLog, SequenceEvent};

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::TemporalConfig;
use crate::graph::GraphStore;
use crate::types::{Edge, GraphError, GraphResult, Node};

/// Temporal class of a relationship. Determines the default validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalType {
    /// Time-stable knowledge. Default window 1 year.
    Fact,
    /// A point-in-time occurrence. Default window 30 days.
    Event,
    /// A time-extended condition. Default window 90 days.
    State,
}

impl TemporalType {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fact => "fact",
            Self::Event => "event",
            Self::State => "state",
        }
    }

    /// Parse from a string name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "fact" => Some(Self::Fact),
            "event" => Some(Self::Event),
            "state" => Some(Self::State),
            _ => None,
        }
    }
}

impl std::fmt::Display for TemporalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Why an edge's validity interval was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationReason {
    /// A newer edge of the same relation type replaced it.
    Superseded,
    /// A mutually-exclusive relation contradicted it.
    Contradicted,
    /// Its validity window ran out.
    Expired,
    /// The surrounding context changed.
    ContextChanged,
    /// Explicit caller request.
    Manual,
    /// A conflicting cross-graph link.
    CrossGraphConflict,
}

impl InvalidationReason {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Superseded => "superseded",
            Self::Contradicted => "contradicted",
            Self::Expired => "expired",
            Self::ContextChanged => "context_changed",
            Self::Manual => "manual",
            Self::CrossGraphConflict => "cross_graph_conflict",
        }
    }
}

/// Temporal metadata for one edge, plus the edge itself so history survives
/// removal from the base graph.
#[derive(Debug, Clone)]
pub struct TemporalRecord {
    /// The edge data.
    pub edge: Edge,
    /// Start of validity.
    pub valid_from: DateTime<Utc>,
    /// End of validity; None = open-ended.
    pub valid_until: Option<DateTime<Utc>>,
    /// Temporal class.
    pub temporal_type: TemporalType,
    /// When the record was invalidated, if it has been.
    pub invalidated_at: Option<DateTime<Utc>>,
    /// Why it was invalidated.
    pub reason: Option<InvalidationReason>,
}

impl TemporalRecord {
    /// Whether the edge is active at time `t`:
    /// `valid_from <= t` and (`valid_until` absent or `> t`).
    pub fn active_at(&self, t: DateTime<Utc>) -> bool {
        self.valid_from <= t && self.valid_until.map(|u| u > t).unwrap_or(true)
    }

    /// Whether the record has been invalidated.
    pub fn is_invalidated(&self) -> bool {
        self.invalidated_at.is_some()
    }
}

/// Input to [`TemporalLayer::add_relationship`]. Unset fields fall back to
/// classification and the per-class default window.
pub struct TemporalRelationship {
    /// The edge to insert.
    pub edge: Edge,
    /// Start of validity. Default: now.
    pub valid_from: Option<DateTime<Utc>>,
    /// End of validity. Default: `valid_from` + the class window.
    pub valid_until: Option<DateTime<Utc>>,
    /// Temporal class. Default: inferred from the relation verb.
    pub temporal_type: Option<TemporalType>,
}

impl TemporalRelationship {
    /// Wrap an edge with all temporal fields defaulted.
    pub fn new(edge: Edge) -> Self {
        Self {
            edge,
            valid_from: None,
            valid_until: None,
            temporal_type: None,
        }
    }

    /// Set the validity start, builder-style.
    pub fn valid_from(mut self, t: DateTime<Utc>) -> Self {
        self.valid_from = Some(t);
        self
    }

    /// Set the validity end, builder-style.
    pub fn valid_until(mut self, t: DateTime<Utc>) -> Self {
        self.valid_until = Some(t);
        self
    }

    /// Set the temporal class, builder-style.
    pub fn temporal_type(mut self, tt: TemporalType) -> Self {
        self.temporal_type = Some(tt);
        self
    }
}

/// Outcome of a temporal insertion.
#[derive(Debug, Clone)]
pub struct TemporalInsert {
    /// Id of the inserted edge.
    pub edge_id: String,
    /// Resolved temporal class.
    pub temporal_type: TemporalType,
    /// Resolved validity start.
    pub valid_from: DateTime<Utc>,
    /// Resolved validity end.
    pub valid_until: Option<DateTime<Utc>>,
    /// Ids of edges invalidated by conflict detection.
    pub invalidated: Vec<String>,
    /// Whether the edge entered the base graph (it does iff currently active).
    pub inserted: bool,
}

/// A time-slice view: the edges active at an instant and the nodes they
/// reference.
#[derive(Debug, Clone)]
pub struct TemporalSnapshot {
    /// Instant of the view.
    pub at: DateTime<Utc>,
    /// Active edges.
    pub edges: Vec<Edge>,
    /// Referenced nodes.
    pub nodes: Vec<Node>,
}

/// Relation verbs classified as point-in-time events.
const EVENT_VERBS: &[&str] = &[
    "attended", "met", "visited", "said", "told", "went", "traveled", "bought", "sold",
    "happened", "occurred", "celebrated", "graduated",
];

/// Relation verbs classified as time-extended states.
const STATE_VERBS: &[&str] = &[
    "feels", "feeling", "staying", "visiting", "wearing", "holding", "reading", "watching",
];

/// The temporal layer.
pub struct TemporalLayer {
    config: TemporalConfig,
    records: HashMap<String, TemporalRecord>,
    by_valid_from_day: BTreeMap<i64, Vec<String>>,
    by_valid_until_day: BTreeMap<i64, Vec<String>>,
    by_type: HashMap<TemporalType, Vec<String>>,
    exclusive_pairs: Vec<(String, String)>,
    single_valued: Vec<String>,
    sequences: EventSequenceLog,
}

impl TemporalLayer {
    /// Create a layer with the built-in mutually-exclusive relation pairs.
    pub fn new(config: TemporalConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
            by_valid_from_day: BTreeMap::new(),
            by_valid_until_day: BTreeMap::new(),
            by_type: HashMap::new(),
            exclusive_pairs: vec![
                ("married_to".to_string(), "divorced_from".to_string()),
                ("works_at".to_string(), "unemployed".to_string()),
            ],
            single_valued: vec![
                "works_at".to_string(),
                "married_to".to_string(),
                "lives_in".to_string(),
            ],
            sequences: EventSequenceLog::new(),
        }
    }

    /// Declare an additional mutually-exclusive relation pair.
    pub fn add_exclusive_pair(&mut self, a: impl Into<String>, b: impl Into<String>) {
        self.exclusive_pairs.push((a.into(), b.into()));
    }

    /// Declare a relation as single-valued per source: a new edge of this
    /// type supersedes an older one from the same source even when the
    /// targets differ (a person works at one place at a time).
    pub fn add_single_valued(&mut self, relation_type: impl Into<String>) {
        self.single_valued.push(relation_type.into());
    }

    /// Classify a relation verb into a temporal class.
    pub fn classify(relation_type: &str) -> TemporalType {
        let lowered = relation_type.to_lowercase();
        for token in lowered.split('_') {
            if EVENT_VERBS.contains(&token) {
                return TemporalType::Event;
            }
            if STATE_VERBS.contains(&token) {
                return TemporalType::State;
            }
        }
        TemporalType::Fact
    }

    /// Default validity window for a temporal class.
    pub fn default_window(&self, tt: TemporalType) -> Duration {
        match tt {
            TemporalType::Fact => Duration::days(self.config.fact_window_days),
            TemporalType::State => Duration::days(self.config.state_window_days),
            TemporalType::Event => Duration::days(self.config.event_window_days),
        }
    }

    /// Insert a relationship with temporal semantics: classify, default the
    /// validity window, invalidate conflicting active edges between the same
    /// endpoints, then insert into the base graph iff currently active.
    pub fn add_relationship(
        &mut self,
        store: &mut GraphStore,
        spec: TemporalRelationship,
    ) -> GraphResult<TemporalInsert> {
        let valid_from = spec.valid_from.unwrap_or_else(Utc::now);
        let temporal_type = spec
            .temporal_type
            .unwrap_or_else(|| Self::classify(&spec.edge.edge_type));
        let valid_until = match spec.valid_until {
            Some(until) => {
                if until < valid_from {
                    return Err(GraphError::InvalidTimestamp(format!(
                        "validUntil {until} precedes validFrom {valid_from}"
                    )));
                }
                Some(until)
            }
            None => Some(valid_from + self.default_window(temporal_type)),
        };

        let edge = spec.edge;
        if self.records.contains_key(&edge.id) {
            return Err(GraphError::InvalidArgument(format!(
                "edge {} already tracked",
                edge.id
            )));
        }
        // Endpoints are checked up front so a failure leaves both the
        // temporal table and the base graph untouched.
        if store.get_node(&edge.source).is_none() {
            return Err(GraphError::NodeNotFound(edge.source.clone()));
        }
        if store.get_node(&edge.target).is_none() {
            return Err(GraphError::NodeNotFound(edge.target.clone()));
        }

        // Conflict detection against edges still active at the new validity
        // start.
        let mut invalidated: Vec<String> = Vec::new();
        let mut clamp_until: Option<DateTime<Utc>> = None;
        let conflicting: Vec<(String, DateTime<Utc>, ConflictKind, DateTime<Utc>)> = self
            .records
            .values()
            .filter(|r| !r.is_invalidated() && r.active_at(valid_from))
            .filter_map(|r| {
                self.conflict_kind(&r.edge, &edge)
                    .map(|kind| (r.edge.id.clone(), r.edge.created_at, kind, r.valid_from))
            })
            .collect();
        for (existing_id, existing_created, kind, existing_from) in conflicting {
            let reason = match kind {
                ConflictKind::SameType => InvalidationReason::Superseded,
                ConflictKind::Exclusive => InvalidationReason::Contradicted,
            };
            if existing_created <= edge.created_at {
                self.invalidate(store, &existing_id, valid_from, reason)?;
                invalidated.push(existing_id);
            } else {
                // The incoming edge is the older one; it arrives already closed.
                clamp_until =
                    Some(clamp_until.map_or(existing_from, |c: DateTime<Utc>| c.min(existing_from)));
            }
        }

        let valid_until = match (valid_until, clamp_until) {
            (Some(u), Some(c)) => Some(u.min(c)),
            (None, Some(c)) => Some(c),
            (u, None) => u,
        };

        let record = TemporalRecord {
            edge: edge.clone(),
            valid_from,
            valid_until,
            temporal_type,
            invalidated_at: None,
            reason: None,
        };
        let inserted = record.active_at(Utc::now());

        let edge_id = edge.id.clone();
        if inserted {
            store.add_edge(edge)?;
        }
        self.index_record(&record);
        self.records.insert(edge_id.clone(), record);

        Ok(TemporalInsert {
            edge_id,
            temporal_type,
            valid_from,
            valid_until,
            invalidated,
            inserted,
        })
    }

    /// Close an edge's validity interval. Monotonic: a closed interval is
    /// never reopened, and a second invalidation is a no-op. The edge leaves
    /// the base graph but its record is retained for historical queries.
    pub fn invalidate(
        &mut self,
        store: &mut GraphStore,
        edge_id: &str,
        at: DateTime<Utc>,
        reason: InvalidationReason,
    ) -> GraphResult<()> {
        let record = self
            .records
            .get_mut(edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound(edge_id.to_string()))?;
        if record.is_invalidated() {
            return Ok(());
        }
        let old_until = record.valid_until;
        let new_until = match old_until {
            Some(existing) => existing.min(at),
            None => at,
        };
        record.valid_until = Some(new_until);
        record.invalidated_at = Some(at);
        record.reason = Some(reason);
        info!(
            "invalidated edge {edge_id} ({}) as of {new_until}: {}",
            record.edge.edge_type,
            reason.name()
        );

        if let Some(old) = old_until {
            remove_day_entry(&mut self.by_valid_until_day, day_number(old), edge_id);
        }
        insert_day_entry(&mut self.by_valid_until_day, day_number(new_until), edge_id);

        if store.get_edge(edge_id).is_some() {
            store.remove_edge(edge_id)?;
        }
        Ok(())
    }

    /// Close every record whose validity window has run out, with reason
    /// `expired`. Returns the ids swept.
    pub fn sweep_expired(&mut self, store: &mut GraphStore, now: DateTime<Utc>) -> GraphResult<Vec<String>> {
        let due: Vec<(String, DateTime<Utc>)> = self
            .records
            .values()
            .filter(|r| !r.is_invalidated())
            .filter_map(|r| r.valid_until.filter(|u| *u <= now).map(|u| (r.edge.id.clone(), u)))
            .collect();
        let mut swept = Vec::with_capacity(due.len());
        for (edge_id, until) in due {
            self.invalidate(store, &edge_id, until, InvalidationReason::Expired)?;
            swept.push(edge_id);
        }
        Ok(swept)
    }

    /// The edges active at `t` and every node they reference.
    pub fn graph_state_at(&self, store: &GraphStore, t: DateTime<Utc>) -> TemporalSnapshot {
        let mut edges: Vec<Edge> = self
            .records
            .values()
            .filter(|r| r.active_at(t))
            .map(|r| r.edge.clone())
            .collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        let mut node_ids: Vec<&str> = edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .collect();
        node_ids.sort_unstable();
        node_ids.dedup();
        let nodes = node_ids
            .into_iter()
            .filter_map(|id| store.get_node(id))
            .cloned()
            .collect();

        TemporalSnapshot { at: t, edges, nodes }
    }

    /// The temporal record for an edge, if tracked.
    pub fn get_record(&self, edge_id: &str) -> Option<&TemporalRecord> {
        self.records.get(edge_id)
    }

    /// All records. Copies.
    pub fn all_records(&self) -> Vec<TemporalRecord> {
        self.records.values().cloned().collect()
    }

    /// Ids of edges whose validity starts within [from, to], by day index.
    pub fn starting_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<String> {
        collect_day_range(&self.by_valid_from_day, from, to)
    }

    /// Ids of edges whose validity ends within [from, to], by day index.
    pub fn ending_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<String> {
        collect_day_range(&self.by_valid_until_day, from, to)
    }

    /// Ids of edges with the given temporal class, sorted.
    pub fn by_temporal_type(&self, tt: TemporalType) -> &[String] {
        self.by_type.get(&tt).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Drop invalidated records older than the configured retention age.
    /// Returns how many were dropped.
    pub fn cleanup(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(self.config.max_invalidated_age_days);
        let stale: Vec<String> = self
            .records
            .values()
            .filter(|r| r.invalidated_at.map(|t| t < cutoff).unwrap_or(false))
            .map(|r| r.edge.id.clone())
            .collect();
        for edge_id in &stale {
            if let Some(record) = self.records.remove(edge_id) {
                self.unindex_record(&record);
            }
        }
        stale.len()
    }

    /// The event-sequence log.
    pub fn sequences(&self) -> &EventSequenceLog {
        &self.sequences
    }

    /// Mutable event-sequence log.
    pub fn sequences_mut(&mut self) -> &mut EventSequenceLog {
        &mut self.sequences
    }

    /// Number of tracked records (active and historical).
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Drop all temporal state.
    pub fn clear(&mut self) {
        self.records.clear();
        self.by_valid_from_day.clear();
        self.by_valid_until_day.clear();
        self.by_type.clear();
        self.sequences.clear();
    }

    /// Whether an existing edge conflicts with an incoming one. Edges from
    /// the same source conflict when they share the target and the relation
    /// type (or a mutually-exclusive pair), or when the relation type is
    /// single-valued regardless of target.
    fn conflict_kind(&self, existing: &Edge, incoming: &Edge) -> Option<ConflictKind> {
        if existing.source != incoming.source {
            return None;
        }
        if existing.edge_type == incoming.edge_type {
            if existing.target == incoming.target
                || self.single_valued.iter().any(|r| *r == incoming.edge_type)
            {
                return Some(ConflictKind::SameType);
            }
            return None;
        }
        if existing.target != incoming.target {
            return None;
        }
        let exclusive = self.exclusive_pairs.iter().any(|(x, y)| {
            (x == &existing.edge_type && y == &incoming.edge_type)
                || (x == &incoming.edge_type && y == &existing.edge_type)
        });
        exclusive.then_some(ConflictKind::Exclusive)
    }

    fn index_record(&mut self, record: &TemporalRecord) {
        insert_day_entry(
            &mut self.by_valid_from_day,
            day_number(record.valid_from),
            &record.edge.id,
        );
        if let Some(until) = record.valid_until {
            insert_day_entry(&mut self.by_valid_until_day, day_number(until), &record.edge.id);
        }
        let list = self.by_type.entry(record.temporal_type).or_default();
        if let Err(pos) = list.binary_search_by(|probe| probe.as_str().cmp(&record.edge.id)) {
            list.insert(pos, record.edge.id.clone());
        }
    }

    fn unindex_record(&mut self, record: &TemporalRecord) {
        remove_day_entry(
            &mut self.by_valid_from_day,
            day_number(record.valid_from),
            &record.edge.id,
        );
        if let Some(until) = record.valid_until {
            remove_day_entry(&mut self.by_valid_until_day, day_number(until), &record.edge.id);
        }
        if let Some(list) = self.by_type.get_mut(&record.temporal_type) {
            if let Ok(pos) = list.binary_search_by(|probe| probe.as_str().cmp(&record.edge.id)) {
                list.remove(pos);
            }
        }
    }
}

#[derive(Clone, Copy)]
enum ConflictKind {
    SameType,
    Exclusive,
}

impl Default for TemporalLayer {
    fn default() -> Self {
        Self::new(TemporalConfig::default())
    }
}

/// Days since the Unix epoch. Day granularity is sufficient for the
/// retention queries these indices serve; finer filtering happens post-index.
fn day_number(t: DateTime<Utc>) -> i64 {
    t.timestamp().div_euclid(86_400)
}

fn insert_day_entry(index: &mut BTreeMap<i64, Vec<String>>, day: i64, edge_id: &str) {
    let list = index.entry(day).or_default();
    if let Err(pos) = list.binary_search_by(|probe| probe.as_str().cmp(edge_id)) {
        list.insert(pos, edge_id.to_string());
    }
}

fn remove_day_entry(index: &mut BTreeMap<i64, Vec<String>>, day: i64, edge_id: &str) {
    if let Some(list) = index.get_mut(&day) {
        if let Ok(pos) = list.binary_search_by(|probe| probe.as_str().cmp(edge_id)) {
            list.remove(pos);
        }
        if list.is_empty() {
            index.remove(&day);
        }
    }
}

fn collect_day_range(
    index: &BTreeMap<i64, Vec<String>>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<String> {
    let mut ids: Vec<String> = index
        .range(day_number(from)..=day_number(to))
        .flat_map(|(_, list)| list.iter().cloned())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
