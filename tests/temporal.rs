//! Temporal layer tests: validity windows, conflict-driven invalidation,
//! time-slice queries, event sequences.

use chrono::{Duration, Utc};

use graph_memory::{
    Edge, GraphConfig, GraphError, GraphStore, InvalidationReason, NodeBuilder, TemporalConfig,
    TemporalLayer, TemporalRelationship, TemporalType,
};

fn test_store() -> GraphStore {
    let mut store = GraphStore::new(GraphConfig {
        dimension: 4,
        ..GraphConfig::default()
    });
    for (id, node_type) in [
        ("alice", "person"),
        ("google", "organization"),
        ("meta", "organization"),
        ("bob", "person"),
    ] {
        store
            .add_node(NodeBuilder::new(node_type).id(id).name(id).build())
            .unwrap();
    }
    store
}

// ==================== Classification & Windows ====================

#[test]
fn test_classify_relation_verbs() {
    assert_eq!(TemporalLayer::classify("works_at"), TemporalType::Fact);
    assert_eq!(TemporalLayer::classify("attended"), TemporalType::Event);
    assert_eq!(TemporalLayer::classify("met_with"), TemporalType::Event);
    assert_eq!(TemporalLayer::classify("feels_happy"), TemporalType::State);
    assert_eq!(TemporalLayer::classify("knows"), TemporalType::Fact);
}

#[test]
fn test_default_windows_by_class() {
    let mut store = test_store();
    let mut temporal = TemporalLayer::new(TemporalConfig::default());
    let from = Utc::now();

    let insert = temporal
        .add_relationship(
            &mut store,
            TemporalRelationship::new(Edge::new("alice", "google", "works_at", 1.0))
                .valid_from(from),
        )
        .unwrap();
    assert_eq!(insert.temporal_type, TemporalType::Fact);
    assert_eq!(insert.valid_until, Some(from + Duration::days(365)));

    let insert = temporal
        .add_relationship(
            &mut store,
            TemporalRelationship::new(Edge::new("alice", "bob", "met_with", 1.0))
                .valid_from(from),
        )
        .unwrap();
    assert_eq!(insert.temporal_type, TemporalType::Event);
    assert_eq!(insert.valid_until, Some(from + Duration::days(30)));
}

#[test]
fn test_invalid_interval_rejected() {
    let mut store = test_store();
    let mut temporal = TemporalLayer::default();
    let from = Utc::now();

    let result = temporal.add_relationship(
        &mut store,
        TemporalRelationship::new(Edge::new("alice", "google", "works_at", 1.0))
            .valid_from(from)
            .valid_until(from - Duration::hours(1)),
    );
    assert!(matches!(result, Err(GraphError::InvalidTimestamp(_))));
    assert_eq!(store.edge_count(), 0);
}

// ==================== Conflict Detection & Supersession ====================

#[test]
fn test_supersession_same_relation_new_target() {
    let mut store = test_store();
    let mut temporal = TemporalLayer::default();
    let t1 = Utc::now() - Duration::hours(2);
    let t2 = Utc::now() - Duration::hours(1);

    let google_edge = Edge::new("alice", "google", "works_at", 1.0);
    let google_id = google_edge.id.clone();
    temporal
        .add_relationship(
            &mut store,
            TemporalRelationship::new(google_edge).valid_from(t1),
        )
        .unwrap();
    assert_eq!(store.edge_count(), 1);

    let meta_edge = Edge::new("alice", "meta", "works_at", 1.0);
    let meta_id = meta_edge.id.clone();
    let insert = temporal
        .add_relationship(
            &mut store,
            TemporalRelationship::new(meta_edge).valid_from(t2),
        )
        .unwrap();

    // The older edge is closed as of the new edge's validity start.
    assert_eq!(insert.invalidated, vec![google_id.clone()]);
    let record = temporal.get_record(&google_id).unwrap();
    assert_eq!(record.valid_until, Some(t2));
    assert_eq!(record.reason, Some(InvalidationReason::Superseded));

    // Base graph holds only the new edge; history holds both.
    assert_eq!(store.edge_count(), 1);
    assert!(store.get_edge(&meta_id).is_some());
    assert!(store.get_edge(&google_id).is_none());
    assert_eq!(temporal.record_count(), 2);

    // Time-slice views: between t1 and t2 the Google edge is active,
    // after t2 only the Meta edge.
    let mid = t1 + Duration::minutes(30);
    let snapshot = temporal.graph_state_at(&store, mid);
    let ids: Vec<&str> = snapshot.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec![google_id.as_str()]);

    let later = t2 + Duration::minutes(30);
    let snapshot = temporal.graph_state_at(&store, later);
    let ids: Vec<&str> = snapshot.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec![meta_id.as_str()]);
    let node_ids: Vec<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
    assert!(node_ids.contains(&"alice"));
    assert!(node_ids.contains(&"meta"));
}

#[test]
fn test_exclusive_pair_contradiction() {
    let mut store = test_store();
    let mut temporal = TemporalLayer::default();
    let t1 = Utc::now() - Duration::hours(2);
    let t2 = Utc::now() - Duration::hours(1);

    let married = Edge::new("alice", "bob", "married_to", 1.0);
    let married_id = married.id.clone();
    temporal
        .add_relationship(&mut store, TemporalRelationship::new(married).valid_from(t1))
        .unwrap();

    let divorced = Edge::new("alice", "bob", "divorced_from", 1.0);
    let insert = temporal
        .add_relationship(&mut store, TemporalRelationship::new(divorced).valid_from(t2))
        .unwrap();

    assert_eq!(insert.invalidated, vec![married_id.clone()]);
    let record = temporal.get_record(&married_id).unwrap();
    assert_eq!(record.reason, Some(InvalidationReason::Contradicted));
}

#[test]
fn test_unrelated_edges_do_not_conflict() {
    let mut store = test_store();
    let mut temporal = TemporalLayer::default();
    let from = Utc::now() - Duration::hours(1);

    temporal
        .add_relationship(
            &mut store,
            TemporalRelationship::new(Edge::new("alice", "bob", "knows", 1.0)).valid_from(from),
        )
        .unwrap();
    // Same type, different target, not single-valued: no conflict.
    let insert = temporal
        .add_relationship(
            &mut store,
            TemporalRelationship::new(Edge::new("alice", "google", "knows", 1.0))
                .valid_from(from),
        )
        .unwrap();
    assert!(insert.invalidated.is_empty());
    assert_eq!(store.edge_count(), 2);
}

// ==================== Invalidation ====================

#[test]
fn test_invalidation_is_monotonic() {
    let mut store = test_store();
    let mut temporal = TemporalLayer::default();
    let from = Utc::now() - Duration::hours(2);

    let edge = Edge::new("alice", "google", "works_at", 1.0);
    let edge_id = edge.id.clone();
    temporal
        .add_relationship(&mut store, TemporalRelationship::new(edge).valid_from(from))
        .unwrap();

    let first = Utc::now() - Duration::hours(1);
    temporal
        .invalidate(&mut store, &edge_id, first, InvalidationReason::Manual)
        .unwrap();
    let record = temporal.get_record(&edge_id).unwrap();
    assert_eq!(record.valid_until, Some(first));

    // A second invalidation neither reopens nor rewrites the interval.
    temporal
        .invalidate(
            &mut store,
            &edge_id,
            Utc::now(),
            InvalidationReason::ContextChanged,
        )
        .unwrap();
    let record = temporal.get_record(&edge_id).unwrap();
    assert_eq!(record.valid_until, Some(first));
    assert_eq!(record.reason, Some(InvalidationReason::Manual));
}

#[test]
fn test_invalidated_edge_leaves_base_graph_but_not_history() {
    let mut store = test_store();
    let mut temporal = TemporalLayer::default();
    let from = Utc::now() - Duration::hours(1);

    let edge = Edge::new("alice", "google", "works_at", 1.0);
    let edge_id = edge.id.clone();
    temporal
        .add_relationship(&mut store, TemporalRelationship::new(edge).valid_from(from))
        .unwrap();

    temporal
        .invalidate(&mut store, &edge_id, Utc::now(), InvalidationReason::Manual)
        .unwrap();

    assert!(store.get_edge(&edge_id).is_none());
    assert!(store.all_edges().is_empty());
    assert!(temporal.get_record(&edge_id).is_some());
}

#[test]
fn test_invalidate_unknown_edge() {
    let mut store = test_store();
    let mut temporal = TemporalLayer::default();
    let result = temporal.invalidate(
        &mut store,
        "ghost",
        Utc::now(),
        InvalidationReason::Manual,
    );
    assert!(matches!(result, Err(GraphError::EdgeNotFound(_))));
}

#[test]
fn test_sweep_expired() {
    let mut store = test_store();
    let mut temporal = TemporalLayer::default();
    let from = Utc::now() - Duration::days(10);
    let until = Utc::now() - Duration::days(1);

    let edge = Edge::new("alice", "bob", "attended", 1.0);
    let edge_id = edge.id.clone();
    let insert = temporal
        .add_relationship(
            &mut store,
            TemporalRelationship::new(edge)
                .valid_from(from)
                .valid_until(until),
        )
        .unwrap();
    // Already outside its window, so it never entered the base graph.
    assert!(!insert.inserted);

    let swept = temporal.sweep_expired(&mut store, Utc::now()).unwrap();
    assert_eq!(swept, vec![edge_id.clone()]);
    let record = temporal.get_record(&edge_id).unwrap();
    assert_eq!(record.reason, Some(InvalidationReason::Expired));
}

#[test]
fn test_cleanup_drops_old_invalidated_records() {
    let mut store = test_store();
    let mut temporal = TemporalLayer::new(TemporalConfig {
        max_invalidated_age_days: 30,
        ..TemporalConfig::default()
    });
    let from = Utc::now() - Duration::days(100);

    let edge = Edge::new("alice", "google", "works_at", 1.0);
    let edge_id = edge.id.clone();
    temporal
        .add_relationship(&mut store, TemporalRelationship::new(edge).valid_from(from))
        .unwrap();
    temporal
        .invalidate(
            &mut store,
            &edge_id,
            Utc::now() - Duration::days(60),
            InvalidationReason::Manual,
        )
        .unwrap();

    let dropped = temporal.cleanup(Utc::now());
    assert_eq!(dropped, 1);
    assert!(temporal.get_record(&edge_id).is_none());
    assert_eq!(temporal.record_count(), 0);
}

// ==================== Day Indices ====================

#[test]
fn test_day_granularity_indices() {
    let mut store = test_store();
    let mut temporal = TemporalLayer::default();
    let from = Utc::now() - Duration::days(5);

    let edge = Edge::new("alice", "google", "works_at", 1.0);
    let edge_id = edge.id.clone();
    temporal
        .add_relationship(&mut store, TemporalRelationship::new(edge).valid_from(from))
        .unwrap();

    let starting = temporal.starting_between(from - Duration::days(1), from + Duration::days(1));
    assert_eq!(starting, vec![edge_id.clone()]);
    assert!(temporal
        .starting_between(from + Duration::days(2), from + Duration::days(3))
        .is_empty());

    let until = from + Duration::days(365);
    let ending = temporal.ending_between(until - Duration::days(1), until + Duration::days(1));
    assert_eq!(ending, vec![edge_id.clone()]);

    assert_eq!(temporal.by_temporal_type(TemporalType::Fact), &[edge_id]);
    assert!(temporal.by_temporal_type(TemporalType::Event).is_empty());
}

// ==================== Event Sequences ====================

#[test]
fn test_event_sequences_and_patterns() {
    let mut temporal = TemporalLayer::default();
    let log = temporal.sequences_mut();

    let s1 = log.start_sequence("morning");
    let wake = log.add_event(&s1, "wake", vec![]).unwrap();
    log.add_event(&s1, "coffee", vec![wake]).unwrap();
    log.complete_sequence(&s1).unwrap();

    let s2 = log.start_sequence("morning");
    log.add_event(&s2, "wake", vec![]).unwrap();
    log.add_event(&s2, "coffee", vec![]).unwrap();

    let patterns = log.recurring_patterns(2);
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].labels, vec!["wake".to_string(), "coffee".to_string()]);
    assert_eq!(patterns[0].occurrences, 2);

    // Completed sequences refuse further events.
    let result = log.add_event(&s1, "late", vec![]);
    assert!(matches!(result, Err(GraphError::InvalidArgument(_))));

    assert_eq!(log.len(), 2);
    assert_eq!(log.all()[0].name, "morning");
}
