//! Persistence boundary tests: JSONL chunk store, rotation, filtered
//! loads, backups, and engine snapshot/restore round trips.

use chrono::{Duration, Utc};
use tempfile::TempDir;

use graph_memory::{
    Edge, EngineConfig, EntityRecord, GraphConfig, GraphError, JsonlStore, LoadOptions,
    MemoryEngine, NodeBuilder, NodeRecord, RelationshipRecord, StorageConfig,
    TemporalRelationship,
};

fn storage_config(dir: &TempDir) -> StorageConfig {
    StorageConfig {
        dir: dir.path().to_path_buf(),
        ..StorageConfig::default()
    }
}

fn node_record(id: &str, node_type: &str) -> NodeRecord {
    NodeRecord::from(&NodeBuilder::new(node_type).id(id).name(id).build())
}

// ==================== Chunk Store ====================

#[test]
fn test_store_and_load_nodes() {
    let dir = TempDir::new().unwrap();
    let store = JsonlStore::new(storage_config(&dir)).unwrap();

    let records = vec![
        node_record("a", "person"),
        node_record("b", "person"),
        node_record("c", "organization"),
    ];
    let report = store.store_nodes(&records).unwrap();
    assert_eq!(report.written, 3);
    assert_eq!(report.failed, 0);

    let loaded = store.load_nodes(&LoadOptions::default()).unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0].id, "a");

    let people = store
        .load_nodes(&LoadOptions {
            types: Some(vec!["person".to_string()]),
            ..LoadOptions::default()
        })
        .unwrap();
    assert_eq!(people.len(), 2);
}

#[test]
fn test_load_offset_limit_resumption() {
    let dir = TempDir::new().unwrap();
    let store = JsonlStore::new(storage_config(&dir)).unwrap();
    let records: Vec<NodeRecord> = (0..10)
        .map(|i| node_record(&format!("n{i}"), "person"))
        .collect();
    store.store_nodes(&records).unwrap();

    let mut all = Vec::new();
    let mut offset = 0;
    loop {
        let batch = store
            .load_nodes(&LoadOptions {
                limit: 4,
                offset,
                ..LoadOptions::default()
            })
            .unwrap();
        if batch.is_empty() {
            break;
        }
        offset += batch.len();
        all.extend(batch);
    }
    assert_eq!(all.len(), 10);
    let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids[0], "n0");
    assert_eq!(ids[9], "n9");
}

#[test]
fn test_load_since_filter() {
    let dir = TempDir::new().unwrap();
    let store = JsonlStore::new(storage_config(&dir)).unwrap();

    let mut old = node_record("old", "person");
    old.updated_at = Utc::now() - Duration::days(10);
    let fresh = node_record("fresh", "person");
    store.store_nodes(&[old, fresh]).unwrap();

    let recent = store
        .load_nodes(&LoadOptions {
            since: Some(Utc::now() - Duration::days(1)),
            ..LoadOptions::default()
        })
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, "fresh");
}

#[test]
fn test_chunk_rotation_by_item_count() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig {
        dir: dir.path().to_path_buf(),
        max_items_per_file: 2,
        ..StorageConfig::default()
    };
    let store = JsonlStore::new(config).unwrap();

    let records: Vec<NodeRecord> = (0..5)
        .map(|i| node_record(&format!("n{i}"), "person"))
        .collect();
    store.store_nodes(&records).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.node_records, 5);
    assert_eq!(stats.file_count, 3);

    // Loading streams across chunk boundaries in order.
    let loaded = store.load_nodes(&LoadOptions::default()).unwrap();
    assert_eq!(loaded.len(), 5);
    assert_eq!(loaded[4].id, "n4");
}

#[test]
fn test_delete_nodes_compacts_chunks() {
    let dir = TempDir::new().unwrap();
    let store = JsonlStore::new(storage_config(&dir)).unwrap();
    let records: Vec<NodeRecord> = (0..4)
        .map(|i| node_record(&format!("n{i}"), "person"))
        .collect();
    store.store_nodes(&records).unwrap();

    let dropped = store
        .delete_nodes(&["n1".to_string(), "n3".to_string()])
        .unwrap();
    assert_eq!(dropped, 2);

    let remaining: Vec<String> = store
        .load_nodes(&LoadOptions::default())
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(remaining, vec!["n0".to_string(), "n2".to_string()]);
}

#[test]
fn test_malformed_line_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let store = JsonlStore::new(storage_config(&dir)).unwrap();
    store.store_nodes(&[node_record("a", "person")]).unwrap();
    std::fs::write(
        dir.path().join("nodes-0001.jsonl"),
        "this is not json\n",
    )
    .unwrap();

    let result = store.load_nodes(&LoadOptions::default());
    assert!(matches!(result, Err(GraphError::Parse(_))));
}

// ==================== Backups ====================

#[test]
fn test_backup_and_restore() {
    let dir = TempDir::new().unwrap();
    let store = JsonlStore::new(storage_config(&dir)).unwrap();
    store
        .store_nodes(&[node_record("a", "person"), node_record("b", "person")])
        .unwrap();

    let name = store.create_backup(Some("before-change")).unwrap();
    assert_eq!(name, "before-change");

    store.store_nodes(&[node_record("c", "person")]).unwrap();
    assert_eq!(store.load_nodes(&LoadOptions::default()).unwrap().len(), 3);

    store.restore_from_backup("before-change").unwrap();
    let ids: Vec<String> = store
        .load_nodes(&LoadOptions::default())
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_restore_unknown_backup() {
    let dir = TempDir::new().unwrap();
    let store = JsonlStore::new(storage_config(&dir)).unwrap();
    assert!(matches!(
        store.restore_from_backup("ghost"),
        Err(GraphError::BackupNotFound(_))
    ));
}

// ==================== Engine Snapshot / Restore ====================

fn engine_with_storage(dir: &TempDir) -> MemoryEngine {
    let config = EngineConfig {
        graph: GraphConfig {
            dimension: 2,
            ..GraphConfig::default()
        },
        storage: Some(storage_config(dir)),
        ..EngineConfig::default()
    };
    MemoryEngine::new(config).unwrap()
}

#[test]
fn test_snapshot_restore_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with_storage(&dir);

    engine
        .add_entities(&[
            EntityRecord::new("alice", "person", "Alice").embedding(vec![1.0, 0.0]),
            EntityRecord::new("google", "organization", "Google"),
        ])
        .unwrap();
    engine
        .add_relationships(&[RelationshipRecord::new(
            "r1", "alice", "google", "works_at", 1.0,
        )])
        .unwrap();
    engine.snapshot().unwrap();

    let mut restored = engine_with_storage(&dir);
    let report = restored.restore().unwrap();
    assert_eq!(report.nodes_loaded, 2);
    assert_eq!(report.edges_loaded, 1);

    let mut original_ids: Vec<String> =
        engine.get_all_nodes().into_iter().map(|n| n.id).collect();
    original_ids.sort();
    let mut restored_ids: Vec<String> =
        restored.get_all_nodes().into_iter().map(|n| n.id).collect();
    restored_ids.sort();
    assert_eq!(original_ids, restored_ids);

    let edges = restored.get_all_edges();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].edge_type, "works_at");
    // Temporal metadata survives the round trip.
    assert!(restored.temporal().get_record(&edges[0].id).is_some());
    assert!(restored.store().validate_consistency().is_empty());

    // The embedding came back into the vector index.
    assert!(restored.store().indexes().vector().get("alice").is_some());
}

#[test]
fn test_restored_invalidated_edge_stays_historical() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with_storage(&dir);

    engine
        .add_entities(&[
            EntityRecord::new("alice", "person", "Alice"),
            EntityRecord::new("google", "organization", "Google"),
            EntityRecord::new("meta", "organization", "Meta"),
        ])
        .unwrap();

    let t1 = Utc::now() - Duration::hours(2);
    let t2 = Utc::now() - Duration::hours(1);
    let old = Edge::new("alice", "google", "works_at", 1.0);
    let old_id = old.id.clone();
    engine
        .add_temporal_relationship(TemporalRelationship::new(old).valid_from(t1))
        .unwrap();
    engine
        .add_temporal_relationship(
            TemporalRelationship::new(Edge::new("alice", "meta", "works_at", 1.0))
                .valid_from(t2),
        )
        .unwrap();
    engine.snapshot().unwrap();

    let mut restored = engine_with_storage(&dir);
    restored.restore().unwrap();

    // The superseded edge is historical: tracked, but not in the base graph.
    assert!(restored.temporal().get_record(&old_id).is_some());
    assert!(restored
        .get_all_edges()
        .iter()
        .all(|e| e.id != old_id));
    assert_eq!(restored.get_all_edges().len(), 1);

    let mid = t1 + Duration::minutes(30);
    let snapshot = restored.graph_state_at(mid);
    assert_eq!(snapshot.edges.len(), 1);
    assert_eq!(snapshot.edges[0].id, old_id);
}

#[test]
fn test_manual_sync_writes_dirty_records() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with_storage(&dir);
    engine
        .add_entities(&[EntityRecord::new("alice", "person", "Alice")])
        .unwrap();

    let report = engine.sync().unwrap();
    assert_eq!(report.nodes.written, 1);

    // Nothing dirty: the next sync writes nothing.
    let report = engine.sync().unwrap();
    assert_eq!(report.nodes.written, 0);
}

#[test]
fn test_engine_backup_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_with_storage(&dir);
    engine
        .add_entities(&[EntityRecord::new("alice", "person", "Alice")])
        .unwrap();
    engine.snapshot().unwrap();
    engine.create_backup(Some("v1")).unwrap();

    engine
        .add_entities(&[EntityRecord::new("bob", "person", "Bob")])
        .unwrap();
    engine.snapshot().unwrap();
    assert_eq!(engine.get_all_nodes().len(), 2);

    let report = engine.restore_from_backup("v1").unwrap();
    assert_eq!(report.nodes_loaded, 1);
    assert_eq!(engine.get_all_nodes().len(), 1);
    assert_eq!(engine.get_all_nodes()[0].id, "alice");
}
