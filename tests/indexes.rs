//! Index tests: vector kernel, label, property, text, vector, pattern.

use graph_memory::{
    centroid, cosine_similarity, euclidean_distance, is_valid_vector, normalize,
    try_cosine_similarity, Direction, DistanceMetric, GraphConfig, GraphError, GraphPattern,
    GraphStore, LabelIndex, NodeBuilder, PatternEdge, PatternIndex, PatternNode, PropertyIndex,
    PropertyOp, PropertyValue, TextIndex, VectorIndex,
};

// ==================== Vector Kernel ====================

#[test]
fn test_cosine_zero_vectors_return_zero() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
}

#[test]
fn test_cosine_identical_and_orthogonal() {
    assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
}

#[test]
fn test_checked_cosine_rejects_dimension_mismatch() {
    let result = try_cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]);
    assert!(matches!(
        result,
        Err(GraphError::DimensionMismatch {
            expected: 2,
            got: 3
        })
    ));
}

#[test]
fn test_euclidean_distance() {
    assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
}

#[test]
fn test_normalize_zero_vector_stays_zero() {
    assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    let n = normalize(&[3.0, 4.0]);
    assert!((n[0] - 0.6).abs() < 1e-6);
    assert!((n[1] - 0.8).abs() < 1e-6);
}

#[test]
fn test_centroid() {
    assert!(centroid(&[]).unwrap().is_empty());
    let c = centroid(&[&[0.0, 2.0], &[2.0, 0.0]]).unwrap();
    assert_eq!(c, vec![1.0, 1.0]);
    assert!(centroid(&[&[1.0, 0.0], &[1.0]]).is_err());
}

#[test]
fn test_vector_validity() {
    assert!(is_valid_vector(&[1.0, -2.0, 0.0]));
    assert!(!is_valid_vector(&[1.0, f32::NAN]));
    assert!(!is_valid_vector(&[f32::INFINITY]));
}

// ==================== Label Index ====================

#[test]
fn test_label_index_basics() {
    let mut index = LabelIndex::new();
    index.add("n1", "person");
    index.add("n2", "person");
    index.add("n3", "organization");

    assert_eq!(index.get("person"), &["n1".to_string(), "n2".to_string()]);
    assert_eq!(index.count("organization"), 1);
    assert!(index.get("place").is_empty());

    let any = index.get_any(&["person".to_string(), "organization".to_string()]);
    assert_eq!(any.len(), 3);

    index.remove("n1", "person");
    assert_eq!(index.get("person"), &["n2".to_string()]);
}

// ==================== Property Index ====================

fn sample_property_index() -> PropertyIndex {
    let mut index = PropertyIndex::new();
    index.add("n1", "age", &PropertyValue::Int(30));
    index.add("n2", "age", &PropertyValue::Int(35));
    index.add("n3", "age", &PropertyValue::Float(41.5));
    index.add("n1", "city", &PropertyValue::Str("Berlin".to_string()));
    index.add("n2", "city", &PropertyValue::Str("Boston".to_string()));
    index.add("n3", "city", &PropertyValue::Str("Madrid".to_string()));
    index
}

#[test]
fn test_property_eq_and_ne() {
    let index = sample_property_index();
    let ids = index
        .query("city", PropertyOp::Eq, &PropertyValue::Str("Berlin".to_string()))
        .unwrap();
    assert_eq!(ids, vec!["n1".to_string()]);

    let ids = index
        .query("age", PropertyOp::Eq, &PropertyValue::Int(35))
        .unwrap();
    assert_eq!(ids, vec!["n2".to_string()]);

    let ids = index
        .query("city", PropertyOp::Ne, &PropertyValue::Str("Berlin".to_string()))
        .unwrap();
    assert_eq!(ids, vec!["n2".to_string(), "n3".to_string()]);
}

#[test]
fn test_property_range_operators() {
    let index = sample_property_index();
    let ids = index
        .query("age", PropertyOp::Lt, &PropertyValue::Int(35))
        .unwrap();
    assert_eq!(ids, vec!["n1".to_string()]);

    let ids = index
        .query("age", PropertyOp::Lte, &PropertyValue::Int(35))
        .unwrap();
    assert_eq!(ids, vec!["n1".to_string(), "n2".to_string()]);

    let ids = index
        .query("age", PropertyOp::Gt, &PropertyValue::Float(34.0))
        .unwrap();
    assert_eq!(ids, vec!["n2".to_string(), "n3".to_string()]);

    let ids = index
        .query("age", PropertyOp::Gte, &PropertyValue::Int(42))
        .unwrap();
    assert!(ids.is_empty());
}

#[test]
fn test_property_contains_and_matches() {
    let index = sample_property_index();
    let ids = index
        .query("city", PropertyOp::Contains, &PropertyValue::Str("B".to_string()))
        .unwrap();
    assert_eq!(ids, vec!["n1".to_string(), "n2".to_string()]);

    let ids = index
        .query("city", PropertyOp::Matches, &PropertyValue::Str("^Ma.*d$".to_string()))
        .unwrap();
    assert_eq!(ids, vec!["n3".to_string()]);
}

#[test]
fn test_property_operator_type_errors() {
    let index = sample_property_index();
    let result = index.query("age", PropertyOp::Lt, &PropertyValue::Str("x".to_string()));
    assert!(matches!(
        result,
        Err(GraphError::UnsupportedOperator { .. })
    ));

    let result = index.query("city", PropertyOp::Contains, &PropertyValue::Int(1));
    assert!(matches!(
        result,
        Err(GraphError::UnsupportedOperator { .. })
    ));

    let result = index.query("city", PropertyOp::Matches, &PropertyValue::Str("[".to_string()));
    assert!(matches!(result, Err(GraphError::InvalidPattern(_))));
}

#[test]
fn test_property_remove() {
    let mut index = sample_property_index();
    index.remove("n1", "age", &PropertyValue::Int(30));
    let ids = index
        .query("age", PropertyOp::Lt, &PropertyValue::Int(40))
        .unwrap();
    assert_eq!(ids, vec!["n2".to_string()]);
}

// ==================== Text Index ====================

#[test]
fn test_text_exact_term_is_lowercased() {
    let mut index = TextIndex::new();
    index.add("n1", "Alice works on Rust");
    index.add("n2", "Bob likes rust fishing");

    assert_eq!(index.query("RUST"), &["n1".to_string(), "n2".to_string()]);
    assert_eq!(index.query("alice"), &["n1".to_string()]);
    assert!(index.query("golang").is_empty());
}

#[test]
fn test_text_query_all_terms() {
    let mut index = TextIndex::new();
    index.add("n1", "alice works on rust");
    index.add("n2", "alice paints");

    assert_eq!(index.query_all("alice rust"), vec!["n1".to_string()]);
}

#[test]
fn test_text_fuzzy_jaccard_threshold() {
    let mut index = TextIndex::new();
    index.add("n1", "alice likes rust");
    index.add("n2", "unrelated content entirely");

    // query {alice, rust} vs doc {alice, likes, rust}: 2 / 3.
    let matches = index.query_fuzzy("alice rust", 0.5);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].0, "n1");
    assert!((matches[0].1 - 2.0 / 3.0).abs() < 1e-6);

    let matches = index.query_fuzzy("alice rust", 0.7);
    assert!(matches.is_empty());
}

#[test]
fn test_text_remove() {
    let mut index = TextIndex::new();
    index.add("n1", "alice");
    index.remove("n1");
    assert!(index.query("alice").is_empty());
    assert!(index.is_empty());
}

// ==================== Vector Index ====================

fn unit_at_degrees(deg: f32) -> Vec<f32> {
    let rad = deg.to_radians();
    vec![rad.cos(), rad.sin()]
}

#[test]
fn test_vector_top_k_by_angle() {
    let mut index = VectorIndex::new(2);
    for (i, deg) in [0.0f32, 10.0, 30.0, 60.0, 90.0].iter().enumerate() {
        index.add(&format!("n{}", i + 1), unit_at_degrees(*deg)).unwrap();
    }

    let matches = index.query(&unit_at_degrees(0.0), 3, 0.0).unwrap();
    let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["n1", "n2", "n3"]);
    assert!(matches[0].score > matches[1].score);
    assert!(matches[1].score > matches[2].score);
}

#[test]
fn test_vector_threshold() {
    let mut index = VectorIndex::new(2);
    index.add("near", unit_at_degrees(10.0)).unwrap();
    index.add("far", unit_at_degrees(80.0)).unwrap();

    let matches = index.query(&unit_at_degrees(0.0), 10, 0.9).unwrap();
    let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["near"]);
}

#[test]
fn test_vector_tie_break_by_id() {
    let mut index = VectorIndex::new(2);
    index.add("b", vec![1.0, 0.0]).unwrap();
    index.add("a", vec![1.0, 0.0]).unwrap();

    let matches = index.query(&[1.0, 0.0], 2, 0.0).unwrap();
    let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_vector_euclidean_metric_scores_as_similarity() {
    let mut index = VectorIndex::with_metric(2, DistanceMetric::Euclidean);
    index.add("same", vec![1.0, 0.0]).unwrap();
    index.add("off", vec![0.0, 1.0]).unwrap();

    let matches = index.query(&[1.0, 0.0], 10, 0.0).unwrap();
    assert_eq!(matches[0].id, "same");
    assert!((matches[0].score - 1.0).abs() < 1e-6);
    // d = sqrt(2) maps to 1 / (1 + sqrt(2)).
    assert!((matches[1].score - 1.0 / (1.0 + 2f32.sqrt())).abs() < 1e-6);
}

#[test]
fn test_vector_dimension_errors() {
    let mut index = VectorIndex::new(3);
    assert!(matches!(
        index.add("n1", vec![1.0, 0.0]),
        Err(GraphError::DimensionMismatch { .. })
    ));
    index.add("n1", vec![1.0, 0.0, 0.0]).unwrap();
    assert!(matches!(
        index.query(&[1.0, 0.0], 5, 0.0),
        Err(GraphError::DimensionMismatch { .. })
    ));
    assert!(matches!(
        index.add("n2", vec![1.0, f32::NAN, 0.0]),
        Err(GraphError::InvalidArgument(_))
    ));
}

// ==================== Pattern Index ====================

fn employment_pattern() -> GraphPattern {
    GraphPattern::new(
        vec![
            PatternNode {
                var: "p".to_string(),
                node_type: "person".to_string(),
            },
            PatternNode {
                var: "o".to_string(),
                node_type: "organization".to_string(),
            },
        ],
        vec![PatternEdge {
            from_var: "p".to_string(),
            to_var: "o".to_string(),
            edge_type: "works_at".to_string(),
            direction: Direction::Out,
        }],
    )
}

#[test]
fn test_pattern_keyed_retrieval() {
    let mut index = PatternIndex::new();
    let pattern = employment_pattern();
    let id = pattern.id.clone();
    index.add(pattern);

    assert_eq!(index.by_node_type("person"), &[id.clone()]);
    assert_eq!(index.by_edge_type("works_at"), &[id.clone()]);
    assert!(index.by_node_type("place").is_empty());
    assert!(index.get(&id).is_some());
}

#[test]
fn test_pattern_subset_matching() {
    let mut index = PatternIndex::new();
    let stored = employment_pattern();
    let stored_id = stored.id.clone();
    index.add(stored);

    // Probe covering the stored types matches.
    let probe = GraphPattern::new(
        vec![
            PatternNode {
                var: "x".to_string(),
                node_type: "person".to_string(),
            },
            PatternNode {
                var: "y".to_string(),
                node_type: "organization".to_string(),
            },
            PatternNode {
                var: "z".to_string(),
                node_type: "place".to_string(),
            },
        ],
        vec![
            PatternEdge {
                from_var: "x".to_string(),
                to_var: "y".to_string(),
                edge_type: "works_at".to_string(),
                direction: Direction::Out,
            },
            PatternEdge {
                from_var: "x".to_string(),
                to_var: "z".to_string(),
                edge_type: "lives_in".to_string(),
                direction: Direction::Out,
            },
        ],
    );
    assert_eq!(index.matches(&probe), vec![stored_id]);

    // Probe missing the organization type does not.
    let narrow = GraphPattern::new(
        vec![PatternNode {
            var: "x".to_string(),
            node_type: "person".to_string(),
        }],
        vec![],
    );
    assert!(index.matches(&narrow).is_empty());
}

#[test]
fn test_pattern_remove() {
    let mut index = PatternIndex::new();
    let pattern = employment_pattern();
    let id = pattern.id.clone();
    index.add(pattern);
    index.remove(&id);

    assert!(index.is_empty());
    assert!(index.by_node_type("person").is_empty());
    assert!(index.by_edge_type("works_at").is_empty());
}

// ==================== Store-Level Index Sync ====================

#[test]
fn test_store_populates_all_indexes() {
    let mut store = GraphStore::new(GraphConfig {
        dimension: 2,
        ..GraphConfig::default()
    });
    let id = store
        .add_node(
            NodeBuilder::new("person")
                .id("alice")
                .name("Alice")
                .property("bio", "writes rust")
                .property("age", 30i64)
                .embedding(vec![1.0, 0.0])
                .build(),
        )
        .unwrap();

    assert_eq!(store.indexes().label().get("person"), &[id.clone()]);
    assert_eq!(store.indexes().text().query("rust"), &[id.clone()]);
    assert!(store.indexes().vector().get(&id).is_some());
    let ids = store
        .indexes()
        .property()
        .query("age", PropertyOp::Eq, &PropertyValue::Int(30))
        .unwrap();
    assert_eq!(ids, vec![id.clone()]);

    store.remove_node(&id).unwrap();
    let stats = store.indexes().stats();
    assert_eq!(stats.label_entries, 0);
    assert_eq!(stats.property_entries, 0);
    assert_eq!(stats.text_documents, 0);
    assert_eq!(stats.vector_entries, 0);
}
