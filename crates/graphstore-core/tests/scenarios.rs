//! End-to-end scenarios exercising the full create/select/delete surface
//! against real temp-dir backed stores.

use graphstore_core::config::{EngineConfig, StoreFlags, WorkerConfig};
use graphstore_core::{GraphEngine, ObjectRef, Scalar};

fn engine_in(dir: &std::path::Path) -> GraphEngine {
    let config = EngineConfig {
        db_path: dir.to_string_lossy().to_string(),
        workers: vec![WorkerConfig {
            port: 7071,
            stores: StoreFlags::default(),
            replicas: 0,
        }],
        ..EngineConfig::default()
    };
    GraphEngine::open_with_config(&config).unwrap()
}

#[test]
fn s1_two_nodes_and_a_relationship() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine_in(dir.path());

    let cat = engine.create_node("Cat", vec![]).unwrap();
    let mouse = engine.create_node("Mouse", vec![]).unwrap();
    let rel = engine.create_relationship("catches", cat.id, mouse.id, vec![]).unwrap();

    assert_eq!(cat.id, 0);
    assert_eq!(mouse.id, 1);
    assert_eq!(rel.id, 0);

    let stats = engine.get_stats().unwrap();
    assert_eq!(stats["NodeStorage"], 2);
    assert_eq!(stats["RelationshipStorage"], 1);
    assert_eq!(stats["LabelStorage"], 3);

    let selected = engine.select_relationship(0).unwrap();
    let label = engine.select_label(selected.label_id).unwrap();
    assert_eq!(label.name, "catches");
}

#[test]
fn s2_long_label_spans_dynamic_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine_in(dir.path());

    let long_label = "Tester of the code. ".repeat(5);
    assert_eq!(long_label.len(), 100);

    let before = engine.get_stats().unwrap().get("DynamicStorage").copied().unwrap_or(0);
    engine.create_node(&long_label, vec![]).unwrap();
    let after = engine.get_stats().unwrap()["DynamicStorage"];
    assert_eq!(after - before, 4);

    let node = engine.select_node(0).unwrap();
    let label = engine.select_label(node.label_id).unwrap();
    assert_eq!(label.name, long_label);
}

#[test]
fn s3_typed_property_promotion_after_clear() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine_in(dir.path());

    engine
        .create_node(
            "User",
            vec![
                (Scalar::String("Age".to_string()), Scalar::String("18".to_string())),
                (Scalar::String("Male".to_string()), Scalar::String("True".to_string())),
            ],
        )
        .unwrap();

    engine.clear();
    let node = engine.select_node(0).unwrap();
    assert_eq!(node.properties[0].value, Scalar::Int(18));
    assert_eq!(node.properties[1].value, Scalar::Bool(true));
}

#[test]
fn s4_relationship_chain_integrity_under_delete() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine_in(dir.path());

    let a = engine.create_node("A", vec![]).unwrap().id;
    let b = engine.create_node("B", vec![]).unwrap().id;
    let c = engine.create_node("C", vec![]).unwrap().id;
    let d = engine.create_node("D", vec![]).unwrap().id;

    let r1 = engine.create_relationship("e", a, b, vec![]).unwrap().id;
    let r2 = engine.create_relationship("e", a, c, vec![]).unwrap().id;
    let r3 = engine.create_relationship("e", c, a, vec![]).unwrap().id;
    let r4 = engine.create_relationship("e", b, d, vec![]).unwrap().id;
    let r5 = engine.create_relationship("e", c, b, vec![]).unwrap().id;

    engine.delete_relationship(r5).unwrap();

    let remaining = engine.select_relationships(None, None).unwrap();
    let mut remaining_ids: Vec<i32> = remaining.iter().map(|r| r.id).collect();
    remaining_ids.sort();
    assert_eq!(remaining_ids, vec![r1, r2, r3, r4]);

    let rel4 = engine.select_relationship(r4).unwrap();
    assert_eq!(rel4.from_next, graphstore_core::INVALID_ID);
    let rel3 = engine.select_relationship(r3).unwrap();
    assert_eq!(rel3.from_next, graphstore_core::INVALID_ID);

    let degree = |id: i32| remaining.iter().filter(|r| r.from == id || r.to == id).count();
    assert_eq!(degree(b), 2);
    assert_eq!(degree(c), 2);
    assert_eq!(degree(d), 1);
}

#[test]
fn s5_query_by_comparator() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine_in(dir.path());

    let cat = engine.create_node("Cat", vec![]).unwrap();
    let mouse = engine.create_node("Mouse", vec![]).unwrap();
    engine.create_relationship("catches", cat.id, mouse.id, vec![]).unwrap();
    engine
        .create_node("boy", vec![(Scalar::String("age".to_string()), Scalar::String("20".to_string()))])
        .unwrap();
    engine
        .create_node("girl", vec![(Scalar::String("age".to_string()), Scalar::String("19".to_string()))])
        .unwrap();

    let key = Scalar::String("age".to_string());
    let value = Scalar::Int(19);
    let matches = engine
        .select_nodes(None, Some((&key, &value, ">")))
        .unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].properties[0].value, Scalar::Int(20));
}

#[test]
fn s6_cold_start_consistency() {
    let dir = tempfile::tempdir().unwrap();
    let before = {
        let mut engine = engine_in(dir.path());
        engine
            .create_node("User", vec![(Scalar::String("Age".to_string()), Scalar::String("18".to_string()))])
            .unwrap();
        let node = engine.select_node(0).unwrap();
        engine.close().unwrap();
        node
    };

    let mut reopened = engine_in(dir.path());
    let after = reopened.select_node(0).unwrap();

    assert_eq!(before.id, after.id);
    assert_eq!(before.label_id, after.label_id);
    assert_eq!(before.property_pairs(), after.property_pairs());
}

#[test]
fn insert_then_select_round_trips_label_and_properties() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine_in(dir.path());

    let pairs = vec![
        (Scalar::String("k1".to_string()), Scalar::String("v1".to_string())),
        (Scalar::String("k2".to_string()), Scalar::Int(7)),
    ];
    let created = engine.create_node("Widget", pairs.clone()).unwrap();
    let selected = engine.select_node(created.id).unwrap();
    let label = engine.select_label(selected.label_id).unwrap();

    assert_eq!(label.name, "Widget");
    assert_eq!(selected.property_pairs(), vec![(&pairs[0].0, &pairs[0].1), (&pairs[1].0, &pairs[1].1)]);
}

#[test]
fn delete_node_twice_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine_in(dir.path());
    let node = engine.create_node("Solo", vec![]).unwrap();

    engine.delete_node(node.id).unwrap();
    let err = engine.delete_node(node.id).unwrap_err();
    assert!(matches!(err, graphstore_core::Error::NotFound(_)));
}

#[test]
fn delete_node_cascades_to_incident_relationships() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine_in(dir.path());

    let a = engine.create_node("A", vec![]).unwrap().id;
    let b = engine.create_node("B", vec![]).unwrap().id;
    let c = engine.create_node("C", vec![]).unwrap().id;

    let r1 = engine.create_relationship("e", a, b, vec![]).unwrap().id;
    let r2 = engine.create_relationship("e", c, a, vec![]).unwrap().id;
    let r3 = engine.create_relationship("e", b, c, vec![]).unwrap().id;

    engine.delete_node(a).unwrap();

    assert!(engine.select_relationship(r1).is_err());
    assert!(engine.select_relationship(r2).is_err());

    let remaining = engine.select_relationships(None, None).unwrap();
    assert_eq!(remaining.iter().map(|r| r.id).collect::<Vec<_>>(), vec![r3]);
}

#[test]
fn add_property_appends_and_is_queryable() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine_in(dir.path());
    let node = engine.create_node("Thing", vec![]).unwrap();

    engine
        .add_property(
            ObjectRef::Node(node.id),
            Scalar::String("color".to_string()),
            Scalar::String("red".to_string()),
        )
        .unwrap();

    let updated = engine.select_node(node.id).unwrap();
    assert_eq!(updated.properties.len(), 1);
    assert_eq!(updated.properties[0].value, Scalar::String("red".to_string()));
}
