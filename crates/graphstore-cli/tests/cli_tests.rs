//! Integration tests for the command grammar, exercised through the
//! library's public `parser` module.

use graphstore_cli::parser::{parse, Command};
use graphstore_core::Scalar;

#[test]
fn full_session_grammar_round_trips() {
    assert_eq!(
        parse("create graph: demo").unwrap(),
        Command::CreateGraph { name: "demo".to_string() }
    );

    assert_eq!(
        parse("create node: Cat").unwrap(),
        Command::CreateNode { label: "Cat".to_string(), properties: vec![] }
    );

    assert_eq!(
        parse("create relationship: catches from 0 to 1 weight:3").unwrap(),
        Command::CreateRelationship {
            label: "catches".to_string(),
            from: 0,
            to: 1,
            properties: vec![(Scalar::String("weight".to_string()), Scalar::Int(3))],
        }
    );

    assert_eq!(
        parse("match node: Cat").unwrap(),
        Command::MatchNode { id: None, label: Some("Cat".to_string()), filter: None }
    );

    assert_eq!(
        parse("update node: id:0 age:21").unwrap(),
        Command::UpdateNode {
            id: 0,
            properties: vec![(Scalar::String("age".to_string()), Scalar::Int(21))],
        }
    );

    assert_eq!(
        parse("delete relationship: id:0").unwrap(),
        Command::DeleteRelationship { id: 0 }
    );
}

#[test]
fn update_requires_id_token() {
    assert!(parse("update node: age:21").is_err());
}

#[test]
fn update_relationship_dispatches_to_relationship_variant() {
    let cmd = parse("update relationship: id:2 weight:9").unwrap();
    assert_eq!(
        cmd,
        Command::UpdateRelationship {
            id: 2,
            properties: vec![(Scalar::String("weight".to_string()), Scalar::Int(9))],
        }
    );
}

#[test]
fn case_insensitive_verb_dispatch() {
    assert_eq!(parse("CREATE node: Cat").unwrap(), Command::CreateNode { label: "Cat".to_string(), properties: vec![] });
    assert_eq!(parse("Delete node: id:0").unwrap(), Command::DeleteNode { id: 0 });
}

#[test]
fn malformed_id_is_syntax_error() {
    assert!(parse("delete node: id:abc").is_err());
    assert!(parse("update relationship: id:").is_err());
}

#[test]
fn comparator_scan_prefers_longest_match() {
    let cmd = parse("match node: age>=21").unwrap();
    assert_eq!(
        cmd,
        Command::MatchNode {
            id: None,
            label: None,
            filter: Some(("age".to_string(), Scalar::Int(21), ">=".to_string())),
        }
    );
}
