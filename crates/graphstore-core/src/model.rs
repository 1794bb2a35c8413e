//! In-memory graph model. Entities reference each other by id, not by Rust
//! reference, so that the cyclic node/relationship graph never needs `Rc`
//! or unsafe aliasing — the [`Graph`] container is the single owner and
//! resolves ids on demand.
//!
//! Grounded in `original_source/engine/node.py`, `relationship.py`,
//! `property.py`, `label.py`, and `graph.py`.

use crate::codec::Scalar;
use crate::record::INVALID_ID;
use std::collections::HashMap;

/// A label name, cached alongside its store id.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub id: i32,
    pub name: String,
    /// Mirrors the on-disk tombstone flag so a just-deleted label stays
    /// recognizable for the remainder of an operation before it's dropped.
    pub used: bool,
}

/// One key/value pair, owned by exactly one node or relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: i32,
    pub key: Scalar,
    pub value: Scalar,
    pub next_prop: i32,
    pub used: bool,
}

/// A node: a label reference, a property chain, and an incidence list of
/// relationship ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i32,
    pub label_id: i32,
    pub next_rel: i32,
    pub next_prop: i32,
    pub properties: Vec<Property>,
    pub used: bool,
}

impl Node {
    /// Property values as `(key, value)` pairs, in chain order.
    pub fn property_pairs(&self) -> Vec<(&Scalar, &Scalar)> {
        self.properties.iter().map(|p| (&p.key, &p.value)).collect()
    }
}

/// A relationship: endpoints by id, a label, a property chain, and the
/// four neighbour pointers of its per-endpoint doubly-linked incidence
/// chains.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: i32,
    pub label_id: i32,
    pub from: i32,
    pub to: i32,
    pub from_next: i32,
    pub to_next: i32,
    pub from_prev: i32,
    pub to_prev: i32,
    pub next_prop: i32,
    pub properties: Vec<Property>,
    pub used: bool,
}

impl Relationship {
    /// Property values as `(key, value)` pairs, in chain order.
    pub fn property_pairs(&self) -> Vec<(&Scalar, &Scalar)> {
        self.properties.iter().map(|p| (&p.key, &p.value)).collect()
    }
}

/// Consistency state of the in-memory [`Graph`] relative to what's durable
/// on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// No objects cached and none expected on disk.
    Empty,
    /// Cache is known to reflect every id present on disk.
    PopulatedConsistent,
    /// Disk may hold ids not yet reflected in the cache (cold start, a
    /// `clear()`, or a bounded rehydration that hit its hop budget).
    PopulatedInconsistent,
}

/// The named graph plus every cached node/relationship, keyed by id.
#[derive(Debug, Clone)]
pub struct Graph {
    pub name: String,
    pub state: GraphState,
    pub nodes: HashMap<i32, Node>,
    pub relationships: HashMap<i32, Relationship>,
    pub labels: HashMap<i32, Label>,
}

impl Graph {
    /// A fresh, empty, consistent graph named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: GraphState::Empty,
            nodes: HashMap::new(),
            relationships: HashMap::new(),
            labels: HashMap::new(),
        }
    }

    /// The placeholder graph allocated on a cold, non-empty open.
    pub fn placeholder_init() -> Self {
        let mut g = Self::new("init");
        g.state = GraphState::PopulatedInconsistent;
        g
    }

    /// Drop all cached content and mark inconsistent, per `clear()`.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.relationships.clear();
        self.labels.clear();
        self.state = GraphState::PopulatedInconsistent;
    }

    /// Mark consistent after a full or workset-exhausting rehydration.
    pub fn mark_consistent(&mut self) {
        self.state = GraphState::PopulatedConsistent;
    }

    /// Record the first successful create, transitioning out of `Empty`.
    pub fn mark_populated(&mut self) {
        if self.state == GraphState::Empty {
            self.state = GraphState::PopulatedConsistent;
        }
    }

    pub fn is_inconsistent(&self) -> bool {
        self.state == GraphState::PopulatedInconsistent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_graph_is_empty() {
        let g = Graph::new("g");
        assert_eq!(g.state, GraphState::Empty);
        assert!(g.nodes.is_empty());
    }

    #[test]
    fn clear_marks_inconsistent() {
        let mut g = Graph::new("g");
        g.nodes.insert(
            0,
            Node {
                id: 0,
                label_id: 0,
                next_rel: INVALID_ID,
                next_prop: INVALID_ID,
                properties: vec![],
                used: true,
            },
        );
        g.mark_populated();
        g.clear();
        assert!(g.nodes.is_empty());
        assert_eq!(g.state, GraphState::PopulatedInconsistent);
    }

    #[test]
    fn placeholder_init_is_inconsistent() {
        let g = Graph::placeholder_init();
        assert_eq!(g.state, GraphState::PopulatedInconsistent);
        assert_eq!(g.name, "init");
    }
}
