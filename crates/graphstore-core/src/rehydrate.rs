//! Bounded BFS rehydration: reads enough of the on-disk stores to bring a
//! requested id (and its near neighbourhood) into the in-memory [`Graph`].
//!
//! Grounded directly in
//! `original_source/engine/graph_engine.py::_collect_objects` (workset
//! management, staging map, roll-forward, consistency flag on early
//! termination) and its full-sweep sibling `_collect_graph`.

use crate::engine::GraphEngine;
use crate::error::Result;
use crate::model::{Label, Property};
use crate::record::INVALID_ID;
use std::collections::{HashMap, HashSet};

/// Default hop budget for a bounded rehydration, per spec.
pub const DEFAULT_HOPS: u32 = 10;

struct StagedRelationship {
    label_id: i32,
    from: i32,
    to: i32,
    from_next: i32,
    to_next: i32,
    from_prev: i32,
    to_prev: i32,
    next_prop: i32,
    properties: Vec<Property>,
}

impl GraphEngine {
    /// Full sweep: rehydrate every id in `[0, count)` for nodes and
    /// relationships that aren't already cached, then mark the graph
    /// consistent.
    pub(crate) fn collect_graph(&mut self) -> Result<()> {
        let stats = self.get_stats()?;
        let node_count = *stats.get("NodeStorage").unwrap_or(&0);
        let rel_count = *stats.get("RelationshipStorage").unwrap_or(&0);

        for idx in 0..node_count {
            if !self.graph_nodes_contains(idx) {
                self.collect_objects(idx, true, u32::MAX)?;
            }
        }
        for idx in 0..rel_count {
            if !self.graph_relationships_contains(idx) {
                self.collect_objects(idx, false, u32::MAX)?;
            }
        }

        if let Some(graph) = self.graph.as_mut() {
            graph.mark_consistent();
        }
        tracing::info!(node_count, rel_count, "full rehydration sweep complete");
        Ok(())
    }

    fn graph_nodes_contains(&self, id: i32) -> bool {
        self.graph.as_ref().map(|g| g.nodes.contains_key(&id)).unwrap_or(false)
    }

    fn graph_relationships_contains(&self, id: i32) -> bool {
        self.graph
            .as_ref()
            .map(|g| g.relationships.contains_key(&id))
            .unwrap_or(false)
    }

    /// Bounded BFS from one entry id, reaching everything within `hops`
    /// steps. Caps the in-progress queue expansion but not the id space:
    /// `hops = u32::MAX` effectively means "until worksets are empty",
    /// used by [`GraphEngine::collect_graph`]'s full sweep.
    pub(crate) fn collect_objects(&mut self, entry_id: i32, entry_is_node: bool, hops: u32) -> Result<()> {
        let mut node_ids_to_read: HashSet<i32> = HashSet::new();
        let mut rel_ids_to_read: HashSet<i32> = HashSet::new();
        let mut staged: HashMap<i32, StagedRelationship> = HashMap::new();

        if entry_is_node {
            node_ids_to_read.insert(entry_id);
        } else {
            rel_ids_to_read.insert(entry_id);
        }

        let mut count = 0u32;
        while (!node_ids_to_read.is_empty() || !rel_ids_to_read.is_empty()) && count < hops {
            for node_id in node_ids_to_read.drain().collect::<Vec<_>>() {
                if node_id == INVALID_ID {
                    continue;
                }
                self.collect_one_node(node_id, &staged, &mut rel_ids_to_read)?;
            }

            let mut new_rel_ids = HashSet::new();
            for rel_id in rel_ids_to_read.drain().collect::<Vec<_>>() {
                if rel_id == INVALID_ID || self.graph_relationships_contains(rel_id) || staged.contains_key(&rel_id) {
                    continue;
                }
                if let Some(data) =
                    self.collect_one_relationship(rel_id, &staged, &mut node_ids_to_read, &mut new_rel_ids)?
                {
                    staged.insert(rel_id, data);
                }
            }
            rel_ids_to_read = new_rel_ids;

            count += 1;
        }

        for (rel_id, data) in staged {
            let rel = crate::model::Relationship {
                id: rel_id,
                label_id: data.label_id,
                from: data.from,
                to: data.to,
                from_next: data.from_next,
                to_next: data.to_next,
                from_prev: data.from_prev,
                to_prev: data.to_prev,
                next_prop: data.next_prop,
                properties: data.properties,
                used: true,
            };
            self.cache_relationship(rel);
        }

        if count < hops {
            if let Some(graph) = self.graph.as_mut() {
                graph.mark_consistent();
            }
        }
        Ok(())
    }

    fn collect_one_node(
        &mut self,
        node_id: i32,
        staged: &HashMap<i32, StagedRelationship>,
        rel_ids_to_read: &mut HashSet<i32>,
    ) -> Result<()> {
        let node_data = match self.io.read_node(node_id) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(node_id, error = %e, "rehydration: node read failed, treating as absent");
                return Ok(());
            }
        };
        if !node_data.in_use {
            return Ok(());
        }

        if node_data.next_rel != INVALID_ID && !staged.contains_key(&node_data.next_rel) {
            rel_ids_to_read.insert(node_data.next_rel);
        }

        let label = self.collect_label(node_data.label_id)?;
        let properties = self.collect_properties(node_data.next_prop)?;

        let node = crate::model::Node {
            id: node_id,
            label_id: label.id,
            next_rel: node_data.next_rel,
            next_prop: node_data.next_prop,
            properties,
            used: true,
        };
        self.cache_node(node);
        Ok(())
    }

    fn collect_one_relationship(
        &mut self,
        rel_id: i32,
        staged: &HashMap<i32, StagedRelationship>,
        node_ids_to_read: &mut HashSet<i32>,
        new_rel_ids: &mut HashSet<i32>,
    ) -> Result<Option<StagedRelationship>> {
        let rel_data = match self.io.read_relationship(rel_id) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(rel_id, error = %e, "rehydration: relationship read failed, treating as absent");
                return Ok(None);
            }
        };
        if !rel_data.in_use {
            return Ok(None);
        }

        if !self.graph_nodes_contains(rel_data.from) {
            node_ids_to_read.insert(rel_data.from);
        }
        if !self.graph_nodes_contains(rel_data.to) {
            node_ids_to_read.insert(rel_data.to);
        }

        let _label = self.collect_label(rel_data.label_id)?;

        for neighbour in [rel_data.from_prev, rel_data.from_next, rel_data.to_prev, rel_data.to_next] {
            if neighbour != INVALID_ID && !staged.contains_key(&neighbour) {
                new_rel_ids.insert(neighbour);
            }
        }

        let properties = self.collect_properties(rel_data.next_prop)?;
        Ok(Some(StagedRelationship {
            label_id: rel_data.label_id,
            from: rel_data.from,
            to: rel_data.to,
            from_next: rel_data.from_next,
            to_next: rel_data.to_next,
            from_prev: rel_data.from_prev,
            to_prev: rel_data.to_prev,
            next_prop: rel_data.next_prop,
            properties,
        }))
    }

    /// Resolve a label from the cache, else read it from disk and cache it.
    pub(crate) fn collect_label(&mut self, label_id: i32) -> Result<Label> {
        if let Some(label) = self.graph.as_ref().and_then(|g| g.labels.get(&label_id)) {
            return Ok(label.clone());
        }
        let data = self.io.read_label(label_id)?;
        if !data.in_use {
            return Err(crate::error::Error::not_found(format!("label {label_id} is tombstoned")));
        }
        let name = self.io.build_dynamic(data.name_id)?.to_bytes();
        let name = String::from_utf8_lossy(&name).to_string();
        let label = Label {
            id: label_id,
            name: name.clone(),
            used: true,
        };
        self.label_names.insert(name, label_id);
        if let Some(graph) = self.graph.as_mut() {
            graph.labels.insert(label_id, label.clone());
        }
        Ok(label)
    }

    /// Walk a property chain starting at `first_prop_id`, reassembling each
    /// property's key and value scalars.
    pub(crate) fn collect_properties(&mut self, first_prop_id: i32) -> Result<Vec<Property>> {
        let mut properties = Vec::new();
        let mut next = first_prop_id;
        while next != INVALID_ID {
            let data = match self.io.read_property(next) {
                Ok(d) => d,
                Err(_) => break,
            };
            let key = self.io.build_dynamic(data.key_id)?;
            let value = self.io.build_dynamic(data.value_id)?;
            properties.push(Property {
                id: next,
                key,
                value,
                next_prop: data.next_prop,
                used: data.in_use,
            });
            next = data.next_prop;
        }
        Ok(properties)
    }
}
