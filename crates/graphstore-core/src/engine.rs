//! `GraphEngine`: the single public surface. Owns the [`IoLayer`], the
//! in-memory [`Graph`], and the secondary indexes that serve label- and
//! property-filtered selects in O(matches).
//!
//! Grounded in `original_source/engine/graph_engine.py`'s `GraphEngine`.

use crate::codec::{NodeData, PropertyData, RelationshipData, Scalar};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::io::{IoLayer, StoreKind};
use crate::model::{Graph, Label, Node, Property, Relationship};
use crate::rehydrate::DEFAULT_HOPS;
use crate::record::INVALID_ID;
use crate::store::StoreSet;
use std::collections::HashMap;
use std::path::PathBuf;

/// A cached entity that owns a property, for the properties index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Node(i32),
    Relationship(i32),
}

/// Either kind of graph object, returned by `select_graph_objects`.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphObject {
    Node(Node),
    Relationship(Relationship),
}

fn scalar_index_text(scalar: &Scalar) -> String {
    String::from_utf8_lossy(&scalar.to_bytes()).to_string()
}

/// The embedded property graph engine.
pub struct GraphEngine {
    pub(crate) io: IoLayer,
    pub(crate) graph: Option<Graph>,
    pub(crate) label_names: HashMap<String, i32>,
    pub(crate) node_labels: HashMap<String, Vec<i32>>,
    pub(crate) rel_labels: HashMap<String, Vec<i32>>,
    pub(crate) properties: HashMap<(String, String), Vec<ObjectRef>>,
    db_path: PathBuf,
}

impl GraphEngine {
    /// Open the engine against the worker instance at `db_path`'s first
    /// worker entry, per `config`.
    pub fn open_with_config(config: &EngineConfig) -> Result<Self> {
        let db_path = PathBuf::from(&config.db_path);
        let worker_dir = crate::store::worker_instance_dir(&db_path, 0);
        let stores = StoreSet::open(&worker_dir, config.primary_stores())?;
        let mut io = IoLayer::new(stores);

        let stats = io.get_stats()?;
        let graph = if stats.is_empty() {
            None
        } else {
            tracing::warn!("engine opened on non-empty stores, starting inconsistent");
            Some(Graph::placeholder_init())
        };

        tracing::info!(
            nodes = ?stats.nodes,
            relationships = ?stats.relationships,
            labels = ?stats.labels,
            "graph engine opened"
        );

        Ok(Self {
            io,
            graph,
            label_names: HashMap::new(),
            node_labels: HashMap::new(),
            rel_labels: HashMap::new(),
            properties: HashMap::new(),
            db_path,
        })
    }

    /// Open using the config file at `config_path`, or engine defaults if
    /// absent.
    pub fn open(config_path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config = match EngineConfig::load(config_path.as_ref()) {
            Ok(c) => c,
            Err(Error::Io(_)) => EngineConfig::default(),
            Err(e) => return Err(e),
        };
        Self::open_with_config(&config)
    }

    /// Flush and close all stores, dropping the in-memory graph.
    pub fn close(mut self) -> Result<()> {
        self.graph = None;
        self.io.flush()
    }

    /// Drop all cached content and secondary indexes; the next select
    /// triggers rehydration from disk.
    pub fn clear(&mut self) {
        if let Some(graph) = self.graph.as_mut() {
            graph.clear();
        } else {
            self.graph = Some(Graph::placeholder_init());
        }
        self.label_names.clear();
        self.node_labels.clear();
        self.rel_labels.clear();
        self.properties.clear();
    }

    /// Current record counts per store, keyed by name (`NodeStorage`,
    /// `RelationshipStorage`, `LabelStorage`, `PropertyStorage`,
    /// `DynamicStorage`).
    pub fn get_stats(&mut self) -> Result<HashMap<String, i32>> {
        let stats = self.io.get_stats()?;
        let mut map = HashMap::new();
        if let Some(n) = stats.nodes {
            map.insert("NodeStorage".to_string(), n);
        }
        if let Some(n) = stats.relationships {
            map.insert("RelationshipStorage".to_string(), n);
        }
        if let Some(n) = stats.labels {
            map.insert("LabelStorage".to_string(), n);
        }
        if let Some(n) = stats.properties {
            map.insert("PropertyStorage".to_string(), n);
        }
        if let Some(n) = stats.dynamic_chunks {
            map.insert("DynamicStorage".to_string(), n);
        }
        Ok(map)
    }

    /// Create the named graph. Fails if a graph is already present.
    pub fn create_graph(&mut self, name: impl Into<String>) -> Result<&Graph> {
        if self.graph.is_some() {
            return Err(Error::already_exists("graph already exists"));
        }
        self.graph = Some(Graph::new(name));
        Ok(self.graph.as_ref().unwrap())
    }

    /// The current graph, if one is open.
    pub fn get_graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    fn graph_mut(&mut self) -> &mut Graph {
        if self.graph.is_none() {
            self.graph = Some(Graph::new("default"));
        }
        self.graph.as_mut().unwrap()
    }

    fn resolve_or_create_label(&mut self, name: &str) -> Result<i32> {
        if let Some(&id) = self.label_names.get(name) {
            return Ok(id);
        }
        let label_id = self.io.next_id(StoreKind::Label)?;
        let name_id = self.io.next_id(StoreKind::Dynamic)?;
        self.io.write_dynamic(&Scalar::String(name.to_string()), name_id)?;
        self.io
            .write_label(label_id, crate::codec::LabelData { in_use: true, name_id }, false)?;

        self.label_names.insert(name.to_string(), label_id);
        self.graph_mut().labels.insert(
            label_id,
            Label {
                id: label_id,
                name: name.to_string(),
                used: true,
            },
        );
        Ok(label_id)
    }

    /// Persist a property chain for `pairs`, returning the cached
    /// `Property` list in chain order. `pairs` may be empty.
    fn insert_property_chain(&mut self, pairs: &[(Scalar, Scalar)]) -> Result<Vec<Property>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        let first_prop_id = self.io.next_id(StoreKind::Property)?;
        let mut properties = Vec::with_capacity(pairs.len());
        for (i, (key, value)) in pairs.iter().enumerate() {
            let prop_id = first_prop_id + i as i32;
            let next_prop = if i + 1 < pairs.len() {
                prop_id + 1
            } else {
                INVALID_ID
            };

            let key_id = self.io.next_id(StoreKind::Dynamic)?;
            self.io.write_dynamic(key, key_id)?;
            let value_id = self.io.next_id(StoreKind::Dynamic)?;
            self.io.write_dynamic(value, value_id)?;

            self.io.write_property(
                prop_id,
                PropertyData {
                    in_use: true,
                    key_id,
                    value_id,
                    next_prop,
                },
                false,
            )?;
            properties.push(Property {
                id: prop_id,
                key: key.clone(),
                value: value.clone(),
                next_prop,
                used: true,
            });
        }
        Ok(properties)
    }

    fn update_properties_index(&mut self, owner: ObjectRef, properties: &[Property]) {
        for prop in properties {
            let key = (scalar_index_text(&prop.key), scalar_index_text(&prop.value));
            self.properties.entry(key).or_default().push(owner);
        }
    }

    /// Create a node with `label_name` and an ordered list of properties.
    pub fn create_node(&mut self, label_name: &str, properties: Vec<(Scalar, Scalar)>) -> Result<Node> {
        let label_id = self.resolve_or_create_label(label_name)?;
        let node_id = self.io.next_id(StoreKind::Node)?;
        let props = self.insert_property_chain(&properties)?;
        let next_prop = props.first().map(|p| p.id).unwrap_or(INVALID_ID);

        self.io.write_node(
            node_id,
            NodeData {
                in_use: true,
                next_rel: INVALID_ID,
                next_prop,
                label_id,
            },
            false,
        )?;

        let node = Node {
            id: node_id,
            label_id,
            next_rel: INVALID_ID,
            next_prop,
            properties: props,
            used: true,
        };

        self.node_labels.entry(label_name.to_string()).or_default().push(node_id);
        self.update_properties_index(ObjectRef::Node(node_id), &node.properties);
        self.graph_mut().nodes.insert(node_id, node.clone());
        self.graph_mut().mark_populated();
        Ok(node)
    }

    /// The relationship id currently last in `node_id`'s incidence chain,
    /// stopping early if a neighbour pointer refers to an id not yet
    /// present in the cache (used to make self-loop wiring order-safe).
    fn last_incident_relationship(&self, node_id: i32) -> Option<i32> {
        let graph = self.graph.as_ref()?;
        let node = graph.nodes.get(&node_id)?;
        let mut current = node.next_rel;
        if current == INVALID_ID {
            return None;
        }
        loop {
            let rel = graph.relationships.get(&current)?;
            let next = if rel.from == node_id { rel.from_next } else { rel.to_next };
            if next == INVALID_ID || !graph.relationships.contains_key(&next) {
                return Some(current);
            }
            current = next;
        }
    }

    fn ensure_node_present(&mut self, id: i32) -> Result<()> {
        if self.graph.as_ref().map(|g| g.nodes.contains_key(&id)).unwrap_or(false) {
            return Ok(());
        }
        self.collect_objects(id, true, DEFAULT_HOPS)?;
        let present = self
            .graph
            .as_ref()
            .and_then(|g| g.nodes.get(&id))
            .map(|n| n.used)
            .unwrap_or(false);
        if present {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!("node {id} does not exist")))
        }
    }

    /// Create a relationship `label_name` from `start` to `end` with an
    /// ordered property list. Both endpoints must already exist.
    pub fn create_relationship(
        &mut self,
        label_name: &str,
        start: i32,
        end: i32,
        properties: Vec<(Scalar, Scalar)>,
    ) -> Result<Relationship> {
        self.ensure_node_present(start)?;
        self.ensure_node_present(end)?;

        let label_id = self.resolve_or_create_label(label_name)?;
        let rel_id = self.io.next_id(StoreKind::Relationship)?;

        let start_last = self.last_incident_relationship(start);
        let from_prev = start_last.unwrap_or(INVALID_ID);
        let end_last = self.last_incident_relationship(end);
        let to_prev = end_last.unwrap_or(INVALID_ID);

        let props = self.insert_property_chain(&properties)?;
        let next_prop = props.first().map(|p| p.id).unwrap_or(INVALID_ID);

        self.io.write_relationship(
            rel_id,
            RelationshipData {
                in_use: true,
                from: start,
                to: end,
                label_id,
                from_next: INVALID_ID,
                to_next: INVALID_ID,
                from_prev,
                to_prev,
                next_prop,
            },
            false,
        )?;

        match start_last {
            Some(last_id) => self.patch_relationship_next(last_id, start, rel_id)?,
            None => self.patch_node_first_rel(start, rel_id)?,
        }
        match end_last {
            Some(last_id) => self.patch_relationship_next(last_id, end, rel_id)?,
            None => self.patch_node_first_rel(end, rel_id)?,
        }

        let rel = Relationship {
            id: rel_id,
            label_id,
            from: start,
            to: end,
            from_next: INVALID_ID,
            to_next: INVALID_ID,
            from_prev,
            to_prev,
            next_prop,
            properties: props,
            used: true,
        };

        self.rel_labels.entry(label_name.to_string()).or_default().push(rel_id);
        self.update_properties_index(ObjectRef::Relationship(rel_id), &rel.properties);
        self.cache_relationship(rel.clone());
        Ok(rel)
    }

    /// Patch `rel_id`'s pointer on whichever side touches `node_id` to
    /// point at `new_next`, persisting the change to disk and cache.
    fn patch_relationship_next(&mut self, rel_id: i32, node_id: i32, new_next: i32) -> Result<()> {
        let mut data = self.io.read_relationship(rel_id)?;
        if data.from == node_id {
            data.from_next = new_next;
        } else {
            data.to_next = new_next;
        }
        self.io.write_relationship(rel_id, data, true)?;
        if let Some(graph) = self.graph.as_mut() {
            if let Some(rel) = graph.relationships.get_mut(&rel_id) {
                if rel.from == node_id {
                    rel.from_next = new_next;
                } else {
                    rel.to_next = new_next;
                }
            }
        }
        Ok(())
    }

    fn patch_node_first_rel(&mut self, node_id: i32, new_rel: i32) -> Result<()> {
        let mut data = self.io.read_node(node_id)?;
        data.next_rel = new_rel;
        self.io.write_node(node_id, data, true)?;
        if let Some(graph) = self.graph.as_mut() {
            if let Some(node) = graph.nodes.get_mut(&node_id) {
                node.next_rel = new_rel;
            }
        }
        Ok(())
    }

    pub(crate) fn cache_node(&mut self, node: Node) {
        let label_name = self
            .graph
            .as_ref()
            .and_then(|g| g.labels.get(&node.label_id))
            .map(|l| l.name.clone());
        if let Some(name) = label_name {
            self.node_labels.entry(name).or_default().push(node.id);
        }
        self.update_properties_index(ObjectRef::Node(node.id), &node.properties);
        self.graph_mut().nodes.insert(node.id, node);
    }

    pub(crate) fn cache_relationship(&mut self, rel: Relationship) {
        let label_name = self
            .graph
            .as_ref()
            .and_then(|g| g.labels.get(&rel.label_id))
            .map(|l| l.name.clone());
        if let Some(name) = label_name {
            self.rel_labels.entry(name).or_default().push(rel.id);
        }
        self.update_properties_index(ObjectRef::Relationship(rel.id), &rel.properties);
        self.graph_mut().relationships.insert(rel.id, rel);
    }

    /// Append a property to a node or relationship owner.
    pub fn add_property(&mut self, owner: ObjectRef, key: Scalar, value: Scalar) -> Result<()> {
        let prop_id = self.io.next_id(StoreKind::Property)?;
        let key_id = self.io.next_id(StoreKind::Dynamic)?;
        self.io.write_dynamic(&key, key_id)?;
        let value_id = self.io.next_id(StoreKind::Dynamic)?;
        self.io.write_dynamic(&value, value_id)?;
        self.io.write_property(
            prop_id,
            PropertyData {
                in_use: true,
                key_id,
                value_id,
                next_prop: INVALID_ID,
            },
            false,
        )?;

        let last_prop_id = match owner {
            ObjectRef::Node(id) => self
                .graph
                .as_ref()
                .and_then(|g| g.nodes.get(&id))
                .ok_or_else(|| Error::invalid_argument(format!("node {id} not found")))?
                .properties
                .last()
                .map(|p| p.id),
            ObjectRef::Relationship(id) => self
                .graph
                .as_ref()
                .and_then(|g| g.relationships.get(&id))
                .ok_or_else(|| Error::invalid_argument(format!("relationship {id} not found")))?
                .properties
                .last()
                .map(|p| p.id),
        };

        match last_prop_id {
            Some(last_id) => {
                let mut last = self.io.read_property(last_id)?;
                last.next_prop = prop_id;
                self.io.write_property(last_id, last, true)?;
            }
            None => match owner {
                ObjectRef::Node(id) => {
                    let mut data = self.io.read_node(id)?;
                    data.next_prop = prop_id;
                    self.io.write_node(id, data, true)?;
                }
                ObjectRef::Relationship(id) => {
                    let mut data = self.io.read_relationship(id)?;
                    data.next_prop = prop_id;
                    self.io.write_relationship(id, data, true)?;
                }
            },
        }

        let prop = Property {
            id: prop_id,
            key: key.clone(),
            value: value.clone(),
            next_prop: INVALID_ID,
            used: true,
        };
        self.update_properties_index(owner, std::slice::from_ref(&prop));
        if let Some(graph) = self.graph.as_mut() {
            match owner {
                ObjectRef::Node(id) => {
                    if let Some(node) = graph.nodes.get_mut(&id) {
                        if node.properties.is_empty() {
                            node.next_prop = prop_id;
                        }
                        node.properties.push(prop);
                    }
                }
                ObjectRef::Relationship(id) => {
                    if let Some(rel) = graph.relationships.get_mut(&id) {
                        if rel.properties.is_empty() {
                            rel.next_prop = prop_id;
                        }
                        rel.properties.push(prop);
                    }
                }
            }
        }
        Ok(())
    }

    /// Select a node by id, hitting the cache first and rehydrating on miss.
    pub fn select_node(&mut self, id: i32) -> Result<Node> {
        if let Some(node) = self.graph.as_ref().and_then(|g| g.nodes.get(&id)) {
            if node.used {
                return Ok(node.clone());
            }
        } else {
            self.collect_objects(id, true, DEFAULT_HOPS)?;
        }
        let node = self
            .graph
            .as_ref()
            .and_then(|g| g.nodes.get(&id))
            .filter(|n| n.used)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("node {id} was not found")))?;
        Ok(node)
    }

    /// Select a relationship by id, hitting the cache first and
    /// rehydrating on miss.
    pub fn select_relationship(&mut self, id: i32) -> Result<Relationship> {
        if let Some(rel) = self.graph.as_ref().and_then(|g| g.relationships.get(&id)) {
            if rel.used {
                return Ok(rel.clone());
            }
        } else {
            self.collect_objects(id, false, DEFAULT_HOPS)?;
        }
        let rel = self
            .graph
            .as_ref()
            .and_then(|g| g.relationships.get(&id))
            .filter(|r| r.used)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("relationship {id} was not found")))?;
        Ok(rel)
    }

    fn ensure_consistent(&mut self) -> Result<()> {
        if self.graph.as_ref().map(|g| g.is_inconsistent()).unwrap_or(false) {
            self.collect_graph()?;
        }
        Ok(())
    }

    /// Typed comparator matching spec semantics: `=` is exact `Scalar`
    /// equality; the ordering operators numerically promote both sides and
    /// yield `false` for non-numeric strings.
    pub fn cond_function(cmp: &str, actual: &Scalar, expected: &Scalar) -> Result<bool> {
        if cmp == "=" {
            return Ok(actual == expected);
        }
        let a = scalar_as_f64(actual);
        let b = scalar_as_f64(expected);
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(false),
        };
        Ok(match cmp {
            ">" => a > b,
            "<" => a < b,
            ">=" => a >= b,
            "<=" => a <= b,
            other => return Err(Error::invalid_argument(format!("unknown comparator '{other}'"))),
        })
    }

    /// Candidate owners for an equality filter, read straight from the
    /// properties index rather than scanning every cached object.
    fn equality_candidates(&self, key: &Scalar, value: &Scalar) -> Vec<ObjectRef> {
        let index_key = (scalar_index_text(key), scalar_index_text(value));
        self.properties.get(&index_key).cloned().unwrap_or_default()
    }

    /// Select nodes by optional label and an optional `(key, value, cmp)`
    /// property filter. An `=` filter is served from the properties index
    /// in O(matches); other comparators fall back to a full scan since the
    /// index is keyed on exact (key, value) pairs, not ranges.
    pub fn select_nodes(
        &mut self,
        label: Option<&str>,
        filter: Option<(&Scalar, &Scalar, &str)>,
    ) -> Result<Vec<Node>> {
        self.ensure_consistent()?;

        if let Some((key, value, "=")) = filter {
            let mut nodes: Vec<Node> = self
                .equality_candidates(key, value)
                .into_iter()
                .filter_map(|owner| match owner {
                    ObjectRef::Node(id) => self.graph.as_ref()?.nodes.get(&id).cloned(),
                    ObjectRef::Relationship(_) => None,
                })
                .filter(|node| node.properties.iter().any(|p| &p.key == key && &p.value == value))
                .collect();
            if let Some(name) = label {
                let allowed = self.node_labels.get(name).cloned().unwrap_or_default();
                nodes.retain(|n| allowed.contains(&n.id));
            }
            return Ok(nodes);
        }

        let mut nodes: Vec<Node> = match label {
            Some(name) => {
                let ids = self.node_labels.get(name).cloned().unwrap_or_default();
                ids.into_iter()
                    .filter_map(|id| self.graph.as_ref()?.nodes.get(&id).cloned())
                    .collect()
            }
            None => self.graph.as_ref().map(|g| g.nodes.values().cloned().collect()).unwrap_or_default(),
        };
        if let Some((key, value, cmp)) = filter {
            let mut kept = Vec::new();
            for node in nodes.drain(..) {
                let mut matched = false;
                for prop in &node.properties {
                    if &prop.key == key && Self::cond_function(cmp, &prop.value, value)? {
                        matched = true;
                        break;
                    }
                }
                if matched {
                    kept.push(node);
                }
            }
            nodes = kept;
        }
        Ok(nodes)
    }

    /// Select relationships by optional label and an optional
    /// `(key, value, cmp)` property filter. Same index-first strategy as
    /// [`GraphEngine::select_nodes`].
    pub fn select_relationships(
        &mut self,
        label: Option<&str>,
        filter: Option<(&Scalar, &Scalar, &str)>,
    ) -> Result<Vec<Relationship>> {
        self.ensure_consistent()?;

        if let Some((key, value, "=")) = filter {
            let mut rels: Vec<Relationship> = self
                .equality_candidates(key, value)
                .into_iter()
                .filter_map(|owner| match owner {
                    ObjectRef::Relationship(id) => self.graph.as_ref()?.relationships.get(&id).cloned(),
                    ObjectRef::Node(_) => None,
                })
                .filter(|rel| rel.properties.iter().any(|p| &p.key == key && &p.value == value))
                .collect();
            if let Some(name) = label {
                let allowed = self.rel_labels.get(name).cloned().unwrap_or_default();
                rels.retain(|r| allowed.contains(&r.id));
            }
            return Ok(rels);
        }

        let mut rels: Vec<Relationship> = match label {
            Some(name) => {
                let ids = self.rel_labels.get(name).cloned().unwrap_or_default();
                ids.into_iter()
                    .filter_map(|id| self.graph.as_ref()?.relationships.get(&id).cloned())
                    .collect()
            }
            None => self
                .graph
                .as_ref()
                .map(|g| g.relationships.values().cloned().collect())
                .unwrap_or_default(),
        };
        if let Some((key, value, cmp)) = filter {
            let mut kept = Vec::new();
            for rel in rels.drain(..) {
                let mut matched = false;
                for prop in &rel.properties {
                    if &prop.key == key && Self::cond_function(cmp, &prop.value, value)? {
                        matched = true;
                        break;
                    }
                }
                if matched {
                    kept.push(rel);
                }
            }
            rels = kept;
        }
        Ok(rels)
    }

    /// Select a label by id, rehydrating it from disk if uncached.
    pub fn select_label(&mut self, id: i32) -> Result<Label> {
        if let Some(label) = self.graph.as_ref().and_then(|g| g.labels.get(&id)) {
            return Ok(label.clone());
        }
        self.collect_label(id)
    }

    /// Every cached label, after ensuring the graph is consistent.
    pub fn select_labels(&mut self) -> Result<Vec<Label>> {
        self.ensure_consistent()?;
        Ok(self.graph.as_ref().map(|g| g.labels.values().cloned().collect()).unwrap_or_default())
    }

    /// All nodes followed by all relationships.
    pub fn select_graph_objects(&mut self) -> Result<Vec<GraphObject>> {
        self.ensure_consistent()?;
        let nodes = self.select_nodes(None, None)?;
        let rels = self.select_relationships(None, None)?;
        Ok(nodes
            .into_iter()
            .map(GraphObject::Node)
            .chain(rels.into_iter().map(GraphObject::Relationship))
            .collect())
    }

    /// Tombstone a node, cascade-deleting every incident relationship.
    pub fn delete_node(&mut self, id: i32) -> Result<Node> {
        let mut node = self.select_node(id)?;
        node.used = false;

        // Snapshot before removing the node from the cache: incident_relationship_ids
        // walks the chain starting from graph.nodes[id], which removal would erase.
        let rel_ids = self.incident_relationship_ids(id);

        if let Some(label) = self.graph.as_ref().and_then(|g| g.labels.get(&node.label_id)).cloned() {
            if let Some(bucket) = self.node_labels.get_mut(&label.name) {
                bucket.retain(|&n| n != id);
            }
        }
        self.graph_mut().nodes.remove(&id);

        for rel_id in rel_ids {
            if self
                .graph
                .as_ref()
                .map(|g| g.relationships.get(&rel_id).map(|r| r.used).unwrap_or(false))
                .unwrap_or(false)
            {
                self.delete_relationship(rel_id)?;
            }
        }

        self.io.write_node(
            id,
            NodeData {
                in_use: false,
                next_rel: node.next_rel,
                next_prop: node.next_prop,
                label_id: node.label_id,
            },
            true,
        )?;
        Ok(node)
    }

    fn incident_relationship_ids(&self, node_id: i32) -> Vec<i32> {
        let Some(graph) = self.graph.as_ref() else {
            return Vec::new();
        };
        let Some(node) = graph.nodes.get(&node_id) else {
            return Vec::new();
        };
        let mut ids = Vec::new();
        let mut current = node.next_rel;
        while current != INVALID_ID {
            let Some(rel) = graph.relationships.get(&current) else {
                break;
            };
            ids.push(current);
            current = if rel.from == node_id { rel.from_next } else { rel.to_next };
        }
        ids
    }

    /// Tombstone a relationship and patch all four neighbour pointers so
    /// both endpoints' incidence chains skip over it.
    pub fn delete_relationship(&mut self, id: i32) -> Result<Relationship> {
        let mut rel = self.select_relationship(id)?;
        rel.used = false;

        if let Some(label) = self.graph.as_ref().and_then(|g| g.labels.get(&rel.label_id)).cloned() {
            if let Some(bucket) = self.rel_labels.get_mut(&label.name) {
                bucket.retain(|&r| r != id);
            }
        }
        self.graph_mut().relationships.remove(&id);

        self.relink_neighbour(rel.from, rel.from_prev, rel.from_next)?;
        self.relink_neighbour(rel.to, rel.to_prev, rel.to_next)?;

        self.io.write_relationship(
            id,
            RelationshipData {
                in_use: false,
                from: rel.from,
                to: rel.to,
                label_id: rel.label_id,
                from_next: INVALID_ID,
                to_next: INVALID_ID,
                from_prev: INVALID_ID,
                to_prev: INVALID_ID,
                next_prop: rel.next_prop,
            },
            true,
        )?;
        Ok(rel)
    }

    /// Patch the neighbour on one side of a deleted relationship: if a
    /// prior relationship exists on this side, point its "next" at our
    /// "next"; else this was the endpoint's first relationship, so point
    /// the node's `next_rel` at our "next" directly.
    fn relink_neighbour(&mut self, node_id: i32, prev_id: i32, next_id: i32) -> Result<()> {
        if prev_id != INVALID_ID {
            let mut prev = self.io.read_relationship(prev_id)?;
            if prev.from == node_id {
                prev.from_next = next_id;
            } else {
                prev.to_next = next_id;
            }
            self.io.write_relationship(prev_id, prev, true)?;
            if let Some(graph) = self.graph.as_mut() {
                if let Some(r) = graph.relationships.get_mut(&prev_id) {
                    if r.from == node_id {
                        r.from_next = next_id;
                    } else {
                        r.to_next = next_id;
                    }
                }
            }
        } else {
            let mut node = self.io.read_node(node_id)?;
            node.next_rel = next_id;
            self.io.write_node(node_id, node, true)?;
            if let Some(graph) = self.graph.as_mut() {
                if let Some(n) = graph.nodes.get_mut(&node_id) {
                    n.next_rel = next_id;
                }
            }
        }
        if next_id != INVALID_ID {
            let mut next = self.io.read_relationship(next_id)?;
            if next.from == node_id {
                next.from_prev = prev_id;
            } else {
                next.to_prev = prev_id;
            }
            self.io.write_relationship(next_id, next, true)?;
            if let Some(graph) = self.graph.as_mut() {
                if let Some(r) = graph.relationships.get_mut(&next_id) {
                    if r.from == node_id {
                        r.from_prev = prev_id;
                    } else {
                        r.to_prev = prev_id;
                    }
                }
            }
        }
        Ok(())
    }
}

fn scalar_as_f64(scalar: &Scalar) -> Option<f64> {
    match scalar {
        Scalar::Int(i) => Some(*i as f64),
        Scalar::Float(f) => Some(*f),
        Scalar::String(s) => s.parse::<f64>().ok(),
        Scalar::Bool(_) => None,
    }
}
