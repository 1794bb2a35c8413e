//! IO layer: owns the [`StoreSet`], allocates identifiers, and implements
//! record write semantics plus dynamic-chunk scalar read/write.
//!
//! Grounded in `original_source/fs/io_engine.py`'s `IOEngine`: every public
//! write funnels through one internal `write_record_to` helper parameterized
//! by `update`, matching `_insert_node`/`_insert_relationship`/
//! `_insert_label`/`_insert_property` all delegating to a single method.

use crate::codec::{
    self, DynamicData, LabelData, NodeData, PropertyData, RelationshipData, Scalar,
};
use crate::error::{Error, Result};
use crate::record::{Record, RecordIo, INVALID_ID};
use crate::store::{StoreSet, StoreStats};

/// Which store a record write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Node,
    Relationship,
    Label,
    Property,
    Dynamic,
}

/// The five-store IO layer: identifier allocation, record writes, and
/// dynamic-chunk scalar encoding.
pub struct IoLayer {
    stores: StoreSet,
}

impl IoLayer {
    /// Take ownership of an already-opened store set.
    pub fn new(stores: StoreSet) -> Self {
        Self { stores }
    }

    /// Borrow the underlying store set.
    pub fn stores(&mut self) -> &mut StoreSet {
        &mut self.stores
    }

    /// Current record count per store.
    pub fn get_stats(&mut self) -> Result<StoreStats> {
        self.stores.stats()
    }

    fn record_io(&mut self, kind: StoreKind) -> Result<&mut dyn RecordIo> {
        Ok(match kind {
            StoreKind::Node => self.stores.node.get_mut()?,
            StoreKind::Relationship => self.stores.relationship.get_mut()?,
            StoreKind::Label => self.stores.label.get_mut()?,
            StoreKind::Property => self.stores.property.get_mut()?,
            StoreKind::Dynamic => self.stores.dynamic.get_mut()?,
        })
    }

    /// Write `record` to `kind`'s store.
    ///
    /// `update = false`: requires `record.idx() == count_records()`, then
    /// allocates and writes at the new index. `update = true`: writes in
    /// place without extending the file.
    pub fn write_record_to(&mut self, kind: StoreKind, record: &Record, update: bool) -> Result<()> {
        let io = self.record_io(kind)?;
        if update {
            io.write_record(record)
        } else {
            let count = io.count_records()?;
            if record.idx() != count {
                return Err(Error::invalid_argument(format!(
                    "insert id {} does not match store count {count}",
                    record.idx()
                )));
            }
            io.allocate_record()?;
            io.write_record(record)
        }
    }

    /// Next free id for `kind`'s store, i.e. its current record count.
    pub fn next_id(&mut self, kind: StoreKind) -> Result<i32> {
        self.record_io(kind)?.count_records()
    }

    /// Read a node record by id.
    pub fn read_node(&mut self, id: i32) -> Result<NodeData> {
        let record = self.stores.node.get_mut()?.read_record(id)?;
        codec::decode_node(&record)
    }

    /// Insert (`update=false`) or overwrite (`update=true`) a node record.
    pub fn write_node(&mut self, id: i32, data: NodeData, update: bool) -> Result<()> {
        let record = codec::encode_node(id, data);
        self.write_record_to(StoreKind::Node, &record, update)
    }

    /// Read a relationship record by id.
    pub fn read_relationship(&mut self, id: i32) -> Result<RelationshipData> {
        let record = self.stores.relationship.get_mut()?.read_record(id)?;
        codec::decode_relationship(&record)
    }

    /// Insert or overwrite a relationship record.
    pub fn write_relationship(&mut self, id: i32, data: RelationshipData, update: bool) -> Result<()> {
        let record = codec::encode_relationship(id, data);
        self.write_record_to(StoreKind::Relationship, &record, update)
    }

    /// Read a label record by id.
    pub fn read_label(&mut self, id: i32) -> Result<LabelData> {
        let record = self.stores.label.get_mut()?.read_record(id)?;
        codec::decode_label(&record)
    }

    /// Insert or overwrite a label record.
    pub fn write_label(&mut self, id: i32, data: LabelData, update: bool) -> Result<()> {
        let record = codec::encode_label(id, data);
        self.write_record_to(StoreKind::Label, &record, update)
    }

    /// Read a property record by id.
    pub fn read_property(&mut self, id: i32) -> Result<PropertyData> {
        let record = self.stores.property.get_mut()?.read_record(id)?;
        codec::decode_property(&record)
    }

    /// Insert or overwrite a property record.
    ///
    /// On `update = true`, callers that are changing the property's key or
    /// value should go through [`IoLayer::update_property_value`] instead,
    /// which implements the read-old/compare/rewrite-only-what-changed
    /// subtlety. This method only rewrites the fixed-size fields
    /// (`next_prop_id` relinking) and leaves `key_id`/`value_id` untouched
    /// unless the caller has already decided they changed.
    pub fn write_property(&mut self, id: i32, data: PropertyData, update: bool) -> Result<()> {
        let record = codec::encode_property(id, data);
        self.write_record_to(StoreKind::Property, &record, update)
    }

    /// Write a scalar as a chain of dynamic chunks starting at `first_id`.
    /// `first_id` must equal the Dynamic store's current record count;
    /// each subsequent chunk is allocated in turn, so the store's count
    /// advances by the number of chunks produced.
    pub fn write_dynamic(&mut self, scalar: &Scalar, first_id: i32) -> Result<()> {
        let bytes = scalar.to_bytes();
        let chunks = codec::chunk_payload(&bytes);
        let io = self.stores.dynamic.get_mut()?;
        let count = io.count_records()?;
        if first_id != count {
            return Err(Error::invalid_argument(format!(
                "dynamic first_id {first_id} does not match store count {count}"
            )));
        }
        for (offset, chunk) in chunks.iter().enumerate() {
            let idx = first_id + offset as i32;
            let next_chunk_id = if offset + 1 < chunks.len() {
                first_id + offset as i32 + 1
            } else {
                INVALID_ID
            };
            let mut payload = [0u8; 27];
            payload[..chunk.len()].copy_from_slice(chunk);
            let data = DynamicData {
                payload_len: chunk.len() as u8,
                payload,
                next_chunk_id,
            };
            let record = codec::encode_dynamic(idx, data);
            io.allocate_record()?;
            io.write_record(&record)?;
        }
        Ok(())
    }

    /// Reassemble the scalar chain starting at `id`, following
    /// `next_chunk_id` pointers until `INVALID_ID`, then promote the
    /// concatenated bytes to a [`Scalar`].
    pub fn build_dynamic(&mut self, id: i32) -> Result<Scalar> {
        let io = self.stores.dynamic.get_mut()?;
        let mut bytes = Vec::new();
        let mut next = id;
        loop {
            if next == INVALID_ID {
                break;
            }
            let record = io.read_record(next)?;
            let chunk = codec::decode_dynamic(&record)?;
            bytes.extend_from_slice(&chunk.payload[..chunk.payload_len as usize]);
            next = chunk.next_chunk_id;
        }
        codec::decode_scalar(&bytes)
    }

    /// Update an existing property's key/value, rewriting fresh dynamic
    /// chunks only for the field(s) that actually changed.
    ///
    /// Reads the old property record to recover its current `key_id` and
    /// `value_id`, reassembles the old key/value scalars, and compares
    /// against `new_key`/`new_value`. If neither changed, no new dynamic
    /// chunks are written and the property record's pointers are left as
    /// they were.
    pub fn update_property_value(
        &mut self,
        property_id: i32,
        new_key: &Scalar,
        new_value: &Scalar,
    ) -> Result<PropertyData> {
        let old = self.read_property(property_id)?;
        let old_key = self.build_dynamic(old.key_id)?;
        let old_value = self.build_dynamic(old.value_id)?;

        let mut key_id = old.key_id;
        let mut value_id = old.value_id;

        if &old_key != new_key {
            key_id = self.next_id(StoreKind::Dynamic)?;
            self.write_dynamic(new_key, key_id)?;
        } else if &old_value != new_value {
            value_id = self.next_id(StoreKind::Dynamic)?;
            self.write_dynamic(new_value, value_id)?;
        }

        let updated = PropertyData {
            in_use: old.in_use,
            key_id,
            value_id,
            next_prop: old.next_prop,
        };
        self.write_property(property_id, updated, true)?;
        Ok(updated)
    }

    /// Flush every enabled store.
    pub fn flush(&mut self) -> Result<()> {
        self.stores.flush_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreFlags;
    use crate::store::{worker_instance_dir, StoreSet};

    fn new_io() -> (tempfile::TempDir, IoLayer) {
        let dir = tempfile::tempdir().unwrap();
        let worker_dir = worker_instance_dir(dir.path(), 0);
        let stores = StoreSet::open(&worker_dir, StoreFlags::default()).unwrap();
        (dir, IoLayer::new(stores))
    }

    #[test]
    fn write_node_insert_requires_matching_id() {
        let (_dir, mut io) = new_io();
        let data = NodeData {
            in_use: true,
            next_rel: INVALID_ID,
            next_prop: INVALID_ID,
            label_id: 0,
        };
        let err = io.write_node(5, data, false).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        io.write_node(0, data, false).unwrap();
        assert_eq!(io.read_node(0).unwrap(), data);
    }

    #[test]
    fn write_node_update_writes_in_place() {
        let (_dir, mut io) = new_io();
        let data = NodeData {
            in_use: true,
            next_rel: INVALID_ID,
            next_prop: INVALID_ID,
            label_id: 0,
        };
        io.write_node(0, data, false).unwrap();
        let updated = NodeData {
            next_rel: 7,
            ..data
        };
        io.write_node(0, updated, true).unwrap();
        assert_eq!(io.read_node(0).unwrap(), updated);
    }

    #[test]
    fn dynamic_roundtrips_short_and_long_values() {
        let (_dir, mut io) = new_io();
        let short = Scalar::String("hi".to_string());
        io.write_dynamic(&short, 0).unwrap();
        assert_eq!(io.build_dynamic(0).unwrap(), short);

        let long = Scalar::String("x".repeat(100));
        let next = io.next_id(StoreKind::Dynamic).unwrap();
        io.write_dynamic(&long, next).unwrap();
        assert_eq!(io.build_dynamic(next).unwrap(), long);
    }

    #[test]
    fn property_update_rewrites_only_changed_field() {
        let (_dir, mut io) = new_io();
        let key = Scalar::String("Age".to_string());
        let value = Scalar::String("18".to_string());
        io.write_dynamic(&key, 0).unwrap();
        io.write_dynamic(&value, 1).unwrap();
        let prop = PropertyData {
            in_use: true,
            key_id: 0,
            value_id: 1,
            next_prop: INVALID_ID,
        };
        io.write_property(0, prop, false).unwrap();

        let unchanged = io
            .update_property_value(0, &key, &value)
            .unwrap();
        assert_eq!(unchanged.key_id, 0);
        assert_eq!(unchanged.value_id, 1);
        assert_eq!(io.next_id(StoreKind::Dynamic).unwrap(), 2);

        let new_value = Scalar::Int(20);
        let changed = io
            .update_property_value(0, &key, &new_value)
            .unwrap();
        assert_eq!(changed.key_id, 0);
        assert_ne!(changed.value_id, 1);
        assert_eq!(io.build_dynamic(changed.value_id).unwrap(), Scalar::Int(20));
    }

    #[test]
    fn get_stats_reflects_writes() {
        let (_dir, mut io) = new_io();
        let data = NodeData {
            in_use: true,
            next_rel: INVALID_ID,
            next_prop: INVALID_ID,
            label_id: 0,
        };
        io.write_node(0, data, false).unwrap();
        io.write_node(1, data, false).unwrap();
        let stats = io.get_stats().unwrap();
        assert_eq!(stats.nodes, Some(2));
    }
}
