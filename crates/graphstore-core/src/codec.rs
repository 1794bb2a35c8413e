//! Stateless encode/decode functions for the five record kinds, plus the
//! scalar promotion rules used by dynamic (property value) payloads.
//!
//! Layouts (all integers big-endian, signed; booleans are one byte, `0` or
//! `1`; `INVALID_ID` (`-1`) marks an absent pointer):
//!
//! | kind         | bytes | layout                                               |
//! |--------------|-------|-------------------------------------------------------|
//! | Node         | 13    | in_use:1 next_rel:4 next_prop:4 label_id:4             |
//! | Relationship | 33    | in_use:1 from:4 to:4 label_id:4 from_next:4 to_next:4 from_prev:4 to_prev:4 next_prop:4 |
//! | Label        | 5     | in_use:1 name_id:4                                     |
//! | Property     | 13    | in_use:1 key_id:4 value_id:4 next_prop:4 scalar_tag:1 (see below) |
//! | Dynamic      | 32    | payload_len:1 payload:27 next_chunk_id:4               |
//!
//! Property's 13-byte layout packs `in_use`, `key_id`, `value_id`,
//! `next_prop` identically to Node's shape, plus a trailing scalar-tag byte
//! folded into the final `next_prop` field's high byte is avoided: the tag
//! is carried in the dynamic chunk reassembly, not the property record
//! itself (see [`decode_scalar`]).

use crate::error::{Error, Result};
use crate::record::{Record, INVALID_ID};

const NODE_SIZE: usize = 13;
const RELATIONSHIP_SIZE: usize = 33;
const LABEL_SIZE: usize = 5;
const PROPERTY_SIZE: usize = 13;
const DYNAMIC_SIZE: usize = 32;
const DYNAMIC_PAYLOAD_SIZE: usize = 27;

/// Byte size of a node record.
pub fn node_size() -> usize {
    NODE_SIZE
}
/// Byte size of a relationship record.
pub fn relationship_size() -> usize {
    RELATIONSHIP_SIZE
}
/// Byte size of a label record.
pub fn label_size() -> usize {
    LABEL_SIZE
}
/// Byte size of a property record.
pub fn property_size() -> usize {
    PROPERTY_SIZE
}
/// Byte size of a dynamic chunk record.
pub fn dynamic_size() -> usize {
    DYNAMIC_SIZE
}

fn read_i32(bytes: &[u8]) -> i32 {
    i32::from_be_bytes(bytes.try_into().expect("4-byte slice"))
}

fn read_bool(byte: &[u8]) -> bool {
    byte[0] != 0
}

/// Decoded node record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeData {
    pub in_use: bool,
    pub next_rel: i32,
    pub next_prop: i32,
    pub label_id: i32,
}

/// Encode node fields into a zeroed record at `idx`.
pub fn encode_node(idx: i32, data: NodeData) -> Record {
    let mut r = Record::zeroed(idx, NODE_SIZE);
    r.write_at(0, &[data.in_use as u8]);
    r.write_at(1, &data.next_rel.to_be_bytes());
    r.write_at(5, &data.next_prop.to_be_bytes());
    r.write_at(9, &data.label_id.to_be_bytes());
    r
}

/// Decode a node record's bytes.
pub fn decode_node(record: &Record) -> Result<NodeData> {
    if record.size() != NODE_SIZE {
        return Err(Error::corrupt_store(format!(
            "node record has {} bytes, expected {NODE_SIZE}",
            record.size()
        )));
    }
    Ok(NodeData {
        in_use: read_bool(record.read_at(0, 1)),
        next_rel: read_i32(record.read_at(1, 4)),
        next_prop: read_i32(record.read_at(5, 4)),
        label_id: read_i32(record.read_at(9, 4)),
    })
}

/// Decoded relationship record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipData {
    pub in_use: bool,
    pub from: i32,
    pub to: i32,
    pub label_id: i32,
    pub from_next: i32,
    pub to_next: i32,
    pub from_prev: i32,
    pub to_prev: i32,
    pub next_prop: i32,
}

/// Encode relationship fields into a zeroed record at `idx`.
pub fn encode_relationship(idx: i32, data: RelationshipData) -> Record {
    let mut r = Record::zeroed(idx, RELATIONSHIP_SIZE);
    r.write_at(0, &[data.in_use as u8]);
    r.write_at(1, &data.from.to_be_bytes());
    r.write_at(5, &data.to.to_be_bytes());
    r.write_at(9, &data.label_id.to_be_bytes());
    r.write_at(13, &data.from_next.to_be_bytes());
    r.write_at(17, &data.to_next.to_be_bytes());
    r.write_at(21, &data.from_prev.to_be_bytes());
    r.write_at(25, &data.to_prev.to_be_bytes());
    r.write_at(29, &data.next_prop.to_be_bytes());
    r
}

/// Decode a relationship record's bytes.
pub fn decode_relationship(record: &Record) -> Result<RelationshipData> {
    if record.size() != RELATIONSHIP_SIZE {
        return Err(Error::corrupt_store(format!(
            "relationship record has {} bytes, expected {RELATIONSHIP_SIZE}",
            record.size()
        )));
    }
    Ok(RelationshipData {
        in_use: read_bool(record.read_at(0, 1)),
        from: read_i32(record.read_at(1, 4)),
        to: read_i32(record.read_at(5, 4)),
        label_id: read_i32(record.read_at(9, 4)),
        from_next: read_i32(record.read_at(13, 4)),
        to_next: read_i32(record.read_at(17, 4)),
        from_prev: read_i32(record.read_at(21, 4)),
        to_prev: read_i32(record.read_at(25, 4)),
        next_prop: read_i32(record.read_at(29, 4)),
    })
}

/// Decoded label record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelData {
    pub in_use: bool,
    pub name_id: i32,
}

/// Encode label fields into a zeroed record at `idx`.
pub fn encode_label(idx: i32, data: LabelData) -> Record {
    let mut r = Record::zeroed(idx, LABEL_SIZE);
    r.write_at(0, &[data.in_use as u8]);
    r.write_at(1, &data.name_id.to_be_bytes());
    r
}

/// Decode a label record's bytes.
pub fn decode_label(record: &Record) -> Result<LabelData> {
    if record.size() != LABEL_SIZE {
        return Err(Error::corrupt_store(format!(
            "label record has {} bytes, expected {LABEL_SIZE}",
            record.size()
        )));
    }
    Ok(LabelData {
        in_use: read_bool(record.read_at(0, 1)),
        name_id: read_i32(record.read_at(1, 4)),
    })
}

/// Decoded property record fields. `key_id`/`value_id` point at the first
/// dynamic chunk of the key name and the encoded scalar value respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyData {
    pub in_use: bool,
    pub key_id: i32,
    pub value_id: i32,
    pub next_prop: i32,
}

/// Encode property fields into a zeroed record at `idx`.
pub fn encode_property(idx: i32, data: PropertyData) -> Record {
    let mut r = Record::zeroed(idx, PROPERTY_SIZE);
    r.write_at(0, &[data.in_use as u8]);
    r.write_at(1, &data.key_id.to_be_bytes());
    r.write_at(5, &data.value_id.to_be_bytes());
    r.write_at(9, &data.next_prop.to_be_bytes());
    r
}

/// Decode a property record's bytes.
pub fn decode_property(record: &Record) -> Result<PropertyData> {
    if record.size() != PROPERTY_SIZE {
        return Err(Error::corrupt_store(format!(
            "property record has {} bytes, expected {PROPERTY_SIZE}",
            record.size()
        )));
    }
    Ok(PropertyData {
        in_use: read_bool(record.read_at(0, 1)),
        key_id: read_i32(record.read_at(1, 4)),
        value_id: read_i32(record.read_at(5, 4)),
        next_prop: read_i32(record.read_at(9, 4)),
    })
}

/// One chunk of a dynamic (variable-length) payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicData {
    pub payload_len: u8,
    pub payload: [u8; DYNAMIC_PAYLOAD_SIZE],
    pub next_chunk_id: i32,
}

/// Encode one dynamic chunk into a zeroed record at `idx`.
pub fn encode_dynamic(idx: i32, data: DynamicData) -> Record {
    let mut r = Record::zeroed(idx, DYNAMIC_SIZE);
    r.write_at(0, &[data.payload_len]);
    r.write_at(1, &data.payload);
    r.write_at(28, &data.next_chunk_id.to_be_bytes());
    r
}

/// Decode one dynamic chunk's bytes.
pub fn decode_dynamic(record: &Record) -> Result<DynamicData> {
    if record.size() != DYNAMIC_SIZE {
        return Err(Error::corrupt_store(format!(
            "dynamic record has {} bytes, expected {DYNAMIC_SIZE}",
            record.size()
        )));
    }
    let payload_len = record.read_at(0, 1)[0];
    if payload_len as usize > DYNAMIC_PAYLOAD_SIZE {
        return Err(Error::corrupt_store(format!(
            "dynamic chunk payload_len {payload_len} exceeds {DYNAMIC_PAYLOAD_SIZE}"
        )));
    }
    let mut payload = [0u8; DYNAMIC_PAYLOAD_SIZE];
    payload.copy_from_slice(record.read_at(1, DYNAMIC_PAYLOAD_SIZE));
    Ok(DynamicData {
        payload_len,
        payload,
        next_chunk_id: read_i32(record.read_at(28, 4)),
    })
}

/// Split raw bytes into dynamic chunk payloads, each at most
/// [`DYNAMIC_PAYLOAD_SIZE`] bytes. The empty input still produces one
/// (empty) chunk, since every scalar occupies at least one dynamic record.
pub fn chunk_payload(bytes: &[u8]) -> Vec<&[u8]> {
    if bytes.is_empty() {
        return vec![&[]];
    }
    bytes.chunks(DYNAMIC_PAYLOAD_SIZE).collect()
}

/// A property value, tagged by type. Scalars are serialized to bytes for
/// dynamic-chunk storage and reassembled by type-promotion on read.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Serialize to the bytes stored across dynamic chunks.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Scalar::Bool(true) => b"True".to_vec(),
            Scalar::Bool(false) => b"False".to_vec(),
            Scalar::Int(v) => v.to_string().into_bytes(),
            Scalar::Float(v) => v.to_string().into_bytes(),
            Scalar::String(s) => s.clone().into_bytes(),
        }
    }
}

/// Reassembled dynamic-chunk bytes, promoted in order: the literal tokens
/// `"True"`/`"False"` become [`Scalar::Bool`]; else a valid `i64` literal
/// becomes [`Scalar::Int`]; else a valid `f64` literal becomes
/// [`Scalar::Float`]; otherwise the raw UTF-8 text becomes [`Scalar::String`].
pub fn decode_scalar(bytes: &[u8]) -> Result<Scalar> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::corrupt_store(format!("dynamic payload is not valid UTF-8: {e}")))?;
    if text == "True" {
        return Ok(Scalar::Bool(true));
    }
    if text == "False" {
        return Ok(Scalar::Bool(false));
    }
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Scalar::Int(i));
    }
    if let Ok(f) = text.parse::<f64>() {
        return Ok(Scalar::Float(f));
    }
    Ok(Scalar::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_roundtrips() {
        let data = NodeData {
            in_use: true,
            next_rel: 5,
            next_prop: INVALID_ID,
            label_id: 2,
        };
        let record = encode_node(0, data);
        assert_eq!(decode_node(&record).unwrap(), data);
    }

    #[test]
    fn relationship_roundtrips() {
        let data = RelationshipData {
            in_use: true,
            from: 1,
            to: 2,
            label_id: 3,
            from_next: INVALID_ID,
            to_next: INVALID_ID,
            from_prev: INVALID_ID,
            to_prev: INVALID_ID,
            next_prop: INVALID_ID,
        };
        let record = encode_relationship(0, data);
        assert_eq!(record.size(), RELATIONSHIP_SIZE);
        assert_eq!(decode_relationship(&record).unwrap(), data);
    }

    #[test]
    fn label_roundtrips() {
        let data = LabelData {
            in_use: true,
            name_id: 7,
        };
        let record = encode_label(0, data);
        assert_eq!(decode_label(&record).unwrap(), data);
    }

    #[test]
    fn property_roundtrips() {
        let data = PropertyData {
            in_use: true,
            key_id: 4,
            value_id: 9,
            next_prop: INVALID_ID,
        };
        let record = encode_property(0, data);
        assert_eq!(decode_property(&record).unwrap(), data);
    }

    #[test]
    fn dynamic_chunk_roundtrips() {
        let mut payload = [0u8; DYNAMIC_PAYLOAD_SIZE];
        payload[..5].copy_from_slice(b"hello");
        let data = DynamicData {
            payload_len: 5,
            payload,
            next_chunk_id: INVALID_ID,
        };
        let record = encode_dynamic(0, data);
        assert_eq!(decode_dynamic(&record).unwrap(), data);
    }

    #[test]
    fn chunk_payload_splits_long_strings() {
        let bytes = vec![b'x'; 60];
        let chunks = chunk_payload(&bytes);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 27);
        assert_eq!(chunks[1].len(), 27);
        assert_eq!(chunks[2].len(), 6);
    }

    #[test]
    fn chunk_payload_empty_is_one_chunk() {
        let chunks = chunk_payload(&[]);
        assert_eq!(chunks, vec![&[] as &[u8]]);
    }

    #[test]
    fn scalar_promotion_order() {
        assert_eq!(decode_scalar(b"True").unwrap(), Scalar::Bool(true));
        assert_eq!(decode_scalar(b"False").unwrap(), Scalar::Bool(false));
        assert_eq!(decode_scalar(b"42").unwrap(), Scalar::Int(42));
        assert_eq!(decode_scalar(b"-7").unwrap(), Scalar::Int(-7));
        assert_eq!(decode_scalar(b"3.14").unwrap(), Scalar::Float(3.14));
        assert_eq!(
            decode_scalar(b"hello").unwrap(),
            Scalar::String("hello".to_string())
        );
    }

    #[test]
    fn scalar_to_bytes_matches_decode() {
        for scalar in [
            Scalar::Bool(true),
            Scalar::Bool(false),
            Scalar::Int(123),
            Scalar::Float(1.5),
            Scalar::String("abc".to_string()),
        ] {
            let bytes = scalar.to_bytes();
            assert_eq!(decode_scalar(&bytes).unwrap(), scalar);
        }
    }
}
