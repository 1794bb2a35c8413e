//! graphstore-core: an embedded property graph storage engine.
//!
//! Fixed-size record files back five stores (node, relationship, label,
//! property, dynamic); a stateless codec layer encodes/decodes each record
//! kind; an IO layer funnels every write through one insert-or-update path
//! and reassembles dynamic-chunk scalars; an in-memory [`Graph`] caches
//! entities by id to break the cyclic node/relationship reference graph;
//! and [`GraphEngine`] is the single public surface, rehydrating from disk
//! on demand within a bounded hop budget.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              GraphEngine                  │
//! │   (public API, secondary indexes, BFS     │
//! │    rehydration)                           │
//! └──────────────────┬────────────────────────┘
//!                     │
//! ┌──────────────────┴────────────────────────┐
//! │               IoLayer                      │
//! │  (id allocation, insert/update write path,  │
//! │   dynamic-chunk scalar read/write)         │
//! └──────────────────┬────────────────────────┘
//!                     │
//! ┌──────────────────┴────────────────────────┐
//! │              StoreSet + Codec              │
//! │  (five fixed-size RecordFiles, stateless    │
//! │   encode/decode)                           │
//! └─────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod model;
pub mod record;
pub mod rehydrate;
pub mod store;

pub use codec::Scalar;
pub use config::EngineConfig;
pub use engine::{GraphEngine, GraphObject, ObjectRef};
pub use error::{Error, Result};
pub use model::{Graph, GraphState, Label, Node, Property, Relationship};
pub use record::INVALID_ID;
