//! `StoreSet`: the five record stores (node, relationship, label, property,
//! dynamic) that make up one worker instance's on-disk footprint.

use crate::codec::{dynamic_size, label_size, node_size, property_size, relationship_size};
use crate::config::StoreFlags;
use crate::error::{Error, Result};
use crate::record::{RecordFile, RecordIo};
use std::path::{Path, PathBuf};

const NODE_FILE: &str = "node_storage.db";
const RELATIONSHIP_FILE: &str = "relationship_storage.db";
const LABEL_FILE: &str = "label_storage.db";
const PROPERTY_FILE: &str = "property_storage.db";
const DYNAMIC_FILE: &str = "dynamic_storage.db";

/// Name of the on-disk directory for worker `n`, e.g. `worker_instance_0`.
pub fn worker_instance_dir(db_path: &Path, n: u32) -> PathBuf {
    db_path.join(format!("worker_instance_{n}"))
}

/// One record store, gated by whether its kind is enabled in config.
///
/// A disabled store is represented as `None`; any operation that reaches it
/// is a configuration error, raised eagerly rather than silently no-op'd.
pub struct GatedStore<T: RecordIo> {
    inner: Option<T>,
    kind: &'static str,
}

impl<T: RecordIo> GatedStore<T> {
    fn new(inner: Option<T>, kind: &'static str) -> Self {
        Self { inner, kind }
    }

    /// Borrow the underlying store, or fail with `Error::Storage` if this
    /// kind is disabled.
    pub fn get_mut(&mut self) -> Result<&mut T> {
        self.inner.as_mut().ok_or_else(|| {
            Error::storage(format!("store kind '{}' is disabled in config", self.kind))
        })
    }

    /// Whether this store kind is enabled.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

/// The five record stores backing one worker instance.
pub struct StoreSet {
    pub node: GatedStore<RecordFile>,
    pub relationship: GatedStore<RecordFile>,
    pub label: GatedStore<RecordFile>,
    pub property: GatedStore<RecordFile>,
    pub dynamic: GatedStore<RecordFile>,
}

impl StoreSet {
    /// Open (creating as needed) all enabled stores under `worker_dir`.
    pub fn open(worker_dir: &Path, flags: StoreFlags) -> Result<Self> {
        std::fs::create_dir_all(worker_dir)?;

        let open_if = |enabled: bool, file_name: &str, record_size: usize| -> Result<Option<RecordFile>> {
            if !enabled {
                return Ok(None);
            }
            Ok(Some(RecordFile::open(worker_dir.join(file_name), record_size)?))
        };

        Ok(Self {
            node: GatedStore::new(open_if(flags.node, NODE_FILE, node_size())?, "node"),
            relationship: GatedStore::new(
                open_if(flags.relationship, RELATIONSHIP_FILE, relationship_size())?,
                "relationship",
            ),
            label: GatedStore::new(open_if(flags.label, LABEL_FILE, label_size())?, "label"),
            property: GatedStore::new(
                open_if(flags.property, PROPERTY_FILE, property_size())?,
                "property",
            ),
            dynamic: GatedStore::new(open_if(flags.dynamic, DYNAMIC_FILE, dynamic_size())?, "dynamic"),
        })
    }

    /// Flush every enabled store, collecting the first error encountered
    /// but still attempting every store.
    pub fn flush_all(&mut self) -> Result<()> {
        let mut first_err = None;
        for result in [
            self.node.inner.as_mut().map(RecordIo::flush),
            self.relationship.inner.as_mut().map(RecordIo::flush),
            self.label.inner.as_mut().map(RecordIo::flush),
            self.property.inner.as_mut().map(RecordIo::flush),
            self.dynamic.inner.as_mut().map(RecordIo::flush),
        ] {
            if let Some(Err(e)) = result {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Counts of records in every enabled store (`None` for disabled ones).
    pub fn stats(&mut self) -> Result<StoreStats> {
        Ok(StoreStats {
            nodes: self.node.get_mut().ok().map(|s| s.count_records()).transpose()?,
            relationships: self
                .relationship
                .get_mut()
                .ok()
                .map(|s| s.count_records())
                .transpose()?,
            labels: self.label.get_mut().ok().map(|s| s.count_records()).transpose()?,
            properties: self
                .property
                .get_mut()
                .ok()
                .map(|s| s.count_records())
                .transpose()?,
            dynamic_chunks: self
                .dynamic
                .get_mut()
                .ok()
                .map(|s| s.count_records())
                .transpose()?,
        })
    }
}

/// Per-store record counts, used both for logging and as the "next free id"
/// source when allocating new records.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStats {
    pub nodes: Option<i32>,
    pub relationships: Option<i32>,
    pub labels: Option<i32>,
    pub properties: Option<i32>,
    pub dynamic_chunks: Option<i32>,
}

impl StoreStats {
    /// Whether every enabled store reports zero records.
    pub fn is_empty(&self) -> bool {
        [
            self.nodes,
            self.relationships,
            self.labels,
            self.properties,
            self.dynamic_chunks,
        ]
        .into_iter()
        .flatten()
        .all(|n| n == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_worker_dir_and_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let worker_dir = worker_instance_dir(dir.path(), 0);
        let mut stores = StoreSet::open(&worker_dir, StoreFlags::default()).unwrap();
        assert!(worker_dir.join(NODE_FILE).exists());
        assert!(worker_dir.join(DYNAMIC_FILE).exists());
        let stats = stores.stats().unwrap();
        assert_eq!(stats.nodes, Some(0));
        assert!(stats.is_empty());
    }

    #[test]
    fn disabled_store_is_gated() {
        let dir = tempfile::tempdir().unwrap();
        let worker_dir = worker_instance_dir(dir.path(), 0);
        let flags = StoreFlags {
            property: false,
            ..StoreFlags::default()
        };
        let mut stores = StoreSet::open(&worker_dir, flags).unwrap();
        assert!(!worker_dir.join(PROPERTY_FILE).exists());
        let err = stores.property.get_mut().unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        let stats = stores.stats().unwrap();
        assert_eq!(stats.properties, None);
    }

    #[test]
    fn reopen_preserves_counts() {
        let dir = tempfile::tempdir().unwrap();
        let worker_dir = worker_instance_dir(dir.path(), 0);
        {
            let mut stores = StoreSet::open(&worker_dir, StoreFlags::default()).unwrap();
            stores.node.get_mut().unwrap().allocate_record().unwrap();
            stores.flush_all().unwrap();
        }
        let mut reopened = StoreSet::open(&worker_dir, StoreFlags::default()).unwrap();
        assert_eq!(reopened.stats().unwrap().nodes, Some(1));
    }
}
