//! Fixed-size record buffers and the record files that store them.
//!
//! A [`Record`] is a mutable byte slice of exactly `record_size` bytes at a
//! known index. A [`RecordFile`] is a block-aligned file over one record
//! size: `storage_size() % record_size == 0` is checked on open. A
//! [`MemoryRecordFile`] backs the same contract with an in-RAM buffer, for
//! tests and `"memory:"` store paths.

use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Sentinel meaning "absent" for any pointer field in a record.
pub const INVALID_ID: i32 = -1;

/// A fixed-size byte buffer at a known physical index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    idx: i32,
    bytes: Vec<u8>,
}

impl Record {
    /// Build a record from its raw bytes and index.
    pub fn new(idx: i32, bytes: Vec<u8>) -> Self {
        Self { idx, bytes }
    }

    /// Build a zero-filled record of `size` bytes at `idx`.
    pub fn zeroed(idx: i32, size: usize) -> Self {
        Self {
            idx,
            bytes: vec![0u8; size],
        }
    }

    /// Physical index of this record within its store.
    pub fn idx(&self) -> i32 {
        self.idx
    }

    /// Raw bytes of the record.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes in the record.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Write `data` in place starting at `offset`.
    ///
    /// Requires `offset + data.len() <= size()`; panics otherwise, since a
    /// violation is always a codec bug, not a runtime condition.
    pub fn write_at(&mut self, offset: usize, data: &[u8]) {
        let end = offset + data.len();
        assert!(
            end <= self.bytes.len(),
            "record overflow: offset {offset} + {} > {}",
            data.len(),
            self.bytes.len()
        );
        self.bytes[offset..end].copy_from_slice(data);
    }

    /// Read `len` bytes starting at `offset`.
    pub fn read_at(&self, offset: usize, len: usize) -> &[u8] {
        &self.bytes[offset..offset + len]
    }
}

/// A record file of one record kind: allocate, read-at-index,
/// write-at-index, count, flush, close.
pub trait RecordIo {
    /// Size in bytes of every record in this store.
    fn record_size(&self) -> usize;

    /// Number of records currently in the store.
    fn count_records(&mut self) -> Result<i32>;

    /// Read the record at `idx`. Requires `idx < count_records()`.
    fn read_record(&mut self, idx: i32) -> Result<Record>;

    /// Write `record` in place at `record.idx()`. Does not extend the file.
    fn write_record(&mut self, record: &Record) -> Result<()>;

    /// Append a zeroed record; its index equals the previous count.
    fn allocate_record(&mut self) -> Result<Record>;

    /// Flush buffered writes to durable storage.
    fn flush(&mut self) -> Result<()>;
}

/// A block-aligned on-disk record file.
pub struct RecordFile {
    file: File,
    record_size: usize,
}

impl RecordFile {
    /// Open (creating if absent) the record file at `path` with the given
    /// fixed `record_size`.
    pub fn open<P: AsRef<Path>>(path: P, record_size: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;

        let store = Self { file, record_size };
        store.validate_alignment()?;
        Ok(store)
    }

    fn validate_alignment(&self) -> Result<()> {
        let len = self.file.metadata()?.len();
        if len % self.record_size as u64 != 0 {
            return Err(Error::corrupt_store(format!(
                "storage size {len} is not a multiple of record size {}",
                self.record_size
            )));
        }
        Ok(())
    }

    fn storage_size(&mut self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Close the file, flushing pending writes first.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }
}

impl RecordIo for RecordFile {
    fn record_size(&self) -> usize {
        self.record_size
    }

    fn count_records(&mut self) -> Result<i32> {
        Ok((self.storage_size()? / self.record_size as u64) as i32)
    }

    fn read_record(&mut self, idx: i32) -> Result<Record> {
        let count = self.count_records()?;
        if idx < 0 || idx >= count {
            return Err(Error::record_not_found(format!(
                "index {idx} out of range (count = {count})"
            )));
        }
        let mut buf = vec![0u8; self.record_size];
        self.file
            .seek(SeekFrom::Start(idx as u64 * self.record_size as u64))?;
        self.file.read_exact(&mut buf)?;
        Ok(Record::new(idx, buf))
    }

    fn write_record(&mut self, record: &Record) -> Result<()> {
        let count = self.count_records()?;
        if record.idx() < 0 || record.idx() >= count {
            return Err(Error::record_not_found(format!(
                "index {} out of range (count = {count})",
                record.idx()
            )));
        }
        self.file.seek(SeekFrom::Start(
            record.idx() as u64 * self.record_size as u64,
        ))?;
        self.file.write_all(record.bytes())?;
        Ok(())
    }

    fn allocate_record(&mut self) -> Result<Record> {
        let idx = self.count_records()?;
        self.file.seek(SeekFrom::End(0))?;
        let zeros = vec![0u8; self.record_size];
        self.file.write_all(&zeros)?;
        Ok(Record::new(idx, zeros))
    }

    fn flush(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

/// An in-RAM record store with the same contract as [`RecordFile`], used
/// for tests and `"memory:"` paths.
pub struct MemoryRecordFile {
    data: Vec<u8>,
    record_size: usize,
}

impl MemoryRecordFile {
    /// Create an empty in-memory store for records of `record_size` bytes.
    pub fn new(record_size: usize) -> Self {
        Self {
            data: Vec::new(),
            record_size,
        }
    }
}

impl RecordIo for MemoryRecordFile {
    fn record_size(&self) -> usize {
        self.record_size
    }

    fn count_records(&mut self) -> Result<i32> {
        Ok((self.data.len() / self.record_size) as i32)
    }

    fn read_record(&mut self, idx: i32) -> Result<Record> {
        let count = self.count_records()?;
        if idx < 0 || idx >= count {
            return Err(Error::record_not_found(format!(
                "index {idx} out of range (count = {count})"
            )));
        }
        let start = idx as usize * self.record_size;
        let bytes = self.data[start..start + self.record_size].to_vec();
        Ok(Record::new(idx, bytes))
    }

    fn write_record(&mut self, record: &Record) -> Result<()> {
        let count = self.count_records()?;
        if record.idx() < 0 || record.idx() >= count {
            return Err(Error::record_not_found(format!(
                "index {} out of range (count = {count})",
                record.idx()
            )));
        }
        let start = record.idx() as usize * self.record_size;
        self.data[start..start + self.record_size].copy_from_slice(record.bytes());
        Ok(())
    }

    fn allocate_record(&mut self) -> Result<Record> {
        let idx = self.count_records()?;
        self.data.extend(std::iter::repeat(0u8).take(self.record_size));
        Ok(Record::zeroed(idx, self.record_size))
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_then_read_roundtrips() {
        let mut store = MemoryRecordFile::new(8);
        let mut r = store.allocate_record().unwrap();
        assert_eq!(r.idx(), 0);
        r.write_at(0, b"abcdefgh");
        store.write_record(&r).unwrap();

        let read_back = store.read_record(0).unwrap();
        assert_eq!(read_back.bytes(), b"abcdefgh");
        assert_eq!(store.count_records().unwrap(), 1);
    }

    #[test]
    fn read_out_of_range_is_record_not_found() {
        let mut store = MemoryRecordFile::new(4);
        let err = store.read_record(0).unwrap_err();
        assert!(matches!(err, Error::RecordNotFound(_)));
    }

    #[test]
    fn write_does_not_extend() {
        let mut store = MemoryRecordFile::new(4);
        let r = Record::zeroed(0, 4);
        let err = store.write_record(&r).unwrap_err();
        assert!(matches!(err, Error::RecordNotFound(_)));
    }

    #[test]
    fn record_file_roundtrips_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut store = RecordFile::open(&path, 8).unwrap();
        let mut r = store.allocate_record().unwrap();
        r.write_at(0, b"12345678");
        store.write_record(&r).unwrap();
        store.flush().unwrap();
        drop(store);

        let mut reopened = RecordFile::open(&path, 8).unwrap();
        assert_eq!(reopened.count_records().unwrap(), 1);
        assert_eq!(reopened.read_record(0).unwrap().bytes(), b"12345678");
    }

    #[test]
    fn misaligned_file_is_corrupt_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.db");
        std::fs::write(&path, [0u8; 5]).unwrap();
        let err = RecordFile::open(&path, 8).unwrap_err();
        assert!(matches!(err, Error::CorruptStore(_)));
    }
}
