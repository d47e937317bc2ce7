//! Redb backend for the record index.
//!
//! Redb is a pure Rust embedded key-value store with ACID transactions and
//! no native dependencies. Keys are stored in one table and scanned in key
//! order, which is what gives search results their stable ordering.
//!
//! # Configuration Example
//! ```yaml
//! index:
//!   backend: "redb"
//!   path: "/data/snaptag.redb"
//! ```

use crate::backend::EntryVisitor;
use crate::{IndexBackend, IndexError};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

const RECORDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snaptag_records");

/// Redb-backed persistent storage.
///
/// Every write is its own committed transaction, so a batch of record
/// updates that fails halfway keeps the writes that came before.
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Open or create a database file at `path`.
    ///
    /// ```no_run
    /// use index::RedbBackend;
    ///
    /// let backend = RedbBackend::open("/tmp/snaptag.redb").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let db = Database::create(path).map_err(IndexError::backend)?;

        let write_txn = db.begin_write().map_err(IndexError::backend)?;
        {
            // Opening the table inside a write transaction creates it.
            let _table = write_txn
                .open_table(RECORDS_TABLE)
                .map_err(IndexError::backend)?;
        }
        write_txn.commit().map_err(IndexError::backend)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl IndexBackend for RedbBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write().map_err(IndexError::backend)?;
        {
            let mut table = write_txn
                .open_table(RECORDS_TABLE)
                .map_err(IndexError::backend)?;
            table.insert(key, value).map_err(IndexError::backend)?;
        }
        write_txn.commit().map_err(IndexError::backend)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let read_txn = self.db.begin_read().map_err(IndexError::backend)?;
        let table = read_txn
            .open_table(RECORDS_TABLE)
            .map_err(IndexError::backend)?;

        let value = table.get(key).map_err(IndexError::backend)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn delete(&self, key: &str) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write().map_err(IndexError::backend)?;
        {
            let mut table = write_txn
                .open_table(RECORDS_TABLE)
                .map_err(IndexError::backend)?;
            table.remove(key).map_err(IndexError::backend)?;
        }
        write_txn.commit().map_err(IndexError::backend)?;
        Ok(())
    }

    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write().map_err(IndexError::backend)?;
        {
            let mut table = write_txn
                .open_table(RECORDS_TABLE)
                .map_err(IndexError::backend)?;
            for (key, value) in &entries {
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(IndexError::backend)?;
            }
        }
        write_txn.commit().map_err(IndexError::backend)?;
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str, visitor: &mut EntryVisitor<'_>) -> Result<(), IndexError> {
        let read_txn = self.db.begin_read().map_err(IndexError::backend)?;
        let table = read_txn
            .open_table(RECORDS_TABLE)
            .map_err(IndexError::backend)?;

        for item in table.range(prefix..).map_err(IndexError::backend)? {
            let (key, value) = item.map_err(IndexError::backend)?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            visitor(key, value.value())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_redb_backend_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend.put("img\u{1f}alice\u{1f}t1", b"value1").unwrap();
        assert_eq!(
            backend.get("img\u{1f}alice\u{1f}t1").unwrap(),
            Some(b"value1".to_vec())
        );
        assert_eq!(backend.get("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_redb_backend_delete() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend.put("key1", b"value1").unwrap();
        backend.delete("key1").unwrap();
        assert_eq!(backend.get("key1").unwrap(), None);
    }

    #[test]
    fn test_redb_backend_prefix_scan() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend
            .batch_put(vec![
                ("img/bob/b".to_string(), b"3".to_vec()),
                ("img/alice/b".to_string(), b"2".to_vec()),
                ("img/alice/a".to_string(), b"1".to_vec()),
                ("sub/alice".to_string(), b"4".to_vec()),
            ])
            .unwrap();

        let mut collected = Vec::new();
        backend
            .scan_prefix("img/alice/", &mut |key, value| {
                collected.push((key.to_string(), value.to_vec()));
                Ok(())
            })
            .unwrap();

        assert_eq!(
            collected,
            vec![
                ("img/alice/a".to_string(), b"1".to_vec()),
                ("img/alice/b".to_string(), b"2".to_vec()),
            ]
        );
    }

    #[test]
    fn test_redb_backend_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.redb");
        {
            let backend = RedbBackend::open(&path).unwrap();
            backend.put("key", b"persisted").unwrap();
        }
        let backend = RedbBackend::open(&path).unwrap();
        assert_eq!(backend.get("key").unwrap(), Some(b"persisted".to_vec()));
    }
}
