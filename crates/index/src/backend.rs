use crate::IndexError;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Visitor over `(key, value)` pairs yielded by a prefix scan.
pub type EntryVisitor<'a> = dyn FnMut(&str, &[u8]) -> Result<(), IndexError> + 'a;

/// Ordered key-value storage underneath the record index.
///
/// Keys must come back from [`scan_prefix`](IndexBackend::scan_prefix) in
/// ascending byte order; search result ordering depends on it.
pub trait IndexBackend: Send + Sync {
    /// Insert or update a key-value pair.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError>;
    /// Retrieve a value by key.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError>;
    /// Delete a key-value pair. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), IndexError>;
    /// Insert or update multiple key-value pairs in one write.
    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError>;
    /// Visit every entry whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str, visitor: &mut EntryVisitor<'_>) -> Result<(), IndexError>;
    /// Flush any buffered writes.
    fn flush(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

/// Configuration for selecting and building a backend.
///
/// # Example
/// ```
/// use index::BackendConfig;
///
/// // In-memory (for testing)
/// let config = BackendConfig::in_memory();
///
/// // Redb (pure Rust, on disk)
/// let config = BackendConfig::redb("/data/snaptag.redb");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// Redb file at `path`. Requires the `backend-redb` feature (on by default).
    Redb { path: String },
    /// Process-local ordered map. Contents vanish with the process.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    /// Build the backend this configuration names.
    pub fn build(&self) -> Result<Box<dyn IndexBackend>, IndexError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(IndexError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

/// An in-memory backend using a `RwLock` around a `BTreeMap`.
pub struct InMemoryBackend {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBackend for InMemoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        self.records
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let guard = self
            .records
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        Ok(guard.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), IndexError> {
        self.records
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .remove(key);
        Ok(())
    }

    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError> {
        // One write lock for the whole batch.
        let mut guard = self
            .records
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        for (key, value) in entries {
            guard.insert(key, value);
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str, visitor: &mut EntryVisitor<'_>) -> Result<(), IndexError> {
        // The read lock is held for the duration of the scan.
        let guard = self
            .records
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        for (key, value) in guard
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
        {
            visitor(key, value)?;
        }
        Ok(())
    }
}

/// Redb backend: pure Rust, ACID, single file.
#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use redb::RedbBackend;

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(backend: &dyn IndexBackend, prefix: &str) -> Vec<String> {
        let mut keys = Vec::new();
        backend
            .scan_prefix(prefix, &mut |key, _| {
                keys.push(key.to_string());
                Ok(())
            })
            .unwrap();
        keys
    }

    #[test]
    fn in_memory_roundtrip_and_delete() {
        let backend = InMemoryBackend::new();
        backend.put("k1", b"v1").unwrap();
        assert_eq!(backend.get("k1").unwrap(), Some(b"v1".to_vec()));
        backend.delete("k1").unwrap();
        assert_eq!(backend.get("k1").unwrap(), None);
        backend.delete("k1").unwrap();
    }

    #[test]
    fn in_memory_prefix_scan_is_ordered_and_bounded() {
        let backend = InMemoryBackend::new();
        backend
            .batch_put(vec![
                ("a/2".into(), vec![2]),
                ("a/1".into(), vec![1]),
                ("ab/1".into(), vec![3]),
                ("b/1".into(), vec![4]),
            ])
            .unwrap();
        assert_eq!(collect(&backend, "a/"), vec!["a/1", "a/2"]);
        assert_eq!(collect(&backend, "a"), vec!["a/1", "a/2", "ab/1"]);
        assert!(collect(&backend, "c").is_empty());
    }

    #[test]
    fn visitor_errors_stop_the_scan() {
        let backend = InMemoryBackend::new();
        backend.put("a/1", b"x").unwrap();
        backend.put("a/2", b"y").unwrap();
        let mut seen = 0;
        let result = backend.scan_prefix("a/", &mut |_, _| {
            seen += 1;
            Err(IndexError::Decode("bad".into()))
        });
        assert!(result.is_err());
        assert_eq!(seen, 1);
    }

    #[test]
    fn default_config_builds_in_memory() {
        let backend = BackendConfig::default().build().unwrap();
        backend.put("x", b"1").unwrap();
        assert_eq!(backend.get("x").unwrap(), Some(b"1".to_vec()));
    }
}
