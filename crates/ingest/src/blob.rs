//! Blob naming and storage.
//!
//! Originals and thumbnails share a bucket and a file name, and differ only
//! in the key prefix. References are written as `s3://{bucket}/{key}` and are
//! what the index stores and callers pass back.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

pub const BLOB_SCHEME: &str = "s3://";

/// A `(bucket, key)` pair addressing one blob.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlobRef {
    pub bucket: String,
    pub key: String,
}

impl BlobRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BLOB_SCHEME}{}/{}", self.bucket, self.key)
    }
}

impl FromStr for BlobRef {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_blob_url(s)
    }
}

/// `"{prefix}/{user_id}/{file_name}"`, with stray slashes on the prefix removed.
pub fn object_key(prefix: &str, user_id: &str, file_name: &str) -> String {
    format!("{}/{user_id}/{file_name}", prefix.trim_matches('/'))
}

/// Splits `s3://bucket/key` (scheme optional) into a [`BlobRef`].
///
/// ```rust
/// use ingest::parse_blob_url;
///
/// let blob = parse_blob_url("s3://snaptag/thumbnails/alice/cat.jpg").unwrap();
/// assert_eq!(blob.bucket, "snaptag");
/// assert_eq!(blob.key, "thumbnails/alice/cat.jpg");
/// assert!(parse_blob_url("s3://bucket-only").is_err());
/// ```
pub fn parse_blob_url(url: &str) -> Result<BlobRef, IngestError> {
    let trimmed = url.trim();
    let rest = trimmed.strip_prefix(BLOB_SCHEME).unwrap_or(trimmed);
    match rest.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.trim_matches('/').is_empty() => {
            Ok(BlobRef::new(bucket, key))
        }
        _ => Err(IngestError::InvalidBlobUrl(url.to_string())),
    }
}

/// Object storage for originals and thumbnails.
///
/// Deleting a missing object is not an error.
pub trait BlobStore: Send + Sync {
    fn put(&self, blob: &BlobRef, bytes: &[u8]) -> Result<(), IngestError>;
    fn get(&self, blob: &BlobRef) -> Result<Option<Vec<u8>>, IngestError>;
    fn delete(&self, blob: &BlobRef) -> Result<(), IngestError>;
}

/// Process-local blob store used in tests and single-node deployments.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<BTreeMap<BlobRef, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, blob: &BlobRef) -> bool {
        self.objects
            .read()
            .map(|map| map.contains_key(blob))
            .unwrap_or(false)
    }
}

fn poisoned<T>(_: T) -> IngestError {
    IngestError::Blob("blob store lock poisoned".into())
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, blob: &BlobRef, bytes: &[u8]) -> Result<(), IngestError> {
        self.objects
            .write()
            .map_err(poisoned)?
            .insert(blob.clone(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, blob: &BlobRef) -> Result<Option<Vec<u8>>, IngestError> {
        Ok(self.objects.read().map_err(poisoned)?.get(blob).cloned())
    }

    fn delete(&self, blob: &BlobRef) -> Result<(), IngestError> {
        self.objects.write().map_err(poisoned)?.remove(blob);
        Ok(())
    }
}
