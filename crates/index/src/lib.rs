//! # Snaptag Index
//!
//! Persistence for tagged image records and per-user tag subscriptions.
//!
//! Records are keyed by `(user_id, thumbnail_url)`, serialized with bincode,
//! optionally compressed with Zstd, and written through a pluggable
//! [`IndexBackend`]. Tag sets are stored in their textual token form, so a
//! record written today decodes with the same codec older data used.
//!
//! Writes replace the whole record. There is no versioning: two writers
//! racing on the same record leave whichever wrote last.
//!
//! ```
//! use index::{BackendConfig, ImageRecord, IndexConfig, RecordIndex};
//! use tags::TagSet;
//!
//! let cfg = IndexConfig::new().with_backend(BackendConfig::in_memory());
//! let index = RecordIndex::new(cfg).unwrap();
//! let tags = TagSet::from_labels(["dog"]).unwrap();
//! index.put_image(&ImageRecord::new("alice", "thumb-1", "image-1", tags)).unwrap();
//!
//! let found = index.get_image("alice", "thumb-1").unwrap().unwrap();
//! assert_eq!(found.tags.get("dog"), Some(1));
//! ```

mod backend;
mod record;

pub use backend::{BackendConfig, EntryVisitor, InMemoryBackend, IndexBackend};
#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use record::{ImageRecord, SubscriptionRecord, INDEX_SCHEMA_VERSION};

use bincode::config::standard;
use bincode::error::{DecodeError, EncodeError};
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tags::SubscriptionSet;
use thiserror::Error;
use tracing::debug;
use zstd::{decode_all, encode_all};

use crate::record::{all_images_prefix, image_key, subscription_key, user_images_prefix};

/// Compression codec options for stored records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CompressionCodec {
    /// No compression (useful for debugging).
    None,
    /// Zstd compression (default).
    #[default]
    Zstd,
}

/// Compression behavior configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Zstd level, 1-22.
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(encode_all(data, self.level)?),
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(decode_all(data)?),
        }
    }
}

/// Config for initializing the index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexConfig {
    pub backend: BackendConfig,
    pub compression: CompressionConfig,
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }
}

/// Index failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization encode error: {0}")]
    Encode(String),
    #[error("serialization decode error: {0}")]
    Decode(String),
    #[error("compression error: {0}")]
    Zstd(String),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Zstd(e.to_string())
    }
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Record store for image records and subscriptions.
pub struct RecordIndex {
    backend: Box<dyn IndexBackend>,
    cfg: IndexConfig,
}

impl RecordIndex {
    /// Open the index on the configured backend.
    pub fn new(cfg: IndexConfig) -> Result<Self, IndexError> {
        let backend = cfg.backend.build()?;
        Ok(Self::with_backend(cfg, backend))
    }

    /// Build an index over a caller-supplied backend.
    pub fn with_backend(cfg: IndexConfig, backend: Box<dyn IndexBackend>) -> Self {
        Self { backend, cfg }
    }

    /// Insert or replace a record.
    pub fn put_image(&self, record: &ImageRecord) -> Result<(), IndexError> {
        let payload = self.encode(record)?;
        debug!(
            user_id = %record.user_id,
            thumbnail = %record.thumbnail_url,
            tags = record.tags.len(),
            "image record stored"
        );
        self.backend.put(&record.key(), &payload)
    }

    /// Insert or replace several records in one backend write.
    pub fn put_images(&self, records: &[ImageRecord]) -> Result<(), IndexError> {
        let entries = records
            .iter()
            .map(|rec| -> Result<(String, Vec<u8>), IndexError> {
                Ok((rec.key(), self.encode(rec)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.backend.batch_put(entries)
    }

    pub fn get_image(
        &self,
        user_id: &str,
        thumbnail_url: &str,
    ) -> Result<Option<ImageRecord>, IndexError> {
        match self.backend.get(&image_key(user_id, thumbnail_url))? {
            Some(data) => Ok(Some(self.decode(&data)?)),
            None => Ok(None),
        }
    }

    /// Remove a record. Removing a missing record is not an error.
    pub fn delete_image(&self, user_id: &str, thumbnail_url: &str) -> Result<(), IndexError> {
        self.backend.delete(&image_key(user_id, thumbnail_url))
    }

    /// Visit a user's records ordered by thumbnail reference.
    pub fn scan_user_images(
        &self,
        user_id: &str,
        visitor: &mut dyn FnMut(&ImageRecord) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        self.backend
            .scan_prefix(&user_images_prefix(user_id), &mut |_, data| {
                let record: ImageRecord = self.decode(data)?;
                visitor(&record)
            })
    }

    /// A user's records ordered by thumbnail reference.
    pub fn images_for_user(&self, user_id: &str) -> Result<Vec<ImageRecord>, IndexError> {
        let mut records = Vec::new();
        self.scan_user_images(user_id, &mut |record| {
            records.push(record.clone());
            Ok(())
        })?;
        Ok(records)
    }

    /// Number of image records across all users.
    pub fn image_count(&self) -> Result<usize, IndexError> {
        let mut count = 0;
        self.backend
            .scan_prefix(&all_images_prefix(), &mut |_, _| {
                count += 1;
                Ok(())
            })?;
        Ok(count)
    }

    /// A user's subscriptions; empty when they never subscribed.
    pub fn get_subscriptions(&self, user_id: &str) -> Result<SubscriptionSet, IndexError> {
        match self.backend.get(&subscription_key(user_id))? {
            Some(data) => {
                let record: SubscriptionRecord = self.decode(&data)?;
                Ok(record.tags)
            }
            None => Ok(SubscriptionSet::new()),
        }
    }

    /// Replace a user's stored subscriptions.
    pub fn put_subscriptions(
        &self,
        user_id: &str,
        tags: &SubscriptionSet,
    ) -> Result<(), IndexError> {
        let record = SubscriptionRecord {
            schema_version: INDEX_SCHEMA_VERSION,
            user_id: user_id.to_string(),
            tags: tags.clone(),
        };
        let payload = self.encode(&record)?;
        self.backend.put(&subscription_key(user_id), &payload)
    }

    pub fn flush(&self) -> Result<(), IndexError> {
        self.backend.flush()
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, IndexError> {
        let decompressed = self.cfg.compression.decompress(data)?;
        let (value, _) = decode_from_slice(&decompressed, standard())?;
        Ok(value)
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, IndexError> {
        let encoded = encode_to_vec(value, standard())?;
        self.cfg.compression.compress(&encoded)
    }
}
