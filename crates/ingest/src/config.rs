//! Configuration types for upload ingest.
//!
//! [`IngestConfig`] controls where uploads and their thumbnails are named in
//! blob storage, how thumbnails are produced, and how much input is accepted.
//! It is cheap to clone and deserializes from JSON or YAML.
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig::default();
//! config.validate().expect("defaults are valid");
//! assert_eq!(config.thumbnail_max_side, 150);
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime configuration for upload ingest.
///
/// ```json
/// {
///   "version": 1,
///   "bucket": "snaptag",
///   "images_prefix": "images",
///   "thumbnails_prefix": "thumbnails",
///   "thumbnail_max_side": 150,
///   "jpeg_quality": 90,
///   "max_payload_bytes": 10485760,
///   "strip_control_chars": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Version of the ingest configuration.
    ///
    /// Default: `1`
    pub version: u32,

    /// Bucket that holds both originals and thumbnails.
    ///
    /// Default: `"snaptag"`
    pub bucket: String,

    /// Key prefix for original uploads.
    ///
    /// Default: `"images"`
    pub images_prefix: String,

    /// Key prefix for generated thumbnails.
    ///
    /// Default: `"thumbnails"`
    pub thumbnails_prefix: String,

    /// Length in pixels of the longest thumbnail side. Aspect ratio is kept.
    ///
    /// Default: `150`
    pub thumbnail_max_side: u32,

    /// JPEG quality used when encoding thumbnails, 1..=100.
    ///
    /// Default: `90`
    pub jpeg_quality: u8,

    /// Maximum decoded image size in bytes.
    ///
    /// Uploads over this limit are rejected with
    /// [`IngestError::PayloadTooLarge`](crate::IngestError::PayloadTooLarge)
    /// before any image decoding happens.
    ///
    /// Default: `None` (unlimited)
    pub max_payload_bytes: Option<usize>,

    /// Whether to strip control characters from user ids and file names.
    ///
    /// Default: `true`
    pub strip_control_chars: bool,
}

/// Errors that can occur when validating an [`IngestConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A bucket or key prefix is blank or contains a path separator where one
    /// is not allowed.
    #[error("invalid blob naming for {field}: {value:?}")]
    InvalidNaming {
        /// Name of the offending field.
        field: &'static str,
        /// Configured value.
        value: String,
    },

    /// `thumbnail_max_side` is zero.
    #[error("thumbnail_max_side must be greater than zero")]
    ZeroThumbnailSide,

    /// `jpeg_quality` outside 1..=100.
    #[error("jpeg_quality must be within 1..=100, got {0}")]
    InvalidJpegQuality(u8),
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version: 1,
            bucket: "snaptag".into(),
            images_prefix: "images".into(),
            thumbnails_prefix: "thumbnails".into(),
            thumbnail_max_side: 150,
            jpeg_quality: 90,
            max_payload_bytes: None,
            strip_control_chars: true,
        }
    }
}

impl IngestConfig {
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_thumbnail_max_side(mut self, side: u32) -> Self {
        self.thumbnail_max_side = side;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = Some(limit);
        self
    }

    /// Checks internal consistency. Call once at start-up.
    ///
    /// ```rust
    /// use ingest::{ConfigError, IngestConfig};
    ///
    /// let bad = IngestConfig::default().with_jpeg_quality(0);
    /// assert_eq!(bad.validate(), Err(ConfigError::InvalidJpegQuality(0)));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() || self.bucket.contains('/') {
            return Err(ConfigError::InvalidNaming {
                field: "bucket",
                value: self.bucket.clone(),
            });
        }
        for (field, value) in [
            ("images_prefix", &self.images_prefix),
            ("thumbnails_prefix", &self.thumbnails_prefix),
        ] {
            if value.trim_matches('/').trim().is_empty() {
                return Err(ConfigError::InvalidNaming {
                    field,
                    value: value.clone(),
                });
            }
        }
        if self.images_prefix.trim_matches('/') == self.thumbnails_prefix.trim_matches('/') {
            return Err(ConfigError::InvalidNaming {
                field: "thumbnails_prefix",
                value: self.thumbnails_prefix.clone(),
            });
        }
        if self.thumbnail_max_side == 0 {
            return Err(ConfigError::ZeroThumbnailSide);
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidJpegQuality(self.jpeg_quality));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(IngestConfig::default().validate().is_ok());
    }

    #[test]
    fn blank_bucket_rejected() {
        let cfg = IngestConfig::default().with_bucket("  ");
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidNaming { field: "bucket", .. })
        ));
    }

    #[test]
    fn shared_prefix_rejected() {
        let cfg = IngestConfig {
            thumbnails_prefix: "images/".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_thumbnail_side_rejected() {
        let cfg = IngestConfig::default().with_thumbnail_max_side(0);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroThumbnailSide));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: IngestConfig = serde_json::from_str(r#"{"bucket":"photos"}"#).unwrap();
        assert_eq!(cfg.bucket, "photos");
        assert_eq!(cfg.jpeg_quality, 90);
        assert!(cfg.strip_control_chars);
    }
}
