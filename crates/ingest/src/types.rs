//! Core data types for upload ingest.
//!
//! - [`UploadRequest`]: what a caller hands us
//! - [`ImagePayload`]: the image bytes, base64 or raw
//! - [`IngestedImage`]: the validated, decoded upload with its thumbnail and
//!   blob locations, ready to be written and tagged
//!
//! ```rust
//! use ingest::{ImagePayload, UploadRequest};
//!
//! let request = UploadRequest::new("alice", ImagePayload::Base64("aGk=".into()))
//!     .with_file_name("cat.jpg");
//! assert_eq!(request.file_name.as_deref(), Some("cat.jpg"));
//! ```
use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::blob::BlobRef;

/// A single image upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Owner of the upload. Required.
    pub user_id: String,
    /// Caller-supplied file name. A random `{uuid}.jpg` is used when absent.
    #[serde(default)]
    pub file_name: Option<String>,
    /// Encoded image content.
    #[serde(default)]
    pub payload: Option<ImagePayload>,
    /// Defaults to the time of ingest.
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

impl UploadRequest {
    pub fn new(user_id: impl Into<String>, payload: ImagePayload) -> Self {
        Self {
            user_id: user_id.into(),
            file_name: None,
            payload: Some(payload),
            received_at: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_received_at(mut self, at: DateTime<Utc>) -> Self {
        self.received_at = Some(at);
        self
    }
}

/// Image content as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePayload {
    /// Standard base64, optionally with a `data:image/...;base64,` prefix.
    Base64(String),
    /// Already-decoded bytes.
    Bytes(Vec<u8>),
}

impl ImagePayload {
    /// Length of the payload as received, before base64 decoding.
    pub fn raw_len(&self) -> usize {
        match self {
            ImagePayload::Base64(s) => s.len(),
            ImagePayload::Bytes(b) => b.len(),
        }
    }
}

/// A validated upload.
///
/// `image` is the decoded original; detection runs on it directly so the
/// bytes are only decoded once.
#[derive(Debug, Clone)]
pub struct IngestedImage {
    pub user_id: String,
    pub file_name: String,
    pub image_ref: BlobRef,
    pub thumbnail_ref: BlobRef,
    /// Original bytes, written unchanged.
    pub original: Vec<u8>,
    /// JPEG-encoded thumbnail.
    pub thumbnail: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub received_at: DateTime<Utc>,
    pub image: DynamicImage,
}

impl IngestedImage {
    /// `s3://bucket/key` of the original.
    pub fn image_url(&self) -> String {
        self.image_ref.to_string()
    }

    /// `s3://bucket/key` of the thumbnail.
    pub fn thumbnail_url(&self) -> String {
        self.thumbnail_ref.to_string()
    }
}
