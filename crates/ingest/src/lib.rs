//! Snaptag Ingest Layer
//!
//! Uploads enter the system here. We take a user id, an optional file name,
//! and base64 image data, check all of it, decode the image, render a
//! thumbnail, and work out where both blobs live.
//!
//! ## What we do here
//!
//! - **Sanitize metadata** - strip control characters, reject blank user ids,
//!   reduce file names to a basename, generate `{uuid}.jpg` when none is given
//! - **Decode payloads** - base64 (data URLs accepted), size limits, image
//!   format sniffing
//! - **Thumbnail** - longest side to 150 px, JPEG quality 90
//! - **Name blobs** - `s3://{bucket}/{prefix}/{user}/{file}` for both
//!
//! [`ingest`] is pure; writing blobs is the caller's job through a
//! [`BlobStore`].
//!
//! ## Example
//!
//! ```
//! use std::io::Cursor;
//! use image::{DynamicImage, ImageFormat, RgbImage};
//! use ingest::{ingest, ImagePayload, IngestConfig, UploadRequest};
//!
//! let mut png = Vec::new();
//! DynamicImage::ImageRgb8(RgbImage::new(300, 200))
//!     .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
//!     .unwrap();
//!
//! let request = UploadRequest::new("alice", ImagePayload::Bytes(png)).with_file_name("cat.png");
//! let upload = ingest(request, &IngestConfig::default()).unwrap();
//!
//! assert_eq!(upload.image_url(), "s3://snaptag/images/alice/cat.png");
//! assert_eq!(upload.thumbnail_url(), "s3://snaptag/thumbnails/alice/cat.png");
//! assert_eq!((upload.thumbnail_width, upload.thumbnail_height), (150, 100));
//! ```
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn, Level};

mod blob;
mod config;
mod error;
mod metadata;
mod payload;
mod thumbnail;
mod types;

use crate::metadata::normalize_metadata;
use crate::payload::decode_image;

pub use crate::blob::{
    object_key, parse_blob_url, BlobRef, BlobStore, InMemoryBlobStore, BLOB_SCHEME,
};
pub use crate::config::{ConfigError, IngestConfig};
pub use crate::error::IngestError;
pub use crate::payload::{decode_base64, decode_payload};
pub use crate::thumbnail::{make_thumbnail, thumbnail_dimensions, Thumbnail};
pub use crate::types::{ImagePayload, IngestedImage, UploadRequest};

/// Validate an upload, decode it, and build its thumbnail and blob references.
pub fn ingest(request: UploadRequest, cfg: &IngestConfig) -> Result<IngestedImage, IngestError> {
    let start = Instant::now();
    let UploadRequest {
        user_id,
        file_name,
        payload,
        received_at,
    } = request;

    let user_hint = user_id.clone();
    let meta = match normalize_metadata(user_id, file_name, cfg) {
        Ok(meta) => meta,
        Err(err) => {
            let elapsed_micros = start.elapsed().as_micros();
            warn!(user_id = ?user_hint, error = %err, elapsed_micros, "ingest_failure");
            return Err(err);
        }
    };

    let span = tracing::span!(
        Level::INFO,
        "ingest.upload",
        user_id = %meta.user_id,
        file_name = %meta.file_name
    );
    let _guard = span.enter();

    let result = decode_payload(payload, cfg).and_then(|original| {
        let image = decode_image(&original)?;
        let thumb = make_thumbnail(&image, cfg.thumbnail_max_side, cfg.jpeg_quality)?;
        Ok((original, image, thumb))
    });

    match result {
        Ok((original, image, thumb)) => {
            let image_ref = BlobRef::new(
                cfg.bucket.as_str(),
                object_key(&cfg.images_prefix, &meta.user_id, &meta.file_name),
            );
            let thumbnail_ref = BlobRef::new(
                cfg.bucket.as_str(),
                object_key(&cfg.thumbnails_prefix, &meta.user_id, &meta.file_name),
            );
            let elapsed_micros = start.elapsed().as_micros();
            info!(
                image_url = %image_ref,
                original_len = original.len(),
                thumbnail_len = thumb.jpeg.len(),
                elapsed_micros,
                "ingest_success"
            );
            Ok(IngestedImage {
                user_id: meta.user_id,
                file_name: meta.file_name,
                image_ref,
                thumbnail_ref,
                original,
                thumbnail: thumb.jpeg,
                width: image.width(),
                height: image.height(),
                thumbnail_width: thumb.width,
                thumbnail_height: thumb.height,
                received_at: received_at.unwrap_or_else(Utc::now),
                image,
            })
        }
        Err(err) => {
            let elapsed_micros = start.elapsed().as_micros();
            warn!(error = %err, elapsed_micros, "ingest_failure");
            Err(err)
        }
    }
}
