//! Thumbnail generation.
//!
//! The longest side is scaled to `thumbnail_max_side`; the other side keeps
//! the aspect ratio, truncated, never below one pixel. Square and portrait
//! images scale by height. Output is always JPEG.
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::IngestError;

/// An encoded thumbnail and its dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

/// Target dimensions for a `width` x `height` image.
///
/// ```rust
/// use ingest::thumbnail_dimensions;
///
/// assert_eq!(thumbnail_dimensions(640, 480, 150), (150, 112));
/// assert_eq!(thumbnail_dimensions(480, 640, 150), (112, 150));
/// assert_eq!(thumbnail_dimensions(300, 300, 150), (150, 150));
/// ```
pub fn thumbnail_dimensions(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (max_side, max_side);
    }
    if height >= width {
        let ratio = f64::from(max_side) / f64::from(height);
        let scaled = (f64::from(width) * ratio) as u32;
        (scaled.max(1), max_side)
    } else {
        let ratio = f64::from(max_side) / f64::from(width);
        let scaled = (f64::from(height) * ratio) as u32;
        (max_side, scaled.max(1))
    }
}

/// Resizes `image` and encodes it as JPEG at `quality`.
pub fn make_thumbnail(
    image: &DynamicImage,
    max_side: u32,
    quality: u8,
) -> Result<Thumbnail, IngestError> {
    let (width, height) = thumbnail_dimensions(image.width(), image.height(), max_side);
    let resized = image.resize_exact(width, height, FilterType::Triangle).to_rgb8();

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), quality);
    encoder
        .encode_image(&resized)
        .map_err(|err| IngestError::Thumbnail(err.to_string()))?;

    Ok(Thumbnail {
        width,
        height,
        jpeg,
    })
}
