//! Payload decoding and size enforcement.
//!
//! ```text
//! ImagePayload
//!      │  strip data-URL prefix, base64 decode
//!      ▼
//! Vec<u8>  ── empty? ── too large? ──▶ image::load_from_memory
//! ```
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::DynamicImage;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::types::ImagePayload;

/// Turns a payload into raw bytes and applies the configured size limit.
pub fn decode_payload(
    payload: Option<ImagePayload>,
    cfg: &IngestConfig,
) -> Result<Vec<u8>, IngestError> {
    let payload = payload.ok_or(IngestError::MissingPayload)?;
    let bytes = match payload {
        ImagePayload::Bytes(bytes) => bytes,
        ImagePayload::Base64(encoded) => decode_base64(&encoded)?,
    };
    if bytes.is_empty() {
        return Err(IngestError::MissingPayload);
    }
    if let Some(limit) = cfg.max_payload_bytes {
        if bytes.len() > limit {
            return Err(IngestError::PayloadTooLarge(format!(
                "image size {} exceeds limit of {limit}",
                bytes.len()
            )));
        }
    }
    Ok(bytes)
}

/// Decodes standard base64, tolerating a `data:...;base64,` prefix and
/// embedded whitespace.
///
/// ```rust
/// use ingest::decode_base64;
///
/// assert_eq!(decode_base64("aGk=").unwrap(), b"hi");
/// assert_eq!(decode_base64("data:image/png;base64,aGk=").unwrap(), b"hi");
/// assert!(decode_base64("not base64!").is_err());
/// ```
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, IngestError> {
    let body = match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(compact.as_bytes())?)
}

/// Decodes image bytes, guessing the format from the content.
pub(crate) fn decode_image(bytes: &[u8]) -> Result<DynamicImage, IngestError> {
    Ok(image::load_from_memory(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_payload_rejected() {
        assert_eq!(
            decode_payload(None, &IngestConfig::default()),
            Err(IngestError::MissingPayload)
        );
    }

    #[test]
    fn empty_payload_rejected() {
        let cfg = IngestConfig::default();
        assert_eq!(
            decode_payload(Some(ImagePayload::Base64(String::new())), &cfg),
            Err(IngestError::MissingPayload)
        );
        assert_eq!(
            decode_payload(Some(ImagePayload::Bytes(Vec::new())), &cfg),
            Err(IngestError::MissingPayload)
        );
    }

    #[test]
    fn size_limit_applies_to_decoded_bytes() {
        let cfg = IngestConfig::default().with_max_payload_bytes(2);
        // "aGk=" decodes to two bytes
        assert!(decode_payload(Some(ImagePayload::Base64("aGk=".into())), &cfg).is_ok());
        let err = decode_payload(Some(ImagePayload::Bytes(vec![0; 3])), &cfg).unwrap_err();
        assert!(matches!(err, IngestError::PayloadTooLarge(_)));
        assert_eq!(err.http_status_code(), 413);
    }

    #[test]
    fn whitespace_in_base64_tolerated() {
        assert_eq!(decode_base64("aG\nk=").unwrap(), b"hi");
    }

    #[test]
    fn garbage_bytes_are_not_an_image() {
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(IngestError::InvalidImage(_))
        ));
    }
}
