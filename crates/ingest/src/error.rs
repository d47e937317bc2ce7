//! Error types produced by the ingest crate.
//!
//! Everything except [`Blob`](IngestError::Blob) describes bad input and maps
//! to a 4xx response; blob store failures are the server's problem.
//!
//! ```rust
//! use ingest::IngestError;
//!
//! fn to_http_status(error: &IngestError) -> u16 {
//!     error.http_status_code()
//! }
//!
//! assert_eq!(to_http_status(&IngestError::PayloadTooLarge("big".into())), 413);
//! assert_eq!(to_http_status(&IngestError::MissingPayload), 400);
//! ```
use thiserror::Error;

/// Errors that can occur while accepting an upload or talking to blob storage.
///
/// Marked `#[non_exhaustive]`; include a catch-all arm when matching.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// The upload carried no image data, or it decoded to zero bytes.
    #[error("missing image payload")]
    MissingPayload,

    /// User id or file name unusable after sanitization.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// The payload was not valid base64.
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),

    /// The bytes are not an image format we can decode.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Raw payload exceeds
    /// [`IngestConfig::max_payload_bytes`](crate::IngestConfig::max_payload_bytes).
    #[error("payload exceeds size limit: {0}")]
    PayloadTooLarge(String),

    /// Thumbnail encoding failed.
    #[error("thumbnail generation failed: {0}")]
    Thumbnail(String),

    /// A blob reference that is not of the form `s3://bucket/key`.
    #[error("invalid blob reference: {0}")]
    InvalidBlobUrl(String),

    /// The blob store rejected a read, write, or delete.
    #[error("blob store error: {0}")]
    Blob(String),
}

impl IngestError {
    /// True when the caller sent something we cannot accept.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, IngestError::Blob(_) | IngestError::Thumbnail(_))
    }

    /// Suggested HTTP status code.
    ///
    /// ```rust
    /// use ingest::IngestError;
    ///
    /// assert_eq!(IngestError::Blob("down".into()).http_status_code(), 502);
    /// assert_eq!(IngestError::InvalidBase64("bad".into()).http_status_code(), 400);
    /// ```
    pub fn http_status_code(&self) -> u16 {
        match self {
            IngestError::PayloadTooLarge(_) => 413,
            IngestError::Blob(_) => 502,
            IngestError::Thumbnail(_) => 500,
            _ => 400,
        }
    }
}

impl From<image::ImageError> for IngestError {
    fn from(err: image::ImageError) -> Self {
        IngestError::InvalidImage(err.to_string())
    }
}

impl From<base64::DecodeError> for IngestError {
    fn from(err: base64::DecodeError) -> Self {
        IngestError::InvalidBase64(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_4xx() {
        for err in [
            IngestError::MissingPayload,
            IngestError::InvalidMetadata("user_id empty".into()),
            IngestError::InvalidBase64("x".into()),
            IngestError::InvalidImage("x".into()),
            IngestError::InvalidBlobUrl("x".into()),
        ] {
            assert!(err.is_client_error());
            assert_eq!(err.http_status_code(), 400);
        }
        assert!(!IngestError::Blob("x".into()).is_client_error());
    }

    #[test]
    fn base64_errors_convert() {
        use base64::Engine;
        let err: IngestError = base64::engine::general_purpose::STANDARD
            .decode("!!!")
            .unwrap_err()
            .into();
        assert!(matches!(err, IngestError::InvalidBase64(_)));
    }
}
