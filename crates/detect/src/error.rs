use thiserror::Error;

/// Failures inside the detection adapter.
///
/// Callers that only need labels go through [`Detector::detect`](crate::Detector::detect),
/// which logs these and reports no labels instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectError {
    #[error("invalid detector config: {0}")]
    InvalidConfig(String),
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("labels file unreadable: {0}")]
    Labels(String),
    #[error("image decode failed: {0}")]
    Image(String),
    #[error("inference failure: {0}")]
    Inference(String),
    #[error("unexpected network output: expected {expected}, got {got}")]
    InvalidOutput { expected: String, got: String },
}

impl From<image::ImageError> for DetectError {
    fn from(err: image::ImageError) -> Self {
        DetectError::Image(err.to_string())
    }
}

#[cfg(feature = "onnx")]
impl From<ort::Error> for DetectError {
    fn from(err: ort::Error) -> Self {
        DetectError::Inference(err.to_string())
    }
}
