use crate::preprocess::InputBlob;
use crate::yolo::RawOutput;
use crate::DetectError;

/// A loaded detection model: blob in, YOLO rows out.
///
/// Implementations must be shareable across request threads.
pub trait DetectionNetwork: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    fn infer(&self, blob: &InputBlob) -> Result<RawOutput, DetectError>;
}
