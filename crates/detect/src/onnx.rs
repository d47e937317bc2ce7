use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::network::DetectionNetwork;
use crate::preprocess::InputBlob;
use crate::yolo::RawOutput;
use crate::DetectError;

/// YOLO model executed with ONNX Runtime.
///
/// Every output head is read as rows of its last dimension and the heads are
/// concatenated, so both single-output exports and multi-scale exports work.
pub struct OnnxNetwork {
    session: Mutex<Session>,
    model: String,
}

impl OnnxNetwork {
    pub fn load(path: &Path) -> Result<Self, DetectError> {
        if !path.exists() {
            return Err(DetectError::ModelNotFound(path.display().to_string()));
        }
        let session = Session::builder()?.commit_from_file(path)?;
        info!(model = %path.display(), "onnx detection model loaded");
        Ok(Self {
            session: Mutex::new(session),
            model: path.display().to_string(),
        })
    }
}

impl DetectionNetwork for OnnxNetwork {
    fn name(&self) -> &str {
        &self.model
    }

    fn infer(&self, blob: &InputBlob) -> Result<RawOutput, DetectError> {
        let input = Tensor::from_array((blob.shape(), blob.data.clone()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectError::Inference("session lock poisoned".into()))?;
        let outputs = session.run(ort::inputs![input])?;

        let mut combined = RawOutput::default();
        for (name, value) in outputs.iter() {
            let (shape, data) = value.try_extract_tensor::<f32>()?;
            let stride = shape.last().copied().unwrap_or(0);
            if stride <= 0 {
                return Err(DetectError::InvalidOutput {
                    expected: "a non-empty last dimension".into(),
                    got: format!("{name}: {shape:?}"),
                });
            }
            combined.extend(RawOutput::new(stride as usize, data.to_vec())?)?;
        }
        Ok(combined)
    }
}
