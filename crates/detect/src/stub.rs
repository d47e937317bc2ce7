use crate::network::DetectionNetwork;
use crate::preprocess::InputBlob;
use crate::yolo::{RawOutput, ROW_PREFIX};
use crate::DetectError;

/// Network that ignores its input and replays a fixed set of rows.
///
/// Used when no model is configured or the model cannot be loaded (it then
/// reports nothing), and by tests to script exact detections.
#[derive(Debug, Clone)]
pub struct FixedNetwork {
    num_classes: usize,
    rows: Vec<f32>,
}

impl FixedNetwork {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            rows: Vec::new(),
        }
    }

    /// A network that never detects anything.
    pub fn empty() -> Self {
        Self::new(1)
    }

    /// Script one box, in fractions of the image, scoring `score` for `class_id` only.
    pub fn with_box(
        mut self,
        class_id: usize,
        score: f32,
        (cx, cy, w, h): (f32, f32, f32, f32),
    ) -> Self {
        let mut scores = vec![0f32; self.num_classes];
        if let Some(slot) = scores.get_mut(class_id) {
            *slot = score;
        }
        self.rows.extend([cx, cy, w, h, score]);
        self.rows.extend(scores);
        self
    }
}

impl DetectionNetwork for FixedNetwork {
    fn name(&self) -> &str {
        "fixed"
    }

    fn infer(&self, _blob: &InputBlob) -> Result<RawOutput, DetectError> {
        if self.rows.is_empty() {
            return Ok(RawOutput::default());
        }
        RawOutput::new(ROW_PREFIX + self.num_classes, self.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob() -> InputBlob {
        InputBlob {
            size: 32,
            data: vec![0.0; 3 * 32 * 32],
        }
    }

    #[test]
    fn empty_network_reports_nothing() {
        let out = FixedNetwork::empty().infer(&blob()).unwrap();
        assert_eq!(out.num_rows(), 0);
    }

    #[test]
    fn scripted_rows_come_back() {
        let net = FixedNetwork::new(3)
            .with_box(2, 0.9, (0.5, 0.5, 0.1, 0.1))
            .with_box(0, 0.4, (0.2, 0.2, 0.1, 0.1));
        let out = net.infer(&blob()).unwrap();
        assert_eq!(out.stride(), 8);
        assert_eq!(out.num_rows(), 2);
        let first: Vec<&[f32]> = out.rows().collect();
        assert_eq!(first[0][ROW_PREFIX + 2], 0.9);
    }
}
