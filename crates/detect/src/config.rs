use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::DetectError;

/// Runtime configuration for the detection adapter.
///
/// The three thresholds default to the values the tagging pipeline has always
/// used: candidates need confidence above 0.3, overlapping boxes with IoU above
/// 0.1 are suppressed, and only boxes above 0.6 become labels.
///
/// # Example
/// ```
/// use detect::DetectorConfig;
///
/// let cfg = DetectorConfig::default().with_label_threshold(0.75);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    /// `"onnx"` runs the model at [`model_path`](Self::model_path); `"fixed"`
    /// uses a network that reports nothing (tests, dry runs).
    pub mode: String,
    /// YOLO model exported to ONNX.
    pub model_path: PathBuf,
    /// Class names, one per line, indexed by class id.
    pub labels_path: PathBuf,
    /// Square network input side in pixels.
    pub input_size: u32,
    /// Minimum class confidence (exclusive) for a box to become a candidate.
    pub confidence_threshold: f32,
    /// IoU above which the weaker of two overlapping boxes is suppressed.
    pub nms_threshold: f32,
    /// Minimum confidence (exclusive) for a surviving box to yield a label.
    pub label_threshold: f32,
    /// Feed channels as BGR instead of RGB.
    pub swap_rb: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            mode: "onnx".into(),
            model_path: PathBuf::from("./models/yolov3/yolov3.onnx"),
            labels_path: PathBuf::from("./models/yolov3/coco.names"),
            input_size: 416,
            confidence_threshold: 0.3,
            nms_threshold: 0.1,
            label_threshold: 0.6,
            swap_rb: false,
        }
    }
}

impl DetectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for the fixed network; never touches the filesystem for a model.
    pub fn fixed() -> Self {
        Self {
            mode: "fixed".into(),
            ..Self::default()
        }
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_labels_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.labels_path = path.into();
        self
    }

    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_nms_threshold(mut self, threshold: f32) -> Self {
        self.nms_threshold = threshold;
        self
    }

    pub fn with_label_threshold(mut self, threshold: f32) -> Self {
        self.label_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), DetectError> {
        if !matches!(self.mode.as_str(), "onnx" | "fixed") {
            return Err(DetectError::InvalidConfig(format!(
                "mode must be \"onnx\" or \"fixed\", got {:?}",
                self.mode
            )));
        }
        if self.input_size == 0 || self.input_size % 32 != 0 {
            return Err(DetectError::InvalidConfig(format!(
                "input_size must be a positive multiple of 32, got {}",
                self.input_size
            )));
        }
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("nms_threshold", self.nms_threshold),
            ("label_threshold", self.label_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DetectError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_policy() {
        let cfg = DetectorConfig::default();
        assert_eq!(cfg.mode, "onnx");
        assert_eq!(cfg.input_size, 416);
        assert_eq!(cfg.confidence_threshold, 0.3);
        assert_eq!(cfg.nms_threshold, 0.1);
        assert_eq!(cfg.label_threshold, 0.6);
        assert!(!cfg.swap_rb);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(DetectorConfig::default().with_input_size(0).validate().is_err());
        assert!(DetectorConfig::default().with_input_size(400).validate().is_err());
        assert!(DetectorConfig::default()
            .with_label_threshold(1.5)
            .validate()
            .is_err());
        let cfg = DetectorConfig {
            mode: "gpu".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: DetectorConfig =
            serde_json::from_str(r#"{"mode": "fixed", "label_threshold": 0.7}"#).unwrap();
        assert_eq!(cfg.mode, "fixed");
        assert_eq!(cfg.label_threshold, 0.7);
        assert_eq!(cfg.confidence_threshold, 0.3);
    }
}
