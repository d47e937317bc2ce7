//! Snaptag detection adapter.
//!
//! Wraps a pretrained YOLO network and reduces its raw boxes to the set of
//! class names present in an image:
//!
//! 1. The image is stretched to a square blob (416 px by default) scaled to `[0, 1]`.
//! 2. Rows whose best class score exceeds the confidence threshold (0.3) become candidates.
//! 3. Class-agnostic non-max suppression drops boxes overlapping a stronger one (IoU > 0.1).
//! 4. Survivors scoring above the label threshold (0.6) contribute their class name once.
//!
//! Box geometry stops here; downstream stages only see labels.
//!
//! Local inference uses ONNX Runtime behind the `onnx` feature. Without it, or
//! when the model file is missing, the detector falls back to a network that
//! reports nothing, matching how ingest treats a failed detection.
//!
//! ```
//! use detect::{Detector, DetectorConfig, FixedNetwork, LabelMap};
//! use image::{DynamicImage, RgbImage};
//! use std::sync::Arc;
//!
//! let network = FixedNetwork::new(2).with_box(1, 0.9, (0.5, 0.5, 0.2, 0.2));
//! let labels: LabelMap = ["person", "dog"].into_iter().collect();
//! let detector =
//!     Detector::with_network(DetectorConfig::fixed(), labels, Arc::new(network)).unwrap();
//!
//! let image = DynamicImage::ImageRgb8(RgbImage::new(64, 64));
//! assert!(detector.detect(&image).contains("dog"));
//! ```

pub mod config;
pub mod error;
pub mod types;

mod detector;
mod labels;
mod network;
mod nms;
mod preprocess;
mod stub;
mod yolo;

#[cfg(feature = "onnx")]
mod cache;
#[cfg(feature = "onnx")]
mod onnx;

pub use crate::config::DetectorConfig;
pub use crate::detector::{decode_image, Detector};
pub use crate::error::DetectError;
pub use crate::labels::LabelMap;
pub use crate::network::DetectionNetwork;
pub use crate::nms::non_max_suppression;
pub use crate::preprocess::{to_blob, InputBlob};
pub use crate::stub::FixedNetwork;
pub use crate::types::{BoundingBox, Detection, DetectionReport, RawDetection};
pub use crate::yolo::{decode_rows, RawOutput, ROW_PREFIX};

#[cfg(feature = "onnx")]
pub use crate::onnx::OnnxNetwork;
