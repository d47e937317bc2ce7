use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, warn};

use crate::labels::LabelMap;
use crate::network::DetectionNetwork;
use crate::nms::non_max_suppression;
use crate::preprocess::to_blob;
use crate::stub::FixedNetwork;
use crate::types::{Detection, DetectionReport};
use crate::yolo::decode_rows;
use crate::{DetectError, DetectorConfig};

/// Runs a detection network over images and reduces its boxes to labels.
pub struct Detector {
    cfg: DetectorConfig,
    labels: LabelMap,
    network: Arc<dyn DetectionNetwork>,
}

impl Detector {
    /// Build from config, loading labels and the model it names.
    ///
    /// A model or label file that cannot be loaded is logged and replaced by a
    /// network that detects nothing, so ingest keeps working without tags.
    pub fn new(cfg: DetectorConfig) -> Result<Self, DetectError> {
        cfg.validate()?;
        let labels = match LabelMap::load(&cfg.labels_path) {
            Ok(labels) => labels,
            Err(err) => {
                if cfg.mode == "onnx" {
                    warn!(error = %err, "detection labels unavailable; no labels will be reported");
                }
                LabelMap::default()
            }
        };
        let network = build_network(&cfg);
        Ok(Self {
            cfg,
            labels,
            network,
        })
    }

    /// Build around an already constructed network.
    pub fn with_network(
        cfg: DetectorConfig,
        labels: LabelMap,
        network: Arc<dyn DetectionNetwork>,
    ) -> Result<Self, DetectError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            labels,
            network,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.cfg
    }

    pub fn network_name(&self) -> &str {
        self.network.name()
    }

    /// Full detection pass with boxes, timings, and errors surfaced.
    pub fn try_detect(&self, image: &DynamicImage) -> Result<DetectionReport, DetectError> {
        let cfg = &self.cfg;

        let started = Instant::now();
        let blob = to_blob(image, cfg.input_size, cfg.swap_rb);
        let preprocess_ms = started.elapsed().as_secs_f64() * 1000.0;

        let started = Instant::now();
        let output = self.network.infer(&blob)?;
        let inference_ms = started.elapsed().as_secs_f64() * 1000.0;

        let candidates = decode_rows(
            &output,
            image.width(),
            image.height(),
            cfg.confidence_threshold,
        )?;
        let candidate_count = candidates.len();
        let survivors =
            non_max_suppression(candidates, cfg.confidence_threshold, cfg.nms_threshold);

        let mut detections = Vec::new();
        let mut labels = BTreeSet::new();
        for raw in survivors
            .into_iter()
            .filter(|d| d.confidence > cfg.label_threshold)
        {
            let Some(label) = self.labels.name(raw.class_id) else {
                warn!(class_id = raw.class_id, "detected class has no label; skipped");
                continue;
            };
            labels.insert(label.to_string());
            detections.push(Detection {
                label: label.to_string(),
                confidence: raw.confidence,
                bbox: raw.bbox,
            });
        }

        debug!(
            network = self.network.name(),
            candidates = candidate_count,
            detections = detections.len(),
            labels = labels.len(),
            preprocess_ms,
            inference_ms,
            "detection completed"
        );

        Ok(DetectionReport {
            candidates: candidate_count,
            detections,
            labels,
            preprocess_ms,
            inference_ms,
        })
    }

    /// Labels detected in `image`. Inference failures yield an empty set.
    pub fn detect(&self, image: &DynamicImage) -> BTreeSet<String> {
        match self.try_detect(image) {
            Ok(report) => report.labels,
            Err(err) => {
                warn!(
                    error = %err,
                    network = self.network.name(),
                    "detection failed; no labels produced"
                );
                BTreeSet::new()
            }
        }
    }

    /// Decode encoded image bytes, then [`detect`](Self::detect).
    ///
    /// Only undecodable input is an error.
    pub fn detect_bytes(&self, bytes: &[u8]) -> Result<BTreeSet<String>, DetectError> {
        let image = decode_image(bytes)?;
        Ok(self.detect(&image))
    }
}

/// Decode PNG/JPEG/WebP bytes.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, DetectError> {
    Ok(image::load_from_memory(bytes)?)
}

fn build_network(cfg: &DetectorConfig) -> Arc<dyn DetectionNetwork> {
    match cfg.mode.as_str() {
        "onnx" => load_onnx_or_fallback(cfg),
        _ => Arc::new(FixedNetwork::empty()),
    }
}

#[cfg(feature = "onnx")]
fn load_onnx_or_fallback(cfg: &DetectorConfig) -> Arc<dyn DetectionNetwork> {
    let network: Arc<dyn DetectionNetwork> =
        match crate::cache::get_or_load_network(&cfg.model_path) {
            Ok(network) => network,
            Err(err) => {
                warn!(error = %err, "detection model unavailable; falling back to fixed network");
                Arc::new(FixedNetwork::empty())
            }
        };
    network
}

#[cfg(not(feature = "onnx"))]
fn load_onnx_or_fallback(cfg: &DetectorConfig) -> Arc<dyn DetectionNetwork> {
    warn!(
        model = %cfg.model_path.display(),
        "built without the `onnx` feature; falling back to fixed network"
    );
    Arc::new(FixedNetwork::empty())
}
