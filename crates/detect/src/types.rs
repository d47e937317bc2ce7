use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Axis-aligned box in source-image pixels, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Build from a center point and size, as YOLO heads report boxes.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union; 0 when either box is degenerate.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// One candidate box straight out of the network, before labels are attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// A surviving box with its class name resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Everything one detection pass produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Boxes admitted by the confidence threshold, before suppression.
    pub candidates: usize,
    /// Boxes above the label threshold after suppression.
    pub detections: Vec<Detection>,
    /// De-duplicated class names of [`detections`](Self::detections).
    pub labels: BTreeSet<String>,
    pub preprocess_ms: f64,
    pub inference_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_center_anchors_top_left() {
        let b = BoundingBox::from_center(50.0, 40.0, 20.0, 10.0);
        assert_eq!((b.x, b.y, b.width, b.height), (40.0, 35.0, 20.0, 10.0));
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = BoundingBox::from_center(10.0, 10.0, 10.0, 10.0);
        let far = BoundingBox::from_center(100.0, 100.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
        assert_eq!(a.iou(&far), 0.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        let a = BoundingBox { x: 0.0, y: 0.0, width: 10.0, height: 10.0 };
        let b = BoundingBox { x: 5.0, y: 0.0, width: 10.0, height: 10.0 };
        // 50 / 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_boxes_have_zero_iou() {
        let a = BoundingBox { x: 0.0, y: 0.0, width: 0.0, height: 0.0 };
        assert_eq!(a.iou(&a), 0.0);
    }
}
