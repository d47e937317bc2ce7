use std::cmp::Ordering;

use crate::types::RawDetection;

/// Greedy, class-agnostic non-max suppression.
///
/// Boxes at or below `score_threshold` are dropped first. The rest are visited
/// in descending confidence; a box survives unless its IoU with an already kept
/// box exceeds `iou_threshold`. Survivors come back strongest first.
pub fn non_max_suppression(
    mut candidates: Vec<RawDetection>,
    score_threshold: f32,
    iou_threshold: f32,
) -> Vec<RawDetection> {
    candidates.retain(|d| d.confidence > score_threshold);
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let overlaps = kept
            .iter()
            .any(|k| k.bbox.iou(&candidate.bbox) > iou_threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}
