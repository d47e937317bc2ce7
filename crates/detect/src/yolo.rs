//! Decoding of YOLO detection rows.
//!
//! Each row is `[cx, cy, w, h, objectness, score_0, .., score_n]` with the box
//! expressed as fractions of the input. A row's confidence is its best class
//! score; objectness is not used.

use crate::types::{BoundingBox, RawDetection};
use crate::DetectError;

/// Values preceding the class scores in every row.
pub const ROW_PREFIX: usize = 5;

/// Flat network output made of rows of equal width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOutput {
    stride: usize,
    data: Vec<f32>,
}

impl RawOutput {
    pub fn new(stride: usize, data: Vec<f32>) -> Result<Self, DetectError> {
        let output = Self { stride, data };
        output.check_shape()?;
        Ok(output)
    }

    /// Values per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// An empty output is always well formed; anything else needs rows that
    /// carry at least one class score and a length that divides evenly.
    fn check_shape(&self) -> Result<(), DetectError> {
        if self.data.is_empty() {
            return Ok(());
        }
        if self.stride <= ROW_PREFIX {
            return Err(DetectError::InvalidOutput {
                expected: format!("rows of at least {} values", ROW_PREFIX + 1),
                got: format!("stride {}", self.stride),
            });
        }
        if self.data.len() % self.stride != 0 {
            return Err(DetectError::InvalidOutput {
                expected: format!("a multiple of {} values", self.stride),
                got: format!("{} values", self.data.len()),
            });
        }
        Ok(())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // An empty output has stride 0 from Default; chunks_exact needs > 0.
        self.data.chunks_exact(self.stride.max(1))
    }

    pub fn num_rows(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }

    /// Append another output head's rows.
    pub fn extend(&mut self, other: RawOutput) -> Result<(), DetectError> {
        if other.data.is_empty() {
            return Ok(());
        }
        if self.data.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.stride != self.stride {
            return Err(DetectError::InvalidOutput {
                expected: format!("stride {}", self.stride),
                got: format!("stride {}", other.stride),
            });
        }
        self.data.extend(other.data);
        Ok(())
    }
}

/// Turn rows into candidates whose best class score exceeds `threshold`,
/// scaling boxes to a `width x height` source image.
///
/// Output whose rows are too short to hold a class score is rejected.
pub fn decode_rows(
    output: &RawOutput,
    width: u32,
    height: u32,
    threshold: f32,
) -> Result<Vec<RawDetection>, DetectError> {
    output.check_shape()?;
    let (w, h) = (width as f32, height as f32);
    let candidates = output
        .rows()
        .filter_map(|row| {
            let (class_id, confidence) = best_class(row.get(ROW_PREFIX..)?)?;
            if confidence <= threshold {
                return None;
            }
            Some(RawDetection {
                class_id,
                confidence,
                bbox: BoundingBox::from_center(row[0] * w, row[1] * h, row[2] * w, row[3] * h),
            })
        })
        .collect();
    Ok(candidates)
}

/// First index of the maximum score.
fn best_class(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (idx, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((idx, score)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cx: f32, cy: f32, w: f32, h: f32, scores: &[f32]) -> Vec<f32> {
        let mut r = vec![cx, cy, w, h, 1.0];
        r.extend_from_slice(scores);
        r
    }

    #[test]
    fn admits_rows_above_threshold_only() {
        let mut data = row(0.5, 0.5, 0.2, 0.2, &[0.1, 0.9]);
        data.extend(row(0.1, 0.1, 0.1, 0.1, &[0.3, 0.2]));
        let output = RawOutput::new(7, data).unwrap();

        let found = decode_rows(&output, 100, 200, 0.3).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].class_id, 1);
        assert!((found[0].confidence - 0.9).abs() < 1e-6);
        assert_eq!(found[0].bbox, BoundingBox::from_center(50.0, 100.0, 20.0, 40.0));
    }

    #[test]
    fn confidence_is_class_score_not_objectness() {
        let mut data = row(0.5, 0.5, 0.2, 0.2, &[0.5]);
        data[4] = 0.01;
        let output = RawOutput::new(6, data).unwrap();
        assert_eq!(decode_rows(&output, 10, 10, 0.3).unwrap().len(), 1);
    }

    #[test]
    fn ties_pick_the_first_class() {
        assert_eq!(best_class(&[0.4, 0.7, 0.7]), Some((1, 0.7)));
        assert_eq!(best_class(&[]), None);
    }

    #[test]
    fn rejects_ragged_output() {
        assert!(RawOutput::new(7, vec![0.0; 10]).is_err());
        assert!(RawOutput::new(4, vec![0.0; 8]).is_err());
    }

    #[test]
    fn short_rows_are_invalid_output() {
        let output = RawOutput {
            stride: 3,
            data: vec![0.5; 6],
        };
        assert!(matches!(
            decode_rows(&output, 10, 10, 0.3),
            Err(DetectError::InvalidOutput { .. })
        ));

        let ragged = RawOutput {
            stride: 6,
            data: vec![0.5; 8],
        };
        assert!(decode_rows(&ragged, 10, 10, 0.3).is_err());
    }

    #[test]
    fn empty_output_decodes_to_nothing() {
        let found = decode_rows(&RawOutput::default(), 10, 10, 0.3).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn extend_concatenates_heads() {
        let mut out = RawOutput::default();
        out.extend(RawOutput::new(6, vec![0.0; 12]).unwrap()).unwrap();
        out.extend(RawOutput::new(6, vec![0.0; 6]).unwrap()).unwrap();
        assert_eq!(out.num_rows(), 3);
        assert!(out.extend(RawOutput::new(7, vec![0.0; 7]).unwrap()).is_err());
        assert_eq!(RawOutput::default().rows().count(), 0);
    }
}
