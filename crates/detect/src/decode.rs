use {
    crate::DetectError,
    base::{Rect, Tensor, Vec2},
};

/// Threshold used when the caller does not pick one.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Columns per candidate row: `[center_x, center_y, width, height, confidence, class]`.
pub const ROW_WIDTH: usize = 6;

/// A decoded, thresholded detection. `bbox.origin` is the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionBox {
    pub bbox: Rect<f32>,
    pub label: String,
    pub confidence: f32,
}

/// One validated row of raw model output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateRow {
    pub center: Vec2<f32>,
    pub size: Vec2<f32>,
    pub confidence: f32,
    pub class_index: f32,
}

impl TryFrom<&[f32]> for CandidateRow {
    type Error = DetectError;

    fn try_from(row: &[f32]) -> Result<Self, DetectError> {
        let [cx, cy, w, h, confidence, class_index] = row else {
            return Err(DetectError::Shape(format!(
                "expected {} values per row, got {}",
                ROW_WIDTH,
                row.len()
            )));
        };
        if let Some(value) = row.iter().find(|v| !v.is_finite()) {
            return Err(DetectError::Shape(format!("non-numeric value {value} in row")));
        }
        Ok(Self {
            center: Vec2::new(*cx, *cy),
            size: Vec2::new(*w, *h),
            confidence: *confidence,
            class_index: *class_index,
        })
    }
}

impl CandidateRow {
    pub fn passes(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }

    pub fn label(&self) -> String {
        // f32 Display prints 3.0 as "3"
        format!("Class {}", self.class_index)
    }

    pub fn into_box(self) -> DetectionBox {
        DetectionBox {
            bbox: Rect::from_center(self.center, self.size),
            label: self.label(),
            confidence: self.confidence,
        }
    }
}

fn check_shape(shape: &[usize]) -> Result<(), DetectError> {
    match shape {
        [_, ROW_WIDTH] | [1, _, ROW_WIDTH] => Ok(()),
        _ => Err(DetectError::Shape(format!(
            "expected [N, {ROW_WIDTH}] or [1, N, {ROW_WIDTH}] output, got {:?}",
            shape
        ))),
    }
}

/// Decode raw model output, failing on malformed input.
///
/// Keeps rows whose confidence is strictly above `threshold`, in input
/// order, converting center-based geometry to top-left based. Overlapping
/// boxes are not merged.
pub fn try_decode(raw: &Tensor<f32>, threshold: f32) -> Result<Vec<DetectionBox>, DetectError> {
    check_shape(&raw.shape)?;
    let mut boxes = Vec::new();
    for (index, row) in raw.rows().enumerate() {
        let candidate = CandidateRow::try_from(row)
            .map_err(|e| DetectError::Shape(format!("row {index}: {e}")))?;
        if candidate.passes(threshold) {
            boxes.push(candidate.into_box());
        }
    }
    Ok(boxes)
}

/// Decode raw model output. Malformed output yields an empty list.
pub fn decode(raw: &Tensor<f32>, threshold: f32) -> Vec<DetectionBox> {
    try_decode(raw, threshold).unwrap_or_else(|error| {
        log::warn!("discarding malformed model output: {}", error);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_row_rejects_short_row() {
        let result = CandidateRow::try_from(&[1.0, 2.0, 3.0][..]);
        assert!(matches!(result, Err(DetectError::Shape(_))));
    }

    #[test]
    fn test_candidate_row_rejects_nan() {
        let result = CandidateRow::try_from(&[1.0, 2.0, f32::NAN, 4.0, 0.9, 0.0][..]);
        assert!(result.is_err());
    }

    #[test]
    fn test_label_formats_integral_class() {
        let row = CandidateRow::try_from(&[0.0, 0.0, 1.0, 1.0, 0.9, 12.0][..]).unwrap();
        assert_eq!(row.label(), "Class 12");
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let row = CandidateRow::try_from(&[0.0, 0.0, 1.0, 1.0, 0.5, 0.0][..]).unwrap();
        assert!(!row.passes(0.5));
        assert!(row.passes(0.49));
    }
}
