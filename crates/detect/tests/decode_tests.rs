use {
    base::Tensor,
    detect::{DEFAULT_CONFIDENCE_THRESHOLD, DetectError, decode, try_decode},
};

fn output(rows: &[[f32; 6]]) -> Tensor<f32> {
    Tensor::new(
        vec![rows.len(), 6],
        rows.iter().flatten().copied().collect(),
    )
    .unwrap()
}

#[test]
fn test_center_row_becomes_top_left_box() {
    let raw = output(&[[100.0, 100.0, 40.0, 20.0, 0.9, 3.0]]);
    let boxes = decode(&raw, DEFAULT_CONFIDENCE_THRESHOLD);

    assert_eq!(boxes.len(), 1);
    let detection = &boxes[0];
    assert_eq!(detection.bbox.origin.x, 80.0);
    assert_eq!(detection.bbox.origin.y, 90.0);
    assert_eq!(detection.bbox.size.x, 40.0);
    assert_eq!(detection.bbox.size.y, 20.0);
    assert_eq!(detection.label, "Class 3");
    assert_eq!(detection.confidence, 0.9);
}

#[test]
fn test_rows_below_threshold_are_dropped() {
    let raw = output(&[
        [10.0, 10.0, 4.0, 4.0, 0.2, 0.0],
        [20.0, 20.0, 4.0, 4.0, 0.5, 1.0],
        [30.0, 30.0, 4.0, 4.0, 0.49, 2.0],
    ]);
    assert!(decode(&raw, DEFAULT_CONFIDENCE_THRESHOLD).is_empty());
}

#[test]
fn test_order_is_preserved_and_overlaps_kept() {
    let raw = output(&[
        [50.0, 50.0, 10.0, 10.0, 0.6, 1.0],
        [10.0, 10.0, 2.0, 2.0, 0.1, 7.0],
        [51.0, 51.0, 10.0, 10.0, 0.95, 1.0],
        [5.0, 5.0, 2.0, 2.0, 0.7, 2.0],
    ]);
    let boxes = decode(&raw, DEFAULT_CONFIDENCE_THRESHOLD);

    let confidences: Vec<f32> = boxes.iter().map(|b| b.confidence).collect();
    assert_eq!(confidences, vec![0.6, 0.95, 0.7]);
    let labels: Vec<&str> = boxes.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["Class 1", "Class 1", "Class 2"]);
}

#[test]
fn test_batched_output_is_accepted() {
    let raw = Tensor::new(
        vec![1, 2, 6],
        vec![
            8.0, 8.0, 4.0, 4.0, 0.8, 0.0, //
            16.0, 16.0, 4.0, 4.0, 0.3, 0.0,
        ],
    )
    .unwrap();
    let boxes = try_decode(&raw, 0.5).unwrap();
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].bbox.origin.x, 6.0);
    assert_eq!(boxes[0].label, "Class 0");
}

#[test]
fn test_empty_output_yields_no_boxes() {
    let raw = Tensor::new(vec![0, 6], Vec::new()).unwrap();
    assert!(try_decode(&raw, 0.5).unwrap().is_empty());
}

#[test]
fn test_wrong_row_width_is_malformed() {
    let raw = Tensor::new(vec![2, 5], vec![1.0; 10]).unwrap();
    assert!(matches!(try_decode(&raw, 0.5), Err(DetectError::Shape(_))));
    assert!(decode(&raw, 0.5).is_empty());
}

#[test]
fn test_non_numeric_value_discards_whole_output() {
    let raw = output(&[
        [10.0, 10.0, 4.0, 4.0, 0.9, 0.0],
        [20.0, f32::NAN, 4.0, 4.0, 0.9, 1.0],
    ]);
    assert!(try_decode(&raw, 0.5).is_err());
    assert!(decode(&raw, 0.5).is_empty());
}

#[test]
fn test_custom_threshold() {
    let raw = output(&[
        [10.0, 10.0, 4.0, 4.0, 0.3, 0.0],
        [10.0, 10.0, 4.0, 4.0, 0.1, 0.0],
    ]);
    assert_eq!(decode(&raw, 0.25).len(), 1);
}
