extern crate bvr_multibox;

use bvr_multibox::common::{apply_nms, boxes_to_array, AnchorBox, ImageDetections, MultiboxDetection};
use bvr_multibox::{box_iou, nms_boxes};
use ndarray::{array, Array1};
use rand::Rng;

use approx::{random_box, seeded_rng};

#[test]
fn keeps_only_the_most_confident_of_two_overlapping_boxes() {
    // IoU of 0.9
    let boxes = array![[0.0f32, 0.0, 1.0, 1.0], [0.0, 0.0, 1.0, 0.9]];
    let scores = array![0.9f32, 0.8];

    let keep = nms_boxes(boxes.view(), scores.view(), 0.5).unwrap();
    assert_eq!(keep, vec![0]);
}

#[test]
fn sorts_by_score_and_breaks_ties_by_index() {
    let boxes = array![
        [0.0f32, 0.0, 0.1, 0.1],
        [0.2, 0.2, 0.3, 0.3],
        [0.4, 0.4, 0.5, 0.5],
        [0.6, 0.6, 0.7, 0.7]
    ];
    let scores = array![0.5f32, 0.9, 0.5, 0.7];

    let keep = nms_boxes(boxes.view(), scores.view(), 0.5).unwrap();
    assert_eq!(keep, vec![1, 3, 0, 2]);
}

#[test]
fn overlap_exactly_at_threshold_is_kept() {
    // IoU of 0.5
    let boxes = array![[0.0f32, 0.0, 1.0, 1.0], [0.0, 0.0, 1.0, 0.5]];
    let scores = array![0.9f32, 0.8];

    let keep = nms_boxes(boxes.view(), scores.view(), 0.5).unwrap();
    assert_eq!(keep, vec![0, 1]);
}

#[test]
fn suppression_chains_through_kept_boxes_only() {
    // 1 overlaps 0 and 2, but 2 does not overlap 0
    let boxes = array![[0.0f32, 0.0, 1.0, 1.0], [0.3, 0.0, 1.3, 1.0], [0.8, 0.0, 1.8, 1.0]];
    let scores = array![0.9f32, 0.8, 0.7];

    let keep = nms_boxes(boxes.view(), scores.view(), 0.3).unwrap();
    assert_eq!(keep, vec![0, 2]);
}

#[test]
fn random_boxes_keep_invariants() {
    let mut rng = seeded_rng();
    for _ in 0..10 {
        let n = rng.gen_range(1..80);
        let boxes = boxes_to_array(&(0..n).map(|_| random_box(&mut rng)).collect::<Vec<_>>());
        let scores: Array1<f32> = (0..n).map(|_| rng.gen_range(0.0..1.0f32)).collect();
        let threshold = 0.4;

        let keep = nms_boxes(boxes.view(), scores.view(), threshold).unwrap();
        assert!(!keep.is_empty());

        let mut seen = vec![false; n];
        for &i in &keep {
            assert!(i < n && !seen[i], "index {} repeated or out of range", i);
            seen[i] = true;
        }
        for pair in keep.windows(2) {
            assert!(scores[pair[0]] >= scores[pair[1]]);
        }

        let iou = box_iou(boxes.view(), boxes.view()).unwrap();
        for (a, &i) in keep.iter().enumerate() {
            for &j in &keep[a + 1..] {
                assert!(iou[[i, j]] <= threshold, "kept {} and {} overlap by {}", i, j, iou[[i, j]]);
            }
        }
    }
}

#[test]
fn empty_input_keeps_nothing() {
    let boxes = ndarray::Array2::<f32>::zeros((0, 4));
    let scores = Array1::<f32>::zeros(0);
    assert!(nms_boxes(boxes.view(), scores.view(), 0.5).unwrap().is_empty());
}

#[test]
fn mismatched_scores_are_rejected() {
    let boxes = array![[0.0f32, 0.0, 1.0, 1.0]];
    let scores = array![0.9f32, 0.8];
    assert!(nms_boxes(boxes.view(), scores.view(), 0.5).is_err());
}

#[test]
fn apply_nms_on_detections() {
    let mut detections = vec![
        MultiboxDetection::new(0, AnchorBox::new(0.0, 0.0, 0.5, 0.5), None, 0.6),
        MultiboxDetection::new(1, AnchorBox::new(0.6, 0.6, 0.9, 0.9), None, 0.8),
        MultiboxDetection::new(0, AnchorBox::new(0.0, 0.0, 0.5, 0.45), None, 0.7),
    ];

    apply_nms(&mut detections, 0.5);
    let confidences: Vec<f32> = detections.iter().map(|d| d.confidence).collect();
    assert_eq!(confidences, vec![0.8, 0.7]);
    assert_eq!(detections[1].bbox, AnchorBox::new(0.0, 0.0, 0.5, 0.45));
}

#[test]
fn nan_scores_sort_ahead_of_numbers() {
    let boxes = array![[0.0f32, 0.0, 0.1, 0.1], [0.2, 0.2, 0.3, 0.3], [0.4, 0.4, 0.5, 0.5]];
    let scores = array![0.5f32, f32::NAN, 0.9];

    let keep = nms_boxes(boxes.view(), scores.view(), 0.5).unwrap();
    assert_eq!(keep, vec![1, 2, 0]);
}

#[test]
fn image_detections_apply_nms() {
    let detections = ImageDetections::from(vec![
        MultiboxDetection::new(0, AnchorBox::new(0.0, 0.0, 0.5, 0.5), None, 0.6),
        MultiboxDetection::new(1, AnchorBox::new(0.6, 0.6, 0.9, 0.9), None, 0.8),
        MultiboxDetection::new(0, AnchorBox::new(0.0, 0.0, 0.5, 0.45), None, 0.7),
    ]);

    let detections = detections.apply_nms(0.5);
    assert_eq!(detections.len(), 2);
    let confidences: Vec<f32> = detections.detections().iter().map(|d| d.confidence).collect();
    assert_eq!(confidences, vec![0.8, 0.7]);
}
