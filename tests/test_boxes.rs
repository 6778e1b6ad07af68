extern crate bvr_multibox;

use bvr_multibox::box_iou;
use bvr_multibox::common::{box_center_to_corner, box_corner_to_center, boxes_to_array, AnchorBox};
use ndarray::{array, Array2};

use approx::{assert_box_close, assert_close, assert_rows_close, random_box, seeded_rng};

#[test]
fn corner_center_round_trip() {
    let boxes = array![[0.1f32, 0.08, 0.52, 0.92], [0.55, 0.2, 0.9, 0.88], [0.3, 0.3, 0.3, 0.3]];

    let center = box_corner_to_center(boxes.view()).unwrap();
    assert_rows_close(
        center.view(),
        &[[0.31, 0.5, 0.42, 0.84], [0.725, 0.54, 0.35, 0.68], [0.3, 0.3, 0.0, 0.0]],
        1e-6,
    );

    let corner = box_center_to_corner(center.view()).unwrap();
    assert_rows_close(
        corner.view(),
        &[[0.1, 0.08, 0.52, 0.92], [0.55, 0.2, 0.9, 0.88], [0.3, 0.3, 0.3, 0.3]],
        1e-6,
    );
}

#[test]
fn random_boxes_round_trip() {
    let mut rng = seeded_rng();
    let boxes: Vec<AnchorBox> = (0..200).map(|_| random_box(&mut rng)).collect();
    let corner = boxes_to_array(&boxes);

    let back = box_center_to_corner(box_corner_to_center(corner.view()).unwrap().view()).unwrap();
    for (a, b) in corner.iter().zip(back.iter()) {
        assert_close(*b, *a, 1e-6);
    }
}

#[test]
fn conversions_reject_wrong_width() {
    let boxes = Array2::<f32>::zeros((3, 5));
    assert!(box_corner_to_center(boxes.view()).is_err());
    assert!(box_center_to_corner(boxes.view()).is_err());
}

#[test]
fn anchor_box_geometry() {
    let b = AnchorBox::from_cxcy_wh(0.5, 0.5, 0.4, 0.2);
    assert_box_close(&b, &AnchorBox::new(0.3, 0.4, 0.7, 0.6), 1e-6);
    assert_close(b.area(), 0.08, 1e-7);

    let inner = AnchorBox::new(0.4, 0.45, 0.6, 0.55);
    assert!(b.contains(&inner));
    assert!(!inner.contains(&b));

    let px = b.scaled(100.0, 50.0);
    assert_eq!(px.as_x1y1_x2y2_i32(), (30, 20, 70, 30));
}

#[test]
fn iou_of_box_with_itself_is_one() {
    let b = AnchorBox::new(0.1, 0.2, 0.6, 0.9);
    assert_close(b.iou(&b), 1.0, 1e-6);
}

#[test]
fn iou_of_disjoint_boxes_is_zero() {
    let a = AnchorBox::new(0.0, 0.0, 0.2, 0.2);
    let b = AnchorBox::new(0.5, 0.5, 0.9, 0.9);
    assert_eq!(a.iou(&b), 0.0);

    // touching edges do not overlap
    let c = AnchorBox::new(0.2, 0.0, 0.4, 0.2);
    assert_eq!(a.iou(&c), 0.0);
}

#[test]
fn iou_of_empty_boxes_is_zero() {
    let a = AnchorBox::new(0.3, 0.3, 0.3, 0.3);
    assert_eq!(a.iou(&a), 0.0);
}

#[test]
fn box_iou_known_values() {
    let boxes1 = array![[0.0f32, 0.0, 2.0, 2.0], [0.0, 0.0, 1.0, 1.0]];
    let boxes2 = array![[1.0f32, 1.0, 3.0, 3.0], [0.0, 0.0, 2.0, 2.0], [5.0, 5.0, 6.0, 6.0]];

    let iou = box_iou(boxes1.view(), boxes2.view()).unwrap();
    assert_eq!(iou.dim(), (2, 3));
    assert_close(iou[[0, 0]], 1.0 / 7.0, 1e-6);
    assert_close(iou[[0, 1]], 1.0, 1e-6);
    assert_eq!(iou[[0, 2]], 0.0);
    assert_close(iou[[1, 1]], 0.25, 1e-6);
    assert_eq!(iou[[1, 0]], 0.0);
}

#[test]
fn box_iou_is_transposed_when_arguments_swap() {
    let mut rng = seeded_rng();
    let a = boxes_to_array(&(0..30).map(|_| random_box(&mut rng)).collect::<Vec<_>>());
    let b = boxes_to_array(&(0..20).map(|_| random_box(&mut rng)).collect::<Vec<_>>());

    let ab = box_iou(a.view(), b.view()).unwrap();
    let ba = box_iou(b.view(), a.view()).unwrap();
    assert_eq!(ab, ba.t());

    for &v in ab.iter() {
        assert!((0.0..=1.0).contains(&v), "IoU {} out of range", v);
    }
}

#[test]
fn box_iou_rejects_wrong_width() {
    let a = Array2::<f32>::zeros((2, 4));
    let b = Array2::<f32>::zeros((2, 3));
    assert!(box_iou(a.view(), b.view()).is_err());
}
