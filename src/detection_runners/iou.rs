use anyhow::Result;
use ndarray::{Array2, ArrayView2};

use crate::common::AnchorBox;

/// Pairwise IoU of two sets of corner-form boxes.
///
/// Returns an `(M, N)` matrix for `(M, 4)` and `(N, 4)` inputs.
pub fn box_iou(boxes1: ArrayView2<f32>, boxes2: ArrayView2<f32>) -> Result<Array2<f32>> {
    let boxes1 = AnchorBox::from_rows(boxes1)?;
    let boxes2 = AnchorBox::from_rows(boxes2)?;
    Ok(pairwise_iou(&boxes1, &boxes2))
}

pub fn pairwise_iou(boxes1: &[AnchorBox], boxes2: &[AnchorBox]) -> Array2<f32> {
    Array2::from_shape_fn((boxes1.len(), boxes2.len()), |(i, j)| boxes1[i].iou(&boxes2[j]))
}
