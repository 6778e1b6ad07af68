use anyhow::Result;
use ndarray::{ArrayView1, ArrayView2};

use crate::common::AnchorBox;

pub trait Nms {
    fn iou(&self, other: &Self) -> f32;
    fn confidence(&self) -> f32;
}

/// A box paired with its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredBox {
    pub bbox: AnchorBox,
    pub score: f32,
}

impl Nms for ScoredBox {
    /// Computes the intersection over union (IoU) between this bounding box and another.
    fn iou(&self, other: &Self) -> f32 {
        self.bbox.iou(&other.bbox)
    }

    /// Returns the confidence score of the bounding box.
    fn confidence(&self) -> f32 {
        self.score
    }
}

/// Greedy non-maximum suppression.
///
/// Returns the indices of the kept items, highest confidence first. Equal
/// confidences keep their input order. An item is dropped when its IoU with
/// an already kept item exceeds `iou_threshold`.
pub fn nms<T: Nms>(boxes: &[T], iou_threshold: f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    // stable, so ties stay in index order; NaN scores sort first
    order.sort_by(|&a, &b| boxes[b].confidence().total_cmp(&boxes[a].confidence()));

    let mut keep = Vec::new();
    let mut suppressed = vec![false; boxes.len()];

    for (pos, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);

        for &j in &order[pos + 1..] {
            if !suppressed[j] && boxes[i].iou(&boxes[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Non-maximum suppression over `(N, 4)` corner-form boxes and their `N` scores.
pub fn nms_boxes(boxes: ArrayView2<f32>, scores: ArrayView1<f32>, iou_threshold: f32) -> Result<Vec<usize>> {
    let boxes = AnchorBox::from_rows(boxes)?;
    anyhow::ensure!(
        boxes.len() == scores.len(),
        "Got {} boxes but {} scores",
        boxes.len(),
        scores.len()
    );

    let scored: Vec<ScoredBox> = boxes
        .into_iter()
        .zip(scores.iter())
        .map(|(bbox, &score)| ScoredBox { bbox, score })
        .collect();

    Ok(nms(&scored, iou_threshold))
}
