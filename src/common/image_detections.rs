use ndarray::Array3;

use crate::common::MultiboxDetection;
use crate::detection_runners::nms::{self, Nms};

/// Container for the post-processed records of one image.
///
/// Holds one record per anchor, kept detections first.
#[derive(Clone, PartialEq, Default)]
pub struct ImageDetections {
    detections: Vec<MultiboxDetection>,
}

impl std::fmt::Debug for ImageDetections {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let positive = self.detections.iter().filter(|d| !d.is_background()).count();
        f.debug_struct("ImageDetections")
            .field("records", &self.detections.len())
            .field("positive", &positive)
            .finish()
    }
}

impl From<Vec<MultiboxDetection>> for ImageDetections {
    fn from(detections: Vec<MultiboxDetection>) -> Self {
        Self { detections }
    }
}

impl ImageDetections {
    pub fn detections(&self) -> &[MultiboxDetection] {
        &self.detections
    }

    pub fn into_detections(self) -> Vec<MultiboxDetection> {
        self.detections
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Records with a real class and at least `threshold` confidence.
    pub fn positive(&self, threshold: f32) -> Vec<&MultiboxDetection> {
        self.detections
            .iter()
            .filter(|d| !d.is_background() && d.confidence >= threshold)
            .collect()
    }

    /// Suppresses overlapping records in place, keeping the highest confidence first.
    pub fn apply_nms(mut self, iou_threshold: f32) -> Self {
        apply_nms(&mut self.detections, iou_threshold);
        self
    }
}

/// Reorders `boxes` to the NMS keep order and drops the suppressed ones.
pub fn apply_nms<T: Nms>(boxes: &mut Vec<T>, iou_threshold: f32) {
    let keep = nms::nms(boxes, iou_threshold);
    let mut slots: Vec<Option<T>> = boxes.drain(..).map(Some).collect();
    boxes.extend(keep.into_iter().filter_map(|i| slots[i].take()));
}

/// Stacks per-image records into a `(batch, num_anchors, 6)` array.
///
/// Every image must carry the same number of records.
pub fn detections_to_array(batch: &[ImageDetections]) -> anyhow::Result<Array3<f32>> {
    let num_records = batch.first().map_or(0, |d| d.len());
    anyhow::ensure!(
        batch.iter().all(|d| d.len() == num_records),
        "All images must carry the same number of records"
    );

    let mut out = Array3::zeros((batch.len(), num_records, 6));
    for (i, image) in batch.iter().enumerate() {
        for (j, det) in image.detections().iter().enumerate() {
            for (k, v) in det.to_row().into_iter().enumerate() {
                out[[i, j, k]] = v;
            }
        }
    }
    Ok(out)
}
