use serde::{Deserialize, Serialize};
use crate::common::AnchorBox;
use crate::detection_runners::nms::Nms;

/// Class id carried by background and suppressed records.
pub const BACKGROUND_ID: isize = -1;

/// One post-processed anchor: `(class_id, confidence, x1, y1, x2, y2)`.
#[derive(Default, Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MultiboxDetection {
    pub anchor_id: usize,
    pub class_id: isize,
    pub bbox: AnchorBox,
    pub label: Option<String>,
    pub confidence: f32,
}

impl Nms for MultiboxDetection {
    /// Computes the intersection over union (IoU) between this bounding box and another.
    fn iou(&self, other: &Self) -> f32 {
        self.bbox.iou(&other.bbox)
    }

    /// Returns the confidence score of the bounding box.
    fn confidence(&self) -> f32 {
        self.confidence
    }
}

impl MultiboxDetection {
    pub fn new(class_id: isize, bbox: AnchorBox, label: Option<String>, confidence: f32) -> Self {
        Self {
            anchor_id: 0,
            class_id,
            bbox,
            label,
            confidence,
        }
    }

    /// Index of the anchor this record was decoded from.
    pub fn with_anchor_id(mut self, anchor_id: usize) -> Self {
        self.anchor_id = anchor_id;
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn is_background(&self) -> bool {
        self.class_id < 0
    }

    /// The record as a `[class_id, confidence, x1, y1, x2, y2]` row.
    pub fn to_row(&self) -> [f32; 6] {
        [
            self.class_id as f32,
            self.confidence,
            self.bbox.x1,
            self.bbox.y1,
            self.bbox.x2,
            self.bbox.y2,
        ]
    }
}
