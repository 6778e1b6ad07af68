use anyhow::Result;
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::common::AnchorBox;

/// One labelled object of an image: a class id and its corner-form box.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub class_id: isize,
    pub bbox: AnchorBox,
}

impl GroundTruth {
    pub fn new(class_id: isize, bbox: AnchorBox) -> Self {
        Self { class_id, bbox }
    }

    /// Rows with a negative class id pad a per-image label array to a common length.
    pub fn is_padding(&self) -> bool {
        self.class_id < 0
    }

    /// Reads one `[class, x1, y1, x2, y2]` row. A class that is not a finite
    /// number marks padding.
    pub fn from_label_row(row: ArrayView1<f32>) -> Self {
        let class_id = if row[0].is_finite() { row[0] as isize } else { -1 };
        Self::new(class_id, AnchorBox::new(row[1], row[2], row[3], row[4]))
    }

    /// Parses an image's `(num_gt, 5)` label array of `[class, x1, y1, x2, y2]` rows,
    /// dropping padding rows.
    pub fn from_label_rows(labels: ArrayView2<f32>) -> Result<Vec<Self>> {
        anyhow::ensure!(
            labels.ncols() == 5,
            "Labels must have shape (num_gt, 5), got {:?}",
            labels.shape()
        );
        Ok(labels
            .outer_iter()
            .map(Self::from_label_row)
            .filter(|gt| !gt.is_padding())
            .collect())
    }
}
