use anyhow::Result;
use ndarray::{stack, Array1, Array2, Array3, Axis};

/// Training targets of a single image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTarget {
    /// `(num_anchors, 4)` regression targets, zero for unassigned anchors.
    pub bbox_offset: Array2<f32>,
    /// `(num_anchors, 4)`, `1.0` for assigned anchors and `0.0` otherwise.
    pub bbox_mask: Array2<f32>,
    /// `(num_anchors,)`, `0` for background, ground-truth class + 1 otherwise.
    pub class_labels: Array1<isize>,
}

impl ImageTarget {
    pub fn background(num_anchors: usize) -> Self {
        Self {
            bbox_offset: Array2::zeros((num_anchors, 4)),
            bbox_mask: Array2::zeros((num_anchors, 4)),
            class_labels: Array1::zeros(num_anchors),
        }
    }

    pub fn num_assigned(&self) -> usize {
        self.class_labels.iter().filter(|&&c| c > 0).count()
    }
}

/// Batched training targets, stacked along a leading batch axis.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiboxTarget {
    pub bbox_offset: Array3<f32>,
    pub bbox_mask: Array3<f32>,
    pub class_labels: Array2<isize>,
}

impl MultiboxTarget {
    pub fn from_images(images: &[ImageTarget]) -> Result<Self> {
        anyhow::ensure!(!images.is_empty(), "Cannot stack an empty batch of targets");

        let offsets: Vec<_> = images.iter().map(|t| t.bbox_offset.view()).collect();
        let masks: Vec<_> = images.iter().map(|t| t.bbox_mask.view()).collect();
        let labels: Vec<_> = images.iter().map(|t| t.class_labels.view()).collect();

        Ok(Self {
            bbox_offset: stack(Axis(0), &offsets)?,
            bbox_mask: stack(Axis(0), &masks)?,
            class_labels: stack(Axis(0), &labels)?,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.class_labels.nrows()
    }
}
