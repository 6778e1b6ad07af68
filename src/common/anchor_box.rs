use anyhow::Result;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Axis-aligned box in corner form, with its width and height cached.
///
/// Coordinates are whatever space the caller works in; the multibox pipeline
/// keeps everything normalized to `[0, 1]` of the image size.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize, PartialOrd)]
pub struct AnchorBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub w: f32,
    pub h: f32,
}

impl AnchorBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            w: x2 - x1,
            h: y2 - y1,
        }
    }

    /// Builds a box from its center form `(cx, cy, w, h)`.
    pub fn from_cxcy_wh(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::default().with_cxcy_wh(cx, cy, w, h)
    }

    /// Reads a corner-form box from a row of 4 values.
    pub fn from_row(row: ArrayView1<f32>) -> Result<Self> {
        anyhow::ensure!(row.len() == 4, "Expected a box of 4 coordinates, got {}", row.len());
        Ok(Self::new(row[0], row[1], row[2], row[3]))
    }

    /// Reads every row of an `(N, 4)` corner-form array.
    pub fn from_rows(boxes: ArrayView2<f32>) -> Result<Vec<Self>> {
        check_box_shape(boxes)?;
        Ok(boxes
            .outer_iter()
            .map(|b| Self::new(b[0], b[1], b[2], b[3]))
            .collect())
    }

    /// Returns the width of the bounding box.
    pub fn width(&self) -> f32 {
        self.w
    }

    /// Returns the height of the bounding box.
    pub fn height(&self) -> f32 {
        self.h
    }

    /// Returns the center x-coordinate of the bounding box.
    pub fn cx(&self) -> f32 {
        (self.x1 + self.x2) / 2.
    }

    /// Returns the center y-coordinate of the bounding box.
    pub fn cy(&self) -> f32 {
        (self.y1 + self.y2) / 2.
    }

    /// Returns the center coordinates and size of the bounding box as `(cx, cy, w, h)`.
    pub fn cxy_wh(&self) -> (f32, f32, f32, f32) {
        (self.cx(), self.cy(), self.w, self.h)
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Computes the area of the bounding box. Degenerate boxes have no area.
    pub fn area(&self) -> f32 {
        self.w.max(0.) * self.h.max(0.)
    }

    /// Computes the intersection area between this bounding box and another.
    pub fn intersect(&self, other: &AnchorBox) -> f32 {
        let left = self.x1.max(other.x1);
        let right = self.x2.min(other.x2);
        let top = self.y1.max(other.y1);
        let bottom = self.y2.min(other.y2);
        (right - left).max(0.) * (bottom - top).max(0.)
    }

    /// Computes the union area between this bounding box and another.
    pub fn union(&self, other: &AnchorBox) -> f32 {
        self.area() + other.area() - self.intersect(other)
    }

    /// Computes the intersection over union (IoU) between this bounding box and another.
    ///
    /// A zero union (two empty boxes) yields `0.0` instead of NaN.
    pub fn iou(&self, other: &AnchorBox) -> f32 {
        let union = self.union(other);
        if union <= 0. {
            return 0.;
        }
        self.intersect(other) / union
    }

    /// Checks if this bounding box completely contains another bounding box `other`.
    pub fn contains(&self, other: &AnchorBox) -> bool {
        self.x1 <= other.x1 && self.x2 >= other.x2 && self.y1 <= other.y1 && self.y2 >= other.y2
    }

    /// Maps a normalized box onto an image of `width` x `height` pixels.
    pub fn scaled(&self, width: f32, height: f32) -> Self {
        Self::new(self.x1 * width, self.y1 * height, self.x2 * width, self.y2 * height)
    }

    pub fn as_x1y1_x2y2_i32(&self) -> (i32, i32, i32, i32) {
        (self.x1.round() as i32,
         self.y1.round() as i32,
         self.x2.round() as i32,
         self.y2.round() as i32)
    }

    /// Sets the bounding box's coordinates and dimensions using `(cx, cy, w, h)`.
    ///
    /// # Arguments
    ///
    /// * `cx` - The x-coordinate of the horizontal center.
    /// * `cy` - The y-coordinate of the vertical center.
    /// * `w` - The width of the bounding box.
    /// * `h` - The height of the bounding box.
    ///
    /// # Returns
    ///
    /// An `AnchorBox` instance with updated coordinates and dimensions.
    pub fn with_cxcy_wh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - 0.5 * w;
        self.y1 = cy - 0.5 * h;
        self.x2 = cx + 0.5 * w;
        self.y2 = cy + 0.5 * h;
        self.w = w;
        self.h = h;
        self
    }
}

pub(crate) fn check_box_shape(boxes: ArrayView2<f32>) -> Result<()> {
    anyhow::ensure!(
        boxes.ncols() == 4,
        "Boxes must have shape (N, 4), got {:?}",
        boxes.shape()
    );
    Ok(())
}

/// Converts `(N, 4)` boxes from `(x1, y1, x2, y2)` to `(cx, cy, w, h)`.
pub fn box_corner_to_center(boxes: ArrayView2<f32>) -> Result<Array2<f32>> {
    check_box_shape(boxes)?;
    let mut out = Array2::zeros(boxes.raw_dim());
    for (src, mut dst) in boxes.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
        let (x1, y1, x2, y2) = (src[0], src[1], src[2], src[3]);
        dst[0] = (x1 + x2) / 2.;
        dst[1] = (y1 + y2) / 2.;
        dst[2] = x2 - x1;
        dst[3] = y2 - y1;
    }
    Ok(out)
}

/// Converts `(N, 4)` boxes from `(cx, cy, w, h)` to `(x1, y1, x2, y2)`.
pub fn box_center_to_corner(boxes: ArrayView2<f32>) -> Result<Array2<f32>> {
    check_box_shape(boxes)?;
    let mut out = Array2::zeros(boxes.raw_dim());
    for (src, mut dst) in boxes.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
        let (cx, cy, w, h) = (src[0], src[1], src[2], src[3]);
        dst[0] = cx - 0.5 * w;
        dst[1] = cy - 0.5 * h;
        dst[2] = cx + 0.5 * w;
        dst[3] = cy + 0.5 * h;
    }
    Ok(out)
}

/// Stacks boxes back into an `(N, 4)` corner-form array.
pub fn boxes_to_array(boxes: &[AnchorBox]) -> Array2<f32> {
    Array2::from_shape_fn((boxes.len(), 4), |(i, j)| boxes[i].to_array()[j])
}
