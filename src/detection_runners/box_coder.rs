use anyhow::Result;
use ndarray::{Array2, ArrayView2};

use crate::common::{boxes_to_array, AnchorBox};

/// Encodes boxes as offsets relative to their anchors, and back.
///
/// Offsets are `(wx * dx / aw, wy * dy / ah, ww * ln(eps + w / aw), wh * ln(eps + h / ah))`
/// in center form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCoder {
    pub weights: (f32, f32, f32, f32),
    pub eps: f32,
    pub bbox_xform_clip: Option<f32>,
}

impl Default for BoxCoder {
    fn default() -> Self {
        BoxCoder {
            weights: (10.0, 10.0, 5.0, 5.0),
            eps: 1e-6,
            bbox_xform_clip: None,
        }
    }
}

impl BoxCoder {
    /// Create a new [`BoxCoder`] with the given weights.
    pub fn new(weights: (f32, f32, f32, f32)) -> Self {
        BoxCoder {
            weights,
            ..Default::default()
        }
    }

    /// Clamp the decoded log-scale to `bbox_xform_clip` before exponentiating.
    ///
    /// `ln(1000 / 16)` is the usual choice. Clipping breaks the exact inverse for very large boxes.
    pub fn with_clip(mut self, bbox_xform_clip: Option<f32>) -> Self {
        self.bbox_xform_clip = bbox_xform_clip;
        self
    }

    /// Regression target that moves `anchor` onto `assigned`.
    pub fn encode_single(&self, anchor: &AnchorBox, assigned: &AnchorBox) -> [f32; 4] {
        let (acx, acy, aw, ah) = anchor.cxy_wh();
        let (bcx, bcy, bw, bh) = assigned.cxy_wh();
        let (wx, wy, ww, wh) = self.weights;

        [
            wx * (bcx - acx) / aw,
            wy * (bcy - acy) / ah,
            ww * (self.eps + bw / aw).ln(),
            wh * (self.eps + bh / ah).ln(),
        ]
    }

    /// Applies predicted `offset` to `anchor`.
    pub fn decode_single(&self, anchor: &AnchorBox, offset: [f32; 4]) -> AnchorBox {
        let (acx, acy, aw, ah) = anchor.cxy_wh();
        let (wx, wy, ww, wh) = self.weights;

        let dx = offset[0] / wx;
        let dy = offset[1] / wy;
        let mut dw = offset[2] / ww;
        let mut dh = offset[3] / wh;

        // clamp to avoid overflow in exp
        if let Some(clip) = self.bbox_xform_clip {
            dw = dw.min(clip);
            dh = dh.min(clip);
        }

        let pred_ctr_x = dx * aw + acx;
        let pred_ctr_y = dy * ah + acy;
        let pred_w = dw.exp() * aw;
        let pred_h = dh.exp() * ah;

        AnchorBox::from_cxcy_wh(pred_ctr_x, pred_ctr_y, pred_w, pred_h)
    }

    /// Encodes `(N, 4)` assigned boxes against `(N, 4)` anchors, both in corner form.
    pub fn encode(&self, anchors: ArrayView2<f32>, assigned_bb: ArrayView2<f32>) -> Result<Array2<f32>> {
        let anchors = AnchorBox::from_rows(anchors)?;
        let assigned = AnchorBox::from_rows(assigned_bb)?;
        anyhow::ensure!(
            anchors.len() == assigned.len(),
            "Got {} anchors but {} assigned boxes",
            anchors.len(),
            assigned.len()
        );

        let mut offsets = Array2::zeros((anchors.len(), 4));
        for (i, (anchor, bbox)) in anchors.iter().zip(&assigned).enumerate() {
            for (j, v) in self.encode_single(anchor, bbox).into_iter().enumerate() {
                offsets[[i, j]] = v;
            }
        }
        Ok(offsets)
    }

    /// Decodes `(N, 4)` offsets against `(N, 4)` corner-form anchors into corner-form boxes.
    pub fn decode(&self, anchors: ArrayView2<f32>, rel_codes: ArrayView2<f32>) -> Result<Array2<f32>> {
        Ok(boxes_to_array(&self.decode_boxes(anchors, rel_codes)?))
    }

    pub fn decode_boxes(&self, anchors: ArrayView2<f32>, rel_codes: ArrayView2<f32>) -> Result<Vec<AnchorBox>> {
        let anchors = AnchorBox::from_rows(anchors)?;
        anyhow::ensure!(
            rel_codes.shape() == [anchors.len(), 4],
            "Offsets must have shape ({}, 4), got {:?}",
            anchors.len(),
            rel_codes.shape()
        );

        Ok(anchors
            .iter()
            .zip(rel_codes.outer_iter())
            .map(|(anchor, code)| self.decode_single(anchor, [code[0], code[1], code[2], code[3]]))
            .collect())
    }
}

/// Offsets from `anchors` to `assigned_bb` with the default `(10, 10, 5, 5)` weights.
pub fn offset_boxes(anchors: ArrayView2<f32>, assigned_bb: ArrayView2<f32>) -> Result<Array2<f32>> {
    BoxCoder::default().encode(anchors, assigned_bb)
}

/// Boxes predicted from `anchors` and `offset_preds` with the default weights.
pub fn offset_inverse(anchors: ArrayView2<f32>, offset_preds: ArrayView2<f32>) -> Result<Array2<f32>> {
    BoxCoder::default().decode(anchors, offset_preds)
}
