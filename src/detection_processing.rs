use std::time::{Duration, Instant};

use anyhow::Result;
use ndarray::{s, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;

use crate::common::{AnchorBox, ImageDetections, ImageTarget, MultiboxDetection, MultiboxTarget, BACKGROUND_ID};
use crate::detection_runners::assignment::image_target;
use crate::detection_runners::box_coder::BoxCoder;
use crate::detection_runners::nms::{nms, ScoredBox};
use crate::utils::{self, first_max};

/// Best foreground class and decoded box of every anchor of one image.
#[derive(Debug, Clone, Default)]
pub struct DecodedImage {
    pub class_ids: Vec<isize>,
    pub confidences: Vec<f32>,
    pub boxes: Vec<AnchorBox>,
}

/// Labels anchors with their ground-truth offsets and classes, image by image.
///
/// `labels` is `(batch, num_gt, 5)` with `[class, x1, y1, x2, y2]` rows;
/// rows with a negative class are padding.
pub fn multibox_target(anchors: ArrayView2<f32>, labels: ArrayView3<f32>, iou_threshold: f32) -> Result<MultiboxTarget> {
    multibox_target_with(anchors, labels, iou_threshold, &BoxCoder::default())
}

pub fn multibox_target_with(
    anchors: ArrayView2<f32>,
    labels: ArrayView3<f32>,
    iou_threshold: f32,
    coder: &BoxCoder,
) -> Result<MultiboxTarget> {
    let anchors = AnchorBox::from_rows(anchors)?;
    let (batch_size, num_gt, row_len) = labels.dim();
    anyhow::ensure!(batch_size > 0, "Labels must hold at least one image");
    anyhow::ensure!(num_gt > 0, "Labels must hold at least one ground-truth row per image");
    anyhow::ensure!(row_len == 5, "Label rows must be [class, x1, y1, x2, y2], got width {}", row_len);

    let targets = labels
        .axis_iter(Axis(0))
        .into_par_iter()
        .map(|label| image_target(&anchors, label, iou_threshold, coder))
        .collect::<Result<Vec<ImageTarget>>>()?;

    MultiboxTarget::from_images(&targets)
}

/// Picks the best non-background class of each anchor and decodes its box.
///
/// `cls_prob` is `(num_classes, num_anchors)` with background at row 0,
/// `offset_pred` is `(num_anchors, 4)`.
pub fn decode_image(
    cls_prob: ArrayView2<f32>,
    offset_pred: ArrayView2<f32>,
    anchors: &[AnchorBox],
    coder: &BoxCoder,
) -> Result<DecodedImage> {
    let (num_classes, num_anchors) = cls_prob.dim();
    anyhow::ensure!(num_classes >= 2, "Need background plus at least one class, got {} classes", num_classes);
    anyhow::ensure!(
        num_anchors == anchors.len() && offset_pred.shape() == [num_anchors, 4],
        "Got {} anchors, {} class scores and offsets of shape {:?}",
        anchors.len(),
        num_anchors,
        offset_pred.shape()
    );

    let mut decoded = DecodedImage {
        class_ids: Vec::with_capacity(num_anchors),
        confidences: Vec::with_capacity(num_anchors),
        boxes: Vec::with_capacity(num_anchors),
    };

    for (i, (anchor, offset)) in anchors.iter().zip(offset_pred.outer_iter()).enumerate() {
        let (class_id, confidence) = match first_max(cls_prob.slice(s![1.., i])) {
            Some((class_id, confidence)) => (class_id as isize, confidence),
            None => (BACKGROUND_ID, 0.0),
        };
        decoded.class_ids.push(class_id);
        decoded.confidences.push(confidence);
        decoded
            .boxes
            .push(coder.decode_single(anchor, [offset[0], offset[1], offset[2], offset[3]]));
    }

    Ok(decoded)
}

/// Runs NMS over a decoded image and builds one record per anchor.
///
/// Kept anchors come first in NMS order, followed by the suppressed ones in
/// anchor order with `class_id = -1`. Kept anchors below `pos_threshold` are
/// reported as background with confidence `1 - confidence`.
pub fn suppress_image(decoded: &DecodedImage, nms_threshold: f32, pos_threshold: f32) -> ImageDetections {
    let scored: Vec<ScoredBox> = decoded
        .boxes
        .iter()
        .zip(&decoded.confidences)
        .map(|(&bbox, &score)| ScoredBox { bbox, score })
        .collect();

    let keep = nms(&scored, nms_threshold);
    let mut is_kept = vec![false; scored.len()];
    for &i in &keep {
        is_kept[i] = true;
    }

    let kept = keep.iter().map(|&i| {
        let confidence = decoded.confidences[i];
        let (class_id, confidence) = if confidence < pos_threshold {
            (BACKGROUND_ID, 1.0 - confidence)
        } else {
            (decoded.class_ids[i], confidence)
        };
        MultiboxDetection::new(class_id, decoded.boxes[i], None, confidence).with_anchor_id(i)
    });

    let suppressed = (0..scored.len()).filter(|&i| !is_kept[i]).map(|i| {
        MultiboxDetection::new(BACKGROUND_ID, decoded.boxes[i], None, decoded.confidences[i]).with_anchor_id(i)
    });

    let detections: Vec<MultiboxDetection> = kept.chain(suppressed).collect();
    log::debug!("NMS kept {} of {} anchors", keep.len(), detections.len());

    ImageDetections::from(detections)
}

/// Predicts boxes from class probabilities and offsets, image by image.
///
/// `cls_probs` is `(batch, num_classes, num_anchors)` with background at
/// class 0, `offset_preds` is `(batch, num_anchors, 4)` and `anchors` is
/// `(num_anchors, 4)`. Every image yields exactly `num_anchors` records.
pub fn multibox_detection(
    cls_probs: ArrayView3<f32>,
    offset_preds: ArrayView3<f32>,
    anchors: ArrayView2<f32>,
    nms_threshold: f32,
    pos_threshold: f32,
) -> Result<Vec<ImageDetections>> {
    multibox_detection_with(cls_probs, offset_preds, anchors, nms_threshold, pos_threshold, &BoxCoder::default())
}

pub fn multibox_detection_with(
    cls_probs: ArrayView3<f32>,
    offset_preds: ArrayView3<f32>,
    anchors: ArrayView2<f32>,
    nms_threshold: f32,
    pos_threshold: f32,
    coder: &BoxCoder,
) -> Result<Vec<ImageDetections>> {
    let detect_time = Instant::now();

    let decoded = decode_batch(cls_probs, offset_preds, anchors, coder)?;
    let decode_elapsed = utils::trace("TIME", "Decode", detect_time, Duration::ZERO);

    let detections = suppress_batch(&decoded, nms_threshold, pos_threshold);
    utils::trace("TIME", "NMS", detect_time, decode_elapsed);

    Ok(detections)
}

pub(crate) fn decode_batch(
    cls_probs: ArrayView3<f32>,
    offset_preds: ArrayView3<f32>,
    anchors: ArrayView2<f32>,
    coder: &BoxCoder,
) -> Result<Vec<DecodedImage>> {
    let anchors = AnchorBox::from_rows(anchors)?;
    anyhow::ensure!(
        cls_probs.len_of(Axis(0)) == offset_preds.len_of(Axis(0)),
        "Class probabilities cover {} images but offsets cover {}",
        cls_probs.len_of(Axis(0)),
        offset_preds.len_of(Axis(0))
    );

    cls_probs
        .axis_iter(Axis(0))
        .into_par_iter()
        .zip(offset_preds.axis_iter(Axis(0)).into_par_iter())
        .map(|(cls_prob, offset_pred)| decode_image(cls_prob, offset_pred, &anchors, coder))
        .collect()
}

pub(crate) fn suppress_batch(decoded: &[DecodedImage], nms_threshold: f32, pos_threshold: f32) -> Vec<ImageDetections> {
    decoded
        .par_iter()
        .map(|image| suppress_image(image, nms_threshold, pos_threshold))
        .collect()
}
