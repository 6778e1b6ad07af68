use anyhow::Result;
use ndarray::{Array1, ArrayView2};

use crate::common::{AnchorBox, GroundTruth, ImageTarget};
use crate::detection_runners::box_coder::BoxCoder;
use crate::detection_runners::iou::pairwise_iou;
use crate::utils::first_max;

/// Assignment map entry of an anchor without a ground-truth box.
pub const UNASSIGNED: isize = -1;

const DISCARDED: f32 = -1.0;

/// Assigns the closest ground-truth box to each anchor.
///
/// First every anchor whose best IoU reaches `iou_threshold` takes that box.
/// Then, once per ground-truth box, the largest remaining IoU pair is
/// assigned (overriding the first pass) and its row and column are
/// discarded, so every box ends up with at least one anchor.
///
/// Both inputs are `(N, 4)` corner-form arrays. Returns one ground-truth
/// index per anchor, or [`UNASSIGNED`].
pub fn assign_anchor_to_bbox(
    ground_truth: ArrayView2<f32>,
    anchors: ArrayView2<f32>,
    iou_threshold: f32,
) -> Result<Array1<isize>> {
    let ground_truth = AnchorBox::from_rows(ground_truth)?;
    let anchors = AnchorBox::from_rows(anchors)?;
    assign_boxes(&ground_truth, &anchors, iou_threshold)
}

pub(crate) fn assign_boxes(
    ground_truth: &[AnchorBox],
    anchors: &[AnchorBox],
    iou_threshold: f32,
) -> Result<Array1<isize>> {
    anyhow::ensure!(!ground_truth.is_empty(), "Cannot assign anchors to an empty ground-truth set");

    let (num_anchors, num_gt) = (anchors.len(), ground_truth.len());
    let mut jaccard = pairwise_iou(anchors, ground_truth);
    let mut anchors_bbox_map = Array1::from_elem(num_anchors, UNASSIGNED);

    for (anchor, row) in jaccard.outer_iter().enumerate() {
        if let Some((box_idx, iou)) = first_max(row) {
            if iou >= iou_threshold {
                anchors_bbox_map[anchor] = box_idx as isize;
            }
        }
    }

    for _ in 0..num_gt {
        let Some((max_idx, iou)) = first_max(jaccard.iter()) else {
            break;
        };
        if iou < 0.0 {
            // fewer anchors than boxes, everything has been taken
            break;
        }
        let (anc_idx, box_idx) = (max_idx / num_gt, max_idx % num_gt);
        anchors_bbox_map[anc_idx] = box_idx as isize;
        jaccard.column_mut(box_idx).fill(DISCARDED);
        jaccard.row_mut(anc_idx).fill(DISCARDED);
    }

    Ok(anchors_bbox_map)
}

/// Builds the training targets of one image from its `(num_gt, 5)` label rows.
pub fn image_target(
    anchors: &[AnchorBox],
    labels: ArrayView2<f32>,
    iou_threshold: f32,
    coder: &BoxCoder,
) -> Result<ImageTarget> {
    let ground_truth = GroundTruth::from_label_rows(labels)?;
    let mut target = ImageTarget::background(anchors.len());

    if ground_truth.is_empty() {
        log::warn!("Image has only padding labels, every anchor is background");
        return Ok(target);
    }

    let gt_boxes: Vec<AnchorBox> = ground_truth.iter().map(|gt| gt.bbox).collect();
    let anchors_bbox_map = assign_boxes(&gt_boxes, anchors, iou_threshold)?;

    for (anchor_idx, &bb_idx) in anchors_bbox_map.iter().enumerate() {
        if bb_idx == UNASSIGNED {
            continue;
        }
        let gt = &ground_truth[bb_idx as usize];
        let offset = coder.encode_single(&anchors[anchor_idx], &gt.bbox);

        target.class_labels[anchor_idx] = gt.class_id + 1;
        target.bbox_mask.row_mut(anchor_idx).fill(1.0);
        for (j, v) in offset.into_iter().enumerate() {
            target.bbox_offset[[anchor_idx, j]] = v;
        }
    }

    log::debug!(
        "Assigned {} of {} anchors to {} ground-truth boxes",
        target.num_assigned(),
        anchors.len(),
        ground_truth.len()
    );

    Ok(target)
}
