mod utils;
mod detectors;
pub mod data;
pub mod detection_runners;
pub mod detection_processing;
pub mod common;

use std::time::Instant;
use ndarray::{ArrayView2, ArrayView3};
use crate::common::ImageDetections;
use crate::data::ConfigMultibox;

pub use crate::detection_processing::{multibox_detection, multibox_target};
pub use crate::detection_runners::anchor_generator::multibox_prior;
pub use crate::detection_runners::assignment::assign_anchor_to_bbox;
pub use crate::detection_runners::box_coder::{offset_boxes, offset_inverse};
pub use crate::detection_runners::inference_process::InferenceProcess;
pub use crate::detection_runners::iou::box_iou;
pub use crate::detection_runners::nms::{nms, nms_boxes};
pub use crate::detectors::{HeadOutputs, MultiboxPipeline};

pub fn init_pipeline(config: &ConfigMultibox) -> anyhow::Result<MultiboxPipeline> {
    MultiboxPipeline::new(config.clone())
}

pub fn run_detection(
    pipeline: &MultiboxPipeline,
    cls_probs: ArrayView3<f32>,
    offset_preds: ArrayView3<f32>,
    anchors: ArrayView2<f32>,
) -> anyhow::Result<Vec<ImageDetections>> {
    let now = Instant::now();

    let detections = pipeline.detect(cls_probs, offset_preds, anchors)?;

    log::debug!("Processing time: {:?}", now.elapsed());

    Ok(detections)
}
