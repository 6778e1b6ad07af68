use anyhow::Result;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3};

use crate::common::{ImageDetections, MultiboxTarget};
use crate::data::ConfigMultibox;
use crate::detection_processing::{self, DecodedImage};
use crate::detection_runners::anchor_generator::AnchorGenerator;
use crate::detection_runners::box_coder::BoxCoder;
use crate::detection_runners::inference_process::InferenceProcess;

/// Head outputs of a multibox model for a batch of images.
#[derive(Debug, Clone)]
pub struct HeadOutputs {
    /// `(batch, num_classes, num_anchors)`, background at class 0.
    pub cls_probs: Array3<f32>,
    /// `(batch, num_anchors, 4)`.
    pub offset_preds: Array3<f32>,
    /// `(num_anchors, 4)` corner-form anchors the offsets refer to.
    pub anchors: Array2<f32>,
}

/// Anchor generation, target assignment and detection bound to one configuration.
#[derive(Debug, Clone)]
pub struct MultiboxPipeline {
    config: ConfigMultibox,
    generator: AnchorGenerator,
    coder: BoxCoder,
    names: Vec<String>,
}

impl InferenceProcess for MultiboxPipeline {
    type Input = HeadOutputs;
    type Decoded = Vec<DecodedImage>;

    fn new(config: ConfigMultibox) -> Result<Self> {
        config.validate()?;

        let generator = AnchorGenerator::new(&config.sizes, &config.ratios)?;
        let coder = config.box_coder();
        let names = config.names.clone().unwrap_or_default();

        log::info!(
            "Multibox pipeline | sizes: {:?} | ratios: {:?} | {} anchors per pixel | NMS: {}",
            config.sizes,
            config.ratios,
            generator.boxes_per_pixel(),
            config.nms_threshold
        );

        Ok(Self {
            config,
            generator,
            coder,
            names,
        })
    }

    fn preprocess(&self, xs: &Self::Input) -> Result<Self::Decoded> {
        detection_processing::decode_batch(xs.cls_probs.view(), xs.offset_preds.view(), xs.anchors.view(), &self.coder)
    }

    fn postprocess(&self, decoded: Self::Decoded) -> Result<Vec<ImageDetections>> {
        let ys = detection_processing::suppress_batch(&decoded, self.config.nms_threshold, self.config.pos_threshold);
        Ok(ys.into_iter().map(|y| self.label(y)).collect())
    }
}

impl MultiboxPipeline {
    pub fn config(&self) -> &ConfigMultibox {
        &self.config
    }

    /// Anchors of a `height` x `width` feature map.
    pub fn anchors(&self, height: usize, width: usize) -> Result<Array2<f32>> {
        self.generator.create_boxes(height, width)
    }

    /// Training targets for `(batch, num_gt, 5)` labels.
    pub fn targets(&self, anchors: ArrayView2<f32>, labels: ArrayView3<f32>) -> Result<MultiboxTarget> {
        detection_processing::multibox_target_with(anchors, labels, self.config.iou_threshold, &self.coder)
    }

    /// One record per anchor and image, labelled with the configured class names.
    pub fn detect(&self, cls_probs: ArrayView3<f32>, offset_preds: ArrayView3<f32>, anchors: ArrayView2<f32>) -> Result<Vec<ImageDetections>> {
        let ys = detection_processing::multibox_detection_with(
            cls_probs,
            offset_preds,
            anchors,
            self.config.nms_threshold,
            self.config.pos_threshold,
            &self.coder,
        )?;
        Ok(ys.into_iter().map(|y| self.label(y)).collect())
    }

    /// Name of `class_id`, `"# {class_id}"` when no name was configured.
    pub fn class_name(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("# {}", class_id))
    }

    fn label(&self, y: ImageDetections) -> ImageDetections {
        y.into_detections()
            .into_iter()
            .map(|d| match usize::try_from(d.class_id) {
                Ok(class_id) => {
                    let name = self.class_name(class_id);
                    d.with_label(&name)
                }
                Err(_) => d,
            })
            .collect::<Vec<_>>()
            .into()
    }
}
