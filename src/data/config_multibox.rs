//! Options for building a multibox pipeline.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::detection_runners::box_coder::BoxCoder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigMultibox {
    // anchors
    pub sizes: Vec<f32>,
    pub ratios: Vec<f32>,

    // training targets
    pub iou_threshold: f32,

    // post-processing
    pub nms_threshold: f32,
    pub pos_threshold: f32,

    // offsets
    pub weights: (f32, f32, f32, f32),
    pub xform_clip: Option<f32>,

    pub names: Option<Vec<String>>,
}

impl Default for ConfigMultibox {
    fn default() -> Self {
        Self {
            sizes: vec![0.75, 0.5, 0.25],
            ratios: vec![1.0, 2.0, 0.5],
            iou_threshold: 0.5,
            nms_threshold: 0.5,
            pos_threshold: 0.009999999,
            weights: (10.0, 10.0, 5.0, 5.0),
            xform_clip: None,
            names: None,
        }
    }
}

impl ConfigMultibox {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.sizes.is_empty(), "`sizes` must not be empty");
        anyhow::ensure!(!self.ratios.is_empty(), "`ratios` must not be empty");
        anyhow::ensure!(
            self.sizes.iter().chain(&self.ratios).all(|&x| x > 0.0),
            "`sizes` and `ratios` must be positive"
        );
        for (name, x) in [
            ("iou_threshold", self.iou_threshold),
            ("nms_threshold", self.nms_threshold),
            ("pos_threshold", self.pos_threshold),
        ] {
            anyhow::ensure!((0.0..=1.0).contains(&x), "`{}` must be within [0, 1], got {}", name, x);
        }
        let (wx, wy, ww, wh) = self.weights;
        anyhow::ensure!(
            wx > 0.0 && wy > 0.0 && ww > 0.0 && wh > 0.0,
            "Offset weights must be positive, got {:?}",
            self.weights
        );
        Ok(())
    }

    pub fn box_coder(&self) -> BoxCoder {
        BoxCoder::new(self.weights).with_clip(self.xform_clip)
    }

    pub fn with_sizes(mut self, x: &[f32]) -> Self {
        self.sizes = x.to_vec();
        self
    }

    pub fn with_ratios(mut self, x: &[f32]) -> Self {
        self.ratios = x.to_vec();
        self
    }

    pub fn with_iou_threshold(mut self, x: f32) -> Self {
        self.iou_threshold = x;
        self
    }

    pub fn with_nms_threshold(mut self, x: f32) -> Self {
        self.nms_threshold = x;
        self
    }

    pub fn with_pos_threshold(mut self, x: f32) -> Self {
        self.pos_threshold = x;
        self
    }

    pub fn with_weights(mut self, x: (f32, f32, f32, f32)) -> Self {
        self.weights = x;
        self
    }

    pub fn with_xform_clip(mut self, x: Option<f32>) -> Self {
        self.xform_clip = x;
        self
    }

    pub fn with_names(mut self, names: &[&str]) -> Self {
        self.names = Some(names.iter().map(|x| x.to_string()).collect::<Vec<String>>());
        self
    }
}
