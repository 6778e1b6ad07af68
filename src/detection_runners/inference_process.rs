use std::time::{Duration, Instant};

use crate::common::ImageDetections;
use crate::data::ConfigMultibox;
use crate::utils;

pub trait InferenceProcess: Sized {
    type Input; // raw head outputs of a detection model
    type Decoded;

    /// Creates a new instance of the process with the given options.
    fn new(config: ConfigMultibox) -> anyhow::Result<Self>;

    /// Turns model outputs into per-anchor classes and boxes.
    fn preprocess(&self, xs: &Self::Input) -> anyhow::Result<Self::Decoded>;

    /// Suppresses overlaps and builds the per-image records.
    fn postprocess(&self, decoded: Self::Decoded) -> anyhow::Result<Vec<ImageDetections>>;

    /// Executes the full pipeline.
    fn run(&self, xs: &Self::Input) -> anyhow::Result<Vec<ImageDetections>> {
        let ys = self.preprocess(xs)?;
        self.postprocess(ys)
    }

    /// Executes the full pipeline, logging how long each stage took when `profile` is set.
    fn forward(&self, xs: &Self::Input, profile: bool) -> anyhow::Result<Vec<ImageDetections>> {
        let detect_time = Instant::now();

        let t_pre = Instant::now();
        let ys = self.preprocess(xs)?;
        let t_pre = t_pre.elapsed();

        let decode_elapsed = utils::trace("TIME", "Decode", detect_time, Duration::ZERO);

        let t_post = Instant::now();
        let ys = self.postprocess(ys)?;
        let t_post = t_post.elapsed();

        utils::trace("TIME", "Postprocessing", detect_time, decode_elapsed);

        if profile {
            log::info!("> Decode: {t_pre:?} | Postprocess: {t_post:?}");
        }

        Ok(ys)
    }
}
