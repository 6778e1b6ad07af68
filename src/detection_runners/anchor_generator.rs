use anyhow::Result;
use ndarray::Array2;

/// Generates the multibox anchor grid of an image.
///
/// Every pixel gets one box per `(size, ratio)` pair, enumerated as
/// `(s0, r0), (s0, r1), .., (s0, rm), (s1, r0), .., (sn, r0)`.
#[derive(Debug, Clone)]
pub struct AnchorGenerator {
    pub sizes: Vec<f32>,
    pub ratios: Vec<f32>,
    pub wh_pairs: Vec<(f32, f32)>,
}

impl AnchorGenerator {
    pub fn new(sizes: &[f32], ratios: &[f32]) -> Result<AnchorGenerator> {
        anyhow::ensure!(!sizes.is_empty(), "At least one anchor size is required");
        anyhow::ensure!(!ratios.is_empty(), "At least one anchor ratio is required");
        anyhow::ensure!(
            sizes.iter().all(|&s| s > 0.0) && ratios.iter().all(|&r| r > 0.0),
            "Anchor sizes and ratios must be positive, got sizes={:?} ratios={:?}",
            sizes,
            ratios
        );

        let wh_pairs = Self::create_width_height_pairs(sizes, ratios);

        Ok(AnchorGenerator {
            sizes: sizes.to_vec(),
            ratios: ratios.to_vec(),
            wh_pairs,
        })
    }

    /// Number of anchors centered on each pixel.
    pub fn boxes_per_pixel(&self) -> usize {
        self.sizes.len() + self.ratios.len() - 1
    }

    /// Number of anchors generated for an image of `height` x `width`.
    pub fn num_anchors(&self, height: usize, width: usize) -> usize {
        height * width * self.boxes_per_pixel()
    }

    /// Generate width and height pairs for square pixels.
    ///
    /// For `size` and `ratio` the pair is `(size * sqrt(ratio), size / sqrt(ratio))`.
    fn create_width_height_pairs(sizes: &[f32], ratios: &[f32]) -> Vec<(f32, f32)> {
        let first_size = sizes[0];
        let first_ratio = ratios[0];

        ratios
            .iter()
            .map(|&r| (first_size, r))
            .chain(sizes[1..].iter().map(|&s| (s, first_ratio)))
            .map(|(size, ratio)| {
                let sqrt_ar = ratio.sqrt();
                (size * sqrt_ar, size / sqrt_ar)
            })
            .collect()
    }

    /// Creates the `(height * width * boxes_per_pixel, 4)` corner-form anchors,
    /// normalized to the image size.
    pub fn create_boxes(&self, height: usize, width: usize) -> Result<Array2<f32>> {
        anyhow::ensure!(
            height > 0 && width > 0,
            "Image size must be positive, got {}x{}",
            height,
            width
        );

        let (in_height, in_width) = (height as f32, width as f32);
        // keeps `ratio` the real aspect ratio once scaled back to pixels
        let aspect = in_height / in_width;

        let num_pairs = self.wh_pairs.len();
        let mut boxes = Array2::zeros((height * width * num_pairs, 4));

        let mut i = 0;
        for row in 0..height {
            let cy = (row as f32 + 0.5) / in_height;
            for col in 0..width {
                let cx = (col as f32 + 0.5) / in_width;
                for &(w, h) in &self.wh_pairs {
                    let (half_w, half_h) = (w * aspect / 2.0, h / 2.0);
                    boxes[[i, 0]] = cx - half_w;
                    boxes[[i, 1]] = cy - half_h;
                    boxes[[i, 2]] = cx + half_w;
                    boxes[[i, 3]] = cy + half_h;
                    i += 1;
                }
            }
        }

        log::debug!(
            "Generated {} anchors for a {}x{} grid ({} per pixel)",
            boxes.nrows(),
            height,
            width,
            num_pairs
        );

        Ok(boxes)
    }
}

/// Generates anchors centered on each pixel of a `height` x `width` image.
pub fn multibox_prior(height: usize, width: usize, sizes: &[f32], ratios: &[f32]) -> Result<Array2<f32>> {
    AnchorGenerator::new(sizes, ratios)?.create_boxes(height, width)
}
