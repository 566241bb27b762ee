use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::point::Point;

use crate::config::PipelineConfig;

/// Turns an RGB frame into a masked binary edge map
pub struct EdgePreprocessor {
    sigma: f32,
    low_threshold: f32,
    high_threshold: f32,
    region: Vec<Point<i32>>,
}

impl EdgePreprocessor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            sigma: config.blur.sigma,
            low_threshold: config.edges.low_threshold,
            high_threshold: config.edges.high_threshold,
            region: config
                .region
                .vertices
                .iter()
                .map(|v| Point::new(v[0], v[1]))
                .collect(),
        }
    }

    /// Edge map of `frame` restricted to the region polygon
    ///
    /// Steps:
    /// 1. Convert to grayscale
    /// 2. Gaussian blur
    /// 3. Canny edge detection
    /// 4. Zero everything outside the region polygon
    pub fn edges(&self, frame: &RgbImage) -> GrayImage {
        let _span = tracing::debug_span!("edges").entered();

        let gray = imageops::grayscale(frame);
        let blurred = gaussian_blur_f32(&gray, self.sigma);
        let mut edges = canny(&blurred, self.low_threshold, self.high_threshold);

        let (width, height) = edges.dimensions();
        let mask = self.region_mask(width, height);
        for (edge, keep) in edges.pixels_mut().zip(mask.pixels()) {
            if keep[0] == 0 {
                edge[0] = 0;
            }
        }
        edges
    }

    /// White-filled region polygon on a black canvas
    pub fn region_mask(&self, width: u32, height: u32) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        draw_polygon_mut(&mut mask, &self.region, Luma([255u8]));
        mask
    }
}
