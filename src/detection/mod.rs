mod hough;
mod preprocess;

pub use hough::HoughSegmentDetector;
pub use preprocess::EdgePreprocessor;

use image::GrayImage;

use crate::config::PipelineConfig;
use crate::lane::Segment;

/// Trait for line-segment detectors
/// Allows swapping the Hough-based default for another extractor
pub trait SegmentDetector: Send + Sync {
    /// Find straight edge fragments in a binary edge raster
    ///
    /// # Arguments
    /// * `edges` - Edge map, non-zero pixels are edges
    fn detect(&self, edges: &GrayImage) -> Vec<Segment>;
}

/// Create the default Hough segment detector from the pipeline config
pub fn create_default_detector(config: &PipelineConfig) -> Box<dyn SegmentDetector> {
    Box::new(HoughSegmentDetector::new(config.hough.clone()))
}
