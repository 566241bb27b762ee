mod image_files;

pub use image_files::ImageFileSink;

use anyhow::Result;
use image::RgbImage;

/// Trait for output destinations
pub trait FrameSink {
    /// Write a processed frame under `name`
    fn write_frame(&mut self, name: &str, frame: &RgbImage) -> Result<()>;
}
