mod image_files;

pub use image_files::{frame_names, ImageFileSource};

use anyhow::Result;
use image::RgbImage;

/// One decoded frame and the name it was read under
pub struct Frame {
    pub name: String,
    pub image: RgbImage,
}

/// Trait for frame sources
pub trait FrameSource {
    /// Read the next frame, or `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Number of frames still to come, when known
    fn remaining(&self) -> Option<usize> {
        None
    }
}
