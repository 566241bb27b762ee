use super::FrameSink;
use anyhow::{Context, Result};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes frames as image files into one directory, format chosen by extension
pub struct ImageFileSink {
    dir: PathBuf,
}

impl ImageFileSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        tracing::info!("Writing frames to {}", dir.display());
        Ok(Self { dir })
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Shared-reference write, so parallel workers can use one sink
    pub fn write(&self, name: &str, frame: &RgbImage) -> Result<()> {
        let path = self.path_for(name);
        frame
            .save(&path)
            .with_context(|| format!("Failed to write frame to {}", path.display()))?;
        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl FrameSink for ImageFileSink {
    fn write_frame(&mut self, name: &str, frame: &RgbImage) -> Result<()> {
        self.write(name, frame)
    }
}
