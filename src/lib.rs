//! Lane-line detection for dashcam frames.
//!
//! Segments from a Hough detector are split into left/right groups by slope,
//! each group is fitted with a straight line by least squares, and the lines
//! are drawn over the frame.
//!
//! ```no_run
//! use lanelines::{FramePipeline, PipelineConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let pipeline = FramePipeline::new(PipelineConfig::default())?;
//! let frame = image::open("solidWhiteRight.jpg")?.to_rgb8();
//! let out = pipeline.process(&frame);
//! println!("left drawn: {}", out.report.left.is_drawn());
//! out.frame.save("out.jpg")?;
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod detection;
pub mod error;
pub mod lane;
pub mod output;
pub mod pipeline;

pub use crate::config::{load_config, OverlayMode, PipelineConfig};
pub use crate::error::{ConfigError, FitError};
pub use crate::lane::{classify, fit, render, render_with_extremities};
pub use crate::pipeline::{FramePipeline, FrameReport, LaneOutcome, ProcessedFrame};
