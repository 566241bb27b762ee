//! Per-frame orchestration: edges → segments → lanes → blended overlay.
//!
//! `FramePipeline` keeps no state between frames, so one instance can be
//! shared by reference across worker threads.

use image::{Rgb, RgbImage};
use serde::Serialize;

use crate::config::{BlendConfig, OverlayMode, PipelineConfig};
use crate::detection::{create_default_detector, EdgePreprocessor, SegmentDetector};
use crate::error::{ConfigError, FitError};
use crate::lane::{
    classify, draw_thick_segment, fit, render_with_extremities, LaneModel, LineStyle,
    RenderStats, Segment, Side,
};

/// What happened to one lane side in one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LaneOutcome {
    Drawn {
        model: LaneModel,
        stats: RenderStats,
    },
    Skipped {
        #[serde(serialize_with = "serialize_display")]
        reason: FitError,
    },
    /// Lane fitting was not requested for this frame (segment overlay).
    NotRendered,
}

impl LaneOutcome {
    /// True when at least one piece of the lane reached the overlay.
    pub fn is_drawn(&self) -> bool {
        matches!(self, LaneOutcome::Drawn { stats, .. } if stats.drawn > 0)
    }
}

fn serialize_display<S: serde::Serializer>(err: &FitError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub segments: usize,
    pub discarded: usize,
    pub left: LaneOutcome,
    pub right: LaneOutcome,
    /// Whether the output differs from the input frame.
    pub blended: bool,
}

impl FrameReport {
    pub fn side(&self, side: Side) -> &LaneOutcome {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

pub struct ProcessedFrame {
    pub frame: RgbImage,
    pub report: FrameReport,
}

pub struct FramePipeline {
    config: PipelineConfig,
    preprocessor: EdgePreprocessor,
    detector: Box<dyn SegmentDetector>,
}

impl FramePipeline {
    /// Build a pipeline with the default Hough segment detector
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        let detector = create_default_detector(&config);
        Self::with_detector(config, detector)
    }

    /// Build a pipeline around a caller-supplied segment detector
    pub fn with_detector(
        config: PipelineConfig,
        detector: Box<dyn SegmentDetector>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            preprocessor: EdgePreprocessor::new(&config),
            config,
            detector,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage on one frame.
    pub fn process(&self, frame: &RgbImage) -> ProcessedFrame {
        let _span = tracing::debug_span!("process_frame").entered();

        let edges = self.preprocessor.edges(frame);
        let segments = self.detector.detect(&edges);
        self.process_segments(frame, &segments)
    }

    /// Lane stages only, for callers that bring their own segments.
    pub fn process_segments(&self, frame: &RgbImage, segments: &[Segment]) -> ProcessedFrame {
        let (width, height) = frame.dimensions();
        let mut overlay = RgbImage::new(width, height);

        let report = match self.config.overlay {
            OverlayMode::Lanes => self.draw_lanes(segments, &mut overlay),
            OverlayMode::Segments => self.draw_segments(segments, &mut overlay),
        };

        if !report.blended {
            return ProcessedFrame {
                frame: frame.clone(),
                report,
            };
        }
        let blended = blend(frame, &overlay, &self.config.blend);
        ProcessedFrame {
            frame: blended,
            report,
        }
    }

    /// Classify, fit and render each side onto `overlay`. A failure on one
    /// side never affects the other.
    pub fn draw_lanes(&self, segments: &[Segment], overlay: &mut RgbImage) -> FrameReport {
        let lanes = &self.config.lanes;
        let style = self.style();
        let classification = classify(segments, lanes.min_abs_slope);

        let mut outcome = |side: Side| -> LaneOutcome {
            let side_cfg = lanes.side(side);
            match fit(classification.group(side), lanes.min_abs_slope) {
                Ok(model) => {
                    let stats = render_with_extremities(
                        &model,
                        &side_cfg.span,
                        &side_cfg.extremities,
                        overlay,
                        &style,
                        lanes.min_abs_slope,
                    );
                    LaneOutcome::Drawn { model, stats }
                }
                Err(reason) => {
                    tracing::debug!(%side, %reason, "Skipping lane side");
                    LaneOutcome::Skipped { reason }
                }
            }
        };
        let left = outcome(Side::Left);
        let right = outcome(Side::Right);

        FrameReport {
            segments: segments.len(),
            discarded: classification.discarded,
            blended: left.is_drawn() || right.is_drawn(),
            left,
            right,
        }
    }

    /// Draw every detected segment as-is.
    fn draw_segments(&self, segments: &[Segment], overlay: &mut RgbImage) -> FrameReport {
        let style = LineStyle {
            color: self.style().color,
            thickness: 4,
        };
        for s in segments {
            let a = (s.x1.round() as i32, s.y1.round() as i32);
            let b = (s.x2.round() as i32, s.y2.round() as i32);
            draw_thick_segment(overlay, a, b, &style);
        }
        FrameReport {
            segments: segments.len(),
            discarded: 0,
            left: LaneOutcome::NotRendered,
            right: LaneOutcome::NotRendered,
            blended: !segments.is_empty(),
        }
    }

    fn style(&self) -> LineStyle {
        LineStyle {
            color: Rgb(self.config.lanes.color),
            thickness: self.config.lanes.thickness,
        }
    }
}

/// `original * a + overlay * b + offset` per channel, rounded and saturated.
pub fn blend(original: &RgbImage, overlay: &RgbImage, weights: &BlendConfig) -> RgbImage {
    let _span = tracing::debug_span!("blend").entered();

    let mut out = original.clone();
    for (dst, over) in out.pixels_mut().zip(overlay.pixels()) {
        for c in 0..3 {
            let v = dst[c] as f32 * weights.original_weight
                + over[c] as f32 * weights.overlay_weight
                + weights.offset;
            dst[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
