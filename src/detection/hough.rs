use image::GrayImage;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};

use super::SegmentDetector;
use crate::config::HoughConfig;
use crate::lane::Segment;

/// Half-width, in pixels, of the band searched for edge pixels around a
/// detected line. Absorbs the accumulator's one-pixel, one-degree binning.
const BAND: i32 = 1;

/// Probabilistic-style Hough segment detector
///
/// Full lines come from the imageproc Hough accumulator; each line is then
/// walked pixel by pixel and split into runs of edge pixels. Runs are broken
/// by gaps longer than `max_line_gap` and kept when at least
/// `min_line_length` long.
pub struct HoughSegmentDetector {
    config: HoughConfig,
}

impl HoughSegmentDetector {
    pub fn new(config: HoughConfig) -> Self {
        Self { config }
    }

    fn segments_on_line(&self, edges: &GrayImage, line: &PolarLine, out: &mut Vec<Segment>) {
        let (width, height) = edges.dimensions();
        let theta = (line.angle_in_degrees as f64).to_radians();
        let (sin, cos) = theta.sin_cos();
        let r = line.r as f64;
        // Foot of the perpendicular from the origin, and the line direction.
        let foot = (r * cos, r * sin);
        let dir = (-sin, cos);
        let reach = (width as f64).hypot(height as f64).ceil() as i64;

        let is_edge = |x: i32, y: i32| {
            x >= 0
                && y >= 0
                && (x as u32) < width
                && (y as u32) < height
                && edges.get_pixel(x as u32, y as u32)[0] > 0
        };

        let mut run: Option<((i32, i32), (i32, i32))> = None;
        let mut gap = 0.0f64;
        for t in -reach..=reach {
            let px = foot.0 + dir.0 * t as f64;
            let py = foot.1 + dir.1 * t as f64;
            let hit = (-BAND..=BAND).find_map(|k| {
                let x = (px + cos * k as f64).round() as i32;
                let y = (py + sin * k as f64).round() as i32;
                is_edge(x, y).then_some((x, y))
            });

            if let Some(p) = hit {
                let first = run.map_or(p, |(first, _)| first);
                run = Some((first, p));
                gap = 0.0;
            } else if run.is_some() {
                gap += 1.0;
                if gap > self.config.max_line_gap {
                    if let Some((first, last)) = run.take() {
                        self.emit(first, last, out);
                    }
                }
            }
        }
        if let Some((first, last)) = run {
            self.emit(first, last, out);
        }
    }

    fn emit(&self, first: (i32, i32), last: (i32, i32), out: &mut Vec<Segment>) {
        let dx = (last.0 - first.0) as f64;
        let dy = (last.1 - first.1) as f64;
        if dx.hypot(dy) >= self.config.min_line_length {
            out.push(Segment::new(
                first.0 as f64,
                first.1 as f64,
                last.0 as f64,
                last.1 as f64,
            ));
        }
    }
}

impl SegmentDetector for HoughSegmentDetector {
    fn detect(&self, edges: &GrayImage) -> Vec<Segment> {
        let _span = tracing::debug_span!("hough_detect").entered();

        let lines = detect_lines(
            edges,
            LineDetectionOptions {
                vote_threshold: self.config.vote_threshold,
                suppression_radius: self.config.suppression_radius,
            },
        );

        let mut segments = Vec::new();
        for line in &lines {
            self.segments_on_line(edges, line, &mut segments);
        }

        tracing::debug!(
            lines = lines.len(),
            segments = segments.len(),
            "Hough segments extracted"
        );
        segments
    }
}
