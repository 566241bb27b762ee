use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use super::types::LaneModel;

/// Evenly spaced x columns a lane model is evaluated at.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleSpan {
    pub x_min: f64,
    pub x_max: f64,
    pub samples: usize,
}

impl SampleSpan {
    pub fn new(x_min: f64, x_max: f64, samples: usize) -> Self {
        Self {
            x_min,
            x_max,
            samples,
        }
    }

    /// Inclusive linspace over `[x_min, x_max]`.
    pub fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        let step = if self.samples > 1 {
            (self.x_max - self.x_min) / (self.samples - 1) as f64
        } else {
            0.0
        };
        (0..self.samples).map(move |i| self.x_min + step * i as f64)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStyle {
    pub color: Rgb<u8>,
    pub thickness: u32,
}

/// Integer pixel points of a sampled lane, ordered by x.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Polyline {
    pub points: Vec<(i32, i32)>,
}

impl Polyline {
    /// Samples `model` over `span` and at each extremity x, sorted by x ascending.
    pub fn sample(model: &LaneModel, span: &SampleSpan, extremities: &[f64]) -> Self {
        let mut points: Vec<(i32, i32)> = span
            .xs()
            .chain(extremities.iter().copied())
            .map(|x| {
                let x = x.trunc();
                (x as i32, model.predict(x).trunc() as i32)
            })
            .collect();
        points.sort_by_key(|p| p.0);
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = ((i32, i32), (i32, i32))> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Outcome of one render call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub drawn: usize,
    pub skipped: usize,
    /// Pairs with a valid slope that fall entirely outside the surface.
    pub offscreen: usize,
}

/// Draws `model` over `span` onto `surface`.
pub fn render(
    model: &LaneModel,
    span: &SampleSpan,
    surface: &mut RgbImage,
    style: &LineStyle,
    min_abs_slope: f64,
) -> RenderStats {
    render_with_extremities(model, span, &[], surface, style, min_abs_slope)
}

/// Draws `model` over `span` plus the fixed anchor columns in `extremities`,
/// so the line always reaches the near and far bounds of the lane region.
///
/// A pair of consecutive points is left out when its local slope is
/// non-finite or flatter than `min_abs_slope`; the rest of the line is still
/// drawn.
pub fn render_with_extremities(
    model: &LaneModel,
    span: &SampleSpan,
    extremities: &[f64],
    surface: &mut RgbImage,
    style: &LineStyle,
    min_abs_slope: f64,
) -> RenderStats {
    let _span = tracing::debug_span!("render", samples = span.samples).entered();

    let polyline = Polyline::sample(model, span, extremities);
    let mut stats = RenderStats::default();
    for (a, b) in polyline.pairs() {
        // Sampled y saturates at the i32 bounds, so subtract in f64.
        let slope = (b.1 as f64 - a.1 as f64) / (b.0 as f64 - a.0 as f64);
        if !slope.is_finite() || slope.abs() < min_abs_slope {
            stats.skipped += 1;
            continue;
        }
        if draw_thick_segment(surface, a, b, style) {
            stats.drawn += 1;
        } else {
            stats.offscreen += 1;
        }
    }

    tracing::debug!(
        drawn = stats.drawn,
        skipped = stats.skipped,
        offscreen = stats.offscreen,
        "Lane rendered"
    );
    stats
}

/// Draws a segment `thickness` pixels wide with round caps.
///
/// The segment is clipped to the surface (grown by the pen radius) before
/// drawing. Returns false when nothing of it lands on the surface.
pub fn draw_thick_segment(
    surface: &mut RgbImage,
    a: (i32, i32),
    b: (i32, i32),
    style: &LineStyle,
) -> bool {
    let (width, height) = surface.dimensions();
    // A pen wider than the surface paints the same pixels as one that just covers it.
    let half = (style.thickness as f64 / 2.0).min(width as f64 + height as f64);
    let margin = half.ceil() + 1.0;
    let Some((start, end)) = clip_segment(
        (a.0 as f64, a.1 as f64),
        (b.0 as f64, b.1 as f64),
        (-margin, -margin),
        (width as f64 - 1.0 + margin, height as f64 - 1.0 + margin),
    ) else {
        return false;
    };
    let start = (start.0.round() as f32, start.1.round() as f32);
    let end = (end.0.round() as f32, end.1.round() as f32);
    if style.thickness <= 1 {
        draw_line_segment_mut(surface, start, end, style.color);
        return true;
    }

    let half = half as f32;
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len > 0.0 {
        let (nx, ny) = (-dy / len * half, dx / len * half);
        let corner = |p: (f32, f32), s: f32| {
            Point::new((p.0 + s * nx).round() as i32, (p.1 + s * ny).round() as i32)
        };
        let quad = [
            corner(start, 1.0),
            corner(end, 1.0),
            corner(end, -1.0),
            corner(start, -1.0),
        ];
        if quad[0] != quad[3] {
            draw_polygon_mut(surface, &quad, style.color);
        } else {
            draw_line_segment_mut(surface, start, end, style.color);
        }
    }

    let radius = (half.floor() as i32).max(1);
    for p in [start, end] {
        draw_filled_circle_mut(surface, (p.0 as i32, p.1 as i32), radius, style.color);
    }
    true
}

/// Liang-Barsky clip of `a -> b` against the box `min..=max`.
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-dx, a.0 - min.0),
        (dx, max.0 - a.0),
        (-dy, a.1 - min.1),
        (dy, max.1 - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some(((a.0 + t0 * dx, a.1 + t0 * dy), (a.0 + t1 * dx, a.1 + t1 * dy)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: LineStyle = LineStyle {
        color: Rgb([255, 0, 0]),
        thickness: 4,
    };

    #[test]
    fn linspace_includes_both_ends() {
        let xs: Vec<f64> = SampleSpan::new(160.0, 680.0, 300).xs().collect();
        assert_eq!(xs.len(), 300);
        assert_eq!(xs[0], 160.0);
        assert!((xs[299] - 680.0).abs() < 1e-9);
    }

    #[test]
    fn spliced_extremities_are_sorted_into_place() {
        let model = LaneModel::new(760.0, -0.7);
        let span = SampleSpan::new(200.0, 600.0, 5);
        let polyline = Polyline::sample(&model, &span, &[644.0, 141.0, 400.0]);
        assert_eq!(polyline.len(), 8);
        assert_eq!(polyline.points.first().map(|p| p.0), Some(141));
        assert_eq!(polyline.points.last().map(|p| p.0), Some(644));
        assert!(polyline.points.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn sampled_y_follows_the_model() {
        let model = LaneModel::new(-300.0, 0.8);
        let polyline = Polyline::sample(&model, &SampleSpan::new(900.0, 1000.0, 2), &[]);
        assert_eq!(polyline.points, vec![(900, 420), (1000, 500)]);
    }

    #[test]
    fn draws_inside_the_span_only() {
        let mut surface = RgbImage::new(400, 400);
        let model = LaneModel::new(400.0, -1.0);
        let span = SampleSpan::new(100.0, 300.0, 21);
        let stats = render(&model, &span, &mut surface, &RED, 0.4);
        assert_eq!(stats, RenderStats {
                drawn: 20,
                skipped: 0,
                offscreen: 0
            });
        assert_eq!(*surface.get_pixel(200, 200), Rgb([255, 0, 0]));
        assert_eq!(*surface.get_pixel(20, 380), Rgb([0, 0, 0]));
        assert_eq!(*surface.get_pixel(380, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn duplicate_columns_skip_only_that_pair() {
        let mut surface = RgbImage::new(400, 400);
        let model = LaneModel::new(400.0, -1.0);
        let stats = render_with_extremities(
            &model,
            &SampleSpan::new(100.0, 300.0, 3),
            &[200.0],
            &mut surface,
            &RED,
            0.4,
        );
        assert_eq!(stats, RenderStats {
                drawn: 2,
                skipped: 1,
                offscreen: 0
            });
        assert_eq!(*surface.get_pixel(150, 250), Rgb([255, 0, 0]));
        assert_eq!(*surface.get_pixel(250, 150), Rgb([255, 0, 0]));
    }

    #[test]
    fn flat_local_slope_is_skipped() {
        let mut surface = RgbImage::new(100, 100);
        let model = LaneModel::new(50.0, 0.1);
        let span = SampleSpan::new(0.0, 90.0, 10);
        let stats = render(&model, &span, &mut surface, &RED, 0.4);
        assert_eq!(stats.drawn, 0);
        assert_eq!(stats.skipped, 9);
        assert!(surface.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn steep_model_crossing_zero_does_not_overflow() {
        let mut surface = RgbImage::new(100, 100);
        // y saturates to i32::MIN at x = 0 and to i32::MAX at x = 1.
        let model = LaneModel::new(-3e9, 6e9);
        let span = SampleSpan::new(0.0, 1.0, 2);
        let polyline = Polyline::sample(&model, &span, &[]);
        assert_eq!(polyline.points, vec![(0, i32::MIN), (1, i32::MAX)]);

        let stats = render(&model, &span, &mut surface, &RED, 0.4);
        assert_eq!(stats.drawn + stats.offscreen, 1);
        assert_eq!(stats.skipped, 0);
        assert_eq!(*surface.get_pixel(0, 50), Rgb([255, 0, 0]));
    }

    #[test]
    fn segments_far_off_the_surface_are_not_drawn() {
        let mut surface = RgbImage::new(50, 50);
        let model = LaneModel::new(1e7, 10.0);
        let stats = render(&model, &SampleSpan::new(0.0, 40.0, 5), &mut surface, &RED, 0.4);
        assert_eq!(stats.drawn, 0);
        assert_eq!(stats.offscreen, 4);
        assert!(surface.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn oversized_pen_is_bounded_by_the_surface() {
        let mut surface = RgbImage::new(20, 20);
        let style = LineStyle {
            color: Rgb([255, 0, 0]),
            thickness: u32::MAX,
        };
        assert!(draw_thick_segment(&mut surface, (5, 5), (10, 15), &style));
        assert!(surface.pixels().all(|p| *p == Rgb([255, 0, 0])));
    }

    #[test]
    fn extremity_orderings_always_sort_by_x() {
        let spans = [
            SampleSpan::new(160.0, 680.0, 12),
            SampleSpan::new(730.0, 1100.0, 9),
        ];
        let models = [LaneModel::new(760.0, -0.7), LaneModel::new(-300.0, 0.8)];
        let anchor_sets: [&[f64]; 6] = [
            &[141.0, 644.0],
            &[644.0, 141.0],
            // Outside the span on both sides.
            &[1500.0, -40.0, 50.0],
            // Duplicates.
            &[300.0, 300.0, 300.0],
            // Exactly on the first and last sampled columns.
            &[680.0, 160.0, 1100.0, 730.0],
            &[999.9, 10.5, 999.9, -0.5],
        ];
        for span in &spans {
            for model in &models {
                for anchors in anchor_sets {
                    let polyline = Polyline::sample(model, span, anchors);
                    assert_eq!(polyline.len(), span.samples + anchors.len());
                    assert!(
                        polyline.points.windows(2).all(|w| w[0].0 <= w[1].0),
                        "unsorted for anchors {anchors:?}: {:?}",
                        polyline.points
                    );

                    let lowest = anchors
                        .iter()
                        .map(|x| x.trunc())
                        .chain([span.x_min.trunc()])
                        .fold(f64::INFINITY, f64::min);
                    let highest = anchors
                        .iter()
                        .map(|x| x.trunc())
                        .chain([span.xs().last().unwrap_or(span.x_max).trunc()])
                        .fold(f64::NEG_INFINITY, f64::max);
                    assert_eq!(polyline.points.first().map(|p| p.0), Some(lowest as i32));
                    assert_eq!(polyline.points.last().map(|p| p.0), Some(highest as i32));
                }
            }
        }
    }
}
