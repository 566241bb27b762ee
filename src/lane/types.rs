use serde::{Deserialize, Serialize};

/// Straight edge fragment reported by a segment detector, in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Image-space slope `dy / dx`. Vertical segments give an infinite or NaN value.
    pub fn slope(&self) -> f64 {
        (self.y2 - self.y1) / (self.x2 - self.x1)
    }
}

/// Which lane boundary a segment or model belongs to.
///
/// Image rows grow downwards, so the left boundary rises to the right and
/// has a negative slope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn from_slope(slope: f64) -> Self {
        if slope < 0.0 {
            Side::Left
        } else {
            Side::Right
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Endpoint coordinates of every segment assigned to one side.
///
/// `xs` and `ys` always have the same length; points only enter through
/// `push_segment` and `from_points`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassifiedGroup {
    xs: Vec<f64>,
    ys: Vec<f64>,
    segments: usize,
}

impl ClassifiedGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records both endpoints of `segment`.
    pub fn push_segment(&mut self, segment: &Segment) {
        self.xs.push(segment.x1);
        self.xs.push(segment.x2);
        self.ys.push(segment.y1);
        self.ys.push(segment.y2);
        self.segments += 1;
    }

    /// Builds a group directly from points, mainly for tests and replays.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        Self {
            xs: points.iter().map(|p| p.0).collect(),
            ys: points.iter().map(|p| p.1).collect(),
            segments: points.len() / 2,
        }
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Number of segments that contributed endpoints.
    pub fn segment_count(&self) -> usize {
        self.segments
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Smallest and largest observed x, if any.
    pub fn x_extent(&self) -> Option<(f64, f64)> {
        self.xs.iter().copied().fold(None, |acc, x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
        })
    }
}

/// Straight lane boundary `y = intercept + slope * x`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneModel {
    pub intercept: f64,
    pub slope: f64,
}

impl LaneModel {
    pub fn new(intercept: f64, slope: f64) -> Self {
        Self { intercept, slope }
    }

    #[inline]
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Sum of squared y-residuals over `group`.
    pub fn sum_squared_residuals(&self, group: &ClassifiedGroup) -> f64 {
        group
            .points()
            .map(|(x, y)| {
                let r = y - self.predict(x);
                r * r
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_segment_has_non_finite_slope() {
        assert!(!Segment::new(10.0, 0.0, 10.0, 50.0).slope().is_finite());
        assert!(Segment::new(10.0, 5.0, 10.0, 5.0).slope().is_nan());
    }

    #[test]
    fn group_tracks_extremities() {
        let mut group = ClassifiedGroup::new();
        assert_eq!(group.x_extent(), None);
        group.push_segment(&Segment::new(200.0, 400.0, 100.0, 500.0));
        group.push_segment(&Segment::new(250.0, 380.0, 150.0, 480.0));
        assert_eq!(group.len(), 4);
        assert_eq!(group.segment_count(), 2);
        assert_eq!(group.x_extent(), Some((100.0, 250.0)));
    }

    #[test]
    fn coordinates_stay_paired() {
        let mut group = ClassifiedGroup::from_points(&[(100.0, 500.0), (200.0, 400.0), (300.0, 300.0)]);
        assert_eq!(group.xs().len(), group.ys().len());
        group.push_segment(&Segment::new(400.0, 200.0, 500.0, 100.0));
        assert_eq!(group.xs(), [100.0, 200.0, 300.0, 400.0, 500.0]);
        assert_eq!(group.ys(), [500.0, 400.0, 300.0, 200.0, 100.0]);
        assert_eq!(group.points().count(), group.len());
    }

    #[test]
    fn side_from_slope_sign() {
        assert_eq!(Side::from_slope(-1.0), Side::Left);
        assert_eq!(Side::from_slope(0.8), Side::Right);
        assert_eq!(Side::Left.to_string(), "left");
    }
}
