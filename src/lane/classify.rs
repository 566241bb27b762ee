use super::types::{ClassifiedGroup, Segment, Side};

/// Segments split by lane side, plus how many were filtered out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Classification {
    pub left: ClassifiedGroup,
    pub right: ClassifiedGroup,
    pub discarded: usize,
}

impl Classification {
    pub fn group(&self, side: Side) -> &ClassifiedGroup {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn group_mut(&mut self, side: Side) -> &mut ClassifiedGroup {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Side a single segment votes for, or `None` when it carries no lane evidence
/// (vertical, degenerate, or flatter than `min_abs_slope`).
pub fn side_of(segment: &Segment, min_abs_slope: f64) -> Option<Side> {
    let slope = segment.slope();
    if !slope.is_finite() || slope.abs() < min_abs_slope {
        return None;
    }
    Some(Side::from_slope(slope))
}

/// Partitions `segments` into left/right endpoint groups by slope sign.
pub fn classify(segments: &[Segment], min_abs_slope: f64) -> Classification {
    let _span = tracing::debug_span!("classify", segments = segments.len()).entered();

    let mut out = Classification::default();
    for segment in segments {
        match side_of(segment, min_abs_slope) {
            Some(side) => out.group_mut(side).push_segment(segment),
            None => out.discarded += 1,
        }
    }

    tracing::debug!(
        left = out.left.segment_count(),
        right = out.right.segment_count(),
        discarded = out.discarded,
        "Segments classified"
    );
    out
}
