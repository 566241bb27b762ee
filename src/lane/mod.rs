//! Lane-line estimation: classify detector segments by side, fit a straight
//! boundary per side, and draw it.

mod classify;
mod fit;
mod render;
pub mod types;

pub use classify::{classify, side_of, Classification};
pub use fit::fit;
pub use render::{
    draw_thick_segment, render, render_with_extremities, LineStyle, Polyline, RenderStats,
    SampleSpan,
};
pub use types::{ClassifiedGroup, LaneModel, Segment, Side};
