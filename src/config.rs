//! Pipeline configuration, loadable from JSON.
//!
//! Defaults are tuned for 1280×720 dashcam frames with the hood at the
//! bottom edge.

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::lane::{SampleSpan, Side};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub blur: BlurConfig,
    pub edges: EdgeConfig,
    pub region: RegionConfig,
    pub hough: HoughConfig,
    pub lanes: LanesConfig,
    pub blend: BlendConfig,
    pub overlay: OverlayMode,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    /// Gaussian sigma; 1.1 matches a 5×5 kernel.
    pub sigma: f32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self { sigma: 1.1 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            low_threshold: 50.0,
            high_threshold: 150.0,
        }
    }
}

/// Polygon outside of which edges are ignored.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub vertices: Vec<[i32; 2]>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            vertices: vec![[140, 650], [644, 441], [724, 441], [1096, 650]],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    /// Accumulator votes a line needs before segments are extracted from it.
    pub vote_threshold: u32,
    pub suppression_radius: u32,
    pub min_line_length: f64,
    pub max_line_gap: f64,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            vote_threshold: 25,
            suppression_radius: 1,
            min_line_length: 5.0,
            max_line_gap: 5.0,
        }
    }
}

/// Widest pen accepted for lane lines, in pixels.
pub const MAX_THICKNESS: u32 = 64;

/// Sampling for one lane side. In JSON either field may be left out and
/// keeps that side's default.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LaneSideConfig {
    pub span: SampleSpan,
    /// Anchor columns for the near and far ends of the lane region.
    pub extremities: Vec<f64>,
}

impl LaneSideConfig {
    pub fn left() -> Self {
        Self {
            span: SampleSpan::new(160.0, 680.0, 300),
            extremities: vec![141.0, 644.0],
        }
    }

    pub fn right() -> Self {
        Self {
            span: SampleSpan::new(730.0, 1100.0, 300),
            extremities: vec![724.0, 1096.0],
        }
    }
}

#[derive(Deserialize)]
struct LaneSideOverrides {
    span: Option<SampleSpan>,
    extremities: Option<Vec<f64>>,
}

impl LaneSideOverrides {
    fn apply(self, mut base: LaneSideConfig) -> LaneSideConfig {
        if let Some(span) = self.span {
            base.span = span;
        }
        if let Some(extremities) = self.extremities {
            base.extremities = extremities;
        }
        base
    }
}

fn left_side<'de, D: Deserializer<'de>>(d: D) -> Result<LaneSideConfig, D::Error> {
    LaneSideOverrides::deserialize(d).map(|o| o.apply(LaneSideConfig::left()))
}

fn right_side<'de, D: Deserializer<'de>>(d: D) -> Result<LaneSideConfig, D::Error> {
    LaneSideOverrides::deserialize(d).map(|o| o.apply(LaneSideConfig::right()))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LanesConfig {
    /// Shared by classification, fitting and rendering. Exploratory passes
    /// have used 0.3; 0.4 rejects more shadow edges.
    pub min_abs_slope: f64,
    #[serde(deserialize_with = "left_side")]
    pub left: LaneSideConfig,
    #[serde(deserialize_with = "right_side")]
    pub right: LaneSideConfig,
    pub color: [u8; 3],
    pub thickness: u32,
}

impl LanesConfig {
    pub fn side(&self, side: Side) -> &LaneSideConfig {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

impl Default for LanesConfig {
    fn default() -> Self {
        Self {
            min_abs_slope: 0.4,
            left: LaneSideConfig::left(),
            right: LaneSideConfig::right(),
            color: [255, 0, 0],
            thickness: 10,
        }
    }
}

/// `original * original_weight + overlay * overlay_weight + offset`, saturated.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    pub original_weight: f32,
    pub overlay_weight: f32,
    pub offset: f32,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            original_weight: 0.8,
            overlay_weight: 1.0,
            offset: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OverlayMode {
    /// Fitted left/right lane lines.
    #[default]
    Lanes,
    /// Raw detector segments, for tuning the upstream stages.
    Segments,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.blur.sigma.is_finite() && self.blur.sigma > 0.0) {
            return invalid(format!("blur.sigma must be positive, got {}", self.blur.sigma));
        }
        let edges = &self.edges;
        if !(edges.low_threshold >= 0.0 && edges.low_threshold <= edges.high_threshold) {
            return invalid(format!(
                "edges thresholds must satisfy 0 <= low <= high, got {} / {}",
                edges.low_threshold, edges.high_threshold
            ));
        }
        if self.region.vertices.len() < 3 {
            return invalid(format!(
                "region needs at least 3 vertices, got {}",
                self.region.vertices.len()
            ));
        }
        if self.region.vertices.first() == self.region.vertices.last() {
            return invalid("region polygon must not repeat its first vertex".into());
        }
        if !(self.hough.min_line_length >= 0.0 && self.hough.max_line_gap >= 0.0) {
            return invalid("hough line length and gap must be non-negative".into());
        }
        let lanes = &self.lanes;
        if !(lanes.min_abs_slope.is_finite() && lanes.min_abs_slope >= 0.0) {
            return invalid(format!(
                "lanes.min_abs_slope must be a non-negative number, got {}",
                lanes.min_abs_slope
            ));
        }
        for side in Side::BOTH {
            let cfg = lanes.side(side);
            let span = &cfg.span;
            if !(span.x_min.is_finite() && span.x_max.is_finite() && span.x_min < span.x_max) {
                return invalid(format!(
                    "lanes.{side}.span must satisfy x_min < x_max, got {}..{}",
                    span.x_min, span.x_max
                ));
            }
            if span.samples < 2 {
                return invalid(format!("lanes.{side}.span needs at least 2 samples"));
            }
            if cfg.extremities.iter().any(|x| !x.is_finite()) {
                return invalid(format!("lanes.{side}.extremities must be finite"));
            }
        }
        if !(1..=MAX_THICKNESS).contains(&lanes.thickness) {
            return invalid(format!(
                "lanes.thickness must be within 1..={MAX_THICKNESS}, got {}",
                lanes.thickness
            ));
        }
        let blend = &self.blend;
        if ![blend.original_weight, blend.overlay_weight, blend.offset]
            .iter()
            .all(|v| v.is_finite())
        {
            return invalid("blend weights must be finite".into());
        }
        Ok(())
    }
}

/// Reads and validates a JSON config; missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: PipelineConfig =
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let json = r#"{ "lanes": { "min_abs_slope": 0.3 }, "overlay": "segments" }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.lanes.min_abs_slope, 0.3);
        assert_eq!(config.lanes.thickness, 10);
        assert_eq!(config.lanes.right.extremities, vec![724.0, 1096.0]);
        assert_eq!(config.overlay, OverlayMode::Segments);
        assert_eq!(config.edges.high_threshold, 150.0);
    }

    #[test]
    fn partial_lane_side_keeps_that_sides_defaults() {
        let json = r#"{ "lanes": {
            "left": { "span": { "x_min": 100.0, "x_max": 600.0, "samples": 50 } },
            "right": { "extremities": [700.0] }
        } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.lanes.left.span, SampleSpan::new(100.0, 600.0, 50));
        assert_eq!(config.lanes.left.extremities, vec![141.0, 644.0]);
        assert_eq!(config.lanes.right.span, SampleSpan::new(730.0, 1100.0, 300));
        assert_eq!(config.lanes.right.extremities, vec![700.0]);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_oversized_thickness() {
        let mut config = PipelineConfig::default();
        config.lanes.thickness = MAX_THICKNESS;
        config.validate().unwrap();
        config.lanes.thickness = MAX_THICKNESS + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("lanes.thickness"), "{err}");
        config.lanes.thickness = u32::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_span() {
        let mut config = PipelineConfig::default();
        config.lanes.left.span = SampleSpan::new(680.0, 160.0, 300);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("lanes.left.span"), "{err}");
    }

    #[test]
    fn rejects_degenerate_region() {
        let mut config = PipelineConfig::default();
        config.region.vertices = vec![[0, 0], [10, 10]];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/lanelines.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/lanelines.json"));
    }
}
