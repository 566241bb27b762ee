use std::path::PathBuf;
use thiserror::Error;

/// Why a lane side could not be fitted for the current frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("insufficient data: {points} points with {distinct_x} distinct x values")]
    InsufficientData { points: usize, distinct_x: usize },

    #[error("degenerate slope {slope:.4}: below minimum {min_abs_slope}")]
    DegenerateSlope { slope: f64, min_abs_slope: f64 },

    #[error("least-squares solve produced non-finite coefficients")]
    NonFinite,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
