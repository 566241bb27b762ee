//! Linear least-squares fit of a lane boundary.
//!
//! The problem is posed with the design matrix `[1, x]` and solved through
//! its SVD, which stays well behaved when the x values are tightly clustered.
//! Explicitly inverting `XᵀX` is avoided: its condition number is the square
//! of the design matrix's.

use nalgebra::{DMatrix, DVector};

use super::types::{ClassifiedGroup, LaneModel};
use crate::error::FitError;

/// Fits `y = intercept + slope * x` to every endpoint in `group`.
///
/// Rejects groups that cannot pin down a line, and fits whose slope is
/// flatter than `min_abs_slope`.
pub fn fit(group: &ClassifiedGroup, min_abs_slope: f64) -> Result<LaneModel, FitError> {
    let _span = tracing::debug_span!("fit", points = group.len()).entered();

    let points = group.len();
    let distinct_x = count_distinct(group.xs());
    if points < 2 || distinct_x < 2 {
        return Err(FitError::InsufficientData { points, distinct_x });
    }
    // SVD iteration does not converge on NaN/inf input.
    if group.points().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(FitError::NonFinite);
    }

    let design = DMatrix::from_fn(points, 2, |row, col| match col {
        0 => 1.0,
        _ => group.xs()[row],
    });
    let target = DVector::from_column_slice(group.ys());

    let svd = design.svd(true, true);
    let largest = svd.singular_values.max();
    let eps = largest * points as f64 * f64::EPSILON;
    if svd.rank(eps) < 2 {
        return Err(FitError::InsufficientData { points, distinct_x });
    }

    let beta = svd.solve(&target, eps).map_err(|_| FitError::NonFinite)?;
    let model = LaneModel::new(beta[0], beta[1]);
    if !model.intercept.is_finite() || !model.slope.is_finite() {
        return Err(FitError::NonFinite);
    }
    if model.slope.abs() < min_abs_slope {
        return Err(FitError::DegenerateSlope {
            slope: model.slope,
            min_abs_slope,
        });
    }

    tracing::debug!(
        intercept = model.intercept,
        slope = model.slope,
        "Lane model fitted"
    );
    Ok(model)
}

fn count_distinct(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}
