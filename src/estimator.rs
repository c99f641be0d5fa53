//! Log-log regression of box counts.

use crate::errors::{FractalDimensionError, FractalResult};
use crate::math_utils::ols_regression;
use crate::results::{DimensionEstimate, ScaleCountPair};

/// Minimum number of accepted scales for a fit.
pub const MIN_SCALE_PAIRS: usize = 2;

/// Fit `ln N = D · ln(1/ε) + c` by ordinary least squares.
///
/// The slope `D` is the box-counting dimension. When every count is equal the
/// fit is still returned with `D = 0` and an undefined (NaN) R², which callers
/// should report as a degenerate fit.
///
/// # Errors
/// * `InsufficientData` with fewer than two pairs
/// * `NumericalError` if all pairs share one scale or carry non-finite values
///
/// # Example
/// ```rust
/// use fractal_seismic::{estimate_dimension, ScaleCountPair};
///
/// let pairs: Vec<ScaleCountPair> = [2.0f64, 4.0, 8.0]
///     .iter()
///     .map(|&inv_eps| ScaleCountPair {
///         log_scale: inv_eps.ln(),
///         log_count: (inv_eps * inv_eps).ln(),
///     })
///     .collect();
/// let estimate = estimate_dimension(&pairs).unwrap();
/// assert!((estimate.dimension - 2.0).abs() < 1e-12);
/// ```
pub fn estimate_dimension(pairs: &[ScaleCountPair]) -> FractalResult<DimensionEstimate> {
    if pairs.len() < MIN_SCALE_PAIRS {
        return Err(FractalDimensionError::InsufficientData {
            required: MIN_SCALE_PAIRS,
            actual: pairs.len(),
        });
    }

    let (log_scales, log_counts): (Vec<f64>, Vec<f64>) = pairs
        .iter()
        .map(|p| (p.log_scale, p.log_count))
        .unzip();

    let fit = ols_regression(&log_scales, &log_counts)?;

    if fit.r_squared.is_nan() {
        log::warn!(
            "Box count constant across {} scales; R² undefined",
            pairs.len()
        );
    }

    Ok(DimensionEstimate {
        dimension: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_squared,
        dimension_std_error: fit.slope_std_error,
        pairs: pairs.to_vec(),
    })
}
