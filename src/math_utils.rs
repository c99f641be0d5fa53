//! Numerical helpers: constants, min/max scans and ordinary least squares.

use crate::errors::{FractalDimensionError, FractalResult};

/// Numerical constants shared across the crate.
pub mod constants {
    /// Added to a range before normalizing so constant signals do not divide by zero
    pub const NORMALIZATION_GUARD: f64 = 1e-12;

    /// Amplitude range, relative to the signal magnitude, at or below which
    /// a signal is treated as constant
    pub const FLAT_RELATIVE_RANGE: f64 = 1e-12;

    /// Box sizes below this are treated as zero and skipped
    pub const MIN_BOX_SIZE: f64 = 1e-10;
}

/// Minimum and maximum of a slice in one pass.
///
/// Returns `None` for an empty slice.
pub fn min_max(data: &[f64]) -> Option<(f64, f64)> {
    let first = *data.first()?;
    Some(
        data.iter()
            .fold((first, first), |(lo, hi), &x| (lo.min(x), hi.max(x))),
    )
}

/// Result of a simple linear regression `y = slope * x + intercept`.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    /// Regression coefficient
    pub slope: f64,
    /// Intercept
    pub intercept: f64,
    /// Coefficient of determination; NaN when `y` has no variation
    pub r_squared: f64,
    /// Standard error of the slope; `None` with fewer than three points
    pub slope_std_error: Option<f64>,
}

/// Ordinary least squares with centered sums.
///
/// Centering before accumulating avoids catastrophic cancellation when the
/// predictor values are large relative to their spread.
///
/// # Errors
/// * `InsufficientData` if the slices differ in length or hold fewer than two points
/// * `NumericalError` for non-finite input or a constant predictor
///
/// The predictor only has to take at least two distinct values; a tiny
/// spread is fine since the sums are centered.
///
/// # Example
/// ```rust
/// use fractal_seismic::math_utils::ols_regression;
///
/// let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
/// let fit = ols_regression(&x, &y).unwrap();
/// assert!((fit.slope - 2.0).abs() < 1e-10);
/// assert!((fit.r_squared - 1.0).abs() < 1e-12);
/// ```
pub fn ols_regression(x: &[f64], y: &[f64]) -> FractalResult<OlsFit> {
    if x.len() != y.len() || x.len() < 2 {
        return Err(FractalDimensionError::InsufficientData {
            required: 2,
            actual: x.len().min(y.len()),
        });
    }

    if !x.iter().chain(y).all(|v| v.is_finite()) {
        return Err(FractalDimensionError::NumericalError {
            reason: "Non-finite values in regression data".to_string(),
            operation: Some("ols_regression".to_string()),
        });
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (sxy, sxx) = x.iter().zip(y).fold((0.0, 0.0), |(sxy, sxx), (xi, yi)| {
        let dx = xi - mean_x;
        (sxy + dx * (yi - mean_y), sxx + dx * dx)
    });

    if x.iter().all(|&v| v == x[0]) || sxx <= 0.0 {
        return Err(FractalDimensionError::NumericalError {
            reason: "Predictor variable has zero variance (constant values)".to_string(),
            operation: Some("ols_regression".to_string()),
        });
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (yi - (slope * xi + intercept)).powi(2))
        .sum();

    let r_squared = if y.iter().all(|&v| v == y[0]) {
        f64::NAN
    } else {
        let ss_tot: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    let slope_std_error = if x.len() > 2 {
        Some((ss_res / (n - 2.0) / sxx).sqrt())
    } else {
        None
    };

    Ok(OlsFit {
        slope,
        intercept,
        r_squared,
        slope_std_error,
    })
}
