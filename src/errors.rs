//! Error types and validation functions for fractal dimension analysis.
//!
//! Every failure in the pipeline is local and recoverable. The variants are
//! split into configuration errors (a bad schedule or filter request) and
//! data errors (a signal that produced too few usable scales), so batch
//! callers can report degenerate fits separately from misconfiguration.

use thiserror::Error;

/// Error types for box-counting analysis operations.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FractalDimensionError {
    /// The epsilon schedule bounds or step count are invalid.
    #[error("Invalid epsilon schedule: {parameter} = {value}, expected {constraint}")]
    InvalidSchedule {
        /// Schedule parameter name
        parameter: String,
        /// Invalid value provided
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// Invalid parameter value for preprocessing or analysis configuration.
    #[error("Invalid parameter: {parameter} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value provided
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// Not enough data for the requested step.
    ///
    /// Raised by the dimension estimator when box counting produced fewer
    /// than two usable scale/count pairs.
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData {
        /// Minimum required data points
        required: usize,
        /// Actual number of data points provided
        actual: usize,
    },

    /// Numerical computation error due to non-finite input or a singular design.
    #[error("Numerical computation failed: {reason}")]
    NumericalError {
        /// Detailed reason for numerical failure
        reason: String,
        /// Operation that failed
        operation: Option<String>,
    },

    /// Trace lookup by id failed.
    #[error("Trace not found: {id}")]
    TraceNotFound {
        /// Identifier of the missing trace
        id: String,
    },
}

impl FractalDimensionError {
    /// True for errors that signal a signal/scale range without usable
    /// box-count variation rather than a bad request.
    pub fn is_degenerate_fit(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }

    /// True for errors caused by the caller's configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSchedule { .. } | Self::InvalidParameter { .. }
        )
    }
}

/// Result type for fractal dimension operations.
pub type FractalResult<T> = Result<T, FractalDimensionError>;

/// Validates that data has sufficient length for analysis.
///
/// # Example
/// ```rust
/// use fractal_seismic::errors::validate_data_length;
///
/// let data = vec![1.0, 2.0, 3.0];
/// assert!(validate_data_length(&data, 2, "test").is_ok());
/// assert!(validate_data_length(&data, 5, "test").is_err());
/// ```
pub fn validate_data_length(data: &[f64], min_required: usize, operation: &str) -> FractalResult<()> {
    if data.len() < min_required {
        log::debug!(
            "{}: {} samples provided, {} required",
            operation,
            data.len(),
            min_required
        );
        Err(FractalDimensionError::InsufficientData {
            required: min_required,
            actual: data.len(),
        })
    } else {
        Ok(())
    }
}

/// Validates that a parameter is within `[min, max]`.
///
/// # Example
/// ```rust
/// use fractal_seismic::errors::validate_parameter;
///
/// assert!(validate_parameter(4.0, 1.0, 10.0, "corners").is_ok());
/// assert!(validate_parameter(12.0, 1.0, 10.0, "corners").is_err());
/// ```
pub fn validate_parameter(value: f64, min: f64, max: f64, name: &str) -> FractalResult<()> {
    if value.is_nan() {
        return Err(FractalDimensionError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "must not be NaN".to_string(),
        });
    }

    if min.is_nan() || max.is_nan() || min > max {
        return Err(FractalDimensionError::NumericalError {
            reason: format!(
                "Invalid bounds for parameter {}: min={}, max={}",
                name, min, max
            ),
            operation: None,
        });
    }

    if value < min || value > max {
        Err(FractalDimensionError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: format!("[{}, {}]", min, max),
        })
    } else {
        Ok(())
    }
}

/// Validates that all values in a slice are finite.
///
/// Returns on the first non-finite value, reporting its index.
///
/// # Example
/// ```rust
/// use fractal_seismic::errors::validate_all_finite;
///
/// assert!(validate_all_finite(&[1.0, 2.0, 3.0], "samples").is_ok());
/// assert!(validate_all_finite(&[1.0, f64::NAN, 3.0], "samples").is_err());
/// ```
pub fn validate_all_finite(data: &[f64], name: &str) -> FractalResult<()> {
    if let Some((i, &value)) = data.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        let value_desc = if value.is_nan() {
            "NaN".to_string()
        } else if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };

        return Err(FractalDimensionError::NumericalError {
            reason: format!(
                "{} contains non-finite value at index {}: {}",
                name, i, value_desc
            ),
            operation: None,
        });
    }

    Ok(())
}

/// Rejects allocation requests above 1 GiB.
///
/// FFT padding and grid bookkeeping scale with trace length, so an absurd
/// length is caught here instead of aborting the process.
pub fn validate_allocation_size(size: usize, operation: &str) -> FractalResult<()> {
    const MAX_SAFE_ALLOCATION: usize = 1 << 30;

    if size > MAX_SAFE_ALLOCATION {
        return Err(FractalDimensionError::NumericalError {
            reason: format!(
                "Attempted allocation of {} bytes ({:.2} GB) in '{}' exceeds safety limit of {} bytes",
                size,
                size as f64 / (1024.0 * 1024.0 * 1024.0),
                operation,
                MAX_SAFE_ALLOCATION
            ),
            operation: Some(operation.to_string()),
        });
    }

    Ok(())
}
