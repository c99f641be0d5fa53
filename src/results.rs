//! # Analysis Results Structures
//!
//! Values produced by the box-counting pipeline. All of them are built once
//! and handed to reporting or export code unchanged.

use crate::errors::FractalResult;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One usable observation of the box-counting sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScaleCountPair {
    /// ln(1/ε)
    pub log_scale: f64,
    /// ln N(ε)
    pub log_count: f64,
}

/// Raw count at one box size, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxCount {
    /// Box size
    pub epsilon: f64,
    /// Number of distinct occupied cells; zero when the size was skipped
    pub count: usize,
    /// Whether the count entered the regression
    pub accepted: bool,
}

/// Fractal dimension estimate for one trace.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DimensionEstimate {
    /// Slope of ln N against ln(1/ε): the box-counting dimension
    pub dimension: f64,
    /// Intercept of the fitted line
    pub intercept: f64,
    /// Coefficient of determination in [0, 1]; NaN when undefined
    pub r_squared: f64,
    /// Standard error of the slope, when at least three pairs were fitted
    pub dimension_std_error: Option<f64>,
    /// Pairs used in the fit, in ascending ln(1/ε)
    pub pairs: Vec<ScaleCountPair>,
}

impl DimensionEstimate {
    /// Fitted ln N at the given ln(1/ε).
    pub fn predict(&self, log_scale: f64) -> f64 {
        self.dimension * log_scale + self.intercept
    }

    /// (ln(1/ε), fitted ln N) at every fitted scale, for overlaying the
    /// regression line on the observations.
    pub fn fitted_line(&self) -> Vec<(f64, f64)> {
        self.pairs
            .iter()
            .map(|p| (p.log_scale, self.predict(p.log_scale)))
            .collect()
    }

    /// The `log_scale` column.
    pub fn log_scales(&self) -> Vec<f64> {
        self.pairs.iter().map(|p| p.log_scale).collect()
    }

    /// The `log_count` column.
    pub fn log_counts(&self) -> Vec<f64> {
        self.pairs.iter().map(|p| p.log_count).collect()
    }

    /// True when R² is undefined, i.e. every count was equal.
    pub fn is_degenerate(&self) -> bool {
        self.r_squared.is_nan()
    }
}

/// Everything computed for one trace.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceAnalysis {
    /// Id of the originating trace
    pub trace_id: String,
    /// Regression result
    pub estimate: DimensionEstimate,
    /// Every box size tried, in schedule order
    pub box_counts: Vec<BoxCount>,
}

/// Classification of a per-trace outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutcomeStatus {
    /// Usable estimate
    Success,
    /// Too few usable scales, or R² undefined
    DegenerateFit,
    /// Bad schedule or filter request
    ConfigurationError,
    /// Anything else (non-finite data, numerical failure)
    Failed,
}

/// Result for one trace of a batch, tagged with the trace id.
#[derive(Debug, Clone)]
pub struct TraceOutcome {
    /// Id of the originating trace
    pub trace_id: String,
    /// Analysis or the error that stopped it
    pub result: FractalResult<TraceAnalysis>,
}

impl TraceOutcome {
    /// Classify the outcome.
    pub fn status(&self) -> OutcomeStatus {
        match &self.result {
            Ok(analysis) if analysis.estimate.is_degenerate() => OutcomeStatus::DegenerateFit,
            Ok(_) => OutcomeStatus::Success,
            Err(e) if e.is_degenerate_fit() => OutcomeStatus::DegenerateFit,
            Err(e) if e.is_configuration_error() => OutcomeStatus::ConfigurationError,
            Err(_) => OutcomeStatus::Failed,
        }
    }

    /// The analysis if it succeeded.
    pub fn analysis(&self) -> Option<&TraceAnalysis> {
        self.result.as_ref().ok()
    }
}

/// Status counts over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchSummary {
    /// Traces analysed
    pub total: usize,
    /// Usable estimates
    pub succeeded: usize,
    /// Degenerate fits
    pub degenerate: usize,
    /// Configuration errors
    pub configuration_errors: usize,
    /// Other failures
    pub failed: usize,
}

impl BatchSummary {
    /// Count statuses.
    pub fn from_outcomes(outcomes: &[TraceOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                summary.total += 1;
                match outcome.status() {
                    OutcomeStatus::Success => summary.succeeded += 1,
                    OutcomeStatus::DegenerateFit => summary.degenerate += 1,
                    OutcomeStatus::ConfigurationError => summary.configuration_errors += 1,
                    OutcomeStatus::Failed => summary.failed += 1,
                }
                summary
            })
    }
}
