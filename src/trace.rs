//! Uniformly sampled seismic trace.
//!
//! A [`Trace`] is what an external waveform decoder hands to this crate: an
//! identifier, a sampling interval and the amplitude samples. Traces are
//! validated on construction and never mutated afterwards; preprocessing
//! produces a new trace.

use crate::errors::{
    validate_all_finite, validate_data_length, FractalDimensionError, FractalResult,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum number of samples a trace must carry.
pub const MIN_TRACE_SAMPLES: usize = 2;

/// A single-component, uniformly sampled waveform.
///
/// With the `serde` feature, deserialized traces are validated like
/// [`Trace::new`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "TraceRecord"))]
pub struct Trace {
    id: String,
    sampling_interval: f64,
    samples: Vec<f64>,
}

impl Trace {
    /// Create a trace after validating the sampling interval and samples.
    ///
    /// # Errors
    /// * `InvalidParameter` if `sampling_interval` is not a positive finite number
    /// * `InsufficientData` if fewer than two samples are given
    /// * `NumericalError` if any sample is NaN or infinite
    pub fn new(
        id: impl Into<String>,
        sampling_interval: f64,
        samples: Vec<f64>,
    ) -> FractalResult<Self> {
        if !(sampling_interval.is_finite() && sampling_interval > 0.0) {
            return Err(FractalDimensionError::InvalidParameter {
                parameter: "sampling_interval".to_string(),
                value: sampling_interval,
                constraint: "finite and > 0".to_string(),
            });
        }
        validate_data_length(&samples, MIN_TRACE_SAMPLES, "trace construction")?;
        validate_all_finite(&samples, "trace samples")?;

        Ok(Self {
            id: id.into(),
            sampling_interval,
            samples,
        })
    }

    /// Build a trace from a sampling rate in Hz.
    pub fn from_sampling_rate(
        id: impl Into<String>,
        sampling_rate: f64,
        samples: Vec<f64>,
    ) -> FractalResult<Self> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(FractalDimensionError::InvalidParameter {
                parameter: "sampling_rate".to_string(),
                value: sampling_rate,
                constraint: "finite and > 0".to_string(),
            });
        }
        Self::new(id, 1.0 / sampling_rate, samples)
    }

    /// Same id and sampling interval, new samples.
    ///
    /// Used by the preprocessor; the length is preserved by every transform so
    /// the result is revalidated only for finiteness.
    pub(crate) fn with_samples(&self, samples: Vec<f64>) -> FractalResult<Self> {
        debug_assert_eq!(samples.len(), self.samples.len());
        validate_all_finite(&samples, "preprocessed samples")?;
        Ok(Self {
            id: self.id.clone(),
            sampling_interval: self.sampling_interval,
            samples,
        })
    }

    /// Trace identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Seconds per sample.
    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    /// Samples per second.
    pub fn sampling_rate(&self) -> f64 {
        1.0 / self.sampling_interval
    }

    /// Highest representable frequency, `1 / (2 dt)`.
    pub fn nyquist_frequency(&self) -> f64 {
        0.5 / self.sampling_interval
    }

    /// Amplitude samples.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed trace; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time axis in seconds relative to the first sample, `i * dt`.
    pub fn times(&self) -> Vec<f64> {
        (0..self.samples.len())
            .map(|i| i as f64 * self.sampling_interval)
            .collect()
    }

    /// Total duration covered by the samples.
    pub fn duration(&self) -> f64 {
        (self.samples.len() - 1) as f64 * self.sampling_interval
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct TraceRecord {
    id: String,
    sampling_interval: f64,
    samples: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<TraceRecord> for Trace {
    type Error = FractalDimensionError;

    fn try_from(record: TraceRecord) -> FractalResult<Self> {
        Self::new(record.id, record.sampling_interval, record.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_trace_construction_and_accessors() {
        let trace = Trace::new("XX.STA..HHZ", 0.01, vec![0.0, 1.0, -1.0, 0.5]).unwrap();
        assert_eq!(trace.id(), "XX.STA..HHZ");
        assert_eq!(trace.len(), 4);
        assert!(!trace.is_empty());
        assert_approx_eq!(trace.sampling_rate(), 100.0, 1e-9);
        assert_approx_eq!(trace.nyquist_frequency(), 50.0, 1e-9);
        assert_approx_eq!(trace.duration(), 0.03, 1e-12);

        let times = trace.times();
        assert_eq!(times.len(), 4);
        assert_eq!(times[0], 0.0);
        assert_approx_eq!(times[3], 0.03, 1e-12);
    }

    #[test]
    fn test_trace_rejects_bad_sampling_interval() {
        for dt in [0.0, -0.01, f64::NAN, f64::INFINITY] {
            let result = Trace::new("bad", dt, vec![1.0, 2.0]);
            assert!(
                matches!(result, Err(FractalDimensionError::InvalidParameter { .. })),
                "dt = {} should be rejected",
                dt
            );
        }
    }

    #[test]
    fn test_trace_rejects_short_or_non_finite_samples() {
        assert!(matches!(
            Trace::new("short", 1.0, vec![1.0]),
            Err(FractalDimensionError::InsufficientData {
                required: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            Trace::new("nan", 1.0, vec![1.0, f64::NAN, 2.0]),
            Err(FractalDimensionError::NumericalError { .. })
        ));
    }

    #[test]
    fn test_from_sampling_rate() {
        let trace = Trace::from_sampling_rate("rate", 20.0, vec![0.0; 8]).unwrap();
        assert_approx_eq!(trace.sampling_interval(), 0.05, 1e-15);
        assert!(Trace::from_sampling_rate("rate", 0.0, vec![0.0; 8]).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_validates() {
        let trace = Trace::new("IU.ANMO.00.BHZ", 0.025, vec![1.0, -2.0, 0.5]).unwrap();
        let json = serde_json::to_string(&trace).unwrap();
        let back: Trace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trace);

        for bad in [
            r#"{"id":"EMPTY","sampling_interval":0.01,"samples":[]}"#,
            r#"{"id":"ONE","sampling_interval":0.01,"samples":[1.0]}"#,
            r#"{"id":"DT","sampling_interval":0.0,"samples":[1.0,2.0]}"#,
        ] {
            assert!(serde_json::from_str::<Trace>(bad).is_err(), "{}", bad);
        }
    }
}
