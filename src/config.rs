//! # Analysis Configuration
//!
//! Configuration structures for the preprocessing stage and the epsilon
//! schedule. Defaults follow the interactive tool this crate grew out of:
//! no detrending, no filtering, box sizes from 0.5 down to 0.001 in 20
//! log-spaced steps, 1 Hz lowpass / 0.1 Hz highpass corners when a filter is
//! switched on without explicit frequencies.

use crate::errors::{validate_parameter, FractalDimensionError, FractalResult};
use crate::filters::FilterBand;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default largest box size.
pub const DEFAULT_MAX_EPSILON: f64 = 0.5;
/// Default smallest box size.
pub const DEFAULT_MIN_EPSILON: f64 = 0.001;
/// Default number of box sizes.
pub const DEFAULT_EPSILON_STEPS: usize = 20;
/// Default lowpass corner (Hz).
pub const DEFAULT_LOWPASS_HZ: f64 = 1.0;
/// Default highpass corner (Hz).
pub const DEFAULT_HIGHPASS_HZ: f64 = 0.1;
/// Default Butterworth order.
pub const DEFAULT_FILTER_CORNERS: usize = 4;
/// Highest supported Butterworth order.
pub const MAX_FILTER_CORNERS: usize = 10;

/// Baseline removal applied before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DetrendMode {
    /// Leave samples untouched
    #[default]
    None,
    /// Subtract the least-squares line through (index, amplitude)
    Linear,
    /// Subtract the arithmetic mean
    Demean,
}

/// Frequency filter applied after detrending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilterMode {
    /// No filtering
    #[default]
    None,
    /// Keep content below `freq_max`
    Lowpass,
    /// Keep content above `freq_min`
    Highpass,
    /// Keep content between `freq_min` and `freq_max`
    Bandpass,
}

/// What the box grid has to cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoverageMode {
    /// Count cells holding at least one sample point
    #[default]
    Samples,
    /// Count cells crossed by the straight segments joining consecutive
    /// samples. The count no longer saturates at the number of samples, so
    /// short traces keep their small-scale roughness.
    Segments,
}

/// Preprocessing applied to each trace before box counting.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PreprocessingConfig {
    /// Detrend method
    pub detrend: DetrendMode,
    /// Filter type
    pub filter: FilterMode,
    /// Lower corner frequency in Hz (highpass, bandpass)
    pub freq_min: Option<f64>,
    /// Upper corner frequency in Hz (lowpass, bandpass)
    pub freq_max: Option<f64>,
    /// Butterworth order
    pub corners: usize,
    /// Zero-phase frequency-domain filtering instead of the causal cascade
    pub zero_phase: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self::none()
    }
}

impl PreprocessingConfig {
    /// No detrending, no filtering.
    pub fn none() -> Self {
        Self {
            detrend: DetrendMode::None,
            filter: FilterMode::None,
            freq_min: None,
            freq_max: None,
            corners: DEFAULT_FILTER_CORNERS,
            zero_phase: false,
        }
    }

    /// Lowpass at `freq_max` Hz.
    pub fn lowpass(freq_max: f64) -> Self {
        Self {
            filter: FilterMode::Lowpass,
            freq_max: Some(freq_max),
            ..Self::none()
        }
    }

    /// Highpass at `freq_min` Hz.
    pub fn highpass(freq_min: f64) -> Self {
        Self {
            filter: FilterMode::Highpass,
            freq_min: Some(freq_min),
            ..Self::none()
        }
    }

    /// Bandpass between `freq_min` and `freq_max` Hz.
    pub fn bandpass(freq_min: f64, freq_max: f64) -> Self {
        Self {
            filter: FilterMode::Bandpass,
            freq_min: Some(freq_min),
            freq_max: Some(freq_max),
            ..Self::none()
        }
    }

    /// Select a filter mode, filling unset corners with the defaults
    /// ([`DEFAULT_HIGHPASS_HZ`] for the lower edge, [`DEFAULT_LOWPASS_HZ`]
    /// for the upper edge).
    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        if matches!(filter, FilterMode::Highpass | FilterMode::Bandpass) && self.freq_min.is_none() {
            self.freq_min = Some(DEFAULT_HIGHPASS_HZ);
        }
        if matches!(filter, FilterMode::Lowpass | FilterMode::Bandpass) && self.freq_max.is_none() {
            self.freq_max = Some(DEFAULT_LOWPASS_HZ);
        }
        self
    }

    /// Set the detrend method.
    pub fn with_detrend(mut self, detrend: DetrendMode) -> Self {
        self.detrend = detrend;
        self
    }

    /// Set the Butterworth order.
    pub fn with_corners(mut self, corners: usize) -> Self {
        self.corners = corners;
        self
    }

    /// Switch between causal and zero-phase filtering.
    pub fn with_zero_phase(mut self, zero_phase: bool) -> Self {
        self.zero_phase = zero_phase;
        self
    }

    /// True when neither detrending nor filtering is requested.
    pub fn is_identity(&self) -> bool {
        self.detrend == DetrendMode::None && self.filter == FilterMode::None
    }

    /// Check the filter request against a Nyquist frequency and resolve it
    /// into a concrete passband.
    ///
    /// Returns `Ok(None)` when no filter is requested. Corner frequencies that
    /// the selected mode does not use are ignored.
    ///
    /// # Errors
    /// `InvalidParameter` if a required corner is missing, non-positive,
    /// non-finite or at/above Nyquist, if the bandpass corners are not
    /// ordered, or if the order is outside `[1, MAX_FILTER_CORNERS]`.
    pub fn resolve_band(&self, nyquist: f64) -> FractalResult<Option<FilterBand>> {
        if self.filter == FilterMode::None {
            return Ok(None);
        }

        validate_parameter(
            self.corners as f64,
            1.0,
            MAX_FILTER_CORNERS as f64,
            "corners",
        )?;

        let band = match self.filter {
            FilterMode::None => return Ok(None),
            FilterMode::Lowpass => FilterBand::Lowpass {
                corner: require_corner(self.freq_max, "freq_max", nyquist)?,
            },
            FilterMode::Highpass => FilterBand::Highpass {
                corner: require_corner(self.freq_min, "freq_min", nyquist)?,
            },
            FilterMode::Bandpass => {
                let low = require_corner(self.freq_min, "freq_min", nyquist)?;
                let high = require_corner(self.freq_max, "freq_max", nyquist)?;
                if low >= high {
                    return Err(FractalDimensionError::InvalidParameter {
                        parameter: "freq_min".to_string(),
                        value: low,
                        constraint: format!("< freq_max ({})", high),
                    });
                }
                FilterBand::Bandpass { low, high }
            }
        };

        Ok(Some(band))
    }
}

fn require_corner(value: Option<f64>, name: &str, nyquist: f64) -> FractalResult<f64> {
    let freq = value.ok_or_else(|| FractalDimensionError::InvalidParameter {
        parameter: name.to_string(),
        value: f64::NAN,
        constraint: "required by the selected filter".to_string(),
    })?;

    if !(freq.is_finite() && freq > 0.0) {
        return Err(FractalDimensionError::InvalidParameter {
            parameter: name.to_string(),
            value: freq,
            constraint: "finite and > 0".to_string(),
        });
    }
    if freq >= nyquist {
        return Err(FractalDimensionError::InvalidParameter {
            parameter: name.to_string(),
            value: freq,
            constraint: format!("< Nyquist frequency ({} Hz)", nyquist),
        });
    }
    Ok(freq)
}

/// Box-size sweep specification.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduleConfig {
    /// Largest box size, in (0, 1]
    pub max_epsilon: f64,
    /// Smallest box size, in (0, max_epsilon)
    pub min_epsilon: f64,
    /// Number of box sizes, >= 2
    pub steps: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            max_epsilon: DEFAULT_MAX_EPSILON,
            min_epsilon: DEFAULT_MIN_EPSILON,
            steps: DEFAULT_EPSILON_STEPS,
        }
    }
}

impl ScheduleConfig {
    /// Schedule with explicit bounds and step count.
    pub fn new(max_epsilon: f64, min_epsilon: f64, steps: usize) -> Self {
        Self {
            max_epsilon,
            min_epsilon,
            steps,
        }
    }
}

/// Full per-trace analysis configuration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisConfig {
    /// Detrending and filtering
    pub preprocessing: PreprocessingConfig,
    /// Box-size sweep
    pub schedule: ScheduleConfig,
    /// Sample points or the interpolated graph
    pub coverage: CoverageMode,
}

impl AnalysisConfig {
    /// Raw signal, default schedule.
    pub fn raw() -> Self {
        Self::default()
    }

    /// Configuration with the given preprocessing and the default schedule.
    pub fn with_preprocessing(preprocessing: PreprocessingConfig) -> Self {
        Self {
            preprocessing,
            ..Self::default()
        }
    }

    /// Replace the schedule.
    pub fn schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
    }

    /// Replace the coverage mode.
    pub fn coverage(mut self, coverage: CoverageMode) -> Self {
        self.coverage = coverage;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_interactive_tool() {
        let config = AnalysisConfig::default();
        assert!(config.preprocessing.is_identity());
        assert_eq!(config.schedule.max_epsilon, 0.5);
        assert_eq!(config.schedule.min_epsilon, 0.001);
        assert_eq!(config.schedule.steps, 20);
        assert_eq!(config.preprocessing.corners, 4);
        assert!(!config.preprocessing.zero_phase);
        assert_eq!(config.coverage, CoverageMode::Samples);
    }

    #[test]
    fn test_resolve_band_none() {
        let config = PreprocessingConfig::none().with_detrend(DetrendMode::Linear);
        assert_eq!(config.resolve_band(50.0).unwrap(), None);
    }

    #[test]
    fn test_resolve_band_variants() {
        assert_eq!(
            PreprocessingConfig::lowpass(1.0).resolve_band(50.0).unwrap(),
            Some(FilterBand::Lowpass { corner: 1.0 })
        );
        assert_eq!(
            PreprocessingConfig::highpass(0.1).resolve_band(50.0).unwrap(),
            Some(FilterBand::Highpass { corner: 0.1 })
        );
        assert_eq!(
            PreprocessingConfig::bandpass(0.1, 1.0)
                .resolve_band(50.0)
                .unwrap(),
            Some(FilterBand::Bandpass {
                low: 0.1,
                high: 1.0
            })
        );
    }

    #[test]
    fn test_with_filter_fills_default_corners() {
        let config = PreprocessingConfig::none().with_filter(FilterMode::Bandpass);
        assert_eq!(config.freq_min, Some(0.1));
        assert_eq!(config.freq_max, Some(1.0));
        assert!(config.resolve_band(50.0).unwrap().is_some());

        // Explicit corners are kept
        let config = PreprocessingConfig::lowpass(5.0).with_filter(FilterMode::Bandpass);
        assert_eq!(config.freq_max, Some(5.0));
        assert_eq!(config.freq_min, Some(0.1));

        let config = PreprocessingConfig::none().with_filter(FilterMode::Highpass);
        assert_eq!(config.freq_max, None);
    }

    #[test]
    fn test_missing_corner_is_rejected() {
        let config = PreprocessingConfig {
            filter: FilterMode::Lowpass,
            ..PreprocessingConfig::none()
        };
        match config.resolve_band(50.0) {
            Err(FractalDimensionError::InvalidParameter { parameter, .. }) => {
                assert_eq!(parameter, "freq_max");
            }
            other => panic!("Expected InvalidParameter, got {:?}", other),
        }

        // Highpass only needs freq_min; a stray freq_max is ignored
        let config = PreprocessingConfig {
            freq_max: Some(1000.0),
            ..PreprocessingConfig::highpass(0.5)
        };
        assert!(config.resolve_band(50.0).is_ok());
    }

    #[test]
    fn test_corner_bounds() {
        assert!(PreprocessingConfig::lowpass(0.0).resolve_band(50.0).is_err());
        assert!(PreprocessingConfig::lowpass(-1.0).resolve_band(50.0).is_err());
        assert!(PreprocessingConfig::lowpass(50.0).resolve_band(50.0).is_err());
        assert!(PreprocessingConfig::highpass(f64::NAN)
            .resolve_band(50.0)
            .is_err());
        assert!(PreprocessingConfig::bandpass(2.0, 2.0)
            .resolve_band(50.0)
            .is_err());
        assert!(PreprocessingConfig::bandpass(3.0, 2.0)
            .resolve_band(50.0)
            .is_err());
    }

    #[test]
    fn test_corner_order_bounds() {
        assert!(PreprocessingConfig::lowpass(1.0)
            .with_corners(0)
            .resolve_band(50.0)
            .is_err());
        assert!(PreprocessingConfig::lowpass(1.0)
            .with_corners(11)
            .resolve_band(50.0)
            .is_err());
        assert!(PreprocessingConfig::lowpass(1.0)
            .with_corners(1)
            .resolve_band(50.0)
            .is_ok());
    }
}
