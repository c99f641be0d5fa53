//! Synthetic signal generators for testing and validation.
//!
//! These produce reference signals whose box-counting behaviour is known in
//! advance: a sine wave is a smooth curve (dimension 1), discrete Brownian
//! motion is self-affine with graph dimension 1.5, and white noise fills the
//! plane as the grid refines. All random generators run on ChaCha20 so a
//! fixed seed gives the same series on every platform.

use crate::errors::{validate_allocation_size, FractalDimensionError, FractalResult};
use crate::trace::Trace;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::StandardNormal;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Common generation parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeneratorConfig {
    /// Number of samples
    pub length: usize,
    /// Random seed for reproducible generation; `None` draws from OS entropy
    pub seed: Option<u64>,
    /// Seconds between samples
    pub sampling_interval: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            length: 1000,
            seed: None,
            sampling_interval: 0.01,
        }
    }
}

impl GeneratorConfig {
    /// `length` samples at the default interval with a fixed seed.
    pub fn seeded(length: usize, seed: u64) -> Self {
        Self {
            length,
            seed: Some(seed),
            ..Self::default()
        }
    }

    fn validate(&self) -> FractalResult<()> {
        if self.length < 2 {
            return Err(FractalDimensionError::InvalidParameter {
                parameter: "length".to_string(),
                value: self.length as f64,
                constraint: ">= 2".to_string(),
            });
        }
        if !(self.sampling_interval.is_finite() && self.sampling_interval > 0.0) {
            return Err(FractalDimensionError::InvalidParameter {
                parameter: "sampling_interval".to_string(),
                value: self.sampling_interval,
                constraint: "finite and > 0".to_string(),
            });
        }
        validate_allocation_size(
            self.length.saturating_mul(std::mem::size_of::<f64>()),
            "signal generation",
        )
    }

    fn rng(&self) -> ChaCha20Rng {
        match self.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        }
    }
}

/// Reference signal families.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SignalKind {
    /// Independent standard-normal samples
    WhiteNoise,
    /// Cumulative sum of standard-normal increments
    BrownianMotion,
    /// `amplitude · sin(2π f t)`
    Sine {
        /// Frequency in Hz
        frequency_hz: f64,
        /// Peak amplitude
        amplitude: f64,
    },
}

/// Independent N(0, 1) samples.
pub fn generate_white_noise(config: &GeneratorConfig) -> FractalResult<Vec<f64>> {
    config.validate()?;
    let mut rng = config.rng();
    Ok((0..config.length)
        .map(|_| rng.sample::<f64, _>(StandardNormal))
        .collect())
}

/// Discrete Brownian motion: running sum of N(0, 1) increments.
///
/// # Example
/// ```rust
/// use fractal_seismic::generators::{generate_brownian_motion, GeneratorConfig};
///
/// let a = generate_brownian_motion(&GeneratorConfig::seeded(100, 7)).unwrap();
/// let b = generate_brownian_motion(&GeneratorConfig::seeded(100, 7)).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn generate_brownian_motion(config: &GeneratorConfig) -> FractalResult<Vec<f64>> {
    let mut walk = generate_white_noise(config)?;
    let mut position = 0.0;
    for value in walk.iter_mut() {
        position += *value;
        *value = position;
    }
    Ok(walk)
}

/// Sampled sine wave starting at phase zero.
pub fn generate_sine_wave(
    config: &GeneratorConfig,
    frequency_hz: f64,
    amplitude: f64,
) -> FractalResult<Vec<f64>> {
    config.validate()?;
    if !frequency_hz.is_finite() || !amplitude.is_finite() {
        return Err(FractalDimensionError::InvalidParameter {
            parameter: "frequency_hz".to_string(),
            value: frequency_hz,
            constraint: "finite frequency and amplitude".to_string(),
        });
    }
    let omega = 2.0 * PI * frequency_hz;
    Ok((0..config.length)
        .map(|i| amplitude * (omega * i as f64 * config.sampling_interval).sin())
        .collect())
}

/// Generate samples of the given kind.
pub fn generate_signal(kind: SignalKind, config: &GeneratorConfig) -> FractalResult<Vec<f64>> {
    match kind {
        SignalKind::WhiteNoise => generate_white_noise(config),
        SignalKind::BrownianMotion => generate_brownian_motion(config),
        SignalKind::Sine {
            frequency_hz,
            amplitude,
        } => generate_sine_wave(config, frequency_hz, amplitude),
    }
}

/// Generate a signal and wrap it in a [`Trace`] with the configured interval.
pub fn generate_trace(
    id: impl Into<String>,
    kind: SignalKind,
    config: &GeneratorConfig,
) -> FractalResult<Trace> {
    let samples = generate_signal(kind, config)?;
    Trace::new(id, config.sampling_interval, samples)
}
