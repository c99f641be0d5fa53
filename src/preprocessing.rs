//! Trace preprocessing: detrending followed by optional frequency filtering.
//!
//! Every function here takes its input by reference and returns new data;
//! the original trace is never touched. With detrend and filter both set to
//! `None` the output samples are bit-identical copies of the input.

use crate::config::{DetrendMode, PreprocessingConfig};
use crate::errors::{validate_data_length, FractalResult};
use crate::fft_ops::zero_phase_filter;
use crate::filters::{ButterworthFilter, FilterBand};
use crate::trace::Trace;

/// Remove a baseline from `data` according to `mode`.
///
/// `Linear` subtracts the least-squares line through (sample index,
/// amplitude); `Demean` subtracts the arithmetic mean; `None` copies.
pub fn detrend_signal(data: &[f64], mode: DetrendMode) -> Vec<f64> {
    match mode {
        DetrendMode::None => data.to_vec(),

        DetrendMode::Demean => {
            if data.is_empty() {
                return Vec::new();
            }
            let mean = data.iter().sum::<f64>() / data.len() as f64;
            data.iter().map(|&x| x - mean).collect()
        }

        DetrendMode::Linear => {
            let n = data.len();
            if n < 2 {
                return detrend_signal(data, DetrendMode::Demean);
            }

            // Centered sums keep the fit stable for long traces
            let mean_x = (n - 1) as f64 / 2.0;
            let mean_y = data.iter().sum::<f64>() / n as f64;
            let (sxy, sxx) = data
                .iter()
                .enumerate()
                .fold((0.0, 0.0), |(sxy, sxx), (i, &y)| {
                    let dx = i as f64 - mean_x;
                    (sxy + dx * (y - mean_y), sxx + dx * dx)
                });

            let slope = sxy / sxx;
            let intercept = mean_y - slope * mean_x;

            data.iter()
                .enumerate()
                .map(|(i, &y)| y - (intercept + slope * i as f64))
                .collect()
        }
    }
}

/// Filter `data` sampled at `sampling_rate` Hz.
///
/// `zero_phase` selects the frequency-domain realisation; otherwise the causal
/// second-order-section cascade is used.
pub fn filter_signal(
    data: &[f64],
    band: FilterBand,
    order: usize,
    sampling_rate: f64,
    zero_phase: bool,
) -> FractalResult<Vec<f64>> {
    if zero_phase {
        zero_phase_filter(data, band, order, sampling_rate)
    } else {
        let filter = ButterworthFilter::design(band, order, sampling_rate)?;
        Ok(filter.apply(data))
    }
}

/// Apply `config` to `trace`, returning a new trace with the same id, length
/// and sampling interval.
///
/// The filter request is validated against the trace's Nyquist frequency
/// before any work is done.
///
/// # Errors
/// `InvalidParameter` for a missing, non-positive or super-Nyquist corner
/// frequency, unordered bandpass corners, or an unsupported filter order.
///
/// # Example
/// ```rust
/// use fractal_seismic::{preprocess_trace, DetrendMode, PreprocessingConfig, Trace};
///
/// let trace = Trace::new("demo", 0.01, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let config = PreprocessingConfig::none().with_detrend(DetrendMode::Linear);
/// let detrended = preprocess_trace(&trace, &config).unwrap();
/// assert!(detrended.samples().iter().all(|x| x.abs() < 1e-12));
/// assert_eq!(trace.samples(), &[1.0, 2.0, 3.0, 4.0]);
/// ```
pub fn preprocess_trace(trace: &Trace, config: &PreprocessingConfig) -> FractalResult<Trace> {
    let band = config.resolve_band(trace.nyquist_frequency())?;
    validate_data_length(trace.samples(), 2, "preprocessing")?;

    if config.is_identity() {
        return Ok(trace.clone());
    }

    let detrended = detrend_signal(trace.samples(), config.detrend);

    let processed = match band {
        Some(band) => {
            log::debug!(
                "Trace {}: filtering {:?} (order {}, zero_phase = {})",
                trace.id(),
                band,
                config.corners,
                config.zero_phase
            );
            filter_signal(
                &detrended,
                band,
                config.corners,
                trace.sampling_rate(),
                config.zero_phase,
            )?
        }
        None => detrended,
    };

    trace.with_samples(processed)
}
