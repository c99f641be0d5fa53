//! FFT operations for zero-phase filtering.
//!
//! Plans are cached process-wide in an LRU keyed by size and direction, so
//! repeated filtering of equal-length traces (the common case for a batch of
//! channels from one recording) pays the planning cost once.

use crate::errors::{validate_allocation_size, FractalDimensionError, FractalResult};
use crate::filters::FilterBand;
use lru::LruCache;
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock, Mutex};

/// Cache key for FFT planners, distinguishing forward and inverse transforms
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FftCacheKey {
    size: usize,
    is_forward: bool,
}

type FftPlanCache = LruCache<FftCacheKey, Arc<dyn rustfft::Fft<f64> + Send + Sync>>;

/// Maximum number of cached plans
const MAX_CACHE_ENTRIES: usize = 64;
/// Maximum FFT size (2^24 points)
const MAX_FFT_SIZE: usize = 1 << 24;

static FFT_CACHE: LazyLock<Mutex<FftPlanCache>> = LazyLock::new(|| {
    Mutex::new(LruCache::new(
        NonZeroUsize::new(MAX_CACHE_ENTRIES).unwrap_or(NonZeroUsize::MIN),
    ))
});

fn get_cached_fft_plan(
    size: usize,
    is_forward: bool,
) -> FractalResult<Arc<dyn rustfft::Fft<f64> + Send + Sync>> {
    if size == 0 || size > MAX_FFT_SIZE {
        return Err(FractalDimensionError::NumericalError {
            reason: format!("FFT size {} outside [1, {}]", size, MAX_FFT_SIZE),
            operation: Some("fft planning".to_string()),
        });
    }

    let cache_key = FftCacheKey { size, is_forward };

    // A poisoned cache still holds valid plans
    let mut cache = match FFT_CACHE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(cached_fft) = cache.get(&cache_key) {
        return Ok(cached_fft.clone());
    }

    let mut planner = FftPlanner::new();
    let new_fft = if is_forward {
        planner.plan_fft_forward(size)
    } else {
        planner.plan_fft_inverse(size)
    };

    cache.put(cache_key, new_fft.clone());
    Ok(new_fft)
}

/// Cached forward FFT plan.
pub fn get_cached_fft_forward(size: usize) -> FractalResult<Arc<dyn rustfft::Fft<f64> + Send + Sync>> {
    get_cached_fft_plan(size, true)
}

/// Cached inverse FFT plan.
pub fn get_cached_fft_inverse(size: usize) -> FractalResult<Arc<dyn rustfft::Fft<f64> + Send + Sync>> {
    get_cached_fft_plan(size, false)
}

/// Drop all cached plans.
pub fn clear_fft_cache() {
    match FFT_CACHE.lock() {
        Ok(mut cache) => cache.clear(),
        Err(poisoned) => poisoned.into_inner().clear(),
    }
}

/// Returns (forward_plans, inverse_plans) counts.
pub fn get_fft_cache_stats() -> (usize, usize) {
    let cache = match FFT_CACHE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    cache.iter().fold((0, 0), |(forward, inverse), (key, _)| {
        if key.is_forward {
            (forward + 1, inverse)
        } else {
            (forward, inverse + 1)
        }
    })
}

/// Multiply the spectrum of `data` by a real, even frequency response.
///
/// The signal is extended with its mirror image before transforming, so the
/// implicit periodic continuation has no jump at the record ends. `gain`
/// receives a non-negative frequency in Hz. A real gain introduces no phase
/// shift, so peaks stay on their original samples. The output has the input's
/// length.
pub fn apply_frequency_response<F>(
    data: &[f64],
    sampling_rate: f64,
    gain: F,
) -> FractalResult<Vec<f64>>
where
    F: Fn(f64) -> f64,
{
    let n = data.len();
    if n < 2 {
        return Err(FractalDimensionError::InsufficientData {
            required: 2,
            actual: n,
        });
    }

    let m = 2 * n;
    validate_allocation_size(
        m.saturating_mul(std::mem::size_of::<Complex64>()),
        "zero-phase filtering",
    )?;

    let forward = get_cached_fft_forward(m)?;
    let inverse = get_cached_fft_inverse(m)?;

    let mut buffer: Vec<Complex64> = data
        .iter()
        .chain(data.iter().rev())
        .map(|&x| Complex64::new(x, 0.0))
        .collect();

    forward.process(&mut buffer);

    let bin_width = sampling_rate / m as f64;
    for (k, value) in buffer.iter_mut().enumerate() {
        let bin = k.min(m - k);
        *value *= gain(bin as f64 * bin_width);
    }

    inverse.process(&mut buffer);

    let scale = 1.0 / m as f64;
    Ok(buffer[..n].iter().map(|c| c.re * scale).collect())
}

/// Zero-phase Butterworth filtering in the frequency domain.
///
/// Applies the analogue Butterworth magnitude of [`FilterBand::butterworth_gain`]
/// for the given order. Traces longer than half the largest supported FFT
/// fail with `NumericalError`; the causal filter has no length limit.
pub fn zero_phase_filter(
    data: &[f64],
    band: FilterBand,
    order: usize,
    sampling_rate: f64,
) -> FractalResult<Vec<f64>> {
    log::debug!(
        "Zero-phase {:?} filter, order {}, {} samples",
        band,
        order,
        data.len()
    );
    apply_frequency_response(data, sampling_rate, |f| band.butterworth_gain(f, order))
}
