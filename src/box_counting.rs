//! Box-counting engine.
//!
//! Both axes are normalized independently onto [0, 1] and covered with a
//! square grid of edge ε. The number of distinct occupied cells N(ε) is
//! recorded for every box size of the schedule; sizes whose count exceeds one
//! become (ln(1/ε), ln N) observations for the regression.
//!
//! Two coverage rules are available (see [`CoverageMode`]). Counting sample
//! points is the classic rule, but N(ε) can never exceed the number of
//! samples, so on short traces the small-ε end of the sweep flattens out and
//! drags the slope towards one. Covering the segments between consecutive
//! samples has no such ceiling.
//!
//! On nested grids (every ε an integer multiple of the next one, e.g. a
//! dyadic sweep) each fine cell lies inside exactly one coarse cell, so N(ε)
//! is non-decreasing as ε shrinks. On arbitrary log-spaced schedules the
//! grids are not nested and a count may dip by a cell or two.

use crate::config::CoverageMode;
use crate::errors::{
    validate_all_finite, validate_allocation_size, FractalDimensionError, FractalResult,
};
use crate::math_utils::{constants, min_max};
use crate::results::{BoxCount, ScaleCountPair};
use std::collections::HashSet;

type Cell = (i64, i64);

/// Raw counts and accepted regression pairs from one sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxCountSweep {
    /// One entry per schedule value, in schedule order
    pub box_counts: Vec<BoxCount>,
    /// Accepted observations, ascending in ln(1/ε)
    pub pairs: Vec<ScaleCountPair>,
}

impl BoxCountSweep {
    /// Number of accepted scales.
    pub fn accepted(&self) -> usize {
        self.pairs.len()
    }
}

/// Map `data` onto [0, 1] with `(x - min) / (range + 1e-12)`.
///
/// A constant input maps to all zeros.
pub fn normalize(data: &[f64]) -> Vec<f64> {
    let Some((lo, hi)) = min_max(data) else {
        return Vec::new();
    };
    let scale = hi - lo + constants::NORMALIZATION_GUARD;
    data.iter().map(|&x| (x - lo) / scale).collect()
}

#[inline]
fn cell_index(value: f64, epsilon: f64) -> i64 {
    (value / epsilon).floor() as i64
}

/// Number of distinct grid cells of edge `epsilon` holding at least one
/// normalized point.
pub fn count_boxes(t_norm: &[f64], y_norm: &[f64], epsilon: f64) -> usize {
    t_norm
        .iter()
        .zip(y_norm)
        .map(|(&t, &y)| (cell_index(t, epsilon), cell_index(y, epsilon)))
        .collect::<HashSet<Cell>>()
        .len()
}

/// Number of distinct grid cells of edge `epsilon` crossed by the polyline
/// through the normalized points.
///
/// Within each grid column the segment's amplitude range is evaluated at the
/// column edges, and every row between the lowest and highest value is
/// counted as covered. Expects `t_norm` to be non-decreasing.
pub fn count_segment_boxes(t_norm: &[f64], y_norm: &[f64], epsilon: f64) -> usize {
    let mut cells: HashSet<Cell> = HashSet::new();

    if let (Some(&t), Some(&y)) = (t_norm.first(), y_norm.first()) {
        cells.insert((cell_index(t, epsilon), cell_index(y, epsilon)));
    }

    for (t, y) in t_norm.windows(2).zip(y_norm.windows(2)) {
        let (x0, x1) = (t[0], t[1]);
        let (y0, y1) = (y[0], y[1]);
        let (y_low, y_high) = (y0.min(y1), y0.max(y1));
        let dx = x1 - x0;

        let interpolate = |x: f64| -> f64 {
            if dx <= 0.0 {
                return y1;
            }
            let r = ((x - x0) / dx).clamp(0.0, 1.0);
            (y0 + (y1 - y0) * r).clamp(y_low, y_high)
        };

        let first_column = cell_index(x0, epsilon);
        let last_column = cell_index(x1, epsilon);

        for column in first_column..=last_column {
            let (ya, yb) = if first_column == last_column {
                (y0, y1)
            } else if column == first_column {
                (y0, interpolate((column + 1) as f64 * epsilon))
            } else if column == last_column {
                (interpolate(column as f64 * epsilon), y1)
            } else {
                (
                    interpolate(column as f64 * epsilon),
                    interpolate((column + 1) as f64 * epsilon),
                )
            };

            let lowest_row = cell_index(ya.min(yb), epsilon);
            let highest_row = cell_index(ya.max(yb), epsilon);
            for row in lowest_row..=highest_row {
                cells.insert((column, row));
            }
        }
    }

    cells.len()
}

/// True when the amplitude range is rounding noise relative to the signal's
/// magnitude. Zero range is always flat.
pub fn is_flat(amplitudes: &[f64]) -> bool {
    match min_max(amplitudes) {
        Some((lo, hi)) => hi - lo <= constants::FLAT_RELATIVE_RANGE * lo.abs().max(hi.abs()),
        None => true,
    }
}

/// Upper bound on cell insertions for a segment sweep at `epsilon`.
fn segment_work_estimate(t_norm: &[f64], y_norm: &[f64], epsilon: f64) -> f64 {
    let travel: f64 = t_norm
        .windows(2)
        .zip(y_norm.windows(2))
        .map(|(t, y)| (t[1] - t[0]).abs() + (y[1] - y[0]).abs())
        .sum();
    travel / epsilon + 2.0 * t_norm.len() as f64
}

/// Count occupied boxes at every size in `epsilons`.
///
/// `times` and `amplitudes` must have equal length ≥ 2 and hold only finite
/// values. Sizes below 1e-10 are skipped (recorded with a zero count). A
/// count is accepted into the regression pairs only when more than one box
/// is occupied. A signal without amplitude variation (see [`is_flat`])
/// occupies a single box at every size, so it yields no pairs.
///
/// # Errors
/// * `InsufficientData` for fewer than two points
/// * `InvalidParameter` for arrays of different length
/// * `NumericalError` for non-finite input, or a segment sweep whose grid
///   would be too large to hold
pub fn box_count_sweep(
    times: &[f64],
    amplitudes: &[f64],
    epsilons: &[f64],
    coverage: CoverageMode,
) -> FractalResult<BoxCountSweep> {
    if times.len() != amplitudes.len() {
        return Err(FractalDimensionError::InvalidParameter {
            parameter: "amplitudes".to_string(),
            value: amplitudes.len() as f64,
            constraint: format!("same length as times ({})", times.len()),
        });
    }
    if times.len() < 2 {
        return Err(FractalDimensionError::InsufficientData {
            required: 2,
            actual: times.len(),
        });
    }
    validate_all_finite(times, "times")?;
    validate_all_finite(amplitudes, "amplitudes")?;

    let flat = is_flat(amplitudes);
    if flat {
        log::debug!("Amplitude range is negligible; treating the signal as constant");
    }
    let t_norm = normalize(times);
    let y_norm = normalize(amplitudes);

    let mut box_counts = Vec::with_capacity(epsilons.len());
    let mut pairs = Vec::with_capacity(epsilons.len());

    for &epsilon in epsilons {
        if epsilon.is_nan() || epsilon < constants::MIN_BOX_SIZE {
            log::debug!("Skipping box size {:e}: below resolution limit", epsilon);
            box_counts.push(BoxCount {
                epsilon,
                count: 0,
                accepted: false,
            });
            continue;
        }

        let count = if flat {
            1
        } else {
            match coverage {
                CoverageMode::Samples => count_boxes(&t_norm, &y_norm, epsilon),
                CoverageMode::Segments => {
                    let work = segment_work_estimate(&t_norm, &y_norm, epsilon);
                    validate_allocation_size(
                        (work as usize).saturating_mul(std::mem::size_of::<Cell>()),
                        "segment box counting",
                    )?;
                    count_segment_boxes(&t_norm, &y_norm, epsilon)
                }
            }
        };

        let accepted = count > 1;
        log::trace!("eps = {:.6e}: {} boxes (accepted: {})", epsilon, count, accepted);

        box_counts.push(BoxCount {
            epsilon,
            count,
            accepted,
        });
        if accepted {
            pairs.push(ScaleCountPair {
                log_scale: (1.0 / epsilon).ln(),
                log_count: (count as f64).ln(),
            });
        }
    }

    log::debug!(
        "Box counting ({:?}): {} of {} scales accepted over {} points",
        coverage,
        pairs.len(),
        epsilons.len(),
        times.len()
    );

    Ok(BoxCountSweep { box_counts, pairs })
}
