//! Epsilon schedule generation.
//!
//! Box sizes are expressed in normalized units: both the time axis and the
//! amplitude axis are mapped onto [0, 1] before counting, so every epsilon
//! lives in (0, 1]. Sizes are spaced evenly in log space, largest first,
//! which gives evenly spaced abscissae in the log-log regression.

use crate::config::ScheduleConfig;
use crate::errors::{validate_allocation_size, FractalDimensionError, FractalResult};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Validated, descending sequence of box sizes.
///
/// Deserialization goes through [`EpsilonSchedule::new`]; the stored values
/// are regenerated from the bounds and their count.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "ScheduleRecord"))]
pub struct EpsilonSchedule {
    max_epsilon: f64,
    min_epsilon: f64,
    values: Vec<f64>,
}

impl EpsilonSchedule {
    /// Build a schedule of `count` log-uniform sizes from `max_epsilon` down
    /// to `min_epsilon`, both endpoints included.
    ///
    /// # Errors
    /// `InvalidSchedule` if a bound is non-finite or outside (0, 1], if
    /// `min_epsilon >= max_epsilon`, if `count < 2`, or if `count` values
    /// would not fit the allocation limit.
    ///
    /// # Example
    /// ```rust
    /// use fractal_seismic::schedule::EpsilonSchedule;
    ///
    /// let schedule = EpsilonSchedule::new(0.5, 0.005, 3).unwrap();
    /// assert_eq!(schedule.values()[0], 0.5);
    /// assert!((schedule.values()[1] - 0.05).abs() < 1e-12);
    /// assert_eq!(schedule.values()[2], 0.005);
    /// ```
    pub fn new(max_epsilon: f64, min_epsilon: f64, count: usize) -> FractalResult<Self> {
        validate_bound(max_epsilon, "max_epsilon")?;
        validate_bound(min_epsilon, "min_epsilon")?;

        if min_epsilon >= max_epsilon {
            return Err(FractalDimensionError::InvalidSchedule {
                parameter: "min_epsilon".to_string(),
                value: min_epsilon,
                constraint: format!("< max_epsilon ({})", max_epsilon),
            });
        }
        if count < 2 {
            return Err(FractalDimensionError::InvalidSchedule {
                parameter: "count".to_string(),
                value: count as f64,
                constraint: ">= 2".to_string(),
            });
        }
        if let Err(e) = validate_allocation_size(
            count.saturating_mul(std::mem::size_of::<f64>()),
            "epsilon schedule",
        ) {
            log::debug!("Rejecting schedule of {} steps: {}", count, e);
            return Err(FractalDimensionError::InvalidSchedule {
                parameter: "count".to_string(),
                value: count as f64,
                constraint: "small enough to allocate".to_string(),
            });
        }

        let values = log_spaced_descending(max_epsilon, min_epsilon, count);
        Ok(Self {
            max_epsilon,
            min_epsilon,
            values,
        })
    }

    /// Build a schedule from a [`ScheduleConfig`].
    pub fn from_config(config: &ScheduleConfig) -> FractalResult<Self> {
        Self::new(config.max_epsilon, config.min_epsilon, config.steps)
    }

    /// Box sizes, largest first.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Largest box size.
    pub fn max_epsilon(&self) -> f64 {
        self.max_epsilon
    }

    /// Smallest box size.
    pub fn min_epsilon(&self) -> f64 {
        self.min_epsilon
    }

    /// Number of box sizes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed schedule.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Ratio between consecutive sizes (`values[i] / values[i + 1]`).
    pub fn step_ratio(&self) -> f64 {
        (self.max_epsilon / self.min_epsilon).powf(1.0 / (self.values.len() - 1) as f64)
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct ScheduleRecord {
    max_epsilon: f64,
    min_epsilon: f64,
    values: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<ScheduleRecord> for EpsilonSchedule {
    type Error = FractalDimensionError;

    fn try_from(record: ScheduleRecord) -> FractalResult<Self> {
        Self::new(record.max_epsilon, record.min_epsilon, record.values.len())
    }
}

/// Generate the schedule values directly.
///
/// Convenience wrapper around [`EpsilonSchedule::new`] for callers that only
/// need the numbers.
pub fn generate_epsilon_schedule(
    max_epsilon: f64,
    min_epsilon: f64,
    count: usize,
) -> FractalResult<Vec<f64>> {
    EpsilonSchedule::new(max_epsilon, min_epsilon, count).map(|schedule| schedule.values)
}

fn validate_bound(value: f64, name: &str) -> FractalResult<()> {
    if !(value.is_finite() && value > 0.0 && value <= 1.0) {
        return Err(FractalDimensionError::InvalidSchedule {
            parameter: name.to_string(),
            value,
            constraint: "(0, 1]".to_string(),
        });
    }
    Ok(())
}

fn log_spaced_descending(start: f64, stop: f64, count: usize) -> Vec<f64> {
    let log_start = start.log10();
    let log_stop = stop.log10();
    let step = (log_stop - log_start) / (count - 1) as f64;

    let mut values: Vec<f64> = (0..count)
        .map(|i| 10f64.powf(log_start + step * i as f64))
        .collect();

    // Endpoints are exact, not round-tripped through log10
    values[0] = start;
    values[count - 1] = stop;
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_schedule_endpoints_and_order() {
        let schedule = EpsilonSchedule::new(0.5, 0.001, 20).unwrap();
        let values = schedule.values();
        assert_eq!(values.len(), 20);
        assert_eq!(values[0], 0.5);
        assert_eq!(values[19], 0.001);
        for pair in values.windows(2) {
            assert!(pair[0] > pair[1], "schedule must be strictly descending");
        }
    }

    #[test]
    fn test_schedule_is_log_uniform() {
        let schedule = EpsilonSchedule::new(0.8, 0.002, 12).unwrap();
        let ratio = schedule.step_ratio();
        for pair in schedule.values().windows(2) {
            assert_approx_eq!(pair[0] / pair[1], ratio, 1e-9);
        }
    }

    #[test]
    fn test_two_point_schedule() {
        let values = generate_epsilon_schedule(1.0, 0.1, 2).unwrap();
        assert_eq!(values, vec![1.0, 0.1]);
    }

    #[test]
    fn test_invalid_schedules() {
        let cases = [
            (0.5, 0.5, 10),
            (0.1, 0.5, 10),
            (0.5, 0.0, 10),
            (0.5, -0.1, 10),
            (1.5, 0.1, 10),
            (f64::NAN, 0.1, 10),
            (0.5, 0.1, 1),
            (0.5, 0.1, 0),
        ];
        for (max_eps, min_eps, count) in cases {
            let result = EpsilonSchedule::new(max_eps, min_eps, count);
            assert!(
                matches!(result, Err(FractalDimensionError::InvalidSchedule { .. })),
                "({}, {}, {}) should be rejected",
                max_eps,
                min_eps,
                count
            );
        }
    }

    #[test]
    fn test_oversized_count_is_rejected() {
        for count in [usize::MAX / 8, usize::MAX, (1 << 27) + 1] {
            match EpsilonSchedule::new(0.5, 0.001, count) {
                Err(FractalDimensionError::InvalidSchedule { parameter, .. }) => {
                    assert_eq!(parameter, "count")
                }
                other => panic!("count {} gave {:?}", count, other),
            }
        }
        let huge = ScheduleConfig::new(0.5, 0.001, usize::MAX / 8);
        assert!(EpsilonSchedule::from_config(&huge).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_validates() {
        let schedule = EpsilonSchedule::new(0.5, 0.01, 5).unwrap();
        let json = serde_json::to_string(&schedule).unwrap();
        let back: EpsilonSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schedule);

        let empty = r#"{"max_epsilon":0.5,"min_epsilon":0.01,"values":[]}"#;
        assert!(serde_json::from_str::<EpsilonSchedule>(empty).is_err());
        let inverted = r#"{"max_epsilon":0.01,"min_epsilon":0.5,"values":[0.01,0.5]}"#;
        assert!(serde_json::from_str::<EpsilonSchedule>(inverted).is_err());
    }

    #[test]
    fn test_from_config_default() {
        let schedule = EpsilonSchedule::from_config(&ScheduleConfig::default()).unwrap();
        assert_eq!(schedule.len(), 20);
        assert_eq!(schedule.max_epsilon(), 0.5);
        assert_eq!(schedule.min_epsilon(), 0.001);
    }
}
