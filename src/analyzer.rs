//! Per-trace pipeline and multi-trace orchestration.
//!
//! [`analyze_trace`] runs the full chain for one trace: the epsilon schedule
//! is validated, the trace is preprocessed, boxes are counted at every size
//! and the log-log line is fitted. Nothing is shared between traces, so a
//! batch is a plain map over the input, run on the rayon pool when the
//! `parallel` feature is enabled. A failing trace never stops its siblings;
//! its error is returned in the corresponding [`TraceOutcome`].

use crate::box_counting::{box_count_sweep, is_flat};
use crate::config::AnalysisConfig;
use crate::errors::{FractalDimensionError, FractalResult};
use crate::estimator::estimate_dimension;
use crate::preprocessing::preprocess_trace;
use crate::results::{BatchSummary, OutcomeStatus, TraceAnalysis, TraceOutcome};
use crate::schedule::EpsilonSchedule;
use crate::trace::Trace;
use std::collections::BTreeMap;

/// Maximum samples accepted per registered trace.
pub const MAX_TRACE_SAMPLES: usize = 50_000_000;

/// Run schedule → preprocess → count → fit for one trace.
///
/// The input trace is not modified. Identical inputs give bit-identical
/// results.
///
/// # Errors
/// * `InvalidSchedule` for bad box-size bounds or step count
/// * `InvalidParameter` for a filter request the trace cannot satisfy
/// * `InsufficientData` when fewer than two box sizes gave a usable count,
///   which includes every constant or near-constant input trace
///
/// # Example
/// ```rust
/// use fractal_seismic::{analyze_trace, AnalysisConfig, Trace};
///
/// let samples: Vec<f64> = (0..400).map(|i| ((i * 7919) % 113) as f64).collect();
/// let trace = Trace::new("demo", 0.01, samples).unwrap();
/// let analysis = analyze_trace(&trace, &AnalysisConfig::default()).unwrap();
/// assert_eq!(analysis.trace_id, "demo");
/// assert!(analysis.estimate.dimension > 0.0);
/// ```
pub fn analyze_trace(trace: &Trace, config: &AnalysisConfig) -> FractalResult<TraceAnalysis> {
    let schedule = EpsilonSchedule::from_config(&config.schedule)?;
    let processed = preprocess_trace(trace, &config.preprocessing)?;

    // Processing a constant trace leaves only rounding residue or filter
    // transients, so flatness is judged on the input
    let amplitudes = if is_flat(trace.samples()) {
        trace.samples()
    } else {
        processed.samples()
    };

    let times = processed.times();
    let sweep = box_count_sweep(&times, amplitudes, schedule.values(), config.coverage)?;
    let estimate = estimate_dimension(&sweep.pairs)?;

    log::debug!(
        "Trace {}: D = {:.4}, R² = {:.4} over {} scales",
        trace.id(),
        estimate.dimension,
        estimate.r_squared,
        estimate.pairs.len()
    );

    Ok(TraceAnalysis {
        trace_id: trace.id().to_string(),
        estimate,
        box_counts: sweep.box_counts,
    })
}

fn outcome_for(trace: &Trace, config: &AnalysisConfig) -> TraceOutcome {
    TraceOutcome {
        trace_id: trace.id().to_string(),
        result: analyze_trace(trace, config),
    }
}

fn run_batch(traces: &[&Trace], config: &AnalysisConfig) -> Vec<TraceOutcome> {
    #[cfg(feature = "parallel")]
    let outcomes: Vec<TraceOutcome> = {
        use rayon::prelude::*;
        traces
            .par_iter()
            .map(|trace| outcome_for(trace, config))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<TraceOutcome> = traces
        .iter()
        .map(|trace| outcome_for(trace, config))
        .collect();

    for outcome in &outcomes {
        match (&outcome.result, outcome.status()) {
            (Err(e), OutcomeStatus::DegenerateFit) => {
                log::warn!("Trace {}: degenerate fit: {}", outcome.trace_id, e)
            }
            (Err(e), _) => log::warn!("Trace {} failed: {}", outcome.trace_id, e),
            (Ok(_), OutcomeStatus::DegenerateFit) => {
                log::warn!("Trace {}: R² undefined", outcome.trace_id)
            }
            (Ok(_), _) => {}
        }
    }

    let summary = BatchSummary::from_outcomes(&outcomes);
    log::info!(
        "Analysed {} traces: {} ok, {} degenerate, {} configuration errors, {} failed",
        summary.total,
        summary.succeeded,
        summary.degenerate,
        summary.configuration_errors,
        summary.failed
    );

    outcomes
}

/// Analyse every trace with the same configuration.
///
/// Outcomes come back in input order, each tagged with its trace id.
pub fn analyze_traces(traces: &[Trace], config: &AnalysisConfig) -> Vec<TraceOutcome> {
    let refs: Vec<&Trace> = traces.iter().collect();
    run_batch(&refs, config)
}

/// Analyse only the first trace of a multi-trace input.
///
/// Returns `None` for an empty input.
pub fn analyze_first(traces: &[Trace], config: &AnalysisConfig) -> Option<TraceOutcome> {
    traces.first().map(|trace| outcome_for(trace, config))
}

/// Registry of traces analysed under one configuration.
///
/// Traces are keyed by id and iterated in id order, so batch output is
/// reproducible regardless of insertion order.
#[derive(Debug, Clone, Default)]
pub struct FractalDimensionAnalyzer {
    traces: BTreeMap<String, Trace>,
    config: AnalysisConfig,
}

impl FractalDimensionAnalyzer {
    /// Empty analyzer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty analyzer with the given configuration.
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self {
            traces: BTreeMap::new(),
            config,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Replace the configuration used by later analyses.
    pub fn set_config(&mut self, config: AnalysisConfig) {
        self.config = config;
    }

    /// Register a trace, replacing any trace with the same id.
    ///
    /// Returns the replaced trace, if there was one.
    ///
    /// # Errors
    /// `InvalidParameter` if the trace holds more than [`MAX_TRACE_SAMPLES`].
    pub fn add_trace(&mut self, trace: Trace) -> FractalResult<Option<Trace>> {
        if trace.len() > MAX_TRACE_SAMPLES {
            return Err(FractalDimensionError::InvalidParameter {
                parameter: "trace_length".to_string(),
                value: trace.len() as f64,
                constraint: format!("Maximum {} samples allowed", MAX_TRACE_SAMPLES),
            });
        }
        let previous = self.traces.insert(trace.id().to_string(), trace);
        if let Some(old) = &previous {
            log::debug!("Replaced trace {}", old.id());
        }
        Ok(previous)
    }

    /// Unregister a trace.
    ///
    /// # Errors
    /// `TraceNotFound` if no trace has this id.
    pub fn remove_trace(&mut self, id: &str) -> FractalResult<Trace> {
        self.traces
            .remove(id)
            .ok_or_else(|| FractalDimensionError::TraceNotFound { id: id.to_string() })
    }

    /// Look up a trace.
    ///
    /// # Errors
    /// `TraceNotFound` if no trace has this id.
    pub fn get_trace(&self, id: &str) -> FractalResult<&Trace> {
        self.traces
            .get(id)
            .ok_or_else(|| FractalDimensionError::TraceNotFound { id: id.to_string() })
    }

    /// Registered ids in ascending order.
    pub fn trace_ids(&self) -> Vec<String> {
        self.traces.keys().cloned().collect()
    }

    /// Number of registered traces.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Analyse one registered trace.
    ///
    /// # Errors
    /// `TraceNotFound` for an unknown id, otherwise as [`analyze_trace`].
    pub fn analyze(&self, id: &str) -> FractalResult<TraceAnalysis> {
        analyze_trace(self.get_trace(id)?, &self.config)
    }

    /// Analyse every registered trace, in id order.
    pub fn analyze_all(&self) -> Vec<TraceOutcome> {
        let refs: Vec<&Trace> = self.traces.values().collect();
        run_batch(&refs, &self.config)
    }

    /// Analyse only the trace with the lowest id.
    pub fn analyze_first(&self) -> Option<TraceOutcome> {
        self.traces
            .values()
            .next()
            .map(|trace| outcome_for(trace, &self.config))
    }
}
