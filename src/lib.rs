//! # Fractal Seismic
//!
//! Box-counting fractal dimension estimation for seismic waveforms.
//!
//! A trace (identifier, sampling interval, samples) goes through a short,
//! pure pipeline:
//!
//! 1. **Schedule**: box sizes log-uniformly spaced between a maximum and a
//!    minimum edge length in normalized units.
//! 2. **Preprocess**: optional linear or mean detrending followed by an
//!    optional Butterworth lowpass, highpass or bandpass filter (causal
//!    second-order sections or zero-phase FFT).
//! 3. **Count**: both axes are mapped onto [0, 1] and the number of occupied
//!    grid cells N(ε) is counted at every box size.
//! 4. **Fit**: ordinary least squares of ln N against ln(1/ε); the slope is
//!    the dimension D, reported with its R².
//!
//! Each stage takes immutable input and returns a new value, so traces are
//! analysed independently and, with the default `parallel` feature, on the
//! rayon thread pool.
//!
//! ## Quick Start
//!
//! ```rust
//! use fractal_seismic::generators::{generate_trace, GeneratorConfig, SignalKind};
//! use fractal_seismic::{analyze_trace, AnalysisConfig, CoverageMode};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let trace = generate_trace(
//!         "SYN.BRW..HHZ",
//!         SignalKind::BrownianMotion,
//!         &GeneratorConfig::seeded(2000, 42),
//!     )?;
//!
//!     let config = AnalysisConfig::default().coverage(CoverageMode::Segments);
//!     let analysis = analyze_trace(&trace, &config)?;
//!     println!(
//!         "{}: D = {:.3}, R² = {:.3}",
//!         analysis.trace_id, analysis.estimate.dimension, analysis.estimate.r_squared
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Degenerate input
//!
//! A signal without amplitude variation occupies one box at every size and
//! produces no usable scales; the pipeline reports
//! [`FractalDimensionError::InsufficientData`]. Batch entry points collect
//! such failures per trace (see [`TraceOutcome::status`]) instead of
//! aborting.
//!
//! ## Features
//!
//! - `parallel` (default): analyse multi-trace batches with rayon
//! - `serde`: `Serialize`/`Deserialize` for configuration and result types

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod math_utils;
pub mod results;
pub mod trace;

// Pipeline stages
pub mod box_counting;
pub mod estimator;
pub mod fft_ops;
pub mod filters;
pub mod preprocessing;
pub mod schedule;

// Orchestration and synthetic data
pub mod analyzer;
pub mod generators;

// Re-exports for convenience - main public API
pub use analyzer::{analyze_first, analyze_trace, analyze_traces, FractalDimensionAnalyzer};
pub use box_counting::{
    box_count_sweep, count_boxes, count_segment_boxes, is_flat, BoxCountSweep,
};
pub use config::{
    AnalysisConfig, CoverageMode, DetrendMode, FilterMode, PreprocessingConfig, ScheduleConfig,
};
pub use errors::{FractalDimensionError, FractalResult};
pub use estimator::estimate_dimension;
pub use filters::{ButterworthFilter, FilterBand};
pub use preprocessing::{detrend_signal, filter_signal, preprocess_trace};
pub use results::{
    BatchSummary, BoxCount, DimensionEstimate, OutcomeStatus, ScaleCountPair, TraceAnalysis,
    TraceOutcome,
};
pub use schedule::{generate_epsilon_schedule, EpsilonSchedule};
pub use trace::Trace;

// FFT plan cache
pub use fft_ops::{clear_fft_cache, get_fft_cache_stats};
