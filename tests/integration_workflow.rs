//! End-to-end workflow tests: preprocessing, batch analysis and determinism.

use fractal_seismic::generators::{generate_trace, GeneratorConfig, SignalKind};
use fractal_seismic::{
    analyze_first, analyze_trace, analyze_traces, preprocess_trace, AnalysisConfig, CoverageMode,
    DetrendMode, FractalDimensionAnalyzer, OutcomeStatus, PreprocessingConfig, ScheduleConfig,
    Trace,
};

fn brownian(id: &str, length: usize, seed: u64) -> Trace {
    generate_trace(
        id,
        SignalKind::BrownianMotion,
        &GeneratorConfig::seeded(length, seed),
    )
    .unwrap()
}

#[test]
fn test_pipeline_is_bit_deterministic() {
    let trace = brownian("DET", 1000, 11);
    let configs = vec![
        AnalysisConfig::default(),
        AnalysisConfig::with_preprocessing(
            PreprocessingConfig::bandpass(0.5, 10.0).with_detrend(DetrendMode::Linear),
        ),
        AnalysisConfig::with_preprocessing(
            PreprocessingConfig::lowpass(5.0).with_zero_phase(true),
        )
        .coverage(CoverageMode::Segments),
    ];

    for config in configs {
        let a = analyze_trace(&trace, &config).unwrap();
        let b = analyze_trace(&trace, &config).unwrap();
        assert_eq!(a.estimate.dimension.to_bits(), b.estimate.dimension.to_bits());
        assert_eq!(a.estimate.intercept.to_bits(), b.estimate.intercept.to_bits());
        assert_eq!(a.estimate.r_squared.to_bits(), b.estimate.r_squared.to_bits());
        assert_eq!(a, b);
    }
}

#[test]
fn test_batch_matches_individual_analysis() {
    let traces: Vec<Trace> = (0..8)
        .map(|k| brownian(&format!("XX.S{:02}..HHZ", k), 600, 100 + k))
        .collect();
    let config = AnalysisConfig::default();

    let outcomes = analyze_traces(&traces, &config);
    assert_eq!(outcomes.len(), traces.len());

    for (trace, outcome) in traces.iter().zip(&outcomes) {
        assert_eq!(outcome.trace_id, trace.id());
        let single = analyze_trace(trace, &config).unwrap();
        let batch = outcome.analysis().unwrap();
        assert_eq!(
            batch.estimate.dimension.to_bits(),
            single.estimate.dimension.to_bits()
        );
        assert_eq!(batch, &single);
    }
}

#[test]
fn test_preprocessing_noop_keeps_samples() {
    let trace = brownian("RAW", 500, 5);
    let processed = preprocess_trace(&trace, &PreprocessingConfig::none()).unwrap();
    assert_eq!(processed, trace);

    // Raw analysis equals analysis of the no-op preprocessed copy
    let config = AnalysisConfig::raw();
    assert_eq!(
        analyze_trace(&trace, &config).unwrap(),
        analyze_trace(&processed, &config).unwrap()
    );
}

#[test]
fn test_preprocessing_keeps_length_interval_and_original() {
    let trace = brownian("PP", 1000, 8);
    let original = trace.samples().to_vec();

    let configs = vec![
        PreprocessingConfig::none().with_detrend(DetrendMode::Demean),
        PreprocessingConfig::lowpass(1.0),
        PreprocessingConfig::highpass(0.1).with_detrend(DetrendMode::Linear),
        PreprocessingConfig::bandpass(0.1, 1.0).with_zero_phase(true),
        PreprocessingConfig::bandpass(0.1, 1.0).with_corners(2),
    ];

    for config in configs {
        let out = preprocess_trace(&trace, &config).unwrap();
        assert_eq!(out.len(), trace.len());
        assert_eq!(out.sampling_interval(), trace.sampling_interval());
        assert_eq!(out.id(), trace.id());
        assert_ne!(out.samples(), trace.samples());
    }
    assert_eq!(trace.samples(), original.as_slice());
}

#[test]
fn test_smoothing_lowers_dimension() {
    let config = GeneratorConfig::seeded(2000, 21);
    let noise = generate_trace("NOISE", SignalKind::WhiteNoise, &config).unwrap();

    let raw = AnalysisConfig::raw().coverage(CoverageMode::Segments);
    let smoothed = AnalysisConfig::with_preprocessing(
        PreprocessingConfig::lowpass(1.0).with_zero_phase(true),
    )
    .coverage(CoverageMode::Segments);

    let d_raw = analyze_trace(&noise, &raw).unwrap().estimate.dimension;
    let d_smooth = analyze_trace(&noise, &smoothed).unwrap().estimate.dimension;
    assert!(
        d_smooth < d_raw - 0.2,
        "lowpass should smooth the graph: raw {:.3}, smoothed {:.3}",
        d_raw,
        d_smooth
    );
}

#[test]
fn test_analyzer_workflow() {
    let mut analyzer = FractalDimensionAnalyzer::with_config(
        AnalysisConfig::with_preprocessing(
            PreprocessingConfig::none().with_detrend(DetrendMode::Linear),
        )
        .schedule(ScheduleConfig::new(0.5, 0.005, 12)),
    );

    for (k, id) in ["BHZ", "BHN", "BHE"].iter().enumerate() {
        analyzer.add_trace(brownian(id, 1500, k as u64)).unwrap();
    }
    assert_eq!(analyzer.trace_ids(), vec!["BHE", "BHN", "BHZ"]);

    let outcomes = analyzer.analyze_all();
    assert_eq!(outcomes.len(), 3);
    for outcome in &outcomes {
        assert_eq!(outcome.status(), OutcomeStatus::Success);
        let analysis = outcome.analysis().unwrap();
        assert_eq!(analysis.box_counts.len(), 12);
        assert!(analysis.estimate.r_squared > 0.8);
        assert_eq!(analysis.estimate.fitted_line().len(), analysis.estimate.pairs.len());
    }

    let first = analyzer.analyze_first().unwrap();
    assert_eq!(first.trace_id, "BHE");
    assert_eq!(
        first.analysis().unwrap(),
        outcomes[0].analysis().unwrap()
    );
}

#[test]
fn test_first_trace_policy() {
    let traces = vec![brownian("FIRST", 400, 1), brownian("SECOND", 400, 2)];
    let outcome = analyze_first(&traces, &AnalysisConfig::default()).unwrap();
    assert_eq!(outcome.trace_id, "FIRST");
    assert!(outcome.result.is_ok());
}
