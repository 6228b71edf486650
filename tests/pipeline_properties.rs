//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify, over generated walks and arbitrary signals:
//! 1. Determinism: the same trace and config give identical results
//! 2. Lengths: filtered output matches the input, one stride per event gap
//! 3. Events: strictly increasing and at least the minimum separation apart
//! 4. Features: all three statistics defined together, iff two or more events
//! 5. Zero phase: a symmetric pulse keeps its peak position

use gait_tracker_rs::config::{AnalysisConfig, BandpassConfig, EventDetectorConfig};
use gait_tracker_rs::filters::{design_bandpass, filtfilt};
use gait_tracker_rs::simulate::{synthetic_walk, WalkParams};
use gait_tracker_rs::{analyze_with_config, magnitude, AccelerationTrace, GaitAnalysis};
use ndarray::Array1;
use proptest::prelude::*;

// ── Strategies ───────────────────────────────────────────────────────

fn arb_walk() -> impl Strategy<Value = WalkParams> {
    (
        3usize..10,
        0.8..1.4_f64,
        0.0..0.1_f64,
        prop::sample::select(vec![50.0, 100.0, 128.0, 200.0]),
        0.2..0.8_f64,
        0.0..0.1_f64,
    )
        .prop_map(|(cycles, stride, jitter, fs, amplitude, vibration)| WalkParams {
            cycles,
            stride_time_s: stride,
            stride_jitter_s: jitter,
            sampling_rate_hz: fs,
            vertical_amplitude_g: amplitude,
            vibration_g: vibration,
            ..Default::default()
        })
}

fn arb_config() -> impl Strategy<Value = AnalysisConfig> {
    (
        1usize..=4,
        0.3..1.0_f64,
        prop::option::of(0.0..0.5_f64),
    )
        .prop_map(|(order, min_sep, prominence)| AnalysisConfig {
            filter: BandpassConfig {
                order,
                ..Default::default()
            },
            events: EventDetectorConfig {
                min_event_separation_s: min_sep,
                prominence_threshold: prominence,
                ..Default::default()
            },
        })
}

fn arb_noise_trace() -> impl Strategy<Value = AccelerationTrace> {
    prop::collection::vec((-2.0..2.0_f64, -2.0..2.0_f64, -2.0..2.0_f64), 100..400).prop_map(
        |rows| {
            let x: Vec<f64> = rows.iter().map(|r| r.0).collect();
            let y: Vec<f64> = rows.iter().map(|r| r.1).collect();
            let z: Vec<f64> = rows.iter().map(|r| r.2).collect();
            AccelerationTrace::from_axes(&x, &y, &z, 100.0).unwrap()
        },
    )
}

fn check_invariants(
    trace: &AccelerationTrace,
    config: &AnalysisConfig,
    analysis: &GaitAnalysis,
) -> Result<(), TestCaseError> {
    prop_assert_eq!(analysis.filtered.len(), trace.len());
    prop_assert_eq!(magnitude::of_trace(trace).len(), trace.len());
    prop_assert_eq!(
        analysis.stride_times.len(),
        analysis.events.len().saturating_sub(1)
    );

    let distance = config.events.min_distance_samples(trace.sampling_rate_hz());
    for pair in analysis.events.windows(2) {
        prop_assert!(pair[1] > pair[0]);
        prop_assert!(pair[1] - pair[0] >= distance);
    }
    prop_assert!(analysis.events.iter().all(|&e| e < trace.len()));

    let features = &analysis.features;
    prop_assert_eq!(features.is_available(), analysis.events.len() >= 2);
    prop_assert_eq!(features.mean_stride_time().is_some(), features.is_available());
    prop_assert_eq!(features.std_stride_time().is_some(), features.is_available());
    prop_assert_eq!(features.step_frequency().is_some(), features.is_available());
    if let Some(stats) = features.stats() {
        prop_assert!(stats.mean_stride_time > 0.0);
        prop_assert!(stats.std_stride_time >= 0.0);
        prop_assert!((stats.step_frequency * stats.mean_stride_time - 1.0).abs() < 1e-12);
    }
    Ok(())
}

// ── 1-4. Pipeline invariants ─────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Generated walks satisfy every structural invariant and are repeatable.
    #[test]
    fn walk_invariants(params in arb_walk(), config in arb_config()) {
        let trace = synthetic_walk(&params).unwrap();
        let analysis = analyze_with_config(&trace, &config).unwrap();
        check_invariants(&trace, &config, &analysis)?;

        let again = analyze_with_config(&trace, &config).unwrap();
        prop_assert_eq!(analysis, again);
    }

    /// Noise has no gait in it, but the same invariants still hold.
    #[test]
    fn noise_invariants(trace in arb_noise_trace(), config in arb_config()) {
        let analysis = analyze_with_config(&trace, &config).unwrap();
        check_invariants(&trace, &config, &analysis)?;
    }

    /// With the default config, a clean walk yields one heel strike per cycle.
    /// Strides up to 1 s keep the first and last strikes within the minimum
    /// separation of the recording edges.
    #[test]
    fn clean_walk_one_event_per_cycle(cycles in 3usize..12, stride in 0.8..1.0_f64) {
        let params = WalkParams {
            cycles,
            stride_time_s: stride,
            ..Default::default()
        };
        let trace = synthetic_walk(&params).unwrap();
        let analysis = analyze_with_config(&trace, &AnalysisConfig::default()).unwrap();
        prop_assert_eq!(analysis.events.len(), cycles);

        let stats = analysis.features.stats().unwrap();
        prop_assert!((stats.mean_stride_time - stride).abs() < 0.03);
    }
}

// ── 5. Zero phase ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A Gaussian pulse's peak stays within one sample after filtering.
    #[test]
    fn pulse_peak_not_shifted(center in 150usize..350, sigma in 5.0..20.0_f64, order in 1usize..=4) {
        let x = Array1::from_iter((0..500).map(|i| {
            let d = (i as f64 - center as f64) / sigma;
            (-0.5 * d * d).exp()
        }));
        let config = BandpassConfig { order, ..Default::default() };
        let sos = design_bandpass(&config, 100.0).unwrap();
        let y = filtfilt(&sos, x.view()).unwrap();

        let peak = y
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        prop_assert!(peak.abs_diff(center) <= 1, "peak {} vs center {}", peak, center);
    }
}
