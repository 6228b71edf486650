//! End-to-end gait analysis of one recording.
//!
//! magnitude -> zero-phase bandpass -> heel strikes -> stride features.
//! Configuration is checked and the filter designed before any signal work,
//! so a bad setup fails without touching the data.

use log::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::events;
use crate::filters::{design_bandpass, filtfilt};
use crate::magnitude;
use crate::strides;
use crate::types::{AccelerationTrace, GaitAnalysis, StrideFeatures};

/// Analyze a trace with the default configuration
pub fn analyze(trace: &AccelerationTrace) -> Result<GaitAnalysis> {
    analyze_with_config(trace, &AnalysisConfig::default())
}

pub fn analyze_with_config(
    trace: &AccelerationTrace,
    config: &AnalysisConfig,
) -> Result<GaitAnalysis> {
    let fs = trace.sampling_rate_hz();
    config.events.validate(fs)?;
    let sos = design_bandpass(&config.filter, fs)?;

    let magnitude = magnitude::compute(trace.samples())?;
    debug!("magnitude: {} samples at {:.2} Hz", magnitude.len(), fs);

    let filtered = filtfilt(&sos, magnitude.view())?;
    let events = events::detect_heel_strikes(filtered.view(), fs, &config.events)?;
    let (features, stride_times) = strides::extract(&events, fs);

    match &features {
        StrideFeatures::Available(stats) => info!(
            "{} heel strikes over {:.1} s: mean stride {:.3} s, SD {:.3} s, {:.2} Hz",
            events.len(),
            trace.duration_s(),
            stats.mean_stride_time,
            stats.std_stride_time,
            stats.step_frequency
        ),
        StrideFeatures::Unavailable { detected_events } => info!(
            "{} heel strikes over {:.1} s: not enough for stride features",
            detected_events,
            trace.duration_s()
        ),
    }

    Ok(GaitAnalysis {
        features,
        stride_times,
        filtered,
        events,
        sampling_rate_hz: fs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BandpassConfig, EventDetectorConfig, Polarity};
    use crate::error::GaitError;
    use crate::simulate::{synthetic_walk, WalkParams};
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    #[test]
    fn test_five_cycle_walk() {
        let trace = synthetic_walk(&WalkParams::default()).unwrap();
        let analysis = analyze(&trace).unwrap();

        assert_eq!(analysis.events.len(), 5);
        assert_eq!(analysis.stride_times.len(), 4);
        for (event, expected) in analysis.events.iter().zip([50, 150, 250, 350, 450]) {
            assert!(event.abs_diff(expected) <= 2, "event {event} expected near {expected}");
        }

        let stats = analysis.features.stats().expect("features available");
        assert_abs_diff_eq!(stats.mean_stride_time, 1.0, epsilon = 0.02);
        assert_abs_diff_eq!(stats.step_frequency, 1.0, epsilon = 0.02);
        assert!(stats.std_stride_time < 0.02);
    }

    #[test]
    fn test_noisy_walk_with_jitter() {
        let params = WalkParams {
            cycles: 8,
            stride_time_s: 0.95,
            stride_jitter_s: 0.05,
            vibration_g: 0.05,
            ..Default::default()
        };
        let trace = synthetic_walk(&params).unwrap();
        let analysis = analyze(&trace).unwrap();

        assert_eq!(analysis.events.len(), 8);
        let stats = analysis.features.stats().unwrap();
        // Alternating cycle lengths still put heel strikes 0.95 s apart
        assert_abs_diff_eq!(stats.mean_stride_time, 0.95, epsilon = 0.03);
        assert!(stats.std_stride_time < 0.02);

        for (time, expected) in analysis.event_times().iter().zip(params.heel_strike_times()) {
            assert_abs_diff_eq!(*time, expected, epsilon = 0.03);
        }
    }

    #[test]
    fn test_flat_trace_has_no_features() {
        let mut samples = Array2::<f64>::zeros((200, 3));
        samples.column_mut(2).fill(1.0);
        let trace = AccelerationTrace::new(samples, 100.0).unwrap();

        let analysis = analyze(&trace).unwrap();
        assert_eq!(analysis.filtered.len(), 200);
        assert!(analysis.filtered.iter().all(|v| v.abs() < 1e-6));
        assert!(analysis.events.is_empty());
        assert!(analysis.stride_times.is_empty());
        assert_eq!(
            analysis.features,
            StrideFeatures::Unavailable { detected_events: 0 }
        );
    }

    #[test]
    fn test_short_trace_fails_numerically() {
        let trace =
            AccelerationTrace::from_axes(&[0.0, 0.1, 0.0], &[0.0; 3], &[1.0, 1.2, 0.9], 100.0)
                .unwrap();
        let config = AnalysisConfig {
            filter: BandpassConfig {
                order: 4,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            analyze_with_config(&trace, &config),
            Err(GaitError::NumericalInstability(_))
        ));
    }

    #[test]
    fn test_inverted_cutoffs_fail_fast() {
        // Too short to filter as well; the config error must win
        let trace =
            AccelerationTrace::from_axes(&[0.0, 0.1, 0.0], &[0.0; 3], &[1.0, 1.2, 0.9], 100.0)
                .unwrap();
        let config = AnalysisConfig {
            filter: BandpassConfig {
                low_cutoff_hz: 5.0,
                high_cutoff_hz: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            analyze_with_config(&trace, &config),
            Err(GaitError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_maxima_polarity_finds_mid_stance_peaks() {
        let trace = synthetic_walk(&WalkParams::default()).unwrap();
        let config = AnalysisConfig {
            events: EventDetectorConfig {
                polarity: Polarity::Maxima,
                ..Default::default()
            },
            ..Default::default()
        };
        let analysis = analyze_with_config(&trace, &config).unwrap();
        // Crests sit on cycle boundaries; only the interior ones are checked
        let interior: Vec<usize> = analysis
            .events
            .iter()
            .copied()
            .filter(|&e| (50..=450).contains(&e))
            .collect();
        assert_eq!(interior.len(), 4);
        for (event, expected) in interior.iter().zip([100, 200, 300, 400]) {
            assert!(event.abs_diff(expected) <= 2);
        }
    }

    #[test]
    fn test_analysis_is_repeatable() {
        let trace = synthetic_walk(&WalkParams {
            vibration_g: 0.03,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(analyze(&trace).unwrap(), analyze(&trace).unwrap());
    }
}
