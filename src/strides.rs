//! Stride timing from heel-strike events.

use ndarray::Array1;

use crate::types::{StrideFeatures, StrideStats};

/// Seconds between consecutive events; one fewer element than `events`
pub fn stride_times(events: &[usize], sampling_rate_hz: f64) -> Array1<f64> {
    events
        .windows(2)
        .map(|pair| pair[1].saturating_sub(pair[0]) as f64 / sampling_rate_hz)
        .collect()
}

/// Stride times plus their summary statistics.
///
/// Fewer than two events, or a non-positive mean, yields
/// `StrideFeatures::Unavailable` rather than an error.
pub fn extract(events: &[usize], sampling_rate_hz: f64) -> (StrideFeatures, Array1<f64>) {
    let times = stride_times(events, sampling_rate_hz);
    let unavailable = StrideFeatures::Unavailable {
        detected_events: events.len(),
    };

    let mean = match times.mean() {
        Some(mean) if mean > 0.0 && mean.is_finite() => mean,
        _ => return (unavailable, times),
    };

    let stats = StrideStats {
        mean_stride_time: mean,
        std_stride_time: times.std(0.0),
        step_frequency: 1.0 / mean,
    };
    (StrideFeatures::Available(stats), times)
}
