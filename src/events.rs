//! Heel-strike detection.
//!
//! Heel strikes show up as troughs of the band-limited magnitude signal.
//! The search negates the signal (for the default minima polarity) and
//! picks local maxima, then applies two gates in order:
//! 1. minimum separation: the highest candidate wins within a window,
//! 2. prominence: the peak must stand out from its surrounding baseline.

use std::cmp::Ordering;

use log::debug;
use ndarray::{Array1, ArrayView1};

use crate::config::{EventDetectorConfig, Polarity};
use crate::error::Result;

/// Peaks whose prominence does not exceed this are rounding ripple, not gait
/// events. Far below any accelerometer's resolution in g or m/s².
pub const PROMINENCE_NOISE_FLOOR: f64 = 1e-9;

/// Heel-strike sample indices in `signal`, strictly increasing.
///
/// An empty result means no qualifying events, which is a valid outcome.
pub fn detect_heel_strikes(
    signal: ArrayView1<'_, f64>,
    sampling_rate_hz: f64,
    config: &EventDetectorConfig,
) -> Result<Vec<usize>> {
    config.validate(sampling_rate_hz)?;

    let searched: Array1<f64> = match config.polarity {
        Polarity::Minima => signal.mapv(|v| -v),
        Polarity::Maxima => signal.to_owned(),
    };

    let candidates = local_maxima(searched.view());
    let distance = config.min_distance_samples(sampling_rate_hz);
    let spaced = select_by_distance(searched.view(), &candidates, distance);
    let prominences = peak_prominences(searched.view(), &spaced);

    let threshold = config.prominence_threshold;
    let events: Vec<usize> = spaced
        .iter()
        .zip(prominences.iter())
        .filter(|&(_, &p)| p > PROMINENCE_NOISE_FLOOR && threshold.map_or(true, |t| p >= t))
        .map(|(&idx, _)| idx)
        .collect();

    debug!(
        "heel strikes: {} candidates, {} after {}-sample separation, {} after prominence",
        candidates.len(),
        spaced.len(),
        distance,
        events.len()
    );

    Ok(events)
}

/// Indices of strict local maxima. A flat-topped peak is reported once, at
/// the middle of its plateau; the first and last samples are never peaks.
pub fn local_maxima(x: ArrayView1<'_, f64>) -> Vec<usize> {
    let n = x.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }

    let i_max = n - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Keep the highest peaks such that no two kept peaks are closer than
/// `distance` samples. Equal heights favour the earlier peak.
pub fn select_by_distance(x: ArrayView1<'_, f64>, peaks: &[usize], distance: usize) -> Vec<usize> {
    if distance <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }

    let mut by_height: Vec<usize> = (0..peaks.len()).collect();
    by_height.sort_by(|&a, &b| match x[peaks[b]].total_cmp(&x[peaks[a]]) {
        Ordering::Equal => a.cmp(&b),
        other => other,
    });

    let mut keep = vec![true; peaks.len()];
    for j in by_height {
        if !keep[j] {
            continue;
        }
        for k in (0..j).rev() {
            if peaks[j] - peaks[k] >= distance {
                break;
            }
            keep[k] = false;
        }
        for k in j + 1..peaks.len() {
            if peaks[k] - peaks[j] >= distance {
                break;
            }
            keep[k] = false;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Prominence of each peak: its height above the higher of the two lowest
/// points reached on either side before the signal climbs above the peak
/// (or the border is hit).
pub fn peak_prominences(x: ArrayView1<'_, f64>, peaks: &[usize]) -> Vec<f64> {
    let n = x.len();
    peaks
        .iter()
        .map(|&peak| {
            let height = x[peak];

            let mut left_min = height;
            let mut i = peak;
            loop {
                if x[i] > height {
                    break;
                }
                left_min = left_min.min(x[i]);
                if i == 0 {
                    break;
                }
                i -= 1;
            }

            let mut right_min = height;
            for &value in x.slice(ndarray::s![peak..n]).iter() {
                if value > height {
                    break;
                }
                right_min = right_min.min(value);
            }

            height - left_min.max(right_min)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GaitError;
    use ndarray::array;
    use std::f64::consts::PI;

    #[test]
    fn test_local_maxima_simple() {
        let x = array![0.0, 1.0, 0.0, 2.0, 3.0, 1.0, 1.0];
        assert_eq!(local_maxima(x.view()), vec![1, 4]);
    }

    #[test]
    fn test_local_maxima_plateau_midpoint() {
        let x = array![0.0, 2.0, 2.0, 2.0, 0.0, 1.0, 1.0, 0.0];
        assert_eq!(local_maxima(x.view()), vec![2, 5]);
    }

    #[test]
    fn test_local_maxima_ignores_edges_and_open_plateaus() {
        let x = array![5.0, 1.0, 2.0, 2.0];
        assert!(local_maxima(x.view()).is_empty());
        assert!(local_maxima(array![1.0, 2.0].view()).is_empty());
    }

    #[test]
    fn test_distance_keeps_highest() {
        let x = array![0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.5, 0.0];
        let peaks = local_maxima(x.view());
        assert_eq!(peaks, vec![1, 3, 5, 9]);
        assert_eq!(select_by_distance(x.view(), &peaks, 3), vec![3, 9]);
        assert_eq!(select_by_distance(x.view(), &peaks, 1), peaks);
    }

    #[test]
    fn test_distance_tie_prefers_earlier_peak() {
        let x = array![0.0, 1.0, 0.0, 1.0, 0.0];
        assert_eq!(select_by_distance(x.view(), &[1, 3], 3), vec![1]);
    }

    #[test]
    fn test_prominences() {
        let x = array![0.0, 3.0, 1.0, 2.0, 0.5, 4.0, 0.0];
        let p = peak_prominences(x.view(), &[1, 3, 5]);
        assert_eq!(p, vec![2.5, 1.0, 4.0]);
    }

    #[test]
    fn test_minima_polarity_finds_troughs() {
        let fs = 100.0;
        let x = Array1::from_iter((0..400).map(|i| (2.0 * PI * i as f64 / fs).cos()));
        let events = detect_heel_strikes(x.view(), fs, &EventDetectorConfig::default()).unwrap();
        assert_eq!(events, vec![50, 150, 250, 350]);

        let maxima = EventDetectorConfig {
            polarity: Polarity::Maxima,
            ..Default::default()
        };
        let events = detect_heel_strikes(x.view(), fs, &maxima).unwrap();
        assert_eq!(events, vec![100, 200, 300]);
    }

    #[test]
    fn test_prominence_threshold_gates_small_dips() {
        // Troughs at 1 s and 3 s, plus a shallow notch on the crest at 2 s
        let fs = 100.0;
        let x = Array1::from_iter((0..400).map(|i| {
            let t = i as f64 / fs;
            let notch = (t - 2.0) / 0.05;
            (PI * t).cos() - 0.1 * (-0.5 * notch * notch).exp()
        }));

        let ungated = detect_heel_strikes(x.view(), fs, &EventDetectorConfig::default()).unwrap();
        assert_eq!(ungated, vec![100, 200, 300]);

        let gated = EventDetectorConfig {
            prominence_threshold: Some(0.2),
            ..Default::default()
        };
        let events = detect_heel_strikes(x.view(), fs, &gated).unwrap();
        assert_eq!(events, vec![100, 300]);
    }

    #[test]
    fn test_flat_signal_has_no_events() {
        let x = Array1::from_iter((0..200).map(|i| if i % 2 == 0 { 1e-15 } else { -1e-15 }));
        let events = detect_heel_strikes(x.view(), 100.0, &EventDetectorConfig::default()).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_events_respect_min_separation() {
        let fs = 50.0;
        let x = Array1::from_iter((0..500).map(|i| {
            let t = i as f64 / fs;
            (2.0 * PI * 3.0 * t).sin() + 0.3 * (2.0 * PI * 7.0 * t).sin()
        }));
        let config = EventDetectorConfig::default();
        let events = detect_heel_strikes(x.view(), fs, &config).unwrap();
        assert!(!events.is_empty());
        let distance = config.min_distance_samples(fs);
        for pair in events.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!(pair[1] - pair[0] >= distance);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let x = Array1::<f64>::zeros(10);
        let config = EventDetectorConfig {
            prominence_threshold: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            detect_heel_strikes(x.view(), 100.0, &config),
            Err(GaitError::InvalidConfig(_))
        ));
    }
}
