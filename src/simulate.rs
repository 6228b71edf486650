//! Deterministic synthetic walking traces.
//!
//! Each gait cycle is one period of a vertical oscillation around 1 g with
//! its trough (the heel strike) at mid-cycle, a lateral sway at half the
//! stride frequency and a small high-frequency vibration term standing in
//! for sensor noise. No randomness: the same parameters always give the
//! same trace.

use std::f64::consts::PI;

use ndarray::Array2;

use crate::error::Result;
use crate::types::{AccelerationTrace, AXES};

/// Shape of a generated walk
#[derive(Clone, Debug, PartialEq)]
pub struct WalkParams {
    pub cycles: usize,
    /// Nominal stride time [s]
    pub stride_time_s: f64,
    /// Stride times alternate between `stride + jitter` and `stride - jitter` [s]
    pub stride_jitter_s: f64,
    pub sampling_rate_hz: f64,
    /// Peak vertical oscillation around 1 g [g]
    pub vertical_amplitude_g: f64,
    /// Peak lateral sway [g]
    pub sway_amplitude_g: f64,
    /// Amplitude of the 17 Hz vibration term [g]
    pub vibration_g: f64,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            cycles: 5,
            stride_time_s: 1.0,
            stride_jitter_s: 0.0,
            sampling_rate_hz: 100.0,
            vertical_amplitude_g: 0.5,
            sway_amplitude_g: 0.1,
            vibration_g: 0.0,
        }
    }
}

impl WalkParams {
    /// Duration of cycle `k` [s]
    pub fn cycle_duration(&self, k: usize) -> f64 {
        if k % 2 == 0 {
            self.stride_time_s + self.stride_jitter_s
        } else {
            self.stride_time_s - self.stride_jitter_s
        }
    }

    /// Heel-strike instants the generator places, one per cycle [s]
    pub fn heel_strike_times(&self) -> Vec<f64> {
        let mut start = 0.0;
        (0..self.cycles)
            .map(|k| {
                let duration = self.cycle_duration(k);
                let strike = start + duration / 2.0;
                start += duration;
                strike
            })
            .collect()
    }
}

/// Generate a walk as an acceleration trace in g
pub fn synthetic_walk(params: &WalkParams) -> Result<AccelerationTrace> {
    let fs = params.sampling_rate_hz;

    let mut boundaries = Vec::with_capacity(params.cycles + 1);
    let mut t = 0.0;
    boundaries.push(t);
    for k in 0..params.cycles {
        t += params.cycle_duration(k);
        boundaries.push(t);
    }
    let total_s = t;
    let n = (total_s * fs).round() as usize;

    let mut samples = Array2::<f64>::zeros((n, AXES));
    let mut cycle = 0;
    for (i, mut row) in samples.rows_mut().into_iter().enumerate() {
        let t = i as f64 / fs;
        while cycle + 1 < params.cycles && t >= boundaries[cycle + 1] {
            cycle += 1;
        }
        let start = boundaries[cycle];
        let phase = (t - start) / (boundaries[cycle + 1] - start);
        let stride_angle = 2.0 * PI * phase;
        // Sway completes one period every two cycles
        let sway_angle = PI * (cycle as f64 + phase);
        let vibration = params.vibration_g * (2.0 * PI * 17.0 * t).sin();

        row[0] = params.sway_amplitude_g * sway_angle.sin() + vibration;
        row[1] = 0.5 * params.sway_amplitude_g * stride_angle.sin();
        row[2] = 1.0 + params.vertical_amplitude_g * stride_angle.cos() + vibration;
    }

    AccelerationTrace::new(samples, fs)
}
