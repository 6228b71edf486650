use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{GaitError, Result};
use crate::magnitude;

/// Number of acceleration axes per sample (x, y, z)
pub const AXES: usize = 3;

/// A loaded 3-axis accelerometer recording.
///
/// Rows are samples, columns are the x, y and z axes. Construction validates
/// the shape and sampling rate, so every trace that exists is non-empty,
/// finite and has exactly three axes.
#[derive(Clone, Debug, PartialEq)]
pub struct AccelerationTrace {
    samples: Array2<f64>,
    sampling_rate_hz: f64,
}

impl AccelerationTrace {
    /// Build a trace from an `(n, 3)` sample matrix
    pub fn new(samples: Array2<f64>, sampling_rate_hz: f64) -> Result<Self> {
        magnitude::validate_samples(samples.view())?;
        if !sampling_rate_hz.is_finite() || sampling_rate_hz <= 0.0 {
            return Err(GaitError::InvalidInput(format!(
                "sampling rate must be a positive number of Hz, got {sampling_rate_hz}"
            )));
        }
        Ok(Self {
            samples,
            sampling_rate_hz,
        })
    }

    /// Build a trace from three separate axis sequences
    pub fn from_axes(x: &[f64], y: &[f64], z: &[f64], sampling_rate_hz: f64) -> Result<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(GaitError::InvalidInput(format!(
                "axis length mismatch: x={}, y={}, z={}",
                x.len(),
                y.len(),
                z.len()
            )));
        }

        let mut samples = Array2::<f64>::zeros((x.len(), AXES));
        for (i, mut row) in samples.rows_mut().into_iter().enumerate() {
            row[0] = x[i];
            row[1] = y[i];
            row[2] = z[i];
        }
        Self::new(samples, sampling_rate_hz)
    }

    pub fn samples(&self) -> ArrayView2<'_, f64> {
        self.samples.view()
    }

    pub fn axis(&self, index: usize) -> ArrayView1<'_, f64> {
        self.samples.column(index)
    }

    pub fn sampling_rate_hz(&self) -> f64 {
        self.sampling_rate_hz
    }

    /// Number of samples (always >= 1)
    pub fn len(&self) -> usize {
        self.samples.nrows()
    }

    /// Construction rejects empty traces, so this is false for any built trace
    pub fn is_empty(&self) -> bool {
        self.samples.nrows() == 0
    }

    /// Recording length in seconds
    pub fn duration_s(&self) -> f64 {
        self.len() as f64 / self.sampling_rate_hz
    }
}

/// Stride statistics for a trial with at least two heel strikes
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrideStats {
    /// Mean stride time [s]
    pub mean_stride_time: f64,
    /// Population standard deviation of stride time [s]
    pub std_stride_time: f64,
    /// 1 / mean stride time [Hz]
    pub step_frequency: f64,
}

impl StrideStats {
    /// Step frequency expressed per minute
    pub fn cadence_steps_per_min(&self) -> f64 {
        self.step_frequency * 60.0
    }

    /// Stride-time variability as a percentage of the mean
    pub fn coefficient_of_variation(&self) -> f64 {
        100.0 * self.std_stride_time / self.mean_stride_time
    }
}

/// Stride features of a trial.
///
/// `Unavailable` is a normal outcome (fewer than two heel strikes), not an
/// error. All three statistics are present together or absent together.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StrideFeatures {
    Unavailable { detected_events: usize },
    Available(StrideStats),
}

impl StrideFeatures {
    pub fn is_available(&self) -> bool {
        matches!(self, StrideFeatures::Available(_))
    }

    pub fn stats(&self) -> Option<&StrideStats> {
        match self {
            StrideFeatures::Available(stats) => Some(stats),
            StrideFeatures::Unavailable { .. } => None,
        }
    }

    pub fn mean_stride_time(&self) -> Option<f64> {
        self.stats().map(|s| s.mean_stride_time)
    }

    pub fn std_stride_time(&self) -> Option<f64> {
        self.stats().map(|s| s.std_stride_time)
    }

    pub fn step_frequency(&self) -> Option<f64> {
        self.stats().map(|s| s.step_frequency)
    }
}

/// Everything one pipeline run produces
#[derive(Clone, Debug, PartialEq)]
pub struct GaitAnalysis {
    pub features: StrideFeatures,
    /// Seconds between consecutive heel strikes
    pub stride_times: Array1<f64>,
    /// Band-limited magnitude signal the events were detected on
    pub filtered: Array1<f64>,
    /// Heel-strike sample indices, strictly increasing
    pub events: Vec<usize>,
    pub sampling_rate_hz: f64,
}

impl GaitAnalysis {
    /// Heel-strike instants in seconds from the start of the recording
    pub fn event_times(&self) -> Vec<f64> {
        self.events
            .iter()
            .map(|&idx| idx as f64 / self.sampling_rate_hz)
            .collect()
    }

    pub fn duration_s(&self) -> f64 {
        self.filtered.len() as f64 / self.sampling_rate_hz
    }
}
