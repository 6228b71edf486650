//! Analysis parameters.
//!
//! Every field has a default, and a JSON config file may set any subset.
//! Validation happens before any signal is touched.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GaitError, Result};

/// Highest Butterworth order accepted for the bandpass prototype
pub const MAX_FILTER_ORDER: usize = 8;

/// Zero-phase Butterworth bandpass parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandpassConfig {
    /// Lower passband edge [Hz]
    pub low_cutoff_hz: f64,
    /// Upper passband edge [Hz]
    pub high_cutoff_hz: f64,
    /// Prototype order; the bandpass has twice as many poles
    pub order: usize,
}

impl Default for BandpassConfig {
    fn default() -> Self {
        Self {
            low_cutoff_hz: 0.5,
            high_cutoff_hz: 5.0,
            order: 3,
        }
    }
}

impl BandpassConfig {
    /// Require `0 < low < high < fs/2` and a supported order
    pub fn validate(&self, sampling_rate_hz: f64) -> Result<()> {
        validate_sampling_rate(sampling_rate_hz)?;

        if self.order == 0 || self.order > MAX_FILTER_ORDER {
            return Err(GaitError::InvalidConfig(format!(
                "filter order must be between 1 and {MAX_FILTER_ORDER}, got {}",
                self.order
            )));
        }

        let nyquist = sampling_rate_hz / 2.0;
        let (low, high) = (self.low_cutoff_hz, self.high_cutoff_hz);
        let ordered = low.is_finite() && high.is_finite() && 0.0 < low && low < high;
        if !ordered || high >= nyquist {
            return Err(GaitError::InvalidConfig(format!(
                "cutoffs must satisfy 0 < low < high < {nyquist} Hz (Nyquist), got low={low}, high={high}"
            )));
        }
        Ok(())
    }
}

/// Which extremum of the filtered signal marks a heel strike
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Local minima (the signal is negated before the peak search)
    #[default]
    Minima,
    /// Local maxima of the signal as-is
    Maxima,
}

/// Heel-strike peak search parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDetectorConfig {
    /// Minimum time between consecutive heel strikes [s].
    /// 0.5 s corresponds to a cadence ceiling of 2 steps per second.
    pub min_event_separation_s: f64,
    /// Minimum peak prominence in signal units; `None` disables the gate
    pub prominence_threshold: Option<f64>,
    pub polarity: Polarity,
}

impl Default for EventDetectorConfig {
    fn default() -> Self {
        Self {
            min_event_separation_s: 0.5,
            prominence_threshold: None,
            polarity: Polarity::Minima,
        }
    }
}

impl EventDetectorConfig {
    pub fn validate(&self, sampling_rate_hz: f64) -> Result<()> {
        validate_sampling_rate(sampling_rate_hz)?;

        if !self.min_event_separation_s.is_finite() || self.min_event_separation_s < 0.0 {
            return Err(GaitError::InvalidConfig(format!(
                "minimum event separation must be a non-negative number of seconds, got {}",
                self.min_event_separation_s
            )));
        }
        if let Some(threshold) = self.prominence_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(GaitError::InvalidConfig(format!(
                    "prominence threshold must be non-negative, got {threshold}"
                )));
            }
        }
        Ok(())
    }

    /// Minimum separation in whole samples, rounded up so that adjacent
    /// events are never closer than `min_event_separation_s`
    pub fn min_distance_samples(&self, sampling_rate_hz: f64) -> usize {
        let samples = (self.min_event_separation_s * sampling_rate_hz).ceil();
        (samples as usize).max(1)
    }
}

/// Complete pipeline configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub filter: BandpassConfig,
    pub events: EventDetectorConfig,
}

impl AnalysisConfig {
    /// Load a (possibly partial) JSON configuration; missing fields keep defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| GaitError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&text)
            .map_err(|e| GaitError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json_str(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self, sampling_rate_hz: f64) -> Result<()> {
        self.filter.validate(sampling_rate_hz)?;
        self.events.validate(sampling_rate_hz)
    }
}

fn validate_sampling_rate(sampling_rate_hz: f64) -> Result<()> {
    if !sampling_rate_hz.is_finite() || sampling_rate_hz <= 0.0 {
        return Err(GaitError::InvalidConfig(format!(
            "sampling rate must be positive, got {sampling_rate_hz}"
        )));
    }
    Ok(())
}
