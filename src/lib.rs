//! Gait analysis of wearable accelerometer recordings.
//!
//! Loads a 3-axis recording, band-limits its magnitude with a zero-phase
//! Butterworth filter, detects heel strikes and summarises stride timing.

pub mod config;
pub mod error;
pub mod events;
pub mod filters;
pub mod magnitude;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod simulate;
pub mod strides;
pub mod types;

pub use config::{AnalysisConfig, BandpassConfig, EventDetectorConfig, Polarity};
pub use error::{GaitError, Result};
pub use pipeline::{analyze, analyze_with_config};
pub use record::load;
pub use report::GaitReport;
pub use types::{AccelerationTrace, GaitAnalysis, StrideFeatures, StrideStats};
