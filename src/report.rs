//! Human and machine readable summaries of one analysis run.

use chrono::Utc;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::types::{AccelerationTrace, GaitAnalysis, StrideFeatures};

/// Stride summary as reported; the derived cadence and CV ride along
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StrideSummary {
    Available {
        mean_stride_time_s: f64,
        std_stride_time_s: f64,
        step_frequency_hz: f64,
        cadence_steps_per_min: f64,
        coefficient_of_variation_pct: f64,
    },
    InsufficientEvents {
        detected_events: usize,
    },
}

impl From<&StrideFeatures> for StrideSummary {
    fn from(features: &StrideFeatures) -> Self {
        match features {
            StrideFeatures::Available(stats) => StrideSummary::Available {
                mean_stride_time_s: stats.mean_stride_time,
                std_stride_time_s: stats.std_stride_time,
                step_frequency_hz: stats.step_frequency,
                cadence_steps_per_min: stats.cadence_steps_per_min(),
                coefficient_of_variation_pct: stats.coefficient_of_variation(),
            },
            StrideFeatures::Unavailable { detected_events } => StrideSummary::InsufficientEvents {
                detected_events: *detected_events,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GaitReport {
    pub record: String,
    /// RFC 3339 UTC time the report was built
    pub generated_at: String,
    pub samples: usize,
    pub sampling_rate_hz: f64,
    pub duration_s: f64,
    pub event_count: usize,
    pub event_times_s: Vec<f64>,
    pub stride_times_s: Vec<f64>,
    pub strides: StrideSummary,
    pub config: AnalysisConfig,
}

impl GaitReport {
    pub fn new(
        record: impl Into<String>,
        trace: &AccelerationTrace,
        analysis: &GaitAnalysis,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            record: record.into(),
            generated_at: Utc::now().to_rfc3339(),
            samples: trace.len(),
            sampling_rate_hz: trace.sampling_rate_hz(),
            duration_s: trace.duration_s(),
            event_count: analysis.events.len(),
            event_times_s: analysis.event_times(),
            stride_times_s: analysis.stride_times.to_vec(),
            strides: StrideSummary::from(&analysis.features),
            config: config.clone(),
        }
    }

    /// Plain-text summary; `list_events` appends every heel-strike time
    pub fn render_text(&self, list_events: bool) -> String {
        let mut lines = vec![
            format!("Record: {}", self.record),
            format!(
                "Samples: {} at {:.2} Hz ({:.1} s)",
                self.samples, self.sampling_rate_hz, self.duration_s
            ),
            format!("Heel strikes: {}", self.event_count),
        ];

        match &self.strides {
            StrideSummary::Available {
                mean_stride_time_s,
                std_stride_time_s,
                step_frequency_hz,
                cadence_steps_per_min,
                coefficient_of_variation_pct,
            } => {
                lines.push(format!("Mean Stride Time: {mean_stride_time_s:.2}s"));
                lines.push(format!("Stride Time Variability (SD): {std_stride_time_s:.2}s"));
                lines.push(format!("Step Frequency: {step_frequency_hz:.2} Hz"));
                lines.push(format!("Cadence: {cadence_steps_per_min:.1} steps/min"));
                lines.push(format!("Stride Time CV: {coefficient_of_variation_pct:.1}%"));
            }
            StrideSummary::InsufficientEvents { detected_events } => {
                lines.push(format!(
                    "Stride features unavailable: {detected_events} heel strike(s) detected, need at least 2"
                ));
            }
        }

        if list_events {
            lines.push("Heel strike times (s):".to_string());
            lines.extend(self.event_times_s.iter().map(|t| format!("  {t:.3}")));
        }

        lines.join("\n")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
