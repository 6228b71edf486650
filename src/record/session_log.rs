//! Motion tracker session logs: `{"readings": [...]}` as JSON, optionally
//! gzipped. Each reading may carry an accelerometer sample; readings without
//! one (GPS-only, gyro-only) are skipped.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flate2::read::GzDecoder;
use log::{debug, warn};
use serde::Deserialize;

use crate::error::{GaitError, Result};
use crate::types::AccelerationTrace;

#[derive(Deserialize)]
struct AccelSample {
    timestamp: f64,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Deserialize)]
struct Reading {
    #[serde(default)]
    accel: Option<AccelSample>,
}

#[derive(Deserialize)]
struct SessionLog {
    readings: Vec<Reading>,
}

/// True for `*.json` and `*.json.gz`
pub fn is_session_log(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.ends_with(".json") || name.ends_with(".json.gz")
}

fn read_log(path: &Path) -> Result<SessionLog> {
    let file = File::open(path).map_err(|e| GaitError::from_io(path, e))?;
    let parsed = if path.extension().map(|e| e == "gz").unwrap_or(false) {
        serde_json::from_reader(BufReader::new(GzDecoder::new(file)))
    } else {
        serde_json::from_reader(BufReader::new(file))
    };
    parsed.map_err(|e| GaitError::RecordFormat(format!("{}: {e}", path.display())))
}

/// Load the accelerometer stream of a session log.
///
/// The sampling rate is the mean rate over the accelerometer timestamps;
/// the samples are then treated as uniformly spaced.
pub fn read_session_log(path: &Path) -> Result<AccelerationTrace> {
    let log = read_log(path)?;
    let total = log.readings.len();
    let accel: Vec<AccelSample> = log.readings.into_iter().filter_map(|r| r.accel).collect();

    if accel.len() < 2 {
        return Err(GaitError::RecordFormat(format!(
            "{} has {} accelerometer readings, need at least 2",
            path.display(),
            accel.len()
        )));
    }
    if let Some(pos) = accel
        .windows(2)
        .position(|w| !(w[1].timestamp > w[0].timestamp))
    {
        return Err(GaitError::RecordFormat(format!(
            "{}: accelerometer timestamps not increasing at reading {}",
            path.display(),
            pos + 1
        )));
    }

    let first = accel[0].timestamp;
    let last = accel[accel.len() - 1].timestamp;
    let sampling_rate_hz = (accel.len() - 1) as f64 / (last - first);

    let mean_interval = 1.0 / sampling_rate_hz;
    let widest_gap = accel
        .windows(2)
        .map(|w| w[1].timestamp - w[0].timestamp)
        .fold(0.0, f64::max);
    if widest_gap > 2.0 * mean_interval {
        warn!(
            "{}: gaps up to {:.3} s against a mean interval of {:.3} s; treating samples as uniform at {:.2} Hz",
            path.display(),
            widest_gap,
            mean_interval,
            sampling_rate_hz
        );
    }

    debug!(
        "session log {}: {} of {} readings carry accelerometer data, {:.2} Hz",
        path.display(),
        accel.len(),
        total,
        sampling_rate_hz
    );

    let x: Vec<f64> = accel.iter().map(|a| a.x).collect();
    let y: Vec<f64> = accel.iter().map(|a| a.y).collect();
    let z: Vec<f64> = accel.iter().map(|a| a.z).collect();
    AccelerationTrace::from_axes(&x, &y, &z, sampling_rate_hz)
}
