//! Acceleration magnitude extraction.
//!
//! Reduces each (x, y, z) sample to its Euclidean norm, which makes the
//! downstream heel-strike search independent of how the sensor was worn.

use ndarray::{Array1, ArrayView2, Axis};

use crate::error::{GaitError, Result};
use crate::types::{AccelerationTrace, AXES};

/// Check that a sample matrix is a usable 3-axis recording
pub fn validate_samples(samples: ArrayView2<'_, f64>) -> Result<()> {
    let (rows, cols) = samples.dim();
    if rows == 0 {
        return Err(GaitError::InvalidInput(
            "acceleration trace has no samples".to_string(),
        ));
    }
    if cols != AXES {
        return Err(GaitError::InvalidInput(format!(
            "expected {AXES} acceleration axes, got {cols}"
        )));
    }
    if let Some((idx, _)) = samples
        .indexed_iter()
        .find(|(_, value)| !value.is_finite())
    {
        return Err(GaitError::InvalidInput(format!(
            "non-finite acceleration at sample {}, axis {}",
            idx.0, idx.1
        )));
    }
    Ok(())
}

/// Magnitude `sqrt(x² + y² + z²)` of every row of an `(n, 3)` sample matrix
pub fn compute(samples: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
    validate_samples(samples)?;
    Ok(norms(samples))
}

/// Magnitude of an already validated trace
pub fn of_trace(trace: &AccelerationTrace) -> Array1<f64> {
    norms(trace.samples())
}

fn norms(samples: ArrayView2<'_, f64>) -> Array1<f64> {
    samples.map_axis(Axis(1), |row| {
        let (x, y, z) = (row[0], row[1], row[2]);
        (x * x + y * y + z * z).sqrt()
    })
}
