//! Forward-backward (zero-phase) application of a section cascade.
//!
//! The signal is extended at both ends by point reflection (odd extension),
//! the filter runs forward from steady state, then backward over the
//! reversed output. Phase shifts of the two passes cancel, so heel-strike
//! timing in the output matches the input.

use log::debug;
use ndarray::{s, Array1, ArrayView1};

use super::Sos;
use crate::error::{GaitError, Result};

/// Zero-phase filtering of `signal` through `sos`.
///
/// Fails with `NumericalInstability` if the signal is not longer than the
/// edge padding the cascade needs, or if the output is not finite.
pub fn filtfilt(sos: &Sos, signal: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
    let len = signal.len();
    let padlen = sos.padlen();
    if len <= padlen {
        return Err(GaitError::NumericalInstability(format!(
            "signal of {len} samples is too short for a zero-phase order-{} filter (needs more than {padlen})",
            sos.order()
        )));
    }

    let extended = odd_extend(signal, padlen);
    let zi = sos.steady_state();

    let forward = run_cascade(sos, &zi, extended.iter().copied(), extended[0]);
    let last = forward[forward.len() - 1];
    let mut backward = run_cascade(sos, &zi, forward.iter().rev().copied(), last);
    backward.reverse();

    let output = Array1::from(backward).slice(s![padlen..padlen + len]).to_owned();
    if let Some(idx) = output.iter().position(|v| !v.is_finite()) {
        return Err(GaitError::NumericalInstability(format!(
            "filter output is not finite at sample {idx}"
        )));
    }

    debug!("zero-phase filtered {} samples (padding {})", len, padlen);
    Ok(output)
}

/// Point-reflect `n` samples about each end: `2·x[0] - x[n..1]` and `2·x[-1] - x[-2..-n-1]`
pub fn odd_extend(signal: ArrayView1<'_, f64>, n: usize) -> Array1<f64> {
    let len = signal.len();
    let first = signal[0];
    let last = signal[len - 1];

    let mut out = Vec::with_capacity(len + 2 * n);
    out.extend((1..=n).rev().map(|i| 2.0 * first - signal[i]));
    out.extend(signal.iter().copied());
    out.extend((len - 1 - n..len - 1).rev().map(|i| 2.0 * last - signal[i]));
    Array1::from(out)
}

/// Run the cascade over `input` with states initialised to `zi · x0`
fn run_cascade(
    sos: &Sos,
    zi: &[[f64; 2]],
    input: impl Iterator<Item = f64>,
    x0: f64,
) -> Vec<f64> {
    let mut state: Vec<[f64; 2]> = zi.iter().map(|z| [z[0] * x0, z[1] * x0]).collect();

    input
        .map(|sample| {
            let mut x = sample;
            for (section, z) in sos.sections.iter().zip(state.iter_mut()) {
                let y = section.b[0] * x + z[0];
                z[0] = section.b[1] * x - section.a[1] * y + z[1];
                z[1] = section.b[2] * x - section.a[2] * y;
                x = y;
            }
            x
        })
        .collect()
}
