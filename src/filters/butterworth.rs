//! Digital Butterworth bandpass design.
//!
//! Analog prototype -> lowpass-to-bandpass transform -> bilinear transform,
//! with both band edges prewarped so the -3 dB points land exactly on the
//! requested cutoffs. The result is returned as second-order sections.

use std::f64::consts::PI;

use log::debug;
use num_complex::Complex64;

use super::{Biquad, Sos};
use crate::config::BandpassConfig;
use crate::error::{GaitError, Result};

/// Imaginary parts below this are treated as real poles
const REAL_POLE_TOLERANCE: f64 = 1e-12;

/// Design a zero/pole/gain Butterworth bandpass and split it into sections.
///
/// Every section gets one zero at z = +1 and one at z = -1, so the cascade
/// blocks DC and Nyquist. The overall gain sits in the first section.
pub fn design_bandpass(config: &BandpassConfig, sampling_rate_hz: f64) -> Result<Sos> {
    config.validate(sampling_rate_hz)?;

    let order = config.order;
    let fs2 = 2.0 * sampling_rate_hz;

    // Prewarp band edges to analog frequencies [rad/s]
    let w_low = fs2 * (PI * config.low_cutoff_hz / sampling_rate_hz).tan();
    let w_high = fs2 * (PI * config.high_cutoff_hz / sampling_rate_hz).tan();
    let bandwidth = w_high - w_low;
    let center_sq = w_low * w_high;

    // Each prototype pole p splits into the two roots of s² - p·bw·s + w0² = 0
    let mut analog_poles = Vec::with_capacity(2 * order);
    for p in prototype_poles(order) {
        let half = p * (bandwidth / 2.0);
        let disc = (half * half - center_sq).sqrt();
        analog_poles.push(half + disc);
        analog_poles.push(half - disc);
    }

    // Bilinear transform; N analog zeros at s = 0 map to z = +1 and the N
    // zeros at infinity to z = -1
    let fs2_c = Complex64::new(fs2, 0.0);
    let digital_poles: Vec<Complex64> = analog_poles
        .iter()
        .map(|&p| (fs2_c + p) / (fs2_c - p))
        .collect();
    let denominator = analog_poles
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, &p| acc * (fs2_c - p));
    let gain = ((bandwidth * fs2).powi(order as i32) / denominator).re;

    if let Some(p) = digital_poles.iter().find(|p| !(p.norm() < 1.0)) {
        return Err(GaitError::NumericalInstability(format!(
            "bandpass pole {p} is not inside the unit circle"
        )));
    }

    let mut sections = pair_poles(&digital_poles, order)?;
    for b in sections[0].b.iter_mut() {
        *b *= gain;
    }

    let finite = sections
        .iter()
        .all(|s| s.b.iter().chain(s.a.iter()).all(|c| c.is_finite()));
    if !finite || !gain.is_finite() || gain == 0.0 {
        return Err(GaitError::NumericalInstability(format!(
            "non-finite bandpass coefficients for {}-{} Hz at {} Hz",
            config.low_cutoff_hz, config.high_cutoff_hz, sampling_rate_hz
        )));
    }

    debug!(
        "butterworth bandpass: order {} [{:.3}, {:.3}] Hz at {:.3} Hz, gain {:.3e}",
        order, config.low_cutoff_hz, config.high_cutoff_hz, sampling_rate_hz, gain
    );

    Ok(Sos { sections })
}

/// Left-half-plane poles of the unit-cutoff analog Butterworth lowpass
fn prototype_poles(order: usize) -> Vec<Complex64> {
    let n = order as f64;
    (0..order)
        .map(|k| {
            let m = 2.0 * k as f64 - (n - 1.0);
            -Complex64::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect()
}

/// Group digital poles into conjugate pairs (or pairs of real poles)
fn pair_poles(poles: &[Complex64], order: usize) -> Result<Vec<Biquad>> {
    let mut sections = Vec::with_capacity(order);
    let mut real_poles = Vec::new();

    for p in poles {
        if p.im.abs() <= REAL_POLE_TOLERANCE {
            real_poles.push(p.re);
        } else if p.im > 0.0 {
            sections.push(section_from(-2.0 * p.re, p.norm_sqr()));
        }
    }

    if real_poles.len() % 2 != 0 {
        return Err(GaitError::NumericalInstability(format!(
            "cannot pair {} real poles into second-order sections",
            real_poles.len()
        )));
    }
    real_poles.sort_by(|a, b| a.total_cmp(b));
    for pair in real_poles.chunks(2) {
        sections.push(section_from(-(pair[0] + pair[1]), pair[0] * pair[1]));
    }

    if sections.len() != order {
        return Err(GaitError::NumericalInstability(format!(
            "expected {order} second-order sections, paired {}",
            sections.len()
        )));
    }
    Ok(sections)
}

fn section_from(a1: f64, a2: f64) -> Biquad {
    Biquad {
        b: [1.0, 0.0, -1.0],
        a: [1.0, a1, a2],
    }
}
