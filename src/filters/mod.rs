pub mod butterworth;
pub mod zero_phase;

use std::f64::consts::PI;

use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;

use crate::config::BandpassConfig;
use crate::error::Result;

pub use butterworth::design_bandpass;
pub use zero_phase::filtfilt;

/// One second-order IIR section, `a[0]` normalised to 1
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    /// Gain for a constant input
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Transposed direct-form II state that a unit step settles into
    pub fn steady_state(&self) -> [f64; 2] {
        let y = self.dc_gain();
        let [_, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        [b1 + b2 - (a1 + a2) * y, b2 - a2 * y]
    }

    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = self.b[0] + z_inv * self.b[1] + z_inv2 * self.b[2];
        let den = self.a[0] + z_inv * self.a[1] + z_inv2 * self.a[2];
        num / den
    }
}

/// Cascade of second-order sections
#[derive(Clone, Debug, PartialEq)]
pub struct Sos {
    pub sections: Vec<Biquad>,
}

impl Sos {
    /// Number of poles across all sections
    pub fn order(&self) -> usize {
        2 * self.sections.len()
    }

    /// Edge padding a forward-backward pass needs: three times the tap count
    pub fn padlen(&self) -> usize {
        3 * (self.order() + 1)
    }

    /// Magnitude response at `freq_hz`
    pub fn gain_at(&self, freq_hz: f64, sampling_rate_hz: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / sampling_rate_hz;
        let z_inv = Complex64::from_polar(1.0, -omega);
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(z_inv))
            .norm()
    }

    /// Initial section states for a unit step, chained through each section's DC gain
    pub fn steady_state(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|section| {
                let [z0, z1] = section.steady_state();
                let zi = [scale * z0, scale * z1];
                scale *= section.dc_gain();
                zi
            })
            .collect()
    }
}

/// Zero-phase Butterworth bandpass of `signal`
pub fn bandpass(
    signal: ArrayView1<'_, f64>,
    sampling_rate_hz: f64,
    config: &BandpassConfig,
) -> Result<Array1<f64>> {
    let sos = design_bandpass(config, sampling_rate_hz)?;
    filtfilt(&sos, signal)
}
