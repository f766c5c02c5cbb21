//! Biquad lowpass — matches WebAudio BiquadFilterNode coefficients.
//!
//! The cutoff is an `AudioParam` so it can glide between targets; the
//! coefficients are only recomputed when the evaluated cutoff actually moves.

use std::f64::consts::PI;

use super::param::AudioParam;

/// WebAudio's default `BiquadFilterNode.frequency`.
pub const DEFAULT_CUTOFF: f64 = 350.0;

/// Butterworth Q.
const DEFAULT_Q: f64 = 0.707;

/// A second-order lowpass IIR filter.
///
/// Implements the standard Direct Form II Transposed structure.
/// Coefficient formulas from the Audio EQ Cookbook (Robert Bristow-Johnson).
#[derive(Debug, Clone)]
pub struct LowpassFilter {
    pub cutoff: AudioParam,
    q: f64,

    // Coefficients
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    // State (Direct Form II Transposed)
    z1: f64,
    z2: f64,

    sample_rate: f64,
    /// Cutoff the current coefficients were computed for.
    applied: f64,
}

impl LowpassFilter {
    pub fn new(sample_rate: f64) -> Self {
        let mut f = LowpassFilter {
            cutoff: AudioParam::new(DEFAULT_CUTOFF),
            q: DEFAULT_Q,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
            sample_rate,
            applied: f64::NAN,
        };
        f.update_coefficients(DEFAULT_CUTOFF);
        f
    }

    /// Recompute filter coefficients for `frequency`.
    fn update_coefficients(&mut self, frequency: f64) {
        // Keep the cutoff strictly inside (0, nyquist).
        let nyquist = self.sample_rate / 2.0;
        let frequency = frequency.clamp(1.0, nyquist * 0.999);
        let w0 = 2.0 * PI * frequency / self.sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * self.q);

        let b1 = 1.0 - cos_w0;
        let b0 = b1 / 2.0;
        let b2 = b0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        // Normalize by a0
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
        self.applied = frequency;
    }

    /// Process a single sample at render time `t`.
    pub fn process(&mut self, input: f64, t: f64) -> f64 {
        let frequency = self.cutoff.value_at(t);
        if (frequency - self.applied).abs() > 1e-3 {
            self.update_coefficients(frequency);
        }

        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }
}
