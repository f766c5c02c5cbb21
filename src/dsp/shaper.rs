//! Distortion / Waveshaping
//!
//! The shared chain's first stage. A waveshaper maps each input sample
//! through a transfer curve stored as a lookup table, exactly like a
//! WebAudio `WaveShaperNode`:
//!
//! ```text
//!   v = (len - 1) / 2 * (x + 1)      position of x in the table
//!   y = lerp(curve[floor(v)], curve[floor(v) + 1], frac(v))
//! ```
//!
//! Inputs outside [-1, 1] clamp to the first / last table entry. With no
//! curve loaded the stage passes samples through untouched.
//!
//! An even-length table has no entry at x = 0: silence lands half-way
//! between the two middle entries, so the 44100-point drive curve turns an
//! input of 0 into a DC offset of about -1.6e-7. WebAudio behaves the same.
//!
//! # The drive curve
//!
//! `make_distortion_curve(amount)` builds the classic soft-saturation table
//!
//! ```text
//!   k = amount * 100
//!   f(x) = (3 + k) * x * 20° / (π + k * |x|)      (20° in radians)
//! ```
//!
//! over 44100 points. At `amount = 0` the curve is a plain gain of 1/3; as
//! `amount` grows the slope near zero steepens and the edges flatten.

use std::f64::consts::PI;
use std::sync::Arc;

use super::param::AudioParam;

/// Number of points in a generated drive curve.
pub const CURVE_SAMPLES: usize = 44_100;

/// Soft-saturation transfer table for a drive `amount` in [0, 1].
///
/// Pure and deterministic: the same amount always yields the same table.
pub fn make_distortion_curve(amount: f64) -> Vec<f32> {
    let k = amount * 100.0;
    let deg = PI / 180.0;
    let n = CURVE_SAMPLES as f64;
    (0..CURVE_SAMPLES)
        .map(|i| {
            let x = (i as f64 * 2.0) / n - 1.0;
            (((3.0 + k) * x * 20.0 * deg) / (PI + k * x.abs())) as f32
        })
        .collect()
}

fn lookup(curve: Option<&[f32]>, input: f64) -> f64 {
    let Some(curve) = curve else {
        return input;
    };
    let last = curve.len() - 1;
    let v = last as f64 * 0.5 * (input + 1.0);
    if v <= 0.0 {
        return curve[0] as f64;
    }
    if v >= last as f64 {
        return curve[last] as f64;
    }
    let idx = v.floor() as usize;
    let frac = v - idx as f64;
    let a = curve[idx] as f64;
    let b = curve[idx + 1] as f64;
    a + (b - a) * frac
}

fn into_curve(table: Vec<f32>) -> Option<Arc<[f32]>> {
    if table.len() < 2 {
        None
    } else {
        Some(Arc::from(table))
    }
}

/// Waveshaper stage.
///
/// The first curve loads immediately, so the stage never passes summed
/// voices through unshaped once a drive setting exists. Later curve
/// changes crossfade from whatever the stage is producing at that moment,
/// including a crossfade still in progress.
#[derive(Debug, Clone)]
pub struct WaveShaper {
    curve: Option<Arc<[f32]>>,
    outgoing: Option<Arc<[f32]>>,
    /// Weight of `curve` against `outgoing`, 0 → 1.
    blend: AudioParam,
}

impl Default for WaveShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveShaper {
    pub fn new() -> Self {
        WaveShaper {
            curve: None,
            outgoing: None,
            blend: AudioParam::new(1.0),
        }
    }

    /// Swap in a new transfer table immediately.
    pub fn set_curve(&mut self, table: Vec<f32>) {
        self.curve = into_curve(table);
        self.outgoing = None;
        self.blend = AudioParam::new(1.0);
    }

    /// Crossfade to a new transfer table starting at `now` with time constant `tau`.
    ///
    /// With no curve loaded yet the table is applied at once.
    pub fn glide_to_curve(&mut self, table: Vec<f32>, now: f64, tau: f64) {
        let (current, next) = match (self.curve.clone(), into_curve(table)) {
            (Some(current), Some(next)) => (current, next),
            (_, next) => {
                self.curve = next;
                self.outgoing = None;
                self.blend = AudioParam::new(1.0);
                return;
            }
        };

        let from = match self.outgoing.take() {
            Some(old) => {
                let w = self.blend.value_at(now);
                if w >= 0.999 {
                    current
                } else if old.len() == current.len() {
                    // Freeze the in-flight mix as the new starting table.
                    let w = w as f32;
                    old.iter()
                        .zip(current.iter())
                        .map(|(a, b)| a + (b - a) * w)
                        .collect::<Vec<f32>>()
                        .into()
                } else if w < 0.5 {
                    old
                } else {
                    current
                }
            }
            None => current,
        };

        self.curve = Some(next);
        self.outgoing = Some(from);
        self.blend = AudioParam::new(0.0);
        self.blend.set_target_at_time(1.0, now, tau);
    }

    pub fn curve(&self) -> Option<&[f32]> {
        self.curve.as_deref()
    }

    pub fn is_blending(&self) -> bool {
        self.outgoing.is_some()
    }

    /// Shape a single sample at render time `t`.
    #[inline]
    pub fn process(&self, input: f64, t: f64) -> f64 {
        let shaped = lookup(self.curve.as_deref(), input);
        match self.outgoing.as_deref() {
            Some(old) => {
                let w = self.blend.value_at(t);
                lookup(Some(old), input) * (1.0 - w) + shaped * w
            }
            None => shaped,
        }
    }

    /// Retire the outgoing table once the crossfade has effectively finished.
    pub fn compact(&mut self, now: f64) {
        self.blend.compact(now);
        if self.outgoing.is_some() && self.blend.value_at(now) >= 0.999 {
            self.outgoing = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_is_deterministic() {
        let a = make_distortion_curve(0.42);
        let b = make_distortion_curve(0.42);
        assert_eq!(a.len(), CURVE_SAMPLES);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_amount_is_mild_linear_curve() {
        let curve = make_distortion_curve(0.0);
        let n = CURVE_SAMPLES as f64;
        let deg = PI / 180.0;
        for i in [0, 1, 11_025, 22_050, 33_075, CURVE_SAMPLES - 1] {
            let x = (i as f64 * 2.0) / n - 1.0;
            let expected = ((3.0 * x * 20.0 * deg) / PI) as f32;
            assert_eq!(curve[i], expected, "mismatch at index {i}");
        }
        // k = 0 leaves a straight line of slope 1/3.
        assert!((curve[0] + 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(curve[22_050], 0.0);
    }

    #[test]
    fn more_drive_steepens_the_curve() {
        let soft = make_distortion_curve(0.1);
        let hard = make_distortion_curve(1.0);
        // Slope near zero grows with drive.
        let idx = 22_050 + 100;
        assert!(hard[idx] > soft[idx]);
        assert!(hard.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn passthrough_without_curve() {
        let shaper = WaveShaper::new();
        assert_eq!(shaper.process(0.3, 0.0), 0.3);
        assert_eq!(shaper.process(-2.0, 0.0), -2.0);
    }

    #[test]
    fn lookup_interpolates_and_clamps() {
        let mut shaper = WaveShaper::new();
        shaper.set_curve(vec![-1.0, 0.0, 0.5]);
        assert!((shaper.process(0.0, 0.0) - 0.0).abs() < 1e-12);
        assert!((shaper.process(0.5, 0.0) - 0.25).abs() < 1e-12);
        assert_eq!(shaper.process(4.0, 0.0), 0.5);
        assert_eq!(shaper.process(-4.0, 0.0), -1.0);
    }

    #[test]
    fn first_glide_loads_without_passthrough() {
        let mut shaper = WaveShaper::new();
        shaper.glide_to_curve(vec![-1.0, 0.0, 1.0], 0.0, 0.05);
        assert!(!shaper.is_blending());
        // Clamped by the curve from the very first sample.
        assert_eq!(shaper.process(2.0, 0.0), 1.0);
    }

    #[test]
    fn glide_crossfades_then_retires_old_curve() {
        let mut shaper = WaveShaper::new();
        shaper.set_curve(vec![-1.0, 0.0, 1.0]);
        shaper.glide_to_curve(vec![-0.5, 0.0, 0.5], 0.0, 0.05);
        assert!((shaper.process(2.0, 0.0) - 1.0).abs() < 1e-12);
        let mid = shaper.process(2.0, 0.05);
        let expected = 1.0 - 0.5 * (1.0 - (-1.0_f64).exp());
        assert!((mid - expected).abs() < 1e-9);

        shaper.compact(0.1);
        assert!(shaper.is_blending());
        shaper.compact(1.0);
        assert!(!shaper.is_blending());
        assert_eq!(shaper.process(2.0, 1.0), 0.5);
    }

    #[test]
    fn retarget_mid_fade_continues_from_current_output() {
        let mut shaper = WaveShaper::new();
        shaper.set_curve(vec![-1.0, 0.0, 1.0]);
        shaper.glide_to_curve(vec![-0.5, 0.0, 0.5], 0.0, 0.05);
        let before = shaper.process(2.0, 0.03);
        shaper.glide_to_curve(vec![-0.1, 0.0, 0.1], 0.03, 0.05);
        let after = shaper.process(2.0, 0.03);
        assert!((before - after).abs() < 1e-6, "{before} vs {after}");
        assert!(shaper.process(2.0, 0.5) < 0.11);
    }

    #[test]
    fn silence_maps_near_zero_through_drive_curve() {
        let mut shaper = WaveShaper::new();
        shaper.set_curve(make_distortion_curve(1.0));
        let out = shaper.process(0.0, 0.0);
        assert!(out.abs() < 1e-6, "got {out}");
    }
}
