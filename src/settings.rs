//! Tone-shaping knobs pushed from the settings panel into the engine.

use serde::{Deserialize, Serialize};

/// Resolution of the panel's range inputs.
pub const KNOB_STEP: f64 = 0.01;

/// The four panel knobs, each in [0, 1].
///
/// `reverb` is carried through the whole stack but no processing node reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneSettings {
    pub gain: f64,
    pub distortion: f64,
    pub tone: f64,
    pub reverb: f64,
}

impl Default for ToneSettings {
    fn default() -> Self {
        ToneSettings {
            gain: 0.6,
            distortion: 0.3,
            tone: 0.5,
            reverb: 0.2,
        }
    }
}

/// Clamp to [0, 1] and snap to the knob step. Non-finite input reads as 0.
pub fn quantize_knob(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let snapped = (value.clamp(0.0, 1.0) / KNOB_STEP).round() * KNOB_STEP;
    snapped.clamp(0.0, 1.0)
}

impl ToneSettings {
    /// Copy with every knob clamped and snapped to the panel resolution.
    pub fn clamped(self) -> Self {
        ToneSettings {
            gain: quantize_knob(self.gain),
            distortion: quantize_knob(self.distortion),
            tone: quantize_knob(self.tone),
            reverb: quantize_knob(self.reverb),
        }
    }

    /// Knob values as whole percentages, the way the panel labels them.
    pub fn percentages(&self) -> [u32; 4] {
        [self.gain, self.distortion, self.tone, self.reverb].map(|v| (v * 100.0).round() as u32)
    }
}
