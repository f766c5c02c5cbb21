//! Per-voice gain envelope.
//!
//! A plucked voice has no decay or sustain stage: the gain ramps linearly
//! from 0 to a fixed ceiling over the attack time, holds there while the
//! string is held, then glides toward silence with an exponential approach
//! whose time constant is the instrument's release.

use super::param::AudioParam;

/// Gain reached at the end of the attack ramp.
pub const PEAK_LEVEL: f64 = 0.7;

#[derive(Debug, Clone)]
pub struct Envelope {
    gain: AudioParam,
}

impl Envelope {
    /// Schedule the attack ramp starting at `now`.
    pub fn triggered(now: f64, attack: f64) -> Self {
        let mut gain = AudioParam::new(0.0);
        gain.set_value_at_time(0.0, now);
        gain.linear_ramp_to_value_at_time(PEAK_LEVEL, now + attack.max(0.0));
        Envelope { gain }
    }

    /// Cancel whatever is scheduled and glide toward zero with time constant `release`.
    pub fn release(&mut self, now: f64, release: f64) {
        self.gain.cancel_scheduled_values(now);
        self.gain.set_target_at_time(0.0, now, release);
    }

    pub fn level_at(&self, t: f64) -> f64 {
        self.gain.value_at(t)
    }

    pub fn compact(&mut self, now: f64) {
        self.gain.compact(now);
    }
}
