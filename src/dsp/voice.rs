//! Voice — one sounding note: oscillator + detune automation + gain envelope.
//!
//! A voice is created on gesture-down and keeps producing sound until the
//! render clock passes its stop time. Releasing only schedules the envelope
//! glide and the stop time; the engine removes the voice once it is finished.

use super::envelope::Envelope;
use super::oscillator::{Oscillator, Waveform};
use super::param::AudioParam;

/// Stable identifier of a physical voice inside the engine.
pub type VoiceId = u64;

#[derive(Debug, Clone)]
pub struct Voice {
    pub id: VoiceId,
    oscillator: Oscillator,
    /// Pitch offset in cents.
    detune: AudioParam,
    envelope: Envelope,
    base_frequency: f64,
    /// Time at which the source halts for good.
    stop_at: Option<f64>,
}

impl Voice {
    /// Start a voice at `now`, ramping its gain up over `attack` seconds.
    pub fn start(
        id: VoiceId,
        waveform: Waveform,
        frequency: f64,
        attack: f64,
        now: f64,
        sample_rate: f64,
    ) -> Self {
        Voice {
            id,
            oscillator: Oscillator::new(waveform, frequency, sample_rate),
            detune: AudioParam::new(0.0),
            envelope: Envelope::triggered(now, attack),
            base_frequency: frequency,
            stop_at: None,
        }
    }

    /// Glide the detune toward `cents` with time constant `tau`.
    pub fn bend_to(&mut self, cents: f64, now: f64, tau: f64) {
        self.detune.set_target_at_time(cents, now, tau);
    }

    /// Begin the release glide and schedule the source to halt at `stop_at`.
    ///
    /// Repeated calls keep the earliest stop time.
    pub fn release(&mut self, now: f64, release: f64, stop_at: f64) {
        self.envelope.release(now, release);
        self.stop_at = Some(match self.stop_at {
            Some(existing) => existing.min(stop_at),
            None => stop_at,
        });
    }

    /// Generate the sample at render time `t`.
    pub fn next_sample(&mut self, t: f64) -> f64 {
        if self.is_finished(t) {
            return 0.0;
        }
        self.oscillator.detune = self.detune.value_at(t);
        let osc = self.oscillator.next_sample();
        osc * self.envelope.level_at(t)
    }

    /// Has the source halted by time `t`?
    pub fn is_finished(&self, t: f64) -> bool {
        self.stop_at.is_some_and(|stop| t >= stop)
    }

    pub fn compact(&mut self, now: f64) {
        self.detune.compact(now);
        self.envelope.compact(now);
    }

    pub fn base_frequency(&self) -> f64 {
        self.base_frequency
    }

    pub fn stop_at(&self) -> Option<f64> {
        self.stop_at
    }

    /// Detune the voice is gliding toward, in cents.
    pub fn detune_target(&self) -> f64 {
        self.detune.target()
    }

    pub fn detune_at(&self, t: f64) -> f64 {
        self.detune.value_at(t)
    }
}
