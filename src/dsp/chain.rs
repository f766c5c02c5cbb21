//! Shared processing chain — distortion → lowpass → master gain.
//!
//! Every voice's enveloped output is summed into the chain input. The chain
//! is built once when the engine initializes and lives as long as the engine.

use super::filter::LowpassFilter;
use super::param::AudioParam;
use super::shaper::WaveShaper;

#[derive(Debug, Clone)]
pub struct ProcessingChain {
    pub shaper: WaveShaper,
    pub filter: LowpassFilter,
    pub master_gain: AudioParam,
}

impl ProcessingChain {
    pub fn new(sample_rate: f64) -> Self {
        ProcessingChain {
            shaper: WaveShaper::new(),
            filter: LowpassFilter::new(sample_rate),
            master_gain: AudioParam::new(1.0),
        }
    }

    /// Run one summed voice sample through the chain at render time `t`.
    pub fn process(&mut self, input: f64, t: f64) -> f64 {
        let shaped = self.shaper.process(input, t);
        let filtered = self.filter.process(shaped, t);
        filtered * self.master_gain.value_at(t)
    }

    /// Drop automation that can no longer affect output at or after `now`.
    pub fn compact(&mut self, now: f64) {
        self.shaper.compact(now);
        self.filter.cutoff.compact(now);
        self.master_gain.compact(now);
    }
}
