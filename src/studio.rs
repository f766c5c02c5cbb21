//! Studio — the composition root.
//!
//! Owns the one `AudioEngine`, the string controllers for the active
//! instrument, and the queue of deferred `stop_note` calls. The UI layer holds
//! a `Studio` (directly, or through `WasmStudio`) and forwards its events here.

use std::sync::Arc;

use crate::engine::{AudioEngine, AudioHost, VoiceKey};
use crate::error::{ShellError, StudioError};
use crate::gesture::{GestureConfig, GestureOutcome, GestureState, PointerEvent, StringController};
use crate::instrument::{InstrumentProfile, InstrumentRegistry};
use crate::settings::ToneSettings;
use crate::timer::TimerQueue;

pub struct Studio {
    registry: InstrumentRegistry,
    engine: AudioEngine,
    active: Arc<InstrumentProfile>,
    settings: ToneSettings,
    gesture_config: GestureConfig,
    strings: Vec<StringController>,
    pending_stops: TimerQueue<VoiceKey>,
}

fn build_strings(profile: &InstrumentProfile, config: GestureConfig) -> Vec<StringController> {
    profile
        .notes
        .iter()
        .map(|slot| StringController::new(VoiceKey::for_string(&slot.note, slot.freq), slot.freq, config))
        .collect()
}

impl Studio {
    /// A studio on the registry's first instrument with default knobs.
    /// No audio output exists until `start`.
    pub fn new(registry: InstrumentRegistry) -> Self {
        Self::with_gesture_config(registry, GestureConfig::default())
    }

    pub fn with_gesture_config(registry: InstrumentRegistry, gesture_config: GestureConfig) -> Self {
        let active = registry.first().clone();
        let settings = ToneSettings::default();
        let mut engine = AudioEngine::new();
        engine.set_profile(active.clone());
        engine.update_settings(settings);
        Studio {
            strings: build_strings(&active, gesture_config),
            registry,
            engine,
            active,
            settings,
            gesture_config,
            pending_stops: TimerQueue::new(),
        }
    }

    /// Open the audio output. Called from the first user gesture.
    ///
    /// Returns whether sound is available; on `false` the studio keeps
    /// working silently and `start` may be called again.
    pub fn start(&mut self, host: &mut dyn AudioHost) -> bool {
        self.engine.initialize(host)
    }

    /// Switch instruments. Strings of the old instrument are torn down; any
    /// still held are released so nothing keeps sounding without a finger.
    pub fn select_instrument(&mut self, id: &str) -> Result<(), StudioError> {
        let profile = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| ShellError::UnknownInstrument { id: id.to_string() })?;

        for string in self.strings.iter_mut() {
            if matches!(string.state(), GestureState::Plucking { .. }) {
                self.engine.stop_note(string.key());
            }
            string.teardown();
        }

        self.strings = build_strings(&profile, self.gesture_config);
        self.engine.set_profile(profile.clone());
        self.engine.update_settings(self.settings);
        log::info!("instrument selected: {} ({} strings)", profile.name, self.strings.len());
        self.active = profile;
        Ok(())
    }

    /// Apply new knob values, clamped to the panel range.
    pub fn update_settings(&mut self, settings: ToneSettings) {
        self.settings = settings.clamped();
        self.engine.update_settings(self.settings);
    }

    pub fn pointer_down(&mut self, index: usize, event: PointerEvent) -> Result<GestureOutcome, StudioError> {
        let strings = self.strings.len();
        let string = self
            .strings
            .get_mut(index)
            .ok_or(ShellError::UnknownString { index, strings })?;
        Ok(string.pointer_down(event, &mut self.engine))
    }

    pub fn pointer_move(&mut self, index: usize, event: PointerEvent) -> Result<GestureOutcome, StudioError> {
        let strings = self.strings.len();
        let string = self
            .strings
            .get_mut(index)
            .ok_or(ShellError::UnknownString { index, strings })?;
        Ok(string.pointer_move(event, &mut self.engine))
    }

    pub fn pointer_up(&mut self, index: usize, event: PointerEvent) -> Result<GestureOutcome, StudioError> {
        let strings = self.strings.len();
        let string = self
            .strings
            .get_mut(index)
            .ok_or(ShellError::UnknownString { index, strings })?;
        Ok(string.pointer_up(event, &mut self.pending_stops))
    }

    pub fn pointer_cancel(&mut self, index: usize, event: PointerEvent) -> Result<GestureOutcome, StudioError> {
        let strings = self.strings.len();
        let string = self
            .strings
            .get_mut(index)
            .ok_or(ShellError::UnknownString { index, strings })?;
        Ok(string.pointer_cancel(event, &mut self.pending_stops))
    }

    /// Fire due deferred stops and advance string animations.
    ///
    /// Returns whether the shell must keep ticking: a string is still
    /// animating or a note stop is still queued.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        for key in self.pending_stops.drain_due(now_ms) {
            self.engine.stop_note(&key);
        }
        let mut animating = false;
        for string in self.strings.iter_mut() {
            animating |= string.animation_frame(now_ms);
        }
        animating || !self.pending_stops.is_empty()
    }

    /// When the next queued note stop falls due, for shells that sleep
    /// between frames.
    pub fn next_stop_due(&self) -> Option<f64> {
        self.pending_stops.next_due()
    }

    /// Pull the next block of mono output.
    pub fn render(&mut self, out: &mut [f32]) {
        self.engine.render(out);
    }

    /// Current drawn displacement of a string's midpoint.
    pub fn string_displacement(&self, index: usize, now_ms: f64) -> Result<f64, StudioError> {
        let string = self.strings.get(index).ok_or(ShellError::UnknownString {
            index,
            strings: self.strings.len(),
        })?;
        Ok(string.displacement(now_ms))
    }

    pub fn engine(&self) -> &AudioEngine {
        &self.engine
    }

    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    pub fn active_instrument(&self) -> &Arc<InstrumentProfile> {
        &self.active
    }

    pub fn settings(&self) -> ToneSettings {
        self.settings
    }

    pub fn strings(&self) -> &[StringController] {
        &self.strings
    }

    pub fn pending_stops(&self) -> &TimerQueue<VoiceKey> {
        &self.pending_stops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OutputConfig;

    fn started() -> Studio {
        let mut studio = Studio::new(InstrumentRegistry::builtin());
        assert!(studio.start(&mut OutputConfig::new(44100.0)));
        studio
    }

    #[test]
    fn builds_one_controller_per_note() {
        let studio = Studio::new(InstrumentRegistry::builtin());
        assert_eq!(studio.active_instrument().id, "electric_guitar");
        assert_eq!(studio.strings().len(), 6);
        assert_eq!(studio.strings()[0].key().as_str(), "string-E-82.41");
        assert_eq!(studio.strings()[5].key().as_str(), "string-E-329.63");
    }

    #[test]
    fn pluck_then_deferred_stop() {
        let mut studio = started();
        studio.pointer_down(0, PointerEvent::new(1, 0.0, 0.0)).unwrap();
        assert_eq!(studio.engine().live_voice_count(), 1);
        studio.pointer_up(0, PointerEvent::new(1, 0.0, 100.0)).unwrap();

        assert!(studio.tick(599.0));
        assert_eq!(studio.engine().live_voice_count(), 1);
        studio.tick(600.0);
        assert_eq!(studio.engine().live_voice_count(), 0);
        assert!(studio.pending_stops().is_empty());
    }

    #[test]
    fn queued_stop_keeps_ticking_after_instrument_switch() {
        let mut studio = started();
        studio.pointer_down(0, PointerEvent::new(1, 0.0, 0.0)).unwrap();
        studio.pointer_up(0, PointerEvent::new(1, 0.0, 0.0)).unwrap();
        studio.select_instrument("saxophone").unwrap();

        // The old strings are gone, but the stop is still owed.
        assert!(studio.tick(16.0));
        assert_eq!(studio.next_stop_due(), Some(500.0));
        assert_eq!(studio.engine().live_voice_count(), 1);

        let mut now = 16.0;
        while studio.tick(now) {
            now += 16.0;
            assert!(now < 2000.0, "tick never settled");
        }
        assert_eq!(studio.engine().live_voice_count(), 0);
        assert!(studio.pending_stops().is_empty());
    }

    #[test]
    fn short_vibration_still_lets_the_stop_fire() {
        let config = GestureConfig {
            decay_ms: 50.0,
            ..GestureConfig::default()
        };
        let mut studio = Studio::with_gesture_config(InstrumentRegistry::builtin(), config);
        studio.start(&mut OutputConfig::new(44100.0));
        studio.pointer_down(2, PointerEvent::new(4, 0.0, 0.0)).unwrap();
        studio.pointer_up(2, PointerEvent::new(4, 0.0, 0.0)).unwrap();

        let mut now = 0.0;
        while studio.tick(now) {
            now += 16.0;
            assert!(now < 2000.0, "tick never settled");
        }
        assert!(now >= 500.0);
        assert_eq!(studio.engine().live_voice_count(), 0);
    }

    #[test]
    fn unknown_ids_and_indices_are_errors() {
        let mut studio = started();
        assert!(matches!(
            studio.select_instrument("theremin"),
            Err(StudioError::Shell(ShellError::UnknownInstrument { .. }))
        ));
        assert!(matches!(
            studio.pointer_down(6, PointerEvent::new(1, 0.0, 0.0)),
            Err(StudioError::Shell(ShellError::UnknownString { index: 6, strings: 6 }))
        ));
        assert!(studio.string_displacement(99, 0.0).is_err());
    }

    #[test]
    fn switching_instrument_retunes_and_releases_held_strings() {
        let mut studio = started();
        studio.pointer_down(2, PointerEvent::new(1, 0.0, 0.0)).unwrap();
        studio.select_instrument("bass").unwrap();
        assert_eq!(studio.strings().len(), 4);
        assert_eq!(studio.engine().live_voice_count(), 0);
        // Bass base cutoff 600 Hz, default tone 0.5.
        assert_eq!(studio.engine().filter_cutoff_target(), Some(600.0));
    }

    #[test]
    fn settings_are_clamped() {
        let mut studio = started();
        studio.update_settings(ToneSettings {
            gain: 3.0,
            distortion: 0.5,
            tone: 1.0,
            reverb: -1.0,
        });
        assert_eq!(studio.settings().gain, 1.0);
        assert_eq!(studio.settings().reverb, 0.0);
        assert_eq!(studio.engine().master_gain_target(), Some(1.0));
        assert_eq!(studio.engine().filter_cutoff_target(), Some(6000.0));
    }

    #[test]
    fn silent_studio_still_tracks_gestures() {
        let mut studio = Studio::new(InstrumentRegistry::builtin());
        assert_eq!(
            studio.pointer_down(1, PointerEvent::new(3, 0.0, 0.0)).unwrap(),
            GestureOutcome::Captured
        );
        assert_eq!(
            studio.pointer_move(1, PointerEvent::new(3, 30.0, 10.0)).unwrap(),
            GestureOutcome::Bent(30.0)
        );
        assert_eq!(studio.string_displacement(1, 10.0).unwrap(), 30.0);
        assert_eq!(studio.engine().live_voice_count(), 0);
    }
}
