//! Audio Engine — the signal graph manager.
//!
//! Owns the shared processing chain (distortion → lowpass → master gain)
//! and every voice currently producing sound. The front-end drives it with
//! four operations keyed by a `VoiceKey`: start, bend, stop, and the two
//! configuration calls `set_profile` / `update_settings`.
//!
//! Time is the engine's own sample clock. Every parameter change is
//! scheduled against it as automation, and `render` pulls samples the way
//! an AudioWorklet or an offline renderer would.
//!
//! Voice disposal is two-phase:
//!
//! ```text
//!   stop_note(key)  ──► live index entry removed          (logical release)
//!        │
//!        └─ envelope glides to 0, source halts at now + 4 * release
//!                                  ──► voice dropped by render  (physical release)
//! ```
//!
//! The engine never fails out of a note operation. Without an output, without
//! a profile, or for unknown keys, calls are silent no-ops.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dsp::chain::ProcessingChain;
use crate::dsp::shaper::make_distortion_curve;
use crate::dsp::voice::{Voice, VoiceId};
use crate::error::{AudioError, StudioError};
use crate::gesture::NoteSink;
use crate::instrument::InstrumentProfile;
use crate::settings::ToneSettings;

/// Time constant for knob-driven changes (master gain, tone cutoff, drive crossfade).
pub const SETTINGS_SMOOTHING: f64 = 0.05;
/// Time constant for retuning the filter to a new instrument.
pub const PROFILE_SMOOTHING: f64 = 0.1;
/// Time constant for pitch-bend detune glides.
pub const BEND_SMOOTHING: f64 = 0.05;
/// Detune in cents per unit of bend offset.
pub const CENTS_PER_BEND_UNIT: f64 = 2.5;
/// The source halts this many release time constants after `stop_note`.
pub const STOP_TAIL_FACTOR: f64 = 4.0;
/// Base cutoff used by `update_settings` before any profile is active.
pub const FALLBACK_CUTOFF: f64 = 2000.0;

const MAX_SAMPLE_RATE: f64 = 768_000.0;

/// Map a bend offset to detune cents.
///
/// Only the magnitude counts: bending up and bending down both raise the pitch.
pub fn bend_to_cents(bend: f64) -> f64 {
    bend.abs() * CENTS_PER_BEND_UNIT
}

/// Identifies a playable string. At most one live voice exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceKey(String);

impl VoiceKey {
    pub fn new(key: impl Into<String>) -> Self {
        VoiceKey(key.into())
    }

    /// Key for a string from its label and open frequency.
    pub fn for_string(label: &str, frequency: f64) -> Self {
        VoiceKey(format!("string-{label}-{frequency}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VoiceKey {
    fn from(s: &str) -> Self {
        VoiceKey::new(s)
    }
}

/// What the host hands back when an output is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputConfig {
    pub sample_rate: f64,
    /// Browsers keep a fresh context suspended until a user gesture.
    pub start_suspended: bool,
}

impl OutputConfig {
    pub fn new(sample_rate: f64) -> Self {
        OutputConfig {
            sample_rate,
            start_suspended: false,
        }
    }

    pub fn suspended(mut self) -> Self {
        self.start_suspended = true;
        self
    }
}

/// Supplier of an audio output context.
pub trait AudioHost {
    fn open_output(&mut self) -> Result<OutputConfig, StudioError>;
}

/// A fixed configuration is itself a host: the AudioWorklet or offline
/// renderer already knows its sample rate.
impl AudioHost for OutputConfig {
    fn open_output(&mut self) -> Result<OutputConfig, StudioError> {
        let sr = self.sample_rate;
        if !sr.is_finite() || sr <= 0.0 || sr > MAX_SAMPLE_RATE {
            return Err(AudioError::InvalidSampleRate { sample_rate: sr }.into());
        }
        Ok(*self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
}

/// Read-only view of one sounding voice.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSnapshot {
    pub id: VoiceId,
    pub key: VoiceKey,
    pub frequency: f64,
    /// Still indexed as the key's live voice.
    pub live: bool,
    pub stop_at: Option<f64>,
    pub detune_target: f64,
}

struct Sounding {
    key: VoiceKey,
    voice: Voice,
}

/// Everything that only exists once an output is open.
struct Graph {
    sample_rate: f64,
    state: ContextState,
    frame: u64,
    chain: ProcessingChain,
    live: HashMap<VoiceKey, VoiceId>,
    voices: Vec<Sounding>,
    next_voice_id: VoiceId,
}

impl Graph {
    fn new(config: OutputConfig) -> Self {
        Graph {
            sample_rate: config.sample_rate,
            state: if config.start_suspended {
                ContextState::Suspended
            } else {
                ContextState::Running
            },
            frame: 0,
            chain: ProcessingChain::new(config.sample_rate),
            live: HashMap::new(),
            voices: Vec::new(),
            next_voice_id: 1,
        }
    }

    fn now(&self) -> f64 {
        self.frame as f64 / self.sample_rate
    }

    fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices
            .iter_mut()
            .find(|s| s.voice.id == id)
            .map(|s| &mut s.voice)
    }

    fn retune_filter(&mut self, cutoff: f64, tau: f64) {
        let now = self.now();
        self.chain.filter.cutoff.set_target_at_time(cutoff, now, tau);
    }

    fn apply_settings(&mut self, settings: &ToneSettings, base_cutoff: f64) {
        let now = self.now();
        self.chain.shaper.glide_to_curve(
            make_distortion_curve(settings.distortion),
            now,
            SETTINGS_SMOOTHING,
        );
        self.chain
            .master_gain
            .set_target_at_time(settings.gain, now, SETTINGS_SMOOTHING);
        self.retune_filter(base_cutoff * (0.5 + settings.tone), SETTINGS_SMOOTHING);
    }

    /// Logical release: drop the index entry and schedule the physical stop.
    fn release_key(&mut self, key: &VoiceKey, release: f64) -> bool {
        let Some(id) = self.live.remove(key) else {
            return false;
        };
        let now = self.now();
        let release = release.max(0.0);
        if let Some(voice) = self.voice_mut(id) {
            voice.release(now, release, now + STOP_TAIL_FACTOR * release);
        }
        true
    }
}

/// The signal graph manager. One per process, owned by the studio shell.
pub struct AudioEngine {
    graph: Option<Graph>,
    profile: Option<Arc<InstrumentProfile>>,
    settings: Option<ToneSettings>,
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine {
    /// An engine with no output yet. Every operation is a no-op until `initialize`.
    pub fn new() -> Self {
        AudioEngine {
            graph: None,
            profile: None,
            settings: None,
        }
    }

    /// Open the output and build the shared chain. Idempotent.
    ///
    /// Returns whether the engine has an output afterwards. A refused output
    /// leaves the engine silent; a later call may try again.
    pub fn initialize(&mut self, host: &mut dyn AudioHost) -> bool {
        if self.graph.is_some() {
            return true;
        }

        let config = match host.open_output() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("audio output unavailable, engine stays silent: {e}");
                return false;
            }
        };

        let mut graph = Graph::new(config);
        if let Some(profile) = &self.profile {
            graph.retune_filter(profile.filter_freq, PROFILE_SMOOTHING);
        }
        if let Some(settings) = &self.settings {
            graph.apply_settings(settings, self.base_cutoff());
        }
        log::info!(
            "audio engine initialized at {} Hz ({:?})",
            config.sample_rate,
            graph.state
        );
        self.graph = Some(graph);
        true
    }

    fn base_cutoff(&self) -> f64 {
        self.profile
            .as_ref()
            .map_or(FALLBACK_CUTOFF, |p| p.filter_freq)
    }

    /// Make `profile` the active instrument and glide the filter to its cutoff.
    pub fn set_profile(&mut self, profile: Arc<InstrumentProfile>) {
        if let Some(graph) = self.graph.as_mut() {
            graph.retune_filter(profile.filter_freq, PROFILE_SMOOTHING);
        }
        log::debug!("active instrument: {}", profile.id);
        self.profile = Some(profile);
    }

    /// Apply the panel knobs: drive curve, master gain, tone cutoff.
    ///
    /// `reverb` is stored with the rest but nothing processes it.
    pub fn update_settings(&mut self, settings: ToneSettings) {
        let base = self.base_cutoff();
        if let Some(graph) = self.graph.as_mut() {
            graph.apply_settings(&settings, base);
        }
        self.settings = Some(settings);
    }

    /// Start a voice for `key` at `frequency`, replacing any live voice on that key.
    pub fn start_note(&mut self, key: &VoiceKey, frequency: f64) {
        let (Some(graph), Some(profile)) = (self.graph.as_mut(), self.profile.as_ref()) else {
            return;
        };
        if !frequency.is_finite() || frequency <= 0.0 {
            log::warn!("ignoring note for {key} at invalid frequency {frequency}");
            return;
        }
        if graph.state == ContextState::Suspended {
            log::debug!("resuming suspended audio context");
            graph.state = ContextState::Running;
        }

        graph.release_key(key, profile.release);

        let id = graph.next_voice_id;
        graph.next_voice_id += 1;
        let voice = Voice::start(
            id,
            profile.waveform,
            frequency,
            profile.attack,
            graph.now(),
            graph.sample_rate,
        );
        graph.voices.push(Sounding {
            key: key.clone(),
            voice,
        });
        graph.live.insert(key.clone(), id);
        log::debug!("note on {key} ({frequency} Hz), voice {id}");
    }

    /// Bend the live voice on `key`. No-op if there is none.
    pub fn update_bend(&mut self, key: &VoiceKey, bend: f64) {
        let Some(graph) = self.graph.as_mut() else {
            return;
        };
        if !bend.is_finite() {
            return;
        }
        let Some(&id) = graph.live.get(key) else {
            return;
        };
        let now = graph.now();
        if let Some(voice) = graph.voice_mut(id) {
            voice.bend_to(bend_to_cents(bend), now, BEND_SMOOTHING);
        }
    }

    /// Release the live voice on `key`. No-op if there is none.
    pub fn stop_note(&mut self, key: &VoiceKey) {
        let (Some(graph), Some(profile)) = (self.graph.as_mut(), self.profile.as_ref()) else {
            return;
        };
        if graph.release_key(key, profile.release) {
            log::debug!("note off {key}");
        }
    }

    /// Render mono samples. Silent while uninitialized or suspended; the
    /// clock only advances while running.
    pub fn render(&mut self, out: &mut [f32]) {
        let Some(graph) = self.graph.as_mut() else {
            out.fill(0.0);
            return;
        };
        if graph.state == ContextState::Suspended {
            out.fill(0.0);
            return;
        }

        for sample in out.iter_mut() {
            let t = graph.now();
            let mut sum = 0.0;
            for sounding in graph.voices.iter_mut() {
                sum += sounding.voice.next_sample(t);
            }
            *sample = graph.chain.process(sum, t) as f32;
            graph.frame += 1;
        }

        let now = graph.now();
        graph.voices.retain(|s| !s.voice.is_finished(now));
        for sounding in graph.voices.iter_mut() {
            sounding.voice.compact(now);
        }
        graph.chain.compact(now);
    }

    pub fn is_initialized(&self) -> bool {
        self.graph.is_some()
    }

    pub fn context_state(&self) -> Option<ContextState> {
        self.graph.as_ref().map(|g| g.state)
    }

    pub fn sample_rate(&self) -> Option<f64> {
        self.graph.as_ref().map(|g| g.sample_rate)
    }

    /// Render clock in seconds; 0 before initialization.
    pub fn current_time(&self) -> f64 {
        self.graph.as_ref().map_or(0.0, Graph::now)
    }

    pub fn profile(&self) -> Option<&Arc<InstrumentProfile>> {
        self.profile.as_ref()
    }

    pub fn settings(&self) -> Option<ToneSettings> {
        self.settings
    }

    pub fn has_live_voice(&self, key: &VoiceKey) -> bool {
        self.graph.as_ref().is_some_and(|g| g.live.contains_key(key))
    }

    pub fn live_voice_count(&self) -> usize {
        self.graph.as_ref().map_or(0, |g| g.live.len())
    }

    /// Voices still producing sound, live or ringing out.
    pub fn sounding_voice_count(&self) -> usize {
        self.graph.as_ref().map_or(0, |g| g.voices.len())
    }

    pub fn voices(&self) -> Vec<VoiceSnapshot> {
        let Some(graph) = self.graph.as_ref() else {
            return Vec::new();
        };
        graph
            .voices
            .iter()
            .map(|s| VoiceSnapshot {
                id: s.voice.id,
                key: s.key.clone(),
                frequency: s.voice.base_frequency(),
                live: graph.live.get(&s.key) == Some(&s.voice.id),
                stop_at: s.voice.stop_at(),
                detune_target: s.voice.detune_target(),
            })
            .collect()
    }

    /// Cutoff the lowpass is gliding toward.
    pub fn filter_cutoff_target(&self) -> Option<f64> {
        self.graph.as_ref().map(|g| g.chain.filter.cutoff.target())
    }

    /// Master gain the chain is gliding toward.
    pub fn master_gain_target(&self) -> Option<f64> {
        self.graph.as_ref().map(|g| g.chain.master_gain.target())
    }

    /// Filter cutoff the chain will apply at render time `t`.
    pub fn filter_cutoff_at(&self, t: f64) -> Option<f64> {
        self.graph.as_ref().map(|g| g.chain.filter.cutoff.value_at(t))
    }

    /// Master gain the chain will apply at render time `t`.
    pub fn master_gain_at(&self, t: f64) -> Option<f64> {
        self.graph.as_ref().map(|g| g.chain.master_gain.value_at(t))
    }

    /// Detune in cents of the live voice on `key` at render time `t`.
    pub fn detune_at(&self, key: &VoiceKey, t: f64) -> Option<f64> {
        let graph = self.graph.as_ref()?;
        let id = graph.live.get(key)?;
        graph
            .voices
            .iter()
            .find(|s| s.voice.id == *id)
            .map(|s| s.voice.detune_at(t))
    }

    /// The drive curve currently loaded into the shaper.
    pub fn distortion_curve(&self) -> Option<&[f32]> {
        self.graph.as_ref().and_then(|g| g.chain.shaper.curve())
    }
}

impl NoteSink for AudioEngine {
    fn start_note(&mut self, key: &VoiceKey, frequency: f64) {
        AudioEngine::start_note(self, key, frequency);
    }

    fn update_bend(&mut self, key: &VoiceKey, bend: f64) {
        AudioEngine::update_bend(self, key, bend);
    }

    fn stop_note(&mut self, key: &VoiceKey) {
        AudioEngine::stop_note(self, key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::InstrumentRegistry;

    const SR: f64 = 44100.0;

    struct DeniedHost;

    impl AudioHost for DeniedHost {
        fn open_output(&mut self) -> Result<OutputConfig, StudioError> {
            Err(AudioError::OutputUnavailable {
                reason: "denied".into(),
            }
            .into())
        }
    }

    fn guitar() -> Arc<InstrumentProfile> {
        InstrumentRegistry::builtin().get("electric_guitar").unwrap().clone()
    }

    fn ready_engine() -> AudioEngine {
        let mut engine = AudioEngine::new();
        assert!(engine.initialize(&mut OutputConfig::new(SR)));
        engine.set_profile(guitar());
        engine
    }

    fn render_seconds(engine: &mut AudioEngine, seconds: f64) -> Vec<f32> {
        let mut buf = vec![0.0; (seconds * SR) as usize];
        engine.render(&mut buf);
        buf
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut engine = AudioEngine::new();
        assert!(engine.initialize(&mut OutputConfig::new(SR)));
        engine.update_settings(ToneSettings::default());
        render_seconds(&mut engine, 0.01);
        let t = engine.current_time();
        assert!(engine.initialize(&mut OutputConfig::new(48000.0)));
        assert_eq!(engine.sample_rate(), Some(SR));
        assert_eq!(engine.current_time(), t);
    }

    #[test]
    fn denied_output_degrades_to_silence() {
        let mut engine = AudioEngine::new();
        assert!(!engine.initialize(&mut DeniedHost));
        engine.set_profile(guitar());
        engine.update_settings(ToneSettings::default());
        let key = VoiceKey::from("e-low");
        engine.start_note(&key, 82.41);
        engine.update_bend(&key, 40.0);
        engine.stop_note(&key);
        assert_eq!(engine.live_voice_count(), 0);
        let mut buf = [1.0_f32; 64];
        engine.render(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn invalid_sample_rate_is_refused() {
        let mut engine = AudioEngine::new();
        assert!(!engine.initialize(&mut OutputConfig::new(0.0)));
        assert!(!engine.initialize(&mut OutputConfig::new(f64::NAN)));
        assert!(!engine.is_initialized());
        assert!(engine.initialize(&mut OutputConfig::new(SR)));
    }

    #[test]
    fn start_without_profile_is_noop() {
        let mut engine = AudioEngine::new();
        engine.initialize(&mut OutputConfig::new(SR));
        engine.start_note(&VoiceKey::from("k"), 220.0);
        assert_eq!(engine.sounding_voice_count(), 0);
    }

    #[test]
    fn repeated_start_keeps_one_live_voice() {
        let mut engine = ready_engine();
        let key = VoiceKey::from("k");
        for _ in 0..5 {
            engine.start_note(&key, 220.0);
            render_seconds(&mut engine, 0.001);
        }
        assert_eq!(engine.live_voice_count(), 1);
        let voices = engine.voices();
        assert_eq!(voices.iter().filter(|v| v.live).count(), 1);
        // Replaced voices were told to stop.
        assert!(voices.iter().filter(|v| !v.live).all(|v| v.stop_at.is_some()));
    }

    #[test]
    fn stop_and_bend_on_unknown_key_are_noops() {
        let mut engine = ready_engine();
        let key = VoiceKey::from("nothing");
        engine.update_bend(&key, 50.0);
        engine.stop_note(&key);
        engine.stop_note(&key);
        assert_eq!(engine.sounding_voice_count(), 0);
    }

    #[test]
    fn stopped_voice_rings_out_then_disposes() {
        let mut engine = ready_engine();
        let key = VoiceKey::from("e-low");
        engine.start_note(&key, 82.41);
        render_seconds(&mut engine, 0.05);
        engine.stop_note(&key);
        assert!(!engine.has_live_voice(&key));
        assert_eq!(engine.sounding_voice_count(), 1);

        // Release 0.1 s → source halts 0.4 s later.
        render_seconds(&mut engine, 0.3);
        assert_eq!(engine.sounding_voice_count(), 1);
        render_seconds(&mut engine, 0.15);
        assert_eq!(engine.sounding_voice_count(), 0);
    }

    #[test]
    fn bend_maps_magnitude_to_cents() {
        let mut engine = ready_engine();
        let key = VoiceKey::from("k");
        engine.start_note(&key, 220.0);
        engine.update_bend(&key, -40.0);
        assert_eq!(engine.voices()[0].detune_target, 100.0);
        engine.update_bend(&key, 40.0);
        assert_eq!(engine.voices()[0].detune_target, 100.0);
        assert_eq!(bend_to_cents(-120.0), 300.0);
    }

    #[test]
    fn suspended_context_resumes_on_start() {
        let mut engine = AudioEngine::new();
        engine.initialize(&mut OutputConfig::new(SR).suspended());
        engine.set_profile(guitar());
        assert_eq!(engine.context_state(), Some(ContextState::Suspended));
        render_seconds(&mut engine, 0.1);
        assert_eq!(engine.current_time(), 0.0);

        engine.start_note(&VoiceKey::from("k"), 220.0);
        assert_eq!(engine.context_state(), Some(ContextState::Running));
        let out = render_seconds(&mut engine, 0.1);
        assert!(engine.current_time() > 0.09);
        assert!(out.iter().any(|s| s.abs() > 1e-3));
    }

    #[test]
    fn settings_before_initialize_are_applied() {
        let mut engine = AudioEngine::new();
        engine.set_profile(guitar());
        engine.update_settings(ToneSettings {
            gain: 0.25,
            distortion: 0.5,
            tone: 0.0,
            reverb: 0.0,
        });
        assert_eq!(engine.filter_cutoff_target(), None);
        engine.initialize(&mut OutputConfig::new(SR));
        assert_eq!(engine.master_gain_target(), Some(0.25));
        assert_eq!(engine.filter_cutoff_target(), Some(2000.0));
        assert_eq!(engine.distortion_curve().map(<[f32]>::len), Some(44_100));
    }

    #[test]
    fn profile_without_settings_glides_to_base_cutoff() {
        let engine = ready_engine();
        assert_eq!(engine.filter_cutoff_target(), Some(4000.0));
    }

    #[test]
    fn settings_without_profile_use_fallback_cutoff() {
        let mut engine = AudioEngine::new();
        engine.initialize(&mut OutputConfig::new(SR));
        engine.update_settings(ToneSettings {
            tone: 1.0,
            ..ToneSettings::default()
        });
        assert_eq!(engine.filter_cutoff_target(), Some(3000.0));
    }

    #[test]
    fn output_stays_bounded() {
        let mut engine = ready_engine();
        engine.update_settings(ToneSettings {
            gain: 1.0,
            distortion: 1.0,
            tone: 1.0,
            reverb: 0.0,
        });
        for (i, key) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
            engine.start_note(&VoiceKey::from(*key), 82.41 * (i + 1) as f64);
        }
        let out = render_seconds(&mut engine, 0.5);
        assert!(out.iter().all(|s| s.is_finite() && s.abs() < 2.0));
    }

    /// Check an exponential glide from `from` toward `to` starting at `now`.
    fn assert_glide(at: impl Fn(f64) -> f64, now: f64, tau: f64, from: f64, to: f64) {
        let span = to - from;
        assert!((at(now) - from).abs() < 1e-9, "moved before the glide started");
        let one_tau = (at(now + tau) - from) / span;
        assert!((one_tau - (1.0 - (-1.0_f64).exp())).abs() < 1e-6, "got {one_tau} of the way at tau");
        assert!(((at(now + 5.0 * tau) - to) / span).abs() < 0.01);
    }

    #[test]
    fn profile_change_glides_over_profile_smoothing() {
        let mut engine = ready_engine();
        render_seconds(&mut engine, 0.2);
        let now = engine.current_time();
        let from = engine.filter_cutoff_at(now).unwrap();

        let sax = InstrumentRegistry::builtin().get("saxophone").unwrap().clone();
        engine.set_profile(sax);
        assert_glide(
            |t| engine.filter_cutoff_at(t).unwrap(),
            now,
            PROFILE_SMOOTHING,
            from,
            1200.0,
        );
    }

    #[test]
    fn settings_glide_over_settings_smoothing() {
        let mut engine = ready_engine();
        render_seconds(&mut engine, 0.5);
        let now = engine.current_time();
        let gain_from = engine.master_gain_at(now).unwrap();
        let cutoff_from = engine.filter_cutoff_at(now).unwrap();

        engine.update_settings(ToneSettings {
            gain: 0.2,
            distortion: 0.0,
            tone: 1.0,
            reverb: 0.0,
        });
        assert_glide(
            |t| engine.master_gain_at(t).unwrap(),
            now,
            SETTINGS_SMOOTHING,
            gain_from,
            0.2,
        );
        assert_glide(
            |t| engine.filter_cutoff_at(t).unwrap(),
            now,
            SETTINGS_SMOOTHING,
            cutoff_from,
            6000.0,
        );
    }

    #[test]
    fn bend_glides_over_bend_smoothing() {
        let mut engine = ready_engine();
        let key = VoiceKey::from("k");
        engine.start_note(&key, 220.0);
        render_seconds(&mut engine, 0.1);
        let now = engine.current_time();
        engine.update_bend(&key, 40.0);
        assert_glide(
            |t| engine.detune_at(&key, t).unwrap(),
            now,
            BEND_SMOOTHING,
            0.0,
            100.0,
        );
        assert_eq!(engine.detune_at(&VoiceKey::from("other"), now), None);
    }

    #[test]
    fn string_keys_follow_label_and_frequency() {
        assert_eq!(VoiceKey::for_string("E", 82.41).as_str(), "string-E-82.41");
        assert_eq!(VoiceKey::for_string("A", 110.0).as_str(), "string-A-110");
    }
}
