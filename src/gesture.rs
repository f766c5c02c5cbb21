//! Per-string gesture controller.
//!
//! Each on-screen string owns one `StringController`, a small state machine
//! that turns pointer events into note operations:
//!
//! ```text
//!            pointer_down (no pointer bound)
//!   Idle ───────────────────────────────────► Plucking { pointer, last_y }
//!    ▲                                          │  pointer_move (bound pointer)
//!    │                                          │  → bend offset += dy, clamped
//!    │      pointer_up / pointer_cancel         │
//!    └──────────────────────────────────────────┘
//!           → vibration starts, offset snaps to 0,
//!             stop_note scheduled after the release delay
//! ```
//!
//! The controller never touches the audio graph. It talks to a `NoteSink`
//! (the engine in production, a recorder in tests) and pushes deferred stops
//! onto a `TimerQueue` owned by the caller.

use serde::{Deserialize, Serialize};

use crate::engine::VoiceKey;
use crate::timer::TimerQueue;

/// The three note operations a gesture can drive.
pub trait NoteSink {
    fn start_note(&mut self, key: &VoiceKey, frequency: f64);
    fn update_bend(&mut self, key: &VoiceKey, bend: f64);
    fn stop_note(&mut self, key: &VoiceKey);
}

/// Tunables for the gesture state machine and the release vibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GestureConfig {
    /// Delay between pointer release and `stop_note`.
    pub release_delay_ms: f64,
    /// Bend offset is clamped to ±this.
    pub bend_limit: f64,
    /// Offsets at or below this magnitude count as a tap.
    pub tap_threshold: f64,
    /// Vibration seed used for taps.
    pub tap_amplitude: f64,
    pub decay_ms: f64,
    /// Radians per millisecond.
    pub angular_rate: f64,
    /// The vibration stops once its decay factor falls to this.
    pub cutoff_ratio: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig {
            release_delay_ms: 500.0,
            bend_limit: 120.0,
            tap_threshold: 5.0,
            tap_amplitude: 20.0,
            decay_ms: 400.0,
            angular_rate: 0.25,
            cutoff_ratio: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: i32,
    /// Vertical position in display units.
    pub y: f64,
    /// UI clock timestamp.
    pub time_ms: f64,
}

impl PointerEvent {
    pub fn new(pointer_id: i32, y: f64, time_ms: f64) -> Self {
        PointerEvent {
            pointer_id,
            y,
            time_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Plucking { pointer_id: i32, last_y: f64 },
}

/// What the shell should do with the pointer after an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// Capture the pointer; a note started.
    Captured,
    /// Still plucking; the new clamped bend offset.
    Bent(f64),
    /// Release pointer capture; the stop is scheduled.
    Released,
    /// Not ours.
    Ignored,
}

/// Decaying visual oscillation of a released string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vibration {
    seed: f64,
    started_ms: f64,
    angular_rate: f64,
    decay_ms: f64,
    cutoff_ratio: f64,
}

impl Vibration {
    /// Start a vibration for a string released with `offset` at `now_ms`.
    pub fn seeded(offset: f64, now_ms: f64, config: &GestureConfig) -> Self {
        let seed = if offset.abs() > config.tap_threshold {
            offset
        } else {
            config.tap_amplitude
        };
        Vibration {
            seed,
            started_ms: now_ms,
            angular_rate: config.angular_rate,
            decay_ms: config.decay_ms,
            cutoff_ratio: config.cutoff_ratio,
        }
    }

    pub fn seed(&self) -> f64 {
        self.seed
    }

    /// Displacement at `now_ms`, or `None` once the vibration has died out.
    pub fn sample(&self, now_ms: f64) -> Option<f64> {
        let t = (now_ms - self.started_ms).max(0.0);
        let decay = (-t / self.decay_ms).exp();
        if decay <= self.cutoff_ratio {
            return None;
        }
        Some(self.seed * (self.angular_rate * t).sin() * decay)
    }
}

/// Gesture state machine for one string.
#[derive(Debug, Clone)]
pub struct StringController {
    key: VoiceKey,
    frequency: f64,
    config: GestureConfig,
    state: GestureState,
    bend_offset: f64,
    vibration: Option<Vibration>,
    frame_requested: bool,
}

impl StringController {
    pub fn new(key: VoiceKey, frequency: f64, config: GestureConfig) -> Self {
        StringController {
            key,
            frequency,
            config,
            state: GestureState::Idle,
            bend_offset: 0.0,
            vibration: None,
            frame_requested: false,
        }
    }

    pub fn key(&self) -> &VoiceKey {
        &self.key
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn bend_offset(&self) -> f64 {
        self.bend_offset
    }

    pub fn vibration(&self) -> Option<&Vibration> {
        self.vibration.as_ref()
    }

    /// Whether the controller wants another animation frame.
    pub fn wants_frame(&self) -> bool {
        self.frame_requested
    }

    pub fn pointer_down(&mut self, event: PointerEvent, sink: &mut dyn NoteSink) -> GestureOutcome {
        if let GestureState::Plucking { .. } = self.state {
            return GestureOutcome::Ignored;
        }
        self.state = GestureState::Plucking {
            pointer_id: event.pointer_id,
            last_y: event.y,
        };
        sink.start_note(&self.key, self.frequency);
        GestureOutcome::Captured
    }

    pub fn pointer_move(&mut self, event: PointerEvent, sink: &mut dyn NoteSink) -> GestureOutcome {
        let GestureState::Plucking { pointer_id, last_y } = self.state else {
            return GestureOutcome::Ignored;
        };
        if pointer_id != event.pointer_id {
            return GestureOutcome::Ignored;
        }

        let limit = self.config.bend_limit;
        self.bend_offset = (self.bend_offset + (event.y - last_y)).clamp(-limit, limit);
        sink.update_bend(&self.key, self.bend_offset);
        self.state = GestureState::Plucking {
            pointer_id,
            last_y: event.y,
        };
        GestureOutcome::Bent(self.bend_offset)
    }

    pub fn pointer_up(
        &mut self,
        event: PointerEvent,
        timers: &mut TimerQueue<VoiceKey>,
    ) -> GestureOutcome {
        match self.state {
            GestureState::Plucking { pointer_id, .. } if pointer_id == event.pointer_id => {}
            _ => return GestureOutcome::Ignored,
        }

        self.state = GestureState::Idle;
        self.vibration = Some(Vibration::seeded(self.bend_offset, event.time_ms, &self.config));
        self.frame_requested = true;
        self.bend_offset = 0.0;
        timers.schedule(event.time_ms + self.config.release_delay_ms, self.key.clone());
        log::debug!("{} released, stop due in {} ms", self.key, self.config.release_delay_ms);
        GestureOutcome::Released
    }

    /// A cancelled pointer releases the string like a lift.
    pub fn pointer_cancel(
        &mut self,
        event: PointerEvent,
        timers: &mut TimerQueue<VoiceKey>,
    ) -> GestureOutcome {
        self.pointer_up(event, timers)
    }

    /// Advance the vibration. Returns whether another frame is needed.
    pub fn animation_frame(&mut self, now_ms: f64) -> bool {
        if !self.frame_requested {
            return false;
        }
        let alive = self
            .vibration
            .as_ref()
            .is_some_and(|v| v.sample(now_ms).is_some());
        if !alive {
            self.vibration = None;
            self.frame_requested = false;
        }
        self.frame_requested
    }

    /// Where to draw the string's midpoint: bend offset plus vibration.
    pub fn displacement(&self, now_ms: f64) -> f64 {
        let ringing = self
            .vibration
            .as_ref()
            .and_then(|v| v.sample(now_ms))
            .unwrap_or(0.0);
        self.bend_offset + ringing
    }

    /// Drop any pending animation frame. Scheduled stops stay with the queue.
    pub fn teardown(&mut self) {
        self.vibration = None;
        self.frame_requested = false;
    }
}
