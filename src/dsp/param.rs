//! Automatable parameter — WebAudio `AudioParam` scheduling semantics.
//!
//! Every knob in the signal graph (envelope gain, detune, filter cutoff,
//! master gain) is an `AudioParam`: a default value plus a time-ordered list
//! of automation events evaluated against the render clock in seconds.
//!
//! Supported events:
//!
//! ```text
//!   SetValue     v ─────┐ step to v at t
//!   LinearRamp   ╱      straight line from the previous event to v at t
//!   SetTarget    ╲___   v(t) = target + (v0 - target) * e^(-(t - t0) / tau)
//! ```
//!
//! `cancel_scheduled_values` holds the value it interrupts instead of
//! snapping back to the last explicit event, so releasing a note half-way
//! through its attack ramp starts the release from where the ramp was.

#[derive(Debug, Clone, Copy, PartialEq)]
enum Automation {
    SetValue { value: f64, time: f64 },
    LinearRamp { value: f64, time: f64 },
    SetTarget { target: f64, time: f64, tau: f64 },
}

impl Automation {
    fn time(&self) -> f64 {
        match *self {
            Automation::SetValue { time, .. }
            | Automation::LinearRamp { time, .. }
            | Automation::SetTarget { time, .. } => time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioParam {
    default: f64,
    events: Vec<Automation>,
}

/// Value reached after following an exponential approach from `t0` to `t`.
fn approach(value: f64, t0: f64, pending: Option<(f64, f64)>, t: f64) -> f64 {
    match pending {
        Some((target, tau)) if tau <= 0.0 => target,
        Some((target, tau)) => target + (value - target) * (-(t - t0) / tau).exp(),
        None => value,
    }
}

impl AudioParam {
    pub fn new(default: f64) -> Self {
        AudioParam {
            default,
            events: Vec::new(),
        }
    }

    /// Insert keeping time order; equal times keep insertion order.
    fn insert(&mut self, event: Automation) {
        let time = event.time();
        let idx = self
            .events
            .iter()
            .position(|e| e.time() > time)
            .unwrap_or(self.events.len());
        self.events.insert(idx, event);
    }

    pub fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(Automation::SetValue { value, time });
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(Automation::LinearRamp { value, time });
    }

    /// Exponential approach toward `target` starting at `time` with time constant `tau`.
    pub fn set_target_at_time(&mut self, target: f64, time: f64, tau: f64) {
        self.insert(Automation::SetTarget { target, time, tau });
    }

    /// Drop every event at or after `time`, holding the value reached there.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        let held = self.value_at(time);
        self.events.retain(|e| e.time() < time);
        self.insert(Automation::SetValue { value: held, time });
    }

    /// Evaluate the automation curve at `t` seconds.
    pub fn value_at(&self, t: f64) -> f64 {
        let mut value = self.default;
        let mut start = 0.0;
        let mut pending: Option<(f64, f64)> = None;

        for event in &self.events {
            let time = event.time();
            if time > t {
                if let Automation::LinearRamp { value: end, time } = *event {
                    // The ramp starts from the previous event's value.
                    let span = time - start;
                    if span <= 0.0 {
                        return end;
                    }
                    return value + (end - value) * ((t - start) / span);
                }
                break;
            }

            value = approach(value, start, pending, time);
            match *event {
                Automation::SetValue { value: v, .. } | Automation::LinearRamp { value: v, .. } => {
                    value = v;
                    pending = None;
                }
                Automation::SetTarget { target, tau, .. } => {
                    pending = Some((target, tau));
                }
            }
            start = time;
        }

        approach(value, start, pending, t)
    }

    /// The value the automation settles on once every event has played out.
    pub fn target(&self) -> f64 {
        match self.events.last() {
            Some(Automation::SetValue { value, .. })
            | Some(Automation::LinearRamp { value, .. }) => *value,
            Some(Automation::SetTarget { target, .. }) => *target,
            None => self.default,
        }
    }

    /// Fold events that can no longer influence values at or after `now`.
    ///
    /// The render loop only ever asks for monotonically increasing times, so
    /// anything fully in the past collapses into the default value.
    pub fn compact(&mut self, now: f64) {
        while self.events.len() >= 2 {
            let next = self.events[1];
            if next.time() > now || matches!(next, Automation::LinearRamp { .. }) {
                break;
            }
            // Value just before `next` fires, with only events[0] in effect.
            let first = self.events[0];
            let settled = match first {
                Automation::SetValue { value, .. } | Automation::LinearRamp { value, .. } => value,
                Automation::SetTarget { .. } => {
                    let before = AudioParam {
                        default: self.default,
                        events: vec![first],
                    };
                    before.value_at(next.time())
                }
            };
            self.default = settled;
            self.events.remove(0);
        }
    }

    /// Number of automation events still queued.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}
