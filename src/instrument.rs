//! Instrument registry — the playable presets and their string tables.
//!
//! Profiles are built once at startup and never mutated afterwards. They are
//! handed around as `Arc<InstrumentProfile>` so the engine and the shell can
//! share the active one without copying the note table.
//!
//! The JSON shape mirrors the web front-end's preset records
//! (`oscType`, `filterFreq`, `notes: [{note, freq}]`).

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;
use crate::error::RegistryError;

/// One playable string: a display label and its open frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSlot {
    pub note: String,
    /// Frequency in Hz.
    pub freq: f64,
}

impl NoteSlot {
    pub fn new(note: &str, freq: f64) -> Self {
        NoteSlot {
            note: note.to_string(),
            freq,
        }
    }
}

/// Static description of an instrument preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentProfile {
    /// Stable identifier (e.g. "electric_guitar").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Icon hint for the front-end; display only.
    #[serde(default)]
    pub icon: String,
    #[serde(rename = "oscType")]
    pub waveform: Waveform,
    /// Attack time in seconds.
    pub attack: f64,
    /// Release time constant in seconds.
    pub release: f64,
    /// Base lowpass cutoff in Hz.
    pub filter_freq: f64,
    /// CSS colour for the strings; display only.
    pub color: String,
    pub notes: Vec<NoteSlot>,
}

impl InstrumentProfile {
    fn validate(&self) -> Result<(), RegistryError> {
        let times = [("attack", self.attack), ("release", self.release)];
        for (field, value) in times {
            if !(value.is_finite() && value >= 0.0) {
                return Err(self.invalid(field, value));
            }
        }
        if !(self.filter_freq.is_finite() && self.filter_freq > 0.0) {
            return Err(self.invalid("filterFreq", self.filter_freq));
        }
        if self.notes.is_empty() {
            return Err(RegistryError::NoNotes {
                id: self.id.clone(),
            });
        }
        for slot in &self.notes {
            if !(slot.freq.is_finite() && slot.freq > 0.0) {
                return Err(RegistryError::InvalidFrequency {
                    id: self.id.clone(),
                    note: slot.note.clone(),
                    frequency: slot.freq,
                });
            }
        }
        Ok(())
    }

    fn invalid(&self, field: &'static str, value: f64) -> RegistryError {
        RegistryError::InvalidParameter {
            id: self.id.clone(),
            field,
            value,
        }
    }
}

/// Ordered, immutable list of instrument profiles.
#[derive(Debug, Clone)]
pub struct InstrumentRegistry {
    profiles: Vec<Arc<InstrumentProfile>>,
}

impl InstrumentRegistry {
    /// Build a registry, rejecting empty lists, duplicate ids, bad timings or cutoffs, and bad note tables.
    pub fn new(profiles: Vec<InstrumentProfile>) -> Result<Self, RegistryError> {
        if profiles.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut seen = HashSet::new();
        for profile in &profiles {
            if !seen.insert(profile.id.as_str()) {
                return Err(RegistryError::DuplicateId {
                    id: profile.id.clone(),
                });
            }
            profile.validate()?;
        }
        Ok(InstrumentRegistry {
            profiles: profiles.into_iter().map(Arc::new).collect(),
        })
    }

    /// Parse a JSON array of profiles.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let profiles: Vec<InstrumentProfile> = serde_json::from_str(json)?;
        Self::new(profiles)
    }

    /// The four presets shipped with the app.
    pub fn builtin() -> Self {
        InstrumentRegistry {
            profiles: builtin_profiles().into_iter().map(Arc::new).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<InstrumentProfile>> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// The profile selected at startup.
    pub fn first(&self) -> &Arc<InstrumentProfile> {
        // Non-empty by construction.
        &self.profiles[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<InstrumentProfile>> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Plain copies of every profile, for serialisation across the WASM boundary.
    pub fn to_vec(&self) -> Vec<InstrumentProfile> {
        self.profiles.iter().map(|p| (**p).clone()).collect()
    }
}

impl Default for InstrumentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_profiles() -> Vec<InstrumentProfile> {
    vec![
        InstrumentProfile {
            id: "electric_guitar".into(),
            name: "Lead Guitar".into(),
            icon: "fa-guitar".into(),
            waveform: Waveform::Sawtooth,
            attack: 0.005,
            release: 0.1,
            filter_freq: 4000.0,
            color: "#f59e0b".into(),
            notes: vec![
                NoteSlot::new("E", 82.41),
                NoteSlot::new("A", 110.00),
                NoteSlot::new("D", 146.83),
                NoteSlot::new("G", 196.00),
                NoteSlot::new("B", 246.94),
                NoteSlot::new("E", 329.63),
            ],
        },
        InstrumentProfile {
            id: "saxophone".into(),
            name: "Tenor Sax".into(),
            icon: "fa-sax-hot".into(),
            waveform: Waveform::Square,
            attack: 0.08,
            release: 0.15,
            filter_freq: 1200.0,
            color: "#fbbf24".into(),
            notes: vec![
                NoteSlot::new("Bb", 116.54),
                NoteSlot::new("D", 146.83),
                NoteSlot::new("F", 174.61),
                NoteSlot::new("A", 220.00),
                NoteSlot::new("C", 261.63),
                NoteSlot::new("Eb", 311.13),
            ],
        },
        InstrumentProfile {
            id: "flute".into(),
            name: "Transverse Flute".into(),
            icon: "fa-wind".into(),
            waveform: Waveform::Sine,
            attack: 0.12,
            release: 0.2,
            filter_freq: 6000.0,
            color: "#22d3ee".into(),
            notes: vec![
                NoteSlot::new("G", 392.00),
                NoteSlot::new("A", 440.00),
                NoteSlot::new("B", 493.88),
                NoteSlot::new("C", 523.25),
                NoteSlot::new("D", 587.33),
                NoteSlot::new("E", 659.25),
            ],
        },
        InstrumentProfile {
            id: "bass".into(),
            name: "Electric Bass".into(),
            icon: "fa-drum".into(),
            waveform: Waveform::Triangle,
            attack: 0.01,
            release: 0.05,
            filter_freq: 600.0,
            color: "#ef4444".into(),
            notes: vec![
                NoteSlot::new("E", 41.20),
                NoteSlot::new("A", 55.00),
                NoteSlot::new("D", 73.42),
                NoteSlot::new("G", 98.00),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_four_instruments() {
        let reg = InstrumentRegistry::builtin();
        assert_eq!(reg.len(), 4);
        assert_eq!(reg.first().id, "electric_guitar");
        let ids: Vec<&str> = reg.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["electric_guitar", "saxophone", "flute", "bass"]);
    }

    #[test]
    fn builtin_profiles_validate() {
        let reg = InstrumentRegistry::new(builtin_profiles()).unwrap();
        assert_eq!(reg.get("bass").unwrap().notes.len(), 4);
        assert_eq!(reg.get("flute").unwrap().waveform, Waveform::Sine);
    }

    #[test]
    fn parses_front_end_json_shape() {
        let json = r##"[{
            "id": "organ",
            "name": "Organ",
            "oscType": "square",
            "attack": 0.02,
            "release": 0.3,
            "filterFreq": 2500,
            "color": "#ffffff",
            "notes": [{"note": "C", "freq": 261.63}]
        }]"##;
        let reg = InstrumentRegistry::from_json(json).unwrap();
        let organ = reg.get("organ").unwrap();
        assert_eq!(organ.waveform, Waveform::Square);
        assert_eq!(organ.filter_freq, 2500.0);
        assert_eq!(organ.icon, "");
        assert_eq!(organ.notes[0], NoteSlot::new("C", 261.63));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut profiles = builtin_profiles();
        profiles[1].id = "electric_guitar".into();
        assert!(matches!(
            InstrumentRegistry::new(profiles),
            Err(RegistryError::DuplicateId { .. })
        ));
    }

    #[test]
    fn rejects_empty_and_bad_tables() {
        assert!(matches!(
            InstrumentRegistry::new(Vec::new()),
            Err(RegistryError::Empty)
        ));

        let mut profiles = builtin_profiles();
        profiles[0].notes[2].freq = 0.0;
        assert!(matches!(
            InstrumentRegistry::new(profiles),
            Err(RegistryError::InvalidFrequency { .. })
        ));

        let mut profiles = builtin_profiles();
        profiles[3].notes.clear();
        assert!(matches!(
            InstrumentRegistry::new(profiles),
            Err(RegistryError::NoNotes { .. })
        ));
    }

    #[test]
    fn rejects_negative_times_and_bad_cutoff() {
        let json = r##"[{"id":"x","name":"X","oscType":"sine","attack":0.1,
            "release":-1,"filterFreq":1000,"color":"#000",
            "notes":[{"note":"A","freq":110}]}]"##;
        match InstrumentRegistry::from_json(json) {
            Err(RegistryError::InvalidParameter { id, field, value }) => {
                assert_eq!((id.as_str(), field, value), ("x", "release", -1.0));
            }
            other => panic!("expected InvalidParameter, got {other:?}"),
        }

        let mut profiles = builtin_profiles();
        profiles[1].filter_freq = 0.0;
        assert!(matches!(
            InstrumentRegistry::new(profiles),
            Err(RegistryError::InvalidParameter { field: "filterFreq", .. })
        ));

        let mut profiles = builtin_profiles();
        profiles[2].attack = f64::NAN;
        assert!(matches!(
            InstrumentRegistry::new(profiles),
            Err(RegistryError::InvalidParameter { field: "attack", .. })
        ));
    }

    #[test]
    fn rejects_unknown_waveform() {
        let json = r##"[{"id":"x","name":"X","oscType":"custom","attack":0.1,
            "release":0.1,"filterFreq":1000,"color":"#000","notes":[]}]"##;
        assert!(matches!(
            InstrumentRegistry::from_json(json),
            Err(RegistryError::Json(_))
        ));
    }
}
