pub mod advice;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod export;
pub mod gesture;
pub mod instrument;
pub mod settings;
pub mod studio;
pub mod timer;

use crate::engine::OutputConfig;
use crate::error::StudioError;
use crate::gesture::{GestureOutcome, PointerEvent};
use crate::instrument::InstrumentRegistry;
use crate::settings::ToneSettings;
use crate::studio::Studio;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the multistudio-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: the drive transfer curve for a knob value, for drawing.
#[wasm_bindgen]
pub fn distortion_curve(amount: f64) -> Vec<f32> {
    dsp::shaper::make_distortion_curve(amount)
}

/// WASM-exposed: the built-in instrument list as plain JS objects.
#[wasm_bindgen]
pub fn builtin_instruments() -> Result<JsValue, JsValue> {
    to_js(&InstrumentRegistry::builtin().to_vec())
}

/// WASM-exposed: render one pluck of a built-in instrument to a WAV byte array.
#[wasm_bindgen]
pub fn render_pluck_wav(
    instrument_id: &str,
    settings: JsValue,
    frequency: f64,
    hold: f64,
    sample_rate: u32,
) -> Result<Vec<u8>, JsValue> {
    let registry = InstrumentRegistry::builtin();
    let profile = registry
        .get(instrument_id)
        .cloned()
        .ok_or_else(|| js_error(error::ShellError::UnknownInstrument { id: instrument_id.to_string() }.into()))?;
    let settings: ToneSettings = serde_wasm_bindgen::from_value(settings)?;
    Ok(dsp::renderer::render_pluck_wav(
        profile,
        settings,
        frequency,
        hold,
        sample_rate,
    ))
}

fn js_error(e: StudioError) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&format!("{e}")))
}

fn outcome_name(outcome: GestureOutcome) -> &'static str {
    match outcome {
        GestureOutcome::Captured => "captured",
        GestureOutcome::Bent(_) => "bent",
        GestureOutcome::Released => "released",
        GestureOutcome::Ignored => "ignored",
    }
}

/// Browser handle on a `Studio`.
///
/// The page creates one after its AudioContext exists and feeds it pointer
/// events, animation ticks and AudioWorklet render requests. Pointer
/// methods return `"captured"`, `"bent"`, `"released"` or `"ignored"` so the
/// page knows whether to capture or release the pointer.
#[wasm_bindgen]
pub struct WasmStudio {
    studio: Studio,
    sample_rate: f64,
}

#[wasm_bindgen]
impl WasmStudio {
    /// Studio over the built-in instruments, or over `instruments` (a JSON
    /// array of profiles) when given.
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64, instruments: Option<String>) -> Result<WasmStudio, JsValue> {
        let registry = match instruments {
            Some(json) => InstrumentRegistry::from_json(&json).map_err(|e| js_error(e.into()))?,
            None => InstrumentRegistry::builtin(),
        };
        Ok(WasmStudio {
            studio: Studio::new(registry),
            sample_rate,
        })
    }

    /// Open audio output. Call from the first user gesture.
    pub fn start(&mut self) -> bool {
        let mut host = OutputConfig::new(self.sample_rate);
        self.studio.start(&mut host)
    }

    pub fn instruments(&self) -> Result<JsValue, JsValue> {
        to_js(&self.studio.registry().to_vec())
    }

    #[wasm_bindgen(js_name = activeInstrument)]
    pub fn active_instrument(&self) -> Result<JsValue, JsValue> {
        to_js(self.studio.active_instrument().as_ref())
    }

    #[wasm_bindgen(js_name = selectInstrument)]
    pub fn select_instrument(&mut self, id: &str) -> Result<(), JsValue> {
        self.studio.select_instrument(id).map_err(js_error)
    }

    pub fn settings(&self) -> Result<JsValue, JsValue> {
        to_js(&self.studio.settings())
    }

    #[wasm_bindgen(js_name = updateSettings)]
    pub fn update_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let settings: ToneSettings = serde_wasm_bindgen::from_value(settings)?;
        self.studio.update_settings(settings);
        Ok(())
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, string: usize, pointer_id: i32, y: f64, time_ms: f64) -> Result<String, JsValue> {
        let outcome = self
            .studio
            .pointer_down(string, PointerEvent::new(pointer_id, y, time_ms))
            .map_err(js_error)?;
        Ok(outcome_name(outcome).to_string())
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, string: usize, pointer_id: i32, y: f64, time_ms: f64) -> Result<String, JsValue> {
        let outcome = self
            .studio
            .pointer_move(string, PointerEvent::new(pointer_id, y, time_ms))
            .map_err(js_error)?;
        Ok(outcome_name(outcome).to_string())
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, string: usize, pointer_id: i32, y: f64, time_ms: f64) -> Result<String, JsValue> {
        let outcome = self
            .studio
            .pointer_up(string, PointerEvent::new(pointer_id, y, time_ms))
            .map_err(js_error)?;
        Ok(outcome_name(outcome).to_string())
    }

    #[wasm_bindgen(js_name = pointerCancel)]
    pub fn pointer_cancel(&mut self, string: usize, pointer_id: i32, y: f64, time_ms: f64) -> Result<String, JsValue> {
        let outcome = self
            .studio
            .pointer_cancel(string, PointerEvent::new(pointer_id, y, time_ms))
            .map_err(js_error)?;
        Ok(outcome_name(outcome).to_string())
    }

    /// Fire due note stops and advance vibrations. Returns whether the page
    /// must keep ticking (a vibration is running or a note stop is queued).
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.studio.tick(now_ms)
    }

    /// Due time of the next queued note stop, or `undefined`.
    #[wasm_bindgen(js_name = nextStopDue)]
    pub fn next_stop_due(&self) -> Option<f64> {
        self.studio.next_stop_due()
    }

    /// Fill an AudioWorklet output block.
    pub fn render(&mut self, out: &mut [f32]) {
        self.studio.render(out);
    }

    #[wasm_bindgen(js_name = stringDisplacement)]
    pub fn string_displacement(&self, string: usize, now_ms: f64) -> Result<f64, JsValue> {
        self.studio.string_displacement(string, now_ms).map_err(js_error)
    }

    #[wasm_bindgen(js_name = liveVoiceCount)]
    pub fn live_voice_count(&self) -> usize {
        self.studio.engine().live_voice_count()
    }
}

/// WASM-exposed: fallback advice tip, for pages that fetch advice themselves.
#[wasm_bindgen]
pub fn fallback_advice() -> Result<JsValue, JsValue> {
    to_js(&advice::AdviceTip::fallback())
}

/// WASM-exposed: `generateContent` request body for the current knobs.
#[wasm_bindgen]
pub fn advice_request(settings: JsValue) -> Result<String, JsValue> {
    let settings: ToneSettings = serde_wasm_bindgen::from_value(settings)?;
    Ok(advice::build_request(&settings.clamped(), "English").to_string())
}

/// WASM-exposed: parse a `generateContent` response, falling back on any error.
#[wasm_bindgen]
pub fn parse_advice(body: &str) -> Result<JsValue, JsValue> {
    let tip = advice::parse_response(body).unwrap_or_else(|e| {
        log::error!("tone advice failed: {e}");
        advice::AdviceTip::fallback()
    });
    to_js(&tip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn version_matches_manifest() {
        assert_eq!(core_version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn distortion_curve_export_matches_shaper() {
        let curve = distortion_curve(0.5);
        assert_eq!(curve.len(), dsp::shaper::CURVE_SAMPLES);
        assert_eq!(curve, dsp::shaper::make_distortion_curve(0.5));
    }

    #[test]
    fn outcome_names() {
        assert_eq!(outcome_name(GestureOutcome::Bent(3.0)), "bent");
        assert_eq!(outcome_name(GestureOutcome::Ignored), "ignored");
    }

    #[test]
    fn shared_profiles_are_not_copied() {
        let registry = InstrumentRegistry::builtin();
        let studio = Studio::new(registry.clone());
        assert!(Arc::ptr_eq(studio.active_instrument(), registry.first()));
    }
}
