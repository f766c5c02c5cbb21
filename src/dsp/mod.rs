//! DSP — sample-accurate rendition of the WebAudio graph the player drives.
//!
//! Every node here evaluates its parameters against the engine's render
//! clock, so the same code runs inside an AudioWorklet (via WASM) and in
//! the offline WAV renderer.

pub mod chain;
pub mod envelope;
pub mod filter;
pub mod oscillator;
pub mod param;
pub mod renderer;
pub mod shaper;
pub mod voice;
