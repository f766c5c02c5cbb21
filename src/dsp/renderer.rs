//! Offline renderer — plays one pluck through a private engine and encodes
//! the result as a WAV byte buffer.
//!
//! Useful for previewing presets without an audio device and for checking
//! the full signal path in tests.

use std::sync::Arc;

use crate::engine::{AudioEngine, OutputConfig, STOP_TAIL_FACTOR, VoiceKey};
use crate::instrument::InstrumentProfile;
use crate::settings::ToneSettings;

/// Extra silence rendered after the release tail, in seconds.
const TAIL_PADDING: f64 = 0.05;

/// Render a single note held for `hold` seconds, then released and allowed
/// to ring out. Returns mono samples.
pub fn render_pluck(
    profile: Arc<InstrumentProfile>,
    settings: ToneSettings,
    frequency: f64,
    hold: f64,
    sample_rate: u32,
) -> Vec<f32> {
    let mut engine = AudioEngine::new();
    if !engine.initialize(&mut OutputConfig::new(sample_rate as f64)) {
        return Vec::new();
    }
    let release = profile.release;
    engine.set_profile(profile);
    engine.update_settings(settings.clamped());

    let key = VoiceKey::new("render");
    let sr = sample_rate as f64;
    let hold_frames = (hold.max(0.0) * sr).round() as usize;
    let tail_frames = ((STOP_TAIL_FACTOR * release + TAIL_PADDING) * sr).round() as usize;

    let mut out = vec![0.0_f32; hold_frames + tail_frames];
    let (held, tail) = out.split_at_mut(hold_frames);
    engine.start_note(&key, frequency);
    engine.render(held);
    engine.stop_note(&key);
    engine.render(tail);
    out
}

/// Render a pluck as a 16-bit mono WAV file.
pub fn render_pluck_wav(
    profile: Arc<InstrumentProfile>,
    settings: ToneSettings,
    frequency: f64,
    hold: f64,
    sample_rate: u32,
) -> Vec<u8> {
    let samples = render_pluck(profile, settings, frequency, hold, sample_rate);
    let pcm: Vec<i16> = samples
        .iter()
        .map(|&s| (s as f64 * 32767.0).round().clamp(-32768.0, 32767.0) as i16)
        .collect();
    encode_wav(&pcm, sample_rate, 1)
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}
