//! Percussion/FX Synthesizer
//!
//! Generates the decorative elements the edit recipes splice in: a clap
//! (bundled sample when available, filtered noise otherwise), a sub-bass
//! impact stinger, and beat-placed clap loops.
//!
//! Clap placement is a creative parameter, not a physical law; it is
//! expressed as a policy value so a recipe-set version can pin it.

use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::engine::{import_audio, AudioBuffer, TempoGrid};

/// Longest a bundled clap sample is allowed to run (ms)
const MAX_CLAP_SAMPLE_MS: u64 = 1000;

/// Fade applied when truncating a bundled sample (ms)
const SAMPLE_TRUNCATE_FADE_MS: u64 = 50;

/// High-pass cutoff shaping procedural claps (Hz)
const CLAP_HIGHPASS_HZ: f32 = 800.0;

/// Low-pass cutoff for the FX hit's noise layer (Hz)
const FX_LOWPASS_HZ: f32 = 500.0;

/// Fundamental of the FX hit's sine layer (Hz)
const FX_SINE_HZ: f32 = 60.0;

// ============================================================================
// Placement policy
// ============================================================================

/// Which beats of a loop receive a clap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClapPlacement {
    /// A clap on every beat (historical v1 behavior)
    EveryBeat,
    /// Claps on the given zero-based beats of each measure
    OnBeats {
        beats_in_measure: Vec<u32>,
        measure_len: u32,
    },
}

impl ClapPlacement {
    /// Canonical backbeat placement: beats 2 and 4 of each 4-beat measure
    pub fn backbeat() -> Self {
        ClapPlacement::OnBeats {
            beats_in_measure: vec![1, 3],
            measure_len: 4,
        }
    }

    /// Absolute beat indices receiving a clap within a `total_beats` loop
    pub fn positions(&self, total_beats: u32) -> Vec<u32> {
        match self {
            ClapPlacement::EveryBeat => (0..total_beats).collect(),
            ClapPlacement::OnBeats {
                beats_in_measure,
                measure_len,
            } => {
                if *measure_len == 0 {
                    return Vec::new();
                }
                (0..total_beats)
                    .filter(|b| beats_in_measure.contains(&(b % measure_len)))
                    .collect()
            }
        }
    }
}

// ============================================================================
// Noise source
// ============================================================================

/// Deterministic white noise (xorshift64*)
///
/// The crate carries no RNG dependency and the synthesizer benefits from
/// reproducible output: the same track always renders the same edits.
struct NoiseGen {
    state: u64,
}

impl NoiseGen {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next_sample(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        let v = x.wrapping_mul(0x2545_F491_4F6C_DD1D);
        // Map the top 24 bits into [-1, 1)
        ((v >> 40) as f32 / 8_388_608.0) - 1.0
    }
}

fn white_noise(duration_ms: u64, channels: u16, sample_rate: u32, seed: u64) -> AudioBuffer {
    let frames = (duration_ms as f64 * sample_rate as f64 / 1000.0) as usize;
    let mut gen = NoiseGen::new(seed);
    let samples: Vec<f32> = (0..frames * channels as usize)
        .map(|_| gen.next_sample() * 0.5)
        .collect();
    AudioBuffer::from_interleaved(samples, channels, sample_rate).unwrap()
}

// ============================================================================
// First-order filters
// ============================================================================

fn high_pass(buf: &AudioBuffer, cutoff_hz: f32) -> AudioBuffer {
    let ch = buf.channels() as usize;
    let dt = 1.0 / buf.sample_rate() as f32;
    let rc = 1.0 / (2.0 * std::f32::consts::PI * cutoff_hz);
    let alpha = rc / (rc + dt);

    let mut out = buf.samples().to_vec();
    for c in 0..ch {
        let mut prev_x = 0.0f32;
        let mut prev_y = 0.0f32;
        for f in 0..buf.num_frames() {
            let x = buf.samples()[f * ch + c];
            let y = alpha * (prev_y + x - prev_x);
            out[f * ch + c] = y;
            prev_x = x;
            prev_y = y;
        }
    }
    AudioBuffer::from_interleaved(out, buf.channels(), buf.sample_rate()).unwrap()
}

fn low_pass(buf: &AudioBuffer, cutoff_hz: f32) -> AudioBuffer {
    let ch = buf.channels() as usize;
    let dt = 1.0 / buf.sample_rate() as f32;
    let rc = 1.0 / (2.0 * std::f32::consts::PI * cutoff_hz);
    let alpha = dt / (rc + dt);

    let mut out = buf.samples().to_vec();
    for c in 0..ch {
        let mut prev_y = 0.0f32;
        for f in 0..buf.num_frames() {
            let x = buf.samples()[f * ch + c];
            let y = prev_y + alpha * (x - prev_y);
            out[f * ch + c] = y;
            prev_y = y;
        }
    }
    AudioBuffer::from_interleaved(out, buf.channels(), buf.sample_rate()).unwrap()
}

fn sine_tone(freq: f32, duration_ms: u64, channels: u16, sample_rate: u32) -> AudioBuffer {
    let frames = (duration_ms as f64 * sample_rate as f64 / 1000.0) as usize;
    let angular = 2.0 * std::f32::consts::PI * freq / sample_rate as f32;
    let mut samples = Vec::with_capacity(frames * channels as usize);
    for f in 0..frames {
        let v = (angular * f as f32).sin() * 0.8;
        for _ in 0..channels {
            samples.push(v);
        }
    }
    AudioBuffer::from_interleaved(samples, channels, sample_rate).unwrap()
}

/// Conform a loaded sample to the target channel count
fn conform_channels(buf: AudioBuffer, channels: u16) -> AudioBuffer {
    if buf.channels() == channels {
        return buf;
    }
    let mono = buf.to_mono();
    if channels == 1 {
        return mono;
    }
    let mut samples = Vec::with_capacity(mono.num_frames() * channels as usize);
    for &s in mono.samples() {
        for _ in 0..channels {
            samples.push(s);
        }
    }
    AudioBuffer::from_interleaved(samples, channels, mono.sample_rate()).unwrap()
}

// ============================================================================
// Generators
// ============================================================================

/// Synthesize (or load) one clap hit
///
/// A bundled sample at `sample_path` wins when it exists, is readable, and
/// matches the target sample rate; it is truncated to at most one second
/// with a short fade. A missing or unusable sample is never fatal: the
/// fallback is a white-noise burst with a fast linear decay and an 800 Hz
/// high-pass, which lands close enough to a clap's spectral character.
pub fn generate_clap(
    duration_ms: u64,
    channels: u16,
    sample_rate: u32,
    sample_path: Option<&Path>,
) -> AudioBuffer {
    if let Some(path) = sample_path {
        match import_audio(path) {
            Ok(sample) if sample.sample_rate() == sample_rate => {
                let sample = conform_channels(sample, channels);
                let clap = if sample.duration_ms() > MAX_CLAP_SAMPLE_MS {
                    sample
                        .slice_ms(0, MAX_CLAP_SAMPLE_MS)
                        .fade_out(SAMPLE_TRUNCATE_FADE_MS)
                } else {
                    sample
                };
                debug!("clap: using bundled sample {}", path.display());
                return clap;
            }
            Ok(sample) => {
                warn!(
                    "clap sample {} is {} Hz, track is {} Hz; falling back to synthesis",
                    path.display(),
                    sample.sample_rate(),
                    sample_rate
                );
            }
            Err(e) => {
                warn!(
                    "failed to load clap sample {}: {}; falling back to synthesis",
                    path.display(),
                    e
                );
            }
        }
    }

    let noise = white_noise(duration_ms, channels, sample_rate, 0xC1A9_05EB);
    let decay = duration_ms.saturating_sub(10);
    high_pass(&noise.fade_out(decay), CLAP_HIGHPASS_HZ)
}

/// Synthesize a sub-bass impact stinger
///
/// A 60 Hz sine faded over the full duration, with a low-passed noise burst
/// of half the duration layered on top.
pub fn generate_fx_hit(duration_ms: u64, channels: u16, sample_rate: u32) -> AudioBuffer {
    let sine = sine_tone(FX_SINE_HZ, duration_ms, channels, sample_rate).fade_out(duration_ms);
    let burst_ms = duration_ms / 2;
    let noise = low_pass(
        &white_noise(burst_ms, channels, sample_rate, 0xF0CC_1D57).fade_out(burst_ms),
        FX_LOWPASS_HZ,
    );
    // Sine defines the length; the noise layer rides on its first half
    sine.overlay(&noise).unwrap_or(sine)
}

/// Build a clap loop of `beats` beats on the given grid
///
/// Returns silence of the loop's span with a clap overlaid at each
/// placement position. Offsets come from the absolute beat index.
pub fn build_clap_loop(
    grid: &TempoGrid,
    beats: u32,
    placement: &ClapPlacement,
    channels: u16,
    sample_rate: u32,
    sample_path: Option<&Path>,
) -> AudioBuffer {
    let clap_ms = (grid.beat_ms() / 2.0).min(200.0) as u64;
    let clap = generate_clap(clap_ms.max(1), channels, sample_rate, sample_path);

    let mut loop_buf = AudioBuffer::silent(grid.span_ms(beats), channels, sample_rate);
    for beat in placement.positions(beats) {
        // Same rate and channels throughout, the overlay cannot fail
        if let Ok(mixed) = loop_buf.overlay_at(&clap, grid.offset_ms(beat)) {
            loop_buf = mixed;
        }
    }
    loop_buf
}
