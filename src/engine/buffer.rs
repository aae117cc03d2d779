//! Audio Buffer Management
//!
//! Core audio buffer type for the edit engine. Samples are stored in
//! interleaved format: [L0, R0, L1, R1, ...], matching common file formats.
//!
//! All composition operations (slice, append, overlay, crossfade, fades)
//! return new buffers; engine paths never mutate a buffer in place.

use crate::error::{DropforgeError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default sample rate when synthesizing from scratch (44.1kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Seam fade applied at hard structural joins for click suppression (ms)
pub const SEAM_FADE_MS: u64 = 50;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero or negative input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Interleaved audio buffer at a fixed sample rate and channel count
#[derive(Clone, Debug)]
pub struct AudioBuffer {
    /// Interleaved sample data
    samples: Vec<f32>,
    /// Number of channels (1 = mono, 2 = stereo)
    channels: u16,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer of the given duration
    pub fn silent(duration_ms: u64, channels: u16, sample_rate: u32) -> Self {
        let frames = Self::ms_to_frames_at(duration_ms, sample_rate);
        Self {
            samples: vec![0.0; frames * channels as usize],
            channels,
            sample_rate,
        }
    }

    /// Create a buffer from existing interleaved samples
    pub fn from_interleaved(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(DropforgeError::InvalidAudio {
                reason: "zero channels".to_string(),
                source: None,
            });
        }
        if samples.len() % channels as usize != 0 {
            return Err(DropforgeError::InvalidAudio {
                reason: format!(
                    "sample count {} is not divisible by channel count {}",
                    samples.len(),
                    channels
                ),
                source: None,
            });
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Number of channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved sample data
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// True if the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in milliseconds, truncated to integer
    pub fn duration_ms(&self) -> u64 {
        (self.num_frames() as f64 * 1000.0 / self.sample_rate as f64) as u64
    }

    fn ms_to_frames_at(ms: u64, sample_rate: u32) -> usize {
        // Truncate, matching the beat-grid rounding convention
        (ms as f64 * sample_rate as f64 / 1000.0) as usize
    }

    /// Convert a millisecond offset into a frame index for this buffer
    pub fn ms_to_frames(&self, ms: u64) -> usize {
        Self::ms_to_frames_at(ms, self.sample_rate)
    }

    fn require_compatible(&self, other: &AudioBuffer, op: &str) -> Result<()> {
        if self.sample_rate != other.sample_rate || self.channels != other.channels {
            return Err(DropforgeError::BufferMismatch {
                reason: format!(
                    "{}: {} Hz/{}ch vs {} Hz/{}ch",
                    op, self.sample_rate, self.channels, other.sample_rate, other.channels
                ),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Composition operations
    // ------------------------------------------------------------------

    /// Slice between two millisecond offsets, clamped to buffer bounds
    ///
    /// An out-of-range or inverted request yields an empty buffer rather
    /// than an error; callers that need to distinguish a degraded slice
    /// check the returned duration themselves.
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> AudioBuffer {
        let ch = self.channels as usize;
        let start = self.ms_to_frames(start_ms).min(self.num_frames());
        let end = self.ms_to_frames(end_ms).min(self.num_frames());
        let samples = if start < end {
            self.samples[start * ch..end * ch].to_vec()
        } else {
            Vec::new()
        };
        AudioBuffer {
            samples,
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Slice from a millisecond offset to the end of the buffer
    pub fn slice_from_ms(&self, start_ms: u64) -> AudioBuffer {
        self.slice_ms(start_ms, self.duration_ms() + 1000)
    }

    /// Concatenate another buffer after this one
    pub fn append(&self, other: &AudioBuffer) -> Result<AudioBuffer> {
        self.require_compatible(other, "append")?;
        let mut samples = Vec::with_capacity(self.samples.len() + other.samples.len());
        samples.extend_from_slice(&self.samples);
        samples.extend_from_slice(&other.samples);
        Ok(AudioBuffer {
            samples,
            channels: self.channels,
            sample_rate: self.sample_rate,
        })
    }

    /// Concatenate with a linear crossfade over `overlap_ms`
    ///
    /// The tail of `self` is ramped down while the head of `other` is ramped
    /// up, and the two are summed. The result length is
    /// `len(self) + len(other) - overlap`. The overlap is clamped to the
    /// shorter of the two buffers, so a degenerate request degrades to a
    /// plain append instead of failing.
    pub fn append_crossfade(&self, other: &AudioBuffer, overlap_ms: u64) -> Result<AudioBuffer> {
        self.require_compatible(other, "append_crossfade")?;
        let ch = self.channels as usize;
        let overlap = self
            .ms_to_frames(overlap_ms)
            .min(self.num_frames())
            .min(other.num_frames());
        if overlap == 0 {
            return self.append(other);
        }

        let a_frames = self.num_frames();
        let total_frames = a_frames + other.num_frames() - overlap;
        let mut samples = vec![0.0f32; total_frames * ch];

        // Untouched head of A
        let head = (a_frames - overlap) * ch;
        samples[..head].copy_from_slice(&self.samples[..head]);

        // Overlap region: ramp A down, B up
        for f in 0..overlap {
            let fade_out = 1.0 - (f as f32 + 1.0) / (overlap as f32 + 1.0);
            let fade_in = 1.0 - fade_out;
            for c in 0..ch {
                let a = self.samples[(a_frames - overlap + f) * ch + c] * fade_out;
                let b = other.samples[f * ch + c] * fade_in;
                samples[head + f * ch + c] = a + b;
            }
        }

        // Untouched tail of B
        samples[head + overlap * ch..].copy_from_slice(&other.samples[overlap * ch..]);

        Ok(AudioBuffer {
            samples,
            channels: self.channels,
            sample_rate: self.sample_rate,
        })
    }

    /// Mix another buffer on top of this one, starting at `position_ms`
    ///
    /// Samples are summed; the result keeps this buffer's length, so any
    /// part of `other` extending past the end is dropped.
    pub fn overlay_at(&self, other: &AudioBuffer, position_ms: u64) -> Result<AudioBuffer> {
        self.require_compatible(other, "overlay_at")?;
        let ch = self.channels as usize;
        let offset = self.ms_to_frames(position_ms);
        let mut samples = self.samples.clone();
        let frames = self.num_frames();
        for f in 0..other.num_frames() {
            let dst = offset + f;
            if dst >= frames {
                break;
            }
            for c in 0..ch {
                samples[dst * ch + c] += other.samples[f * ch + c];
            }
        }
        Ok(AudioBuffer {
            samples,
            channels: self.channels,
            sample_rate: self.sample_rate,
        })
    }

    /// Mix another buffer on top of this one from the start
    pub fn overlay(&self, other: &AudioBuffer) -> Result<AudioBuffer> {
        self.overlay_at(other, 0)
    }

    /// Linear fade-in over the first `fade_ms` of the buffer
    pub fn fade_in(&self, fade_ms: u64) -> AudioBuffer {
        self.faded(fade_ms, true)
    }

    /// Linear fade-out over the last `fade_ms` of the buffer
    pub fn fade_out(&self, fade_ms: u64) -> AudioBuffer {
        self.faded(fade_ms, false)
    }

    fn faded(&self, fade_ms: u64, from_start: bool) -> AudioBuffer {
        let ch = self.channels as usize;
        let frames = self.num_frames();
        let fade = self.ms_to_frames(fade_ms).min(frames);
        let mut samples = self.samples.clone();
        for f in 0..fade {
            let ramp = (f as f32 + 1.0) / (fade as f32 + 1.0);
            let frame = if from_start { f } else { frames - fade + f };
            let gain = if from_start { ramp } else { 1.0 - ramp };
            for c in 0..ch {
                samples[frame * ch + c] *= gain;
            }
        }
        AudioBuffer {
            samples,
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Scale all samples by a linear gain factor
    pub fn gain(&self, linear: f32) -> AudioBuffer {
        let samples = self.samples.iter().map(|&s| s * linear).collect();
        AudioBuffer {
            samples,
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Downmix to mono by averaging channels
    pub fn to_mono(&self) -> AudioBuffer {
        if self.channels == 1 {
            return self.clone();
        }
        let ch = self.channels as usize;
        let samples = self
            .samples
            .chunks_exact(ch)
            .map(|frame| frame.iter().sum::<f32>() / ch as f32)
            .collect();
        AudioBuffer {
            samples,
            channels: 1,
            sample_rate: self.sample_rate,
        }
    }

    // ------------------------------------------------------------------
    // Level analysis
    // ------------------------------------------------------------------

    /// RMS level across all channels in dBFS
    pub fn rms_db(&self) -> f32 {
        if self.samples.is_empty() {
            return f32::NEG_INFINITY;
        }
        let sum_sq: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        let rms = (sum_sq / self.samples.len() as f64).sqrt() as f32;
        linear_to_db(rms)
    }

    /// Peak absolute sample level in dBFS
    pub fn peak_db(&self) -> f32 {
        let peak = self.samples.iter().map(|&s| s.abs()).fold(0.0f32, f32::max);
        linear_to_db(peak)
    }

    /// Check the buffer contains only finite samples
    pub fn is_valid(&self) -> bool {
        self.samples.iter().all(|&s| s.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tone(duration_ms: u64, amp: f32) -> AudioBuffer {
        let frames = (duration_ms as f64 * 44.1) as usize;
        let samples: Vec<f32> = (0..frames * 2)
            .map(|i| {
                let t = (i / 2) as f32 / 44100.0;
                amp * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect();
        AudioBuffer::from_interleaved(samples, 2, 44100).unwrap()
    }

    #[test]
    fn test_silent_buffer() {
        let buf = AudioBuffer::silent(1000, 2, 44100);
        assert_eq!(buf.num_frames(), 44100);
        assert_eq!(buf.duration_ms(), 1000);
        assert_eq!(buf.rms_db(), f32::NEG_INFINITY);
    }

    #[test]
    fn test_from_interleaved_rejects_ragged() {
        assert!(AudioBuffer::from_interleaved(vec![0.0; 3], 2, 44100).is_err());
    }

    #[test]
    fn test_slice_clamps_to_bounds() {
        let buf = tone(1000, 0.5);
        let slice = buf.slice_ms(500, 5000);
        assert_eq!(slice.duration_ms(), 500);

        let empty = buf.slice_ms(2000, 3000);
        assert!(empty.is_empty());

        let inverted = buf.slice_ms(800, 200);
        assert!(inverted.is_empty());
    }

    #[test]
    fn test_append_lengths() {
        let a = tone(400, 0.5);
        let b = tone(600, 0.5);
        let out = a.append(&b).unwrap();
        assert_eq!(out.num_frames(), a.num_frames() + b.num_frames());
    }

    #[test]
    fn test_append_rejects_mismatched_rate() {
        let a = tone(400, 0.5);
        let b = AudioBuffer::silent(400, 2, 48000);
        assert!(a.append(&b).is_err());
    }

    #[test]
    fn test_crossfade_length_and_seam() {
        let a = tone(1000, 0.8);
        let b = tone(1000, 0.8);
        let out = a.append_crossfade(&b, 200).unwrap();
        let overlap = a.ms_to_frames(200);
        assert_eq!(out.num_frames(), a.num_frames() + b.num_frames() - overlap);
        // No amplitude spike above the louder input's peak (plus epsilon
        // for the phase-aligned sum at the ramp midpoint)
        let peak_in = a.peak_db().max(b.peak_db());
        assert!(out.peak_db() <= peak_in + 0.5);
    }

    #[test]
    fn test_crossfade_zero_overlap_is_append() {
        let a = tone(300, 0.5);
        let b = tone(300, 0.5);
        let out = a.append_crossfade(&b, 0).unwrap();
        assert_eq!(out.num_frames(), a.num_frames() + b.num_frames());
    }

    #[test]
    fn test_overlay_preserves_length() {
        let bed = AudioBuffer::silent(1000, 2, 44100);
        let hit = tone(300, 0.5);
        let out = bed.overlay_at(&hit, 900).unwrap();
        assert_eq!(out.num_frames(), bed.num_frames());
        // The hit actually landed
        assert!(out.rms_db() > f32::NEG_INFINITY);
    }

    #[test]
    fn test_to_mono_averages() {
        let samples = vec![1.0, 0.0, 1.0, 0.0];
        let buf = AudioBuffer::from_interleaved(samples, 2, 44100).unwrap();
        let mono = buf.to_mono();
        assert_eq!(mono.channels(), 1);
        assert_abs_diff_eq!(mono.samples()[0], 0.5);
    }

    #[test]
    fn test_rms_db_sine() {
        let buf = tone(1000, 1.0);
        // RMS of a unity sine is 1/sqrt(2) = -3.01 dBFS
        assert_abs_diff_eq!(buf.rms_db(), -3.01, epsilon = 0.1);
    }

    #[test]
    fn test_fade_out_tail_is_quiet() {
        let buf = tone(1000, 1.0).fade_out(1000);
        let tail = buf.slice_ms(900, 1000);
        assert!(tail.peak_db() < -15.0);
    }

    #[test]
    fn test_is_valid() {
        let buf = tone(100, 0.5);
        assert!(buf.is_valid());
        let bad = AudioBuffer::from_interleaved(vec![f32::NAN, 0.0], 2, 44100).unwrap();
        assert!(!bad.is_valid());
    }
}
