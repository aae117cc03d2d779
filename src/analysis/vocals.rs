//! Vocal Presence Classifier
//!
//! Decides whether a vocal stem carries audible signal. Separation run on an
//! instrumental source yields a near-silent vocal stem; acapella-type
//! recipes would then export a useless near-empty file, so they are gated
//! on this classification.

use log::warn;

use crate::engine::AudioBuffer;

/// RMS level below which a stem counts as having no vocals (dBFS)
pub const SILENCE_THRESHOLD_DB: f32 = -35.0;

/// Classify whether a vocal stem contains audible vocals
///
/// Fails open: a corrupt buffer (non-finite samples) is classified as
/// having vocals, so downstream export attempts and fails visibly instead
/// of output silently going missing.
pub fn has_vocals(vocals: &AudioBuffer) -> bool {
    if !vocals.is_valid() {
        warn!("vocal stem contains non-finite samples; assuming vocals present");
        return true;
    }

    let rms = vocals.rms_db();
    let peak = vocals.peak_db();
    let present = rms >= SILENCE_THRESHOLD_DB;
    log::debug!(
        "vocal stem: rms {:.1} dBFS, peak {:.1} dBFS -> {}",
        rms,
        peak,
        if present { "vocals" } else { "no vocals" }
    );
    present
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;

    #[test]
    fn test_silence_has_no_vocals() {
        let buf = AudioBuffer::silent(5_000, 2, 44100);
        assert!(!has_vocals(&buf));
    }

    #[test]
    fn test_full_scale_tone_has_vocals() {
        let buf = generate_test_tone(220.0, 2_000, 44100);
        assert!(has_vocals(&buf));
    }

    #[test]
    fn test_quiet_stem_below_threshold() {
        // -50 dBFS tone: separation residue, not vocals
        let buf = generate_test_tone(220.0, 2_000, 44100).gain(crate::engine::db_to_linear(-50.0));
        assert!(!has_vocals(&buf));
    }

    #[test]
    fn test_corrupt_buffer_fails_open() {
        let buf = AudioBuffer::from_interleaved(vec![f32::NAN; 1024], 1, 44100).unwrap();
        assert!(has_vocals(&buf));
    }
}
