//! Integration Tests
//!
//! End-to-end scenarios for the edit synthesis pipeline: drop location on
//! engineered tracks, recipe length accounting, and vocal gating.

use dropforge::analysis::{locate_drop, DropWindow, DROP_BEATS};
use dropforge::engine::{AudioBuffer, TempoGrid};
use dropforge::recipes::{EditPolicy, StemSet};
use dropforge::synth::{build_clap_loop, ClapPlacement};
use dropforge::synthesize_edits;

/// Stereo tone of the given amplitude
fn tone(duration_ms: u64, amp: f32, freq: f32) -> AudioBuffer {
    let rate = 44_100u32;
    let frames = (duration_ms as f64 * rate as f64 / 1000.0) as usize;
    let mut samples = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let t = i as f32 / rate as f32;
        let v = amp * (2.0 * std::f32::consts::PI * freq * t).sin();
        samples.push(v);
        samples.push(v);
    }
    AudioBuffer::from_interleaved(samples, 2, rate).unwrap()
}

/// Quiet bed with a loud sustained region at [spike_start, spike_start + spike_len)
fn spiked_instrumental(total_ms: u64, spike_start_ms: u64, spike_len_ms: u64) -> AudioBuffer {
    let rate = 44_100u32;
    let frames = (total_ms as f64 * rate as f64 / 1000.0) as usize;
    let s0 = (spike_start_ms as f64 * rate as f64 / 1000.0) as usize;
    let s1 = ((spike_start_ms + spike_len_ms) as f64 * rate as f64 / 1000.0) as usize;
    let mut samples = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let t = i as f32 / rate as f32;
        let amp = if i >= s0 && i < s1 { 0.9 } else { 0.1 };
        let v = amp * (2.0 * std::f32::consts::PI * 110.0 * t).sin();
        samples.push(v);
        samples.push(v);
    }
    AudioBuffer::from_interleaved(samples, 2, rate).unwrap()
}

// === Drop location ===

#[test]
fn test_drop_located_at_engineered_spike() {
    // 120 BPM, 3-minute instrumental, 32-beat (16s) spike starting at 45s
    let grid = TempoGrid::new(120.0).unwrap();
    let instrumental = spiked_instrumental(180_000, 45_000, 16_000);

    let drop = locate_drop(&instrumental, &grid);
    assert!(
        (44_000..=46_000).contains(&drop.start_ms),
        "drop at {} ms, expected ~45000",
        drop.start_ms
    );
    assert!(drop.end_ms(&grid) <= instrumental.duration_ms());
}

#[test]
fn test_drop_is_deterministic_end_to_end() {
    let grid = TempoGrid::new(120.0).unwrap();
    let instrumental = spiked_instrumental(180_000, 45_000, 16_000);
    assert_eq!(
        locate_drop(&instrumental, &grid),
        locate_drop(&instrumental, &grid)
    );
}

// === Recipe length accounting ===

#[test]
fn test_intro_recipe_length_property() {
    // Intro length = intro_beats + (track - intro_beats) + outro, the
    // crossfade overlaps cancelling against the early pickup starts
    let track_ms = 180_000u64;
    let grid = TempoGrid::new(120.0).unwrap();
    let stems = StemSet {
        original: tone(track_ms, 0.8, 220.0),
        vocals: tone(track_ms, 0.4, 440.0),
        instrumental: spiked_instrumental(track_ms, 45_000, 16_000),
    };
    let policy = EditPolicy {
        full_intro_beats: 16,
        ..EditPolicy::v2()
    };

    let batch = synthesize_edits(&stems, Some(120.0), &policy).unwrap();
    let intro = batch
        .edits
        .iter()
        .find(|e| e.name == "Intro")
        .expect("Intro edit rendered");

    let expected = grid.span_ms(16) + (track_ms - grid.span_ms(16)) + grid.span_ms(32)
        - policy.seam_fade_ms;
    let got = intro.audio.duration_ms() as i64;
    assert!(
        (got - expected as i64).abs() <= 5,
        "expected ~{} ms, got {} ms",
        expected,
        got
    );
}

#[test]
fn test_full_batch_renders_all_recipes() {
    let stems = StemSet {
        original: tone(180_000, 0.8, 220.0),
        vocals: tone(180_000, 0.4, 440.0),
        instrumental: spiked_instrumental(180_000, 45_000, 16_000),
    };
    let batch = synthesize_edits(&stems, Some(120.0), &EditPolicy::v2()).unwrap();
    assert_eq!(batch.edits.len(), 13);
    assert!(batch.failures.is_empty());

    // Every rendered edit is non-empty, finite audio
    for edit in &batch.edits {
        assert!(!edit.audio.is_empty(), "'{}' is empty", edit.name);
        assert!(edit.audio.is_valid(), "'{}' has bad samples", edit.name);
    }
}

// === Vocal gating ===

#[test]
fn test_near_silent_vocals_suppress_acapella_edits() {
    // Vocal stem at -50 dBFS RMS: separation residue of an instrumental
    let quiet = 10f32.powf(-50.0 / 20.0) * std::f32::consts::SQRT_2;
    let stems = StemSet {
        original: tone(180_000, 0.8, 220.0),
        vocals: tone(180_000, quiet, 440.0),
        instrumental: spiked_instrumental(180_000, 45_000, 16_000),
    };

    let batch = synthesize_edits(&stems, Some(120.0), &EditPolicy::v2()).unwrap();
    let names: Vec<_> = batch.edits.iter().map(|e| e.name.as_str()).collect();

    assert!(!names.contains(&"Acapella"));
    assert!(!names.contains(&"Acap In"));
    assert!(!names.contains(&"Short Acap Out"));
    assert!(names.contains(&"Main"));
    assert!(names.contains(&"Instrumental"));
    assert!(names.contains(&"Slam"));
}

// === Clap loop timing through the public API ===

#[test]
fn test_backbeat_loop_has_eight_onsets_in_sixteen_beats() {
    let grid = TempoGrid::new(120.0).unwrap();
    let placement = ClapPlacement::backbeat();
    let loop_buf = build_clap_loop(&grid, 16, &placement, 2, 44_100, None);

    let expected: Vec<u32> = vec![1, 3, 5, 7, 9, 11, 13, 15];
    assert_eq!(placement.positions(16), expected);

    for beat in expected {
        let at = grid.offset_ms(beat);
        // Onset energy within ±1 ms of the expected offset
        let onset = loop_buf.slice_ms(at, at + 1);
        assert!(
            onset.peak_db() > -30.0,
            "no onset at beat {} ({} ms)",
            beat,
            at
        );
        let before = loop_buf.slice_ms(at.saturating_sub(5), at.saturating_sub(4));
        assert_eq!(
            before.peak_db(),
            f32::NEG_INFINITY,
            "energy before the onset at beat {}",
            beat
        );
    }
}

// === Degenerate inputs ===

#[test]
fn test_short_track_still_produces_edits() {
    // 20s track: shorter than one 32-beat window at 60 BPM; the drop
    // degenerates to the start and every recipe clamps instead of failing
    let stems = StemSet {
        original: tone(20_000, 0.8, 220.0),
        vocals: tone(20_000, 0.4, 440.0),
        instrumental: tone(20_000, 0.6, 110.0),
    };
    let batch = synthesize_edits(&stems, Some(60.0), &EditPolicy::v2()).unwrap();
    assert!(batch.failures.is_empty());
    assert_eq!(batch.edits.len(), 13);
}

#[test]
fn test_drop_window_invariant_on_odd_tempo() {
    let grid = TempoGrid::new(93.7).unwrap();
    let instrumental = spiked_instrumental(150_000, 100_000, 20_000);
    let drop: DropWindow = locate_drop(&instrumental, &grid);
    assert_eq!(drop.length_beats, DROP_BEATS);
    assert!(drop.end_ms(&grid) <= instrumental.duration_ms());
}
