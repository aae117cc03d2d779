//! Drop Locator
//!
//! Finds the highest-energy 32-beat window of the instrumental stem, used
//! as the climactic anchor point for every beat-dependent edit recipe.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::engine::{AudioBuffer, TempoGrid};

/// Fixed drop window length in beats
pub const DROP_BEATS: u32 = 32;

/// Skip this much leading audio before scanning (intros bias the search)
const ANALYSIS_SKIP_MS: u64 = 15_000;

/// Only skip the intro when the track is at least this long
const SKIP_MIN_TRACK_MS: u64 = 45_000;

/// Highest-energy beat-aligned region of the instrumental
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropWindow {
    /// Window start, milliseconds from track start
    pub start_ms: u64,
    /// Window length in beats (fixed at [`DROP_BEATS`])
    pub length_beats: u32,
}

impl DropWindow {
    /// Window end in milliseconds for the given grid
    pub fn end_ms(&self, grid: &TempoGrid) -> u64 {
        self.start_ms + grid.span_ms(self.length_beats)
    }
}

/// Locate the drop in an instrumental stem
///
/// Slides a 32-beat window over a mono downmix in 1-beat steps, maximizing
/// the sum of squared sample amplitudes. Ties resolve to the earliest
/// position. The first 15 seconds are excluded from the scan when the track
/// is longer than 45 seconds. If the analyzable region is shorter than one
/// window the degenerate answer is `start_ms = 0`.
///
/// Raw energy rather than perceptual loudness: drops are sustained high
/// amplitude across dense layers, which the sum of squares captures cheaply.
pub fn locate_drop(instrumental: &AudioBuffer, grid: &TempoGrid) -> DropWindow {
    // Mono downmix for analysis only; output slicing uses the original
    let mono = instrumental.to_mono();
    let rate = mono.sample_rate() as f64;

    let skip_ms = if mono.duration_ms() > SKIP_MIN_TRACK_MS {
        ANALYSIS_SKIP_MS
    } else {
        0
    };

    let window_ms = grid.span_ms(DROP_BEATS);
    let skip_frames = mono.ms_to_frames(skip_ms);
    let window_frames = mono.ms_to_frames(window_ms);
    let step_frames = mono.ms_to_frames(grid.span_ms(1)).max(1);

    let analysis = &mono.samples()[skip_frames.min(mono.samples().len())..];
    if analysis.len() < window_frames || window_frames == 0 {
        debug!(
            "drop scan degenerate: {} analysis frames < {} window frames",
            analysis.len(),
            window_frames
        );
        return DropWindow {
            start_ms: 0,
            length_beats: DROP_BEATS,
        };
    }

    // Prefix sums of squared amplitude make each window an O(1) lookup
    let mut prefix = Vec::with_capacity(analysis.len() + 1);
    let mut acc = 0.0f64;
    prefix.push(0.0);
    for &s in analysis {
        acc += (s as f64) * (s as f64);
        prefix.push(acc);
    }

    let mut best_start = 0usize;
    let mut max_energy = f64::NEG_INFINITY;
    let mut i = 0usize;
    while i + window_frames <= analysis.len() {
        let energy = prefix[i + window_frames] - prefix[i];
        // Strictly greater keeps the earliest position on ties
        if energy > max_energy {
            max_energy = energy;
            best_start = i;
        }
        i += step_frames;
    }

    let mut start_ms = (best_start as f64 * 1000.0 / rate) as u64 + skip_ms;
    // Frame/ms truncation can land the window end a hair past the buffer
    let track_ms = instrumental.duration_ms();
    if start_ms + window_ms > track_ms {
        start_ms = track_ms.saturating_sub(window_ms);
    }

    debug!(
        "drop located at {} ms (energy {:.3e}, window {} ms)",
        start_ms, max_energy, window_ms
    );

    DropWindow {
        start_ms,
        length_beats: DROP_BEATS,
    }
}
