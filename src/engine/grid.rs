//! Tempo Grid
//!
//! Converts a BPM into millisecond offsets for arbitrary beat counts.
//! Every boundary is computed from the absolute beat index so that chained
//! sections (e.g. 64-beat spans) never accumulate rounding drift.

use serde::{Deserialize, Serialize};

use crate::error::{DropforgeError, Result};

/// Beat grid derived from a track's tempo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoGrid {
    bpm: f64,
    beat_ms: f64,
}

impl TempoGrid {
    /// Create a grid from a BPM value
    ///
    /// # Errors
    /// `InvalidTempo` if `bpm` is zero, negative, or not finite.
    pub fn new(bpm: f64) -> Result<Self> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(DropforgeError::InvalidTempo { bpm });
        }
        Ok(Self {
            bpm,
            beat_ms: 60_000.0 / bpm,
        })
    }

    /// Tempo in beats per minute
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of one beat in (fractional) milliseconds
    pub fn beat_ms(&self) -> f64 {
        self.beat_ms
    }

    /// Millisecond offset of beat `index`, truncated to integer
    pub fn offset_ms(&self, index: u32) -> u64 {
        (index as f64 * self.beat_ms) as u64
    }

    /// Millisecond span of `beats` consecutive beats, truncated to integer
    ///
    /// Identical arithmetic to [`offset_ms`](Self::offset_ms); the two names
    /// exist so call sites read as positions vs. lengths.
    pub fn span_ms(&self, beats: u32) -> u64 {
        self.offset_ms(beats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beat_ms() {
        let grid = TempoGrid::new(120.0).unwrap();
        assert_eq!(grid.beat_ms(), 500.0);
        assert_eq!(grid.span_ms(32), 16_000);
    }

    #[test]
    fn test_rejects_degenerate_bpm() {
        assert!(TempoGrid::new(0.0).is_err());
        assert!(TempoGrid::new(-128.0).is_err());
        assert!(TempoGrid::new(f64::NAN).is_err());
        assert!(TempoGrid::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_offsets_match_absolute_index() {
        // 174 BPM gives a non-integer beat_ms (344.827...); offsets must
        // come from index * beat_ms, not accumulated rounded deltas.
        let grid = TempoGrid::new(174.0).unwrap();
        for n in 0..256u32 {
            let expected = (n as f64 * 60_000.0 / 174.0) as u64;
            assert_eq!(grid.offset_ms(n), expected);
        }
    }

    #[test]
    fn test_offsets_strictly_monotonic() {
        let grid = TempoGrid::new(97.3).unwrap();
        let mut prev = grid.offset_ms(0);
        for n in 1..512u32 {
            let cur = grid.offset_ms(n);
            assert!(cur > prev, "offset not monotonic at beat {}", n);
            prev = cur;
        }
    }
}
