//! Edit Orchestrator
//!
//! Runs the full per-track pipeline: resolve tempo, locate the drop,
//! classify vocal presence, then render every applicable recipe. Recipe
//! failures are isolated per recipe; only engine-level problems (no usable
//! stems, invalid tempo) abort the whole track.

use log::{info, warn};

use crate::analysis::{has_vocals, locate_drop, DropWindow, DROP_BEATS};
use crate::engine::TempoGrid;
use crate::error::{DropforgeError, Result};
use crate::recipes::{recipe_set, EditPolicy, EditResult, RecipeInputs, StemSet};
use crate::synth::{build_clap_loop, generate_fx_hit};

/// One recipe that did not render
#[derive(Debug)]
pub struct RecipeFailure {
    pub name: String,
    pub error: DropforgeError,
}

/// The outcome of one track: rendered edits plus per-recipe failures
///
/// A batch can partially succeed; callers export `edits` and report
/// `failures` and `skipped` without retrying anything here.
#[derive(Debug, Default)]
pub struct EditBatch {
    pub edits: Vec<EditResult>,
    pub failures: Vec<RecipeFailure>,
    /// Recipes not attempted (no tempo grid, or no audible vocals)
    pub skipped: Vec<String>,
}

/// Synthesize all applicable edits for one track
///
/// `bpm == None` means no tempo metadata exists; beat-dependent recipes are
/// skipped rather than run on a guessed grid. `Some(bpm)` with a degenerate
/// value is an error, never silently treated as zero.
pub fn synthesize_edits(
    stems: &StemSet,
    bpm: Option<f64>,
    policy: &EditPolicy,
) -> Result<EditBatch> {
    stems.validate()?;

    let grid = match bpm {
        Some(value) => Some(TempoGrid::new(value)?),
        None => {
            info!("no BPM metadata; beat-dependent recipes will be skipped");
            None
        }
    };

    let vocals_present = has_vocals(&stems.vocals);

    let (work_grid, drop, clap_loop, fx_hit) = match grid {
        Some(grid) => {
            let drop = locate_drop(&stems.instrumental, &grid);
            info!(
                "drop window at {} ms ({} beats at {:.1} BPM)",
                drop.start_ms,
                drop.length_beats,
                grid.bpm()
            );
            let clap_loop = build_clap_loop(
                &grid,
                policy.intro_beats,
                &policy.clap_placement,
                stems.channels(),
                stems.sample_rate(),
                policy.clap_sample.as_deref(),
            );
            let fx_hit = generate_fx_hit(policy.fx_hit_ms, stems.channels(), stems.sample_rate());
            (grid, drop, clap_loop, fx_hit)
        }
        None => {
            // Placeholder inputs: only recipes with `needs_grid == false`
            // run in this branch, and those never read the grid, the drop
            // window, or the synthesized elements.
            let grid = TempoGrid::new(120.0)?;
            let drop = DropWindow {
                start_ms: 0,
                length_beats: DROP_BEATS,
            };
            let silent = crate::engine::AudioBuffer::silent(0, stems.channels(), stems.sample_rate());
            (grid, drop, silent.clone(), silent)
        }
    };

    let inputs = RecipeInputs {
        stems,
        grid: work_grid,
        drop,
        clap_loop,
        fx_hit,
        policy,
    };

    let mut batch = EditBatch::default();
    for recipe in recipe_set() {
        if recipe.needs_grid && grid.is_none() {
            batch.skipped.push(recipe.name.to_string());
            continue;
        }
        if recipe.needs_vocals && !vocals_present {
            info!("skipping '{}': vocal stem is near-silence", recipe.name);
            batch.skipped.push(recipe.name.to_string());
            continue;
        }
        match (recipe.func)(&inputs) {
            Ok(audio) => batch.edits.push(EditResult {
                name: recipe.name.to_string(),
                audio,
            }),
            Err(error) => {
                warn!("recipe '{}' failed: {}", recipe.name, error);
                batch.failures.push(RecipeFailure {
                    name: recipe.name.to_string(),
                    error,
                });
            }
        }
    }

    info!(
        "rendered {} edits ({} failed, {} skipped)",
        batch.edits.len(),
        batch.failures.len(),
        batch.skipped.len()
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioBuffer;

    fn tone_buffer(duration_ms: u64, amp: f32) -> AudioBuffer {
        let rate = 44_100u32;
        let frames = (duration_ms as f64 * rate as f64 / 1000.0) as usize;
        let samples: Vec<f32> = (0..frames)
            .map(|i| {
                let t = i as f32 / rate as f32;
                amp * (2.0 * std::f32::consts::PI * 220.0 * t).sin()
            })
            .collect();
        AudioBuffer::from_interleaved(samples, 1, rate).unwrap()
    }

    fn stems(vocal_amp: f32) -> StemSet {
        StemSet {
            original: tone_buffer(90_000, 0.8),
            vocals: tone_buffer(90_000, vocal_amp),
            instrumental: tone_buffer(90_000, 0.6),
        }
    }

    #[test]
    fn test_full_batch_with_vocals() {
        let batch = synthesize_edits(&stems(0.4), Some(120.0), &EditPolicy::v2()).unwrap();
        assert_eq!(batch.edits.len(), 13);
        assert!(batch.failures.is_empty());
        assert!(batch.skipped.is_empty());
    }

    #[test]
    fn test_no_bpm_skips_beat_recipes() {
        let batch = synthesize_edits(&stems(0.4), None, &EditPolicy::v2()).unwrap();
        let names: Vec<_> = batch.edits.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Main", "Acapella", "Instrumental"]);
        assert_eq!(batch.skipped.len(), 10);
    }

    #[test]
    fn test_instrumental_track_gates_acapella() {
        // -50 dBFS vocal residue: no acapella-type edits, the rest render
        let quiet = crate::engine::db_to_linear(-50.0);
        let batch = synthesize_edits(&stems(quiet), Some(120.0), &EditPolicy::v2()).unwrap();
        let names: Vec<_> = batch.edits.iter().map(|e| e.name.as_str()).collect();
        assert!(!names.contains(&"Acapella"));
        assert!(!names.contains(&"Acap In"));
        assert!(names.contains(&"Main"));
        assert!(names.contains(&"Instrumental"));
        assert!(names.contains(&"Clap In"));
        assert!(batch.skipped.contains(&"Acapella".to_string()));
    }

    #[test]
    fn test_degenerate_bpm_aborts() {
        let err = synthesize_edits(&stems(0.4), Some(0.0), &EditPolicy::v2()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TEMPO");
    }

    #[test]
    fn test_empty_stems_abort() {
        let empty = StemSet {
            original: AudioBuffer::silent(0, 1, 44100),
            vocals: AudioBuffer::silent(0, 1, 44100),
            instrumental: AudioBuffer::silent(0, 1, 44100),
        };
        let err = synthesize_edits(&empty, Some(120.0), &EditPolicy::v2()).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_AUDIO");
    }

    #[test]
    fn test_mismatched_rates_abort() {
        let mixed = StemSet {
            original: tone_buffer(30_000, 0.8),
            vocals: AudioBuffer::silent(30_000, 1, 48000),
            instrumental: tone_buffer(30_000, 0.6),
        };
        let err = synthesize_edits(&mixed, Some(120.0), &EditPolicy::v2()).unwrap_err();
        assert_eq!(err.error_code(), "BUFFER_MISMATCH");
    }
}
