//! Edit Recipe Library
//!
//! Each recipe composes one finished audio variant from the original mix,
//! the two stems, the located drop window, and synthesized percussion/FX.
//! Recipes are pure over their inputs and always return a new buffer.
//!
//! Two seam rules apply throughout:
//! - Entries into the original mix at the drop start one beat early and
//!   crossfade over that beat, so a vocal pickup (anacrusis) straddling the
//!   boundary is kept instead of truncated.
//! - Every other structural join gets a short fixed crossfade for click
//!   suppression.

use std::path::PathBuf;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::analysis::DropWindow;
use crate::engine::{AudioBuffer, TempoGrid, SEAM_FADE_MS};
use crate::error::{DropforgeError, Result};
use crate::synth::ClapPlacement;

// ============================================================================
// Input types
// ============================================================================

/// The three aligned renditions of one track
///
/// Stems may carry slightly different trailing silence; every slice clamps
/// to the buffer it reads from, and nothing pads with silence (padding would
/// shift later beat-grid math).
#[derive(Debug, Clone)]
pub struct StemSet {
    pub original: AudioBuffer,
    pub vocals: AudioBuffer,
    pub instrumental: AudioBuffer,
}

impl StemSet {
    /// Validate the set is usable at all: non-empty, one rate, one layout
    pub fn validate(&self) -> Result<()> {
        if self.original.is_empty() || self.vocals.is_empty() || self.instrumental.is_empty() {
            return Err(DropforgeError::EmptyAudio);
        }
        let same = |a: &AudioBuffer, b: &AudioBuffer| {
            a.sample_rate() == b.sample_rate() && a.channels() == b.channels()
        };
        if !same(&self.original, &self.vocals) || !same(&self.original, &self.instrumental) {
            return Err(DropforgeError::BufferMismatch {
                reason: "original/vocals/instrumental disagree on sample rate or channels"
                    .to_string(),
            });
        }
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.original.sample_rate()
    }

    pub fn channels(&self) -> u16 {
        self.original.channels()
    }
}

/// One finished edit: a name and its audio
#[derive(Debug, Clone)]
pub struct EditResult {
    pub name: String,
    pub audio: AudioBuffer,
}

// ============================================================================
// Policy
// ============================================================================

fn default_seam_fade() -> u64 {
    SEAM_FADE_MS
}

/// Tunable parameters of the recipe set
///
/// The intro/outro lengths, crossfade points, and clap placement have all
/// shifted between iterations of these edits; a policy value pins one
/// coherent combination so a recipe-set version is reproducible. `v2` is
/// canonical; `v1` preserves the earliest hard-cut behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditPolicy {
    /// Policy version tag, recorded for reproducibility
    pub version: String,
    /// Length of synthesized intros (claps / acapella), in beats
    pub intro_beats: u32,
    /// Length of the instrumental-only opening in the "Intro" edit, in beats
    pub full_intro_beats: u32,
    /// Length of the pre-drop break in shortened edits, in beats
    pub break_beats: u32,
    /// Length of the instrumental outro, in beats
    pub outro_beats: u32,
    /// How far before the drop the post-seam segment starts, in beats
    pub pickup_beats: u32,
    /// Crossfade at structural joins that are not drop entries, in ms
    #[serde(default = "default_seam_fade")]
    pub seam_fade_ms: u64,
    /// FX hit duration in ms
    pub fx_hit_ms: u64,
    /// Which beats of the clap loop receive a clap
    pub clap_placement: ClapPlacement,
    /// Optional bundled clap sample
    #[serde(default)]
    pub clap_sample: Option<PathBuf>,
}

impl EditPolicy {
    /// Canonical policy: backbeat claps, 1-beat pickup crossfades, 50 ms
    /// seam fades
    pub fn v2() -> Self {
        EditPolicy {
            version: "v2".to_string(),
            intro_beats: 16,
            full_intro_beats: 32,
            break_beats: 16,
            outro_beats: 32,
            pickup_beats: 1,
            seam_fade_ms: SEAM_FADE_MS,
            fx_hit_ms: 1000,
            clap_placement: ClapPlacement::backbeat(),
            clap_sample: None,
        }
    }

    /// Historical policy: claps on every beat, hard cuts at every seam
    pub fn v1() -> Self {
        EditPolicy {
            version: "v1".to_string(),
            pickup_beats: 0,
            seam_fade_ms: 0,
            clap_placement: ClapPlacement::EveryBeat,
            ..Self::v2()
        }
    }
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self::v2()
    }
}

// ============================================================================
// Recipe inputs
// ============================================================================

/// Everything a recipe consumes, assembled once per track
pub struct RecipeInputs<'a> {
    pub stems: &'a StemSet,
    pub grid: TempoGrid,
    pub drop: DropWindow,
    pub clap_loop: AudioBuffer,
    pub fx_hit: AudioBuffer,
    pub policy: &'a EditPolicy,
}

impl<'a> RecipeInputs<'a> {
    fn beat(&self, n: u32) -> u64 {
        self.grid.span_ms(n)
    }

    /// Beat-exact slice with degradation logging
    ///
    /// A slice clamped by the buffer end is still usable (a shorter export
    /// beats no export), but it must not pass for a full-length result
    /// silently.
    fn slice_beats(&self, buf: &AudioBuffer, start_ms: u64, beats: u32, what: &str) -> AudioBuffer {
        let requested = self.beat(beats);
        let out = buf.slice_ms(start_ms, start_ms + requested);
        // One beat-boundary's worth of truncation slack
        if out.duration_ms() + 2 < requested {
            warn!(
                "{}: requested {} beats ({} ms) from {} ms, got {} ms (clamped)",
                what,
                beats,
                requested,
                start_ms,
                out.duration_ms()
            );
        }
        out
    }

    /// The drop window of the vocal stem
    fn drop_vocals(&self) -> AudioBuffer {
        self.slice_beats(
            &self.stems.vocals,
            self.drop.start_ms,
            self.drop.length_beats,
            "drop vocals",
        )
    }

    /// DJ-mixable tail: the drop's instrumental, reused as outro
    fn outro(&self) -> AudioBuffer {
        self.slice_beats(
            &self.stems.instrumental,
            self.drop.start_ms,
            self.policy.outro_beats,
            "instrumental outro",
        )
    }

    /// Original mix immediately preceding the drop
    fn break_segment(&self) -> AudioBuffer {
        let break_ms = self.beat(self.policy.break_beats);
        let start = self.drop.start_ms.saturating_sub(break_ms);
        self.stems.original.slice_ms(start, self.drop.start_ms)
    }

    /// Claps overlaid on the drop's first `intro_beats` instrumental beats
    fn clap_in_section(&self) -> Result<AudioBuffer> {
        let bed = self.slice_beats(
            &self.stems.instrumental,
            self.drop.start_ms,
            self.policy.intro_beats,
            "clap bed",
        );
        bed.overlay(&self.clap_loop)
    }

    /// Append the original mix from the drop, honoring the pickup rule
    ///
    /// The post-seam segment starts `pickup_beats` before the nominal drop
    /// boundary and crossfades over that span, so an early vocal onset
    /// survives the seam. With `pickup_beats = 0` this degrades to the
    /// short seam fade.
    fn enter_at_drop(&self, intro: &AudioBuffer) -> Result<AudioBuffer> {
        let pickup_ms = self.beat(self.policy.pickup_beats);
        let (start, overlap) = if pickup_ms > 0 {
            (self.drop.start_ms.saturating_sub(pickup_ms), pickup_ms)
        } else {
            (self.drop.start_ms, self.policy.seam_fade_ms)
        };
        let body = self.stems.original.slice_from_ms(start);
        intro.append_crossfade(&body, overlap)
    }

    /// Structural join at a non-drop seam
    fn join(&self, a: AudioBuffer, b: &AudioBuffer) -> Result<AudioBuffer> {
        a.append_crossfade(b, self.policy.seam_fade_ms)
    }

    /// One drop's worth of the original mix, entered with the pickup rule
    fn drop_body(&self, lead_in: AudioBuffer) -> Result<AudioBuffer> {
        let pickup_ms = self.beat(self.policy.pickup_beats);
        let drop_len = self.beat(self.drop.length_beats);
        let (start, overlap) = if pickup_ms > 0 {
            (self.drop.start_ms.saturating_sub(pickup_ms), pickup_ms)
        } else {
            (self.drop.start_ms, self.policy.seam_fade_ms)
        };
        let body = self
            .stems
            .original
            .slice_ms(start, self.drop.start_ms + drop_len);
        lead_in.append_crossfade(&body, overlap)
    }
}

fn finish(name: &str, audio: AudioBuffer) -> Result<AudioBuffer> {
    if audio.is_empty() {
        return Err(DropforgeError::InsufficientAudio {
            requested_ms: 1,
            available_ms: 0,
        });
    }
    log::debug!("recipe '{}' rendered {} ms", name, audio.duration_ms());
    Ok(audio)
}

// ============================================================================
// Recipes
// ============================================================================

/// The unmodified original mix, re-exported for consistent tagging
pub fn main_mix(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    finish("Main", inputs.stems.original.clone())
}

/// The vocal stem alone
pub fn acapella(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    finish("Acapella", inputs.stems.vocals.clone())
}

/// The instrumental stem alone
pub fn instrumental(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    finish("Instrumental", inputs.stems.instrumental.clone())
}

/// Clap loop over the drop instrumental, into the mix at the drop, outro
pub fn clap_in(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    let section = inputs.clap_in_section()?;
    let body = inputs.enter_at_drop(&section)?;
    finish("Clap In", inputs.join(body, &inputs.outro())?)
}

/// Drop vocal alone as the intro, into the mix at the drop, outro
pub fn acap_in(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    let intro = inputs
        .drop_vocals()
        .slice_ms(0, inputs.beat(inputs.policy.intro_beats));
    let body = inputs.enter_at_drop(&intro)?;
    finish("Acap In", inputs.join(body, &inputs.outro())?)
}

/// Full original followed by the drop vocal as an acapella outro
pub fn acap_out(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    let out = inputs.join(inputs.stems.original.clone(), &inputs.drop_vocals())?;
    finish("Acap Out", out)
}

/// Instrumental-only opening, then the original with its structure intact
pub fn intro(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    let open_beats = inputs.policy.full_intro_beats;
    let opening = inputs.slice_beats(&inputs.stems.instrumental, 0, open_beats, "intro opening");

    // The vocal entry at the end of the opening gets the same pickup
    // treatment as a drop entry
    let pickup_ms = inputs.beat(inputs.policy.pickup_beats);
    let nominal = inputs.beat(open_beats);
    let (resume, overlap) = if pickup_ms > 0 {
        (nominal.saturating_sub(pickup_ms), pickup_ms)
    } else {
        (nominal, inputs.policy.seam_fade_ms)
    };
    let body = opening.append_crossfade(&inputs.stems.original.slice_from_ms(resume), overlap)?;
    finish("Intro", inputs.join(body, &inputs.outro())?)
}

/// Short instrumental intro, one break, one drop, outro
pub fn short(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    let opening = inputs.slice_beats(
        &inputs.stems.instrumental,
        0,
        inputs.policy.intro_beats,
        "short opening",
    );
    let lead = inputs.join(opening, &inputs.break_segment())?;
    let body = inputs.drop_body(lead)?;
    finish("Short", inputs.join(body, &inputs.outro())?)
}

/// Acapella intro, one break, one drop, outro
pub fn short_acap_in(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    let intro = inputs
        .drop_vocals()
        .slice_ms(0, inputs.beat(inputs.policy.intro_beats));
    let lead = inputs.join(intro, &inputs.break_segment())?;
    let body = inputs.drop_body(lead)?;
    finish("Short Acap In", inputs.join(body, &inputs.outro())?)
}

/// Clap-in section, one break, one drop, outro
pub fn short_clap_in(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    let section = inputs.clap_in_section()?;
    let lead = inputs.join(section, &inputs.break_segment())?;
    let body = inputs.drop_body(lead)?;
    finish("Short Clap In", inputs.join(body, &inputs.outro())?)
}

/// Acapella intro, the whole original, acapella outro
pub fn acap_in_acap_out(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    let intro = inputs
        .drop_vocals()
        .slice_ms(0, inputs.beat(inputs.policy.intro_beats));
    let body = inputs.join(intro, &inputs.stems.original)?;
    finish("Acap In Acap Out", inputs.join(body, &inputs.drop_vocals())?)
}

/// Single FX hit straight into the drop, outro
pub fn slam(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    let body = inputs.enter_at_drop(&inputs.fx_hit)?;
    finish("Slam", inputs.join(body, &inputs.outro())?)
}

/// One break, one drop, acapella outro
pub fn short_acap_out(inputs: &RecipeInputs) -> Result<AudioBuffer> {
    let body = inputs.drop_body(inputs.break_segment())?;
    finish("Short Acap Out", inputs.join(body, &inputs.drop_vocals())?)
}

// ============================================================================
// Recipe registry
// ============================================================================

/// A recipe composition function
pub type RecipeFn = fn(&RecipeInputs) -> Result<AudioBuffer>;

/// A named recipe plus the preconditions gating it
pub struct Recipe {
    pub name: &'static str,
    /// Requires a resolved tempo grid and drop window
    pub needs_grid: bool,
    /// Only meaningful when the vocal stem carries audible signal
    pub needs_vocals: bool,
    pub func: RecipeFn,
}

/// The canonical recipe set, in export order
pub fn recipe_set() -> Vec<Recipe> {
    vec![
        Recipe {
            name: "Main",
            needs_grid: false,
            needs_vocals: false,
            func: main_mix,
        },
        Recipe {
            name: "Acapella",
            needs_grid: false,
            needs_vocals: true,
            func: acapella,
        },
        Recipe {
            name: "Instrumental",
            needs_grid: false,
            needs_vocals: false,
            func: instrumental,
        },
        Recipe {
            name: "Clap In",
            needs_grid: true,
            needs_vocals: false,
            func: clap_in,
        },
        Recipe {
            name: "Acap In",
            needs_grid: true,
            needs_vocals: true,
            func: acap_in,
        },
        Recipe {
            name: "Acap Out",
            needs_grid: true,
            needs_vocals: true,
            func: acap_out,
        },
        Recipe {
            name: "Intro",
            needs_grid: true,
            needs_vocals: false,
            func: intro,
        },
        Recipe {
            name: "Short",
            needs_grid: true,
            needs_vocals: false,
            func: short,
        },
        Recipe {
            name: "Short Acap In",
            needs_grid: true,
            needs_vocals: true,
            func: short_acap_in,
        },
        Recipe {
            name: "Short Clap In",
            needs_grid: true,
            needs_vocals: false,
            func: short_clap_in,
        },
        Recipe {
            name: "Acap In Acap Out",
            needs_grid: true,
            needs_vocals: true,
            func: acap_in_acap_out,
        },
        Recipe {
            name: "Slam",
            needs_grid: true,
            needs_vocals: false,
            func: slam,
        },
        Recipe {
            name: "Short Acap Out",
            needs_grid: true,
            needs_vocals: true,
            func: short_acap_out,
        },
    ]
}
