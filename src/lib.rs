//! Dropforge - Beat-Synchronized Edit Synthesis Engine
//!
//! Takes a song plus its separated vocal and instrumental stems and
//! synthesizes a family of beat-aligned DJ edit variants: clap intros,
//! acapella sections, slam openings, shortened single-drop cuts.
//!
//! # Architecture
//!
//! - `engine`: audio buffers, tempo grid, WAV I/O
//! - `analysis`: drop location, vocal presence, BPM resolution
//! - `synth`: procedural claps and FX hits on the beat grid
//! - `recipes`: the edit composition library and its policy knobs
//! - `orchestrator`: the per-track pipeline with per-recipe isolation
//! - `separate` / `jobs`: the external-collaborator seams (separation
//!   subprocess, worker queue, session state, artifact cleanup)

pub mod analysis;
pub mod cli;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod orchestrator;
pub mod recipes;
pub mod separate;
pub mod synth;

pub use error::{DropforgeError, Result};
pub use orchestrator::{synthesize_edits, EditBatch};
pub use recipes::{EditPolicy, EditResult, StemSet};
