//! CLI Module
//!
//! Command-line interface for the Dropforge edit engine.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dropforge - beat-synchronized DJ edit synthesis
#[derive(Parser, Debug)]
#[command(name = "dropforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize all edits for a track with pre-separated stems
    #[command(name = "process")]
    Process {
        /// Original mix (WAV)
        original: PathBuf,

        /// Vocal stem (WAV)
        #[arg(long)]
        vocals: PathBuf,

        /// Instrumental stem (WAV)
        #[arg(long)]
        instrumental: PathBuf,

        /// Track tempo from metadata; omit to skip beat-dependent edits
        #[arg(long)]
        bpm: Option<f64>,

        /// Output directory for the rendered WAV files
        #[arg(short, long, default_value = "edits")]
        out_dir: PathBuf,

        /// Recipe policy file (JSON); defaults to the v2 policy
        #[arg(long)]
        policy: Option<PathBuf>,
    },

    /// Run stem separation on an original file
    #[command(name = "separate")]
    Separate {
        /// Input audio file
        input: PathBuf,

        /// Output directory for the stem files
        #[arg(short, long, default_value = "output")]
        out_dir: PathBuf,

        /// Demucs model name
        #[arg(long, default_value = "htdemucs")]
        model: String,
    },
}
