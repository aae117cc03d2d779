//! Audio Engine Module
//!
//! Core building blocks for edit synthesis:
//! - Audio buffer type and composition operations
//! - Tempo grid arithmetic
//! - WAV file I/O

pub mod buffer;
pub mod grid;
pub mod io;

pub use buffer::{db_to_linear, linear_to_db, AudioBuffer, DEFAULT_SAMPLE_RATE, SEAM_FADE_MS};
pub use grid::TempoGrid;
pub use io::{export_audio, generate_test_tone, import_audio, ExportFormat};
