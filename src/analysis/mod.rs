//! Track Analysis Module
//!
//! - Drop location (highest-energy 32-beat window)
//! - Vocal presence classification
//! - BPM resolution

pub mod bpm;
pub mod drop;
pub mod vocals;

pub use bpm::{BpmSource, MetadataBpm};
pub use drop::{locate_drop, DropWindow, DROP_BEATS};
pub use vocals::{has_vocals, SILENCE_THRESHOLD_DB};
