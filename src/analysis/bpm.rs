//! BPM resolution
//!
//! Tempo comes from track metadata supplied by the caller; signal-analysis
//! detection proved unreliable enough that a missing BPM now means "skip the
//! beat-dependent recipes" rather than guessing. The trait keeps a detector
//! backend pluggable.

use crate::error::Result;

/// Tempo resolution backend
pub trait BpmSource: Send + Sync {
    /// Resolve the tempo for a track, or `None` when no BPM is available
    fn resolve(&self) -> Result<Option<f64>>;

    /// Name of this source (for logging)
    fn name(&self) -> &'static str;
}

/// BPM taken from caller-supplied metadata only
pub struct MetadataBpm {
    bpm: Option<f64>,
}

impl MetadataBpm {
    pub fn new(bpm: Option<f64>) -> Self {
        Self { bpm }
    }
}

impl BpmSource for MetadataBpm {
    fn resolve(&self) -> Result<Option<f64>> {
        Ok(self.bpm)
    }

    fn name(&self) -> &'static str {
        "metadata"
    }
}
