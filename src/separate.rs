//! Stem separation
//!
//! The separation tool is an external collaborator: given an original file
//! it eventually produces two sibling audio files, vocals and instrumental,
//! of approximately the original's duration, or fails with a non-zero exit
//! status. Nothing here inspects the model; the trait keeps backends
//! swappable.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{DropforgeError, Result};

/// File paths produced by a separation run
#[derive(Debug, Clone)]
pub struct StemPaths {
    pub vocals: PathBuf,
    pub instrumental: PathBuf,
}

/// Stem separation backend
pub trait StemSeparator: Send + Sync {
    /// Separate `input` into vocal and instrumental files under `output_dir`
    fn separate(&self, input: &Path, output_dir: &Path) -> Result<StemPaths>;

    /// Name of this separator (for logging)
    fn name(&self) -> &'static str;
}

/// Options for the Demucs subprocess runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemucsOptions {
    /// Model name passed to `-n`
    pub model: String,
    /// Worker threads passed to `-j`
    pub jobs: u32,
    /// MP3 bitrate for the stem files
    pub mp3_bitrate: u32,
}

impl Default for DemucsOptions {
    fn default() -> Self {
        DemucsOptions {
            model: "htdemucs".to_string(),
            jobs: 4,
            mp3_bitrate: 320,
        }
    }
}

/// Runs Demucs two-stem separation as a subprocess
pub struct DemucsSeparator {
    options: DemucsOptions,
}

impl DemucsSeparator {
    pub fn new(options: DemucsOptions) -> Self {
        Self { options }
    }
}

impl StemSeparator for DemucsSeparator {
    fn separate(&self, input: &Path, output_dir: &Path) -> Result<StemPaths> {
        if !input.exists() {
            return Err(DropforgeError::FileNotFound {
                path: input.display().to_string(),
            });
        }

        info!(
            "running demucs ({}) on {}",
            self.options.model,
            input.display()
        );

        let status = Command::new("python3")
            .arg("-m")
            .arg("demucs")
            .arg("--two-stems=vocals")
            .arg("-n")
            .arg(&self.options.model)
            .arg("--mp3")
            .arg("--mp3-bitrate")
            .arg(self.options.mp3_bitrate.to_string())
            .arg("-j")
            .arg(self.options.jobs.to_string())
            .arg("-o")
            .arg(output_dir)
            .arg(input)
            .status()?;

        if !status.success() {
            return Err(DropforgeError::SeparationFailed {
                reason: format!("demucs exited with status {}", status),
            });
        }

        // Demucs writes <out>/<model>/<track>/{vocals,no_vocals}.mp3
        let track = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem_dir = output_dir.join(&self.options.model).join(&track);
        let paths = StemPaths {
            vocals: stem_dir.join("vocals.mp3"),
            instrumental: stem_dir.join("no_vocals.mp3"),
        };

        if !paths.vocals.exists() || !paths.instrumental.exists() {
            return Err(DropforgeError::SeparationFailed {
                reason: format!("expected stem files missing under {}", stem_dir.display()),
            });
        }

        Ok(paths)
    }

    fn name(&self) -> &'static str {
        "demucs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_is_reported() {
        let sep = DemucsSeparator::new(DemucsOptions::default());
        let err = sep
            .separate(Path::new("/nonexistent/track.mp3"), Path::new("/tmp"))
            .unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_default_options() {
        let opts = DemucsOptions::default();
        assert_eq!(opts.model, "htdemucs");
        assert_eq!(opts.mp3_bitrate, 320);
    }
}
