//! CLI Command Implementations

use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::analysis::{BpmSource, MetadataBpm};
use crate::engine::{export_audio, import_audio, ExportFormat};
use crate::error::Result;
use crate::orchestrator::synthesize_edits;
use crate::recipes::{EditPolicy, StemSet};
use crate::separate::{DemucsOptions, DemucsSeparator, StemSeparator};

/// Render every applicable edit for a track with pre-separated stems.
pub fn process(
    original: &Path,
    vocals: &Path,
    instrumental: &Path,
    bpm: Option<f64>,
    out_dir: &Path,
    policy_path: Option<&Path>,
) -> Result<()> {
    let policy = match policy_path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        }
        None => EditPolicy::v2(),
    };
    info!("using recipe policy '{}'", policy.version);

    let stems = StemSet {
        original: import_audio(original)?,
        vocals: import_audio(vocals)?,
        instrumental: import_audio(instrumental)?,
    };

    // Tempo comes from metadata only; a missing BPM skips the beat grid
    let source = MetadataBpm::new(bpm);
    let bpm = source.resolve()?;
    if bpm.is_none() {
        info!("no BPM from source '{}'", source.name());
    }

    let batch = synthesize_edits(&stems, bpm, &policy)?;

    fs::create_dir_all(out_dir)?;
    for edit in &batch.edits {
        let file_name = format!("{}.wav", edit.name.replace(' ', "_"));
        let path = out_dir.join(file_name);
        export_audio(&edit.audio, &path, ExportFormat::default())?;
        println!("Wrote {}", path.display());
    }

    for failure in &batch.failures {
        warn!("'{}' failed: {}", failure.name, failure.error);
    }
    for name in &batch.skipped {
        println!("Skipped {}", name);
    }
    println!(
        "{} edits written, {} failed, {} skipped",
        batch.edits.len(),
        batch.failures.len(),
        batch.skipped.len()
    );

    Ok(())
}

/// Run stem separation on an original file.
pub fn separate(input: &Path, out_dir: &Path, model: &str) -> Result<()> {
    let separator = DemucsSeparator::new(DemucsOptions {
        model: model.to_string(),
        ..DemucsOptions::default()
    });
    info!("separating with backend '{}'", separator.name());

    let stems = separator.separate(input, out_dir)?;
    println!("Vocals:       {}", stems.vocals.display());
    println!("Instrumental: {}", stems.instrumental.display());
    Ok(())
}
