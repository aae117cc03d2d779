//! Audio file I/O
//!
//! WAV import and export for the edit engine. Buffers keep their source
//! sample rate throughout; no resampling happens on import, because every
//! composition operation works on buffers from the same track (the stems
//! share the original's rate).

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::AudioBuffer;
use crate::error::{DropforgeError, Result};

/// Export bit depth configuration
#[derive(Debug, Clone, Copy)]
pub struct ExportFormat {
    /// Bit depth: 16, 24, or 32 (default: 16)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bit_depth: 16 }
    }
}

/// Import a WAV file as an interleaved float buffer
///
/// # Errors
/// * `FileNotFound` if the path does not exist
/// * `InvalidAudio` if the file is not a readable WAV
/// * `EmptyAudio` if the file holds no samples
pub fn import_audio(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(DropforgeError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = WavReader::open(path).map_err(|e| DropforgeError::InvalidAudio {
        reason: format!("failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let samples = read_samples_as_f32(&mut reader, spec)?;

    if samples.is_empty() {
        return Err(DropforgeError::EmptyAudio);
    }

    AudioBuffer::from_interleaved(samples, spec.channels, spec.sample_rate)
}

fn read_samples_as_f32(
    reader: &mut WavReader<std::io::BufReader<std::fs::File>>,
    spec: WavSpec,
) -> Result<Vec<f32>> {
    let map_err = |e: hound::Error| DropforgeError::InvalidAudio {
        reason: format!("failed to read WAV samples: {}", e),
        source: Some(Box::new(e)),
    };

    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map_err(map_err))
            .collect(),
        (SampleFormat::Int, bits) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale).map_err(map_err))
                .collect()
        }
        (format, bits) => Err(DropforgeError::InvalidAudio {
            reason: format!("unsupported WAV format: {:?} {}-bit", format, bits),
            source: None,
        }),
    }
}

/// Export an AudioBuffer to a WAV file
pub fn export_audio(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let io_err = |e: hound::Error| {
        DropforgeError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    };

    let mut writer = WavWriter::create(path, spec).map_err(io_err)?;

    match format.bit_depth {
        16 => {
            for &sample in buffer.samples() {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(io_err)?;
            }
        }
        24 => {
            for &sample in buffer.samples() {
                let scaled = (sample * 8_388_607.0).clamp(-8_388_608.0, 8_388_607.0) as i32;
                writer.write_sample(scaled).map_err(io_err)?;
            }
        }
        32 => {
            for &sample in buffer.samples() {
                writer.write_sample(sample).map_err(io_err)?;
            }
        }
        other => {
            return Err(DropforgeError::InvalidAudio {
                reason: format!("{}-bit export not supported (use 16, 24, or 32)", other),
                source: None,
            });
        }
    }

    writer.finalize().map_err(io_err)?;
    Ok(())
}

/// Generate a mono sine test tone
pub fn generate_test_tone(frequency: f32, duration_ms: u64, sample_rate: u32) -> AudioBuffer {
    let num_frames = (duration_ms as f64 * sample_rate as f64 / 1000.0) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    let samples: Vec<f32> = (0..num_frames).map(|i| (angular_freq * i as f32).sin()).collect();
    // Frame count is always divisible by one channel
    AudioBuffer::from_interleaved(samples, 1, sample_rate).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_export_import_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let tone = generate_test_tone(440.0, 500, 44100);
        export_audio(&tone, &path, ExportFormat::default()).unwrap();

        let loaded = import_audio(&path).unwrap();
        assert_eq!(loaded.channels(), 1);
        assert_eq!(loaded.sample_rate(), 44100);
        assert_eq!(loaded.num_frames(), tone.num_frames());
        // 16-bit quantization keeps levels within a small tolerance
        assert!((loaded.rms_db() - tone.rms_db()).abs() < 0.1);
    }

    #[test]
    fn test_import_missing_file() {
        let err = import_audio(Path::new("/nonexistent/missing.wav")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_export_rejects_odd_bit_depth() {
        let dir = tempdir().unwrap();
        let tone = generate_test_tone(440.0, 100, 44100);
        let err = export_audio(
            &tone,
            &dir.path().join("bad.wav"),
            ExportFormat { bit_depth: 12 },
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AUDIO");
    }
}
