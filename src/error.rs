//! Error handling for Dropforge
//!
//! Recipe-level failures are isolated by the orchestrator; the variants here
//! cover everything that can abort an operation outright.

use thiserror::Error;

/// Result type alias for Dropforge operations
pub type Result<T> = std::result::Result<T, DropforgeError>;

/// Main error type for Dropforge operations
#[derive(Error, Debug)]
pub enum DropforgeError {
    // Tempo Errors
    #[error("Invalid tempo: {bpm} BPM (must be finite and > 0)")]
    InvalidTempo { bpm: f64 },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Buffer Errors
    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("Insufficient audio: requested {requested_ms} ms, only {available_ms} ms available")]
    InsufficientAudio {
        requested_ms: u64,
        available_ms: u64,
    },

    #[error("Buffer mismatch: {reason}")]
    BufferMismatch { reason: String },

    // Separation Errors
    #[error("Stem separation failed: {reason}")]
    SeparationFailed { reason: String },

    // Job Errors
    #[error("Job queue is closed")]
    QueueClosed,

    #[error("Unknown session: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Unknown track: {track_id}")]
    TrackNotFound { track_id: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DropforgeError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            DropforgeError::InvalidTempo { .. } => "INVALID_TEMPO",
            DropforgeError::FileNotFound { .. } => "FILE_NOT_FOUND",
            DropforgeError::InvalidAudio { .. } => "INVALID_AUDIO",
            DropforgeError::EmptyAudio => "EMPTY_AUDIO",
            DropforgeError::InsufficientAudio { .. } => "INSUFFICIENT_AUDIO",
            DropforgeError::BufferMismatch { .. } => "BUFFER_MISMATCH",
            DropforgeError::SeparationFailed { .. } => "SEPARATION_FAILED",
            DropforgeError::QueueClosed => "QUEUE_CLOSED",
            DropforgeError::SessionNotFound { .. } => "SESSION_NOT_FOUND",
            DropforgeError::TrackNotFound { .. } => "TRACK_NOT_FOUND",
            DropforgeError::Io(_) => "IO_ERROR",
            DropforgeError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the caller can reasonably retry or degrade after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            DropforgeError::InsufficientAudio { .. } => true,
            DropforgeError::SeparationFailed { .. } => true,
            DropforgeError::FileNotFound { .. } => true,
            DropforgeError::InvalidAudio { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DropforgeError::InvalidTempo { bpm: -1.0 };
        assert_eq!(err.error_code(), "INVALID_TEMPO");

        let err = DropforgeError::InsufficientAudio {
            requested_ms: 8000,
            available_ms: 2000,
        };
        assert_eq!(err.error_code(), "INSUFFICIENT_AUDIO");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_invalid_tempo_message() {
        let err = DropforgeError::InvalidTempo { bpm: 0.0 };
        assert!(err.to_string().contains("0 BPM"));
    }
}
