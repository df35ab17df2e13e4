//! Error types for the piano-to-MIDI system

use std::fmt;

/// Custom error type for piano video transcription
#[derive(Debug, Clone)]
pub enum PianoError {
    /// E001: Key ordinal or key index outside its domain
    OutOfRange(String),
    /// E002: Calibration data does not match the keyboard geometry
    CalibrationMismatch(String),
    /// E003: Frame source could not deliver the next frame
    FrameReadFailure(String),
    /// E004: Configuration validation failed
    ConfigValidationFailed(String),
    /// E005: File I/O error
    FileError(String),
    /// E006: MIDI export error
    MidiExportError(String),
    /// E007: Frame shape cannot be sampled
    InvalidFrame(String),
    /// E008: Frame numbers went backwards
    FrameOrderViolation { previous: u64, current: u64 },
    /// E009: JSON (de)serialization error
    SerializationError(String),
    /// E010: Processing pipeline error
    ProcessingPipelineError(String),
}

impl fmt::Display for PianoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PianoError::OutOfRange(msg) => write!(f, "E001: Value out of range - {}", msg),
            PianoError::CalibrationMismatch(msg) => {
                write!(f, "E002: Calibration mismatch - {}", msg)
            }
            PianoError::FrameReadFailure(msg) => {
                write!(f, "E003: Frame read failure - {}", msg)
            }
            PianoError::ConfigValidationFailed(msg) => {
                write!(f, "E004: Configuration validation failed - {}", msg)
            }
            PianoError::FileError(msg) => write!(f, "E005: File I/O error - {}", msg),
            PianoError::MidiExportError(msg) => write!(f, "E006: MIDI export error - {}", msg),
            PianoError::InvalidFrame(msg) => write!(f, "E007: Invalid frame - {}", msg),
            PianoError::FrameOrderViolation { previous, current } => {
                write!(
                    f,
                    "E008: Frame order violation - frame {} follows frame {}",
                    current, previous
                )
            }
            PianoError::SerializationError(msg) => {
                write!(f, "E009: Serialization error - {}", msg)
            }
            PianoError::ProcessingPipelineError(msg) => {
                write!(f, "E010: Processing pipeline error - {}", msg)
            }
        }
    }
}

impl std::error::Error for PianoError {}

impl From<std::io::Error> for PianoError {
    fn from(err: std::io::Error) -> Self {
        PianoError::FileError(format!("File I/O error: {}", err))
    }
}

impl From<serde_json::Error> for PianoError {
    fn from(err: serde_json::Error) -> Self {
        PianoError::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<anyhow::Error> for PianoError {
    fn from(err: anyhow::Error) -> Self {
        PianoError::ProcessingPipelineError(format!("Generic error: {}", err))
    }
}

/// Result type alias for piano-to-MIDI operations
pub type Result<T> = std::result::Result<T, PianoError>;
