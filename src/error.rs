//! Error types for the player, the synthesizer and the tune loader
//!
//! Validation errors are raised before any audio is rendered or submitted,
//! so a failing call never leaves a half-played sound behind.

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, BeepError>;

#[derive(Error, Debug)]
pub enum BeepError {
    /// Rejected configuration value (volume outside [0, 1], zero sample rate).
    ///
    /// ```
    /// # use beeps::BeepError;
    /// let err = BeepError::InvalidConfiguration("volume must be between 0 and 1, got 1.5".into());
    /// assert_eq!(err.to_string(), "Invalid configuration: volume must be between 0 and 1, got 1.5");
    /// ```
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Unknown note letter or malformed note token
    #[error("Invalid note: '{0}'")]
    InvalidNote(String),

    /// Octave component that is not a digit in 0..=8
    #[error("Invalid octave: '{0}'")]
    InvalidOctave(String),

    /// Accidental that is neither `#` nor `b`
    #[error("Invalid accidental: '{0}'")]
    InvalidAccidental(String),

    /// Negative, infinite or NaN duration
    #[error("Invalid duration: {0}s")]
    InvalidDuration(f64),

    #[error("Unknown tempo id: {0}")]
    UnknownTempo(u8),

    #[error("Unknown pitch class id: {0}")]
    UnknownPitchClass(i32),

    #[error("Unknown octave id: {0}")]
    UnknownOctave(i32),

    /// Malformed line in a note script
    #[error("Script error at line {line}: {message}")]
    Script { line: usize, message: String },

    /// Audio output failure. There is no recovery path for these.
    #[error("Audio device error: {0}")]
    Device(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Wav(#[from] hound::Error),
}
