//! Error types for the voxloop assistant

use std::time::Duration;

use thiserror::Error;

/// Result type alias for voxloop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the assistant loop
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Microphone capture error
    #[error("capture error: {0}")]
    Capture(String),

    /// Speech-to-text error (engine failure or empty transcript)
    #[error("STT error: {0}")]
    Stt(String),

    /// Speech-to-text worker exceeded its deadline
    #[error("STT timed out after {0:?}")]
    SttTimeout(Duration),

    /// Remote assistant error
    #[error("assistant error: {0}")]
    Assistant(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Device channel error
    #[error("device channel error: {0}")]
    Device(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// WAV encode/decode error
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
}
