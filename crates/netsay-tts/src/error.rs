//! Error types for synthesis engines

use thiserror::Error;

/// TTS error types
#[derive(Error, Debug)]
pub enum TtsError {
    /// Engine is not available or not installed
    #[error("TTS engine not available: {0}")]
    EngineNotAvailable(String),

    /// Engine used before a voice was loaded
    #[error("Engine not initialized: {0}")]
    NotInitialized(String),

    /// Voice not found or not supported
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// Synthesis failed
    #[error("Synthesis failed: {0}")]
    SynthesisError(String),

    /// Invalid text input
    #[error("Invalid text input: {0}")]
    InvalidInput(String),

    /// Engine output could not be decoded into PCM
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// IO error (process spawning, pipes)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for TTS operations
pub type TtsResult<T> = Result<T, TtsError>;
