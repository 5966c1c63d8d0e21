//! Error types for the clarity pipeline.

/// Top-level error type for the reply pipeline and its adapters.
///
/// Only [`ClarityError::EmptyInput`] and [`ClarityError::ModelInference`] ever
/// surface as request-level failures; generation and audio problems are
/// absorbed into the reply content by their stages.
#[derive(Debug, thiserror::Error)]
pub enum ClarityError {
    /// The utterance was missing or blank after trimming.
    #[error("empty input")]
    EmptyInput,

    /// The sentiment model could not process the text.
    #[error("model inference error: {0}")]
    ModelInference(String),

    /// Model download or loading error.
    #[error("model error: {0}")]
    Model(String),

    /// Completion service error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Text-to-speech synthesis error.
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio decode or device error.
    #[error("audio error: {0}")]
    Audio(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// HTTP transport error (bind, serve).
    #[error("server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ClarityError>;
