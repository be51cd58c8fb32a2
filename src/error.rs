//! Error types for sandesh-session.

use thiserror::Error;

/// Main error type for all session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O error from the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while loading configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Open tag is not `<sandesh length="NNNNNNNNNN">`.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// Frame does not end with the close literal.
    #[error("Malformed trailer: frame of {declared} bytes does not end with </sandesh>")]
    MalformedTrailer { declared: usize },

    /// Declared length is smaller than an empty-payload frame.
    #[error("Declared length {declared} is below minimum frame length {min}")]
    FrameTooShort { declared: usize, min: usize },

    /// Declared length exceeds the configured cap, or a frame cannot be encoded.
    #[error("Frame length {declared} exceeds maximum {max}")]
    FrameTooLarge { declared: usize, max: usize },

    /// A previous framing error left the inbound stream untrusted.
    #[error("Inbound stream desynchronized by an earlier framing error")]
    Desynchronized,

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Message handler rejected a payload.
    #[error("Handler error: {0}")]
    Handler(String),
}

impl SessionError {
    /// Whether this error leaves the inbound byte stream untrusted.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            SessionError::MalformedHeader(_)
                | SessionError::MalformedTrailer { .. }
                | SessionError::FrameTooShort { .. }
                | SessionError::FrameTooLarge { .. }
                | SessionError::Desynchronized
        )
    }
}

/// Result type alias using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;
