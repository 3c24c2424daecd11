//! Error types for the live conversation pipeline.

use thiserror::Error;

/// Result type for live conversation operations.
pub type Result<T> = std::result::Result<T, LiveError>;

/// Errors that can occur while running a live conversation.
#[derive(Error, Debug)]
pub enum LiveError {
    /// Malformed audio payload (bad length, bad base64).
    #[error("audio codec error: {0}")]
    Codec(String),

    /// The platform refused microphone access.
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),

    /// No audio capture backend is available on this platform.
    #[error("audio capture is not supported on this platform")]
    UnsupportedPlatform,

    /// No API key is stored; the session cannot be opened.
    #[error("no API key configured")]
    MissingCredential,

    /// WebSocket transport failure (connect, send, receive).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server sent a frame the client could not interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A session is already running; stop it before starting another.
    #[error("a live session is already active")]
    AlreadyActive,

    /// Writing a conversation recording failed.
    #[error("recording error: {0}")]
    Recording(String),

    /// Serialization of a client frame failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Credential store access failed.
    #[error("store error: {0}")]
    Store(#[from] mahir_session::StoreError),
}

impl LiveError {
    /// Create a new codec error.
    pub fn codec<S: Into<String>>(msg: S) -> Self {
        Self::Codec(msg.into())
    }

    /// Create a new transport error.
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new protocol error.
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a new permission error.
    pub fn permission<S: Into<String>>(msg: S) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create a new recording error.
    pub fn recording<S: Into<String>>(msg: S) -> Self {
        Self::Recording(msg.into())
    }
}
