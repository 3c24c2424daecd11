//! Gemini Live API transport.

mod connector;
mod session;

pub use connector::GeminiLiveConnector;
pub use session::GeminiLiveSession;

/// WebSocket endpoint for bidirectional generation. The API key is
/// appended as a query parameter.
pub const LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent";

/// Native-audio live model the tutor runs on.
pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash-native-audio-preview-09-2025";

/// Default prebuilt voice.
pub const DEFAULT_VOICE: &str = "Zephyr";

/// Prebuilt voices known to work with the live models.
pub const LIVE_VOICES: &[&str] = &["Zephyr", "Puck", "Charon", "Kore", "Fenrir", "Aoede"];
