//! # mahir-realtime
//!
//! Live Arabic conversation pipeline over the Gemini Live API.
//!
//! The [`LiveConversation`] controller ties the pieces together: it
//! acquires the microphone, opens a duplex WebSocket session, streams
//! fixed-size PCM16 capture frames upstream, and routes server events
//! into a gapless [`PlaybackScheduler`] and a turn-based
//! [`TranscriptReconciler`].
//!
//! ```rust,ignore
//! use mahir_realtime::{
//!     GeminiLiveConnector, LiveConfig, LiveConversation, PlaybackScheduler,
//! };
//! use mahir_realtime::capture::CpalCapture;
//! use mahir_realtime::playback::CpalPlayback;
//! use std::sync::Arc;
//!
//! let scheduler = Arc::new(PlaybackScheduler::new(Arc::new(CpalPlayback::open()?)));
//! let conversation = LiveConversation::new(
//!     Arc::new(GeminiLiveConnector::new()),
//!     Arc::new(CpalCapture::new()),
//!     scheduler,
//!     credentials,
//!     LiveConfig::new(),
//! );
//! conversation.start().await?;
//! ```
//!
//! Desktop capture and playback live behind the `desktop-audio` feature;
//! everything else is platform-neutral and testable with fakes.

pub mod audio;
pub mod capture;
pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod gemini;
pub mod playback;
pub mod recorder;
pub mod session;
pub mod transcript;

pub use audio::{
    AudioFormat, AudioFrame, CAPTURE_FRAME_SAMPLES, CAPTURE_MIME_TYPE, CAPTURE_SAMPLE_RATE,
    FrameChunker, PLAYBACK_SAMPLE_RATE,
};
pub use capture::{CaptureControl, CaptureSource, CaptureStream};
pub use config::{LiveConfig, TUTOR_SYSTEM_INSTRUCTION};
pub use conversation::{ConnectionState, LiveConversation};
pub use error::{LiveError, Result};
pub use events::{ErrorInfo, ServerEvent};
pub use gemini::{DEFAULT_MODEL, DEFAULT_VOICE, GeminiLiveConnector, GeminiLiveSession};
pub use playback::{PlaybackScheduler, PlaybackSink, SegmentId};
pub use recorder::{Recording, TurnRecorder};
pub use session::{LiveConnector, LiveSession, SharedSession};
pub use transcript::{ConversationTurn, TranscriptReconciler, TranscriptSnapshot};
