//! # mahir-gemini
//!
//! Single round-trip Gemini REST collaborators for the Mahir
//! Arabic-learning client:
//!
//! - **Grammatical analysis** — structured generation of a full I'rab
//!   breakdown (vocalized text, translation, per-word analysis) against a
//!   JSON response schema.
//! - **Grounded chat** — a knowledgeable assistant with Google Search
//!   grounding, surfacing source chunks alongside the answer.
//! - **Text-to-speech** — synthesized Arabic audio as raw PCM bytes.
//! - **Sample text generation** — short authentic Arabic passages to feed
//!   the analyzer.
//!
//! Every operation is one HTTP request and one response; there is no retry
//! policy and no session state. Failures surface as [`RequestError`] at the
//! call site and never corrupt other application state.
//!
//! ```rust,ignore
//! use mahir_gemini::Gemini;
//!
//! let client = Gemini::new(api_key);
//! let analysis = client.analyze_text("العلم نور").await?;
//! println!("{}", analysis.vocalized_text);
//! ```

mod analysis;
mod chat;
mod client;
mod error;
mod speech;
mod types;

pub use analysis::{ANALYSIS_MODEL, AnalysisResult, GrammaticalAnalysisItem};
pub use chat::{ASSISTANT_SYSTEM_INSTRUCTION, AssistantReply, CHAT_MODEL};
pub use client::Gemini;
pub use error::{RequestError, Result};
pub use speech::{TTS_MODEL, TTS_VOICE};
pub use types::{
    ChatMessage, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    GroundingChunk, InlineData, Part, Role, WebSource,
};
