//! Talk to the Arabic tutor from the terminal.
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run -p mahir-realtime --example live_tutor --features desktop-audio
//! ```
//!
//! Speak into the microphone; the tutor answers out loud. Ctrl-C ends
//! the session and prints the transcript.

use mahir_realtime::capture::CpalCapture;
use mahir_realtime::playback::CpalPlayback;
use mahir_realtime::{GeminiLiveConnector, LiveConfig, LiveConversation, PlaybackScheduler};
use mahir_session::{CredentialStore, MemoryStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mahir_realtime=info".into()),
        )
        .init();

    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| anyhow::anyhow!("set GEMINI_API_KEY to a Gemini API key"))?;
    let credentials = CredentialStore::new(Arc::new(MemoryStore::new()));
    credentials.set_api_key(&api_key)?;

    let playback = Arc::new(CpalPlayback::open()?);
    let scheduler = Arc::new(PlaybackScheduler::new(playback));

    let conversation = LiveConversation::new(
        Arc::new(GeminiLiveConnector::new()),
        Arc::new(CpalCapture::new()),
        scheduler,
        credentials,
        LiveConfig::new(),
    );

    conversation.start().await?;
    println!("Connected. Speak Arabic; Ctrl-C to stop.");

    tokio::signal::ctrl_c().await?;
    conversation.stop().await;

    let snapshot = conversation.transcript().snapshot();
    for turn in &snapshot.history {
        println!("You:   {}", turn.user);
        println!("Tutor: {}", turn.tutor);
    }
    Ok(())
}
