//! WebSocket session against the Gemini Live API.

use crate::audio::{AudioFrame, CAPTURE_MIME_TYPE, from_wire};
use crate::config::LiveConfig;
use crate::error::{LiveError, Result};
use crate::events::{ErrorInfo, ServerEvent};
use crate::gemini::LIVE_URL;
use crate::session::LiveSession;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{connect_async, tungstenite::Message};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;
type WsSink = futures::stream::SplitSink<WsStream, Message>;
type WsSource = futures::stream::SplitStream<WsStream>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    setup: Option<Setup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    realtime_input: Option<RealtimeInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Setup {
    model: String,
    generation_config: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_audio_transcription: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_audio_transcription: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeInput {
    media_chunks: Vec<MediaChunk>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct MediaChunk {
    mime_type: String,
    data: String,
}

fn setup_message(config: &LiveConfig) -> ClientMessage {
    let mut generation_config = json!({
        "responseModalities": config.modalities,
        "speechConfig": {
            "voiceConfig": {
                "prebuiltVoiceConfig": { "voiceName": config.voice }
            }
        },
    });
    if let Some(temperature) = config.temperature {
        generation_config["temperature"] = json!(temperature);
    }

    ClientMessage {
        setup: Some(Setup {
            model: config.model.clone(),
            generation_config,
            system_instruction: Some(json!({
                "parts": [{ "text": config.system_instruction }]
            })),
            input_audio_transcription: config.input_transcription.then(|| json!({})),
            output_audio_transcription: config.output_transcription.then(|| json!({})),
        }),
        realtime_input: None,
    }
}

/// Translate one wire frame into unified events, preserving in-frame
/// order. Frames this client does not understand come back as a single
/// [`ServerEvent::Unknown`].
pub(crate) fn translate_frame(raw: &str) -> Result<Vec<ServerEvent>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| LiveError::protocol(format!("unparseable server frame: {e}")))?;

    let mut events = Vec::new();

    if value.get("setupComplete").is_some() {
        events.push(ServerEvent::Opened);
    }

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unspecified server error")
            .to_string();
        let code = error.get("code").map(|c| c.to_string());
        events.push(ServerEvent::Error { error: ErrorInfo { message, code } });
    }

    if let Some(content) = value.get("serverContent") {
        if content.get("interrupted").and_then(|i| i.as_bool()).unwrap_or(false) {
            events.push(ServerEvent::Interrupted);
        }

        if let Some(parts) = content.get("modelTurn").and_then(|t| t.get("parts")).and_then(|p| p.as_array())
        {
            for part in parts {
                if let Some(data) = part
                    .get("inlineData")
                    .and_then(|d| d.get("data"))
                    .and_then(|d| d.as_str())
                {
                    events.push(ServerEvent::Audio { data: from_wire(data)? });
                }
            }
        }

        if let Some(text) = content
            .get("inputTranscription")
            .and_then(|t| t.get("text"))
            .and_then(|t| t.as_str())
        {
            events.push(ServerEvent::InputTranscript { text: text.to_string() });
        }

        if let Some(text) = content
            .get("outputTranscription")
            .and_then(|t| t.get("text"))
            .and_then(|t| t.as_str())
        {
            events.push(ServerEvent::OutputTranscript { text: text.to_string() });
        }

        if content.get("turnComplete").and_then(|t| t.as_bool()).unwrap_or(false) {
            events.push(ServerEvent::TurnComplete);
        }
    }

    if events.is_empty() {
        events.push(ServerEvent::Unknown);
    }
    Ok(events)
}

/// Live session over the Gemini bidirectional WebSocket.
pub struct GeminiLiveSession {
    session_id: String,
    connected: Arc<AtomicBool>,
    sender: Arc<Mutex<WsSink>>,
    receiver: Arc<Mutex<WsSource>>,
    // Events translated from a frame but not yet consumed.
    pending: Mutex<VecDeque<ServerEvent>>,
}

impl GeminiLiveSession {
    /// Connect and complete setup. Resolves only after the server has
    /// acknowledged the session, so a returned session is usable.
    pub async fn connect(api_key: &SecretString, config: &LiveConfig) -> Result<Self> {
        let url = format!("{LIVE_URL}?key={}", api_key.expose_secret());
        let request = url
            .into_client_request()
            .map_err(|e| LiveError::transport(format!("failed to build client request: {e}")))?;
        let (stream, _response) = connect_async(request)
            .await
            .map_err(|e| LiveError::transport(format!("WebSocket connect failed: {e}")))?;

        let (sink, source) = stream.split();
        let session = Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            connected: Arc::new(AtomicBool::new(true)),
            sender: Arc::new(Mutex::new(sink)),
            receiver: Arc::new(Mutex::new(source)),
            pending: Mutex::new(VecDeque::new()),
        };

        tracing::info!(session_id = %session.session_id, model = %config.model, "opening live session");
        session.send_raw(&setup_message(config)).await?;
        session.await_setup_complete().await?;
        Ok(session)
    }

    /// Read frames until the setup acknowledgement arrives. Events that
    /// arrive alongside it stay queued for [`LiveSession::next_event`].
    async fn await_setup_complete(&self) -> Result<()> {
        loop {
            match self.receive_translated().await {
                Some(Ok(events)) => {
                    let mut saw_opened = false;
                    let mut pending = self.pending.lock().await;
                    for event in events {
                        if event == ServerEvent::Opened {
                            saw_opened = true;
                        } else {
                            pending.push_back(event);
                        }
                    }
                    if saw_opened {
                        tracing::debug!(session_id = %self.session_id, "setup complete");
                        return Ok(());
                    }
                }
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(LiveError::transport(
                        "connection closed before setup completed",
                    ));
                }
            }
        }
    }

    async fn send_raw<T: Serialize>(&self, value: &T) -> Result<()> {
        let msg = serde_json::to_string(value)?;
        let mut sender = self.sender.lock().await;
        sender
            .send(Message::Text(msg))
            .await
            .map_err(|e| LiveError::transport(format!("send failed: {e}")))
    }

    /// Receive the next wire frame and translate it. `None` means the
    /// channel has ended.
    async fn receive_translated(&self) -> Option<Result<Vec<ServerEvent>>> {
        let mut receiver = self.receiver.lock().await;
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => Some(translate_frame(&text)),
            Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                Ok(text) => Some(translate_frame(&text)),
                Err(e) => {
                    Some(Err(LiveError::protocol(format!("invalid UTF-8 in binary frame: {e}"))))
                }
            },
            Some(Ok(Message::Close(_))) | None => {
                self.connected.store(false, Ordering::SeqCst);
                None
            }
            Some(Ok(_)) => Some(Ok(vec![ServerEvent::Unknown])),
            Some(Err(e)) => {
                self.connected.store(false, Ordering::SeqCst);
                Some(Err(LiveError::transport(format!("receive failed: {e}"))))
            }
        }
    }
}

#[async_trait]
impl LiveSession for GeminiLiveSession {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send_frame(&self, frame: &AudioFrame) -> Result<()> {
        if !self.is_connected() {
            // Capture races teardown; late frames are dropped, not errors.
            return Ok(());
        }
        let msg = ClientMessage {
            setup: None,
            realtime_input: Some(RealtimeInput {
                media_chunks: vec![MediaChunk {
                    mime_type: CAPTURE_MIME_TYPE.to_string(),
                    data: frame.to_wire(),
                }],
            }),
        };
        self.send_raw(&msg).await
    }

    async fn next_event(&self) -> Option<Result<ServerEvent>> {
        loop {
            if let Some(event) = self.pending.lock().await.pop_front() {
                return Some(Ok(event));
            }
            match self.receive_translated().await? {
                Ok(events) => {
                    let mut pending = self.pending.lock().await;
                    pending.extend(events);
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }

    async fn close(&self) -> Result<()> {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        let mut sender = self.sender.lock().await;
        if let Err(e) = sender.send(Message::Close(None)).await {
            tracing::debug!(session_id = %self.session_id, "close frame not delivered: {e}");
        }
        Ok(())
    }
}

impl std::fmt::Debug for GeminiLiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiLiveSession")
            .field("session_id", &self.session_id)
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_message_shape() {
        let config = LiveConfig::new();
        let json = serde_json::to_value(setup_message(&config)).unwrap();
        let setup = &json["setup"];

        assert_eq!(setup["model"], config.model);
        assert_eq!(setup["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            setup["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            config.voice
        );
        assert!(setup["inputAudioTranscription"].is_object());
        assert!(setup["outputAudioTranscription"].is_object());
        assert_eq!(setup["systemInstruction"]["parts"][0]["text"], config.system_instruction);
    }

    #[test]
    fn setup_omits_disabled_transcription() {
        let mut config = LiveConfig::new();
        config.input_transcription = false;
        let json = serde_json::to_value(setup_message(&config)).unwrap();
        assert!(json["setup"].get("inputAudioTranscription").is_none());
        assert!(json["setup"]["outputAudioTranscription"].is_object());
    }

    #[test]
    fn translates_setup_complete() {
        let events = translate_frame(r#"{"setupComplete": {}}"#).unwrap();
        assert_eq!(events, vec![ServerEvent::Opened]);
    }

    #[test]
    fn translates_combined_server_content_in_order() {
        let raw = r#"{
            "serverContent": {
                "modelTurn": {
                    "parts": [{"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": "AAD/fw=="}}]
                },
                "outputTranscription": {"text": "وعليكم"},
                "turnComplete": true
            }
        }"#;
        let events = translate_frame(raw).unwrap();
        assert_eq!(
            events,
            vec![
                ServerEvent::Audio { data: vec![0x00, 0x00, 0xff, 0x7f] },
                ServerEvent::OutputTranscript { text: "وعليكم".to_string() },
                ServerEvent::TurnComplete,
            ]
        );
    }

    #[test]
    fn translates_interruption() {
        let events =
            translate_frame(r#"{"serverContent": {"interrupted": true}}"#).unwrap();
        assert_eq!(events, vec![ServerEvent::Interrupted]);
    }

    #[test]
    fn translates_input_transcription() {
        let events = translate_frame(
            r#"{"serverContent": {"inputTranscription": {"text": "سلام"}}}"#,
        )
        .unwrap();
        assert_eq!(events, vec![ServerEvent::InputTranscript { text: "سلام".to_string() }]);
    }

    #[test]
    fn unknown_frame_is_not_an_error() {
        let events = translate_frame(r#"{"usageMetadata": {"totalTokens": 5}}"#).unwrap();
        assert_eq!(events, vec![ServerEvent::Unknown]);
    }

    #[test]
    fn malformed_audio_payload_is_an_error() {
        let raw = r#"{
            "serverContent": {
                "modelTurn": {"parts": [{"inlineData": {"mimeType": "audio/pcm", "data": "!!!"}}]}
            }
        }"#;
        assert!(matches!(translate_frame(raw), Err(LiveError::Codec(_))));
    }

    #[test]
    fn server_error_frame_translates() {
        let events =
            translate_frame(r#"{"error": {"message": "quota exceeded", "code": 429}}"#).unwrap();
        match &events[0] {
            ServerEvent::Error { error } => {
                assert_eq!(error.message, "quota exceeded");
                assert_eq!(error.code.as_deref(), Some("429"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
