//! Text-to-speech synthesis.

use crate::client::Gemini;
use crate::error::{RequestError, Result};
use crate::types::{Content, GenerateContentRequest, GenerationConfig};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

/// Model used for speech synthesis.
pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Prebuilt voice used for Arabic audio.
pub const TTS_VOICE: &str = "Kore";

impl Gemini {
    /// Synthesize `text` as speech, returning raw PCM bytes.
    pub async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>> {
        let request = GenerateContentRequest {
            contents: vec![Content::user_text(text)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(json!({
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": TTS_VOICE }
                    }
                })),
                ..Default::default()
            }),
            tools: None,
        };

        let response = self.generate_content(TTS_MODEL, &request).await?;
        let inline = response.inline_data().ok_or(RequestError::MissingAudio)?;
        Ok(STANDARD.decode(&inline.data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenerateContentResponse;

    #[test]
    fn audio_payload_decodes() {
        let raw = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": "AAD/fw=="}}]
                }
            }]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let inline = response.inline_data().unwrap();
        let bytes = STANDARD.decode(&inline.data).unwrap();
        assert_eq!(bytes, vec![0x00, 0x00, 0xff, 0x7f]);
    }
}
