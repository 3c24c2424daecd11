//! Live session configuration.

use crate::gemini::{DEFAULT_MODEL, DEFAULT_VOICE};
use serde::{Deserialize, Serialize};

/// Persona the live tutor speaks with.
pub const TUTOR_SYSTEM_INSTRUCTION: &str = "Anda adalah tutor yang ramah dan sabar untuk bahasa \
    Arab klasik. Berinteraksilah dengan pengguna dalam bahasa Indonesia. Ajukan pertanyaan dalam \
    bahasa Arab dan berikan umpan balik atau penjelasan dalam bahasa Indonesia untuk membantu \
    pengguna melatih pengucapan dan pemahaman bahasa Arab mereka.";

/// Configuration for a live conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Model resource name, e.g. `models/...`.
    pub model: String,
    /// Prebuilt voice for spoken replies.
    pub voice: String,
    /// System instruction establishing the tutor persona.
    pub system_instruction: String,
    /// Response modalities requested from the model.
    pub modalities: Vec<String>,
    /// Ask the server to transcribe what the user says.
    pub input_transcription: bool,
    /// Ask the server to transcribe what the model says.
    pub output_transcription: bool,
    /// Sampling temperature, when overridden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            system_instruction: TUTOR_SYSTEM_INSTRUCTION.to_string(),
            modalities: vec!["AUDIO".to_string()],
            input_transcription: true,
            output_transcription: true,
            temperature: None,
        }
    }
}

impl LiveConfig {
    /// Default configuration for the Arabic tutor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the voice.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Override the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_requests_audio_with_transcripts() {
        let config = LiveConfig::new();
        assert_eq!(config.modalities, vec!["AUDIO"]);
        assert!(config.input_transcription);
        assert!(config.output_transcription);
        assert!(config.model.starts_with("models/"));
    }

    #[test]
    fn builder_overrides() {
        let config = LiveConfig::new().with_voice("Puck").with_temperature(0.7);
        assert_eq!(config.voice, "Puck");
        assert_eq!(config.temperature, Some(0.7));
    }
}
