//! Server events, translated from provider-specific wire frames into a
//! unified shape the conversation controller consumes.

use serde::{Deserialize, Serialize};

/// Detail attached to a server-reported error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Human-readable description.
    pub message: String,
    /// Provider error code, when one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Unified server-to-client events.
///
/// One wire frame can carry several of these; translation preserves the
/// order they appear in the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Session setup acknowledged; the duplex channel is live.
    Opened,

    /// Partial transcript of the user's speech.
    InputTranscript {
        /// Transcript fragment, appended to what came before.
        text: String,
    },

    /// Partial transcript of the model's speech.
    OutputTranscript {
        /// Transcript fragment, appended to what came before.
        text: String,
    },

    /// The model finished its turn.
    TurnComplete,

    /// The user barged in; pending model audio is stale.
    Interrupted,

    /// A segment of model speech.
    Audio {
        /// Raw PCM16 bytes, already decoded from the wire.
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },

    /// The server reported an error.
    Error {
        /// What went wrong.
        error: ErrorInfo,
    },

    /// The server closed the channel.
    Closed,

    /// A frame this client does not understand. Ignored.
    #[serde(other)]
    Unknown,
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_event_serializes_as_base64() {
        let event = ServerEvent::Audio { data: vec![0x00, 0x01, 0xff] };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "audio");
        assert_eq!(json["data"], "AAH/");

        let back: ServerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn unknown_tag_maps_to_unknown() {
        let event: ServerEvent = serde_json::from_str(r#"{"type": "something_new"}"#).unwrap();
        assert_eq!(event, ServerEvent::Unknown);
    }

    #[test]
    fn transcript_events_carry_text() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"type": "input_transcript", "text": "سلام"}"#).unwrap();
        assert_eq!(event, ServerEvent::InputTranscript { text: "سلام".to_string() });
    }
}
