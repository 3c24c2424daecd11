//! Grounded assistant chat.

use crate::client::Gemini;
use crate::error::{RequestError, Result};
use crate::types::{
    ChatMessage, Content, GenerateContentRequest, GenerationConfig, GroundingChunk, Role,
};
use serde_json::json;

/// Model used for assistant chat and quick responses.
pub const CHAT_MODEL: &str = "gemini-2.5-flash";

/// Persona the assistant answers with.
pub const ASSISTANT_SYSTEM_INSTRUCTION: &str = "Anda adalah asisten AI yang berpengetahuan luas \
    yang berspesialisasi dalam bahasa Arab klasik, studi Islam, dan topik terkait. Gunakan Google \
    Search untuk menjawab pertanyaan tentang peristiwa terkini atau informasi yang tidak ada dalam \
    data pelatihan Anda. Jawab dalam bahasa Indonesia kecuali diminta sebaliknya.";

/// An assistant answer plus the web sources that grounded it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    /// The answer text.
    pub text: String,
    /// Grounding sources, empty when the model answered from memory.
    pub grounding: Vec<GroundingChunk>,
}

/// Map prior turns to wire contents, dropping a trailing copy of the
/// prompt if the caller already appended it to the history.
fn history_contents(history: &[ChatMessage], prompt: &str) -> Vec<Content> {
    let prior = match history.last() {
        Some(last) if last.role == Role::User && last.text == prompt => &history[..history.len() - 1],
        _ => history,
    };
    prior
        .iter()
        .map(|msg| match msg.role {
            Role::User => Content::user_text(msg.text.clone()),
            Role::Model => Content::model_text(msg.text.clone()),
        })
        .collect()
}

impl Gemini {
    /// Ask the grounded assistant a question in the context of `history`.
    pub async fn ask_assistant(
        &self,
        prompt: &str,
        history: &[ChatMessage],
    ) -> Result<AssistantReply> {
        let mut contents = history_contents(history, prompt);
        contents.push(Content::user_text(prompt));

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content::system_text(ASSISTANT_SYSTEM_INSTRUCTION)),
            generation_config: None,
            tools: Some(vec![json!({ "googleSearch": {} })]),
        };

        let response = self.generate_content(CHAT_MODEL, &request).await?;
        let text = response.text();
        if text.is_empty() {
            return Err(RequestError::EmptyResponse);
        }
        Ok(AssistantReply { text, grounding: response.grounding_chunks() })
    }

    /// A short, deterministic answer to a single prompt. No history, no
    /// grounding, capped output.
    pub async fn quick_response(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
                max_output_tokens: Some(100),
                ..Default::default()
            }),
            tools: None,
        };

        let response = self.generate_content(CHAT_MODEL, &request).await?;
        let text = response.text();
        if text.is_empty() {
            return Err(RequestError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_drops_trailing_prompt_duplicate() {
        let history = vec![
            ChatMessage::user("apa itu i'rab?"),
            ChatMessage::model("I'rab adalah..."),
            ChatMessage::user("berikan contoh"),
        ];
        let contents = history_contents(&history, "berikan contoh");
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1].role, Some(Role::Model));
    }

    #[test]
    fn history_kept_when_prompt_not_appended() {
        let history = vec![ChatMessage::user("halo"), ChatMessage::model("halo juga")];
        let contents = history_contents(&history, "pertanyaan baru");
        assert_eq!(contents.len(), 2);
    }

    #[test]
    fn empty_history_maps_to_no_contents() {
        assert!(history_contents(&[], "anything").is_empty());
    }
}
