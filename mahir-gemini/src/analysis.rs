//! Grammatical (I'rab) analysis via structured generation.

use crate::client::Gemini;
use crate::error::{RequestError, Result};
use crate::types::{Content, GenerateContentRequest, GenerationConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Model used for analysis and sample-text generation.
pub const ANALYSIS_MODEL: &str = "gemini-2.5-flash";

/// Per-word grammatical analysis.
///
/// Field names match the JSON keys the response schema pins down, so they
/// double as the storage format for the analysis history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammaticalAnalysisItem {
    /// The Arabic word being analyzed.
    pub word: String,
    /// The I'rab term in Arabic (e.g. مبتدأ مرفوع).
    pub i_rab: String,
    /// The I'rab explanation in Indonesian.
    pub i_rab_translation: String,
    /// Translation of the word itself.
    pub translation: String,
}

/// Full analysis of an Arabic text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// The text as submitted.
    pub original_text: String,
    /// The text with full vocalization (harakat).
    pub vocalized_text: String,
    /// Indonesian translation of the whole text.
    pub translation: String,
    /// Word-by-word breakdown.
    pub grammatical_analysis: Vec<GrammaticalAnalysisItem>,
}

/// JSON response schema the model is constrained to.
fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "originalText": { "type": "STRING" },
            "vocalizedText": { "type": "STRING" },
            "translation": { "type": "STRING" },
            "grammaticalAnalysis": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "word": { "type": "STRING", "description": "Kata Arab yang dianalisis." },
                        "i_rab": { "type": "STRING", "description": "Istilah I'rab dalam bahasa Arab." },
                        "i_rab_translation": { "type": "STRING", "description": "Penjelasan I'rab dalam bahasa Indonesia." },
                        "translation": { "type": "STRING", "description": "Terjemahan kata dalam bahasa Indonesia." }
                    },
                    "required": ["word", "i_rab", "i_rab_translation", "translation"]
                }
            }
        },
        "required": ["originalText", "vocalizedText", "translation", "grammaticalAnalysis"]
    })
}

/// Strip a surrounding markdown code fence, which the model sometimes
/// wraps its JSON in despite the response MIME type.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

impl Gemini {
    /// Run a deep I'rab analysis of `text`.
    pub async fn analyze_text(&self, text: &str) -> Result<AnalysisResult> {
        let prompt = format!(
            "Lakukan analisis gramatikal (I'rab) yang mendalam pada teks Arab berikut. Untuk setiap kata:\n\
             1. Sediakan istilah I'rab dalam bahasa Arab (misalnya, مبتدأ مرفوع).\n\
             2. Sediakan penjelasan I'rab dalam bahasa Indonesia (misalnya, Subjek dalam kasus nominatif).\n\
             3. Sediakan terjemahan kata itu sendiri dalam bahasa Indonesia.\n\n\
             Selain itu, berikan juga teks lengkap yang sudah divokalisasi (harakat lengkap) dan terjemahan bahasa Indonesia untuk keseluruhan teks.\n\n\
             Teks: \"{text}\""
        );

        let request = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.2),
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(analysis_schema()),
                ..Default::default()
            }),
            tools: None,
        };

        let response = self.generate_content(ANALYSIS_MODEL, &request).await?;
        let raw = response.text();
        if raw.is_empty() {
            return Err(RequestError::EmptyResponse);
        }
        Ok(serde_json::from_str(strip_code_fences(&raw))?)
    }

    /// Generate a short, authentic Arabic sample text about `topic`,
    /// suitable for feeding back into [`Gemini::analyze_text`].
    pub async fn generate_sample_text(&self, topic: &str) -> Result<String> {
        let prompt = format!(
            "Berikan satu contoh teks Arab singkat dan autentik (bisa berupa ayat Al-Quran, \
             kutipan hadis, atau peribahasa Arab) tentang topik \"{topic}\". Pastikan teksnya \
             tidak terlalu panjang, ideal untuk dianalisis. Kembalikan HANYA teks Arabnya saja, \
             tanpa terjemahan atau penjelasan apa pun."
        );

        let request = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.5),
                max_output_tokens: Some(150),
                ..Default::default()
            }),
            tools: None,
        };

        let response = self.generate_content(ANALYSIS_MODEL, &request).await?;
        let text = response.text().trim().replace('"', "");
        if text.is_empty() {
            return Err(RequestError::EmptyResponse);
        }
        Ok(text)
    }
}
