//! HTTP client for the Gemini `generateContent` endpoint.

use crate::error::{RequestError, Result};
use crate::types::{GenerateContentRequest, GenerateContentResponse};
use secrecy::{ExposeSecret, SecretString};
use std::sync::LazyLock;
use url::Url;

static DEFAULT_BASE_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://generativelanguage.googleapis.com/v1beta/")
        .expect("unreachable error: failed to parse default base URL")
});

/// Client for the Gemini REST API.
///
/// Holds the API credential and a connection-pooled HTTP client; cheap to
/// clone and share.
#[derive(Clone)]
pub struct Gemini {
    api_key: SecretString,
    http: reqwest::Client,
    base_url: Url,
}

impl Gemini {
    /// Create a client with the default base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.clone())
    }

    /// Create a client against a non-default base URL (tests, proxies).
    pub fn with_base_url(api_key: impl Into<String>, base_url: Url) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Perform a single `generateContent` round trip against `model`.
    pub(crate) async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let mut url = self.base_url.join(&format!("models/{model}:generateContent"))?;
        url.query_pairs_mut().append_pair("key", self.api_key.expose_secret());

        tracing::debug!(%model, "sending generateContent request");
        let response = self.http.post(url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let description = response.text().await.ok().filter(|b| !b.is_empty());
            tracing::warn!(%model, code = status.as_u16(), "generateContent request rejected");
            return Err(RequestError::BadResponse { code: status.as_u16(), description });
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }
}

impl std::fmt::Debug for Gemini {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gemini").field("base_url", &self.base_url.as_str()).finish_non_exhaustive()
    }
}
