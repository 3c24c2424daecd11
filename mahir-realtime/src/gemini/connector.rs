//! Connector wiring the controller to the Gemini transport.

use crate::config::LiveConfig;
use crate::error::Result;
use crate::gemini::GeminiLiveSession;
use crate::session::{LiveConnector, SharedSession};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;

/// Opens [`GeminiLiveSession`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiLiveConnector;

impl GeminiLiveConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LiveConnector for GeminiLiveConnector {
    async fn connect(&self, api_key: &SecretString, config: &LiveConfig) -> Result<SharedSession> {
        let session = GeminiLiveSession::connect(api_key, config).await?;
        Ok(Arc::new(session))
    }
}
