//! Session traits: the seam between the conversation controller and a
//! concrete live transport.

use crate::audio::AudioFrame;
use crate::config::LiveConfig;
use crate::error::Result;
use crate::events::ServerEvent;
use async_trait::async_trait;
use futures::stream::Stream;
use secrecy::SecretString;
use std::pin::Pin;
use std::sync::Arc;

/// An open duplex live session.
#[async_trait]
pub trait LiveSession: Send + Sync {
    /// Unique id for this session.
    fn session_id(&self) -> &str;

    /// Whether the channel is still open.
    fn is_connected(&self) -> bool;

    /// Send one capture frame upstream.
    ///
    /// After the channel has closed this is a no-op, so a capture thread
    /// racing a teardown cannot fail the pipeline.
    async fn send_frame(&self, frame: &AudioFrame) -> Result<()>;

    /// Receive the next server event. `None` means the channel is done.
    async fn next_event(&self) -> Option<Result<ServerEvent>>;

    /// Event stream view over [`LiveSession::next_event`].
    fn events(&self) -> Pin<Box<dyn Stream<Item = Result<ServerEvent>> + Send + '_>> {
        Box::pin(futures::stream::unfold(self, |session| async move {
            let event = session.next_event().await?;
            Some((event, session))
        }))
    }

    /// Close the channel. Idempotent.
    async fn close(&self) -> Result<()>;
}

/// Shared handle to an open session.
pub type SharedSession = Arc<dyn LiveSession>;

/// Opens live sessions. The controller depends on this seam so tests can
/// inject scripted sessions without a network.
#[async_trait]
pub trait LiveConnector: Send + Sync {
    /// Open a session, resolving only once the server has acknowledged
    /// setup and the duplex channel is usable.
    async fn connect(&self, api_key: &SecretString, config: &LiveConfig) -> Result<SharedSession>;
}
