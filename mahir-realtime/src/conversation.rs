//! Live conversation controller.
//!
//! Owns the full lifecycle of one voice session: credential lookup,
//! microphone acquisition, transport connection, event routing, and
//! teardown. Every async continuation carries the epoch it was started
//! under; a continuation whose epoch is stale does nothing except
//! release what it holds, so a rapid stop/start can never leak a
//! microphone or route events into the wrong session.

use crate::capture::{CaptureControl, CaptureSource, CaptureStream};
use crate::config::LiveConfig;
use crate::error::{LiveError, Result};
use crate::events::ServerEvent;
use crate::playback::PlaybackScheduler;
use crate::session::{LiveConnector, SharedSession};
use crate::transcript::TranscriptReconciler;
use mahir_session::CredentialStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Connection lifecycle of a live conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session. The initial state, and the state after a user stop.
    #[default]
    Idle,
    /// Start requested; acquiring the microphone and the channel.
    Connecting,
    /// Duplex channel open, audio flowing.
    Connected,
    /// The server ended the session.
    Disconnected,
    /// The session failed.
    Error(String),
}

struct ActiveSession {
    epoch: u64,
    session: SharedSession,
    control: CaptureControl,
    feeder: JoinHandle<()>,
    pump: JoinHandle<()>,
}

struct Inner {
    connector: Arc<dyn LiveConnector>,
    capture: Arc<dyn CaptureSource>,
    credentials: CredentialStore,
    config: LiveConfig,
    scheduler: Arc<PlaybackScheduler>,
    transcript: Arc<TranscriptReconciler>,
    // Bumped by every start and stop. A continuation holding an older
    // value must not touch shared state.
    epoch: AtomicU64,
    state_tx: watch::Sender<ConnectionState>,
    active: tokio::sync::Mutex<Option<ActiveSession>>,
}

/// Controller for live voice conversations with the tutor.
#[derive(Clone)]
pub struct LiveConversation {
    inner: Arc<Inner>,
}

impl LiveConversation {
    /// Build a controller over the given collaborators.
    pub fn new(
        connector: Arc<dyn LiveConnector>,
        capture: Arc<dyn CaptureSource>,
        scheduler: Arc<PlaybackScheduler>,
        credentials: CredentialStore,
        config: LiveConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        Self {
            inner: Arc::new(Inner {
                connector,
                capture,
                credentials,
                config,
                scheduler,
                transcript: Arc::new(TranscriptReconciler::new()),
                epoch: AtomicU64::new(0),
                state_tx,
                active: tokio::sync::Mutex::new(None),
            }),
        }
    }

    /// Open a session and start streaming. Resolves once the duplex
    /// channel is live, or with the error that prevented it.
    pub async fn start(&self) -> Result<()> {
        let inner = &self.inner;

        if inner.active.lock().await.is_some() {
            return Err(LiveError::AlreadyActive);
        }
        if !inner.capture.is_supported() {
            return Err(LiveError::UnsupportedPlatform);
        }
        let api_key = inner.credentials.api_key()?.ok_or(LiveError::MissingCredential)?;

        let epoch = inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        inner.transcript.reset();
        inner.set_state(ConnectionState::Connecting);

        let stream = match inner.capture.acquire().await {
            Ok(stream) => stream,
            Err(e) => {
                // A stop during acquisition owns the state now.
                if inner.epoch.load(Ordering::SeqCst) != epoch {
                    return Ok(());
                }
                inner.set_state(ConnectionState::Error(e.to_string()));
                return Err(e);
            }
        };
        if inner.epoch.load(Ordering::SeqCst) != epoch {
            // Stopped while acquiring; release the microphone and yield.
            stream.control.stop();
            return Ok(());
        }

        let session = match inner.connector.connect(&api_key, &inner.config).await {
            Ok(session) => session,
            Err(e) => {
                stream.control.stop();
                if inner.epoch.load(Ordering::SeqCst) != epoch {
                    return Ok(());
                }
                inner.set_state(ConnectionState::Error(e.to_string()));
                return Err(e);
            }
        };
        if inner.epoch.load(Ordering::SeqCst) != epoch {
            stream.control.stop();
            let _ = session.close().await;
            return Ok(());
        }

        inner.scheduler.reset_clock();

        // Register under the lock so a teardown racing these spawns
        // blocks until the session is findable.
        let mut active = inner.active.lock().await;
        if inner.epoch.load(Ordering::SeqCst) != epoch {
            stream.control.stop();
            let _ = session.close().await;
            return Ok(());
        }

        let CaptureStream { mut frames, control } = stream;
        let feeder_session = session.clone();
        let feeder = tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                if feeder_session.send_frame(&frame).await.is_err() {
                    break;
                }
            }
        });
        let pump = tokio::spawn(run_pump(inner.clone(), session.clone(), epoch));

        *active = Some(ActiveSession { epoch, session, control, feeder, pump });
        inner.set_state(ConnectionState::Connected);
        tracing::info!(epoch, "live conversation connected");
        Ok(())
    }

    /// Stop the session and return to [`ConnectionState::Idle`]. Safe to
    /// call from any state, including mid-connect.
    pub async fn stop(&self) {
        let inner = &self.inner;
        inner.epoch.fetch_add(1, Ordering::SeqCst);

        let taken = inner.active.lock().await.take();
        if let Some(active) = taken {
            inner.scheduler.flush();
            let _ = active.session.close().await;
            active.feeder.abort();
            active.pump.abort();
            active.control.stop();
            tracing::info!(epoch = active.epoch, "live conversation stopped");
        }
        inner.set_state(ConnectionState::Idle);
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.state_tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// The transcript for this controller.
    pub fn transcript(&self) -> Arc<TranscriptReconciler> {
        self.inner.transcript.clone()
    }

    /// The playback scheduler for this controller.
    pub fn playback(&self) -> Arc<PlaybackScheduler> {
        self.inner.scheduler.clone()
    }
}

impl std::fmt::Debug for LiveConversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveConversation").field("state", &self.state()).finish_non_exhaustive()
    }
}

impl Inner {
    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    /// Dismantle the session registered under `epoch`. A stale epoch
    /// means someone else already tore it down; do nothing.
    async fn teardown(self: &Arc<Self>, epoch: u64, final_state: ConnectionState) {
        let mut guard = self.active.lock().await;
        let Some(active) = guard.take_if(|a| a.epoch == epoch) else {
            return;
        };
        drop(guard);

        self.scheduler.flush();
        let _ = active.session.close().await;
        active.feeder.abort();
        active.control.stop();
        self.set_state(final_state);
        tracing::info!(epoch, "live conversation torn down");
        // Last: the pump calls teardown on its own handle.
        active.pump.abort();
    }
}

/// Route server events into the transcript and the playback scheduler
/// until the channel ends, then tear the session down.
async fn run_pump(inner: Arc<Inner>, session: SharedSession, epoch: u64) {
    loop {
        let event = session.next_event().await;
        if inner.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        match event {
            Some(Ok(ServerEvent::InputTranscript { text })) => inner.transcript.append_input(&text),
            Some(Ok(ServerEvent::OutputTranscript { text })) => {
                inner.transcript.append_output(&text);
            }
            Some(Ok(ServerEvent::TurnComplete)) => {
                inner.transcript.commit_turn();
            }
            Some(Ok(ServerEvent::Interrupted)) => inner.scheduler.flush(),
            Some(Ok(ServerEvent::Audio { data })) => {
                if let Err(e) = inner.scheduler.enqueue(&data) {
                    tracing::warn!("dropping malformed audio segment: {e}");
                    inner.teardown(epoch, ConnectionState::Error(e.to_string())).await;
                    return;
                }
            }
            Some(Ok(ServerEvent::Error { error })) => {
                tracing::warn!(code = ?error.code, "server error: {}", error.message);
                inner.teardown(epoch, ConnectionState::Error(error.message)).await;
                return;
            }
            Some(Ok(ServerEvent::Closed)) | None => {
                inner.teardown(epoch, ConnectionState::Disconnected).await;
                return;
            }
            Some(Ok(ServerEvent::Opened)) | Some(Ok(ServerEvent::Unknown)) => {}
            Some(Err(e)) => {
                tracing::warn!("event stream failed: {e}");
                inner.teardown(epoch, ConnectionState::Error(e.to_string())).await;
                return;
            }
        }
    }
}
