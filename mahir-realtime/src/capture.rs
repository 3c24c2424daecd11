//! Microphone capture.
//!
//! Capture runs on its own OS thread because host audio streams are not
//! `Send`. Frames cross into the async world over a bounded channel; if
//! the consumer falls behind, frames are dropped rather than stalling
//! the audio callback.

use crate::audio::AudioFrame;
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Frames buffered between the capture thread and the feeder task.
pub const CAPTURE_CHANNEL_DEPTH: usize = 32;

/// Handle that releases the microphone. Stopping twice is a no-op, and
/// dropping the handle stops capture too.
pub struct CaptureControl {
    on_stop: parking_lot::Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl CaptureControl {
    /// Wrap the action that releases the device.
    pub fn new(on_stop: impl FnOnce() + Send + 'static) -> Self {
        Self { on_stop: parking_lot::Mutex::new(Some(Box::new(on_stop))) }
    }

    /// Release the microphone.
    pub fn stop(&self) {
        if let Some(release) = self.on_stop.lock().take() {
            release();
        }
    }
}

impl Drop for CaptureControl {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CaptureControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureControl")
            .field("stopped", &self.on_stop.lock().is_none())
            .finish()
    }
}

/// An acquired microphone: a stream of capture frames plus the handle
/// that releases the device.
#[derive(Debug)]
pub struct CaptureStream {
    /// Fixed-size capture frames, in order.
    pub frames: mpsc::Receiver<AudioFrame>,
    /// Releases the device.
    pub control: CaptureControl,
}

/// Acquires microphones. The controller depends on this seam so tests
/// can feed scripted audio without real hardware.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Whether this platform can capture at all.
    fn is_supported(&self) -> bool;

    /// Acquire the microphone and start streaming frames.
    async fn acquire(&self) -> Result<CaptureStream>;
}

#[cfg(feature = "desktop-audio")]
pub use desktop::CpalCapture;

#[cfg(feature = "desktop-audio")]
mod desktop {
    use super::{CAPTURE_CHANNEL_DEPTH, CaptureControl, CaptureSource, CaptureStream};
    use crate::audio::{AudioFrame, CAPTURE_FRAME_SAMPLES, CAPTURE_SAMPLE_RATE, FrameChunker};
    use crate::error::{LiveError, Result};
    use async_trait::async_trait;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use tokio::sync::{mpsc, oneshot};

    /// Microphone capture through the host audio stack.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct CpalCapture;

    impl CpalCapture {
        /// Create a capture source for the default input device.
        pub fn new() -> Self {
            Self
        }
    }

    #[async_trait]
    impl CaptureSource for CpalCapture {
        fn is_supported(&self) -> bool {
            cpal::default_host().default_input_device().is_some()
        }

        async fn acquire(&self) -> Result<CaptureStream> {
            let (frame_tx, frame_rx) = mpsc::channel(CAPTURE_CHANNEL_DEPTH);
            let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();
            let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();

            std::thread::Builder::new()
                .name("mahir-capture".to_string())
                .spawn(move || run_capture_thread(frame_tx, ready_tx, stop_rx))
                .map_err(|e| LiveError::permission(format!("capture thread spawn failed: {e}")))?;

            ready_rx
                .await
                .map_err(|_| LiveError::permission("capture thread exited before starting"))??;

            let control = CaptureControl::new(move || drop(stop_tx));
            Ok(CaptureStream { frames: frame_rx, control })
        }
    }

    /// Owns the input stream for its whole lifetime. Blocks on the stop
    /// channel; the control handle dropping its sender unblocks us.
    fn run_capture_thread(
        frame_tx: mpsc::Sender<AudioFrame>,
        ready_tx: oneshot::Sender<Result<()>>,
        stop_rx: std::sync::mpsc::Receiver<()>,
    ) {
        let stream = match open_input_stream(frame_tx) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        if let Err(e) = stream.play() {
            let _ = ready_tx.send(Err(LiveError::permission(format!("stream start failed: {e}"))));
            return;
        }
        let _ = ready_tx.send(Ok(()));

        // Err means every control handle is gone.
        let _ = stop_rx.recv();
        drop(stream);
        tracing::debug!("capture thread released the microphone");
    }

    fn open_input_stream(frame_tx: mpsc::Sender<AudioFrame>) -> Result<cpal::Stream> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(LiveError::UnsupportedPlatform)?;

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(CAPTURE_SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        let mut chunker = FrameChunker::new(CAPTURE_FRAME_SAMPLES);
        let stream = device
            .build_input_stream(
                &config,
                move |samples: &[f32], _| {
                    for frame in chunker.push(samples) {
                        // Audio callbacks must not block; drop on backpressure.
                        if frame_tx.try_send(frame).is_err() {
                            tracing::trace!("capture frame dropped, consumer is behind");
                        }
                    }
                },
                |e| tracing::warn!("capture stream error: {e}"),
                None,
            )
            .map_err(|e| LiveError::permission(format!("microphone unavailable: {e}")))?;
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn control_stop_runs_release_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let control = CaptureControl::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        control.stop();
        control.stop();
        drop(control);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_control_releases() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        drop(CaptureControl::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
