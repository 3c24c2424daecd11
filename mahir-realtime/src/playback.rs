//! Gapless playback scheduling for model speech.
//!
//! Audio segments arrive faster than real time, so each one is scheduled
//! at the tail of the previous one on the sink's clock. A barge-in
//! flushes everything scheduled and resets the tail to the present.

use crate::audio::{PLAYBACK_SAMPLE_RATE, decode_pcm16};
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Identifies one scheduled segment.
pub type SegmentId = u64;

/// An audio output clock and mixer.
pub trait PlaybackSink: Send + Sync {
    /// Current position of the output clock, in seconds.
    fn now(&self) -> f64;

    /// Schedule `samples` to start playing at clock time `start`.
    fn play(&self, id: SegmentId, samples: Vec<f32>, start: f64) -> Result<()>;

    /// Stop a segment immediately, whether playing or pending.
    fn stop(&self, id: SegmentId);

    /// Segments that have finished since the last call. Sinks that
    /// cannot report completion may leave this empty.
    fn drain_finished(&self) -> Vec<SegmentId> {
        Vec::new()
    }
}

#[derive(Debug)]
struct SchedulerState {
    next_start: f64,
    next_id: SegmentId,
    live: HashSet<SegmentId>,
}

/// Schedules decoded model speech back to back on a [`PlaybackSink`].
pub struct PlaybackScheduler {
    sink: Arc<dyn PlaybackSink>,
    sample_rate: u32,
    state: Mutex<SchedulerState>,
}

impl PlaybackScheduler {
    /// Create a scheduler over `sink` at the model output rate.
    pub fn new(sink: Arc<dyn PlaybackSink>) -> Self {
        Self::with_sample_rate(sink, PLAYBACK_SAMPLE_RATE)
    }

    /// Create a scheduler with an explicit sample rate.
    pub fn with_sample_rate(sink: Arc<dyn PlaybackSink>, sample_rate: u32) -> Self {
        Self {
            sink,
            sample_rate,
            state: Mutex::new(SchedulerState { next_start: 0.0, next_id: 0, live: HashSet::new() }),
        }
    }

    /// Decode one PCM16 mono segment and schedule it at the current
    /// tail, returning its start time.
    pub fn enqueue(&self, pcm: &[u8]) -> Result<f64> {
        let samples = decode_pcm16(pcm, 1)?.pop().unwrap_or_default();
        let duration = samples.len() as f64 / self.sample_rate as f64;

        let mut state = self.state.lock();
        for id in self.sink.drain_finished() {
            state.live.remove(&id);
        }

        let start = state.next_start.max(self.sink.now());
        let id = state.next_id;
        state.next_id += 1;

        self.sink.play(id, samples, start)?;
        state.live.insert(id);
        state.next_start = start + duration;
        tracing::trace!(segment = id, start, duration, "scheduled playback segment");
        Ok(start)
    }

    /// Stop everything scheduled and reset the tail to the present, so
    /// the next segment plays immediately.
    pub fn flush(&self) {
        let mut state = self.state.lock();
        for id in state.live.drain() {
            self.sink.stop(id);
        }
        state.next_start = self.sink.now();
        tracing::debug!("playback flushed");
    }

    /// Reset the tail at session start.
    pub fn reset_clock(&self) {
        let mut state = self.state.lock();
        state.live.clear();
        state.next_start = self.sink.now();
    }

    /// Segments currently scheduled or playing.
    pub fn live_count(&self) -> usize {
        let mut state = self.state.lock();
        for id in self.sink.drain_finished() {
            state.live.remove(&id);
        }
        state.live.len()
    }
}

impl std::fmt::Debug for PlaybackScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PlaybackScheduler")
            .field("sample_rate", &self.sample_rate)
            .field("next_start", &state.next_start)
            .field("live", &state.live.len())
            .finish()
    }
}

#[cfg(feature = "desktop-audio")]
pub use desktop::CpalPlayback;

#[cfg(feature = "desktop-audio")]
mod desktop {
    use super::{PlaybackSink, SegmentId};
    use crate::audio::PLAYBACK_SAMPLE_RATE;
    use crate::error::{LiveError, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct ActiveSegment {
        id: SegmentId,
        samples: Vec<f32>,
        start_sample: u64,
    }

    #[derive(Default)]
    struct MixerState {
        segments: Vec<ActiveSegment>,
        finished: Vec<SegmentId>,
    }

    /// Speaker output through the host audio stack.
    ///
    /// The clock is the number of samples the device has consumed, so
    /// scheduling is sample-accurate regardless of wall time. Output
    /// streams are not `Send`, so the stream lives on a dedicated
    /// thread; this handle only shares the mixer and the clock with it.
    pub struct CpalPlayback {
        mixer: Arc<Mutex<MixerState>>,
        played: Arc<AtomicU64>,
        sample_rate: u32,
        shutdown: Mutex<Option<std::sync::mpsc::Sender<()>>>,
    }

    impl CpalPlayback {
        /// Open the default output device at the model output rate.
        pub fn open() -> Result<Self> {
            let mixer = Arc::new(Mutex::new(MixerState::default()));
            let played = Arc::new(AtomicU64::new(0));
            let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();
            let (shutdown_tx, shutdown_rx) = std::sync::mpsc::channel::<()>();

            let thread_mixer = mixer.clone();
            let thread_played = played.clone();
            std::thread::Builder::new()
                .name("mahir-playback".to_string())
                .spawn(move || {
                    let stream = match open_output_stream(thread_mixer, thread_played) {
                        Ok(stream) => stream,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                    let _ = ready_tx.send(Ok(()));
                    // Err means the handle dropped its sender.
                    let _ = shutdown_rx.recv();
                    drop(stream);
                    tracing::debug!("playback thread released the speaker");
                })
                .map_err(|e| LiveError::permission(format!("playback thread spawn failed: {e}")))?;

            ready_rx
                .recv()
                .map_err(|_| LiveError::permission("playback thread exited before starting"))??;

            Ok(Self {
                mixer,
                played,
                sample_rate: PLAYBACK_SAMPLE_RATE,
                shutdown: Mutex::new(Some(shutdown_tx)),
            })
        }

        /// Release the output device. Also happens on drop.
        pub fn close(&self) {
            self.shutdown.lock().take();
        }
    }

    impl Drop for CpalPlayback {
        fn drop(&mut self) {
            self.close();
        }
    }

    fn open_output_stream(
        mixer: Arc<Mutex<MixerState>>,
        played: Arc<AtomicU64>,
    ) -> Result<cpal::Stream> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or(LiveError::UnsupportedPlatform)?;

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(PLAYBACK_SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = device
            .build_output_stream(
                &config,
                move |out: &mut [f32], _| {
                    let base = played.load(Ordering::Acquire);
                    let mut state = mixer.lock();
                    for (i, slot) in out.iter_mut().enumerate() {
                        let t = base + i as u64;
                        let mut mixed = 0.0f32;
                        for segment in &state.segments {
                            if t >= segment.start_sample {
                                let offset = (t - segment.start_sample) as usize;
                                if let Some(sample) = segment.samples.get(offset) {
                                    mixed += sample;
                                }
                            }
                        }
                        *slot = mixed.clamp(-1.0, 1.0);
                    }
                    let end = base + out.len() as u64;
                    let done: Vec<SegmentId> = state
                        .segments
                        .iter()
                        .filter(|s| s.start_sample + s.samples.len() as u64 <= end)
                        .map(|s| s.id)
                        .collect();
                    state.segments.retain(|s| !done.contains(&s.id));
                    state.finished.extend(done);
                    played.store(end, Ordering::Release);
                },
                |e| tracing::warn!("playback stream error: {e}"),
                None,
            )
            .map_err(|e| LiveError::permission(format!("speaker unavailable: {e}")))?;
        stream
            .play()
            .map_err(|e| LiveError::permission(format!("playback start failed: {e}")))?;
        Ok(stream)
    }

    impl PlaybackSink for CpalPlayback {
        fn now(&self) -> f64 {
            self.played.load(Ordering::Acquire) as f64 / self.sample_rate as f64
        }

        fn play(&self, id: SegmentId, samples: Vec<f32>, start: f64) -> Result<()> {
            let start_sample = (start * self.sample_rate as f64).round() as u64;
            self.mixer.lock().segments.push(ActiveSegment { id, samples, start_sample });
            Ok(())
        }

        fn stop(&self, id: SegmentId) {
            self.mixer.lock().segments.retain(|s| s.id != id);
        }

        fn drain_finished(&self) -> Vec<SegmentId> {
            std::mem::take(&mut self.mixer.lock().finished)
        }
    }
}
