//! Offline WAV recording of capture audio, for practicing without a
//! live session.

use crate::audio::{AudioFrame, CAPTURE_SAMPLE_RATE};
use crate::error::{LiveError, Result};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// A finished recording on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    /// Where the WAV file landed.
    pub path: PathBuf,
    /// When recording started.
    pub timestamp: DateTime<Utc>,
    /// Recorded duration in seconds.
    pub duration_secs: f64,
}

/// Writes capture frames to a 16kHz mono WAV file.
pub struct TurnRecorder {
    writer: hound::WavWriter<BufWriter<File>>,
    path: PathBuf,
    timestamp: DateTime<Utc>,
    samples_written: u64,
}

impl TurnRecorder {
    /// Open a recorder at `path`, truncating any existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: CAPTURE_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(&path, spec)
            .map_err(|e| LiveError::recording(format!("cannot create {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "recording started");
        Ok(Self { writer, path, timestamp: Utc::now(), samples_written: 0 })
    }

    /// Append one capture frame.
    pub fn write_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        for bytes in frame.data().chunks_exact(2) {
            let sample = i16::from_le_bytes([bytes[0], bytes[1]]);
            self.writer
                .write_sample(sample)
                .map_err(|e| LiveError::recording(format!("write failed: {e}")))?;
            self.samples_written += 1;
        }
        Ok(())
    }

    /// Finalize the WAV header and return the recording.
    pub fn finish(self) -> Result<Recording> {
        let duration_secs = self.samples_written as f64 / CAPTURE_SAMPLE_RATE as f64;
        self.writer
            .finalize()
            .map_err(|e| LiveError::recording(format!("finalize failed: {e}")))?;
        tracing::debug!(path = %self.path.display(), duration_secs, "recording finished");
        Ok(Recording { path: self.path, timestamp: self.timestamp, duration_secs })
    }
}

impl std::fmt::Debug for TurnRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnRecorder")
            .field("path", &self.path)
            .field("samples_written", &self.samples_written)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_frames_to_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("practice.wav");

        let mut recorder = TurnRecorder::create(&path).unwrap();
        let frame = AudioFrame::from_samples(&vec![0.25; CAPTURE_SAMPLE_RATE as usize]);
        recorder.write_frame(&frame).unwrap();
        let recording = recorder.finish().unwrap();

        assert_eq!(recording.path, path);
        assert!((recording.duration_secs - 1.0).abs() < f64::EPSILON);

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, CAPTURE_SAMPLE_RATE);
        assert_eq!(spec.channels, 1);
        assert_eq!(reader.len(), CAPTURE_SAMPLE_RATE);
    }

    #[test]
    fn empty_recording_finalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        let recording = TurnRecorder::create(&path).unwrap().finish().unwrap();
        assert_eq!(recording.duration_secs, 0.0);
        assert!(path.exists());
    }

    #[test]
    fn unwritable_path_is_a_recording_error() {
        let err = TurnRecorder::create("/nonexistent-dir/practice.wav").unwrap_err();
        assert!(matches!(err, LiveError::Recording(_)));
    }
}
