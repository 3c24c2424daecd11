//! PCM16 codec utilities and capture framing.
//!
//! Everything on the wire is 16-bit little-endian PCM carried as base64
//! text; everything in the processing pipeline is `f32` samples in
//! [-1.0, 1.0]. This module owns the conversion in both directions.

use crate::error::{LiveError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Sample rate of captured microphone audio.
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Sample rate of model audio output.
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// Samples per capture window sent upstream.
pub const CAPTURE_FRAME_SAMPLES: usize = 4096;

/// MIME type attached to every outbound capture frame.
pub const CAPTURE_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// PCM16 mono format description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count (1 = mono).
    pub channels: u16,
}

impl AudioFormat {
    /// Capture-side format: 16kHz mono.
    pub fn capture() -> Self {
        Self { sample_rate: CAPTURE_SAMPLE_RATE, channels: 1 }
    }

    /// Playback-side format: 24kHz mono.
    pub fn playback() -> Self {
        Self { sample_rate: PLAYBACK_SAMPLE_RATE, channels: 1 }
    }

    /// Duration in seconds of `sample_count` frames at this rate.
    pub fn duration_secs(&self, sample_count: usize) -> f64 {
        sample_count as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}

/// Quantize float samples to PCM16 little-endian bytes.
///
/// Out-of-range input is clamped rather than wrapped, so a slightly hot
/// microphone clips instead of producing full-scale pops.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let quantized = (sample * 32768.0).clamp(-32768.0, 32767.0) as i16;
        bytes.extend_from_slice(&quantized.to_le_bytes());
    }
    bytes
}

/// Decode PCM16 little-endian bytes into per-channel float samples.
///
/// Returns one `Vec<f32>` per channel, deinterleaved. Fails if the byte
/// length does not divide evenly into whole frames.
pub fn decode_pcm16(bytes: &[u8], channels: u16) -> Result<Vec<Vec<f32>>> {
    if channels == 0 {
        return Err(LiveError::codec("channel count must be at least 1"));
    }
    let frame_bytes = channels as usize * 2;
    if bytes.len() % frame_bytes != 0 {
        return Err(LiveError::codec(format!(
            "byte length {} is not a whole number of {}-channel PCM16 frames",
            bytes.len(),
            channels
        )));
    }

    let frame_count = bytes.len() / frame_bytes;
    let mut out = vec![Vec::with_capacity(frame_count); channels as usize];
    for frame in bytes.chunks_exact(frame_bytes) {
        for (channel, sample_bytes) in frame.chunks_exact(2).enumerate() {
            let sample = i16::from_le_bytes([sample_bytes[0], sample_bytes[1]]);
            out[channel].push(sample as f32 / 32768.0);
        }
    }
    Ok(out)
}

/// Encode raw bytes for the wire.
pub fn to_wire(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a wire payload back to raw bytes.
pub fn from_wire(encoded: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded).map_err(|e| LiveError::codec(format!("invalid base64 payload: {e}")))
}

/// One immutable capture window, already quantized to PCM16.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    data: Vec<u8>,
}

impl AudioFrame {
    /// Quantize a window of float samples into a frame.
    pub fn from_samples(samples: &[f32]) -> Self {
        Self { data: encode_pcm16(samples) }
    }

    /// Raw PCM16 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of mono samples in the frame.
    pub fn sample_count(&self) -> usize {
        self.data.len() / 2
    }

    /// Base64 wire form.
    pub fn to_wire(&self) -> String {
        to_wire(&self.data)
    }
}

/// Accumulates capture samples and emits fixed-size frames.
///
/// Samples left over after the last whole frame stay buffered for the
/// next push, so nothing is dropped at window boundaries.
#[derive(Debug)]
pub struct FrameChunker {
    buf: Vec<f32>,
    frame_len: usize,
}

impl Default for FrameChunker {
    fn default() -> Self {
        Self::new(CAPTURE_FRAME_SAMPLES)
    }
}

impl FrameChunker {
    /// Create a chunker emitting frames of `frame_len` samples.
    pub fn new(frame_len: usize) -> Self {
        Self { buf: Vec::with_capacity(frame_len * 2), frame_len }
    }

    /// Push captured samples, returning every whole frame now available.
    pub fn push(&mut self, samples: &[f32]) -> Vec<AudioFrame> {
        self.buf.extend_from_slice(samples);
        let mut frames = Vec::new();
        while self.buf.len() >= self.frame_len {
            let rest = self.buf.split_off(self.frame_len);
            frames.push(AudioFrame::from_samples(&self.buf));
            self.buf = rest;
        }
        frames
    }

    /// Samples currently buffered below one frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_quantizes_and_clamps() {
        let bytes = encode_pcm16(&[0.0, 1.0, -1.0, 2.0, -2.0]);
        let samples: Vec<i16> =
            bytes.chunks_exact(2).map(|b| i16::from_le_bytes([b[0], b[1]])).collect();
        assert_eq!(samples, vec![0, 32767, -32768, 32767, -32768]);
    }

    #[test]
    fn decode_deinterleaves_stereo() {
        // Two frames of L=0.5-ish, R=-0.5-ish.
        let left = 16384i16;
        let right = -16384i16;
        let mut bytes = Vec::new();
        for _ in 0..2 {
            bytes.extend_from_slice(&left.to_le_bytes());
            bytes.extend_from_slice(&right.to_le_bytes());
        }
        let channels = decode_pcm16(&bytes, 2).unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0], vec![0.5, 0.5]);
        assert_eq!(channels[1], vec![-0.5, -0.5]);
    }

    #[test]
    fn decode_rejects_ragged_length() {
        assert!(decode_pcm16(&[0, 1, 2], 1).is_err());
        assert!(decode_pcm16(&[0, 1], 2).is_err());
        assert!(decode_pcm16(&[], 0).is_err());
    }

    #[test]
    fn codec_roundtrip_preserves_quantized_values() {
        let samples = vec![0.0, 0.25, -0.25, 0.999, -0.999];
        let bytes = encode_pcm16(&samples);
        let decoded = &decode_pcm16(&bytes, 1).unwrap()[0];
        for (a, b) in samples.iter().zip(decoded) {
            assert!((a - b).abs() < 1.0 / 32768.0 + f32::EPSILON);
        }
    }

    #[test]
    fn wire_roundtrip() {
        let bytes = vec![0u8, 255, 128, 7];
        assert_eq!(from_wire(&to_wire(&bytes)).unwrap(), bytes);
        assert!(from_wire("not!!base64").is_err());
    }

    #[test]
    fn chunker_emits_whole_frames_only() {
        let mut chunker = FrameChunker::new(4);
        assert!(chunker.push(&[0.1, 0.2, 0.3]).is_empty());
        assert_eq!(chunker.pending(), 3);

        let frames = chunker.push(&[0.4, 0.5]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].sample_count(), 4);
        assert_eq!(chunker.pending(), 1);
    }

    #[test]
    fn chunker_emits_multiple_frames_per_push() {
        let mut chunker = FrameChunker::new(2);
        let frames = chunker.push(&[0.0; 7]);
        assert_eq!(frames.len(), 3);
        assert_eq!(chunker.pending(), 1);
    }

    #[test]
    fn format_duration() {
        let format = AudioFormat::playback();
        assert!((format.duration_secs(24_000) - 1.0).abs() < f64::EPSILON);
        assert!((AudioFormat::capture().duration_secs(4096) - 0.256).abs() < 1e-9);
    }
}
