// src/capture/mod.rs

pub mod decode;

pub use decode::{SampleFormat, decode_interleaved, deinterleave};

use serde::{Deserialize, Serialize};

use crate::encoder::{CapturedAudio, ChannelBuffer};
use crate::error::DecodeError;

/// Channels beyond this are dropped; the container holds mono or stereo.
pub const MAX_EXPORT_CHANNELS: usize = 2;

/// Signal shown in the waveform view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplaySource {
    #[default]
    FirstChannel,
    /// Average of all captured channels.
    MonoMix,
}

/// Accumulates raw per-channel audio for one recording.
#[derive(Clone, Debug)]
pub struct ChannelCapture {
    sample_rate: u32,
    input_channels: usize,
    source: DisplaySource,
    channels: Vec<ChannelBuffer>,
    /// Interleaved sample count across all input channels.
    recorded_len: usize,
}

impl ChannelCapture {
    pub fn new(sample_rate: u32, input_channels: usize, source: DisplaySource) -> Self {
        let kept = input_channels.clamp(1, MAX_EXPORT_CHANNELS);
        Self {
            sample_rate,
            input_channels: input_channels.max(1),
            source,
            channels: vec![ChannelBuffer::new(); kept],
            recorded_len: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    pub fn recorded_len(&self) -> usize {
        self.recorded_len
    }

    pub fn frames(&self) -> usize {
        self.channels.first().map(ChannelBuffer::len).unwrap_or(0)
    }

    /// Store one planar chunk and return the samples to display.
    pub fn push_planar(&mut self, planar: Vec<Vec<f32>>) -> Result<Vec<f32>, DecodeError> {
        if planar.len() != self.input_channels {
            return Err(DecodeError::ChannelCountMismatch {
                expected: self.input_channels,
                actual: planar.len(),
            });
        }
        let frames = planar[0].len();
        if planar.iter().any(|ch| ch.len() != frames) {
            return Err(DecodeError::PartialFrame {
                samples: planar.iter().map(Vec::len).sum(),
                channels: planar.len(),
            });
        }

        let display = match self.source {
            DisplaySource::FirstChannel => planar[0].clone(),
            DisplaySource::MonoMix => {
                let n = planar.len() as f32;
                (0..frames)
                    .map(|i| planar.iter().map(|ch| ch[i]).sum::<f32>() / n)
                    .collect()
            }
        };

        self.recorded_len += frames * self.input_channels;
        for (buf, ch) in self.channels.iter_mut().zip(planar) {
            buf.push(ch);
        }
        Ok(display)
    }

    /// Decode and store an interleaved byte chunk. A malformed chunk leaves
    /// the capture untouched.
    pub fn push_bytes(&mut self, bytes: &[u8], format: SampleFormat) -> Result<Vec<f32>, DecodeError> {
        let planar = decode_interleaved(bytes, format, self.input_channels)?;
        self.push_planar(planar)
    }

    /// Same as `push_bytes` for already converted interleaved floats.
    pub fn push_interleaved(&mut self, samples: &[f32]) -> Result<Vec<f32>, DecodeError> {
        let planar = deinterleave(samples, self.input_channels)?;
        self.push_planar(planar)
    }

    /// Hand the buffers over to the encoder.
    pub fn finish(self) -> CapturedAudio {
        CapturedAudio { sample_rate: self.sample_rate, channels: self.channels }
    }
}
