// src/encoder/mod.rs

pub mod container;
pub mod resample;

pub use container::{ContainerFile, encode_container};
pub use resample::interpolate_array;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;

/// How the export path changes sample rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMode {
    /// Two-point linear interpolation per channel.
    #[default]
    Linear,
    /// Windowed-sinc resampling.
    Sinc,
}

/// Raw chunks captured for one channel, in arrival order.
#[derive(Clone, Debug, Default)]
pub struct ChannelBuffer {
    chunks: Vec<Vec<f32>>,
    len: usize,
}

impl ChannelBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: Vec<f32>) {
        self.len += chunk.len();
        self.chunks.push(chunk);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chunks(&self) -> &[Vec<f32>] {
        &self.chunks
    }

    /// Concatenate all chunks into one buffer.
    pub fn merge(self) -> Result<Vec<f32>, EncodeError> {
        merge_buffers(&self.chunks, self.len)
    }
}

/// Copy `chunks` back to back into a buffer of exactly `total_len` samples.
pub fn merge_buffers(chunks: &[Vec<f32>], total_len: usize) -> Result<Vec<f32>, EncodeError> {
    let actual: usize = chunks.iter().map(|c| c.len()).sum();
    if actual != total_len {
        return Err(EncodeError::LengthMismatch { declared: total_len, actual });
    }
    let mut out = vec![0.0f32; total_len];
    let mut offset = 0;
    for chunk in chunks {
        out[offset..offset + chunk.len()].copy_from_slice(chunk);
        offset += chunk.len();
    }
    Ok(out)
}

/// `left[0], right[0], left[1], right[1], ...`
pub fn interleave(left: &[f32], right: &[f32]) -> Result<Vec<f32>, EncodeError> {
    if left.len() != right.len() {
        return Err(EncodeError::ChannelLengthMismatch { left: left.len(), right: right.len() });
    }
    let mut out = Vec::with_capacity(left.len() * 2);
    for (&l, &r) in left.iter().zip(right) {
        out.push(l);
        out.push(r);
    }
    Ok(out)
}

/// Everything the capture side hands over at stop.
#[derive(Clone, Debug)]
pub struct CapturedAudio {
    pub sample_rate: u32,
    pub channels: Vec<ChannelBuffer>,
}

/// Stateless merge → resample → interleave → encode pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResampleEncoder {
    pub mode: ResampleMode,
    /// Output rate; `None` keeps the capture rate.
    pub target_rate: Option<u32>,
}

impl ResampleEncoder {
    pub fn new(mode: ResampleMode, target_rate: Option<u32>) -> Self {
        Self { mode, target_rate }
    }

    pub fn encode(&self, captured: CapturedAudio) -> Result<ContainerFile, EncodeError> {
        let channel_count = captured.channels.len();
        if !(1..=2).contains(&channel_count) {
            return Err(EncodeError::UnsupportedChannels(channel_count));
        }
        if captured.sample_rate == 0 {
            return Err(EncodeError::InvalidSampleRate(0.0));
        }

        // 1) Merge chunks per channel
        let mut planar = captured
            .channels
            .into_iter()
            .map(ChannelBuffer::merge)
            .collect::<Result<Vec<_>, _>>()?;

        // 2) Optional rate change
        let out_rate = match self.target_rate {
            Some(rate) if rate != captured.sample_rate && rate > 0 => {
                planar = match self.mode {
                    ResampleMode::Linear => planar
                        .iter()
                        .map(|ch| interpolate_array(ch, rate as f64, captured.sample_rate as f64))
                        .collect::<Result<Vec<_>, _>>()?,
                    ResampleMode::Sinc => {
                        resample::resample_sinc(&planar, captured.sample_rate, rate)?
                    }
                };
                rate
            }
            _ => captured.sample_rate,
        };

        // 3) Interleave
        let samples = match planar.as_slice() {
            [mono] => mono.clone(),
            [left, right] => interleave(left, right)?,
            _ => unreachable!("channel count checked above"),
        };

        // 4) Container
        let file = ContainerFile::from_samples(&samples, out_rate, channel_count as u16)?;
        info!(
            "encoded {} frames, {} ch @ {} Hz ({} bytes)",
            file.frames(),
            channel_count,
            out_rate,
            file.bytes().len()
        );
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(chunks: &[&[f32]]) -> ChannelBuffer {
        let mut ch = ChannelBuffer::new();
        for c in chunks {
            ch.push(c.to_vec());
        }
        ch
    }

    #[test]
    fn merge_concatenates_in_order() {
        let merged = merge_buffers(&[vec![1.0, 2.0], vec![3.0], vec![]], 3).unwrap();
        assert_eq!(merged, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn merge_rejects_wrong_total() {
        let err = merge_buffers(&[vec![1.0, 2.0]], 3).unwrap_err();
        assert_eq!(err, EncodeError::LengthMismatch { declared: 3, actual: 2 });
    }

    #[test]
    fn interleave_alternates() {
        assert_eq!(interleave(&[1.0, 2.0], &[-1.0, -2.0]).unwrap(), vec![1.0, -1.0, 2.0, -2.0]);
        assert!(interleave(&[1.0], &[]).is_err());
    }

    #[test]
    fn stereo_encode_without_resample() {
        let captured = CapturedAudio {
            sample_rate: 8000,
            channels: vec![channel(&[&[0.5, 0.5], &[0.5]]), channel(&[&[-0.5], &[-0.5, -0.5]])],
        };
        let file = ResampleEncoder::default().encode(captured).unwrap();
        assert_eq!(file.sample_rate, 8000);
        assert_eq!(file.channel_count, 2);
        assert_eq!(file.frames(), 3);
        let pcm = file.pcm_bytes();
        assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), 16383);
        assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), -16383);
    }

    #[test]
    fn mono_linear_resample_changes_rate_and_length() {
        let captured = CapturedAudio {
            sample_rate: 48_000,
            channels: vec![channel(&[&vec![0.25; 4800]])],
        };
        let file = ResampleEncoder::new(ResampleMode::Linear, Some(16_000)).encode(captured).unwrap();
        assert_eq!(file.sample_rate, 16_000);
        assert_eq!(file.frames(), 1600);
    }

    #[test]
    fn rejects_unsupported_layouts() {
        let none = CapturedAudio { sample_rate: 8000, channels: vec![] };
        assert_eq!(
            ResampleEncoder::default().encode(none).unwrap_err(),
            EncodeError::UnsupportedChannels(0)
        );
        let uneven = CapturedAudio {
            sample_rate: 8000,
            channels: vec![channel(&[&[0.1, 0.2]]), channel(&[&[0.1]])],
        };
        assert!(matches!(
            ResampleEncoder::default().encode(uneven),
            Err(EncodeError::ChannelLengthMismatch { .. })
        ));
    }
}
