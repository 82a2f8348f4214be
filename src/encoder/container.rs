// src/encoder/container.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::Path;

use crate::error::EncodeError;

/// Size of the canonical RIFF/WAVE header written by `encode_container`.
pub const HEADER_LEN: usize = 44;
pub const BITS_PER_SAMPLE: u16 = 16;
const PCM_FORMAT: u16 = 1;
/// Largest `data` chunk whose RIFF size (`36 + len`) still fits in 32 bits.
pub const MAX_DATA_LEN: usize = u32::MAX as usize - 36;

/// Convert one float sample to 16-bit PCM.
///
/// Samples are clamped to [-1, 1] first so hot input clips instead of wrapping.
#[inline]
pub fn to_pcm16(s: f32) -> i16 {
    if s.is_finite() {
        (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
    } else {
        0
    }
}

/// Byte length of the `data` chunk for `samples` 16-bit samples.
pub fn data_chunk_len(samples: usize) -> Result<u32, EncodeError> {
    let bytes = samples.checked_mul(2).ok_or(EncodeError::TooLarge { bytes: usize::MAX })?;
    if bytes > MAX_DATA_LEN {
        return Err(EncodeError::TooLarge { bytes });
    }
    Ok(bytes as u32)
}

/// Serialize interleaved samples as a 16-bit PCM RIFF/WAVE byte buffer.
pub fn encode_container(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>, EncodeError> {
    let data_len = data_chunk_len(samples.len())?;
    let block_align = channels
        .checked_mul(BITS_PER_SAMPLE / 8)
        .ok_or(EncodeError::UnsupportedChannels(channels as usize))?;
    let byte_rate = sample_rate
        .checked_mul(block_align as u32)
        .ok_or(EncodeError::InvalidSampleRate(sample_rate as f64))?;

    let mut buf = Vec::with_capacity(HEADER_LEN + samples.len() * 2);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_len).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data sub-chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for &s in samples {
        buf.extend_from_slice(&to_pcm16(s).to_le_bytes());
    }

    Ok(buf)
}

/// A finished recording, ready to hand to whatever stores it.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerFile {
    pub sample_rate: u32,
    pub channel_count: u16,
    pub bits_per_sample: u16,
    bytes: Vec<u8>,
}

impl ContainerFile {
    pub fn from_samples(samples: &[f32], sample_rate: u32, channel_count: u16) -> Result<Self, EncodeError> {
        Ok(Self {
            sample_rate,
            channel_count,
            bits_per_sample: BITS_PER_SAMPLE,
            bytes: encode_container(samples, sample_rate, channel_count)?,
        })
    }

    /// The complete file, header included.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn pcm_bytes(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..]
    }

    pub fn frames(&self) -> usize {
        let frame_bytes = self.channel_count as usize * 2;
        if frame_bytes == 0 { 0 } else { self.pcm_bytes().len() / frame_bytes }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn suggested_filename(&self, at: DateTime<Local>) -> String {
        format!("recording-{}.wav", at.format("%Y%m%d-%H%M%S"))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn u16_at(b: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([b[at], b[at + 1]])
    }

    fn u32_at(b: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
    }

    #[test]
    fn header_layout() {
        let bytes = encode_container(&[0.0, 0.5, -0.5, 1.0], 44_100, 2).unwrap();
        assert_eq!(bytes.len(), 44 + 8);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4), 36 + 8);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(&bytes, 16), 16);
        assert_eq!(u16_at(&bytes, 20), 1);
        assert_eq!(u16_at(&bytes, 22), 2);
        assert_eq!(u32_at(&bytes, 24), 44_100);
        assert_eq!(u32_at(&bytes, 28), 44_100 * 4);
        assert_eq!(u16_at(&bytes, 32), 4);
        assert_eq!(u16_at(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), 8);
    }

    #[test]
    fn samples_scale_by_0x7fff() {
        let bytes = encode_container(&[1.0, -1.0, 0.5], 8000, 1).unwrap();
        assert_eq!(i16::from_le_bytes([bytes[44], bytes[45]]), 0x7FFF);
        assert_eq!(i16::from_le_bytes([bytes[46], bytes[47]]), -0x7FFF);
        assert_eq!(i16::from_le_bytes([bytes[48], bytes[49]]), 16383);
    }

    #[test]
    fn hot_samples_clip_instead_of_wrapping() {
        assert_eq!(to_pcm16(1.7), i16::MAX);
        assert_eq!(to_pcm16(-3.0), -i16::MAX);
        assert_eq!(to_pcm16(f32::NAN), 0);
    }

    #[test]
    fn data_length_must_fit_the_riff_size_field() {
        assert_eq!(data_chunk_len(0).unwrap(), 0);
        assert_eq!(data_chunk_len(MAX_DATA_LEN / 2).unwrap() as usize, MAX_DATA_LEN - 1);

        let too_many = MAX_DATA_LEN / 2 + 1;
        assert_eq!(
            data_chunk_len(too_many),
            Err(EncodeError::TooLarge { bytes: too_many * 2 })
        );
        // 2^31 + 1 samples would wrap the data length to 2
        assert!(data_chunk_len((1usize << 31) + 1).is_err());
        assert_eq!(data_chunk_len(usize::MAX), Err(EncodeError::TooLarge { bytes: usize::MAX }));
    }

    #[test]
    fn container_metadata() {
        let file = ContainerFile::from_samples(&[0.0; 16_000], 8000, 2).unwrap();
        assert_eq!(file.frames(), 8000);
        assert_eq!(file.duration_secs(), 1.0);
        assert_eq!(file.pcm_bytes().len(), 32_000);
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(file.suggested_filename(at), "recording-20240309-140507.wav");
    }
}
