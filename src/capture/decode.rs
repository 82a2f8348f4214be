// src/capture/decode.rs

use crate::error::DecodeError;

/// Sample layouts a capture backend may hand over as raw bytes (little endian).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleFormat {
    F32,
    I16,
    U16,
}

impl SampleFormat {
    pub fn width(self) -> usize {
        match self {
            SampleFormat::F32 => 4,
            SampleFormat::I16 | SampleFormat::U16 => 2,
        }
    }
}

#[inline]
pub fn i16_to_f32(s: i16) -> f32 {
    s as f32 / i16::MAX as f32
}

#[inline]
pub fn u16_to_f32(s: u16) -> f32 {
    (s as f32 / u16::MAX as f32) * 2.0 - 1.0
}

/// Decode an interleaved byte chunk into one `Vec<f32>` per channel.
///
/// Nothing is returned on error; the caller drops the chunk.
pub fn decode_interleaved(
    bytes: &[u8],
    format: SampleFormat,
    channels: usize,
) -> Result<Vec<Vec<f32>>, DecodeError> {
    let width = format.width();
    if bytes.len() % width != 0 {
        return Err(DecodeError::Misaligned { len: bytes.len(), width });
    }

    let samples: Vec<f32> = match format {
        SampleFormat::F32 => {
            let mut out = Vec::with_capacity(bytes.len() / 4);
            for (i, b) in bytes.chunks_exact(4).enumerate() {
                let s = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                if !s.is_finite() {
                    return Err(DecodeError::NonFinite(i));
                }
                out.push(s);
            }
            out
        }
        SampleFormat::I16 => bytes
            .chunks_exact(2)
            .map(|b| i16_to_f32(i16::from_le_bytes([b[0], b[1]])))
            .collect(),
        SampleFormat::U16 => bytes
            .chunks_exact(2)
            .map(|b| u16_to_f32(u16::from_le_bytes([b[0], b[1]])))
            .collect(),
    };

    deinterleave(&samples, channels)
}

/// Split `L R L R ...` into planar channels.
pub fn deinterleave(samples: &[f32], channels: usize) -> Result<Vec<Vec<f32>>, DecodeError> {
    if channels == 0 {
        return Err(DecodeError::NoChannels);
    }
    if samples.len() % channels != 0 {
        return Err(DecodeError::PartialFrame { samples: samples.len(), channels });
    }
    let frames = samples.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (ch, &s) in planar.iter_mut().zip(frame) {
            ch.push(s);
        }
    }
    Ok(planar)
}
