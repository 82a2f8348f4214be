// src/error.rs

use thiserror::Error;

/// Failures while turning channel buffers into a PCM container.
#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    #[error("chunks hold {actual} samples but {declared} were declared")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("channel buffers differ in length (left {left}, right {right})")]
    ChannelLengthMismatch { left: usize, right: usize },

    #[error("unsupported channel count {0} (expected 1 or 2)")]
    UnsupportedChannels(usize),

    #[error("invalid sample rate {0}")]
    InvalidSampleRate(f64),

    #[error("resampler failed: {0}")]
    Resampler(String),

    #[error("{bytes} bytes of PCM data do not fit a RIFF container")]
    TooLarge { bytes: usize },
}

/// Failures while decoding a raw chunk from the capture side.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("chunk of {len} bytes is not a multiple of the {width}-byte sample width")]
    Misaligned { len: usize, width: usize },

    #[error("chunk of {samples} samples does not divide into {channels} channels")]
    PartialFrame { samples: usize, channels: usize },

    #[error("channel count must be at least 1")]
    NoChannels,

    #[error("expected {expected} channels, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },

    #[error("non-finite sample at index {0}")]
    NonFinite(usize),
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("waveform worker has shut down")]
    Disconnected,

    #[error("waveform worker panicked")]
    Panicked,

    #[error("failed to spawn waveform worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Failures surfaced by a recording session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no recording in progress")]
    NotRecording,

    #[error("recording already in progress")]
    AlreadyRecording,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}
