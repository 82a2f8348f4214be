// src/recorder/mod.rs

pub mod input;

use anyhow::Result;
use cpal::traits::StreamTrait;
use log::{debug, warn};
use ringbuf::traits::{Consumer, Split};
use ringbuf::{HeapCons, HeapRb};

use crate::recorder::input::AudioInput;

/// About four seconds of stereo audio at 48 kHz.
const RING_CAPACITY: usize = 384_000;

/// Default input device feeding a ring buffer that the UI thread drains.
pub struct DeviceCapture {
    input: AudioInput,
    consumer: HeapCons<f32>,
    scratch: Vec<f32>,
    /// Samples of an incomplete frame carried to the next drain.
    pending: Vec<f32>,
}

impl DeviceCapture {
    pub fn start() -> Result<Self> {
        let rb = HeapRb::<f32>::new(RING_CAPACITY);
        let (producer, consumer) = rb.split();
        let input = AudioInput::new(producer)?;
        Ok(Self { input, consumer, scratch: vec![0.0; 8192], pending: Vec::new() })
    }

    pub fn sample_rate(&self) -> u32 {
        self.input.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.input.channels
    }

    pub fn dropped_samples(&self) -> u64 {
        self.input.dropped_samples()
    }

    /// Everything buffered so far, interleaved, whole frames only.
    pub fn drain(&mut self) -> Vec<f32> {
        let mut out = std::mem::take(&mut self.pending);
        loop {
            let n = self.consumer.pop_slice(&mut self.scratch);
            if n == 0 {
                break;
            }
            out.extend_from_slice(&self.scratch[..n]);
        }
        let channels = self.channels().max(1);
        let whole = out.len() - out.len() % channels;
        self.pending = out.split_off(whole);
        out
    }

    /// Stop the stream and return what was still buffered.
    pub fn stop(mut self) -> Vec<f32> {
        if let Err(e) = self.input.stream.pause() {
            warn!("failed to pause input stream: {e}");
        }
        let tail = self.drain();
        debug!("input stopped, {} samples dropped", self.dropped_samples());
        drop(self.input);
        tail
    }
}
