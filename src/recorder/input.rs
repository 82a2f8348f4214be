// src/recorder/input.rs

use anyhow::{Result, anyhow, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SizedSample, Stream, StreamConfig};
use log::{error, info};
use ringbuf::traits::Producer;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::capture::decode::{i16_to_f32, u16_to_f32};

/// Holds the CPAL input stream. The producer is moved into the input callback,
/// which pushes interleaved f32 samples.
pub struct AudioInput {
    pub stream: Stream,
    pub channels: usize,
    pub sample_rate: u32,
    dropped: Arc<AtomicU64>,
}

impl AudioInput {
    pub fn new<P>(producer: P) -> Result<Self>
    where
        P: Producer<Item = f32> + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("No input device available"))?;

        let supported_config = device.default_input_config()?;
        let sample_format = supported_config.sample_format();
        let config: StreamConfig = supported_config.into();
        let channels = config.channels as usize;
        let sample_rate = config.sample_rate.0;
        let dropped = Arc::new(AtomicU64::new(0));

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32, P>(&device, &config, producer, dropped.clone(), |s| s)?,
            SampleFormat::I16 => build_stream::<i16, P>(&device, &config, producer, dropped.clone(), i16_to_f32)?,
            SampleFormat::U16 => build_stream::<u16, P>(&device, &config, producer, dropped.clone(), u16_to_f32)?,
            other => bail!("Unsupported sample format: {:?}", other),
        };

        info!(
            "input: {} ({:?}, {} ch @ {} Hz)",
            device.name().unwrap_or_else(|_| "unknown device".into()),
            sample_format,
            channels,
            sample_rate
        );

        Ok(Self { stream, channels, sample_rate, dropped })
    }

    /// Samples lost because the ring was full.
    pub fn dropped_samples(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Build an input stream for sample type `T`, converting to f32 before pushing.
fn build_stream<T, P>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut producer: P,
    dropped: Arc<AtomicU64>,
    convert: fn(T) -> f32,
) -> Result<Stream>
where
    T: SizedSample + 'static,
    P: Producer<Item = f32> + Send + 'static,
{
    let err_fn = |err| error!("Input stream error: {:?}", err);
    let mut conv: Vec<f32> = Vec::with_capacity(8192);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            conv.clear();
            conv.extend(data.iter().map(|&s| convert(s)));
            let pushed = producer.push_slice(&conv);
            if pushed < conv.len() {
                // ring full -> drop remainder
                dropped.fetch_add((conv.len() - pushed) as u64, Ordering::Relaxed);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;
    Ok(stream)
}
