// src/session.rs

use chrono::{DateTime, Local};
use log::{debug, info, warn};

use crate::capture::{ChannelCapture, SampleFormat};
use crate::config::EngineConfig;
use crate::encoder::{ContainerFile, ResampleEncoder};
use crate::engine::{DetailUpdate, Engine, Interaction};
use crate::error::SessionError;
use crate::worker::{DrawRequest, EngineWorker};

/// Where the waveform engine runs.
pub enum EngineHost {
    InThread(Box<Engine>),
    Worker(EngineWorker),
}

/// A finished take.
#[derive(Clone, Debug)]
pub struct Recording {
    pub file: ContainerFile,
    pub filename: String,
}

/// Start/stop lifecycle tying capture, display and export together.
pub struct RecordingSession {
    config: EngineConfig,
    host: EngineHost,
    capture: Option<ChannelCapture>,
    started_at: Option<DateTime<Local>>,
}

impl RecordingSession {
    /// Engine on the caller's thread.
    pub fn new(config: EngineConfig) -> Self {
        let config = config.sanitized();
        Self {
            host: EngineHost::InThread(Box::new(Engine::new(config.clone()))),
            config,
            capture: None,
            started_at: None,
        }
    }

    /// Engine on a background worker.
    pub fn with_worker(config: EngineConfig) -> Result<Self, SessionError> {
        let config = config.sanitized();
        Ok(Self {
            host: EngineHost::Worker(EngineWorker::spawn(config.clone())?),
            config,
            capture: None,
            started_at: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn host(&self) -> &EngineHost {
        &self.host
    }

    /// The in-thread engine, if that is how this session runs.
    pub fn engine(&self) -> Option<&Engine> {
        match &self.host {
            EngineHost::InThread(engine) => Some(engine.as_ref()),
            EngineHost::Worker(_) => None,
        }
    }

    pub fn engine_mut(&mut self) -> Option<&mut Engine> {
        match &mut self.host {
            EngineHost::InThread(engine) => Some(engine.as_mut()),
            EngineHost::Worker(_) => None,
        }
    }

    pub fn worker(&self) -> Option<&EngineWorker> {
        match &self.host {
            EngineHost::Worker(worker) => Some(worker),
            EngineHost::InThread(_) => None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.capture.is_some()
    }

    /// Seconds captured so far.
    pub fn elapsed_secs(&self) -> f64 {
        match &self.capture {
            Some(cap) if cap.sample_rate() > 0 => cap.frames() as f64 / cap.sample_rate() as f64,
            _ => 0.0,
        }
    }

    pub fn start(&mut self, sample_rate: u32, channels: usize) -> Result<(), SessionError> {
        if self.capture.is_some() {
            return Err(SessionError::AlreadyRecording);
        }
        match &mut self.host {
            EngineHost::InThread(engine) => engine.start_recording(sample_rate as f64),
            EngineHost::Worker(worker) => worker.reset(Some(sample_rate as f64))?,
        }
        self.capture = Some(ChannelCapture::new(sample_rate, channels, self.config.display_source));
        self.started_at = Some(Local::now());
        info!("recording: {sample_rate} Hz, {channels} ch");
        Ok(())
    }

    /// Feed a raw byte chunk. A chunk that fails to decode is dropped and the
    /// error returned; everything captured before it is kept.
    pub fn push_bytes(&mut self, bytes: &[u8], format: SampleFormat) -> Result<usize, SessionError> {
        let capture = self.capture.as_mut().ok_or(SessionError::NotRecording)?;
        let display = capture.push_bytes(bytes, format).inspect_err(|e| {
            warn!("dropping chunk of {} bytes: {e}", bytes.len());
        })?;
        self.display(display)
    }

    /// Feed interleaved float samples.
    pub fn push_interleaved(&mut self, samples: &[f32]) -> Result<usize, SessionError> {
        let capture = self.capture.as_mut().ok_or(SessionError::NotRecording)?;
        let display = capture.push_interleaved(samples).inspect_err(|e| {
            warn!("dropping chunk of {} samples: {e}", samples.len());
        })?;
        self.display(display)
    }

    fn display(&mut self, samples: Vec<f32>) -> Result<usize, SessionError> {
        let n = samples.len();
        match &mut self.host {
            EngineHost::InThread(engine) => engine.append(&samples),
            EngineHost::Worker(worker) => worker.append(samples)?,
        }
        Ok(n)
    }

    pub fn interact(&mut self, action: Interaction) -> Result<(), SessionError> {
        match &mut self.host {
            EngineHost::InThread(engine) => engine.apply(action),
            EngineHost::Worker(worker) => worker.interact(action)?,
        }
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f32) -> Result<(), SessionError> {
        match &mut self.host {
            EngineHost::InThread(engine) => engine.resize(width, height, device_pixel_ratio),
            EngineHost::Worker(worker) => worker.resize(width, height, device_pixel_ratio)?,
        }
        Ok(())
    }

    /// Draw now (in-thread, returning the update) or post a draw request to
    /// the worker (its update arrives as an event).
    pub fn draw(&mut self, playback: Option<usize>) -> Result<Option<DetailUpdate>, SessionError> {
        match &mut self.host {
            EngineHost::InThread(engine) => Ok(Some(engine.draw(playback))),
            EngineHost::Worker(worker) => {
                worker.request_draw(DrawRequest { playback })?;
                Ok(None)
            }
        }
    }

    /// Stop capturing and encode what was recorded.
    ///
    /// Appends still queued on the worker are drained first, so the display
    /// and the file end on the same sample.
    pub fn stop(&mut self) -> Result<Recording, SessionError> {
        let capture = self.capture.take().ok_or(SessionError::NotRecording)?;
        let started_at = self.started_at.take().unwrap_or_else(Local::now);
        if let EngineHost::Worker(worker) = &self.host {
            worker.flush()?;
        }
        debug!("stopping after {} frames", capture.frames());

        let encoder = ResampleEncoder::new(self.config.resample_mode, self.config.export_sample_rate);
        let file = encoder.encode(capture.finish())?;
        let filename = file.suggested_filename(started_at);
        info!("recording stopped: {} ({:.2} s)", filename, file.duration_secs());
        Ok(Recording { file, filename })
    }
}
