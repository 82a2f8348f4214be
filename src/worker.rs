// src/worker.rs

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::config::EngineConfig;
use crate::engine::{DetailUpdate, Engine, Interaction};
use crate::error::WorkerError;
use crate::waveform::PixelBuffer;

/// Events held for the receiver before new ones are dropped.
pub const EVENT_CAPACITY: usize = 16;

/// Parameters of one pending redraw.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DrawRequest {
    /// Playback position in blocks.
    pub playback: Option<usize>,
}

/// Commands processed by the worker thread, strictly in order.
#[derive(Debug)]
pub enum WorkerCommand {
    Init { config: EngineConfig, sample_rate: f64 },
    Append(Vec<f32>),
    /// Wake-up for the draw mailbox; the request itself lives in the slot.
    Draw,
    Resize { width: u32, height: u32, device_pixel_ratio: f32 },
    Reset { sample_rate: Option<f64> },
    Interact(Interaction),
    /// Replies once every earlier command has been handled.
    Flush(Sender<()>),
    Shutdown,
}

/// What the worker publishes back.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    Frame { detail: PixelBuffer, overview: PixelBuffer },
    DetailUpdate(DetailUpdate),
}

/// One-slot mailbox: a newer request replaces one that has not been drawn yet.
#[derive(Clone, Debug, Default)]
pub struct DrawMailbox {
    slot: Arc<Mutex<Option<DrawRequest>>>,
}

impl DrawMailbox {
    /// Store `req`. Returns `true` when the slot was empty, i.e. the worker
    /// needs a wake-up.
    pub fn post(&self, req: DrawRequest) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.replace(req).is_none()
    }

    pub fn take(&self) -> Option<DrawRequest> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Runs an [`Engine`] on a background thread.
pub struct EngineWorker {
    command_tx: Sender<WorkerCommand>,
    event_rx: Receiver<WorkerEvent>,
    mailbox: DrawMailbox,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl EngineWorker {
    pub fn spawn(config: EngineConfig) -> Result<Self, WorkerError> {
        let (command_tx, command_rx) = channel::unbounded();
        let (event_tx, event_rx) = channel::bounded(EVENT_CAPACITY);
        let mailbox = DrawMailbox::default();
        let worker_mailbox = mailbox.clone();

        let handle = thread::Builder::new()
            .name("waveform-worker".into())
            .spawn(move || run(Engine::new(config), command_rx, event_tx, worker_mailbox))?;

        Ok(Self { command_tx, event_rx, mailbox, thread_handle: Some(handle) })
    }

    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.event_rx
    }

    fn send(&self, cmd: WorkerCommand) -> Result<(), WorkerError> {
        self.command_tx.send(cmd).map_err(|_| WorkerError::Disconnected)
    }

    pub fn init(&self, config: EngineConfig, sample_rate: f64) -> Result<(), WorkerError> {
        self.send(WorkerCommand::Init { config, sample_rate })
    }

    pub fn append(&self, samples: Vec<f32>) -> Result<(), WorkerError> {
        if samples.is_empty() {
            return Ok(());
        }
        self.send(WorkerCommand::Append(samples))
    }

    pub fn request_draw(&self, req: DrawRequest) -> Result<(), WorkerError> {
        if self.mailbox.post(req) {
            self.send(WorkerCommand::Draw)?;
        }
        Ok(())
    }

    pub fn resize(&self, width: u32, height: u32, device_pixel_ratio: f32) -> Result<(), WorkerError> {
        self.send(WorkerCommand::Resize { width, height, device_pixel_ratio })
    }

    pub fn reset(&self, sample_rate: Option<f64>) -> Result<(), WorkerError> {
        self.send(WorkerCommand::Reset { sample_rate })
    }

    pub fn interact(&self, action: Interaction) -> Result<(), WorkerError> {
        self.send(WorkerCommand::Interact(action))
    }

    /// Block until every command sent so far has been processed.
    pub fn flush(&self) -> Result<(), WorkerError> {
        let (tx, rx) = channel::bounded(1);
        self.send(WorkerCommand::Flush(tx))?;
        rx.recv().map_err(|_| WorkerError::Disconnected)
    }

    pub fn shutdown(mut self) -> Result<(), WorkerError> {
        self.stop_thread()
    }

    fn stop_thread(&mut self) -> Result<(), WorkerError> {
        let Some(handle) = self.thread_handle.take() else {
            return Ok(());
        };
        let _ = self.command_tx.send(WorkerCommand::Shutdown);
        handle.join().map_err(|_| WorkerError::Panicked)
    }
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        if let Err(e) = self.stop_thread() {
            warn!("waveform worker: {e}");
        }
    }
}

fn run(
    mut engine: Engine,
    command_rx: Receiver<WorkerCommand>,
    event_tx: Sender<WorkerEvent>,
    mailbox: DrawMailbox,
) {
    info!("waveform worker started");
    for cmd in command_rx.iter() {
        match cmd {
            WorkerCommand::Init { config, sample_rate } => {
                engine = Engine::new(config);
                engine.start_recording(sample_rate);
            }
            WorkerCommand::Append(samples) => engine.append(&samples),
            WorkerCommand::Draw => {
                let Some(req) = mailbox.take() else { continue };
                let update = engine.draw(req.playback);
                // a frame and its update go out together or not at all
                if event_tx.capacity().is_some_and(|cap| event_tx.len() + 2 > cap) {
                    debug!("event queue full; dropping frame");
                    continue;
                }
                let frame = WorkerEvent::Frame {
                    detail: engine.detail_canvas().clone(),
                    overview: engine.overview_canvas().clone(),
                };
                for event in [frame, WorkerEvent::DetailUpdate(update)] {
                    match event_tx.try_send(event) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => debug!("event queue full; dropping event"),
                        Err(TrySendError::Disconnected(_)) => debug!("event receiver gone; dropping frame"),
                    }
                }
            }
            WorkerCommand::Resize { width, height, device_pixel_ratio } => {
                engine.resize(width, height, device_pixel_ratio)
            }
            WorkerCommand::Reset { sample_rate } => match sample_rate {
                Some(rate) => engine.start_recording(rate),
                None => engine.reset(),
            },
            WorkerCommand::Interact(action) => engine.apply(action),
            WorkerCommand::Flush(reply) => {
                let _ = reply.send(());
            }
            WorkerCommand::Shutdown => break,
        }
    }
    info!("waveform worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::RenderPath;

    #[test]
    fn mailbox_keeps_only_latest_request() {
        let mb = DrawMailbox::default();
        assert!(mb.post(DrawRequest { playback: Some(1) }));
        assert!(!mb.post(DrawRequest { playback: Some(2) }));
        assert_eq!(mb.take(), Some(DrawRequest { playback: Some(2) }));
        assert_eq!(mb.take(), None);
        assert!(mb.post(DrawRequest::default()));
    }

    #[test]
    fn appends_are_processed_before_flush_returns() {
        let worker = EngineWorker::spawn(EngineConfig::default()).unwrap();
        worker.init(EngineConfig::default(), 5000.0).unwrap();
        for _ in 0..10 {
            worker.append(vec![0.1; 1000]).unwrap();
        }
        for i in 0..5 {
            worker.request_draw(DrawRequest { playback: Some(i) }).unwrap();
        }
        worker.flush().unwrap();

        let events: Vec<WorkerEvent> = worker.events().try_iter().collect();
        let updates: Vec<&DetailUpdate> = events
            .iter()
            .filter_map(|e| match e {
                WorkerEvent::DetailUpdate(u) => Some(u),
                _ => None,
            })
            .collect();
        // pending requests coalesce, so there is at most one frame per request
        assert!(!updates.is_empty() && updates.len() <= 5);
        let last = updates[updates.len() - 1];
        assert_eq!(last.total_blocks, 10_000);
        assert_eq!(last.stats.path, RenderPath::Aggregate);
        assert!(events.iter().any(|e| matches!(e, WorkerEvent::Frame { .. })));
        worker.shutdown().unwrap();
    }

    #[test]
    fn undrained_events_stay_bounded() {
        let worker = EngineWorker::spawn(EngineConfig::default()).unwrap();
        worker.init(EngineConfig::default(), 5000.0).unwrap();
        worker.append(vec![0.1; 5000]).unwrap();
        for _ in 0..40 {
            worker.request_draw(DrawRequest::default()).unwrap();
            worker.flush().unwrap();
        }
        assert!(worker.events().len() <= EVENT_CAPACITY);

        // once drained, frames flow again
        let drained: Vec<WorkerEvent> = worker.events().try_iter().collect();
        assert_eq!(drained.len(), EVENT_CAPACITY);
        worker.append(vec![0.1; 5000]).unwrap();
        worker.request_draw(DrawRequest::default()).unwrap();
        worker.flush().unwrap();
        let update = worker.events().try_iter().find_map(|e| match e {
            WorkerEvent::DetailUpdate(u) => Some(u),
            _ => None,
        });
        assert_eq!(update.map(|u| u.total_blocks), Some(10_000));
    }

    #[test]
    fn reset_and_interactions_run_in_order() {
        let worker = EngineWorker::spawn(EngineConfig::default()).unwrap();
        worker.init(EngineConfig::default(), 5000.0).unwrap();
        worker.append(vec![0.0; 10_000]).unwrap();
        worker.interact(Interaction::ZoomSteps { steps: 1.0, anchor_ratio: Some(0.5) }).unwrap();
        worker.request_draw(DrawRequest::default()).unwrap();
        worker.flush().unwrap();
        let zoom = worker.events().try_iter().find_map(|e| match e {
            WorkerEvent::DetailUpdate(u) => Some(u.zoom_factor),
            _ => None,
        });
        assert_eq!(zoom, Some(1.5));

        worker.reset(Some(48_000.0)).unwrap();
        worker.request_draw(DrawRequest::default()).unwrap();
        worker.flush().unwrap();
        let update = worker.events().try_iter().find_map(|e| match e {
            WorkerEvent::DetailUpdate(u) => Some(u),
            _ => None,
        });
        let update = update.unwrap();
        assert_eq!(update.total_blocks, 0);
        assert_eq!(update.decimation_factor, 10);
        assert_eq!(update.stats.path, RenderPath::Empty);
    }
}
