// src/lib.rs

pub mod capture;
pub mod config;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod recorder;
pub mod scope;
pub mod session;
pub mod waveform;
pub mod worker;

pub use config::{EngineConfig, Orientation};
pub use encoder::{ContainerFile, ResampleEncoder, ResampleMode};
pub use engine::{DetailUpdate, Engine, Interaction};
pub use session::{Recording, RecordingSession};
pub use worker::EngineWorker;
