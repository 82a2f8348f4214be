// src/waveform/mod.rs
pub mod canvas;
pub mod decimation;
pub mod overview;
pub mod render;
pub mod selection;
pub mod terminal;
pub mod ticks;
pub mod view;

pub use canvas::{Canvas, Color, PixelBuffer};
pub use decimation::DecimationBuffer;
pub use overview::{OverviewHit, OverviewSync};
pub use render::{RawPoint, RenderPath, RenderStats, WaveformRenderer};
pub use selection::{Edge, SelectionModel, SelectionRange};
pub use terminal::AsciiCanvas;
pub use view::{ScrollMode, ViewWindow};
