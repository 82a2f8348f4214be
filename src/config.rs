// src/config.rs

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::capture::DisplaySource;
use crate::encoder::ResampleMode;

/// Which screen axis carries time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Everything the waveform engine and the export path can be tuned with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rate (Hz) the decimated block stream should approximate.
    pub target_decimation_rate: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Multiplied into the canvas extents before any pixel/sample mapping.
    pub device_pixel_ratio: f32,
    pub overview_height: u32,
    pub min_selection_secs: f64,
    pub zoom_step_base: f64,
    pub clip_threshold: f32,
    pub orientation: Orientation,
    /// Pointer distance (px) within which a selection edge can be grabbed.
    pub edge_grab_px: f32,
    /// Which captured signal feeds the waveform.
    pub display_source: DisplaySource,
    pub resample_mode: ResampleMode,
    /// Sample rate of the exported container. `None` keeps the capture rate.
    pub export_sample_rate: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_decimation_rate: 5000.0,
            canvas_width: 800,
            canvas_height: 200,
            device_pixel_ratio: 1.0,
            overview_height: 48,
            min_selection_secs: 0.2,
            zoom_step_base: 1.5,
            clip_threshold: 0.99,
            orientation: Orientation::Horizontal,
            edge_grab_px: 6.0,
            display_source: DisplaySource::FirstChannel,
            resample_mode: ResampleMode::Linear,
            export_sample_rate: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: EngineConfig =
            serde_json::from_str(json).context("failed to parse engine config")?;
        Ok(cfg.sanitized())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Replace out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        if !(self.target_decimation_rate.is_finite() && self.target_decimation_rate > 0.0) {
            warn!("target_decimation_rate {} ignored", self.target_decimation_rate);
            self.target_decimation_rate = d.target_decimation_rate;
        }
        if !(self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0) {
            warn!("device_pixel_ratio {} ignored", self.device_pixel_ratio);
            self.device_pixel_ratio = d.device_pixel_ratio;
        }
        if !(self.min_selection_secs.is_finite() && self.min_selection_secs >= 0.0) {
            warn!("min_selection_secs {} ignored", self.min_selection_secs);
            self.min_selection_secs = d.min_selection_secs;
        }
        if !(self.zoom_step_base.is_finite() && self.zoom_step_base > 1.0) {
            warn!("zoom_step_base {} ignored", self.zoom_step_base);
            self.zoom_step_base = d.zoom_step_base;
        }
        if !(self.clip_threshold.is_finite() && self.clip_threshold > 0.0) {
            warn!("clip_threshold {} ignored", self.clip_threshold);
            self.clip_threshold = d.clip_threshold;
        }
        if !(self.edge_grab_px.is_finite() && self.edge_grab_px >= 0.0) {
            self.edge_grab_px = d.edge_grab_px;
        }
        if self.export_sample_rate == Some(0) {
            warn!("export_sample_rate 0 ignored");
            self.export_sample_rate = None;
        }
        self
    }

    /// Extent of the time axis in device pixels.
    pub fn time_extent(&self) -> u32 {
        let logical = match self.orientation {
            Orientation::Horizontal => self.canvas_width,
            Orientation::Vertical => self.canvas_height,
        };
        (logical as f32 * self.device_pixel_ratio).round() as u32
    }

    /// Extent of the amplitude axis in device pixels.
    pub fn amplitude_extent(&self) -> u32 {
        let logical = match self.orientation {
            Orientation::Horizontal => self.canvas_height,
            Orientation::Vertical => self.canvas_width,
        };
        (logical as f32 * self.device_pixel_ratio).round() as u32
    }

    pub fn device_width(&self) -> u32 {
        (self.canvas_width as f32 * self.device_pixel_ratio).round() as u32
    }

    pub fn device_height(&self) -> u32 {
        (self.canvas_height as f32 * self.device_pixel_ratio).round() as u32
    }
}
