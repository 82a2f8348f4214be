// src/engine.rs

use log::{debug, trace};
use std::collections::VecDeque;

use crate::config::{EngineConfig, Orientation};
use crate::waveform::{
    Canvas, DecimationBuffer, OverviewHit, OverviewSync, PixelBuffer, RawPoint, RenderPath,
    RenderStats, ScrollMode, SelectionModel, SelectionRange, ViewWindow, WaveformRenderer,
};

/// Source rate assumed until a recording announces its own.
pub const DEFAULT_SOURCE_RATE: f64 = 48_000.0;
/// Raw samples kept for the high-resolution view (oldest dropped first).
pub const RAW_HISTORY_LIMIT: usize = 1 << 22;

/// Level-of-detail summary published after every detail draw.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailUpdate {
    pub stats: RenderStats,
    pub zoom_factor: f64,
    pub mode: ScrollMode,
    pub total_blocks: usize,
    pub decimation_factor: usize,
    pub effective_rate: f64,
    pub duration_secs: f64,
    pub selection: Option<SelectionRange>,
    pub selection_secs: f64,
}

/// Pointer and keyboard actions, in device pixels where a position is involved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Interaction {
    SetZoom { target: f64, anchor: Option<f64> },
    ZoomSteps { steps: f64, anchor_ratio: Option<f64> },
    PanSamples(i64),
    PanPixels(f64),
    ResetView,
    SelectionBegin(f64),
    SelectionUpdate(f64),
    SelectionCommit,
    SelectionClear,
    OverviewDown(f64),
    OverviewMove(f64),
    OverviewUp,
}

#[derive(Clone, Debug)]
struct RawChunk {
    first_block: usize,
    factor: usize,
    samples: Vec<f32>,
}

impl RawChunk {
    fn end_block(&self) -> usize {
        self.first_block + self.samples.len().div_ceil(self.factor)
    }
}

/// Owns one of each waveform model and keeps them consistent.
pub struct Engine {
    config: EngineConfig,
    buffer: DecimationBuffer,
    view: ViewWindow,
    selection: SelectionModel,
    renderer: WaveformRenderer,
    overview: OverviewSync,
    raw: VecDeque<RawChunk>,
    raw_len: usize,
    raw_limit: usize,
    detail_canvas: PixelBuffer,
    overview_canvas: PixelBuffer,
    last_path: Option<RenderPath>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let config = config.sanitized();
        let extent = config.time_extent();
        let (ow, oh) = overview_size(&config);
        Self {
            buffer: DecimationBuffer::new(DEFAULT_SOURCE_RATE, config.target_decimation_rate),
            view: ViewWindow::new(extent, config.zoom_step_base),
            selection: SelectionModel::new(config.min_selection_secs),
            renderer: WaveformRenderer::new(config.orientation, config.clip_threshold),
            overview: OverviewSync::new(
                config.orientation,
                extent,
                config.edge_grab_px * config.device_pixel_ratio,
            ),
            raw: VecDeque::new(),
            raw_len: 0,
            raw_limit: RAW_HISTORY_LIMIT,
            detail_canvas: PixelBuffer::new(config.device_width(), config.device_height()),
            overview_canvas: PixelBuffer::new(ow, oh),
            last_path: None,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn buffer(&self) -> &DecimationBuffer {
        &self.buffer
    }

    pub fn view(&self) -> &ViewWindow {
        &self.view
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn detail_canvas(&self) -> &PixelBuffer {
        &self.detail_canvas
    }

    pub fn overview_canvas(&self) -> &PixelBuffer {
        &self.overview_canvas
    }

    // --- RECORDING ---

    /// Clear everything and prepare for a recording at `sample_rate`.
    pub fn start_recording(&mut self, sample_rate: f64) {
        self.reset();
        self.buffer.set_source_sample_rate(sample_rate);
        debug!(
            "recording started at {} Hz (factor {})",
            sample_rate,
            self.buffer.decimation_factor()
        );
    }

    pub fn set_source_sample_rate(&mut self, rate: f64) {
        self.buffer.set_source_sample_rate(rate);
    }

    pub fn reset(&mut self) {
        self.buffer.reset();
        self.raw.clear();
        self.raw_len = 0;
        self.selection.clear();
        self.overview.pointer_up();
        self.view.set_total(0);
        self.view.reset_view();
        self.last_path = None;
        debug!("engine reset");
    }

    /// Fold one decoded chunk into the envelope and move the view along.
    pub fn append(&mut self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let first_block = self.buffer.len();
        self.buffer.append(samples);
        self.remember_raw(first_block, samples);

        self.view.set_total(self.buffer.len());
        if self.view.is_auto_scroll() {
            self.view.scroll_to_latest();
        } else {
            self.view.enforce_view_bounds();
        }
    }

    fn remember_raw(&mut self, first_block: usize, samples: &[f32]) {
        self.raw.push_back(RawChunk {
            first_block,
            factor: self.buffer.decimation_factor(),
            samples: samples.to_vec(),
        });
        self.raw_len += samples.len();
        while self.raw_len > self.raw_limit && self.raw.len() > 1 {
            if let Some(old) = self.raw.pop_front() {
                self.raw_len -= old.samples.len();
            }
        }
    }

    /// Raw samples positioned on the block axis for `start..end`.
    pub fn raw_window(&self, start: usize, end: usize) -> Vec<RawPoint> {
        let mut out = Vec::new();
        for chunk in &self.raw {
            if chunk.end_block() <= start || chunk.first_block >= end {
                continue;
            }
            let f = chunk.factor as f64;
            let from = (start.saturating_sub(chunk.first_block)) * chunk.factor;
            let to = ((end - chunk.first_block) * chunk.factor).min(chunk.samples.len());
            for (j, &value) in chunk.samples.iter().enumerate().take(to).skip(from) {
                out.push(RawPoint { pos: chunk.first_block as f64 + j as f64 / f, value });
            }
        }
        out
    }

    // --- VIEW ---

    pub fn set_zoom(&mut self, target: f64, anchor: Option<f64>) {
        self.view.set_zoom(target, anchor);
    }

    pub fn zoom_by_steps(&mut self, steps: f64, anchor_ratio: Option<f64>) {
        self.view.zoom_by_steps(steps, anchor_ratio);
    }

    /// Zoom around the sample under pixel `px` (wheel/pinch).
    pub fn zoom_at_pixel(&mut self, steps: f64, px: f64) {
        let extent = self.view.extent();
        let ratio = if extent > 0 { px / extent as f64 } else { 0.5 };
        self.view.zoom_by_steps(steps, Some(ratio));
    }

    pub fn pan_by_samples(&mut self, delta: i64) {
        self.view.pan_by_samples(delta);
    }

    pub fn pan_by_pixels(&mut self, px: f64) {
        self.view.pan_by_pixels(px);
    }

    pub fn reset_view(&mut self) {
        self.view.reset_view();
    }

    /// New logical canvas size and device pixel ratio.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f32) {
        self.config.canvas_width = width;
        self.config.canvas_height = height;
        if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            self.config.device_pixel_ratio = device_pixel_ratio;
        }
        let extent = self.config.time_extent();
        self.view.set_extent(extent);
        self.overview.set_extent(extent);
        self.detail_canvas.resize(self.config.device_width(), self.config.device_height());
        let (ow, oh) = overview_size(&self.config);
        self.overview_canvas.resize(ow, oh);
        debug!("resized: time extent {extent} px");
    }

    // --- SELECTION ---

    fn edge_threshold(&self) -> f64 {
        (self.config.edge_grab_px * self.config.device_pixel_ratio) as f64
    }

    /// Pointer down on the detail view at device pixel `px`.
    pub fn begin_selection(&mut self, px: f64) {
        let threshold = self.edge_threshold();
        self.selection.pointer_down(px, &self.view, threshold);
    }

    pub fn update_selection(&mut self, px: f64) {
        let sample = self.view.pixel_to_sample(px);
        self.selection.update(sample);
    }

    pub fn commit_selection(&mut self) -> bool {
        let committed = self.selection.commit(self.buffer.effective_rate());
        if !committed {
            debug!("selection shorter than {} s discarded", self.config.min_selection_secs);
        }
        committed
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection_duration_secs(&self) -> f64 {
        self.selection.duration_secs(self.buffer.effective_rate())
    }

    /// Start position for playback of the selection, in blocks.
    pub fn play_from_selection(&mut self) -> Option<usize> {
        self.selection.play_from_selection()
    }

    // --- OVERVIEW ---

    pub fn overview_pointer_down(&mut self, px: f64) -> OverviewHit {
        self.overview.pointer_down(px, &mut self.view)
    }

    pub fn overview_pointer_move(&mut self, px: f64) {
        self.overview.pointer_move(px, &mut self.view);
    }

    pub fn overview_pointer_up(&mut self) {
        self.overview.pointer_up();
    }

    pub fn apply(&mut self, action: Interaction) {
        match action {
            Interaction::SetZoom { target, anchor } => self.set_zoom(target, anchor),
            Interaction::ZoomSteps { steps, anchor_ratio } => self.zoom_by_steps(steps, anchor_ratio),
            Interaction::PanSamples(delta) => self.pan_by_samples(delta),
            Interaction::PanPixels(px) => self.pan_by_pixels(px),
            Interaction::ResetView => self.reset_view(),
            Interaction::SelectionBegin(px) => self.begin_selection(px),
            Interaction::SelectionUpdate(px) => self.update_selection(px),
            Interaction::SelectionCommit => {
                self.commit_selection();
            }
            Interaction::SelectionClear => self.clear_selection(),
            Interaction::OverviewDown(px) => {
                self.overview_pointer_down(px);
            }
            Interaction::OverviewMove(px) => self.overview_pointer_move(px),
            Interaction::OverviewUp => self.overview_pointer_up(),
        }
    }

    // --- DRAW ---

    /// Redraw both owned canvases. `playback` is a block index.
    pub fn draw(&mut self, playback: Option<usize>) -> DetailUpdate {
        let mut detail = std::mem::replace(&mut self.detail_canvas, PixelBuffer::new(0, 0));
        let mut overview = std::mem::replace(&mut self.overview_canvas, PixelBuffer::new(0, 0));
        let update = self.draw_into(&mut detail, &mut overview, playback);
        self.detail_canvas = detail;
        self.overview_canvas = overview;
        update
    }

    /// Redraw onto caller-provided canvases (e.g. a terminal grid).
    pub fn draw_into<D, O>(&mut self, detail: &mut D, overview: &mut O, playback: Option<usize>) -> DetailUpdate
    where
        D: Canvas + ?Sized,
        O: Canvas + ?Sized,
    {
        let start = self.view.view_start();
        let end = self.view.view_end();
        let along = match self.config.orientation {
            Orientation::Horizontal => detail.width(),
            Orientation::Vertical => detail.height(),
        };
        let raw = if along > 0 && (end - start) as f64 / along as f64 <= 1.0 {
            Some(self.raw_window(start, end))
        } else {
            None
        };

        let stats = self.renderer.draw(
            detail,
            &self.buffer,
            &self.view,
            self.selection.display_range(),
            playback,
            raw.as_deref(),
        );
        self.overview.draw(overview, &self.buffer, &self.view);

        if self.last_path != Some(stats.path) {
            trace!(
                "detail path {:?} at {:.3} blocks/px, zoom {:.3}",
                stats.path,
                stats.samples_per_pixel,
                self.view.zoom_factor()
            );
            self.last_path = Some(stats.path);
        }

        DetailUpdate {
            stats,
            zoom_factor: self.view.zoom_factor(),
            mode: self.view.mode(),
            total_blocks: self.buffer.len(),
            decimation_factor: self.buffer.decimation_factor(),
            effective_rate: self.buffer.effective_rate(),
            duration_secs: self.buffer.duration_secs(),
            selection: self.selection.range(),
            selection_secs: self.selection_duration_secs(),
        }
    }
}

fn overview_size(config: &EngineConfig) -> (u32, u32) {
    let thickness = (config.overview_height as f32 * config.device_pixel_ratio).round() as u32;
    match config.orientation {
        Orientation::Horizontal => (config.time_extent(), thickness),
        Orientation::Vertical => (thickness, config.time_extent()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_at(rate: f64) -> Engine {
        let mut e = Engine::new(EngineConfig::default());
        e.start_recording(rate);
        e
    }

    fn tone(n: usize) -> Vec<f32> {
        (0..n).map(|i| ((i as f32) * 0.05).sin() * 0.8).collect()
    }

    #[test]
    fn factor_follows_recording_rate() {
        let e = engine_at(48_000.0);
        assert_eq!(e.buffer().decimation_factor(), 10);
        assert_eq!(e.buffer().effective_rate(), 4800.0);
    }

    #[test]
    fn autoscroll_follows_growth_until_user_pans() {
        let mut e = engine_at(5000.0);
        e.append(&tone(10_000));
        e.append(&tone(2000));
        assert!(e.view().is_auto_scroll());
        assert_eq!(e.view().view_end(), 12_000);

        e.zoom_by_steps(2.0, Some(1.0));
        let start = e.view().view_start();
        e.append(&tone(2000));
        assert_eq!(e.view().mode(), ScrollMode::Manual);
        assert_eq!(e.view().view_start(), start);

        e.reset_view();
        assert!(e.view().is_auto_scroll());
        assert_eq!(e.view().view_end(), 14_000);
    }

    #[test]
    fn zoom_step_keeps_anchor_in_place() {
        let mut e = engine_at(5000.0);
        e.append(&tone(10_000));
        e.zoom_by_steps(1.0, Some(0.5));
        assert!((e.view().zoom_factor() - 1.5).abs() < 1e-12);
        assert_eq!(e.view().visible_samples(), 6667);
        let rel = (5000.0 - e.view().view_start() as f64) / e.view().visible_samples() as f64;
        assert!((rel - 0.5).abs() < 1e-3);
    }

    #[test]
    fn reset_then_append_matches_fresh_engine() {
        let data = tone(7_777);
        let mut a = engine_at(48_000.0);
        a.append(&tone(3000));
        a.zoom_by_steps(2.0, None);
        a.start_recording(48_000.0);
        a.append(&data);

        let mut b = engine_at(48_000.0);
        b.append(&data);
        assert_eq!(a.buffer().mins(), b.buffer().mins());
        assert_eq!(a.buffer().maxs(), b.buffer().maxs());
        assert_eq!(a.view().view_start(), b.view().view_start());
        assert_eq!(a.view().zoom_factor(), b.view().zoom_factor());
    }

    #[test]
    fn selection_by_pixels() {
        let mut e = engine_at(5000.0);
        e.append(&tone(10_000));
        // 800 px over 10 000 blocks
        e.begin_selection(500.0);
        e.update_selection(100.0);
        assert!(e.commit_selection());
        let sel = e.selection().range().unwrap();
        assert_eq!((sel.start, sel.end), (1250, 6250));
        assert!((e.selection_duration_secs() - 1.0).abs() < 1e-12);

        e.begin_selection(300.0);
        e.update_selection(310.0);
        assert!(!e.commit_selection());
        assert_eq!(e.selection().range(), Some(sel));

        e.clear_selection();
        assert!(e.selection().range().is_none());
    }

    #[test]
    fn draw_picks_level_of_detail() {
        let mut e = engine_at(5000.0);
        e.append(&tone(10_000));
        let update = e.draw(None);
        assert_eq!(update.stats.path, RenderPath::Aggregate);
        assert!((update.stats.samples_per_pixel - 12.5).abs() < 1e-12);
        assert_eq!(update.total_blocks, 10_000);
        assert!(e.detail_canvas().count_color(e.renderer.palette.wave) > 0);

        let mut e = engine_at(48_000.0);
        e.append(&tone(3000));
        let update = e.draw(None);
        assert_eq!(update.total_blocks, 300);
        assert_eq!(update.stats.path, RenderPath::PerBlock);

        let mut e = engine_at(1000.0);
        e.append(&tone(12));
        let update = e.draw(Some(3));
        assert_eq!(update.stats.path, RenderPath::HighRes);
        assert_eq!(update.stats.raw_points, 12);
    }

    #[test]
    fn raw_window_positions_samples_on_blocks() {
        let mut e = engine_at(48_000.0);
        e.append(&[0.1; 25]);
        e.append(&[0.2; 10]);
        // blocks 0..3 from the first chunk, block 3 from the second
        assert_eq!(e.buffer().len(), 4);
        let pts = e.raw_window(2, 4);
        assert_eq!(pts.len(), 15);
        assert_eq!(pts[0].pos, 2.0);
        assert_eq!(pts[5].pos, 3.0);
        assert_eq!(pts[5].value, 0.2);
    }

    #[test]
    fn evicted_history_draws_blocks_until_view_is_covered() {
        let mut e = engine_at(48_000.0);
        e.raw_limit = 100;
        for _ in 0..10 {
            e.append(&tone(50));
        }
        // two 5-block chunks survive: blocks 40..50
        assert_eq!(e.buffer().len(), 50);
        assert_eq!(e.raw_window(0, 50).first().map(|p| p.pos), Some(40.0));
        let update = e.draw(None);
        assert_eq!(update.stats.path, RenderPath::PerBlock);

        e.view.set_view_range(41, 9);
        assert_eq!((e.view().view_start(), e.view().view_end()), (41, 50));
        let update = e.draw(None);
        assert_eq!(update.stats.path, RenderPath::HighRes);
        assert_eq!(update.stats.raw_points, 90);
    }

    #[test]
    fn overview_drives_view() {
        let mut e = engine_at(5000.0);
        e.append(&tone(10_000));
        e.zoom_by_steps(4.0, Some(0.0));
        let hit = e.overview_pointer_down(790.0);
        assert_eq!(hit, OverviewHit::Outside);
        e.overview_pointer_up();
        assert!(!e.view().is_auto_scroll());
        assert!(e.view().view_end() > 9000);
    }

    #[test]
    fn interactions_route_to_models() {
        let mut e = engine_at(5000.0);
        e.append(&tone(10_000));
        e.apply(Interaction::ZoomSteps { steps: 1.0, anchor_ratio: Some(0.5) });
        assert!((e.view().zoom_factor() - 1.5).abs() < 1e-12);
        e.apply(Interaction::PanSamples(-100));
        assert_eq!(e.view().view_start(), 1567);
        e.apply(Interaction::SelectionBegin(0.0));
        e.apply(Interaction::SelectionUpdate(400.0));
        e.apply(Interaction::SelectionCommit);
        assert!(e.selection().range().is_some());
        e.apply(Interaction::ResetView);
        assert!(e.view().is_auto_scroll());
        e.apply(Interaction::SelectionClear);
        assert!(e.selection().range().is_none());
    }

    #[test]
    fn resize_rescales_extents() {
        let mut e = engine_at(5000.0);
        e.append(&tone(10_000));
        e.resize(400, 100, 2.0);
        assert_eq!(e.view().extent(), 800);
        assert_eq!(e.detail_canvas().width(), 800);
        assert_eq!(e.detail_canvas().height(), 200);
        assert_eq!(e.overview_canvas().height(), 96);
    }
}
