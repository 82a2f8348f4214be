// src/waveform/render.rs

use crate::config::Orientation;
use crate::waveform::canvas::{Canvas, Color};
use crate::waveform::decimation::DecimationBuffer;
use crate::waveform::selection::SelectionRange;
use crate::waveform::ticks::format_time;
use crate::waveform::view::ViewWindow;

/// Raw-sample density per pixel at or below which the detail view switches to
/// drawing individual samples.
const HIGH_RES_MAX_RAW_PER_PIXEL: f64 = 1.5;
/// Visible block count at or below which raw samples are drawn when available.
const HIGH_RES_MAX_BLOCKS: usize = 4;
/// Interpolated line points per pixel in the high-resolution path.
const HIGH_RES_POINTS_PER_PIXEL: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub wave: Color,
    pub clip: Color,
    pub selection_fill: Color,
    pub selection_edge: Color,
    pub playback: Color,
    pub raw_line: Color,
    pub raw_marker: Color,
    pub window_fill: Color,
    pub window_edge: Color,
    pub tick: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::rgb(18, 18, 22),
            wave: Color::rgb(92, 200, 255),
            clip: Color::rgba(255, 60, 60, 140),
            selection_fill: Color::rgba(255, 210, 80, 60),
            selection_edge: Color::rgb(255, 210, 80),
            playback: Color::rgb(255, 255, 255),
            raw_line: Color::rgb(92, 200, 255),
            raw_marker: Color::rgb(230, 240, 255),
            window_fill: Color::rgba(255, 255, 255, 40),
            window_edge: Color::rgb(200, 200, 200),
            tick: Color::rgb(140, 140, 150),
        }
    }
}

/// Which drawing strategy produced a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPath {
    Empty,
    /// One segment per decimated block (zoomed in past one block per pixel).
    PerBlock,
    /// Min/max aggregated over the blocks under each pixel.
    Aggregate,
    /// Line and markers through raw samples.
    HighRes,
}

/// Level-of-detail metrics for one detail frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderStats {
    pub path: RenderPath,
    pub samples_per_pixel: f64,
    pub view_start: usize,
    pub visible_samples: usize,
    pub columns: usize,
    pub clip_marks: usize,
    pub raw_points: usize,
    /// Sample markers drawn by the high-resolution path.
    pub markers: usize,
}

impl RenderStats {
    fn empty(view: &ViewWindow) -> Self {
        Self {
            path: RenderPath::Empty,
            samples_per_pixel: 0.0,
            view_start: view.view_start(),
            visible_samples: 0,
            columns: 0,
            clip_marks: 0,
            raw_points: 0,
            markers: 0,
        }
    }
}

/// One raw sample positioned on the block axis (`pos` is a fractional block index).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawPoint {
    pub pos: f64,
    pub value: f32,
}

/// Removes the column's own midpoint and clamps to the unit range.
/// Returns `(adjusted_min, adjusted_max)`.
pub fn recenter(min: f32, max: f32) -> (f32, f32) {
    let mid = (max + min) / 2.0;
    ((min - mid).clamp(-1.0, 1.0), (max - mid).clamp(-1.0, 1.0))
}

/// Maps (time, amplitude) drawing coordinates onto canvas (x, y).
#[derive(Clone, Copy, Debug)]
pub(crate) struct Axes {
    pub orientation: Orientation,
    pub along: f32,
    pub across: f32,
}

impl Axes {
    pub fn of<C: Canvas + ?Sized>(canvas: &C, orientation: Orientation) -> Self {
        let (w, h) = (canvas.width() as f32, canvas.height() as f32);
        match orientation {
            Orientation::Horizontal => Self { orientation, along: w, across: h },
            Orientation::Vertical => Self { orientation, along: h, across: w },
        }
    }

    pub fn center(&self) -> f32 {
        self.across / 2.0
    }

    /// Amplitude to an across coordinate.
    pub fn level(&self, v: f32) -> f32 {
        let c = self.center();
        c - v * c
    }

    pub fn point(&self, along: f32, across: f32) -> (f32, f32) {
        match self.orientation {
            Orientation::Horizontal => (along, across),
            Orientation::Vertical => (across, along),
        }
    }

    /// Rectangle spanning `[along, along + thickness)` by `[a0, a1]`.
    pub fn rect<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        along: f32,
        thickness: f32,
        a0: f32,
        a1: f32,
        color: Color,
    ) {
        let lo = a0.min(a1);
        let span = (a1 - a0).abs().max(1.0);
        match self.orientation {
            Orientation::Horizontal => canvas.fill_rect(along, lo, thickness, span, color),
            Orientation::Vertical => canvas.fill_rect(lo, along, span, thickness, color),
        }
    }

    /// Full-across band from `p0` to `p1` along the time axis.
    pub fn band<C: Canvas + ?Sized>(&self, canvas: &mut C, p0: f32, p1: f32, color: Color) {
        self.rect(canvas, p0, (p1 - p0).max(1.0), 0.0, self.across, color);
    }

    pub fn line<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
    ) {
        let (x0, y0) = self.point(from.0, from.1);
        let (x1, y1) = self.point(to.0, to.1);
        canvas.line(x0, y0, x1, y1, color);
    }

    pub fn text<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        along: f32,
        across: f32,
        text: &str,
        color: Color,
    ) {
        let (x, y) = self.point(along, across);
        canvas.text(x, y, text, color);
    }
}

/// Detail-view renderer.
#[derive(Clone, Debug)]
pub struct WaveformRenderer {
    pub orientation: Orientation,
    pub clip_threshold: f32,
    pub palette: Palette,
}

impl WaveformRenderer {
    pub fn new(orientation: Orientation, clip_threshold: f32) -> Self {
        Self { orientation, clip_threshold, palette: Palette::default() }
    }

    /// Draw the visible part of `buffer`.
    ///
    /// `playback` is a block index; `high_res` holds raw samples for (part of)
    /// the visible range and is only used when zoomed in far enough.
    pub fn draw<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        buffer: &DecimationBuffer,
        view: &ViewWindow,
        selection: Option<SelectionRange>,
        playback: Option<usize>,
        high_res: Option<&[RawPoint]>,
    ) -> RenderStats {
        canvas.clear(self.palette.background);
        let axes = Axes::of(canvas, self.orientation);

        let total = buffer.len().min(view.total());
        let visible = view.visible_samples();
        if total == 0 || visible == 0 || axes.along < 1.0 || axes.across < 1.0 {
            return RenderStats::empty(view);
        }
        let start = view.view_start();
        let end = (start + visible).min(total);
        let spp = visible as f64 / axes.along as f64;

        if let Some(sel) = selection {
            self.draw_selection_fill(canvas, &axes, sel, start, visible);
        }

        let mut stats = if spp <= 1.0 {
            let raw = high_res.map(|pts| visible_points(pts, start, end)).unwrap_or(&[]);
            let raw_per_pixel = raw.len() as f64 / axes.along as f64;
            if covers(raw, start, end)
                && (visible <= HIGH_RES_MAX_BLOCKS || raw_per_pixel <= HIGH_RES_MAX_RAW_PER_PIXEL)
            {
                self.draw_high_res(canvas, &axes, raw, start, visible)
            } else {
                self.draw_per_block(canvas, &axes, buffer, start, end, visible)
            }
        } else {
            self.draw_aggregate(canvas, &axes, buffer, start, end, spp)
        };
        stats.samples_per_pixel = spp;
        stats.view_start = start;
        stats.visible_samples = visible;

        if let Some(sel) = selection {
            self.draw_selection_edges(canvas, &axes, sel, start, visible);
        }
        if let Some(pos) = playback {
            self.draw_playback(canvas, &axes, pos, start, end, visible, buffer.effective_rate());
        }
        stats
    }

    fn draw_per_block<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        axes: &Axes,
        buffer: &DecimationBuffer,
        start: usize,
        end: usize,
        visible: usize,
    ) -> RenderStats {
        let ppb = axes.along / visible as f32;
        let mut clip_marks = 0;
        let mut columns = 0;
        for i in start..end {
            let Some((min, max)) = buffer.block(i) else { break };
            let along = (i - start) as f32 * ppb;
            if self.column(canvas, axes, along, ppb.max(1.0), min, max) {
                clip_marks += 1;
            }
            columns += 1;
        }
        RenderStats {
            path: RenderPath::PerBlock,
            samples_per_pixel: 0.0,
            view_start: start,
            visible_samples: visible,
            columns,
            clip_marks,
            raw_points: 0,
            markers: 0,
        }
    }

    fn draw_aggregate<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        axes: &Axes,
        buffer: &DecimationBuffer,
        start: usize,
        end: usize,
        spp: f64,
    ) -> RenderStats {
        let pixels = axes.along as usize;
        let mut clip_marks = 0;
        let mut columns = 0;
        for p in 0..pixels {
            let s0 = start + (p as f64 * spp).floor() as usize;
            let s1 = (start + ((p + 1) as f64 * spp).floor() as usize).max(s0 + 1).min(end);
            let Some((min, max)) = buffer.range_extremes(s0, s1) else { continue };
            if self.column(canvas, axes, p as f32, 1.0, min, max) {
                clip_marks += 1;
            }
            columns += 1;
        }
        RenderStats {
            path: RenderPath::Aggregate,
            samples_per_pixel: spp,
            view_start: start,
            visible_samples: end - start,
            columns,
            clip_marks,
            raw_points: 0,
            markers: 0,
        }
    }

    /// One recentred min/max column. Returns whether a clip mark was drawn.
    fn column<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        axes: &Axes,
        along: f32,
        thickness: f32,
        min: f32,
        max: f32,
    ) -> bool {
        let (adj_min, adj_max) = recenter(min, max);
        let clipped = adj_max.abs() >= self.clip_threshold || adj_min.abs() >= self.clip_threshold;
        if clipped {
            axes.band(canvas, along, along + 1.0, self.palette.clip);
        }
        axes.rect(canvas, along, thickness, axes.level(adj_max), axes.level(adj_min), self.palette.wave);
        clipped
    }

    fn draw_high_res<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        axes: &Axes,
        raw: &[RawPoint],
        start: usize,
        visible: usize,
    ) -> RenderStats {
        let ppb = axes.along as f64 / visible as f64;
        let to_along = |pos: f64| ((pos - start as f64) * ppb) as f32;
        let mean = raw.iter().map(|p| p.value as f64).sum::<f64>() / raw.len() as f64;
        let centred = |v: f32| (v as f64 - mean).clamp(-1.0, 1.0) as f32;
        let to_across = |v: f32| axes.level(centred(v));

        // Connecting line: may be thinned by interpolation.
        let target = (axes.along as usize * HIGH_RES_POINTS_PER_PIXEL).max(2);
        let line_points: Vec<RawPoint> = if raw.len() > target {
            resample_points(raw, target)
        } else {
            raw.to_vec()
        };
        for pair in line_points.windows(2) {
            axes.line(
                canvas,
                (to_along(pair[0].pos), to_across(pair[0].value)),
                (to_along(pair[1].pos), to_across(pair[1].value)),
                self.palette.raw_line,
            );
        }

        // Markers sit on real samples only.
        let stride = (raw.len() as f64 / axes.along as f64).ceil().max(1.0) as usize;
        let mut clip_marks = 0;
        let mut markers = 0;
        for p in raw.iter().step_by(stride) {
            let along = to_along(p.pos);
            let value = centred(p.value);
            if value.abs() >= self.clip_threshold {
                axes.band(canvas, along, along + 1.0, self.palette.clip);
                clip_marks += 1;
            }
            let across = axes.level(value);
            axes.rect(canvas, along - 1.0, 3.0, across - 1.0, across + 1.0, self.palette.raw_marker);
            markers += 1;
        }

        RenderStats {
            path: RenderPath::HighRes,
            samples_per_pixel: 0.0,
            view_start: start,
            visible_samples: visible,
            columns: line_points.len(),
            clip_marks,
            raw_points: raw.len(),
            markers,
        }
    }

    fn draw_selection_fill<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        axes: &Axes,
        sel: SelectionRange,
        start: usize,
        visible: usize,
    ) {
        if let Some((s, e)) = sel.clip_to(start, start + visible) {
            let scale = axes.along / visible as f32;
            let p0 = (s - start) as f32 * scale;
            let p1 = (e - start) as f32 * scale;
            axes.band(canvas, p0, p1, self.palette.selection_fill);
        }
    }

    fn draw_selection_edges<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        axes: &Axes,
        sel: SelectionRange,
        start: usize,
        visible: usize,
    ) {
        let end = start + visible;
        let scale = axes.along / visible as f32;
        for boundary in [sel.start, sel.end] {
            if boundary >= start && boundary <= end {
                let p = ((boundary - start) as f32 * scale).min(axes.along - 1.0);
                axes.band(canvas, p, p + 1.0, self.palette.selection_edge);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_playback<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        axes: &Axes,
        pos: usize,
        start: usize,
        end: usize,
        visible: usize,
        effective_rate: f64,
    ) {
        if pos < start || pos >= end {
            return;
        }
        let p = (pos - start) as f32 * axes.along / visible as f32;
        axes.band(canvas, p, p + 1.0, self.palette.playback);

        // Arrowheads pointing into the canvas from both edges.
        for (i, w) in [7.0f32, 5.0, 3.0].iter().enumerate() {
            let off = i as f32;
            let half = (w - 1.0) / 2.0;
            axes.rect(canvas, p - half, *w, off, off, self.palette.playback);
            axes.rect(canvas, p - half, *w, axes.across - 1.0 - off, axes.across - 1.0 - off, self.palette.playback);
        }

        if effective_rate > 0.0 {
            let label = format_time(pos as f64 / effective_rate);
            axes.text(canvas, p + 3.0, 4.0, &label, self.palette.playback);
        }
    }
}

/// Points whose position falls inside `start..end`.
fn visible_points(points: &[RawPoint], start: usize, end: usize) -> &[RawPoint] {
    let (lo, hi) = (start as f64, end as f64);
    let a = points.partition_point(|p| p.pos < lo);
    let b = points.partition_point(|p| p.pos < hi);
    &points[a..b.max(a)]
}

/// Whether `points` reach from block `start` to the last block before `end`.
fn covers(points: &[RawPoint], start: usize, end: usize) -> bool {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => first.pos <= start as f64 && last.pos >= (end - 1) as f64,
        _ => false,
    }
}

/// Linear resample of a point list to `count` points (endpoints kept).
fn resample_points(points: &[RawPoint], count: usize) -> Vec<RawPoint> {
    if points.len() < 2 || count < 2 {
        return points.to_vec();
    }
    let spring = (points.len() - 1) as f64 / (count - 1) as f64;
    (0..count)
        .map(|i| {
            let t = i as f64 * spring;
            let lo = t.floor() as usize;
            let hi = (t.ceil() as usize).min(points.len() - 1);
            let frac = t - lo as f64;
            let (a, b) = (points[lo], points[hi]);
            RawPoint {
                pos: a.pos + (b.pos - a.pos) * frac,
                value: (a.value as f64 + (b.value as f64 - a.value as f64) * frac) as f32,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::canvas::PixelBuffer;

    fn setup(blocks: usize, width: u32) -> (DecimationBuffer, ViewWindow) {
        // factor 2: every (0.5, -0.5) pair becomes a (-0.5, 0.5) block
        let mut buf = DecimationBuffer::new(2.0, 1.0);
        let samples: Vec<f32> = (0..blocks * 2)
            .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        buf.append(&samples);
        let mut view = ViewWindow::new(width, 1.5);
        view.set_total(buf.len());
        view.scroll_to_latest();
        (buf, view)
    }

    #[test]
    fn recenter_removes_offset_and_clamps() {
        let close = |a: (f32, f32), b: (f32, f32)| (a.0 - b.0).abs() < 1e-6 && (a.1 - b.1).abs() < 1e-6;
        assert!(close(recenter(0.2, 0.6), (-0.2, 0.2)));
        assert_eq!(recenter(-3.0, 3.0), (-1.0, 1.0));
    }

    #[test]
    fn coarse_view_takes_aggregate_path() {
        let (buf, view) = setup(10_000, 800);
        let mut canvas = PixelBuffer::new(800, 100);
        let r = WaveformRenderer::new(Orientation::Horizontal, 0.99);
        let stats = r.draw(&mut canvas, &buf, &view, None, None, None);
        assert_eq!(stats.path, RenderPath::Aggregate);
        assert!((stats.samples_per_pixel - 12.5).abs() < 1e-12);
        assert_eq!(stats.columns, 800);
    }

    #[test]
    fn fine_view_draws_per_block() {
        let (buf, mut view) = setup(1000, 800);
        view.set_zoom(2.5, None);
        let mut canvas = PixelBuffer::new(800, 100);
        let r = WaveformRenderer::new(Orientation::Horizontal, 0.99);
        let stats = r.draw(&mut canvas, &buf, &view, None, None, None);
        assert_eq!(stats.path, RenderPath::PerBlock);
        assert_eq!(stats.columns, 400);
        // +/-0.5 blocks fill a quarter-to-three-quarter band
        assert_eq!(canvas.pixel(10, 50), Some(r.palette.wave));
        assert_eq!(canvas.pixel(10, 5), Some(r.palette.background));
    }

    #[test]
    fn full_scale_columns_get_clip_marks() {
        let mut buf = DecimationBuffer::new(2.0, 1.0);
        buf.append(&[1.0, -1.0, 0.1, -0.1]);
        let mut view = ViewWindow::new(4, 1.5);
        view.set_total(buf.len());
        let mut canvas = PixelBuffer::new(4, 20);
        let r = WaveformRenderer::new(Orientation::Horizontal, 0.99);
        let stats = r.draw(&mut canvas, &buf, &view, None, None, None);
        assert_eq!(stats.path, RenderPath::PerBlock);
        assert_eq!(stats.clip_marks, 1);
    }

    #[test]
    fn high_res_draws_markers_on_raw_samples() {
        let (buf, mut view) = setup(1000, 800);
        view.set_view_range(500, 400);
        let raw: Vec<RawPoint> = (0..2000)
            .map(|i| RawPoint { pos: i as f64 / 2.0, value: if i % 2 == 0 { 0.5 } else { -0.5 } })
            .collect();
        let mut canvas = PixelBuffer::new(800, 100);
        let r = WaveformRenderer::new(Orientation::Horizontal, 0.99);
        let stats = r.draw(&mut canvas, &buf, &view, None, None, Some(&raw));
        assert_eq!(stats.path, RenderPath::HighRes);
        // two raw samples per visible block, all inside the window
        assert_eq!(stats.raw_points, 2 * view.visible_samples());
        assert!(canvas.count_color(r.palette.raw_marker) > 0);
    }

    fn dense_raw(blocks: usize, per_block: usize, value: impl Fn(usize) -> f32) -> Vec<RawPoint> {
        (0..blocks * per_block)
            .map(|i| RawPoint { pos: i as f64 / per_block as f64, value: value(i) })
            .collect()
    }

    #[test]
    fn few_visible_blocks_force_high_res_on_dense_raw() {
        let (buf, view) = setup(4, 8);
        assert_eq!(view.visible_samples(), 4);
        let raw = dense_raw(4, 10, |i| ((i as f32) * 0.7).sin() * 0.3);
        let mut canvas = PixelBuffer::new(8, 40);
        let r = WaveformRenderer::new(Orientation::Horizontal, 0.99);
        let stats = r.draw(&mut canvas, &buf, &view, None, None, Some(&raw));
        // 40 raw samples on 8 px is well past the density limit
        assert_eq!(stats.path, RenderPath::HighRes);
        assert_eq!(stats.raw_points, 40);
        let stride = 40usize.div_ceil(8);
        assert_eq!(stats.markers, 40usize.div_ceil(stride));
        assert!(canvas.count_color(r.palette.raw_marker) > 0);

        // one block more and the same density draws blocks instead
        let (buf, view) = setup(5, 10);
        let raw = dense_raw(5, 10, |i| ((i as f32) * 0.7).sin() * 0.3);
        let mut canvas = PixelBuffer::new(10, 40);
        let stats = r.draw(&mut canvas, &buf, &view, None, None, Some(&raw));
        assert_eq!(stats.path, RenderPath::PerBlock);
        assert_eq!(stats.markers, 0);
    }

    #[test]
    fn high_res_clip_marks_use_centred_values() {
        let (buf, view) = setup(4, 8);
        let r = WaveformRenderer::new(Orientation::Horizontal, 0.9);

        // large DC offset, small swing: nothing near full scale once centred
        let offset = dense_raw(4, 10, |i| if i % 2 == 0 { 0.96 } else { 0.94 });
        let mut canvas = PixelBuffer::new(8, 40);
        let stats = r.draw(&mut canvas, &buf, &view, None, None, Some(&offset));
        assert_eq!(stats.path, RenderPath::HighRes);
        assert_eq!(stats.clip_marks, 0);

        let full = dense_raw(4, 10, |_| 0.95);
        let swing: Vec<RawPoint> = full
            .iter()
            .enumerate()
            .map(|(i, p)| RawPoint { pos: p.pos, value: if i % 2 == 0 { p.value } else { -p.value } })
            .collect();
        let stats = r.draw(&mut canvas, &buf, &view, None, None, Some(&swing));
        assert_eq!(stats.clip_marks, stats.markers);
    }

    #[test]
    fn partial_raw_history_falls_back_to_blocks() {
        let (buf, view) = setup(4, 8);
        // raw samples only for blocks 2..4
        let raw: Vec<RawPoint> = dense_raw(4, 10, |_| 0.1).into_iter().filter(|p| p.pos >= 2.0).collect();
        let mut canvas = PixelBuffer::new(8, 40);
        let r = WaveformRenderer::new(Orientation::Horizontal, 0.99);
        let stats = r.draw(&mut canvas, &buf, &view, None, None, Some(&raw));
        assert_eq!(stats.path, RenderPath::PerBlock);
        assert_eq!(stats.raw_points, 0);
    }

    #[test]
    fn dense_raw_window_falls_back_to_blocks() {
        let (buf, mut view) = setup(1000, 100);
        view.set_zoom(2.0, None);
        // 500 blocks on 100 px would be aggregate; use a wider canvas for per-block
        let mut canvas = PixelBuffer::new(1000, 50);
        view.set_extent(1000);
        let raw: Vec<RawPoint> = (0..10_000)
            .map(|i| RawPoint { pos: i as f64 / 10.0, value: 0.0 })
            .collect();
        let r = WaveformRenderer::new(Orientation::Horizontal, 0.99);
        let stats = r.draw(&mut canvas, &buf, &view, None, None, Some(&raw));
        assert_eq!(stats.path, RenderPath::PerBlock);
    }

    #[test]
    fn selection_and_playback_overlay() {
        let (buf, view) = setup(800, 800);
        let mut canvas = PixelBuffer::new(800, 100);
        let r = WaveformRenderer::new(Orientation::Horizontal, 0.99);
        let sel = SelectionRange { start: 100, end: 200 };
        r.draw(&mut canvas, &buf, &view, Some(sel), Some(400), None);
        assert_eq!(canvas.pixel(100, 2), Some(r.palette.selection_edge));
        assert_eq!(canvas.pixel(200, 2), Some(r.palette.selection_edge));
        assert_eq!(canvas.pixel(400, 50), Some(r.palette.playback));
        // 800 blocks at 1 block/s
        assert_eq!(canvas.labels()[0].text, "6:40.00");
    }

    #[test]
    fn vertical_layout_swaps_axes() {
        let (buf, view) = setup(100, 100);
        let mut canvas = PixelBuffer::new(40, 100);
        let r = WaveformRenderer::new(Orientation::Vertical, 0.99);
        let stats = r.draw(&mut canvas, &buf, &view, None, None, None);
        assert_eq!(stats.path, RenderPath::PerBlock);
        assert_eq!(canvas.pixel(20, 50), Some(r.palette.wave));
        assert_eq!(canvas.pixel(1, 50), Some(r.palette.background));
    }

    #[test]
    fn empty_buffer_draws_nothing() {
        let buf = DecimationBuffer::new(48_000.0, 5000.0);
        let view = ViewWindow::new(800, 1.5);
        let mut canvas = PixelBuffer::new(800, 100);
        let r = WaveformRenderer::new(Orientation::Horizontal, 0.99);
        let stats = r.draw(&mut canvas, &buf, &view, None, Some(3), None);
        assert_eq!(stats.path, RenderPath::Empty);
        assert_eq!(canvas.count_color(r.palette.background), 800 * 100);
    }

    #[test]
    fn resampled_points_keep_endpoints() {
        let pts: Vec<RawPoint> = (0..11).map(|i| RawPoint { pos: i as f64, value: i as f32 }).collect();
        let out = resample_points(&pts, 6);
        assert_eq!(out.len(), 6);
        assert_eq!(out[0], pts[0]);
        assert_eq!(out[5], pts[10]);
        assert!((out[1].value - 2.0).abs() < 1e-6);
    }
}
