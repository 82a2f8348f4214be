// src/waveform/overview.rs

use crate::config::Orientation;
use crate::waveform::canvas::Canvas;
use crate::waveform::decimation::DecimationBuffer;
use crate::waveform::render::{Axes, Palette, recenter};
use crate::waveform::ticks::{DEFAULT_TARGET_TICKS, choose_tick_step, format_time, tick_times};
use crate::waveform::view::ViewWindow;

/// Where a pointer landed relative to the overview's view rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverviewHit {
    Inside,
    LeadingEdge,
    TrailingEdge,
    Outside,
}

#[derive(Clone, Copy, Debug)]
enum OverviewDrag {
    /// Grab offset between pointer and view start, in blocks.
    Move { grab_offset: f64 },
    /// Dragging one edge; `fixed` is the opposite edge (block index).
    Resize { leading: bool, fixed: usize },
}

/// Whole-recording strip with a rectangle that mirrors and drives the detail view.
#[derive(Clone, Debug)]
pub struct OverviewSync {
    orientation: Orientation,
    extent: u32,
    edge_grab_px: f64,
    drag: Option<OverviewDrag>,
    pub palette: Palette,
}

impl OverviewSync {
    pub fn new(orientation: Orientation, extent: u32, edge_grab_px: f32) -> Self {
        Self {
            orientation,
            extent,
            edge_grab_px: edge_grab_px as f64,
            drag: None,
            palette: Palette::default(),
        }
    }

    pub fn set_extent(&mut self, extent: u32) {
        self.extent = extent;
    }

    pub fn extent(&self) -> u32 {
        self.extent
    }

    /// Pixel span `(p0, p1)` of the view rectangle.
    pub fn window_rect(&self, view: &ViewWindow) -> Option<(f64, f64)> {
        let total = view.total();
        if total == 0 || self.extent == 0 {
            return None;
        }
        let scale = self.extent as f64 / total as f64;
        let p0 = view.view_start() as f64 * scale;
        Some((p0, p0 + view.visible_samples() as f64 * scale))
    }

    fn sample_at(&self, px: f64, view: &ViewWindow) -> f64 {
        if self.extent == 0 {
            return 0.0;
        }
        (px / self.extent as f64 * view.total() as f64).clamp(0.0, view.total() as f64)
    }

    pub fn hit_test(&self, px: f64, view: &ViewWindow) -> OverviewHit {
        let Some((p0, p1)) = self.window_rect(view) else {
            return OverviewHit::Outside;
        };
        if (px - p0).abs() <= self.edge_grab_px {
            OverviewHit::LeadingEdge
        } else if (px - p1).abs() <= self.edge_grab_px {
            OverviewHit::TrailingEdge
        } else if px > p0 && px < p1 {
            OverviewHit::Inside
        } else {
            OverviewHit::Outside
        }
    }

    /// Pointer pressed at `px` along the overview.
    ///
    /// A press outside the rectangle recentres the view on that point right away
    /// and continues as a move drag.
    pub fn pointer_down(&mut self, px: f64, view: &mut ViewWindow) -> OverviewHit {
        let hit = self.hit_test(px, view);
        let sample = self.sample_at(px, view);
        self.drag = match hit {
            OverviewHit::Inside => Some(OverviewDrag::Move {
                grab_offset: sample - view.view_start() as f64,
            }),
            OverviewHit::LeadingEdge => Some(OverviewDrag::Resize { leading: true, fixed: view.view_end() }),
            OverviewHit::TrailingEdge => Some(OverviewDrag::Resize { leading: false, fixed: view.view_start() }),
            OverviewHit::Outside => {
                if view.total() == 0 {
                    None
                } else {
                    view.center_on(sample.round() as usize);
                    Some(OverviewDrag::Move { grab_offset: sample - view.view_start() as f64 })
                }
            }
        };
        hit
    }

    pub fn pointer_move(&mut self, px: f64, view: &mut ViewWindow) {
        let Some(drag) = self.drag else { return };
        let sample = self.sample_at(px, view);
        match drag {
            OverviewDrag::Move { grab_offset } => {
                let target = (sample - grab_offset).round() as i64;
                view.pan_by_samples(target - view.view_start() as i64);
            }
            OverviewDrag::Resize { leading: true, fixed } => {
                let min = view.min_visible();
                let start = (sample.round() as usize).min(fixed.saturating_sub(min));
                view.set_view_range(start, fixed - start);
                // Zoom limits may have changed the width; keep the fixed edge put.
                if view.view_end() != fixed && fixed >= view.visible_samples() {
                    let delta = (fixed - view.visible_samples()) as i64 - view.view_start() as i64;
                    view.pan_by_samples(delta);
                }
            }
            OverviewDrag::Resize { leading: false, fixed } => {
                let min = view.min_visible();
                let end = (sample.round() as usize).max(fixed + min).min(view.total());
                view.set_view_range(fixed, end.saturating_sub(fixed).max(min));
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Draw the whole buffer, the view rectangle and time ticks.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C, buffer: &DecimationBuffer, view: &ViewWindow) {
        canvas.clear(self.palette.background);
        let axes = Axes::of(canvas, self.orientation);
        let total = buffer.len();
        if total == 0 || axes.along < 1.0 {
            return;
        }

        let pixels = axes.along as usize;
        let spp = total as f64 / axes.along as f64;
        for p in 0..pixels {
            let s0 = (p as f64 * spp).floor() as usize;
            let s1 = (((p + 1) as f64 * spp).floor() as usize).max(s0 + 1);
            let Some((min, max)) = buffer.range_extremes(s0, s1) else { continue };
            let (adj_min, adj_max) = recenter(min, max);
            axes.rect(canvas, p as f32, 1.0, axes.level(adj_max), axes.level(adj_min), self.palette.wave);
        }

        let duration = buffer.duration_secs();
        let rate = buffer.effective_rate();
        if duration > 0.0 && rate > 0.0 {
            let step = choose_tick_step(duration, DEFAULT_TARGET_TICKS);
            for t in tick_times(duration, step) {
                let p = (t * rate / total as f64 * axes.along as f64) as f32;
                axes.line(canvas, (p, axes.across - 4.0), (p, axes.across - 1.0), self.palette.tick);
                axes.text(canvas, p + 2.0, axes.across - 10.0, &format_time(t), self.palette.tick);
            }
        }

        if let Some((p0, p1)) = self.window_rect(view) {
            let (p0, p1) = (p0 as f32, p1 as f32);
            axes.band(canvas, p0, p1, self.palette.window_fill);
            axes.band(canvas, p0, p0 + 1.0, self.palette.window_edge);
            axes.band(canvas, (p1 - 1.0).max(p0), p1, self.palette.window_edge);
        }
    }
}
