// src/waveform/view.rs

use log::trace;

const ZOOM_EPSILON: f64 = 1e-9;

/// Whether the view follows newly appended data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollMode {
    AutoScroll,
    Manual,
}

/// The visible sub-range of the decimated block stream.
///
/// All positions are block indices. `total` mirrors the length of the
/// decimation buffer and `extent` is the time-axis size of the detail canvas in
/// device pixels.
#[derive(Clone, Debug)]
pub struct ViewWindow {
    zoom_factor: f64,
    view_start: usize,
    auto_scroll: bool,
    pan_remainder: f64,
    zoom_step_base: f64,
    total: usize,
    extent: u32,
}

impl ViewWindow {
    pub fn new(extent: u32, zoom_step_base: f64) -> Self {
        Self {
            zoom_factor: 1.0,
            view_start: 0,
            auto_scroll: true,
            pan_remainder: 0.0,
            zoom_step_base: if zoom_step_base > 1.0 { zoom_step_base } else { 1.5 },
            total: 0,
            extent,
        }
    }

    // --- STATE ---

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    pub fn view_start(&self) -> usize {
        self.view_start
    }

    pub fn is_auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn mode(&self) -> ScrollMode {
        if self.auto_scroll { ScrollMode::AutoScroll } else { ScrollMode::Manual }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn extent(&self) -> u32 {
        self.extent
    }

    /// Update the block count. Callers follow up with `scroll_to_latest` or
    /// `enforce_view_bounds`.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
    }

    pub fn set_extent(&mut self, extent: u32) {
        self.extent = extent;
        self.enforce_view_bounds();
    }

    // --- DERIVED ---

    /// Smallest window the zoom may shrink to.
    pub fn min_visible(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        let m = if self.total <= self.extent as usize {
            self.total.div_ceil(6)
        } else {
            self.extent as usize / 2
        };
        m.max(1)
    }

    pub fn visible_samples(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        let raw = (self.total as f64 / self.zoom_factor).round() as usize;
        raw.clamp(self.min_visible(), self.total)
    }

    pub fn max_zoom(&self) -> f64 {
        let min_visible = self.min_visible();
        if min_visible == 0 {
            return 1.0;
        }
        (self.total as f64 / min_visible as f64).max(1.0)
    }

    /// Last visible block index, exclusive.
    pub fn view_end(&self) -> usize {
        self.view_start + self.visible_samples()
    }

    /// Blocks covered by one device pixel. Zero when there is nothing to show.
    pub fn samples_per_pixel(&self) -> f64 {
        if self.extent == 0 {
            return 0.0;
        }
        self.visible_samples() as f64 / self.extent as f64
    }

    /// `view_start + (px / extent) * visible`, clamped into `0..=total`.
    pub fn pixel_to_sample(&self, px: f64) -> usize {
        if self.extent == 0 || self.total == 0 || !px.is_finite() {
            return self.view_start;
        }
        let s = self.view_start as f64 + (px / self.extent as f64) * self.visible_samples() as f64;
        s.max(0.0).round().min(self.total as f64) as usize
    }

    pub fn sample_to_pixel(&self, sample: f64) -> f64 {
        let visible = self.visible_samples();
        if visible == 0 {
            return 0.0;
        }
        (sample - self.view_start as f64) / visible as f64 * self.extent as f64
    }

    // --- ZOOM ---

    /// Zoom to `target`, keeping `anchor` (a block index) at the same relative
    /// position in the viewport. Without an anchor the viewport midpoint is held.
    pub fn set_zoom(&mut self, target: f64, anchor: Option<f64>) {
        if self.total == 0 || !target.is_finite() {
            return;
        }
        let target = target.clamp(1.0, self.max_zoom());
        if (target - self.zoom_factor).abs() < ZOOM_EPSILON {
            return;
        }

        let prev_visible = self.visible_samples() as f64;
        let start = self.view_start as f64;
        self.zoom_factor = target;
        let new_visible = self.visible_samples() as f64;

        let anchor = anchor
            .filter(|a| a.is_finite())
            .unwrap_or(start + prev_visible / 2.0);
        let relative = if prev_visible > 0.0 { (anchor - start) / prev_visible } else { 0.5 };
        let new_start = (anchor - relative * new_visible).round();
        self.view_start = if new_start > 0.0 { new_start as usize } else { 0 };

        self.auto_scroll = false;
        self.enforce_view_bounds();
        trace!(
            "zoom {:.3} -> visible {} from {}",
            self.zoom_factor,
            new_visible,
            self.view_start
        );
    }

    /// Multiply the zoom by `base^steps`. `anchor_ratio` is a viewport fraction
    /// (0 = leading edge, 1 = trailing edge).
    pub fn zoom_by_steps(&mut self, steps: f64, anchor_ratio: Option<f64>) {
        let target = self.zoom_factor * self.zoom_step_base.powf(steps);
        let anchor = anchor_ratio.map(|r| {
            self.view_start as f64 + r.clamp(0.0, 1.0) * self.visible_samples() as f64
        });
        self.set_zoom(target, anchor);
    }

    /// Show exactly `start..start + len` (as far as the zoom limits allow).
    pub fn set_view_range(&mut self, start: usize, len: usize) {
        if self.total == 0 || len == 0 {
            return;
        }
        self.zoom_factor = (self.total as f64 / len as f64).clamp(1.0, self.max_zoom());
        self.view_start = start;
        self.auto_scroll = false;
        self.enforce_view_bounds();
    }

    /// Put `sample` in the middle of the viewport at the current zoom.
    pub fn center_on(&mut self, sample: usize) {
        let half = self.visible_samples() / 2;
        self.view_start = sample.saturating_sub(half);
        self.auto_scroll = false;
        self.enforce_view_bounds();
    }

    // --- PAN ---

    pub fn pan_by_samples(&mut self, delta: i64) {
        self.auto_scroll = false;
        let shifted = (self.view_start as i64).saturating_add(delta);
        self.view_start = shifted.max(0) as usize;
        self.enforce_view_bounds();
    }

    /// Pan by a pixel distance. Sub-block motion is carried to the next call.
    pub fn pan_by_pixels(&mut self, pixel_delta: f64) {
        let spp = self.samples_per_pixel();
        if spp <= 0.0 || !pixel_delta.is_finite() {
            return;
        }
        let exact = pixel_delta * spp + self.pan_remainder;
        let whole = exact.trunc();
        self.pan_remainder = exact - whole;
        self.pan_by_samples(whole as i64);
    }

    pub fn pan_remainder(&self) -> f64 {
        self.pan_remainder
    }

    // --- FOLLOW / BOUNDS ---

    pub fn scroll_to_latest(&mut self) {
        if self.auto_scroll {
            self.view_start = self.total - self.visible_samples();
        }
    }

    pub fn enforce_view_bounds(&mut self) {
        let visible = self.visible_samples();
        if visible >= self.total {
            self.view_start = 0;
        } else {
            self.view_start = self.view_start.min(self.total - visible);
        }
    }

    /// Back to the full, following view.
    pub fn reset_view(&mut self) {
        self.zoom_factor = 1.0;
        self.auto_scroll = true;
        self.pan_remainder = 0.0;
        self.scroll_to_latest();
    }
}
