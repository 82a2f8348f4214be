// src/waveform/selection.rs

use crate::waveform::view::ViewWindow;

/// A committed selection, always normalized so `start <= end` (block indices).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Overlap with `lo..hi`, if any.
    pub fn clip_to(&self, lo: usize, hi: usize) -> Option<(usize, usize)> {
        let s = self.start.max(lo);
        let e = self.end.min(hi);
        if s < e { Some((s, e)) } else { None }
    }
}

/// Which boundary of an existing selection a pointer grabbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

#[derive(Clone, Copy, Debug)]
enum Draft {
    New { anchor: usize, cursor: usize },
    Resize { edge: Edge, fixed: usize, cursor: usize },
}

#[derive(Clone, Debug)]
pub struct SelectionModel {
    committed: Option<SelectionRange>,
    draft: Option<Draft>,
    min_selection_secs: f64,
    playback_from: Option<usize>,
}

impl SelectionModel {
    pub fn new(min_selection_secs: f64) -> Self {
        Self {
            committed: None,
            draft: None,
            min_selection_secs: min_selection_secs.max(0.0),
            playback_from: None,
        }
    }

    /// Minimum selection length in blocks at the given block rate.
    pub fn min_selection_samples(&self, effective_rate: f64) -> usize {
        if effective_rate > 0.0 {
            (self.min_selection_secs * effective_rate).round() as usize
        } else {
            0
        }
    }

    pub fn begin(&mut self, sample: usize) {
        self.draft = Some(Draft::New { anchor: sample, cursor: sample });
    }

    /// Start dragging one boundary of the committed selection.
    pub fn begin_resize(&mut self, edge: Edge) -> bool {
        let Some(sel) = self.committed else {
            return false;
        };
        let (fixed, cursor) = match edge {
            Edge::Start => (sel.end, sel.start),
            Edge::End => (sel.start, sel.end),
        };
        self.draft = Some(Draft::Resize { edge, fixed, cursor });
        true
    }

    /// Pointer down at `px`: grab an edge of the committed selection when the
    /// pointer is within `threshold_px` of it, otherwise start a new selection.
    pub fn pointer_down(&mut self, px: f64, view: &ViewWindow, threshold_px: f64) {
        match self.hit_test(px, view, threshold_px) {
            Some(edge) => {
                self.begin_resize(edge);
            }
            None => self.begin(view.pixel_to_sample(px)),
        }
    }

    pub fn hit_test(&self, px: f64, view: &ViewWindow, threshold_px: f64) -> Option<Edge> {
        let sel = self.committed?;
        let ds = (view.sample_to_pixel(sel.start as f64) - px).abs();
        let de = (view.sample_to_pixel(sel.end as f64) - px).abs();
        match (ds <= threshold_px, de <= threshold_px) {
            (true, true) => Some(if ds <= de { Edge::Start } else { Edge::End }),
            (true, false) => Some(Edge::Start),
            (false, true) => Some(Edge::End),
            (false, false) => None,
        }
    }

    pub fn update(&mut self, sample: usize) {
        match &mut self.draft {
            Some(Draft::New { cursor, .. }) | Some(Draft::Resize { cursor, .. }) => {
                *cursor = sample
            }
            None => {}
        }
    }

    /// Finish the drag. Returns `false` (and leaves the previous selection in
    /// place) when the dragged range is shorter than the minimum.
    pub fn commit(&mut self, effective_rate: f64) -> bool {
        let Some(draft) = self.draft.take() else {
            return false;
        };
        let (a, b) = match draft {
            Draft::New { anchor, cursor } => (anchor, cursor),
            Draft::Resize { fixed, cursor, .. } => (fixed, cursor),
        };
        let range = SelectionRange { start: a.min(b), end: a.max(b) };
        if range.len() < self.min_selection_samples(effective_rate).max(1) {
            return false;
        }
        self.committed = Some(range);
        self.playback_from = None;
        true
    }

    pub fn clear(&mut self) {
        self.committed = None;
        self.draft = None;
        self.playback_from = None;
    }

    /// The selection to draw: the live drag if one is in progress, else the
    /// committed range.
    pub fn display_range(&self) -> Option<SelectionRange> {
        match self.draft {
            Some(Draft::New { anchor, cursor }) | Some(Draft::Resize { fixed: anchor, cursor, .. }) => {
                Some(SelectionRange { start: anchor.min(cursor), end: anchor.max(cursor) })
            }
            None => self.committed,
        }
    }

    pub fn range(&self) -> Option<SelectionRange> {
        self.committed
    }

    pub fn is_dragging(&self) -> bool {
        self.draft.is_some()
    }

    pub fn duration_secs(&self, effective_rate: f64) -> f64 {
        match self.committed {
            Some(sel) if effective_rate > 0.0 => sel.len() as f64 / effective_rate,
            _ => 0.0,
        }
    }

    /// Remember that playback was started from the selection.
    pub fn play_from_selection(&mut self) -> Option<usize> {
        let start = self.committed?.start;
        self.playback_from = Some(start);
        Some(start)
    }

    pub fn playback_from(&self) -> Option<usize> {
        self.playback_from
    }

    /// Drop parts of the selection that point past `total` blocks.
    pub fn clamp_to(&mut self, total: usize) {
        if let Some(sel) = self.committed {
            if sel.start >= total {
                self.clear();
            } else if sel.end > total {
                self.committed = Some(SelectionRange { start: sel.start, end: total });
            }
        }
    }
}
