// src/scope.rs

use std::fmt::Write as FmtWrite;
use std::io::{Write, stdout};
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{self, BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate},
};
use log::warn;

use crate::config::EngineConfig;
use crate::engine::{DetailUpdate, Interaction};
use crate::recorder::DeviceCapture;
use crate::session::RecordingSession;
use crate::waveform::{AsciiCanvas, RenderPath, ScrollMode};

const OVERVIEW_ROWS: u16 = 4;
const STATUS_ROWS: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DragTarget {
    Detail,
    Overview,
}

/// Live terminal waveform scope around one recording session.
pub struct ScopeController {
    session: RecordingSession,
    capture: Option<DeviceCapture>,
    out_dir: PathBuf,
    size: (u16, u16),
    detail: AsciiCanvas,
    overview: AsciiCanvas,
    drag: Option<DragTarget>,
    last_update: Option<DetailUpdate>,
    message: String,
    draw_buffer: String,
}

impl ScopeController {
    pub fn new(config: EngineConfig, out_dir: PathBuf) -> Result<Self> {
        let capture = DeviceCapture::start().context("failed to open input device")?;
        let mut session = RecordingSession::new(config);
        session.start(capture.sample_rate(), capture.channels())?;

        let mut scope = Self {
            session,
            capture: Some(capture),
            out_dir,
            size: (0, 0),
            detail: AsciiCanvas::new(0, 0),
            overview: AsciiCanvas::new(0, OVERVIEW_ROWS as u32),
            drag: None,
            last_update: None,
            message: String::new(),
            draw_buffer: String::new(),
        };
        scope.fit_terminal()?;
        Ok(scope)
    }

    fn detail_rows(&self) -> u16 {
        self.size.1.saturating_sub(OVERVIEW_ROWS + STATUS_ROWS).max(4)
    }

    /// Resize canvases and engine when the terminal size changed.
    fn fit_terminal(&mut self) -> Result<()> {
        let size = terminal::size()?;
        if size == self.size {
            return Ok(());
        }
        self.size = size;
        let cols = size.0 as u32;
        let rows = self.detail_rows() as u32;
        self.detail = AsciiCanvas::new(cols, rows);
        self.overview = AsciiCanvas::new(cols, OVERVIEW_ROWS as u32);
        self.session.resize(cols, rows, 1.0)?;
        Ok(())
    }

    /// Pull captured audio, redraw, flush to the terminal.
    pub fn run_tick(&mut self) -> Result<()> {
        if let Some(capture) = self.capture.as_mut() {
            let chunk = capture.drain();
            if !chunk.is_empty() {
                if let Err(e) = self.session.push_interleaved(&chunk) {
                    warn!("capture chunk dropped: {e}");
                }
            }
        }
        self.fit_terminal()?;
        self.render()
    }

    fn render(&mut self) -> Result<()> {
        if let Some(engine) = self.session.engine_mut() {
            self.last_update = Some(engine.draw_into(&mut self.detail, &mut self.overview, None));
        }

        self.draw_buffer.clear();
        let _ = write!(self.draw_buffer, "{}", MoveTo(0, 0));
        for line in self.detail.rows().iter().chain(self.overview.rows().iter()) {
            let _ = write!(self.draw_buffer, "{}\x1b[K\r\n", line);
        }
        let _ = write!(self.draw_buffer, "{}", Clear(ClearType::UntilNewLine));
        self.write_status();

        let mut stdout = stdout();
        execute!(stdout, BeginSynchronizedUpdate)?;
        stdout.write_all(self.draw_buffer.as_bytes())?;
        execute!(stdout, EndSynchronizedUpdate)?;
        stdout.flush()?;
        Ok(())
    }

    fn write_status(&mut self) {
        let secs = self.session.elapsed_secs() as u64;
        if self.session.is_recording() {
            let _ = write!(self.draw_buffer, "🔴 REC {:02}:{:02}", secs / 60, secs % 60);
        } else {
            let _ = write!(self.draw_buffer, "⏹  stopped");
        }
        if let Some(u) = &self.last_update {
            let path = match u.stats.path {
                RenderPath::Empty => "empty",
                RenderPath::PerBlock => "blocks",
                RenderPath::Aggregate => "aggregate",
                RenderPath::HighRes => "samples",
            };
            let follow = if u.mode == ScrollMode::AutoScroll { "follow" } else { "manual" };
            let _ = write!(
                self.draw_buffer,
                " | zoom {:.2}x {} | {} {:.2} blk/px",
                u.zoom_factor, follow, path, u.stats.samples_per_pixel
            );
            if u.stats.clip_marks > 0 {
                let _ = write!(self.draw_buffer, " | CLIP x{}", u.stats.clip_marks);
            }
            if u.selection.is_some() {
                let _ = write!(self.draw_buffer, " | sel {:.2}s", u.selection_secs);
            }
        }
        let _ = write!(self.draw_buffer, "\x1b[K\r\n");
        if self.message.is_empty() {
            let _ = write!(
                self.draw_buffer,
                "[+/-] zoom [←/→] pan [r] reset [c] clear sel [s] stop+save [q] quit"
            );
        } else {
            let _ = write!(self.draw_buffer, "{}", self.message);
        }
        let _ = write!(self.draw_buffer, "\x1b[K");
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn should_quit(&self, key: KeyCode) -> bool {
        matches!(key, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        let step = (self.size.0 as f64 / 8.0).max(1.0);
        let action = match key {
            KeyCode::Char('+') | KeyCode::Char('=') => {
                Some(Interaction::ZoomSteps { steps: 1.0, anchor_ratio: Some(0.5) })
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                Some(Interaction::ZoomSteps { steps: -1.0, anchor_ratio: Some(0.5) })
            }
            KeyCode::Left => Some(Interaction::PanPixels(-step)),
            KeyCode::Right => Some(Interaction::PanPixels(step)),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Interaction::ResetView),
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Interaction::SelectionClear),
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.stop_and_save();
                None
            }
            _ => None,
        };
        if let Some(action) = action {
            if let Err(e) = self.session.interact(action) {
                self.message = format!("❌ {e}");
            }
        }
    }

    pub fn handle_mouse(&mut self, ev: MouseEvent) {
        let px = ev.column as f64;
        let detail_rows = self.detail_rows();
        let in_overview = ev.row >= detail_rows && ev.row < detail_rows + OVERVIEW_ROWS;
        let action = match ev.kind {
            MouseEventKind::Down(MouseButton::Left) if ev.row < detail_rows => {
                self.drag = Some(DragTarget::Detail);
                Some(Interaction::SelectionBegin(px))
            }
            MouseEventKind::Down(MouseButton::Left) if in_overview => {
                self.drag = Some(DragTarget::Overview);
                Some(Interaction::OverviewDown(px))
            }
            MouseEventKind::Drag(MouseButton::Left) => match self.drag {
                Some(DragTarget::Detail) => Some(Interaction::SelectionUpdate(px)),
                Some(DragTarget::Overview) => Some(Interaction::OverviewMove(px)),
                None => None,
            },
            MouseEventKind::Up(MouseButton::Left) => match self.drag.take() {
                Some(DragTarget::Detail) => Some(Interaction::SelectionCommit),
                Some(DragTarget::Overview) => Some(Interaction::OverviewUp),
                None => None,
            },
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown if ev.row < detail_rows => {
                let steps = if ev.kind == MouseEventKind::ScrollUp { 1.0 } else { -1.0 };
                let ratio = if self.size.0 > 0 { px / self.size.0 as f64 } else { 0.5 };
                Some(Interaction::ZoomSteps { steps, anchor_ratio: Some(ratio) })
            }
            _ => None,
        };
        if let Some(action) = action {
            if let Err(e) = self.session.interact(action) {
                self.message = format!("❌ {e}");
            }
        }
    }

    /// Stop the input and write the container next to `out_dir`.
    pub fn stop_and_save(&mut self) {
        let Some(capture) = self.capture.take() else {
            return;
        };
        let tail = capture.stop();
        if !tail.is_empty() {
            if let Err(e) = self.session.push_interleaved(&tail) {
                warn!("final chunk dropped: {e}");
            }
        }
        self.message = match self.save() {
            Ok(path) => format!("💾 saved {}", path.display()),
            Err(e) => format!("❌ save failed: {e:#}"),
        };
    }

    fn save(&mut self) -> Result<PathBuf> {
        let recording = self.session.stop()?;
        let path = self.out_dir.join(&recording.filename);
        recording.file.write_to(&path)?;
        Ok(path)
    }
}
