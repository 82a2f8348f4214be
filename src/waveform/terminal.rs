// src/waveform/terminal.rs

use crate::waveform::canvas::{Canvas, Color};

/// Character-cell canvas for drawing the waveform in a terminal.
///
/// One cell is one "pixel". Opaque fills become full blocks, translucent fills
/// shade only empty cells, lines are drawn with dots.
pub struct AsciiCanvas {
    width: u32,
    height: u32,
    cells: Vec<Vec<char>>,
}

impl AsciiCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let h = height.max(4);
        Self {
            width,
            height: h,
            cells: vec![vec![' '; width as usize]; h as usize],
        }
    }

    pub fn rows(&self) -> Vec<String> {
        self.cells.iter().map(|row| row.iter().collect()).collect()
    }

    fn put(&mut self, x: i64, y: i64, ch: char, overwrite: bool) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let cell = &mut self.cells[y as usize][x as usize];
        if overwrite || *cell == ' ' {
            *cell = ch;
        }
    }
}

impl Canvas for AsciiCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, _color: Color) {
        for row in &mut self.cells {
            row.fill(' ');
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        if color.a == 0 || !(x.is_finite() && y.is_finite() && w.is_finite() && h.is_finite()) {
            return;
        }
        let (ch, overwrite) = if color.a == 255 { ('█', true) } else { ('░', false) };
        let x0 = x.floor() as i64;
        let y0 = y.floor() as i64;
        let x1 = (x + w.max(1.0)).ceil() as i64;
        let y1 = (y + h.max(1.0)).ceil() as i64;
        for cy in y0..y1 {
            for cx in x0..x1 {
                self.put(cx, cy, ch, overwrite);
            }
        }
    }

    fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, _color: Color) {
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return;
        }
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as i64;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (x0 + (x1 - x0) * t).round() as i64;
            let y = (y0 + (y1 - y0) * t).round() as i64;
            self.put(x, y, '·', false);
        }
    }

    fn text(&mut self, x: f32, y: f32, text: &str, _color: Color) {
        let y = y.round() as i64;
        let mut cx = x.round() as i64;
        for ch in text.chars() {
            self.put(cx, y, ch, true);
            cx += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_fill_draws_blocks() {
        let mut c = AsciiCanvas::new(3, 4);
        c.fill_rect(1.0, 0.0, 1.0, 4.0, Color::rgb(1, 2, 3));
        let rows = c.rows();
        assert!(rows.iter().all(|r| r == " █ "));
    }

    #[test]
    fn translucent_fill_keeps_existing_cells() {
        let mut c = AsciiCanvas::new(2, 4);
        c.fill_rect(0.0, 0.0, 1.0, 1.0, Color::rgb(1, 2, 3));
        c.fill_rect(0.0, 0.0, 2.0, 1.0, Color::rgba(1, 2, 3, 40));
        assert_eq!(c.rows()[0], "█░");
    }

    #[test]
    fn text_overwrites() {
        let mut c = AsciiCanvas::new(6, 4);
        c.text(1.0, 2.0, "1:00", Color::rgb(0, 0, 0));
        assert_eq!(c.rows()[2], " 1:00 ");
    }
}
