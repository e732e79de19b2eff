// canvas.rs - CPU Rasterizer for Overlay Surfaces
//
// Each overlay surface covers a whole monitor. The scene is tiny (one outline,
// an optional tab and an optional dot), so it is rasterized on the CPU into an
// RGBA buffer and handed to the GPU as a single texture.
//
// Pixels are either fully transparent (0,0,0,0) or fully opaque, which makes
// the buffer valid as both straight and premultiplied alpha.

use std::ops::Range;

use crate::constants::{colors, overlay};
use crate::rect::{RenderState, Rgb};

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// RGBA8 pixel buffer, row-major, top-left origin
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Resize and clear. No-op when the size is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize * 4];
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let offset = self.offset(x, y)?;
        let mut px = TRANSPARENT;
        px.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(px)
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok().filter(|&x| x < self.width)?;
        let y = u32::try_from(y).ok().filter(|&y| y < self.height)?;
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    /// Rows `top..bottom` (exclusive) that lie on the canvas
    fn visible_rows(&self, top: i64, bottom: i64) -> Range<i64> {
        top.max(0)..bottom.min(i64::from(self.height))
    }

    /// Fill pixels `x0..x1` (exclusive) on row `y`, clipped to the canvas.
    fn fill_span(&mut self, y: i64, x0: i64, x1: i64, rgba: [u8; 4]) {
        if y < 0 || y >= i64::from(self.height) {
            return;
        }
        let x0 = x0.max(0);
        let x1 = x1.min(i64::from(self.width));
        if x0 >= x1 {
            return;
        }
        let row = y as usize * self.width as usize;
        let start = (row + x0 as usize) * 4;
        let end = (row + x1 as usize) * 4;
        for px in self.pixels[start..end].chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Fill an axis-aligned box; `width`/`height` may be zero or negative (nothing drawn).
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgb) {
        let rgba = color.to_rgba();
        let (x0, x1) = (i64::from(x), i64::from(x) + i64::from(width));
        let top = i64::from(y);
        for row in self.visible_rows(top, top + i64::from(height)) {
            self.fill_span(row, x0, x1, rgba);
        }
    }

    /// Outline a rectangle whose edges run through `x`, `x + width`, `y` and
    /// `y + height` inclusive, drawing `thickness` pixels inward.
    pub fn stroke_rect(&mut self, x: i32, y: i32, width: i32, height: i32, thickness: i32, color: Rgb) {
        let outer_w = width.saturating_add(1);
        let outer_h = height.saturating_add(1);
        let t = thickness.max(1).min(outer_w).min(outer_h);

        self.fill_rect(x, y, outer_w, t, color);
        self.fill_rect(x, y.saturating_add(outer_h - t), outer_w, t, color);
        self.fill_rect(x, y.saturating_add(t), t, outer_h - 2 * t, color);
        self.fill_rect(x.saturating_add(outer_w - t), y.saturating_add(t), t, outer_h - 2 * t, color);
    }

    /// Fill an axis-aligned ellipse, sampling at pixel centres.
    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Rgb) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let rgba = color.to_rgba();
        let top = (cy - ry).floor() as i64;
        let bottom = (cy + ry).ceil() as i64;
        for row in self.visible_rows(top, bottom + 1) {
            let dy = (row as f32 + 0.5 - cy) / ry;
            let span = 1.0 - dy * dy;
            if span < 0.0 {
                continue;
            }
            let half = rx * span.sqrt();
            let x0 = (cx - half - 0.5).ceil() as i64;
            let x1 = (cx + half - 0.5).floor() as i64 + 1;
            self.fill_span(row, x0, x1, rgba);
        }
    }

    /// Fill a simple or self-intersecting polygon with the even-odd rule,
    /// sampling at pixel centres.
    pub fn fill_polygon(&mut self, points: &[(f32, f32)], color: Rgb) {
        if points.len() < 3 {
            return;
        }
        let rgba = color.to_rgba();
        let min_y = points.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
        let max_y = points.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);

        let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
        for row in self.visible_rows(min_y.floor() as i64, max_y.ceil() as i64 + 1) {
            let sample_y = row as f32 + 0.5;
            crossings.clear();
            for (i, &(x0, y0)) in points.iter().enumerate() {
                let (x1, y1) = points[(i + 1) % points.len()];
                // Half-open edge test so shared vertices count once
                if (y0 <= sample_y) != (y1 <= sample_y) {
                    crossings.push(x0 + (sample_y - y0) / (y1 - y0) * (x1 - x0));
                }
            }
            crossings.sort_by(f32::total_cmp);
            for pair in crossings.chunks_exact(2) {
                let x0 = (pair[0] - 0.5).ceil() as i64;
                let x1 = (pair[1] - 0.5).floor() as i64 + 1;
                self.fill_span(row, x0, x1, rgba);
            }
        }
    }

    /// Redraw the whole overlay scene for one rectangle.
    pub fn paint(&mut self, state: &RenderState) {
        self.clear();

        self.stroke_rect(
            state.x,
            state.y,
            state.width,
            state.height,
            overlay::OUTLINE_WIDTH,
            state.color,
        );

        if state.focused {
            let (x, y) = (state.x as f32, state.y as f32);
            let tab = overlay::FOCUS_TAB;
            self.fill_polygon(&[(x, y), (x + tab, y), (x, y + tab)], colors::FOCUS);
        }

        if let Some(marker) = state.marker {
            self.fill_ellipse(
                marker.x,
                marker.y,
                overlay::MARKER_RADIUS,
                overlay::MARKER_RADIUS,
                colors::MARKER,
            );
        }
    }
}
