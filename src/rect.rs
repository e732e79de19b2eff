// rect.rs - Editable Overlay Rectangle
//
// One rectangle shown on one monitor: its persisted geometry, identity
// (config section) and outline color, plus the ephemeral cursor marker and
// focus flag that only affect drawing.

use crate::config::RectRecord;
use crate::constants::rect::{MIN_HEIGHT, MIN_WIDTH};
use crate::geometry::MonitorRect;

/// 24-bit outline color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Opaque RGBA bytes
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 0xFF]
    }
}

/// Cursor marker position, monitor-relative, in the destination's space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub x: f32,
    pub y: f32,
}

impl Marker {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Everything a surface needs to draw one rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub color: Rgb,
    pub marker: Option<Marker>,
    pub focused: bool,
}

/// An editable rectangle bound to one monitor
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRect {
    section: String,
    color: Rgb,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    monitor_index: usize,
    marker: Option<Marker>,
    focused: bool,
}

impl OverlayRect {
    pub fn new(
        section: impl Into<String>,
        color: Rgb,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        monitor_index: usize,
    ) -> Self {
        Self {
            section: section.into(),
            color,
            x,
            y,
            width: width.max(MIN_WIDTH),
            height: height.max(MIN_HEIGHT),
            monitor_index,
            marker: None,
            focused: false,
        }
    }

    /// Build from a persisted record. The record's screen is ignored in favour
    /// of the already validated `monitor_index`.
    pub fn from_record(
        section: impl Into<String>,
        color: Rgb,
        record: &RectRecord,
        monitor_index: usize,
    ) -> Self {
        Self::new(
            section,
            color,
            record.x,
            record.y,
            record.width,
            record.height,
            monitor_index,
        )
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn monitor_index(&self) -> usize {
        self.monitor_index
    }

    pub fn marker(&self) -> Option<Marker> {
        self.marker
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Shift the top-left corner. The result is deliberately not clamped to
    /// the monitor, so a rectangle can be pushed partly or fully off-screen.
    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.x = self.x.saturating_add(dx);
        self.y = self.y.saturating_add(dy);
    }

    /// Grow or shrink, never below the minimum size.
    pub fn resize_by(&mut self, dw: i32, dh: i32) {
        self.width = self.width.saturating_add(dw).max(MIN_WIDTH);
        self.height = self.height.saturating_add(dh).max(MIN_HEIGHT);
    }

    /// Set or clear the marker. Returns true when the value changed.
    pub fn set_marker(&mut self, marker: Option<Marker>) -> bool {
        if self.marker == marker {
            return false;
        }
        self.marker = marker;
        true
    }

    /// Reassign the monitor. Geometry is left as is.
    pub fn retarget(&mut self, monitor_index: usize) {
        self.monitor_index = monitor_index;
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Pull the top-left corner into `[0, monitor - size]` on both axes.
    /// A rectangle larger than the monitor is pinned to the origin.
    pub fn clamp_into(&mut self, monitor: &MonitorRect) {
        self.x = self.x.min(monitor.width - self.width).max(0);
        self.y = self.y.min(monitor.height - self.height).max(0);
    }

    /// Inclusive containment of a monitor-relative point.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        let (px, py) = (i64::from(px), i64::from(py));
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        px >= x
            && px <= x + i64::from(self.width)
            && py >= y
            && py <= y + i64::from(self.height)
    }

    /// The persisted view of this rectangle
    pub fn record(&self) -> RectRecord {
        RectRecord {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            screen: i32::try_from(self.monitor_index).unwrap_or(i32::MAX),
        }
    }

    pub fn render_state(&self) -> RenderState {
        RenderState {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            color: self.color,
            marker: self.marker,
            focused: self.focused,
        }
    }
}
