// constants.rs - Application-wide Constants
//
// Centralized constants for colors, dimensions, edit steps and timing.

use std::time::Duration;

use crate::rect::Rgb;

/// Outline and marker colors
pub mod colors {
    use super::Rgb;

    /// Source rectangle outline (plain white, matches the first overlay ever drawn)
    pub const SOURCE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    /// Destination rectangle outline (bright blue)
    pub const DESTINATION: Rgb = Rgb::new(0x00, 0xA8, 0xFF);
    /// Cursor marker projected into the destination
    pub const MARKER: Rgb = Rgb::new(0xFF, 0x44, 0x44);
    /// Focus tab drawn on the rectangle being edited
    pub const FOCUS: Rgb = Rgb::new(0xFF, 0xCC, 0x00);
}

/// Rectangle geometry limits and defaults
pub mod rect {
    /// Width never shrinks below this
    pub const MIN_WIDTH: i32 = 10;
    /// Height never shrinks below this
    pub const MIN_HEIGHT: i32 = 5;
    /// Width used when nothing is persisted
    pub const DEFAULT_WIDTH: i32 = 100;
    /// Height used when nothing is persisted
    pub const DEFAULT_HEIGHT: i32 = 50;
}

/// Keyboard edit steps in pixels
pub mod step {
    /// Distance moved per key press
    pub const MOVE: i32 = 10;
    /// Width change per resize key press
    pub const WIDTH: i32 = 10;
    /// Height change per resize key press
    pub const HEIGHT: i32 = 5;
}

/// Overlay drawing dimensions
pub mod overlay {
    /// Outline thickness in pixels
    pub const OUTLINE_WIDTH: i32 = 2;
    /// Marker radius in pixels
    pub const MARKER_RADIUS: f32 = 4.0;
    /// Edge length of the triangular focus tab
    pub const FOCUS_TAB: f32 = 12.0;
}

/// Persisted sections, in focus order
pub mod sections {
    /// The rectangle whose area is watched for the cursor
    pub const SOURCE: &str = "rectA";
    /// The rectangle the cursor position is mirrored into
    pub const DESTINATION: &str = "rectB";
}

/// Slot of the mirrored source rectangle
pub const SOURCE_SLOT: usize = 0;
/// Slot of the rectangle receiving the marker
pub const DESTINATION_SLOT: usize = 1;

/// Cursor poll interval (about 33 Hz)
pub const POLL_INTERVAL: Duration = Duration::from_millis(30);

/// How long the keyboard thread waits for a key before checking for shutdown
pub const KEY_POLL_TIMEOUT: Duration = Duration::from_millis(100);
