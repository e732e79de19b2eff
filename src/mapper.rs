//! Cursor projection from a source rectangle into a destination rectangle.

use crate::geometry::CursorSample;
use crate::rect::{Marker, OverlayRect};

/// Project the cursor from `source` into `dest`.
///
/// Returns `None` when the cursor is on no monitor, on a monitor other than
/// the source's, or outside the source rectangle. Containment is inclusive
/// on all four edges, so the far edges map to the destination's far edges.
pub fn map_cursor(source: &OverlayRect, dest: &OverlayRect, cursor: &CursorSample) -> Option<Marker> {
    if cursor.monitor != Some(source.monitor_index()) {
        return None;
    }

    let (mx, my) = cursor.local;
    if !source.contains(mx, my) {
        return None;
    }

    // Width and height are at least the rectangle minimum, never zero
    let rel_x = f64::from(mx - source.x()) / f64::from(source.width());
    let rel_y = f64::from(my - source.y()) / f64::from(source.height());

    Some(Marker::new(
        (f64::from(dest.x()) + rel_x * f64::from(dest.width())) as f32,
        (f64::from(dest.y()) + rel_y * f64::from(dest.height())) as f32,
    ))
}
