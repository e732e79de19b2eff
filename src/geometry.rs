//! Monitor directory and cursor resolution.
//!
//! Monitors are described in global desktop coordinates (the primary monitor's
//! top-left is usually the origin, others may sit at negative offsets). Each
//! enumeration assigns dense indices `0..N-1` in enumeration order.

use log::warn;

/// Bounds of one monitor in global desktop coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl MonitorRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Half-open containment: the right and bottom edges belong to the neighbour.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && px < self.x + self.width
            && py >= self.y
            && py < self.y + self.height
    }
}

/// A monitor with its session-stable index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    pub index: usize,
    pub bounds: MonitorRect,
}

/// One cursor reading, resolved against the monitor layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorSample {
    /// Position in global desktop coordinates
    pub global: (i32, i32),
    /// Monitor under the cursor, `None` while the point lies outside every monitor
    pub monitor: Option<usize>,
    /// Position relative to the resolved monitor's origin (equals `global` when unresolved)
    pub local: (i32, i32),
}

impl CursorSample {
    /// A sample that lies on no known monitor
    pub fn unresolved(global: (i32, i32)) -> Self {
        Self {
            global,
            monitor: None,
            local: global,
        }
    }
}

/// Snapshot of the monitor layout taken at one enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorDirectory {
    monitors: Vec<Monitor>,
}

impl MonitorDirectory {
    /// Build a directory from bounds in enumeration order.
    pub fn from_bounds<I>(bounds: I) -> Self
    where
        I: IntoIterator<Item = MonitorRect>,
    {
        let monitors = bounds
            .into_iter()
            .enumerate()
            .map(|(index, bounds)| Monitor { index, bounds })
            .collect();
        Self { monitors }
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Monitor> {
        self.monitors.get(index)
    }

    /// Return `index` when it names an enumerated monitor, `fallback` otherwise.
    ///
    /// Takes a signed index because persisted values are not trusted.
    pub fn validate_monitor_index(&self, index: i32, fallback: usize) -> usize {
        match usize::try_from(index) {
            Ok(idx) if idx < self.monitors.len() => idx,
            _ => {
                warn!(
                    "Monitor {} unavailable ({} enumerated), falling back to monitor {}",
                    index,
                    self.monitors.len(),
                    fallback
                );
                fallback
            }
        }
    }

    /// Resolve a global cursor point to a monitor and monitor-relative coordinates.
    pub fn resolve_cursor(&self, global: (i32, i32)) -> CursorSample {
        match self
            .monitors
            .iter()
            .find(|m| m.bounds.contains(global.0, global.1))
        {
            Some(monitor) => CursorSample {
                global,
                monitor: Some(monitor.index),
                local: (global.0 - monitor.bounds.x, global.1 - monitor.bounds.y),
            },
            None => CursorSample::unresolved(global),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dual_layout() -> MonitorDirectory {
        MonitorDirectory::from_bounds([
            MonitorRect::new(0, 0, 2560, 1440),
            MonitorRect::new(-1920, 0, 1920, 1080),
        ])
    }

    #[test]
    fn indices_are_dense_in_enumeration_order() {
        let dir = dual_layout();
        let indices: Vec<usize> = dir.monitors().iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(dir.get(1).map(|m| m.bounds.x), Some(-1920));
        assert!(dir.get(2).is_none());
    }

    #[test]
    fn cursor_resolves_to_monitor_relative_coordinates() {
        let dir = dual_layout();

        let left = dir.resolve_cursor((-10, 100));
        assert_eq!(left.monitor, Some(1));
        assert_eq!(left.local, (1910, 100));

        let right = dir.resolve_cursor((200, 300));
        assert_eq!(right.monitor, Some(0));
        assert_eq!(right.local, (200, 300));
    }

    #[test]
    fn cursor_outside_every_monitor_is_unresolved() {
        let dir = dual_layout();
        // Below the shorter left monitor, a gap in the layout
        let sample = dir.resolve_cursor((-100, 1200));
        assert_eq!(sample.monitor, None);
        assert_eq!(sample.local, (-100, 1200));

        assert_eq!(MonitorDirectory::default().resolve_cursor((0, 0)).monitor, None);
    }

    #[test]
    fn monitor_edges_are_half_open() {
        let dir = dual_layout();
        assert_eq!(dir.resolve_cursor((2559, 1439)).monitor, Some(0));
        assert_eq!(dir.resolve_cursor((2560, 10)).monitor, None);
        assert_eq!(dir.resolve_cursor((0, 10)).monitor, Some(0));
        assert_eq!(dir.resolve_cursor((-1, 10)).monitor, Some(1));
    }

    #[test]
    fn invalid_indices_fall_back() {
        let dir = dual_layout();
        assert_eq!(dir.validate_monitor_index(1, 0), 1);
        assert_eq!(dir.validate_monitor_index(2, 0), 0);
        assert_eq!(dir.validate_monitor_index(-1, 0), 0);
        assert_eq!(dir.validate_monitor_index(7, 1), 1);
    }
}
