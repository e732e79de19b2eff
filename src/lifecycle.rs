//! Overlay lifecycle: the live rectangles and the surfaces drawing them.
//!
//! [`OverlayManager`] is the single owner of every [`OverlayRect`] and of the
//! native surface bound to it. All of its methods must run on the thread that
//! owns the surfaces (the event loop thread); other threads post requests
//! instead of calling in.
//!
//! Slots are addressed by their position, which doubles as the focus index.
//! A retarget replaces the contents of a slot, so callers re-fetch through
//! the manager rather than holding on to a rectangle.

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};

use crate::config::{ConfigError, ConfigStore, RectRecord};
use crate::constants::{DESTINATION_SLOT, SOURCE_SLOT};
use crate::geometry::{CursorSample, Monitor, MonitorDirectory};
use crate::mapper::map_cursor;
use crate::rect::{Marker, OverlayRect, RenderState, Rgb};

/// A drawable, monitor-sized overlay
pub trait OverlaySurface {
    /// Draw the given state. Called only when the state changed or a repaint
    /// was requested.
    ///
    /// `Ok(false)` means no frame reached the screen (e.g. the swapchain had to
    /// be rebuilt); the surface is expected to ask for a repaint itself.
    fn present(&mut self, state: &RenderState) -> Result<bool>;
}

/// Creates surfaces. Dropping a surface releases it.
pub trait SurfaceFactory {
    type Surface: OverlaySurface;

    fn create(&mut self, monitor: &Monitor, rect: &OverlayRect) -> Result<Self::Surface>;
}

/// Identity of a managed rectangle, fixed for the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RectSpec {
    pub section: String,
    pub color: Rgb,
}

impl RectSpec {
    pub fn new(section: impl Into<String>, color: Rgb) -> Self {
        Self {
            section: section.into(),
            color,
        }
    }
}

struct Slot<S> {
    rect: OverlayRect,
    /// `None` only while a surface could not be (re)created
    surface: Option<S>,
    /// Last state shown by the surface, for change detection
    presented: Option<RenderState>,
    /// The last save of this slot failed; the store may be stale
    unsaved: bool,
}

/// Owner of the live rectangles and their surfaces
pub struct OverlayManager<S> {
    slots: Vec<Slot<S>>,
    store: ConfigStore,
}

impl<S: OverlaySurface> OverlayManager<S> {
    /// Load every rectangle from the store, bind it to its persisted monitor
    /// (or monitor 0) and open its surface.
    pub fn open<F>(
        specs: &[RectSpec],
        store: ConfigStore,
        monitors: &MonitorDirectory,
        factory: &mut F,
    ) -> Result<Self>
    where
        F: SurfaceFactory<Surface = S>,
    {
        if monitors.is_empty() {
            return Err(anyhow!("no monitors available"));
        }

        let mut manager = Self {
            slots: Vec::with_capacity(specs.len()),
            store,
        };

        for spec in specs {
            let record = manager.store.load(&spec.section);
            let monitor_index = monitors.validate_monitor_index(record.screen, 0);
            let (rect, monitor) = Self::bind_rect(spec, &record, monitors, monitor_index)?;
            let surface = factory.create(monitor, &rect)?;
            info!(
                "Opened [{}] on monitor {} at ({}, {}) {}x{}",
                rect.section(),
                monitor_index,
                rect.x(),
                rect.y(),
                rect.width(),
                rect.height()
            );
            // Only write back what binding changed (monitor fallback, clamping)
            let changed = rect.record() != record;
            manager.slots.push(Slot {
                rect,
                surface: Some(surface),
                presented: None,
                unsaved: false,
            });
            let index = manager.slots.len() - 1;
            if changed {
                manager.persist(index);
            }
            manager.present(index, true);
        }

        Ok(manager)
    }

    /// Fresh rectangle for `spec` with `record`'s geometry, clamped into `monitor_index`.
    fn bind_rect<'m>(
        spec: &RectSpec,
        record: &RectRecord,
        monitors: &'m MonitorDirectory,
        monitor_index: usize,
    ) -> Result<(OverlayRect, &'m Monitor)> {
        let monitor = monitors
            .get(monitor_index)
            .ok_or_else(|| anyhow!("monitor {} not enumerated", monitor_index))?;
        let mut rect = OverlayRect::from_record(spec.section.clone(), spec.color, record, monitor_index);
        rect.clamp_into(&monitor.bounds);
        Ok((rect, monitor))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn rect(&self, index: usize) -> Option<&OverlayRect> {
        self.slots.get(index).map(|slot| &slot.rect)
    }

    pub fn surface(&self, index: usize) -> Option<&S> {
        self.slots.get(index).and_then(|slot| slot.surface.as_ref())
    }

    pub fn surface_mut(&mut self, index: usize) -> Option<&mut S> {
        self.slots.get_mut(index).and_then(|slot| slot.surface.as_mut())
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Move a rectangle, redraw it and persist it.
    pub fn move_rect(&mut self, index: usize, dx: i32, dy: i32) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            warn!("Move ignored, no rectangle at slot {}", index);
            return false;
        };
        slot.rect.move_by(dx, dy);
        debug!("[{}] moved to ({}, {})", slot.rect.section(), slot.rect.x(), slot.rect.y());
        self.present(index, false);
        self.persist(index);
        true
    }

    /// Resize a rectangle (clamped to the minimum), redraw it and persist it.
    pub fn resize_rect(&mut self, index: usize, dw: i32, dh: i32) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            warn!("Resize ignored, no rectangle at slot {}", index);
            return false;
        };
        slot.rect.resize_by(dw, dh);
        debug!(
            "[{}] resized to {}x{}",
            slot.rect.section(),
            slot.rect.width(),
            slot.rect.height()
        );
        self.present(index, false);
        self.persist(index);
        true
    }

    /// Set or clear a marker. Markers are never persisted.
    pub fn set_marker(&mut self, index: usize, marker: Option<Marker>) {
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.rect.set_marker(marker) {
                self.present(index, false);
            }
        }
    }

    /// Mark one slot (or none) as the focused one.
    pub fn set_focus(&mut self, focus: Option<usize>) {
        for index in 0..self.slots.len() {
            let focused = focus == Some(index);
            if self.slots[index].rect.is_focused() != focused {
                self.slots[index].rect.set_focused(focused);
                self.present(index, false);
            }
        }
    }

    /// Project the cursor from the source slot into the destination slot.
    pub fn apply_cursor(&mut self, cursor: &CursorSample) {
        let marker = match (self.rect(SOURCE_SLOT), self.rect(DESTINATION_SLOT)) {
            (Some(source), Some(dest)) => map_cursor(source, dest, cursor),
            _ => return,
        };
        self.set_marker(DESTINATION_SLOT, marker);
    }

    /// Persist a slot's current geometry under another monitor, ahead of a retarget.
    pub fn persist_as(&mut self, index: usize, monitor_index: usize) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        let mut record = slot.rect.record();
        record.screen = i32::try_from(monitor_index).unwrap_or(i32::MAX);
        slot.unsaved = Self::save(&self.store, &slot.rect, &record).is_err();
    }

    /// Move a slot to another monitor by tearing its surface down and
    /// building a new one.
    ///
    /// The monitor is validated first (falling back to 0). The replacement
    /// rectangle keeps the section and color, takes its geometry from the
    /// store and is clamped into the new monitor. When the store cannot be
    /// read, or the slot's last save failed, the current geometry is used. If the new surface cannot be
    /// created the slot keeps the new rectangle without a surface and the
    /// error is returned.
    pub fn retarget<F>(
        &mut self,
        index: usize,
        monitor_index: usize,
        monitors: &MonitorDirectory,
        factory: &mut F,
    ) -> Result<()>
    where
        F: SurfaceFactory<Surface = S>,
    {
        if index >= self.slots.len() {
            return Err(anyhow!("no rectangle at slot {}", index));
        }
        if monitors.is_empty() {
            return Err(anyhow!("no monitors available"));
        }
        let requested = i32::try_from(monitor_index).unwrap_or(i32::MAX);
        let monitor_index = monitors.validate_monitor_index(requested, 0);

        let spec = RectSpec::new(self.slots[index].rect.section(), self.slots[index].rect.color());
        let focused = self.slots[index].rect.is_focused();
        let marker = self.slots[index].rect.marker();
        let mut current = self.slots[index].rect.record();
        current.screen = i32::try_from(monitor_index).unwrap_or(i32::MAX);

        // The in-memory geometry wins whenever the store cannot provide it
        let record = match self.store.try_load(&spec.section) {
            Ok(Some(record)) if !self.slots[index].unsaved => record,
            Ok(_) => current,
            Err(e) => {
                warn!(
                    "Could not reload [{}]: {}; keeping current geometry",
                    spec.section, e
                );
                current
            }
        };

        // Release the old surface before the new one exists
        let slot = &mut self.slots[index];
        slot.surface = None;
        slot.presented = None;
        info!("Released surface for [{}]", spec.section);

        let (mut rect, monitor) = Self::bind_rect(&spec, &record, monitors, monitor_index)?;
        rect.set_focused(focused);
        rect.set_marker(marker);

        let created = factory.create(monitor, &rect);
        self.slots[index].rect = rect;
        self.persist(index);

        match created {
            Ok(surface) => {
                self.slots[index].surface = Some(surface);
                info!(
                    "Retargeted [{}] to monitor {} at ({}, {})",
                    spec.section,
                    monitor_index,
                    self.slots[index].rect.x(),
                    self.slots[index].rect.y()
                );
                self.present(index, true);
                Ok(())
            }
            Err(e) => Err(e.context(format!(
                "failed to recreate surface for [{}] on monitor {}",
                spec.section, monitor_index
            ))),
        }
    }

    /// Redraw a slot even if nothing changed (e.g. after the window was exposed).
    pub fn repaint(&mut self, index: usize) {
        self.present(index, true);
    }

    /// Release every surface. Rectangles stay readable.
    pub fn close_all(&mut self) {
        for slot in &mut self.slots {
            if slot.surface.take().is_some() {
                info!("Closed surface for [{}]", slot.rect.section());
            }
            slot.presented = None;
        }
    }

    fn present(&mut self, index: usize, force: bool) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        let state = slot.rect.render_state();
        if !force && slot.presented.as_ref() == Some(&state) {
            return;
        }
        let Some(surface) = slot.surface.as_mut() else {
            return;
        };
        match surface.present(&state) {
            Ok(true) => slot.presented = Some(state),
            Ok(false) => {
                debug!("[{}] frame skipped, waiting for a repaint", slot.rect.section());
                slot.presented = None;
            }
            Err(e) => {
                error!("Failed to draw [{}]: {:#}", slot.rect.section(), e);
                slot.presented = None;
            }
        }
    }

    fn persist(&mut self, index: usize) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        slot.unsaved = Self::save(&self.store, &slot.rect, &slot.rect.record()).is_err();
    }

    fn save(store: &ConfigStore, rect: &OverlayRect, record: &RectRecord) -> Result<(), ConfigError> {
        store.save(rect.section(), record).inspect_err(|e| {
            error!("Failed to save [{}]: {}", rect.section(), e);
        })
    }
}
