use std::cell::{Cell, RefCell};
use std::fs;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use overlay_mirror::constants::{colors, sections, DESTINATION_SLOT, SOURCE_SLOT};
use overlay_mirror::{
    ConfigStore, Marker, Monitor, MonitorDirectory, MonitorRect, OverlayManager, OverlayRect,
    OverlaySurface, RectSpec, RenderState, SurfaceFactory,
};
use tempfile::{tempdir, TempDir};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Created { section: String, monitor: usize },
    Presented { section: String, state: RenderState },
    Dropped { section: String },
}

type Log = Rc<RefCell<Vec<Event>>>;

struct FakeSurface {
    section: String,
    log: Log,
    /// Frames still to drop, shared with the factory
    skip: Rc<Cell<usize>>,
}

impl OverlaySurface for FakeSurface {
    fn present(&mut self, state: &RenderState) -> Result<bool> {
        if self.skip.get() > 0 {
            self.skip.set(self.skip.get() - 1);
            return Ok(false);
        }
        self.log.borrow_mut().push(Event::Presented {
            section: self.section.clone(),
            state: state.clone(),
        });
        Ok(true)
    }
}

impl Drop for FakeSurface {
    fn drop(&mut self) {
        self.log.borrow_mut().push(Event::Dropped {
            section: self.section.clone(),
        });
    }
}

#[derive(Default)]
struct FakeFactory {
    log: Log,
    /// Monitor on which surface creation fails
    fail_on: Option<usize>,
    skip: Rc<Cell<usize>>,
}

impl SurfaceFactory for FakeFactory {
    type Surface = FakeSurface;

    fn create(&mut self, monitor: &Monitor, rect: &OverlayRect) -> Result<FakeSurface> {
        if self.fail_on == Some(monitor.index) {
            return Err(anyhow!("display {} refused the window", monitor.index));
        }
        self.log.borrow_mut().push(Event::Created {
            section: rect.section().to_string(),
            monitor: monitor.index,
        });
        Ok(FakeSurface {
            section: rect.section().to_string(),
            log: Rc::clone(&self.log),
            skip: Rc::clone(&self.skip),
        })
    }
}

impl FakeFactory {
    fn take(&self) -> Vec<Event> {
        self.log.borrow_mut().drain(..).collect()
    }

    fn lifecycle(&self) -> Vec<Event> {
        self.take()
            .into_iter()
            .filter(|e| !matches!(e, Event::Presented { .. }))
            .collect()
    }
}

fn monitors() -> MonitorDirectory {
    MonitorDirectory::from_bounds([
        MonitorRect::new(0, 0, 1920, 1080),
        MonitorRect::new(1920, 0, 1280, 1024),
    ])
}

fn specs() -> Vec<RectSpec> {
    vec![
        RectSpec::new(sections::SOURCE, colors::SOURCE),
        RectSpec::new(sections::DESTINATION, colors::DESTINATION),
    ]
}

/// Source 200x100 at (100, 100) on monitor 0, destination 500x250 at (400, 300) on monitor 1
fn store_with_layout() -> (TempDir, ConfigStore) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("overlays.toml");
    fs::write(
        &path,
        "[rectA]\nx = 100\ny = 100\nwidth = 200\nheight = 100\nscreen = 0\n\n\
         [rectB]\nx = 400\ny = 300\nwidth = 500\nheight = 250\nscreen = 1\n",
    )
    .unwrap();
    (dir, ConfigStore::new(path))
}

fn open(store: ConfigStore, factory: &mut FakeFactory) -> OverlayManager<FakeSurface> {
    OverlayManager::open(&specs(), store, &monitors(), factory).unwrap()
}

#[test]
fn open_binds_each_rectangle_to_its_saved_monitor() {
    let (_dir, store) = store_with_layout();
    let mut factory = FakeFactory::default();
    let manager = open(store, &mut factory);

    assert_eq!(manager.len(), 2);
    assert_eq!(manager.rect(SOURCE_SLOT).unwrap().monitor_index(), 0);
    assert_eq!(manager.rect(DESTINATION_SLOT).unwrap().monitor_index(), 1);
    assert!(manager.surface(SOURCE_SLOT).is_some());
    assert!(manager.surface(DESTINATION_SLOT).is_some());

    let events = factory.take();
    assert_eq!(
        events[0],
        Event::Created {
            section: "rectA".into(),
            monitor: 0
        }
    );
    assert!(events.contains(&Event::Created {
        section: "rectB".into(),
        monitor: 1
    }));
}

#[test]
fn open_without_monitors_fails() {
    let (_dir, store) = store_with_layout();
    let mut factory = FakeFactory::default();
    let result = OverlayManager::open(&specs(), store, &MonitorDirectory::default(), &mut factory);
    assert!(result.is_err());
}

#[test]
fn unknown_saved_monitor_falls_back_to_the_first() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("overlays.toml");
    fs::write(&path, "[rectA]\nx = 10\ny = 10\nscreen = 5\n").unwrap();
    let store = ConfigStore::new(&path);

    let mut factory = FakeFactory::default();
    let manager = open(store.clone(), &mut factory);

    assert_eq!(manager.rect(SOURCE_SLOT).unwrap().monitor_index(), 0);
    assert_eq!(store.load("rectA").screen, 0);
}

#[test]
fn cursor_in_source_places_the_destination_marker() {
    let (_dir, store) = store_with_layout();
    let mut factory = FakeFactory::default();
    let mut manager = open(store, &mut factory);

    // Three quarters across, one quarter down the source
    let sample = monitors().resolve_cursor((250, 125));
    manager.apply_cursor(&sample);

    assert_eq!(
        manager.rect(DESTINATION_SLOT).unwrap().marker(),
        Some(Marker::new(775.0, 362.5))
    );
    assert_eq!(manager.rect(SOURCE_SLOT).unwrap().marker(), None);
}

#[test]
fn cursor_leaving_the_source_clears_the_marker() {
    let (_dir, store) = store_with_layout();
    let mut factory = FakeFactory::default();
    let mut manager = open(store, &mut factory);
    let directory = monitors();

    manager.apply_cursor(&directory.resolve_cursor((200, 150)));
    assert!(manager.rect(DESTINATION_SLOT).unwrap().marker().is_some());

    // Same local coordinates, but on the destination's monitor
    manager.apply_cursor(&directory.resolve_cursor((1920 + 200, 150)));
    assert_eq!(manager.rect(DESTINATION_SLOT).unwrap().marker(), None);

    manager.apply_cursor(&directory.resolve_cursor((200, 150)));
    manager.apply_cursor(&directory.resolve_cursor((-50, -50)));
    assert_eq!(manager.rect(DESTINATION_SLOT).unwrap().marker(), None);
}

#[test]
fn unchanged_state_is_not_redrawn() {
    let (_dir, store) = store_with_layout();
    let mut factory = FakeFactory::default();
    let mut manager = open(store, &mut factory);
    factory.take();

    let sample = monitors().resolve_cursor((200, 150));
    manager.apply_cursor(&sample);
    manager.apply_cursor(&sample);
    manager.move_rect(SOURCE_SLOT, 0, 0);

    let presented = factory
        .take()
        .into_iter()
        .filter(|e| matches!(e, Event::Presented { .. }))
        .count();
    assert_eq!(presented, 1);

    manager.repaint(SOURCE_SLOT);
    assert_eq!(factory.take().len(), 1);
}

#[test]
fn edits_are_drawn_and_persisted() {
    let (_dir, store) = store_with_layout();
    let mut factory = FakeFactory::default();
    let mut manager = open(store.clone(), &mut factory);
    factory.take();

    assert!(manager.move_rect(SOURCE_SLOT, -10, 0));
    assert!(manager.resize_rect(SOURCE_SLOT, 10, 5));

    let rect = manager.rect(SOURCE_SLOT).unwrap();
    assert_eq!((rect.x(), rect.y(), rect.width(), rect.height()), (90, 100, 210, 105));
    let saved = store.load("rectA");
    assert_eq!((saved.x, saved.y, saved.width, saved.height, saved.screen), (90, 100, 210, 105, 0));

    match factory.take().last() {
        Some(Event::Presented { section, state }) => {
            assert_eq!(section, "rectA");
            assert_eq!(state.width, 210);
        }
        other => panic!("expected a redraw, got {:?}", other),
    }

    assert!(!manager.move_rect(7, 10, 10));
}

#[test]
fn retarget_releases_before_recreating() {
    let (_dir, store) = store_with_layout();
    let mut factory = FakeFactory::default();
    let mut manager = open(store.clone(), &mut factory);
    manager.set_focus(Some(SOURCE_SLOT));
    factory.take();

    manager.persist_as(SOURCE_SLOT, 1);
    manager.retarget(SOURCE_SLOT, 1, &monitors(), &mut factory).unwrap();

    assert_eq!(
        factory.lifecycle(),
        vec![
            Event::Dropped {
                section: "rectA".into()
            },
            Event::Created {
                section: "rectA".into(),
                monitor: 1
            },
        ]
    );

    let rect = manager.rect(SOURCE_SLOT).unwrap();
    assert_eq!(rect.section(), "rectA");
    assert_eq!(rect.color(), colors::SOURCE);
    assert_eq!(rect.monitor_index(), 1);
    assert!(rect.is_focused());
    assert!(manager.surface(SOURCE_SLOT).is_some());
    assert_eq!(store.load("rectA").screen, 1);
}

#[test]
fn retarget_to_missing_monitor_falls_back_to_the_first() {
    let (_dir, store) = store_with_layout();
    let mut factory = FakeFactory::default();
    let mut manager = open(store.clone(), &mut factory);
    factory.take();

    manager
        .retarget(DESTINATION_SLOT, 7, &monitors(), &mut factory)
        .unwrap();

    let rect = manager.rect(DESTINATION_SLOT).unwrap();
    assert_eq!(rect.monitor_index(), 0);
    assert_eq!(rect.color(), colors::DESTINATION);
    assert_eq!(store.load("rectB").screen, 0);
}

#[test]
fn retarget_clamps_into_a_smaller_monitor() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("overlays.toml");
    fs::write(
        &path,
        "[rectA]\nx = 1800\ny = 1000\nwidth = 200\nheight = 100\nscreen = 0\n",
    )
    .unwrap();
    let store = ConfigStore::new(&path);

    let mut factory = FakeFactory::default();
    let mut manager = open(store.clone(), &mut factory);
    // Already clamped into the 1920x1080 monitor on open
    assert_eq!(manager.rect(SOURCE_SLOT).unwrap().x(), 1720);
    assert_eq!(manager.rect(SOURCE_SLOT).unwrap().y(), 980);

    manager.persist_as(SOURCE_SLOT, 1);
    manager.retarget(SOURCE_SLOT, 1, &monitors(), &mut factory).unwrap();

    let rect = manager.rect(SOURCE_SLOT).unwrap();
    assert_eq!((rect.x(), rect.y()), (1280 - 200, 1024 - 100));
    assert_eq!((rect.width(), rect.height()), (200, 100));
    let saved = store.load("rectA");
    assert_eq!((saved.x, saved.y, saved.screen), (1080, 924, 1));
}

#[test]
fn failed_recreate_leaves_the_slot_without_a_surface() {
    let (_dir, store) = store_with_layout();
    let mut factory = FakeFactory::default();
    let mut manager = open(store.clone(), &mut factory);
    factory.take();

    factory.fail_on = Some(1);
    let result = manager.retarget(SOURCE_SLOT, 1, &monitors(), &mut factory);

    assert!(result.is_err());
    assert!(manager.surface(SOURCE_SLOT).is_none());
    assert_eq!(manager.rect(SOURCE_SLOT).unwrap().monitor_index(), 1);
    assert_eq!(
        factory.lifecycle(),
        vec![Event::Dropped {
            section: "rectA".into()
        }]
    );

    // Edits still apply and persist without a surface
    assert!(manager.move_rect(SOURCE_SLOT, 10, 0));
    assert_eq!(store.load("rectA").x, 110);

    // A later retarget brings the surface back
    factory.fail_on = None;
    manager.retarget(SOURCE_SLOT, 0, &monitors(), &mut factory).unwrap();
    assert!(manager.surface(SOURCE_SLOT).is_some());
}

#[test]
fn close_all_releases_every_surface() {
    let (_dir, store) = store_with_layout();
    let mut factory = FakeFactory::default();
    let mut manager = open(store, &mut factory);
    factory.take();

    manager.close_all();

    assert_eq!(factory.lifecycle().len(), 2);
    assert!(manager.surface(SOURCE_SLOT).is_none());
    assert!(manager.surface(DESTINATION_SLOT).is_none());
    assert_eq!(manager.rect(SOURCE_SLOT).unwrap().section(), "rectA");
}

#[test]
fn open_leaves_an_unchanged_file_alone() {
    let (dir, store) = store_with_layout();
    let before = fs::read_to_string(store.path()).unwrap();
    let mut factory = FakeFactory::default();
    let _manager = open(store.clone(), &mut factory);
    assert_eq!(fs::read_to_string(store.path()).unwrap(), before);

    let fresh = ConfigStore::new(dir.path().join("fresh.toml"));
    let _manager = open(fresh.clone(), &mut factory);
    assert!(!fresh.path().exists());
}

#[test]
fn retarget_keeps_edits_when_the_file_is_unreadable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("overlays.toml");
    fs::write(&path, "this is [not toml").unwrap();
    let store = ConfigStore::new(&path);

    let mut factory = FakeFactory::default();
    let mut manager = open(store, &mut factory);
    manager.move_rect(SOURCE_SLOT, 500, 300);
    manager.resize_rect(SOURCE_SLOT, 100, 50);

    manager.persist_as(SOURCE_SLOT, 1);
    manager.retarget(SOURCE_SLOT, 1, &monitors(), &mut factory).unwrap();

    let rect = manager.rect(SOURCE_SLOT).unwrap();
    assert_eq!(
        (rect.x(), rect.y(), rect.width(), rect.height()),
        (500, 300, 200, 100)
    );
    assert_eq!(rect.monitor_index(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), "this is [not toml");
}

#[test]
fn skipped_frame_is_drawn_again_on_the_next_present() {
    let (_dir, store) = store_with_layout();
    let mut factory = FakeFactory::default();
    let mut manager = open(store, &mut factory);
    factory.take();

    factory.skip.set(1);
    manager.apply_cursor(&monitors().resolve_cursor((200, 150)));
    assert!(factory.take().is_empty());

    // Same state as the dropped frame, still drawn
    manager.move_rect(DESTINATION_SLOT, 0, 0);
    match factory.take().as_slice() {
        [Event::Presented { section, state }] => {
            assert_eq!(section, "rectB");
            assert!(state.marker.is_some());
        }
        other => panic!("expected one redraw, got {:?}", other),
    }
}
