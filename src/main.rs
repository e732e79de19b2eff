// main.rs - overlay-mirror Application Entry Point
//
// Orchestrates:
// 1. Overlay windows, one per rectangle, owned by the event loop thread
// 2. The keyboard thread, which posts edit requests through the event loop proxy
// 3. The cursor poll tick, which mirrors the cursor from the source rectangle
//    into the destination rectangle
//
// Usage: overlay-mirror [GEOMETRY_FILE]

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use anyhow::Result;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::WindowId,
};

mod keyboard;
mod renderer;
mod window_manager;

use overlay_mirror::constants::{colors, sections, DESTINATION_SLOT, POLL_INTERVAL};
use overlay_mirror::{
    platform, ConfigStore, EditRequest, InputMachine, MonitorDirectory, OverlayManager,
    RectSpec, RetargetRequest,
};
use window_manager::{enumerate_monitors, OverlayWindow, WindowFactory};

struct OverlayMirrorApp {
    store: ConfigStore,
    specs: Vec<RectSpec>,
    monitors: MonitorDirectory,
    /// Shared with the keyboard thread for digit validation
    monitor_count: Arc<AtomicUsize>,
    manager: Option<OverlayManager<OverlayWindow>>,
    proxy: EventLoopProxy<EditRequest>,
    keyboard: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    next_tick: Instant,
}

impl OverlayMirrorApp {
    fn new(store: ConfigStore, proxy: EventLoopProxy<EditRequest>) -> Self {
        Self {
            store,
            specs: vec![
                RectSpec::new(sections::SOURCE, colors::SOURCE),
                RectSpec::new(sections::DESTINATION, colors::DESTINATION),
            ],
            monitors: MonitorDirectory::default(),
            monitor_count: Arc::new(AtomicUsize::new(0)),
            manager: None,
            proxy,
            keyboard: None,
            running: Arc::new(AtomicBool::new(true)),
            next_tick: Instant::now(),
        }
    }

    fn refresh_monitors(&mut self, event_loop: &ActiveEventLoop) {
        self.monitors = enumerate_monitors(event_loop);
        self.monitor_count
            .store(self.monitors.len(), Ordering::Release);
    }

    fn find_slot(&self, window_id: WindowId) -> Option<usize> {
        let manager = self.manager.as_ref()?;
        (0..manager.len()).find(|&i| {
            manager
                .surface(i)
                .is_some_and(|surface| surface.window_id() == window_id)
        })
    }

    /// Sample the cursor and mirror it into the destination rectangle
    fn tick(&mut self) {
        let Some(manager) = self.manager.as_mut() else {
            return;
        };
        match platform::cursor_position() {
            Some(global) => manager.apply_cursor(&self.monitors.resolve_cursor(global)),
            None => manager.set_marker(DESTINATION_SLOT, None),
        }
    }

    fn retarget(&mut self, event_loop: &ActiveEventLoop, request: RetargetRequest) {
        // Monitors may have been plugged or unplugged since startup
        self.refresh_monitors(event_loop);
        let Some(manager) = self.manager.as_mut() else {
            return;
        };

        manager.persist_as(request.index, request.monitor);
        let mut factory = WindowFactory::new(event_loop);
        if let Err(e) = manager.retarget(request.index, request.monitor, &self.monitors, &mut factory) {
            error!("Retarget failed: {:#}", e);
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.running.store(false, Ordering::Release);
        if let Some(manager) = self.manager.as_mut() {
            manager.close_all();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler<EditRequest> for OverlayMirrorApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.manager.is_some() {
            return;
        }

        self.refresh_monitors(event_loop);
        let mut factory = WindowFactory::new(event_loop);
        let mut manager =
            match OverlayManager::open(&self.specs, self.store.clone(), &self.monitors, &mut factory) {
                Ok(manager) => manager,
                Err(e) => {
                    error!("Failed to open overlays: {:#}", e);
                    event_loop.exit();
                    return;
                }
            };
        manager.set_focus(Some(0));
        self.manager = Some(manager);

        let machine = InputMachine::new(self.specs.len(), Arc::clone(&self.monitor_count));
        match keyboard::spawn(machine, self.proxy.clone(), Arc::clone(&self.running)) {
            Ok(handle) => self.keyboard = Some(handle),
            Err(e) => warn!("Keyboard thread failed to start: {}", e),
        }

        if !platform::cursor_query_supported() {
            warn!("Cursor position is not available on this platform; the destination marker will not be shown");
        }

        self.next_tick = Instant::now();
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, request: EditRequest) {
        match request {
            EditRequest::Move { index, dx, dy } => {
                if let Some(manager) = self.manager.as_mut() {
                    manager.move_rect(index, dx, dy);
                }
            }
            EditRequest::Resize { index, dw, dh } => {
                if let Some(manager) = self.manager.as_mut() {
                    manager.resize_rect(index, dw, dh);
                }
            }
            EditRequest::Focus(focus) => {
                if let Some(manager) = self.manager.as_mut() {
                    manager.set_focus(focus);
                }
            }
            EditRequest::Retarget(retarget) => self.retarget(event_loop, retarget),
            EditRequest::Shutdown => {
                info!("Interrupt received");
                self.shutdown(event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::RedrawRequested => {
                if let (Some(index), Some(manager)) = (self.find_slot(window_id), self.manager.as_mut()) {
                    manager.repaint(index);
                }
            }
            WindowEvent::Resized(size) => {
                if let (Some(index), Some(manager)) = (self.find_slot(window_id), self.manager.as_mut()) {
                    if let Some(surface) = manager.surface_mut(index) {
                        surface.resize(size.width, size.height);
                    }
                    manager.repaint(index);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_tick {
            self.tick();
            self.next_tick = now + POLL_INTERVAL;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.running.store(false, Ordering::Release);
        if let Some(manager) = self.manager.as_mut() {
            manager.close_all();
        }
        if let Some(handle) = self.keyboard.take() {
            if handle.join().is_err() {
                warn!("Keyboard thread panicked");
            }
        }
    }
}

fn main() -> Result<()> {
    // Carriage return: the keyboard thread keeps the terminal in raw mode
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5} {}] {}\r",
                buf.timestamp(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    info!("overlay-mirror starting...");

    let store = ConfigStore::resolve(std::env::args_os().nth(1).map(PathBuf::from))?;
    info!("Geometry file: {}", store.path().display());

    let event_loop = EventLoop::<EditRequest>::with_user_event().build()?;
    let mut app = OverlayMirrorApp::new(store, event_loop.create_proxy());
    event_loop.run_app(&mut app)?;

    info!("overlay-mirror shut down");
    Ok(())
}
