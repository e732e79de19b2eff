// window_manager.rs - Overlay Window Management
//
// One overlay window per rectangle. Each window covers exactly the monitor
// its rectangle lives on, so rectangle coordinates are window coordinates.
//
// OVERLAY WINDOW REQUIREMENTS:
// - Transparent background
// - Frameless (no title bar, no borders)
// - Always on top
// - Click-through: mouse input reaches whatever is underneath
// - Kept out of the taskbar where the platform supports it

use anyhow::{Context, Result};
use log::{info, warn};
use std::sync::Arc;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event_loop::ActiveEventLoop,
    window::{Window, WindowAttributes, WindowId, WindowLevel},
};

use overlay_mirror::{
    Canvas, Monitor, MonitorDirectory, MonitorRect, OverlayRect, OverlaySurface, RenderState,
    SurfaceFactory,
};

use crate::renderer::Renderer;

/// Snapshot the current monitor layout in winit's enumeration order
pub fn enumerate_monitors(event_loop: &ActiveEventLoop) -> MonitorDirectory {
    let directory = MonitorDirectory::from_bounds(event_loop.available_monitors().map(|handle| {
        let position = handle.position();
        let size = handle.size();
        MonitorRect::new(
            position.x,
            position.y,
            i32::try_from(size.width).unwrap_or(i32::MAX),
            i32::try_from(size.height).unwrap_or(i32::MAX),
        )
    }));

    for monitor in directory.monitors() {
        let b = monitor.bounds;
        info!(
            "Monitor {}: {}x{} at ({}, {})",
            monitor.index, b.width, b.height, b.x, b.y
        );
    }
    directory
}

/// A monitor-sized transparent window drawing one rectangle
pub struct OverlayWindow {
    window: Arc<Window>,
    renderer: Renderer,
    canvas: Canvas,
}

impl OverlayWindow {
    /// Create and show an overlay covering `monitor`
    pub fn new(event_loop: &ActiveEventLoop, monitor: &Monitor, title: &str) -> Result<Self> {
        let bounds = monitor.bounds;
        info!("Creating overlay window on monitor {}", monitor.index);

        #[allow(unused_mut)]
        let mut attributes = WindowAttributes::default()
            .with_title(title)
            .with_position(PhysicalPosition::new(bounds.x, bounds.y))
            .with_inner_size(PhysicalSize::new(
                bounds.width.max(1) as u32,
                bounds.height.max(1) as u32,
            ))
            .with_resizable(false)
            .with_decorations(false) // No title bar
            .with_transparent(true)
            .with_active(false) // Keep keyboard focus in the terminal
            .with_window_level(WindowLevel::AlwaysOnTop);

        #[cfg(windows)]
        {
            use winit::platform::windows::WindowAttributesExtWindows;
            attributes = attributes.with_skip_taskbar(true);
        }

        let window = event_loop
            .create_window(attributes)
            .context("Failed to create overlay window")?;
        let window = Arc::new(window);

        // Mouse events pass through to the windows below
        if let Err(e) = window.set_cursor_hittest(false) {
            warn!("Overlay window cannot be made click-through: {}", e);
        }

        let renderer = Renderer::new(&window).context("Failed to initialize renderer")?;
        let size = window.inner_size();
        let canvas = Canvas::new(size.width, size.height);

        info!("Overlay window created with ID: {:?}", window.id());

        Ok(Self {
            window,
            renderer,
            canvas,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Follow a window size change
    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
        self.canvas.resize(width, height);
    }
}

impl OverlaySurface for OverlayWindow {
    fn present(&mut self, state: &RenderState) -> Result<bool> {
        self.canvas.paint(state);
        self.window.pre_present_notify();
        let shown = self.renderer.render(&self.canvas)?;
        if !shown {
            // Comes back as RedrawRequested, which repaints this slot
            self.window.request_redraw();
        }
        Ok(shown)
    }
}

impl Drop for OverlayWindow {
    fn drop(&mut self) {
        info!("Overlay window {:?} destroyed", self.window.id());
    }
}

/// Creates overlay windows; only lives for one event loop callback
pub struct WindowFactory<'a> {
    event_loop: &'a ActiveEventLoop,
}

impl<'a> WindowFactory<'a> {
    pub fn new(event_loop: &'a ActiveEventLoop) -> Self {
        Self { event_loop }
    }
}

impl SurfaceFactory for WindowFactory<'_> {
    type Surface = OverlayWindow;

    fn create(&mut self, monitor: &Monitor, rect: &OverlayRect) -> Result<OverlayWindow> {
        let title = format!("overlay-mirror [{}]", rect.section());
        OverlayWindow::new(self.event_loop, monitor, &title)
    }
}
