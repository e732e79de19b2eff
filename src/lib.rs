//! overlay-mirror - Click-through overlay rectangles with cursor mirroring
//!
//! This library holds everything that does not need a live window: monitor
//! geometry, the editable rectangles, their persistence, the cursor mapping,
//! the CPU rasterizer, the overlay lifecycle and the keyboard state machine.

pub mod canvas;
pub mod config;
pub mod constants;
pub mod geometry;
pub mod input;
pub mod lifecycle;
pub mod mapper;
pub mod platform;
pub mod rect;

// Re-export commonly used types
pub use canvas::Canvas;
pub use config::{ConfigError, ConfigStore, RectRecord};
pub use geometry::{CursorSample, Monitor, MonitorDirectory, MonitorRect};
pub use input::{Command, EditRequest, EditState, InputMachine, Outcome, RequestSink, RetargetRequest};
pub use lifecycle::{OverlayManager, OverlaySurface, RectSpec, SurfaceFactory};
pub use mapper::map_cursor;
pub use rect::{Marker, OverlayRect, RenderState, Rgb};
