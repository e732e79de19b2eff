// platform/windows.rs - Windows-specific Platform Implementation

use log::debug;
use windows::Win32::Foundation::POINT;
use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

/// Cursor position in virtual-desktop pixels.
///
/// winit makes the process per-monitor DPI aware, so these are the same
/// physical coordinates winit reports for monitor positions.
pub fn cursor_position() -> Option<(i32, i32)> {
    let mut point = POINT::default();
    match unsafe { GetCursorPos(&mut point) } {
        Ok(()) => Some((point.x, point.y)),
        Err(e) => {
            // Fails transiently on the secure desktop (lock screen, UAC prompt)
            debug!("GetCursorPos failed: {:?}", e);
            None
        }
    }
}
