// platform/mod.rs - Platform Abstraction Layer
//
// OS queries the windowing library does not cover. Monitor enumeration goes
// through winit; only the global cursor position needs native code.

#[cfg(target_os = "windows")]
pub mod windows;

/// Whether `cursor_position` can ever report a position on this platform
pub fn cursor_query_supported() -> bool {
    cfg!(target_os = "windows")
}

/// Global cursor position in desktop coordinates, if the platform can report it.
pub fn cursor_position() -> Option<(i32, i32)> {
    #[cfg(target_os = "windows")]
    {
        windows::cursor_position()
    }
    #[cfg(not(target_os = "windows"))]
    {
        // TODO: query the pointer through X11 (XQueryPointer) or CoreGraphics
        // (CGEventGetLocation); until then the marker stays cleared here.
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_platforms_never_report_a_cursor() {
        if !cursor_query_supported() {
            assert_eq!(cursor_position(), None);
        }
    }
}
