// Screen topology queries: which monitors exist, where the pointer is, and
// whether a monitor is currently occupied by a fullscreen foreground window.
//
// The Win32 surface is kept to three raw queries (monitor list, cursor
// position, foreground window rect); everything decided from them is pure
// and unit-tested.

use windows::core::BOOL;
use windows::Win32::Foundation::{LPARAM, POINT, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO, MONITORINFOF_PRIMARY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetCursorPos, GetForegroundWindow, GetWindowRect,
};

/// Per-edge tolerance when matching a foreground window against a monitor.
/// Borderless-fullscreen windows are often a few pixels off the exact
/// monitor rectangle.
pub const FULLSCREEN_TOLERANCE_PX: i32 = 5;

/// Rectangle in virtual-desktop coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Edge-wise match within `tolerance` pixels.
    pub fn matches(&self, other: &Rect, tolerance: i32) -> bool {
        (self.left - other.left).abs() <= tolerance
            && (self.top - other.top).abs() <= tolerance
            && (self.right - other.right).abs() <= tolerance
            && (self.bottom - other.bottom).abs() <= tolerance
    }
}

impl From<RECT> for Rect {
    fn from(r: RECT) -> Self {
        Self { left: r.left, top: r.top, right: r.right, bottom: r.bottom }
    }
}

/// One display in the current topology snapshot. The index is its stable
/// 0-based position in enumeration order and is what gets persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    pub index: usize,
    pub bounds: Rect,
    pub primary: bool,
}

/// Index of the monitor containing the point, if any. A pointer that maps
/// to no monitor is a transient state during display reconfiguration.
pub fn monitor_at(monitors: &[Monitor], x: i32, y: i32) -> Option<usize> {
    monitors.iter().find(|m| m.bounds.contains(x, y)).map(|m| m.index)
}

/// Whether `bounds` is covered edge-to-edge by the foreground window rect.
pub fn is_fullscreen_rect(foreground: Option<Rect>, bounds: &Rect) -> bool {
    foreground.is_some_and(|fg| fg.matches(bounds, FULLSCREEN_TOLERANCE_PX))
}

/// Raw topology queries, abstracted so the coordinator can be driven by a
/// fake in tests.
pub trait Screens {
    /// Snapshot of connected displays, in enumeration order.
    fn monitors(&self) -> Vec<Monitor>;
    /// Pointer position in virtual-desktop coordinates.
    fn cursor_pos(&self) -> Option<(i32, i32)>;
    /// Bounds of the topmost foreground window, if there is one.
    fn foreground_rect(&self) -> Option<Rect>;
}

/// Live Win32 implementation.
pub struct SystemScreens;

impl Screens for SystemScreens {
    fn monitors(&self) -> Vec<Monitor> {
        let mut out: Vec<Monitor> = Vec::new();
        unsafe {
            let _ = EnumDisplayMonitors(
                None,
                None,
                Some(monitor_enum_proc),
                LPARAM(&mut out as *mut Vec<Monitor> as isize),
            );
        }
        out
    }

    fn cursor_pos(&self) -> Option<(i32, i32)> {
        let mut pt = POINT::default();
        unsafe { GetCursorPos(&mut pt).ok().map(|_| (pt.x, pt.y)) }
    }

    fn foreground_rect(&self) -> Option<Rect> {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.is_invalid() {
                return None;
            }
            let mut rect = RECT::default();
            GetWindowRect(hwnd, &mut rect).ok().map(|_| Rect::from(rect))
        }
    }
}

unsafe extern "system" fn monitor_enum_proc(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _lprect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let out = &mut *(lparam.0 as *mut Vec<Monitor>);

    let mut mi = MONITORINFO {
        cbSize: std::mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };
    if GetMonitorInfoW(hmonitor, &mut mi).as_bool() {
        out.push(Monitor {
            index: out.len(),
            bounds: Rect::from(mi.rcMonitor),
            primary: (mi.dwFlags & MONITORINFOF_PRIMARY) != 0,
        });
    }

    BOOL::from(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_monitors() -> Vec<Monitor> {
        vec![
            Monitor { index: 0, bounds: Rect::new(0, 0, 1920, 1080), primary: true },
            Monitor { index: 1, bounds: Rect::new(1920, 0, 3840, 1080), primary: false },
        ]
    }

    #[test]
    fn pointer_maps_to_containing_monitor() {
        let monitors = two_monitors();
        assert_eq!(monitor_at(&monitors, 100, 100), Some(0));
        assert_eq!(monitor_at(&monitors, 2000, 500), Some(1));
        // Right/bottom edges are exclusive.
        assert_eq!(monitor_at(&monitors, 1920, 0), Some(1));
    }

    #[test]
    fn unmapped_pointer_maps_to_none() {
        let monitors = two_monitors();
        assert_eq!(monitor_at(&monitors, -50, -50), None);
        assert_eq!(monitor_at(&monitors, 4000, 100), None);
    }

    #[test]
    fn fullscreen_match_tolerates_small_offsets() {
        let bounds = Rect::new(1920, 0, 3840, 1080);
        let near = Rect::new(1918, -3, 3843, 1084);
        assert!(is_fullscreen_rect(Some(near), &bounds));
    }

    #[test]
    fn windowed_foreground_does_not_match() {
        let bounds = Rect::new(0, 0, 1920, 1080);
        let windowed = Rect::new(200, 150, 1400, 900);
        assert!(!is_fullscreen_rect(Some(windowed), &bounds));
        assert!(!is_fullscreen_rect(None, &bounds));
    }

    #[test]
    fn just_past_tolerance_does_not_match() {
        let bounds = Rect::new(0, 0, 1920, 1080);
        let off = Rect::new(0, 0, 1920, 1080 + FULLSCREEN_TOLERANCE_PX + 1);
        assert!(!is_fullscreen_rect(Some(off), &bounds));
    }
}
