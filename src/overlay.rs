// Overlay surfaces: one borderless opaque black window per covered monitor.
//
// Windows are owned by the UI thread. Mutations requested from the poll
// path go through a command queue: the caller enqueues a command and posts
// WM_APP_OVERLAY to the main window, whose message handler drains the queue
// on the owning thread. The caller never blocks on the result.
//
// Window behavior:
//   • WS_EX_TOPMOST + WS_EX_TOOLWINDOW + WS_EX_NOACTIVATE: always on top,
//     absent from alt-tab, never takes keyboard focus
//   • WM_MOUSEACTIVATE → MA_NOACTIVATE: clicks on the cover don't activate
//   • WM_CLOSE is converted into a hide; only shutdown destroys windows
//   • WM_DPICHANGED re-applies the last target bounds verbatim, overriding
//     the DPI-suggested rectangle (the cover must equal the physical
//     monitor rect, not a scaled approximation)

use crate::coordinator::SurfaceHost;
use crate::screens::Rect;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use tracing::{debug, error};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::CreateSolidBrush;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, PostMessageW, RegisterClassW, SetWindowPos,
    ShowWindow, CS_HREDRAW, CS_VREDRAW, HWND_TOPMOST, MA_NOACTIVATE, SWP_NOACTIVATE, SWP_NOZORDER,
    SWP_NOSENDCHANGING, SWP_SHOWWINDOW, SW_HIDE, WINDOW_EX_STYLE, WM_APP, WM_CLOSE, WM_DPICHANGED,
    WM_MOUSEACTIVATE, WNDCLASSW, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_POPUP,
};

/// Posted to the main window to drain the pending surface commands.
pub const WM_APP_OVERLAY: u32 = WM_APP + 1;

const CLASS_NAME: &str = "IdleShadeOverlay\0";

#[derive(Debug, Clone, Copy)]
enum Command {
    Show { index: usize, bounds: Rect },
    Hide { index: usize },
}

#[derive(Debug, Clone, Copy)]
struct Surface {
    hwnd: isize,
    bounds: Rect,
    shown: bool,
}

static COMMANDS: Mutex<VecDeque<Command>> = Mutex::new(VecDeque::new());
static SURFACES: Mutex<BTreeMap<usize, Surface>> = Mutex::new(BTreeMap::new());
static CLASS_REGISTERED: Mutex<bool> = Mutex::new(false);

/// Fire-and-forget handle given to the coordinator. `main_hwnd` is the
/// message window whose thread owns every overlay window.
pub struct OverlayHost {
    main_hwnd: isize,
}

impl OverlayHost {
    pub fn new(main_hwnd: HWND) -> Self {
        Self { main_hwnd: main_hwnd.0 as isize }
    }

    fn post(&self, command: Command) {
        COMMANDS.lock().unwrap().push_back(command);
        unsafe {
            let hwnd = HWND(self.main_hwnd as *mut std::ffi::c_void);
            let _ = PostMessageW(Some(hwnd), WM_APP_OVERLAY, WPARAM(0), LPARAM(0));
        }
    }
}

impl SurfaceHost for OverlayHost {
    fn show(&mut self, index: usize, bounds: Rect) {
        self.post(Command::Show { index, bounds });
    }

    fn hide(&mut self, index: usize) {
        self.post(Command::Hide { index });
    }
}

/// Drain pending commands. Must run on the UI thread (WM_APP_OVERLAY
/// handler).
pub fn drain_commands() {
    loop {
        let command = COMMANDS.lock().unwrap().pop_front();
        match command {
            Some(Command::Show { index, bounds }) => apply_show(index, bounds),
            Some(Command::Hide { index }) => apply_hide(index),
            None => break,
        }
    }
}

/// Destroy every overlay window. Shutdown only; runs on the UI thread.
pub fn destroy_all() {
    let surfaces: Vec<Surface> = {
        let mut map = SURFACES.lock().unwrap();
        std::mem::take(&mut *map).into_values().collect()
    };
    for surface in surfaces {
        unsafe {
            let _ = DestroyWindow(HWND(surface.hwnd as *mut std::ffi::c_void));
        }
    }
}

fn apply_show(index: usize, bounds: Rect) {
    let existing = SURFACES.lock().unwrap().get(&index).copied();
    let hwnd = match existing {
        // Idempotent: already covering exactly this rectangle.
        Some(s) if s.shown && s.bounds == bounds => return,
        Some(s) => s.hwnd,
        None => match create_surface_window() {
            Some(hwnd) => hwnd,
            // Degrade to "no overlay shown"; never fatal.
            None => return,
        },
    };

    // Record the target bounds first: a DPI-change message delivered while
    // SetWindowPos runs must already see them.
    SURFACES
        .lock()
        .unwrap()
        .insert(index, Surface { hwnd, bounds, shown: true });

    unsafe {
        let _ = SetWindowPos(
            HWND(hwnd as *mut std::ffi::c_void),
            Some(HWND_TOPMOST),
            bounds.left,
            bounds.top,
            bounds.width(),
            bounds.height(),
            SWP_SHOWWINDOW | SWP_NOACTIVATE | SWP_NOSENDCHANGING,
        );
    }
    debug!("overlay shown on monitor {index}");
}

fn apply_hide(index: usize) {
    let hwnd = match SURFACES.lock().unwrap().get_mut(&index) {
        Some(s) if s.shown => {
            s.shown = false;
            Some(s.hwnd)
        }
        _ => None,
    };
    if let Some(hwnd) = hwnd {
        unsafe {
            let _ = ShowWindow(HWND(hwnd as *mut std::ffi::c_void), SW_HIDE);
        }
        debug!("overlay hidden on monitor {index}");
    }
}

fn register_class() -> bool {
    let mut registered = CLASS_REGISTERED.lock().unwrap();
    if *registered {
        return true;
    }

    unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null()).unwrap_or_default();
        let class_name: Vec<u16> = CLASS_NAME.encode_utf16().collect();

        let wc = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(surface_proc),
            hInstance: hinstance.into(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            // Fully opaque black; the background brush is the entire paint.
            hbrBackground: CreateSolidBrush(COLORREF(0)),
            ..Default::default()
        };

        if RegisterClassW(&wc) != 0 {
            *registered = true;
            true
        } else {
            error!("overlay window class registration failed");
            false
        }
    }
}

fn create_surface_window() -> Option<isize> {
    if !register_class() {
        return None;
    }

    unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null()).unwrap_or_default();
        let class_name: Vec<u16> = CLASS_NAME.encode_utf16().collect();

        // Created hidden; the first SetWindowPos positions and shows it.
        match CreateWindowExW(
            surface_ex_style(),
            PCWSTR(class_name.as_ptr()),
            PCWSTR::null(),
            WS_POPUP,
            0,
            0,
            0,
            0,
            None,
            None,
            Some(hinstance.into()),
            None,
        ) {
            Ok(hwnd) => Some(hwnd.0 as isize),
            Err(e) => {
                error!("overlay window creation failed: {e}");
                None
            }
        }
    }
}

fn surface_by_hwnd(hwnd: HWND) -> Option<(usize, Surface)> {
    let raw = hwnd.0 as isize;
    SURFACES
        .lock()
        .unwrap()
        .iter()
        .find(|(_, s)| s.hwnd == raw)
        .map(|(&i, &s)| (i, s))
}

unsafe extern "system" fn surface_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_CLOSE => {
            // User-initiated close becomes a hide; the coordinator alone
            // owns destruction.
            let _ = ShowWindow(hwnd, SW_HIDE);
            if let Some((index, _)) = surface_by_hwnd(hwnd) {
                if let Some(s) = SURFACES.lock().unwrap().get_mut(&index) {
                    s.shown = false;
                }
            }
            LRESULT(0)
        }

        WM_DPICHANGED => {
            // The toolkit suggests a DPI-scaled rect in lparam; ignore it
            // and re-pin to the last-known monitor rectangle.
            if let Some((_, surface)) = surface_by_hwnd(hwnd) {
                let b = surface.bounds;
                let _ = SetWindowPos(
                    hwnd,
                    None,
                    b.left,
                    b.top,
                    b.width(),
                    b.height(),
                    SWP_NOACTIVATE | SWP_NOZORDER | SWP_NOSENDCHANGING,
                );
            }
            LRESULT(0)
        }

        WM_MOUSEACTIVATE => LRESULT(MA_NOACTIVATE as isize),

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Topmost, absent from alt-tab, never activated.
fn surface_ex_style() -> WINDOW_EX_STYLE {
    WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::UI::WindowsAndMessaging::{
        WS_EX_APPWINDOW, WS_EX_LAYERED, WS_EX_TRANSPARENT,
    };

    #[test]
    fn surface_style_excludes_taskbar_and_focus() {
        let style = surface_ex_style();
        assert!(style.contains(WS_EX_TOOLWINDOW));
        assert!(style.contains(WS_EX_NOACTIVATE));
        assert!(style.contains(WS_EX_TOPMOST));
        // Opaque cover: no layering or click-through.
        assert!(!style.contains(WS_EX_APPWINDOW));
        assert!(!style.contains(WS_EX_LAYERED));
        assert!(!style.contains(WS_EX_TRANSPARENT));
    }
}
