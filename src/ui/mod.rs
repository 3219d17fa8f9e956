pub mod controls;
pub mod painting;
pub mod theme;

use controls::*;
use theme::*;

use crate::config::{self, AppConfig};
use crate::coordinator::OverlayCoordinator;
use crate::overlay::{self, OverlayHost, WM_APP_OVERLAY};
use crate::screens::{Screens, SystemScreens};
use crate::tracker::POLL_INTERVAL_MS;
use crate::{autostart, tray};

use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture};
use windows::Win32::UI::WindowsAndMessaging::*;

const CLASS_NAME: &str = "IdleShadeSettingsWnd\0";
const WM_TRAY_CALLBACK: u32 = tray::WM_TRAY_ICON;

/// Timer IDs on the main window
const POLL_TIMER_ID: usize = 1;
const TOAST_TIMER_ID: usize = 100;

/// Shared state pointer stored behind the WndProc
struct WndState {
    ui: UiState,
    config: AppConfig,
    coordinator: OverlayCoordinator<OverlayHost>,
    screens: SystemScreens,
}

// Global pointer to WndState (set during window creation, used in WndProc)
static mut WND_STATE: *mut WndState = std::ptr::null_mut();

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Create the (initially hidden) settings window, wire up the coordinator
/// and start monitoring. Returns the main window handle that owns the tray
/// icon, the poll timer and all overlay windows.
pub fn create_window(mut cfg: AppConfig) -> HWND {
    let class_name = wide(CLASS_NAME);

    unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null()).unwrap_or_default();
        let icon_id = PCWSTR(1 as *const u16);
        let hicon = LoadIconW(Some(hinstance.into()), icon_id)
            .ok()
            .or_else(|| LoadIconW(None, IDI_APPLICATION).ok())
            .unwrap_or_default();

        let wc = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(wnd_proc),
            hInstance: hinstance.into(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            hbrBackground: CreateSolidBrush(CLR_BACKGROUND),
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            hIcon: hicon,
            ..Default::default()
        };

        RegisterClassW(&wc);

        // Calculate window size to get desired client area
        let mut wr = RECT {
            left: 0,
            top: 0,
            right: WINDOW_WIDTH,
            bottom: WINDOW_HEIGHT,
        };
        let style = WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU | WS_MINIMIZEBOX;
        let _ = AdjustWindowRectEx(&mut wr, style, false, WINDOW_EX_STYLE::default());

        let win_w = wr.right - wr.left;
        let win_h = wr.bottom - wr.top;

        let title = wide("IdleShade Settings");

        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            PCWSTR(class_name.as_ptr()),
            PCWSTR(title.as_ptr()),
            style,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            win_w,
            win_h,
            None,
            None,
            Some(hinstance.into()),
            None,
        )
        .unwrap();

        let screens = SystemScreens;

        // Enforce the target invariants against the live topology up front;
        // a pruned config is persisted so the file never lists the primary.
        let monitors = screens.monitors();
        let present: BTreeSet<usize> = monitors.iter().map(|m| m.index).collect();
        let primary = monitors.iter().find(|m| m.primary).map(|m| m.index);
        if config::sanitize_targets(&mut cfg, primary, &present) {
            info!("pruned stale target indices, now {:?}", cfg.target_screen_indices);
            if let Err(e) = config::save_config(&cfg) {
                warn!("could not persist pruned config: {e:#}");
            }
        }

        let now = Instant::now();
        let timeout = Duration::from_secs(cfg.inactivity_timeout_seconds);
        let mut coordinator = OverlayCoordinator::new(OverlayHost::new(hwnd), timeout);
        coordinator.configure(&cfg.target_screen_indices, timeout, now);
        coordinator.start(now);

        // Initialize UI state
        let mut ui = UiState::new();
        ui.monitor_rows = build_monitor_rows(&monitors, &cfg.target_screen_indices);
        ui.timeout_slider = SliderState::new(cfg.inactivity_timeout_seconds as i32);
        ui.autostart_toggle.checked = autostart::is_enabled();

        let wnd_state = Box::new(WndState {
            ui,
            config: cfg,
            coordinator,
            screens,
        });
        WND_STATE = Box::into_raw(wnd_state);

        SetTimer(Some(hwnd), POLL_TIMER_ID, POLL_INTERVAL_MS, None);

        hwnd
    }
}

/// Open the settings window. Monitoring visibly pauses while it is up:
/// all overlays drop and the tracker stops until the window is closed.
pub fn open_settings(hwnd: HWND) {
    unsafe {
        if WND_STATE.is_null() {
            return;
        }
        let state = &mut *WND_STATE;
        state.coordinator.hide_all();
        state.coordinator.stop();

        // Refresh against the live topology and registry on every open.
        let monitors = state.screens.monitors();
        state.ui.monitor_rows = build_monitor_rows(&monitors, &state.config.target_screen_indices);
        state.ui.timeout_slider =
            SliderState::new(state.config.inactivity_timeout_seconds as i32);
        state.ui.autostart_toggle.checked = autostart::is_enabled();
        invalidate(hwnd);

        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = SetForegroundWindow(hwnd);
    }
}

/// Hide the settings window and resume monitoring with fresh timers.
fn close_settings(hwnd: HWND) {
    unsafe {
        let _ = ShowWindow(hwnd, SW_HIDE);
        if !WND_STATE.is_null() {
            let state = &mut *WND_STATE;
            state.coordinator.start(Instant::now());
        }
    }
}

/// Trigger a repaint
fn invalidate(hwnd: HWND) {
    unsafe {
        let _ = InvalidateRect(Some(hwnd), None, true);
    }
}

/// Show a toast message
fn show_toast(hwnd: HWND, message: &str) {
    unsafe {
        if WND_STATE.is_null() {
            return;
        }
        let state = &mut *WND_STATE;
        state.ui.toast_message = message.to_string();
        state.ui.toast_visible = true;
        invalidate(hwnd);

        // Auto-hide after 2 seconds
        SetTimer(Some(hwnd), TOAST_TIMER_ID, 2000, None);
    }
}

fn show_error(hwnd: HWND, message: &str) {
    let text = wide(message);
    let caption = wide("IdleShade");
    unsafe {
        let _ = MessageBoxW(
            Some(hwnd),
            PCWSTR(text.as_ptr()),
            PCWSTR(caption.as_ptr()),
            MB_OK | MB_ICONERROR,
        );
    }
}

/// Apply the settings form: sanitize, persist, sync autostart and
/// reconfigure the coordinator. Persistence and registry failures are
/// explicit user actions here, so they surface as blocking notices.
fn save_settings(hwnd: HWND) {
    unsafe {
        if WND_STATE.is_null() {
            return;
        }
        let state = &mut *WND_STATE;

        state.config.target_screen_indices = state.ui.selected_targets();
        state.config.inactivity_timeout_seconds = state.ui.timeout_slider.value as u64;
        state.config.start_with_windows = state.ui.autostart_toggle.checked;

        let monitors = state.screens.monitors();
        let present: BTreeSet<usize> = monitors.iter().map(|m| m.index).collect();
        let primary = monitors.iter().find(|m| m.primary).map(|m| m.index);
        config::sanitize_targets(&mut state.config, primary, &present);

        if let Err(e) = config::save_config(&state.config) {
            show_error(hwnd, &format!("Saving settings failed:\n{e:#}"));
            return;
        }

        let wants_autostart = state.config.start_with_windows;
        if wants_autostart != autostart::is_enabled() {
            let result = if wants_autostart {
                autostart::enable()
            } else {
                autostart::disable()
            };
            if let Err(e) = result {
                show_error(hwnd, &format!("Updating autostart failed:\n{e:#}"));
                state.ui.autostart_toggle.checked = autostart::is_enabled();
            }
        }

        let timeout = Duration::from_secs(state.config.inactivity_timeout_seconds);
        state
            .coordinator
            .configure(&state.config.target_screen_indices, timeout, Instant::now());
        info!(
            "settings saved: targets {:?}, timeout {}s",
            state.config.target_screen_indices, state.config.inactivity_timeout_seconds
        );

        show_toast(hwnd, "Settings saved");
        invalidate(hwnd);
    }
}

/// Window procedure
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);

            // Double-buffer to avoid flicker
            let mut client = RECT::default();
            let _ = GetClientRect(hwnd, &mut client);

            let mem_dc = CreateCompatibleDC(Some(hdc));
            let mem_bmp = CreateCompatibleBitmap(hdc, client.right, client.bottom);
            let old_bmp = SelectObject(mem_dc, HGDIOBJ::from(mem_bmp));

            if !WND_STATE.is_null() {
                let state = &mut *WND_STATE;
                painting::paint(mem_dc, &client, &mut state.ui);
            }

            // Blit to screen
            let _ = BitBlt(
                hdc,
                0,
                0,
                client.right,
                client.bottom,
                Some(mem_dc),
                0,
                0,
                SRCCOPY,
            );

            SelectObject(mem_dc, old_bmp);
            let _ = DeleteObject(HGDIOBJ::from(mem_bmp));
            let _ = DeleteDC(mem_dc);
            let _ = EndPaint(hwnd, &ps);
            LRESULT(0)
        }

        WM_TIMER => {
            let timer_id = wparam.0;
            if timer_id == POLL_TIMER_ID {
                if !WND_STATE.is_null() {
                    let state = &mut *WND_STATE;
                    state.coordinator.tick(&state.screens, Instant::now());
                }
            } else if timer_id == TOAST_TIMER_ID {
                if !WND_STATE.is_null() {
                    let state = &mut *WND_STATE;
                    state.ui.toast_visible = false;
                    state.ui.toast_message.clear();
                    let _ = KillTimer(Some(hwnd), TOAST_TIMER_ID);
                    invalidate(hwnd);
                }
            }
            LRESULT(0)
        }

        // Drain pending overlay commands on the owning thread
        x if x == WM_APP_OVERLAY => {
            overlay::drain_commands();
            LRESULT(0)
        }

        WM_DISPLAYCHANGE => {
            if !WND_STATE.is_null() {
                let state = &mut *WND_STATE;
                let changed = state.coordinator.on_topology_changed(
                    &state.screens,
                    &mut state.config,
                    Instant::now(),
                );
                if changed {
                    if let Err(e) = config::save_config(&state.config) {
                        warn!("could not persist config after topology change: {e:#}");
                    }
                }
                if IsWindowVisible(hwnd).as_bool() {
                    let monitors = state.screens.monitors();
                    state.ui.monitor_rows =
                        build_monitor_rows(&monitors, &state.config.target_screen_indices);
                    invalidate(hwnd);
                }
            }
            LRESULT(0)
        }

        WM_LBUTTONDOWN => {
            if WND_STATE.is_null() {
                return DefWindowProcW(hwnd, msg, wparam, lparam);
            }
            let state = &mut *WND_STATE;
            let x = (lparam.0 & 0xFFFF) as i16 as i32;
            let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;

            // Monitor checklist rows
            for row in &mut state.ui.monitor_rows {
                if point_in_rect(x, y, &row.rect) {
                    if !row.primary {
                        row.checked = !row.checked;
                        invalidate(hwnd);
                    }
                    return LRESULT(0);
                }
            }

            // Slider drag
            if point_in_rect(x, y, &state.ui.timeout_slider.thumb_rect) {
                state.ui.timeout_slider.dragging = true;
                SetCapture(hwnd);
                let val = state.ui.timeout_slider.value_from_x(x);
                state.ui.timeout_slider.value = val;
                invalidate(hwnd);
                return LRESULT(0);
            }

            // Autostart toggle (applied on save)
            if point_in_rect(x, y, &state.ui.autostart_toggle.rect) {
                state.ui.autostart_toggle.checked = !state.ui.autostart_toggle.checked;
                invalidate(hwnd);
                return LRESULT(0);
            }

            // Save button
            if point_in_rect(x, y, &state.ui.save_btn.rect) {
                save_settings(hwnd);
                return LRESULT(0);
            }

            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        WM_MOUSEMOVE => {
            if !WND_STATE.is_null() {
                let state = &mut *WND_STATE;
                if state.ui.timeout_slider.dragging {
                    let x = (lparam.0 & 0xFFFF) as i16 as i32;
                    let val = state.ui.timeout_slider.value_from_x(x);
                    state.ui.timeout_slider.value = val;
                    invalidate(hwnd);
                }
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        WM_LBUTTONUP => {
            if !WND_STATE.is_null() {
                let state = &mut *WND_STATE;
                if state.ui.timeout_slider.dragging {
                    state.ui.timeout_slider.dragging = false;
                    let _ = ReleaseCapture();
                    invalidate(hwnd);
                }
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        WM_COMMAND => {
            let cmd = (wparam.0 & 0xFFFF) as u32;
            match cmd {
                tray::IDM_BLACKOUT_NOW => {
                    if !WND_STATE.is_null() {
                        let state = &mut *WND_STATE;
                        let targets = state.config.target_screen_indices.clone();
                        state
                            .coordinator
                            .toggle_now(&state.screens, &targets, Instant::now());
                    }
                }
                tray::IDM_SETTINGS => {
                    open_settings(hwnd);
                }
                tray::IDM_QUIT => {
                    tray::remove_tray_icon(hwnd);
                    let _ = DestroyWindow(hwnd);
                }
                _ => {}
            }
            LRESULT(0)
        }

        WM_TRAY_CALLBACK => {
            let event = (lparam.0 & 0xFFFF) as u32;
            match event {
                WM_LBUTTONUP => {
                    open_settings(hwnd);
                }
                WM_RBUTTONUP => {
                    tray::show_context_menu(hwnd);
                }
                _ => {}
            }
            LRESULT(0)
        }

        WM_CLOSE => {
            // Hide to tray and resume monitoring
            close_settings(hwnd);
            LRESULT(0)
        }

        WM_DESTROY => {
            let _ = KillTimer(Some(hwnd), POLL_TIMER_ID);
            if !WND_STATE.is_null() {
                let mut state = Box::from_raw(WND_STATE);
                WND_STATE = std::ptr::null_mut();
                state.coordinator.hide_all();
            }
            // Apply any still-queued hides before the windows are torn down
            overlay::drain_commands();
            overlay::destroy_all();
            PostQuitMessage(0);
            LRESULT(0)
        }

        WM_ERASEBKGND => {
            // Handled in WM_PAINT with double buffering
            LRESULT(1)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
