// Prevents console window in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod autostart;
mod config;
mod coordinator;
mod logging;
mod overlay;
mod screens;
mod tracker;
mod tray;
mod ui;

use tracing::info;
use windows::core::PCWSTR;
use windows::Win32::System::Threading::{CreateMutexW, OpenMutexW, SYNCHRONIZATION_ACCESS_RIGHTS};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, TranslateMessage, MSG,
};

const SINGLE_INSTANCE_MUTEX: &str = "IdleShadeMutex\0";

fn main() {
    logging::init();

    // Single-instance check
    if is_already_running() {
        info!("another instance is running, exiting");
        return;
    }

    // Load config (missing or corrupt files fall back to defaults; a legacy
    // single-index file is migrated and rewritten here)
    let cfg = config::load_config();
    info!(
        "monitoring targets {:?} with {}s timeout",
        cfg.target_screen_indices, cfg.inactivity_timeout_seconds
    );

    // Create the hidden settings window; this also wires the coordinator,
    // starts the inactivity tracker and arms the poll timer
    let hwnd = ui::create_window(cfg);

    // Setup system tray
    tray::add_tray_icon(hwnd);

    // Win32 message loop. The quit path removes the tray icon before it
    // destroys the window; overlay teardown happens in WM_DESTROY.
    unsafe {
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

/// Check if another instance is already running
fn is_already_running() -> bool {
    let name: Vec<u16> = SINGLE_INSTANCE_MUTEX.encode_utf16().collect();

    unsafe {
        // Try to open existing mutex
        let existing = OpenMutexW(
            SYNCHRONIZATION_ACCESS_RIGHTS(0x001F0001), // MUTEX_ALL_ACCESS
            false,
            PCWSTR(name.as_ptr()),
        );
        if existing.is_ok() {
            // Another instance exists
            return true;
        }

        // Create the mutex (this instance owns it)
        let _ = CreateMutexW(None, true, PCWSTR(name.as_ptr()));
        false
    }
}
