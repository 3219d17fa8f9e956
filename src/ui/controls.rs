// UI control state tracking and hit-testing

use crate::config::{MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS};
use crate::screens::Monitor;
use std::collections::BTreeSet;
use windows::Win32::Foundation::RECT;

/// State for a toggle switch control
#[derive(Debug, Clone)]
pub struct ToggleState {
    pub checked: bool,
    pub rect: RECT,
}

impl ToggleState {
    pub fn new(checked: bool) -> Self {
        Self {
            checked,
            rect: RECT::default(),
        }
    }
}

/// One row in the monitor checklist. The primary monitor's row is shown but
/// disabled: the tray lives there, so it can never be a blackout target.
#[derive(Debug, Clone)]
pub struct MonitorRow {
    pub index: usize,
    pub label: String,
    pub primary: bool,
    pub checked: bool,
    pub rect: RECT,
}

pub fn build_monitor_rows(monitors: &[Monitor], targets: &BTreeSet<usize>) -> Vec<MonitorRow> {
    monitors
        .iter()
        .map(|m| MonitorRow {
            index: m.index,
            label: format!(
                "Monitor {} ({}\u{00d7}{})",
                m.index + 1,
                m.bounds.width(),
                m.bounds.height()
            ),
            primary: m.primary,
            checked: !m.primary && targets.contains(&m.index),
            rect: RECT::default(),
        })
        .collect()
}

/// State for the timeout slider (seconds, MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS)
#[derive(Debug, Clone)]
pub struct SliderState {
    pub value: i32,
    pub dragging: bool,
    pub rect: RECT,       // full track rect
    pub thumb_rect: RECT, // thumb hit area
}

impl SliderState {
    pub const MIN: i32 = MIN_TIMEOUT_SECS as i32;
    pub const MAX: i32 = MAX_TIMEOUT_SECS as i32;

    pub fn new(value: i32) -> Self {
        Self {
            value: value.clamp(Self::MIN, Self::MAX),
            dragging: false,
            rect: RECT::default(),
            thumb_rect: RECT::default(),
        }
    }

    fn span() -> i32 {
        Self::MAX - Self::MIN
    }

    /// Get x position of slider thumb based on current value
    pub fn thumb_x(&self) -> i32 {
        let track_width = self.rect.right - self.rect.left;
        self.rect.left
            + ((self.value - Self::MIN) as f32 / Self::span() as f32 * track_width as f32) as i32
    }

    /// Calculate value from an x position within the slider track
    pub fn value_from_x(&self, x: i32) -> i32 {
        let track_width = self.rect.right - self.rect.left;
        if track_width <= 0 {
            return self.value;
        }
        let rel_x = (x - self.rect.left).clamp(0, track_width);
        Self::MIN + ((rel_x as f32 / track_width as f32) * Self::span() as f32).round() as i32
    }
}

/// State for the Save button
#[derive(Debug, Clone)]
pub struct ButtonState {
    pub rect: RECT,
    pub text: String,
}

impl ButtonState {
    pub fn new(text: &str) -> Self {
        Self {
            rect: RECT::default(),
            text: text.to_string(),
        }
    }
}

/// Complete UI state
pub struct UiState {
    pub monitor_rows: Vec<MonitorRow>,
    pub timeout_slider: SliderState,
    pub autostart_toggle: ToggleState,
    pub save_btn: ButtonState,

    // Toast
    pub toast_message: String,
    pub toast_visible: bool,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            monitor_rows: Vec::new(),
            timeout_slider: SliderState::new(30),
            autostart_toggle: ToggleState::new(false),
            save_btn: ButtonState::new("Save"),
            toast_message: String::new(),
            toast_visible: false,
        }
    }

    /// Targets currently selected in the checklist.
    pub fn selected_targets(&self) -> BTreeSet<usize> {
        self.monitor_rows
            .iter()
            .filter(|r| r.checked && !r.primary)
            .map(|r| r.index)
            .collect()
    }
}

/// Check if a point is inside a rect
pub fn point_in_rect(x: i32, y: i32, r: &RECT) -> bool {
    x >= r.left && x < r.right && y >= r.top && y < r.bottom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::Rect;

    #[test]
    fn slider_maps_track_ends_to_range_ends() {
        let mut s = SliderState::new(30);
        s.rect = RECT { left: 100, top: 0, right: 400, bottom: 8 };
        assert_eq!(s.value_from_x(100), SliderState::MIN);
        assert_eq!(s.value_from_x(400), SliderState::MAX);
        // Out-of-track clicks clamp.
        assert_eq!(s.value_from_x(0), SliderState::MIN);
        assert_eq!(s.value_from_x(1000), SliderState::MAX);
    }

    #[test]
    fn slider_new_clamps_out_of_range_values() {
        assert_eq!(SliderState::new(0).value, SliderState::MIN);
        assert_eq!(SliderState::new(100_000).value, SliderState::MAX);
    }

    #[test]
    fn primary_row_is_never_selectable() {
        let monitors = vec![
            Monitor { index: 0, bounds: Rect::new(0, 0, 1920, 1080), primary: true },
            Monitor { index: 1, bounds: Rect::new(1920, 0, 3840, 1080), primary: false },
        ];
        // Even a config that (wrongly) lists the primary produces an
        // unchecked, disabled row.
        let rows = build_monitor_rows(&monitors, &BTreeSet::from([0, 1]));
        assert!(!rows[0].checked && rows[0].primary);
        assert!(rows[1].checked && !rows[1].primary);

        let mut ui = UiState::new();
        ui.monitor_rows = rows;
        assert_eq!(ui.selected_targets(), BTreeSet::from([1]));
    }

    #[test]
    fn row_labels_show_resolution() {
        let monitors = vec![Monitor {
            index: 1,
            bounds: Rect::new(1920, 0, 4480, 1440),
            primary: false,
        }];
        let rows = build_monitor_rows(&monitors, &BTreeSet::new());
        assert_eq!(rows[0].label, "Monitor 2 (2560\u{00d7}1440)");
    }
}
