use windows::Win32::Foundation::COLORREF;

// ── Dark palette ─────────────────────────────────────────────────────────────

/// Background: #030711
pub const CLR_BACKGROUND: COLORREF = COLORREF(0x00110703);

/// Foreground / primary text: #F8FAFC
pub const CLR_FOREGROUND: COLORREF = COLORREF(0x00FCFAF8);

/// Secondary / card borders / muted bg: #1E293B
pub const CLR_SECONDARY: COLORREF = COLORREF(0x003B291E);

/// Muted foreground (descriptions, labels): #94A3B8
pub const CLR_MUTED_FG: COLORREF = COLORREF(0x00B8A394);

/// Brand amber: #F59E0B
pub const CLR_BRAND: COLORREF = COLORREF(0x000B9EF5);

/// Border color (same as secondary)
pub const CLR_BORDER: COLORREF = COLORREF(0x003B291E);

/// Input/toggle background (same as secondary)
pub const CLR_INPUT: COLORREF = COLORREF(0x003B291E);

// ── Dimensions ───────────────────────────────────────────────────────────────

/// Main window client area dimensions
pub const WINDOW_WIDTH: i32 = 420;
pub const WINDOW_HEIGHT: i32 = 560;

/// Padding inside the window
pub const PADDING: i32 = 24;

/// Content width (WINDOW_WIDTH - 2 * PADDING)
pub const CONTENT_WIDTH: i32 = WINDOW_WIDTH - 2 * PADDING;

/// Card border radius
pub const CARD_RADIUS: i32 = 8;

/// Height of one monitor checklist row
pub const MONITOR_ROW_HEIGHT: i32 = 30;

/// Gap between sections
pub const GAP: i32 = 12;

// ── Font sizes (in logical units, negative for character height) ─────────────

pub const FONT_SIZE_TITLE: i32 = -18;

pub const FONT_SIZE_SMALL: i32 = -12;
pub const FONT_SIZE_XS: i32 = -11;
pub const FONT_SIZE_XXS: i32 = -10;

/// Font family name
pub const FONT_NAME: &str = "Segoe UI";
