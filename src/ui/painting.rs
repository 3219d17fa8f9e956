// GDI owner-draw rendering for the settings window

use super::controls::*;
use super::theme::*;
use windows::Win32::Foundation::{COLORREF, RECT};
use windows::Win32::Graphics::Gdi::*;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn create_font(size: i32, weight: i32, family: &str) -> HFONT {
    let face: Vec<u16> = family.encode_utf16().chain(std::iter::once(0)).collect();
    unsafe {
        let mut lf = LOGFONTW {
            lfHeight: size,
            lfWeight: weight,
            lfQuality: CLEARTYPE_QUALITY,
            lfCharSet: DEFAULT_CHARSET,
            ..Default::default()
        };
        let len = face.len().min(32);
        lf.lfFaceName[..len].copy_from_slice(&face[..len]);
        CreateFontIndirectW(&lf)
    }
}

fn fill_rect_color(hdc: HDC, r: &RECT, color: COLORREF) {
    unsafe {
        let brush = CreateSolidBrush(color);
        FillRect(hdc, r, brush);
        let _ = DeleteObject(HGDIOBJ::from(brush));
    }
}

fn draw_rounded_rect(hdc: HDC, r: &RECT, radius: i32, fill: COLORREF, border: COLORREF) {
    unsafe {
        let fill_brush = CreateSolidBrush(fill);
        let border_pen = CreatePen(PS_SOLID, 1, border);
        let old_brush = SelectObject(hdc, HGDIOBJ::from(fill_brush));
        let old_pen = SelectObject(hdc, HGDIOBJ::from(border_pen));
        let _ = RoundRect(hdc, r.left, r.top, r.right, r.bottom, radius, radius);
        SelectObject(hdc, old_pen);
        SelectObject(hdc, old_brush);
        let _ = DeleteObject(HGDIOBJ::from(fill_brush));
        let _ = DeleteObject(HGDIOBJ::from(border_pen));
    }
}

fn draw_text_simple(hdc: HDC, text: &str, x: i32, y: i32, color: COLORREF, font: HFONT) {
    unsafe {
        let old_font = SelectObject(hdc, HGDIOBJ::from(font));
        SetTextColor(hdc, color);
        SetBkMode(hdc, TRANSPARENT);
        let wide: Vec<u16> = text.encode_utf16().collect();
        let _ = TextOutW(hdc, x, y, &wide);
        SelectObject(hdc, old_font);
    }
}

fn measure_text(hdc: HDC, text: &str, font: HFONT) -> (i32, i32) {
    unsafe {
        let old_font = SelectObject(hdc, HGDIOBJ::from(font));
        let wide: Vec<u16> = text.encode_utf16().collect();
        let mut size = windows::Win32::Foundation::SIZE::default();
        let _ = GetTextExtentPoint32W(hdc, &wide, &mut size);
        SelectObject(hdc, old_font);
        (size.cx, size.cy)
    }
}

fn draw_text_right(hdc: HDC, text: &str, right_x: i32, y: i32, color: COLORREF, font: HFONT) {
    let (w, _) = measure_text(hdc, text, font);
    draw_text_simple(hdc, text, right_x - w, y, color, font);
}

fn draw_circle(hdc: HDC, cx: i32, cy: i32, r: i32, color: COLORREF) {
    unsafe {
        let brush = CreateSolidBrush(color);
        let pen = CreatePen(PS_SOLID, 0, color);
        let old_brush = SelectObject(hdc, HGDIOBJ::from(brush));
        let old_pen = SelectObject(hdc, HGDIOBJ::from(pen));
        let _ = Ellipse(hdc, cx - r, cy - r, cx + r, cy + r);
        SelectObject(hdc, old_pen);
        SelectObject(hdc, old_brush);
        let _ = DeleteObject(HGDIOBJ::from(brush));
        let _ = DeleteObject(HGDIOBJ::from(pen));
    }
}

// ── Main paint function ─────────────────────────────────────────────────────

pub fn paint(hdc: HDC, client: &RECT, state: &mut UiState) {
    fill_rect_color(hdc, client, CLR_BACKGROUND);

    let fonts = Fonts::create();
    let mut y = PADDING;

    y = draw_header(hdc, y, &fonts);
    y += GAP;

    y = draw_monitors_card(hdc, y, state, &fonts);
    y += GAP;

    y = draw_timeout_card(hdc, y, state, &fonts);
    y += GAP;

    y = draw_general_card(hdc, y, state, &fonts);
    y += GAP;

    draw_save_button(hdc, y, state, &fonts);

    if state.toast_visible {
        draw_toast(hdc, client, state, &fonts);
    }

    fonts.destroy();
}

// ── Font cache ──────────────────────────────────────────────────────────────

struct Fonts {
    title: HFONT,
    small: HFONT,
    small_bold: HFONT,
    xs: HFONT,
    xxs: HFONT,
}

impl Fonts {
    fn create() -> Self {
        Self {
            title: create_font(FONT_SIZE_TITLE, 600, FONT_NAME),
            small: create_font(FONT_SIZE_SMALL, 400, FONT_NAME),
            small_bold: create_font(FONT_SIZE_SMALL, 500, FONT_NAME),
            xs: create_font(FONT_SIZE_XS, 400, FONT_NAME),
            xxs: create_font(FONT_SIZE_XXS, 400, FONT_NAME),
        }
    }

    fn destroy(&self) {
        unsafe {
            let _ = DeleteObject(HGDIOBJ::from(self.title));
            let _ = DeleteObject(HGDIOBJ::from(self.small));
            let _ = DeleteObject(HGDIOBJ::from(self.small_bold));
            let _ = DeleteObject(HGDIOBJ::from(self.xs));
            let _ = DeleteObject(HGDIOBJ::from(self.xxs));
        }
    }
}

// ── Section renderers ───────────────────────────────────────────────────────

fn draw_header(hdc: HDC, y: i32, fonts: &Fonts) -> i32 {
    let x = PADDING;
    let right = PADDING + CONTENT_WIDTH;

    // Crescent icon: amber disc with a background disc biting into it
    let icon_size = 40;
    let icon_cx = x + icon_size / 2;
    let icon_cy = y + icon_size / 2;
    draw_circle(hdc, icon_cx, icon_cy, icon_size / 2 - 2, CLR_BRAND);
    draw_circle(hdc, icon_cx + 7, icon_cy - 5, icon_size / 2 - 6, CLR_BACKGROUND);

    let text_x = x + icon_size + 12;
    draw_text_simple(hdc, "IdleShade", text_x, y + 2, CLR_FOREGROUND, fonts.title);
    draw_text_simple(
        hdc,
        "Monitor blackout on inactivity",
        text_x,
        y + 22,
        CLR_MUTED_FG,
        fonts.xs,
    );

    let header_bottom = y + icon_size + 8;

    unsafe {
        let pen = CreatePen(PS_SOLID, 1, CLR_BORDER);
        let old_pen = SelectObject(hdc, HGDIOBJ::from(pen));
        let _ = MoveToEx(hdc, PADDING, header_bottom, None);
        let _ = LineTo(hdc, right, header_bottom);
        SelectObject(hdc, old_pen);
        let _ = DeleteObject(HGDIOBJ::from(pen));
    }

    header_bottom + 8
}

fn draw_monitors_card(hdc: HDC, y: i32, state: &mut UiState, fonts: &Fonts) -> i32 {
    let x = PADDING;
    let inner_x = x + 16;
    let inner_right = x + CONTENT_WIDTH - 16;

    let rows_h = (state.monitor_rows.len().max(1) as i32) * MONITOR_ROW_HEIGHT;
    let card = RECT {
        left: x,
        top: y,
        right: x + CONTENT_WIDTH,
        bottom: y + 40 + rows_h + 10,
    };
    draw_rounded_rect(hdc, &card, CARD_RADIUS, CLR_BACKGROUND, CLR_BORDER);

    draw_text_simple(
        hdc,
        "Monitors to black out",
        inner_x,
        y + 12,
        CLR_FOREGROUND,
        fonts.small_bold,
    );

    if state.monitor_rows.is_empty() {
        draw_text_simple(
            hdc,
            "No monitors detected",
            inner_x,
            y + 42,
            CLR_MUTED_FG,
            fonts.xs,
        );
    }

    for (i, row) in state.monitor_rows.iter_mut().enumerate() {
        let row_y = y + 40 + (i as i32) * MONITOR_ROW_HEIGHT;
        row.rect = RECT {
            left: inner_x,
            top: row_y,
            right: inner_right,
            bottom: row_y + MONITOR_ROW_HEIGHT,
        };

        draw_checkbox(hdc, inner_x, row_y + 4, row.checked, row.primary);

        let label_color = if row.primary { CLR_MUTED_FG } else { CLR_FOREGROUND };
        draw_text_simple(hdc, &row.label, inner_x + 28, row_y + 4, label_color, fonts.small);

        if row.primary {
            draw_text_right(hdc, "primary, always on", inner_right, row_y + 6, CLR_MUTED_FG, fonts.xxs);
        }
    }

    card.bottom
}

fn draw_timeout_card(hdc: HDC, y: i32, state: &mut UiState, fonts: &Fonts) -> i32 {
    let x = PADDING;
    let inner_x = x + 16;
    let inner_right = x + CONTENT_WIDTH - 16;

    let card = RECT {
        left: x,
        top: y,
        right: x + CONTENT_WIDTH,
        bottom: y + 100,
    };
    draw_rounded_rect(hdc, &card, CARD_RADIUS, CLR_BACKGROUND, CLR_BORDER);

    draw_text_simple(
        hdc,
        "Inactivity timeout",
        inner_x,
        y + 14,
        CLR_FOREGROUND,
        fonts.small_bold,
    );

    // Badge with the current value
    let badge_text = format!("{} s", state.timeout_slider.value);
    let (bw, bh) = measure_text(hdc, &badge_text, fonts.xs);
    let badge_w = bw + 20;
    let badge_h = bh + 4;
    let badge_x = inner_right - badge_w;
    let badge_y = y + 12;
    let badge_rect = RECT {
        left: badge_x,
        top: badge_y,
        right: badge_x + badge_w,
        bottom: badge_y + badge_h,
    };
    draw_rounded_rect(hdc, &badge_rect, badge_h / 2, CLR_BRAND, CLR_BRAND);
    draw_text_simple(
        hdc,
        &badge_text,
        badge_x + (badge_w - bw) / 2,
        badge_y + (badge_h - bh) / 2,
        CLR_BACKGROUND,
        fonts.xs,
    );

    // Slider
    let slider_y = y + 48;
    let track_h = 8;
    let thumb_r = 9;

    state.timeout_slider.rect = RECT {
        left: inner_x,
        top: slider_y,
        right: inner_right,
        bottom: slider_y + track_h,
    };

    let track_rect = state.timeout_slider.rect;
    draw_rounded_rect(hdc, &track_rect, 4, CLR_SECONDARY, CLR_SECONDARY);

    let span = (SliderState::MAX - SliderState::MIN) as f32;
    let frac = (state.timeout_slider.value - SliderState::MIN) as f32 / span;
    let fill_w = (frac * (inner_right - inner_x) as f32) as i32;
    if fill_w > 0 {
        let fill_rect = RECT {
            left: inner_x,
            top: slider_y,
            right: inner_x + fill_w,
            bottom: slider_y + track_h,
        };
        draw_rounded_rect(hdc, &fill_rect, 4, CLR_BRAND, CLR_BRAND);
    }

    let thumb_x = state.timeout_slider.thumb_x();
    let thumb_cy = slider_y + track_h / 2;
    draw_circle(hdc, thumb_x, thumb_cy, thumb_r, CLR_FOREGROUND);

    state.timeout_slider.thumb_rect = RECT {
        left: inner_x - thumb_r,
        top: slider_y - thumb_r - 4,
        right: inner_right + thumb_r,
        bottom: slider_y + track_h + thumb_r + 4,
    };

    draw_text_simple(hdc, "1 s", inner_x, slider_y + track_h + 6, CLR_MUTED_FG, fonts.xxs);
    draw_text_right(
        hdc,
        "300 s",
        inner_right,
        slider_y + track_h + 6,
        CLR_MUTED_FG,
        fonts.xxs,
    );

    card.bottom
}

fn draw_general_card(hdc: HDC, y: i32, state: &mut UiState, fonts: &Fonts) -> i32 {
    let x = PADDING;
    let inner_x = x + 16;
    let inner_right = x + CONTENT_WIDTH - 16;

    let card = RECT {
        left: x,
        top: y,
        right: x + CONTENT_WIDTH,
        bottom: y + 56,
    };
    draw_rounded_rect(hdc, &card, CARD_RADIUS, CLR_BACKGROUND, CLR_BORDER);

    draw_text_simple(
        hdc,
        "Start with Windows",
        inner_x,
        y + 10,
        CLR_FOREGROUND,
        fonts.small_bold,
    );
    draw_text_simple(
        hdc,
        "Launch automatically at login",
        inner_x,
        y + 28,
        CLR_MUTED_FG,
        fonts.xs,
    );

    let toggle_x = inner_right - 44;
    state.autostart_toggle.rect = draw_toggle(hdc, toggle_x, y + 16, state.autostart_toggle.checked);

    card.bottom
}

fn draw_save_button(hdc: HDC, y: i32, state: &mut UiState, fonts: &Fonts) {
    let inner_right = PADDING + CONTENT_WIDTH;

    let btn_text = state.save_btn.text.clone();
    let (bw, bh) = measure_text(hdc, &btn_text, fonts.small_bold);
    let btn_w = bw + 40;
    let btn_h = bh + 14;
    let btn_x = inner_right - btn_w;
    let btn_rect = RECT {
        left: btn_x,
        top: y,
        right: btn_x + btn_w,
        bottom: y + btn_h,
    };

    draw_rounded_rect(hdc, &btn_rect, CARD_RADIUS, CLR_BRAND, CLR_BRAND);
    draw_text_simple(
        hdc,
        &btn_text,
        btn_x + (btn_w - bw) / 2,
        y + (btn_h - bh) / 2,
        CLR_BACKGROUND,
        fonts.small_bold,
    );
    state.save_btn.rect = btn_rect;
}

fn draw_checkbox(hdc: HDC, x: i32, y: i32, checked: bool, disabled: bool) {
    let size = 18;
    let rect = RECT {
        left: x,
        top: y,
        right: x + size,
        bottom: y + size,
    };

    let (fill, border) = if disabled {
        (CLR_INPUT, CLR_BORDER)
    } else if checked {
        (CLR_BRAND, CLR_BRAND)
    } else {
        (CLR_BACKGROUND, CLR_MUTED_FG)
    };
    draw_rounded_rect(hdc, &rect, 4, fill, border);

    if checked && !disabled {
        unsafe {
            let pen = CreatePen(PS_SOLID, 2, CLR_BACKGROUND);
            let old_pen = SelectObject(hdc, HGDIOBJ::from(pen));
            let _ = MoveToEx(hdc, x + 4, y + 9, None);
            let _ = LineTo(hdc, x + 7, y + 13);
            let _ = LineTo(hdc, x + 14, y + 5);
            SelectObject(hdc, old_pen);
            let _ = DeleteObject(HGDIOBJ::from(pen));
        }
    }
}

fn draw_toggle(hdc: HDC, x: i32, y: i32, checked: bool) -> RECT {
    let w = 44;
    let h = 24;
    let rect = RECT {
        left: x,
        top: y,
        right: x + w,
        bottom: y + h,
    };

    let track_color = if checked { CLR_BRAND } else { CLR_INPUT };
    draw_rounded_rect(hdc, &rect, h / 2, track_color, track_color);

    let thumb_r = 10;
    let thumb_x = if checked {
        x + w - 2 - thumb_r
    } else {
        x + 2 + thumb_r
    };
    let thumb_cy = y + h / 2;
    draw_circle(hdc, thumb_x, thumb_cy, thumb_r, CLR_FOREGROUND);

    rect
}

fn draw_toast(hdc: HDC, client: &RECT, state: &UiState, fonts: &Fonts) {
    let msg = &state.toast_message;
    if msg.is_empty() {
        return;
    }

    let (tw, th) = measure_text(hdc, msg, fonts.small_bold);
    let toast_w = tw + 48;
    let toast_h = th + 24;
    let toast_x = (client.right - toast_w) / 2;
    let toast_y = client.bottom - toast_h - 24;

    let toast_rect = RECT {
        left: toast_x,
        top: toast_y,
        right: toast_x + toast_w,
        bottom: toast_y + toast_h,
    };
    draw_rounded_rect(hdc, &toast_rect, CARD_RADIUS, CLR_FOREGROUND, CLR_FOREGROUND);
    draw_text_simple(
        hdc,
        msg,
        toast_x + (toast_w - tw) / 2,
        toast_y + (toast_h - th) / 2,
        CLR_BACKGROUND,
        fonts.small_bold,
    );
}
