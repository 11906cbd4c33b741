use egui::{Color32, FontId, Rounding, Stroke, Visuals};

use crate::model::ItemCategory;

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(24, 24, 32);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_WEEKEND: Color32 = Color32::from_rgb(27, 27, 35);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 45);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(90, 140, 220);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(255, 255, 255);

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const NOW_LINE: Color32 = Color32::from_rgb(240, 75, 75);
pub const GRID_LINE: Color32 = Color32::from_rgb(44, 46, 58);
pub const HALF_HOUR_LINE: Color32 = Color32::from_rgb(36, 38, 48);
pub const HANDLE_COLOR: Color32 = Color32::from_rgb(255, 255, 255);

pub const TOAST_ERROR: Color32 = Color32::from_rgb(150, 48, 48);
pub const TOAST_INFO: Color32 = Color32::from_rgb(52, 70, 110);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const ROW_HEIGHT: f32 = 30.0;
pub const ROW_GAP: f32 = 2.0;
pub const HANDLE_WIDTH: f32 = 7.0;
pub const BAR_ROUNDING: f32 = 5.0;
pub const BAR_INSET: f32 = 3.0; // vertical inset so bars don't touch row edges
pub const CARD_MIN_HEIGHT: f32 = 18.0;
pub const HOUR_GUTTER: f32 = 48.0;
pub const BACKLOG_WIDTH: f32 = 220.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

pub fn font_small() -> FontId {
    FontId::proportional(9.5)
}

// ── Item colors ──────────────────────────────────────────────────────────────

pub fn category_color(category: ItemCategory) -> Color32 {
    match category {
        ItemCategory::Deliverable => Color32::from_rgb(171, 71, 188),
        ItemCategory::Call => Color32::from_rgb(52, 168, 83),
        ItemCategory::Task => Color32::from_rgb(66, 133, 244),
    }
}

/// Faded variant drawn at the committed position while the item is dragged.
pub fn dragged_source(color: Color32) -> Color32 {
    color.gamma_multiply(0.35)
}

pub fn ghost(color: Color32) -> Color32 {
    color.gamma_multiply(0.75)
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = Color32::from_rgb(20, 20, 28);
    visuals.faint_bg_color = Color32::from_rgb(30, 30, 40);
    visuals.striped = false;

    let widgets = &mut visuals.widgets;
    widgets.noninteractive.bg_fill = BG_PANEL;
    widgets.noninteractive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    widgets.inactive.bg_fill = Color32::from_rgb(42, 44, 56);
    widgets.inactive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    widgets.hovered.bg_fill = Color32::from_rgb(52, 54, 68);
    widgets.hovered.bg_stroke = Stroke::new(1.0, ACCENT);
    widgets.active.bg_fill = Color32::from_rgb(60, 62, 76);
    widgets.active.bg_stroke = Stroke::new(1.0, ACCENT);
    widgets.open.bg_fill = Color32::from_rgb(50, 52, 66);
    widgets.open.bg_stroke = Stroke::new(1.0, ACCENT);
    for state in [
        &mut widgets.noninteractive,
        &mut widgets.inactive,
        &mut widgets.hovered,
        &mut widgets.active,
        &mut widgets.open,
    ] {
        state.rounding = Rounding::same(4.0);
    }
    widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    widgets.active.fg_stroke = Stroke::new(2.0, Color32::WHITE);
    widgets.open.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}
