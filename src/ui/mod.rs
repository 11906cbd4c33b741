pub mod backlog;
pub mod dialogs;
pub mod gantt_chart;
pub mod notices;
pub mod theme;
pub mod time_grid;
pub mod toolbar;

use egui::{Pos2, Rect};

use crate::model::{ItemId, PixelPos};

/// Raw pointer state for one frame, read once and routed into the drag
/// controllers by the app.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerInput {
    pub pressed: bool,
    pub released: bool,
    pub pos: Option<Pos2>,
    pub escape: bool,
    pub window_focused: bool,
}

impl PointerInput {
    pub fn read(ctx: &egui::Context) -> Self {
        ctx.input(|i| Self {
            pressed: i.pointer.primary_pressed(),
            released: i.pointer.primary_released(),
            pos: i.pointer.interact_pos().or_else(|| i.pointer.hover_pos()),
            escape: i.key_pressed(egui::Key::Escape),
            window_focused: i.focused,
        })
    }
}

/// Screen rectangle of a pressable item.
#[derive(Debug, Clone, Copy)]
pub struct Hitbox {
    pub item_id: ItemId,
    pub rect: Rect,
}

/// Topmost hitbox under `pos`; later entries are drawn on top.
pub fn hit(hitboxes: &[Hitbox], pos: Pos2) -> Option<ItemId> {
    hitboxes
        .iter()
        .rev()
        .find(|h| h.rect.contains(pos))
        .map(|h| h.item_id)
}

/// Screen position relative to a canvas origin.
pub fn local(pos: Pos2, origin: Pos2) -> PixelPos {
    PixelPos::new(pos.x - origin.x, pos.y - origin.y)
}
