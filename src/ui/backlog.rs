use egui::{Pos2, RichText, Rounding, Sense, Stroke, Ui, Vec2};

use super::{theme, Hitbox};
use crate::interaction::DragController;
use crate::model::ItemKind;
use crate::store::ScheduleStore;

const CARD_HEIGHT: f32 = 28.0;

/// Render the unscheduled pool (left side panel). Returns the card
/// hitboxes; the whole panel lies outside the grid, so releasing a dragged
/// card here unschedules it.
pub fn show_backlog(store: &ScheduleStore, drag: &DragController, ui: &mut Ui) -> Vec<Hitbox> {
    let pool: Vec<_> = store
        .iter()
        .filter(|i| i.kind() == ItemKind::Point && !i.is_scheduled())
        .collect();

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.label(RichText::new("Unscheduled").strong());
        ui.label(RichText::new(pool.len().to_string()).weak());
    });
    ui.add_space(4.0);

    let dragged = drag.preview().map(|(id, _)| id);
    let mut cards = Vec::with_capacity(pool.len());
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .drag_to_scroll(false)
        .show(ui, |ui| {
            for item in pool {
                let (rect, _) = ui.allocate_exact_size(
                    Vec2::new(ui.available_width(), CARD_HEIGHT),
                    Sense::hover(),
                );
                let painter = ui.painter_at(rect);
                let base = theme::category_color(item.category);
                let fill = if dragged == Some(item.id) {
                    theme::dragged_source(base)
                } else {
                    base
                };
                painter.rect_filled(rect, Rounding::same(theme::BAR_ROUNDING), fill);
                if store.is_pending(item.id) {
                    painter.rect_stroke(
                        rect,
                        Rounding::same(theme::BAR_ROUNDING),
                        Stroke::new(1.0, egui::Color32::from_white_alpha(90)),
                    );
                }
                painter.text(
                    Pos2::new(rect.left() + 8.0, rect.center().y),
                    egui::Align2::LEFT_CENTER,
                    format!("{} · {}", item.category.label(), item.title),
                    theme::font_bar(),
                    theme::TEXT_ON_BAR,
                );
                cards.push(Hitbox {
                    item_id: item.id,
                    rect,
                });
                ui.add_space(theme::ROW_GAP * 2.0);
            }
            if cards.is_empty() {
                ui.label(
                    RichText::new("Drop a card here to unschedule it.")
                        .small()
                        .color(theme::TEXT_DIM),
                );
            }
        });
    cards
}
