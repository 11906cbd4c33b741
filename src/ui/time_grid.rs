use egui::{Align2, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

use super::{local, theme, Hitbox};
use crate::config::SchedulerConfig;
use crate::interaction::DragController;
use crate::model::{GridPoint, PixelRect, Schedule, ScheduledItem, TimeGridModel, TimeRange};
use crate::store::ScheduleStore;

/// Card length for items without an explicit duration.
const DEFAULT_CARD_MINUTES: u32 = 30;

/// What the week view drew this frame, for pointer routing.
pub struct GridLayout {
    /// Screen position of grid pixel (0, 0): top-left of the first column
    /// header.
    pub origin: Pos2,
    pub model: TimeGridModel,
    pub cards: Vec<Hitbox>,
}

/// Render the week time grid (central panel).
pub fn show_time_grid(
    store: &ScheduleStore,
    drag: &DragController,
    config: &SchedulerConfig,
    week: TimeRange,
    ui: &mut Ui,
) -> GridLayout {
    let available = ui.available_size();
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .drag_to_scroll(false)
        .show(ui, |ui| {
            let width = ui.available_width();
            let geometry = config.geometry(week, (width - theme::HOUR_GUTTER).max(0.0));
            let model = TimeGridModel::new(&geometry, config.snap_policy());
            let height = model.header_height_px() + model.band_height_px() + 8.0;

            let (response, painter) =
                ui.allocate_painter(Vec2::new(width, height.max(available.y)), Sense::hover());
            let origin = response.rect.min + Vec2::new(theme::HOUR_GUTTER, 0.0);
            // Only the scrolled-in part of the canvas can receive a drop.
            let visible = response.rect.intersect(ui.clip_rect());
            let model = model.with_canvas(PixelRect::new(
                local(visible.min, origin),
                local(visible.max, origin),
            ));
            painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

            draw_columns(&painter, origin, &model, response.rect.bottom());
            draw_hour_rows(&painter, response.rect.left(), origin, &model);
            draw_now_marker(&painter, origin, &model);

            let dragged = drag.preview();
            let mut cards = Vec::new();
            for item in store.iter() {
                let Some(point) = item.anchor().and_then(|at| model.forward(at)) else {
                    continue;
                };
                let rect = card_rect(origin, &model, point, item);
                let is_dragged = dragged.is_some_and(|(id, _)| id == item.id);
                draw_card(&painter, rect, item, is_dragged, store.is_pending(item.id));
                cards.push(Hitbox {
                    item_id: item.id,
                    rect,
                });
            }

            // Ghost at the proposed slot; nothing while over an invalid target.
            if let Some((item_id, Some(patch))) = dragged {
                let proposed = match patch {
                    Schedule::Point { scheduled_at } => *scheduled_at,
                    Schedule::Range(_) => None,
                };
                if let (Some(item), Some(at)) = (store.get(item_id), proposed) {
                    if let Some(point) = model.forward(at) {
                        let rect = card_rect(origin, &model, point, item);
                        draw_ghost(&painter, rect, item, &at.format("%H:%M").to_string());
                    }
                }
                ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
            }

            GridLayout {
                origin,
                model,
                cards,
            }
        })
        .inner
}

fn card_rect(origin: Pos2, model: &TimeGridModel, point: GridPoint, item: &ScheduledItem) -> Rect {
    let column_width = model
        .columns()
        .get(point.column_index)
        .map(|c| c.width_px)
        .unwrap_or(0.0);
    let minutes = item.duration_minutes.unwrap_or(DEFAULT_CARD_MINUTES) as f32;
    let height = (minutes * model.hour_height_px() / 60.0).max(theme::CARD_MIN_HEIGHT);
    Rect::from_min_size(
        Pos2::new(origin.x + point.pixel_x + 2.0, origin.y + point.pixel_y),
        Vec2::new((column_width - 4.0).max(4.0), height),
    )
}

fn draw_columns(painter: &egui::Painter, origin: Pos2, model: &TimeGridModel, bottom: f32) {
    let header = model.header_height_px();
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(model.total_width_px(), header)),
        0.0,
        theme::BG_HEADER,
    );

    for column in model.columns() {
        let left = origin.x + column.left_offset_px;
        if column.is_weekend && column.width_px > 0.0 {
            painter.rect_filled(
                Rect::from_min_max(
                    Pos2::new(left, origin.y + header),
                    Pos2::new(left + column.width_px, bottom),
                ),
                0.0,
                theme::BG_WEEKEND,
            );
        }
        painter.line_segment(
            [Pos2::new(left, origin.y), Pos2::new(left, bottom)],
            Stroke::new(0.5, theme::GRID_LINE),
        );

        let label = if column.width_px >= 60.0 {
            column.date.format("%a %d").to_string()
        } else {
            column.date.format("%d").to_string()
        };
        let color = if column.is_weekend {
            theme::TEXT_DIM
        } else {
            theme::TEXT_SECONDARY
        };
        painter.text(
            Pos2::new(left + column.width_px / 2.0, origin.y + header / 2.0),
            Align2::CENTER_CENTER,
            label,
            theme::font_header(),
            color,
        );
    }

    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + header),
            Pos2::new(origin.x + model.total_width_px(), origin.y + header),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
}

fn draw_hour_rows(painter: &egui::Painter, gutter_left: f32, origin: Pos2, model: &TimeGridModel) {
    let right = origin.x + model.total_width_px();
    let hours = model.band_minutes() / 60;
    for h in 0..=hours {
        let y = origin.y + model.y_for_minutes((h * 60) as f32);
        painter.line_segment(
            [Pos2::new(origin.x, y), Pos2::new(right, y)],
            Stroke::new(0.5, theme::GRID_LINE),
        );
        painter.text(
            Pos2::new(gutter_left + 6.0, y),
            Align2::LEFT_CENTER,
            format!("{:02}:00", model.start_hour() + h),
            theme::font_small(),
            theme::TEXT_DIM,
        );
        if h < hours {
            let half = origin.y + model.y_for_minutes((h * 60 + 30) as f32);
            painter.line_segment(
                [Pos2::new(origin.x, half), Pos2::new(right, half)],
                Stroke::new(0.5, theme::HALF_HOUR_LINE),
            );
        }
    }
}

fn draw_now_marker(painter: &egui::Painter, origin: Pos2, model: &TimeGridModel) {
    let now = chrono::Local::now().naive_local();
    let Some(point) = model.now_marker(now) else {
        return;
    };
    let Some(column) = model.columns().get(point.column_index) else {
        return;
    };
    let y = origin.y + point.pixel_y;
    let left = origin.x + point.pixel_x;
    painter.line_segment(
        [Pos2::new(left, y), Pos2::new(left + column.width_px, y)],
        Stroke::new(1.5, theme::NOW_LINE),
    );
    painter.circle_filled(Pos2::new(left, y), 3.5, theme::NOW_LINE);
}

fn draw_card(
    painter: &egui::Painter,
    rect: Rect,
    item: &ScheduledItem,
    is_dragged: bool,
    is_pending: bool,
) {
    let base = theme::category_color(item.category);
    let fill = if is_dragged {
        theme::dragged_source(base)
    } else {
        base
    };
    let rounding = Rounding::same(4.0);
    painter.rect_filled(
        rect.translate(Vec2::new(1.0, 1.5)),
        rounding,
        egui::Color32::from_black_alpha(35),
    );
    painter.rect_filled(rect, rounding, fill);
    if is_pending {
        painter.rect_stroke(
            rect,
            rounding,
            Stroke::new(1.0, egui::Color32::from_white_alpha(90)),
        );
    }
    card_label(painter, rect, &item.title, None);
}

fn draw_ghost(painter: &egui::Painter, rect: Rect, item: &ScheduledItem, time: &str) {
    let rounding = Rounding::same(4.0);
    painter.rect_filled(rect, rounding, theme::ghost(theme::category_color(item.category)));
    painter.rect_stroke(rect, rounding, Stroke::new(1.5, theme::BORDER_ACCENT));
    card_label(painter, rect, &item.title, Some(time));
}

fn card_label(painter: &egui::Painter, rect: Rect, title: &str, time: Option<&str>) {
    if rect.width() < 20.0 {
        return;
    }
    let text = match time {
        Some(time) => format!("{time}  {title}"),
        None => title.to_string(),
    };
    let galley = painter.layout_no_wrap(text, theme::font_bar(), theme::TEXT_ON_BAR);
    let clipped = painter.with_clip_rect(rect);
    clipped.galley(
        Pos2::new(rect.left() + 4.0, rect.top() + 2.0),
        galley,
        egui::Color32::TRANSPARENT,
    );
}
