use chrono::{Datelike, NaiveDate};
use egui::{Color32, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

use super::theme;
use crate::interaction::GanttTaskController;
use crate::model::{DateSpan, GanttViewport, ItemId, ItemKind, Project, ScheduledItem};
use crate::store::ScheduleStore;

const ROW_HEIGHT: f32 = theme::ROW_HEIGHT;
const ROW_PADDING: f32 = theme::ROW_GAP;
const HEADER_HEIGHT: f32 = 44.0;
const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;
const LABEL_WIDTH: f32 = 170.0;

/// Pressable regions of one bar.
#[derive(Debug, Clone, Copy)]
pub struct BarHit {
    pub item_id: ItemId,
    pub bar: Rect,
    /// Trailing-edge resize handle.
    pub handle: Rect,
}

/// What the retroplanning view drew this frame, for pointer routing.
pub struct ChartLayout {
    /// Screen x of the project's first day, top of the header.
    pub origin: Pos2,
    pub viewport: GanttViewport,
    pub window: DateSpan,
    pub bars: Vec<BarHit>,
}

/// Render the retroplanning chart of one project (central panel).
pub fn show_gantt_chart(
    store: &ScheduleStore,
    drag: &GanttTaskController,
    project: &Project,
    ui: &mut Ui,
) -> ChartLayout {
    let window = project.window();
    let tasks: Vec<&ScheduledItem> = store
        .iter()
        .filter(|i| i.kind() == ItemKind::Range && i.project_id == Some(project.id))
        .collect();
    let dragged = drag.display_task();
    let available = ui.available_size();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .drag_to_scroll(false)
        .show(ui, |ui| {
            let width = ui.available_width();
            let chart_height =
                HEADER_HEIGHT + tasks.len() as f32 * (ROW_HEIGHT + ROW_PADDING) + 40.0;
            let (response, painter) = ui.allocate_painter(
                Vec2::new(width, chart_height.max(available.y)),
                Sense::hover(),
            );
            let canvas = response.rect;
            let origin = canvas.min + Vec2::new(LABEL_WIDTH, 0.0);
            let viewport = GanttViewport::for_window(&window, (width - LABEL_WIDTH).max(0.0));

            painter.rect_filled(canvas, 0.0, theme::BG_DARK);
            draw_timeline_header(&painter, origin, &viewport, canvas.bottom());

            let mut bars = Vec::with_capacity(tasks.len());
            for (i, task) in tasks.iter().enumerate() {
                let y = origin.y + HEADER_HEIGHT + i as f32 * (ROW_HEIGHT + ROW_PADDING);
                let row = Rect::from_min_size(
                    Pos2::new(canvas.left(), y),
                    Vec2::new(width, ROW_HEIGHT + ROW_PADDING),
                );
                painter.rect_filled(
                    row,
                    0.0,
                    if i % 2 == 0 { theme::BG_PANEL } else { theme::BG_DARK },
                );
                painter.line_segment(
                    [row.left_bottom(), row.right_bottom()],
                    Stroke::new(0.5, theme::BORDER_SUBTLE),
                );
                painter.text(
                    Pos2::new(canvas.left() + 8.0, row.center().y),
                    egui::Align2::LEFT_CENTER,
                    &task.title,
                    theme::font_bar(),
                    theme::TEXT_SECONDARY,
                );

                let Some(committed) = task.span() else {
                    continue;
                };
                let (span, is_dragged) = match dragged {
                    Some((id, display)) if id == task.id => (display, true),
                    _ => (committed, false),
                };
                if is_dragged {
                    // Outline where the task is committed.
                    if let Some(rect) = bar_rect(origin, &viewport, &committed, y) {
                        painter.rect_stroke(
                            rect,
                            Rounding::same(theme::BAR_ROUNDING),
                            Stroke::new(1.0, theme::TEXT_DIM),
                        );
                    }
                }
                let Some(rect) = bar_rect(origin, &viewport, &span, y) else {
                    continue;
                };
                draw_task_bar(&painter, rect, task, &span, store.is_pending(task.id));
                let handle = Rect::from_min_max(
                    Pos2::new(rect.right() - HANDLE_WIDTH, rect.top()),
                    Pos2::new(rect.right() + HANDLE_WIDTH * 0.5, rect.bottom()),
                );
                painter.rect_filled(
                    handle.shrink2(Vec2::new(2.5, 6.0)),
                    Rounding::same(1.5),
                    theme::HANDLE_COLOR.gamma_multiply(0.6),
                );
                bars.push(BarHit {
                    item_id: task.id,
                    bar: rect,
                    handle,
                });
            }

            draw_today_line(&painter, origin, &viewport, canvas.bottom());
            draw_hint_badge(&painter, canvas.min);
            if dragged.is_some() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
            }

            ChartLayout {
                origin,
                viewport,
                window,
                bars,
            }
        })
        .inner
}

fn bar_rect(origin: Pos2, viewport: &GanttViewport, span: &DateSpan, row_y: f32) -> Option<Rect> {
    let (left, right) = viewport.span_to_x(span)?;
    let inset = theme::BAR_INSET;
    Some(Rect::from_min_max(
        Pos2::new(origin.x + left, row_y + ROW_PADDING + inset),
        Pos2::new(
            origin.x + right.max(left + 6.0),
            row_y + ROW_PADDING + ROW_HEIGHT - inset,
        ),
    ))
}

fn draw_timeline_header(painter: &egui::Painter, origin: Pos2, viewport: &GanttViewport, bottom: f32) {
    let Some(ppd) = viewport.pixels_per_day() else {
        return;
    };
    let width = viewport.container_width_px;
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    let mut date = viewport.start;
    while date <= viewport.end {
        let x = origin.x + viewport.date_to_x(date).unwrap_or(0.0);
        painter.line_segment(
            [
                Pos2::new(x, origin.y + HEADER_HEIGHT),
                Pos2::new(x, bottom),
            ],
            Stroke::new(0.5, theme::GRID_LINE),
        );

        if ppd >= 18.0 {
            let day_color = if date.weekday().num_days_from_monday() >= 5 {
                theme::TEXT_DIM
            } else {
                theme::TEXT_SECONDARY
            };
            painter.text(
                Pos2::new(x + 3.0, origin.y + 28.0),
                egui::Align2::LEFT_CENTER,
                date.format("%d").to_string(),
                theme::font_sub(),
                day_color,
            );
        }

        if date == viewport.start || date.day() == 1 {
            painter.text(
                Pos2::new(x + 3.0, origin.y + 12.0),
                egui::Align2::LEFT_CENTER,
                date.format("%b %Y").to_string(),
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
        }

        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
}

fn draw_today_line(painter: &egui::Painter, origin: Pos2, viewport: &GanttViewport, bottom: f32) {
    let today: NaiveDate = chrono::Local::now().date_naive();
    if today < viewport.start || today > viewport.end {
        return;
    }
    let Some(x) = viewport.date_to_x(today).map(|x| origin.x + x) else {
        return;
    };

    painter.line_segment(
        [
            Pos2::new(x, origin.y + HEADER_HEIGHT),
            Pos2::new(x, bottom),
        ],
        Stroke::new(1.5, theme::NOW_LINE),
    );
    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, origin.y + HEADER_HEIGHT - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge_rect, Rounding::same(3.0), theme::NOW_LINE);
    painter.text(
        badge_rect.center(),
        egui::Align2::CENTER_CENTER,
        "Today",
        theme::font_small(),
        Color32::WHITE,
    );
}

fn draw_hint_badge(painter: &egui::Painter, at: Pos2) {
    let galley = painter.layout_no_wrap(
        "Drag bars to move · Drag the right edge to resize".to_string(),
        theme::font_small(),
        theme::TEXT_DIM,
    );
    let badge_rect = Rect::from_min_size(
        Pos2::new(at.x + 8.0, at.y + HEADER_HEIGHT - 18.0),
        Vec2::new(galley.size().x + 16.0, 16.0),
    );
    painter.rect_filled(
        badge_rect,
        Rounding::same(8.0),
        Color32::from_rgba_premultiplied(20, 20, 28, 200),
    );
    painter.galley(
        Pos2::new(badge_rect.left() + 8.0, badge_rect.top()),
        galley,
        Color32::TRANSPARENT,
    );
}

fn draw_task_bar(
    painter: &egui::Painter,
    bar_rect: Rect,
    task: &ScheduledItem,
    span: &DateSpan,
    is_pending: bool,
) {
    let rounding = Rounding::same(theme::BAR_ROUNDING);
    painter.rect_filled(
        bar_rect.translate(Vec2::new(1.0, 2.0)),
        rounding,
        Color32::from_black_alpha(35),
    );
    painter.rect_filled(bar_rect, rounding, theme::category_color(task.category));
    painter.rect_filled(
        Rect::from_min_size(
            bar_rect.min,
            Vec2::new(bar_rect.width(), (bar_rect.height() * 0.45).max(4.0)),
        ),
        Rounding {
            nw: theme::BAR_ROUNDING,
            ne: theme::BAR_ROUNDING,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_white_alpha(25),
    );
    if is_pending {
        painter.rect_stroke(
            bar_rect.expand(1.0),
            Rounding::same(theme::BAR_ROUNDING + 1.0),
            Stroke::new(1.0, Color32::from_white_alpha(90)),
        );
    }

    if bar_rect.width() > 30.0 {
        let label = format!("{} · {}d", task.title, span.duration_days());
        let galley = painter.layout_no_wrap(label, theme::font_bar(), theme::TEXT_ON_BAR);
        let clipped = painter.with_clip_rect(bar_rect);
        let text_y = bar_rect.top() + (bar_rect.height() - galley.size().y) / 2.0;
        clipped.galley(
            Pos2::new(bar_rect.left() + 6.0, text_y),
            galley,
            Color32::TRANSPARENT,
        );
    }
}
