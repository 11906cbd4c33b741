use egui::{Context, RichText, Window};

use crate::app::SchedulerApp;
use crate::model::{ItemKind, Schedule};
use crate::ui::theme;

/// Render the detail window of the clicked item.
pub fn show_item_detail(app: &mut SchedulerApp, ctx: &Context) {
    let Some(item) = app.detail_item.and_then(|id| app.store.get(id)).cloned() else {
        app.detail_item = None;
        return;
    };
    let project = item
        .project_id
        .and_then(|id| app.projects.iter().find(|p| p.id == id))
        .map(|p| p.name.clone());
    let pending = app.store.is_pending(item.id);

    let mut open = true;
    let mut unschedule = false;
    Window::new(RichText::new(&item.title).strong().size(14.0))
        .id(egui::Id::new(("item-detail", item.id)))
        .open(&mut open)
        .resizable(false)
        .collapsible(false)
        .default_width(280.0)
        .show(ctx, |ui| {
            egui::Grid::new("item-detail-grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Category").color(theme::TEXT_SECONDARY));
                    ui.label(item.category.label());
                    ui.end_row();

                    ui.label(RichText::new("Schedule").color(theme::TEXT_SECONDARY));
                    ui.label(item.schedule.describe());
                    ui.end_row();

                    if let Some(minutes) = item.duration_minutes {
                        ui.label(RichText::new("Duration").color(theme::TEXT_SECONDARY));
                        ui.label(format!("{minutes} min"));
                        ui.end_row();
                    }

                    ui.label(RichText::new("Project").color(theme::TEXT_SECONDARY));
                    ui.label(project.as_deref().unwrap_or("—"));
                    ui.end_row();
                });

            if pending {
                ui.add_space(6.0);
                ui.label(RichText::new("Saving…").small().color(theme::TEXT_DIM));
            }
            if item.kind() == ItemKind::Point && item.is_scheduled() {
                ui.add_space(8.0);
                if ui.button("Move to unscheduled").clicked() {
                    unschedule = true;
                }
            }
        });

    if unschedule {
        app.commit(item.id, Schedule::unscheduled());
    }
    if !open || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.detail_item = None;
    }
}

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut SchedulerApp, ctx: &Context) {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([300.0, 170.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Agency Timeline").strong());
                ui.add_space(2.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("Week scheduling and retroplanning");
                ui.label("built with Rust and egui.");
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_about = false;
    }
}
