use egui::{menu, RichText, Ui};

use crate::app::{SchedulerApp, View};
use crate::ui::theme;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut SchedulerApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_header()), |ui| {
            if ui.button("  Reload from disk").clicked() {
                app.reload();
                ui.close_menu();
            }
            if ui.button("  Export CSV...").clicked() {
                app.export_csv();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_header()), |ui| {
            if ui.radio_value(&mut app.view, View::Week, "Week").clicked() {
                app.cancel_drags();
                ui.close_menu();
            }
            if ui
                .radio_value(&mut app.view, View::Retroplanning, "Retroplanning")
                .clicked()
            {
                app.cancel_drags();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Help  ").font(theme::font_header()), |ui| {
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        ui.separator();
        match app.view {
            View::Week => week_navigation(app, ui),
            View::Retroplanning => project_selector(app, ui),
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(app.workspace_name.as_str()).size(11.0).weak());
        });
    });
}

fn week_navigation(app: &mut SchedulerApp, ui: &mut Ui) {
    if ui.button("◀").on_hover_text("Previous week").clicked() {
        app.shift_week(-7);
    }
    if ui.button("Today").clicked() {
        app.go_to_today();
    }
    if ui.button("▶").on_hover_text("Next week").clicked() {
        app.shift_week(7);
    }
    let start = app.week.start().date();
    let last = app.week.dates().last().copied().unwrap_or(start);
    ui.label(
        RichText::new(format!(
            "{} – {}",
            start.format("%d %b"),
            last.format("%d %b %Y")
        ))
        .color(theme::TEXT_SECONDARY),
    );
}

fn project_selector(app: &mut SchedulerApp, ui: &mut Ui) {
    let current = app
        .selected_project
        .and_then(|id| app.projects.iter().find(|p| p.id == id))
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "Select project".to_string());
    let mut picked = app.selected_project;
    egui::ComboBox::from_id_salt("project-selector")
        .selected_text(current)
        .show_ui(ui, |ui| {
            for project in &app.projects {
                ui.selectable_value(&mut picked, Some(project.id), &project.name);
            }
        });
    if picked != app.selected_project {
        app.cancel_drags();
        app.selected_project = picked;
    }
}
