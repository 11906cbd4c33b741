use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use chrono::Local;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::interaction::{DragController, DragEvent, DragMode, GanttTaskController};
use crate::io::{self, JsonFileRemote};
use crate::model::{ItemId, Project, SchedulePatch, ScheduledItem, TimeRange, Workspace};
use crate::store::{Persister, ScheduleStore, StoreEvent};
use crate::ui::{self, gantt_chart::ChartLayout, time_grid::GridLayout, Hitbox, PointerInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Week,
    Retroplanning,
}

/// Main application state.
pub struct SchedulerApp {
    pub config: SchedulerConfig,
    pub workspace_path: PathBuf,
    pub workspace_name: String,
    pub projects: Vec<Project>,
    pub store: ScheduleStore,
    persister: Persister,
    runtime: Handle,

    grid_drag: DragController,
    gantt_drag: GanttTaskController,

    pub view: View,
    pub week: TimeRange,
    pub selected_project: Option<Uuid>,
    pub detail_item: Option<ItemId>,
    pub show_about: bool,

    // Status message
    pub status_message: String,
    toasts: ui::notices::Toasts,

    /// Items the store dropped since the last frame.
    removed: Rc<RefCell<Vec<ItemId>>>,
    was_focused: bool,
}

impl SchedulerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, runtime: Handle) -> Self {
        ui::theme::apply_theme(&cc.egui_ctx);

        let config = SchedulerConfig::load_or_default(&SchedulerConfig::default_path());
        let workspace_path = SchedulerConfig::workspace_path();
        let (workspace, status_message) = open_workspace(&workspace_path);

        let remote =
            JsonFileRemote::new(&workspace_path).with_latency(config.simulated_latency());
        let ctx = cc.egui_ctx.clone();
        let persister = Persister::new(runtime.clone(), Arc::new(remote), config.persist_timeout())
            .with_wake(move || ctx.request_repaint());

        let removed = Rc::new(RefCell::new(Vec::new()));
        let store = build_store(workspace.items, &removed);
        let grid_drag = DragController::new(config.drag_threshold_px)
            .with_unscheduled_pool(config.unschedule_outside_grid);
        let gantt_drag = GanttTaskController::new(config.drag_threshold_px, config.snap_policy());

        Self {
            selected_project: workspace.projects.first().map(|p| p.id),
            workspace_name: workspace.name,
            projects: workspace.projects,
            store,
            persister,
            runtime,
            grid_drag,
            gantt_drag,
            view: View::Week,
            week: TimeRange::week_of(Local::now().date_naive()),
            detail_item: None,
            show_about: false,
            status_message,
            toasts: ui::notices::Toasts::default(),
            removed,
            was_focused: true,
            config,
            workspace_path,
        }
    }

    // --- Navigation ---

    pub fn shift_week(&mut self, days: i64) {
        self.cancel_drags();
        self.week.scroll_days(days);
    }

    pub fn go_to_today(&mut self) {
        self.cancel_drags();
        self.week = TimeRange::week_of(Local::now().date_naive());
    }

    pub fn cancel_drags(&mut self) {
        let grid = self.grid_drag.cancel();
        let gantt = self.gantt_drag.cancel();
        self.handle_drag_event(grid);
        self.handle_drag_event(gantt);
    }

    // --- Mutations ---

    /// Apply a schedule change locally and send it to the remote.
    pub fn commit(&mut self, item_id: ItemId, patch: SchedulePatch) {
        let summary = patch.describe();
        match self.store.apply(item_id, patch) {
            Ok(Some(dispatch)) => self.persister.dispatch(dispatch),
            Ok(None) => debug!(item = %item_id, "write queued behind an earlier one"),
            Err(e) => {
                warn!(item = %item_id, error = %e, "change rejected locally");
                self.status_message = format!("Could not apply change: {e}");
                return;
            }
        }
        let title = self
            .store
            .get(item_id)
            .map(|i| i.title.clone())
            .unwrap_or_default();
        self.status_message = format!("'{title}' → {summary}");
    }

    /// Replace local items with what the remote holds. Refused while writes
    /// are still pending.
    pub fn reload(&mut self) {
        if self.store.pending_count() > 0 {
            self.status_message = "Wait for pending changes to save before reloading".into();
            return;
        }
        self.cancel_drags();
        let remote = Arc::clone(self.persister.remote());
        match self.runtime.block_on(async move { remote.fetch_all().await }) {
            Ok(items) => {
                info!(count = items.len(), "items reloaded");
                self.status_message = format!("Reloaded {} items", items.len());
                self.store = build_store(items, &self.removed);
                self.detail_item = None;
            }
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.status_message = format!("Reload failed: {e}");
            }
        }
    }

    pub fn export_csv(&mut self) {
        if self.store.is_empty() {
            self.status_message = "Nothing to export".to_string();
            return;
        }
        let snapshot = Workspace {
            name: self.workspace_name.clone(),
            projects: self.projects.clone(),
            items: self.store.iter().cloned().collect(),
            ..Workspace::default()
        };
        let default_name = format!("{}.csv", self.workspace_name);
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(&default_name)
            .save_file()
        {
            match io::csv_export::export_csv(&snapshot, &path) {
                Ok(count) => {
                    self.status_message = format!("Exported {count} items to CSV");
                }
                Err(e) => {
                    self.status_message = format!("CSV export failed: {e}");
                }
            }
        }
    }

    // --- Pointer routing ---

    fn handle_drag_event(&mut self, event: Option<DragEvent>) {
        match event {
            Some(DragEvent::Committed { item_id, patch, .. }) => self.commit(item_id, patch),
            Some(DragEvent::Clicked { item_id }) => {
                let dispatch_click = match self.view {
                    View::Week => self.grid_drag.filter_click(item_id),
                    View::Retroplanning => self.gantt_drag.filter_click(item_id),
                };
                if dispatch_click {
                    self.detail_item = Some(item_id);
                }
            }
            Some(DragEvent::Started { .. })
            | Some(DragEvent::Preview { .. })
            | Some(DragEvent::Cancelled { .. })
            | None => {}
        }
    }

    /// Whether a press at `pos` lands on a panel rather than a window or
    /// popup drawn above it.
    fn press_reaches_canvas(ctx: &egui::Context, pos: egui::Pos2) -> bool {
        ctx.layer_id_at(pos)
            .map_or(true, |layer| layer.order == egui::Order::Background)
    }

    fn route_week(
        &mut self,
        ctx: &egui::Context,
        input: PointerInput,
        grid: &GridLayout,
        pool: &[Hitbox],
    ) {
        let Some(pos) = input.pos else {
            if input.released {
                let event = self.grid_drag.on_pointer_lost();
                self.handle_drag_event(event);
            }
            return;
        };
        let local = ui::local(pos, grid.origin);

        if input.pressed && Self::press_reaches_canvas(ctx, pos) {
            let target = ui::hit(&grid.cards, pos).or_else(|| ui::hit(pool, pos));
            if let Some(item) = target.and_then(|id| self.store.get(id)) {
                self.grid_drag.on_pointer_down(local, item);
            }
        }
        if !self.grid_drag.is_tracking() {
            return;
        }
        let event = self.grid_drag.on_pointer_move(local, &grid.model);
        self.handle_drag_event(event);
        if input.released {
            let event = self.grid_drag.on_pointer_up(local, &grid.model);
            self.handle_drag_event(event);
        }
    }

    fn route_chart(&mut self, ctx: &egui::Context, input: PointerInput, chart: &ChartLayout) {
        let Some(pos) = input.pos else {
            if input.released {
                let event = self.gantt_drag.on_pointer_lost();
                self.handle_drag_event(event);
            }
            return;
        };
        let local = ui::local(pos, chart.origin);

        if input.pressed && Self::press_reaches_canvas(ctx, pos) {
            let target = chart
                .bars
                .iter()
                .rev()
                .find(|b| b.handle.contains(pos) || b.bar.contains(pos));
            if let Some(bar) = target {
                let mode = if bar.handle.contains(pos) {
                    DragMode::Resize
                } else {
                    DragMode::Move
                };
                if let Some(item) = self.store.get(bar.item_id) {
                    self.gantt_drag
                        .on_pointer_down(local, item, mode, chart.window);
                }
            }
        }
        if !self.gantt_drag.is_tracking() {
            return;
        }
        let event = self.gantt_drag.on_pointer_move(local, &chart.viewport);
        self.handle_drag_event(event);
        if input.released {
            let event = self.gantt_drag.on_pointer_up(local, &chart.viewport);
            self.handle_drag_event(event);
        }
    }

    fn show_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal_centered(|ui| {
            ui.label(egui::RichText::new(&self.status_message).size(11.0));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let pending = self.store.pending_count();
                let saving = if pending > 0 {
                    format!("Saving {pending} change(s)…")
                } else {
                    "All changes saved".to_string()
                };
                ui.label(egui::RichText::new(saving).size(11.0).weak());
                ui.separator();
                ui.label(
                    egui::RichText::new(format!("{} items", self.store.len()))
                        .size(11.0)
                        .weak(),
                );
            });
        });
    }
}

impl eframe::App for SchedulerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Remote outcomes first, so this frame renders reconciled data.
        self.persister.pump(&mut self.store);
        for notice in self.store.drain_notices() {
            self.status_message = notice.message.clone();
            self.toasts.push(notice);
        }
        let removed: Vec<ItemId> = self.removed.borrow_mut().drain(..).collect();
        if self.detail_item.is_some_and(|id| removed.contains(&id)) {
            self.detail_item = None;
        }

        let input = PointerInput::read(ctx);
        if input.escape {
            self.cancel_drags();
        }
        if self.was_focused && !input.window_focused {
            let grid = self.grid_drag.on_pointer_lost();
            let gantt = self.gantt_drag.on_pointer_lost();
            self.handle_drag_event(grid);
            self.handle_drag_event(gantt);
        }
        self.was_focused = input.window_focused;

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .show(ctx, |ui| self.show_status_bar(ui));

        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);

        match self.view {
            View::Week => {
                let pool = egui::SidePanel::left("unscheduled_pool")
                    .resizable(false)
                    .exact_width(ui::theme::BACKLOG_WIDTH)
                    .show(ctx, |ui| ui::backlog::show_backlog(&self.store, &self.grid_drag, ui))
                    .inner;
                let grid = egui::CentralPanel::default()
                    .frame(chart_frame)
                    .show(ctx, |ui| {
                        ui::time_grid::show_time_grid(
                            &self.store,
                            &self.grid_drag,
                            &self.config,
                            self.week,
                            ui,
                        )
                    })
                    .inner;
                self.route_week(ctx, input, &grid, &pool);
            }
            View::Retroplanning => {
                let project = self
                    .selected_project
                    .and_then(|id| self.projects.iter().find(|p| p.id == id));
                let chart = egui::CentralPanel::default()
                    .frame(chart_frame)
                    .show(ctx, |ui| match project {
                        Some(project) => Some(ui::gantt_chart::show_gantt_chart(
                            &self.store,
                            &self.gantt_drag,
                            project,
                            ui,
                        )),
                        None => {
                            ui.centered_and_justified(|ui| {
                                ui.label("Select a project to plan.");
                            });
                            None
                        }
                    })
                    .inner;
                if let Some(chart) = chart {
                    self.route_chart(ctx, input, &chart);
                }
            }
        }

        if self.detail_item.is_some() {
            ui::dialogs::show_item_detail(self, ctx);
        }
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
        self.toasts.show(ctx);

        if self.grid_drag.is_tracking() || self.gantt_drag.is_tracking() {
            ctx.request_repaint();
        }
    }
}

/// Store over `items`, reporting removals into `removed`.
fn build_store(items: Vec<ScheduledItem>, removed: &Rc<RefCell<Vec<ItemId>>>) -> ScheduleStore {
    let mut store = ScheduleStore::from_entities(items);
    let sink = Rc::clone(removed);
    store.subscribe(move |event| {
        if let StoreEvent::Removed(id) = event {
            sink.borrow_mut().push(*id);
        }
    });
    store
}

/// Load the workspace document, seeding a sample one on first run.
fn open_workspace(path: &Path) -> (Workspace, String) {
    if path.exists() {
        return match io::load_workspace(path) {
            Ok(ws) => {
                info!(path = %path.display(), items = ws.items.len(), "workspace loaded");
                let status = format!("Loaded {} items", ws.items.len());
                (ws, status)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "workspace unreadable");
                (
                    Workspace::sample(Local::now().date_naive()),
                    format!("Could not read workspace ({e}); changes will not be saved"),
                )
            }
        };
    }

    let ws = Workspace::sample(Local::now().date_naive());
    let status = match io::save_workspace(&ws, path) {
        Ok(()) => {
            info!(path = %path.display(), "sample workspace created");
            "Created a sample workspace".to_string()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not write sample workspace");
            format!("Could not create workspace file: {e}")
        }
    };
    (ws, status)
}
