use tracing::{debug, info};

use super::gesture::{DragMode, DragSession, GesturePhase, GestureTracker, Motion};
use super::DragEvent;
use crate::model::{
    ItemId, ItemKind, PixelPos, Schedule, SchedulePatch, ScheduledItem, TimeGridModel,
};

/// Drag controller for point items (deliverables, calls) on the time grid.
///
/// The session's display value is the proposed schedule under the pointer,
/// `None` while the pointer is over an invalid target.
#[derive(Debug, Clone)]
pub struct DragController {
    gesture: GestureTracker<Option<SchedulePatch>>,
    unschedule_outside_grid: bool,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(super::DEFAULT_DRAG_THRESHOLD_PX)
    }
}

impl DragController {
    pub fn new(threshold_px: f32) -> Self {
        Self {
            gesture: GestureTracker::new(threshold_px),
            unschedule_outside_grid: true,
        }
    }

    /// Whether a release outside the grid sends the item to the unscheduled
    /// pool. Enabled by default.
    pub fn with_unscheduled_pool(mut self, enabled: bool) -> Self {
        self.unschedule_outside_grid = enabled;
        self
    }

    pub fn phase(&self) -> GesturePhase {
        self.gesture.phase()
    }

    pub fn is_tracking(&self) -> bool {
        self.gesture.is_tracking()
    }

    /// Item currently being dragged past the threshold.
    pub fn dragged_item(&self) -> Option<ItemId> {
        self.gesture
            .session()
            .filter(|s| s.has_crossed_threshold)
            .map(|s| s.item_id)
    }

    /// Ghost preview for the dragged item. The inner `None` means the
    /// pointer is over an invalid target and the item shows at its origin.
    pub fn preview(&self) -> Option<(ItemId, Option<&SchedulePatch>)> {
        self.gesture
            .session()
            .filter(|s| s.has_crossed_threshold)
            .map(|s| (s.item_id, s.display.as_ref()))
    }

    /// Press on a draggable item. Ignored (returns `false`) for range items
    /// or while another session is active.
    pub fn on_pointer_down(&mut self, pos: PixelPos, item: &ScheduledItem) -> bool {
        if item.kind() != ItemKind::Point {
            return false;
        }
        self.gesture.press(DragSession {
            item_id: item.id,
            mode: DragMode::Move,
            original_item: item.clone(),
            pointer_origin: pos,
            has_crossed_threshold: false,
            display: None,
        })
    }

    pub fn on_pointer_move(&mut self, pos: PixelPos, grid: &TimeGridModel) -> Option<DragEvent> {
        let motion = self.gesture.motion(pos);
        if matches!(motion, Motion::Ignored | Motion::Absorbed) {
            return None;
        }
        let proposed = self.resolve_target(pos, grid);
        let session = self.gesture.session_mut()?;
        session.display = proposed.clone();
        let item_id = session.item_id;
        Some(match motion {
            Motion::Started => DragEvent::Started { item_id },
            _ => DragEvent::Preview { item_id, proposed },
        })
    }

    pub fn on_pointer_up(&mut self, pos: PixelPos, grid: &TimeGridModel) -> Option<DragEvent> {
        let target = self.resolve_target(pos, grid);
        let session = self.gesture.finish()?;
        let item_id = session.item_id;
        if !session.has_crossed_threshold {
            return Some(DragEvent::Clicked { item_id });
        }
        match target {
            Some(patch) if patch != session.original_item.schedule => {
                info!(item = %item_id, schedule = %patch.describe(), "drop committed");
                self.gesture.suppress_click_for(item_id);
                Some(DragEvent::Committed {
                    item_id,
                    kind: ItemKind::Point,
                    patch,
                })
            }
            _ => {
                debug!(item = %item_id, "drop on invalid or unchanged target");
                Some(DragEvent::Cancelled { item_id })
            }
        }
    }

    /// Explicit cancellation (escape). Nothing is committed.
    pub fn cancel(&mut self) -> Option<DragEvent> {
        let session = self.gesture.finish()?;
        debug!(item = %session.item_id, "drag cancelled");
        session
            .has_crossed_threshold
            .then_some(DragEvent::Cancelled {
                item_id: session.item_id,
            })
    }

    /// The host lost pointer capture (window blur, touch cancel).
    pub fn on_pointer_lost(&mut self) -> Option<DragEvent> {
        self.cancel()
    }

    /// Returns `true` when a native click on `item_id` should open it.
    pub fn filter_click(&mut self, item_id: ItemId) -> bool {
        self.gesture.filter_click(item_id)
    }

    fn resolve_target(&self, pos: PixelPos, grid: &TimeGridModel) -> Option<SchedulePatch> {
        if !grid.drop_area().contains(pos) {
            return self.unschedule_outside_grid.then(Schedule::unscheduled);
        }
        grid.inverse(pos.x, pos.y)
            .map(|slot| Schedule::at(slot.to_datetime()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GridGeometry, ItemCategory, PixelRect, SnapPolicy, TimeRange};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    fn grid() -> TimeGridModel {
        TimeGridModel::new(
            &GridGeometry {
                range: TimeRange::week_of(monday()),
                container_width_px: 600.0,
                weekend_ratio: 0.5,
                start_hour: 8,
                end_hour: 20,
                hour_height_px: 48.0,
                header_height_px: 40.0,
            },
            SnapPolicy::default(),
        )
    }

    fn at(day: i64, h: u32, m: u32) -> NaiveDateTime {
        (monday() + Duration::days(day)).and_hms_opt(h, m, 0).unwrap()
    }

    fn call_at(day: i64, h: u32) -> ScheduledItem {
        ScheduledItem::new_point("Client call", ItemCategory::Call, Some(at(day, h, 0)))
    }

    fn pos_for(grid: &TimeGridModel, instant: NaiveDateTime) -> PixelPos {
        let p = grid.forward(instant).unwrap();
        PixelPos::new(p.pixel_x + 10.0, p.pixel_y)
    }

    #[test]
    fn small_motion_is_a_click_not_a_commit() {
        let grid = grid();
        let item = call_at(0, 9);
        let mut ctl = DragController::default();
        let origin = pos_for(&grid, at(0, 9, 0));

        assert!(ctl.on_pointer_down(origin, &item));
        let nudged = PixelPos::new(origin.x + 2.0, origin.y + 3.0);
        assert_eq!(ctl.on_pointer_move(nudged, &grid), None);
        assert_eq!(ctl.phase(), GesturePhase::Armed);
        assert_eq!(
            ctl.on_pointer_up(nudged, &grid),
            Some(DragEvent::Clicked { item_id: item.id })
        );
        assert!(ctl.filter_click(item.id));
        assert!(!ctl.is_tracking());
    }

    #[test]
    fn drop_commits_snapped_time_and_suppresses_click() {
        let grid = grid();
        let item = call_at(0, 9);
        let mut ctl = DragController::default();
        assert!(ctl.on_pointer_down(pos_for(&grid, at(0, 9, 0)), &item));

        // Tuesday 10:17 resolves to the 10:30 tick.
        let target = PixelPos::new(150.0, grid.y_for_minutes(137.0));
        assert_eq!(
            ctl.on_pointer_move(target, &grid),
            Some(DragEvent::Started { item_id: item.id })
        );
        assert_eq!(ctl.preview(), Some((item.id, Some(&Schedule::at(at(1, 10, 30))))));
        assert_eq!(
            ctl.on_pointer_up(target, &grid),
            Some(DragEvent::Committed {
                item_id: item.id,
                kind: ItemKind::Point,
                patch: Schedule::at(at(1, 10, 30)),
            })
        );
        assert!(!ctl.is_tracking());
        assert!(!ctl.filter_click(item.id));
        assert!(ctl.filter_click(item.id));
    }

    #[test]
    fn weekend_drop_is_cancelled_and_item_untouched() {
        let grid = grid();
        let item = call_at(2, 11);
        let before = item.clone();
        let mut ctl = DragController::default();
        assert!(ctl.on_pointer_down(pos_for(&grid, at(2, 11, 0)), &item));

        let saturday = grid.columns()[5];
        let target = PixelPos::new(saturday.left_offset_px + 5.0, grid.y_for_minutes(90.0));
        assert_eq!(
            ctl.on_pointer_move(target, &grid),
            Some(DragEvent::Started { item_id: item.id })
        );
        assert_eq!(ctl.preview(), Some((item.id, None)));
        assert_eq!(
            ctl.on_pointer_up(target, &grid),
            Some(DragEvent::Cancelled { item_id: item.id })
        );
        assert_eq!(item, before);
        assert!(ctl.filter_click(item.id));
    }

    #[test]
    fn second_press_during_drag_is_ignored() {
        let grid = grid();
        let first = call_at(0, 9);
        let second = call_at(1, 9);
        let mut ctl = DragController::default();
        assert!(ctl.on_pointer_down(pos_for(&grid, at(0, 9, 0)), &first));
        ctl.on_pointer_move(PixelPos::new(120.0, 200.0), &grid);
        assert!(!ctl.on_pointer_down(pos_for(&grid, at(1, 9, 0)), &second));
        assert_eq!(ctl.dragged_item(), Some(first.id));
    }

    #[test]
    fn release_outside_grid_unschedules() {
        let grid = grid();
        let item = call_at(0, 9);
        let mut ctl = DragController::default();
        assert!(ctl.on_pointer_down(pos_for(&grid, at(0, 9, 0)), &item));
        let outside = PixelPos::new(-80.0, 200.0);
        ctl.on_pointer_move(outside, &grid);
        assert_eq!(
            ctl.on_pointer_up(outside, &grid),
            Some(DragEvent::Committed {
                item_id: item.id,
                kind: ItemKind::Point,
                patch: Schedule::unscheduled(),
            })
        );
    }

    #[test]
    fn release_outside_grid_without_pool_cancels() {
        let grid = grid();
        let item = call_at(0, 9);
        let mut ctl = DragController::default().with_unscheduled_pool(false);
        assert!(ctl.on_pointer_down(pos_for(&grid, at(0, 9, 0)), &item));
        let outside = PixelPos::new(-80.0, 200.0);
        ctl.on_pointer_move(outside, &grid);
        assert_eq!(
            ctl.on_pointer_up(outside, &grid),
            Some(DragEvent::Cancelled { item_id: item.id })
        );
    }

    #[test]
    fn release_on_painted_grid_below_the_band_cancels() {
        // Canvas with a 48 px hour gutter and blank space under 20:00.
        let grid = grid().with_canvas(PixelRect::new(
            PixelPos::new(-48.0, 0.0),
            PixelPos::new(600.0, 900.0),
        ));
        let item = call_at(0, 9);
        let mut ctl = DragController::default();

        for target in [
            PixelPos::new(150.0, grid.y_for_minutes(720.0) + 10.0),
            PixelPos::new(-20.0, grid.y_for_minutes(120.0)),
        ] {
            assert!(ctl.on_pointer_down(pos_for(&grid, at(0, 9, 0)), &item));
            ctl.on_pointer_move(target, &grid);
            assert_eq!(ctl.preview(), Some((item.id, None)));
            assert_eq!(
                ctl.on_pointer_up(target, &grid),
                Some(DragEvent::Cancelled { item_id: item.id })
            );
        }

        // Past the painted canvas the pool still takes it.
        assert!(ctl.on_pointer_down(pos_for(&grid, at(0, 9, 0)), &item));
        let beside = PixelPos::new(-120.0, 300.0);
        ctl.on_pointer_move(beside, &grid);
        assert_eq!(
            ctl.on_pointer_up(beside, &grid),
            Some(DragEvent::Committed {
                item_id: item.id,
                kind: ItemKind::Point,
                patch: Schedule::unscheduled(),
            })
        );
    }

    #[test]
    fn backlog_item_dropped_on_grid_gets_scheduled() {
        let grid = grid();
        let item = ScheduledItem::new_point("Press kit", ItemCategory::Deliverable, None);
        let mut ctl = DragController::default();
        assert!(ctl.on_pointer_down(PixelPos::new(-120.0, 300.0), &item));
        let target = PixelPos::new(10.0, grid.y_for_minutes(60.0));
        ctl.on_pointer_move(target, &grid);
        assert_eq!(
            ctl.on_pointer_up(target, &grid),
            Some(DragEvent::Committed {
                item_id: item.id,
                kind: ItemKind::Point,
                patch: Schedule::at(at(0, 9, 0)),
            })
        );
    }

    #[test]
    fn every_exit_path_stops_tracking() {
        let grid = grid();
        let item = call_at(0, 9);
        let origin = pos_for(&grid, at(0, 9, 0));
        let far = PixelPos::new(origin.x + 40.0, origin.y + 40.0);

        let mut ctl = DragController::default();
        ctl.on_pointer_down(origin, &item);
        ctl.on_pointer_move(far, &grid);
        assert_eq!(ctl.cancel(), Some(DragEvent::Cancelled { item_id: item.id }));
        assert!(!ctl.is_tracking());

        ctl.on_pointer_down(origin, &item);
        ctl.on_pointer_move(far, &grid);
        assert_eq!(
            ctl.on_pointer_lost(),
            Some(DragEvent::Cancelled { item_id: item.id })
        );
        assert!(!ctl.is_tracking());

        ctl.on_pointer_down(origin, &item);
        assert_eq!(ctl.cancel(), None);
        assert!(!ctl.is_tracking());
    }

    #[test]
    fn dropping_on_the_same_slot_commits_nothing() {
        let grid = grid();
        let item = call_at(0, 9);
        let origin = pos_for(&grid, at(0, 9, 0));
        let mut ctl = DragController::default();
        ctl.on_pointer_down(origin, &item);
        let wiggle = PixelPos::new(origin.x + 6.0, origin.y + 2.0);
        ctl.on_pointer_move(wiggle, &grid);
        assert_eq!(
            ctl.on_pointer_up(wiggle, &grid),
            Some(DragEvent::Cancelled { item_id: item.id })
        );
    }

    #[test]
    fn range_items_are_not_handled_here() {
        let span = crate::model::DateSpan::new(monday(), monday()).unwrap();
        let task = ScheduledItem::new_range("Design", span);
        let mut ctl = DragController::default();
        assert!(!ctl.on_pointer_down(PixelPos::new(10.0, 60.0), &task));
        assert!(!ctl.is_tracking());
    }
}
