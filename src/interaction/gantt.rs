use tracing::{debug, info};

use super::gesture::{DragMode, DragSession, GesturePhase, GestureTracker, Motion};
use super::DragEvent;
use crate::model::{
    DateSpan, GanttViewport, ItemId, ItemKind, PixelPos, Schedule, ScheduledItem, SnapPolicy,
};

/// Display state of a bar being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarDrag {
    /// The committed span when the gesture began.
    pub original: DateSpan,
    /// Project window read at press time; fixed for the whole session.
    pub window: DateSpan,
    /// Where the bar is drawn right now.
    pub display: DateSpan,
}

/// Drag controller for range items on the retroplanning chart: move the whole
/// bar, or resize its trailing edge, inside the project window.
#[derive(Debug, Clone)]
pub struct GanttTaskController {
    gesture: GestureTracker<BarDrag>,
    snap: SnapPolicy,
}

impl Default for GanttTaskController {
    fn default() -> Self {
        Self::new(super::DEFAULT_DRAG_THRESHOLD_PX, SnapPolicy::default())
    }
}

impl GanttTaskController {
    pub fn new(threshold_px: f32, snap: SnapPolicy) -> Self {
        Self {
            gesture: GestureTracker::new(threshold_px),
            snap,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.gesture.phase()
    }

    pub fn is_tracking(&self) -> bool {
        self.gesture.is_tracking()
    }

    /// The visual-only task currently being dragged, if any.
    pub fn display_task(&self) -> Option<(ItemId, DateSpan)> {
        self.gesture
            .session()
            .filter(|s| s.has_crossed_threshold)
            .map(|s| (s.item_id, s.display.display))
    }

    /// Press on a bar (`Move`) or its trailing handle (`Resize`). `window` is
    /// the enclosing project's date window.
    pub fn on_pointer_down(
        &mut self,
        pos: PixelPos,
        item: &ScheduledItem,
        mode: DragMode,
        window: DateSpan,
    ) -> bool {
        let Some(span) = item.span() else {
            return false;
        };
        self.gesture.press(DragSession {
            item_id: item.id,
            mode,
            original_item: item.clone(),
            pointer_origin: pos,
            has_crossed_threshold: false,
            display: BarDrag {
                original: span,
                window,
                display: span,
            },
        })
    }

    pub fn on_pointer_move(
        &mut self,
        pos: PixelPos,
        viewport: &GanttViewport,
    ) -> Option<DragEvent> {
        let motion = self.gesture.motion(pos);
        if matches!(motion, Motion::Ignored | Motion::Absorbed) {
            return None;
        }
        let snap = self.snap;
        let session = self.gesture.session_mut()?;
        if let Some(span) = compute_span(&snap, session, pos, viewport) {
            session.display.display = span;
        }
        let item_id = session.item_id;
        Some(match motion {
            Motion::Started => DragEvent::Started { item_id },
            _ => DragEvent::Preview {
                item_id,
                proposed: Some(Schedule::Range(session.display.display)),
            },
        })
    }

    pub fn on_pointer_up(&mut self, pos: PixelPos, viewport: &GanttViewport) -> Option<DragEvent> {
        let mut session = self.gesture.finish()?;
        let item_id = session.item_id;
        if !session.has_crossed_threshold {
            return Some(DragEvent::Clicked { item_id });
        }
        if let Some(span) = compute_span(&self.snap, &session, pos, viewport) {
            session.display.display = span;
        }
        let BarDrag {
            original,
            display: shown,
            ..
        } = session.display;
        if shown == original {
            debug!(item = %item_id, "bar released without a day change");
            return Some(DragEvent::Cancelled { item_id });
        }
        info!(
            item = %item_id,
            mode = ?session.mode,
            start = %shown.start(),
            end = %shown.end(),
            "bar change committed"
        );
        self.gesture.suppress_click_for(item_id);
        Some(DragEvent::Committed {
            item_id,
            kind: ItemKind::Range,
            patch: Schedule::Range(shown),
        })
    }

    pub fn cancel(&mut self) -> Option<DragEvent> {
        let session = self.gesture.finish()?;
        debug!(item = %session.item_id, "bar drag cancelled");
        session
            .has_crossed_threshold
            .then_some(DragEvent::Cancelled {
                item_id: session.item_id,
            })
    }

    pub fn on_pointer_lost(&mut self) -> Option<DragEvent> {
        self.cancel()
    }

    pub fn filter_click(&mut self, item_id: ItemId) -> bool {
        self.gesture.filter_click(item_id)
    }
}

/// Span under the pointer, or `None` when the viewport has no usable scale.
fn compute_span(
    snap: &SnapPolicy,
    session: &DragSession<BarDrag>,
    pos: PixelPos,
    viewport: &GanttViewport,
) -> Option<DateSpan> {
    let ppd = viewport.pixels_per_day()?;
    let raw_days = (pos.x - session.pointer_origin.x) / ppd;
    let BarDrag {
        original, window, ..
    } = session.display;
    Some(match session.mode {
        DragMode::Move => {
            let delta = snap.clamp_delta(&original, raw_days, window.start(), window.end());
            original.shifted(delta)
        }
        DragMode::Resize => {
            original.with_end(snap.clamp_resize_end(&original, raw_days, window.end()))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap() + Duration::days(n - 1)
    }

    fn span(from: i64, to: i64) -> DateSpan {
        DateSpan::new(day(from), day(to)).unwrap()
    }

    /// 20-day project window at 20 px per day.
    fn viewport() -> GanttViewport {
        GanttViewport::for_window(&span(1, 20), 400.0)
    }

    fn bar_origin(s: &DateSpan) -> PixelPos {
        let (left, _) = viewport().span_to_x(s).unwrap();
        PixelPos::new(left + 5.0, 10.0)
    }

    #[test]
    fn move_is_clamped_inside_project_window() {
        let item = ScheduledItem::new_range("Concept", span(5, 8));
        let mut ctl = GanttTaskController::default();
        let origin = bar_origin(&span(5, 8));
        assert!(ctl.on_pointer_down(origin, &item, DragMode::Move, span(1, 20)));

        // 13 days to the right would land on 18..=21.
        let target = PixelPos::new(origin.x + 13.0 * 20.0, origin.y);
        assert_eq!(
            ctl.on_pointer_move(target, &viewport()),
            Some(DragEvent::Started { item_id: item.id })
        );
        assert_eq!(ctl.display_task(), Some((item.id, span(17, 20))));
        // The committed item is untouched while dragging.
        assert_eq!(item.span(), Some(span(5, 8)));

        assert_eq!(
            ctl.on_pointer_up(target, &viewport()),
            Some(DragEvent::Committed {
                item_id: item.id,
                kind: ItemKind::Range,
                patch: Schedule::Range(span(17, 20)),
            })
        );
        assert!(!ctl.filter_click(item.id));
    }

    #[test]
    fn preview_never_leaves_the_window() {
        let item = ScheduledItem::new_range("Concept", span(5, 8));
        let mut ctl = GanttTaskController::default();
        let origin = bar_origin(&span(5, 8));
        ctl.on_pointer_down(origin, &item, DragMode::Move, span(1, 20));
        for dx in (-600..600).step_by(37) {
            ctl.on_pointer_move(PixelPos::new(origin.x + dx as f32, origin.y), &viewport());
            if let Some((_, shown)) = ctl.display_task() {
                assert!(span(1, 20).encloses(&shown), "dx {dx} -> {shown:?}");
                assert_eq!(shown.duration_days(), 4);
            }
        }
    }

    #[test]
    fn resize_moves_only_the_end_and_keeps_one_day() {
        let item = ScheduledItem::new_range("Production", span(5, 8));
        let mut ctl = GanttTaskController::default();
        let (_, right) = viewport().span_to_x(&span(5, 8)).unwrap();
        let handle = PixelPos::new(right - 2.0, 10.0);
        ctl.on_pointer_down(handle, &item, DragMode::Resize, span(1, 20));

        let shrink = PixelPos::new(handle.x - 200.0, 10.0);
        ctl.on_pointer_move(shrink, &viewport());
        assert_eq!(ctl.display_task(), Some((item.id, span(5, 5))));

        let grow = PixelPos::new(handle.x + 1_000.0, 10.0);
        ctl.on_pointer_move(grow, &viewport());
        assert_eq!(ctl.display_task(), Some((item.id, span(5, 20))));

        assert_eq!(
            ctl.on_pointer_up(PixelPos::new(handle.x + 41.0, 10.0), &viewport()),
            Some(DragEvent::Committed {
                item_id: item.id,
                kind: ItemKind::Range,
                patch: Schedule::Range(span(5, 10)),
            })
        );
    }

    #[test]
    fn zero_day_delta_issues_no_commit() {
        let item = ScheduledItem::new_range("Launch", span(5, 8));
        let mut ctl = GanttTaskController::default();
        let origin = bar_origin(&span(5, 8));
        ctl.on_pointer_down(origin, &item, DragMode::Move, span(1, 20));
        // Past the pixel threshold but under half a day.
        let wiggle = PixelPos::new(origin.x + 8.0, origin.y);
        ctl.on_pointer_move(wiggle, &viewport());
        assert_eq!(
            ctl.on_pointer_up(wiggle, &viewport()),
            Some(DragEvent::Cancelled { item_id: item.id })
        );
        assert!(ctl.filter_click(item.id));
    }

    #[test]
    fn sub_threshold_release_is_a_click() {
        let item = ScheduledItem::new_range("Launch", span(5, 8));
        let mut ctl = GanttTaskController::default();
        let origin = bar_origin(&span(5, 8));
        ctl.on_pointer_down(origin, &item, DragMode::Move, span(1, 20));
        let up = PixelPos::new(origin.x + 3.0, origin.y);
        assert_eq!(ctl.on_pointer_move(up, &viewport()), None);
        assert_eq!(
            ctl.on_pointer_up(up, &viewport()),
            Some(DragEvent::Clicked { item_id: item.id })
        );
    }

    #[test]
    fn zero_width_container_cannot_commit() {
        let item = ScheduledItem::new_range("Launch", span(5, 8));
        let flat = GanttViewport::for_window(&span(1, 20), 0.0);
        let mut ctl = GanttTaskController::default();
        ctl.on_pointer_down(PixelPos::new(0.0, 0.0), &item, DragMode::Move, span(1, 20));
        ctl.on_pointer_move(PixelPos::new(90.0, 0.0), &flat);
        assert_eq!(ctl.display_task(), Some((item.id, span(5, 8))));
        assert_eq!(
            ctl.on_pointer_up(PixelPos::new(90.0, 0.0), &flat),
            Some(DragEvent::Cancelled { item_id: item.id })
        );
    }

    #[test]
    fn near_zero_width_container_stays_inside_window() {
        let item = ScheduledItem::new_range("Production", span(5, 8));
        let sliver = GanttViewport::for_window(&span(1, 20), 1.0e-6);
        let mut ctl = GanttTaskController::default();
        ctl.on_pointer_down(PixelPos::new(0.0, 0.0), &item, DragMode::Resize, span(1, 20));
        ctl.on_pointer_move(PixelPos::new(100.0, 0.0), &sliver);
        assert_eq!(ctl.display_task(), Some((item.id, span(5, 20))));
        ctl.on_pointer_move(PixelPos::new(-100.0, 0.0), &sliver);
        assert_eq!(ctl.display_task(), Some((item.id, span(5, 5))));
        ctl.cancel();

        ctl.on_pointer_down(PixelPos::new(0.0, 0.0), &item, DragMode::Move, span(1, 20));
        ctl.on_pointer_move(PixelPos::new(100.0, 0.0), &sliver);
        assert_eq!(ctl.display_task(), Some((item.id, span(17, 20))));
    }

    #[test]
    fn point_items_are_refused() {
        let call = ScheduledItem::new_point("Call", crate::model::ItemCategory::Call, None);
        let mut ctl = GanttTaskController::default();
        assert!(!ctl.on_pointer_down(PixelPos::default(), &call, DragMode::Move, span(1, 20)));
        assert_eq!(ctl.phase(), GesturePhase::Idle);
    }
}
