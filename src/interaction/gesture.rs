//! Press / threshold / release bookkeeping shared by the drag controllers.

use tracing::debug;

use crate::model::{ItemId, PixelPos, ScheduledItem};

/// Displacement a pressed pointer must reach before a drag begins.
pub const DEFAULT_DRAG_THRESHOLD_PX: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    /// Pressed on an item, still below the drag threshold.
    Armed,
    Dragging,
}

/// Which affordance started the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Whole item / whole bar.
    Move,
    /// Trailing edge only.
    Resize,
}

/// Ephemeral state of one gesture. Lives from press to release or cancel.
#[derive(Debug, Clone)]
pub struct DragSession<D> {
    pub item_id: ItemId,
    pub mode: DragMode,
    pub original_item: ScheduledItem,
    pub pointer_origin: PixelPos,
    pub has_crossed_threshold: bool,
    /// Controller-specific display value, recomputed on every move.
    pub display: D,
}

/// What a pointer move did to the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// No gesture in progress.
    Ignored,
    /// Armed, still below the threshold.
    Absorbed,
    /// This move crossed the threshold.
    Started,
    Moved,
}

/// Idle -> Armed -> Dragging state machine with a one-shot click
/// suppression slot.
#[derive(Debug, Clone)]
pub struct GestureTracker<D> {
    threshold_px: f32,
    session: Option<DragSession<D>>,
    suppress_next_click_for: Option<ItemId>,
}

impl<D> GestureTracker<D> {
    pub fn new(threshold_px: f32) -> Self {
        Self {
            threshold_px: if threshold_px.is_finite() {
                threshold_px.max(0.0)
            } else {
                DEFAULT_DRAG_THRESHOLD_PX
            },
            session: None,
            suppress_next_click_for: None,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        match &self.session {
            None => GesturePhase::Idle,
            Some(s) if s.has_crossed_threshold => GesturePhase::Dragging,
            Some(_) => GesturePhase::Armed,
        }
    }

    /// Whether the host must keep routing pointer moves and releases here.
    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession<D>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut DragSession<D>> {
        self.session.as_mut()
    }

    /// Arm a new session. Refused while another one is active.
    pub fn press(&mut self, session: DragSession<D>) -> bool {
        if let Some(active) = &self.session {
            debug!(active = %active.item_id, ignored = %session.item_id, "second press ignored");
            return false;
        }
        // A click that never arrived after the last drop must not linger.
        self.suppress_next_click_for = None;
        debug!(item = %session.item_id, mode = ?session.mode, "gesture armed");
        self.session = Some(session);
        true
    }

    pub fn motion(&mut self, pos: PixelPos) -> Motion {
        let threshold = self.threshold_px;
        let Some(session) = self.session.as_mut() else {
            return Motion::Ignored;
        };
        if session.has_crossed_threshold {
            return Motion::Moved;
        }
        if session.pointer_origin.distance(pos) >= threshold {
            session.has_crossed_threshold = true;
            debug!(item = %session.item_id, "drag started");
            Motion::Started
        } else {
            Motion::Absorbed
        }
    }

    /// End the session, whatever its phase.
    pub fn finish(&mut self) -> Option<DragSession<D>> {
        self.session.take()
    }

    /// Swallow exactly one later click on `item_id`.
    pub fn suppress_click_for(&mut self, item_id: ItemId) {
        self.suppress_next_click_for = Some(item_id);
    }

    /// Returns `true` when a click on `item_id` should be dispatched. Any
    /// click consumes the suppression slot.
    pub fn filter_click(&mut self, item_id: ItemId) -> bool {
        match self.suppress_next_click_for.take() {
            Some(suppressed) if suppressed == item_id => {
                debug!(item = %item_id, "click after drop suppressed");
                false
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemCategory;

    fn session(item: &ScheduledItem, at: PixelPos) -> DragSession<()> {
        DragSession {
            item_id: item.id,
            mode: DragMode::Move,
            original_item: item.clone(),
            pointer_origin: at,
            has_crossed_threshold: false,
            display: (),
        }
    }

    #[test]
    fn arms_then_drags_past_threshold() {
        let item = ScheduledItem::new_point("Call", ItemCategory::Call, None);
        let mut g = GestureTracker::new(DEFAULT_DRAG_THRESHOLD_PX);
        assert_eq!(g.phase(), GesturePhase::Idle);
        assert_eq!(g.motion(PixelPos::new(1.0, 1.0)), Motion::Ignored);

        assert!(g.press(session(&item, PixelPos::new(10.0, 10.0))));
        assert_eq!(g.phase(), GesturePhase::Armed);
        assert_eq!(g.motion(PixelPos::new(12.0, 13.0)), Motion::Absorbed);
        assert_eq!(g.motion(PixelPos::new(13.0, 14.0)), Motion::Started);
        assert_eq!(g.phase(), GesturePhase::Dragging);
        assert_eq!(g.motion(PixelPos::new(10.0, 10.0)), Motion::Moved);

        assert!(g.finish().is_some());
        assert!(!g.is_tracking());
    }

    #[test]
    fn second_press_is_refused() {
        let a = ScheduledItem::new_point("A", ItemCategory::Call, None);
        let b = ScheduledItem::new_point("B", ItemCategory::Call, None);
        let mut g = GestureTracker::new(5.0);
        assert!(g.press(session(&a, PixelPos::default())));
        assert!(!g.press(session(&b, PixelPos::default())));
        assert_eq!(g.session().map(|s| s.item_id), Some(a.id));
    }

    #[test]
    fn suppression_is_one_shot() {
        let item = ScheduledItem::new_point("A", ItemCategory::Call, None);
        let mut g: GestureTracker<()> = GestureTracker::new(5.0);
        g.suppress_click_for(item.id);
        assert!(!g.filter_click(item.id));
        assert!(g.filter_click(item.id));

        g.suppress_click_for(item.id);
        let other = ScheduledItem::new_point("B", ItemCategory::Call, None);
        assert!(g.filter_click(other.id));
        assert!(g.filter_click(item.id));
    }
}
