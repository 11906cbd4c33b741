//! Pointer gesture controllers for the time grid and the retroplanning chart.
//!
//! Controllers never touch the committed data: they report lifecycle events
//! and keep their own display value for the ghost preview. The host turns a
//! `Committed` event into an optimistic store mutation.

pub mod drag;
pub mod gantt;
pub mod gesture;

pub use drag::DragController;
pub use gantt::GanttTaskController;
pub use gesture::{DragMode, DragSession, GesturePhase, DEFAULT_DRAG_THRESHOLD_PX};

use crate::model::{ItemId, ItemKind, SchedulePatch};

/// High-level outcome of a pointer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    /// The pointer crossed the drag threshold.
    Started { item_id: ItemId },
    /// New ghost position; `None` while hovering an invalid target.
    Preview {
        item_id: ItemId,
        proposed: Option<SchedulePatch>,
    },
    /// Released on a valid target with a changed schedule.
    Committed {
        item_id: ItemId,
        kind: ItemKind,
        patch: SchedulePatch,
    },
    /// The drag ended without a change; the item renders at its original
    /// position.
    Cancelled { item_id: ItemId },
    /// Press and release stayed under the threshold.
    Clicked { item_id: ItemId },
}

impl DragEvent {
    pub fn item_id(&self) -> ItemId {
        match self {
            DragEvent::Started { item_id }
            | DragEvent::Preview { item_id, .. }
            | DragEvent::Committed { item_id, .. }
            | DragEvent::Cancelled { item_id }
            | DragEvent::Clicked { item_id } => *item_id,
        }
    }
}
