pub mod grid;
pub mod item;
pub mod project;
pub mod snap;
pub mod timeline;
pub mod workspace;

pub use grid::{
    CalendarColumn, GridGeometry, GridPoint, GridSlot, PixelPos, PixelRect, TimeGridModel,
};
pub use item::{DateSpan, ItemCategory, ItemId, ItemKind, Schedule, SchedulePatch, ScheduledItem};
pub use project::Project;
pub use snap::SnapPolicy;
pub use timeline::{GanttViewport, TimeRange};
pub use workspace::Workspace;
