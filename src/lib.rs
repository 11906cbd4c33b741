//! Agency scheduling: a week time grid for deliverables and calls, a
//! retroplanning chart for project tasks, and an optimistic store that keeps
//! the UI responsive while changes are persisted in the background.

pub mod app;
pub mod config;
pub mod error;
pub mod interaction;
pub mod io;
pub mod model;
pub mod store;
pub mod ui;

pub use config::SchedulerConfig;
pub use error::{AppError, FailureClass, PersistError, ScheduleError, StoreError};
