//! Error types shared across the scheduler.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// Violations of the schedule data model's invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("range end {end} precedes start {start}")]
    InvertedRange { start: String, end: String },

    #[error("duration_days {declared} disagrees with {start}..{end}")]
    InconsistentDuration {
        start: String,
        end: String,
        declared: i64,
    },

    #[error("hour band {start_hour}..{end_hour} is empty or exceeds a day")]
    InvalidHourBand { start_hour: u32, end_hour: u32 },

    #[error("patch shape does not match the schedule of item {0}")]
    PatchMismatch(Uuid),
}

/// How a failed remote write must be handled locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The record no longer exists remotely; drop it, never retry.
    Gone,
    /// Network, timeout or storage hiccup; roll back, the user may redo.
    Transient,
}

/// Failure reported by a [`RemoteStore`](crate::store::RemoteStore).
#[derive(Debug, Clone, Error)]
pub enum PersistError {
    #[error("item {0} no longer exists")]
    NotFound(Uuid),

    #[error("remote write timed out after {0:?}")]
    Timeout(Duration),

    #[error("remote unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("remote rejected the change: {0}")]
    Rejected(String),
}

impl PersistError {
    pub fn classify(&self) -> FailureClass {
        match self {
            PersistError::NotFound(_) => FailureClass::Gone,
            _ => FailureClass::Transient,
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        PersistError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Storage(e.to_string())
    }
}

/// Errors raised by the optimistic store's local bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError<Id = Uuid> {
    #[error("unknown entity {0}")]
    UnknownEntity(Id),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Application-level errors (files, config, export).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

pub type AppResult<T> = Result<T, AppError>;
