use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::item::DateSpan;
use crate::error::ScheduleError;

/// A client project whose tasks are retroplanned inside its date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub start: NaiveDate,
    pub deadline: NaiveDate,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        start: NaiveDate,
        deadline: NaiveDate,
    ) -> Result<Self, ScheduleError> {
        DateSpan::new(start, deadline)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start,
            deadline,
        })
    }

    /// The bounding window for the project's tasks. A deadline before the
    /// start collapses the window onto the start date.
    pub fn window(&self) -> DateSpan {
        DateSpan::new(self.start, self.deadline)
            .unwrap_or_else(|_| DateSpan::with_duration(self.start, 1))
    }
}
