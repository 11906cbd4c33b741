use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScheduleError;

pub type ItemId = Uuid;

/// What kind of agency work an item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Deliverable,
    Call,
    Task,
}

impl ItemCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ItemCategory::Deliverable => "Deliverable",
            ItemCategory::Call => "Call",
            ItemCategory::Task => "Task",
        }
    }
}

/// Shape of an item's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A single instant on the time grid.
    Point,
    /// A whole-day interval on the retroplanning chart.
    Range,
}

/// An inclusive, whole-day interval. `end >= start` always holds, so the
/// duration is at least one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SpanFields", into = "SpanFields")]
pub struct DateSpan {
    start: NaiveDate,
    end: NaiveDate,
}

/// Wire shape of a range schedule: two date-only strings plus the redundant
/// duration.
#[derive(Serialize, Deserialize)]
struct SpanFields {
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration_days: i64,
}

impl TryFrom<SpanFields> for DateSpan {
    type Error = ScheduleError;

    fn try_from(fields: SpanFields) -> Result<Self, Self::Error> {
        let span = DateSpan::new(fields.start_date, fields.end_date)?;
        if span.duration_days() != fields.duration_days {
            return Err(ScheduleError::InconsistentDuration {
                start: fields.start_date.to_string(),
                end: fields.end_date.to_string(),
                declared: fields.duration_days,
            });
        }
        Ok(span)
    }
}

impl From<DateSpan> for SpanFields {
    fn from(span: DateSpan) -> Self {
        Self {
            start_date: span.start,
            end_date: span.end,
            duration_days: span.duration_days(),
        }
    }
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ScheduleError> {
        if end < start {
            return Err(ScheduleError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Span of `days` days starting at `start`; `days` below 1 is treated as 1.
    pub fn with_duration(start: NaiveDate, days: i64) -> Self {
        Self {
            start,
            end: start + Duration::days(days.max(1) - 1),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive day count.
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Both ends moved by the same number of days.
    pub fn shifted(&self, days: i64) -> Self {
        Self {
            start: self.start + Duration::days(days),
            end: self.end + Duration::days(days),
        }
    }

    /// Same start, new end. The end never moves before the start.
    pub fn with_end(&self, end: NaiveDate) -> Self {
        Self {
            start: self.start,
            end: end.max(self.start),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn encloses(&self, other: &DateSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// The schedule fields of an item, in the shape the remote store expects.
///
/// The same type doubles as the patch sent through the optimistic store: a
/// patch always carries the complete field set for its shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schedule {
    Range(DateSpan),
    Point {
        #[serde(default)]
        scheduled_at: Option<NaiveDateTime>,
    },
}

pub type SchedulePatch = Schedule;

impl Schedule {
    pub fn at(instant: NaiveDateTime) -> Self {
        Schedule::Point {
            scheduled_at: Some(instant),
        }
    }

    pub fn unscheduled() -> Self {
        Schedule::Point { scheduled_at: None }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Schedule::Point { .. } => ItemKind::Point,
            Schedule::Range(_) => ItemKind::Range,
        }
    }

    /// Short human-readable rendering for tooltips, status lines and export.
    pub fn describe(&self) -> String {
        match self {
            Schedule::Point {
                scheduled_at: Some(at),
            } => at.format("%Y-%m-%d %H:%M").to_string(),
            Schedule::Point { scheduled_at: None } => "unscheduled".to_string(),
            Schedule::Range(span) => format!(
                "{} → {} ({}d)",
                span.start().format("%Y-%m-%d"),
                span.end().format("%Y-%m-%d"),
                span.duration_days()
            ),
        }
    }
}

/// A deliverable, call or task that can be placed on the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub id: ItemId,
    pub title: String,
    pub category: ItemCategory,
    pub schedule: Schedule,
    /// Length of a point item's card on the time grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
}

impl ScheduledItem {
    /// Create a point item (deliverable or call). `None` puts it in the
    /// unscheduled pool.
    pub fn new_point(
        title: impl Into<String>,
        category: ItemCategory,
        anchor: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            category,
            schedule: Schedule::Point {
                scheduled_at: anchor,
            },
            duration_minutes: if category == ItemCategory::Call {
                Some(30)
            } else {
                None
            },
            assignee_id: None,
            project_id: None,
        }
    }

    /// Create a retroplanning task spanning `span`.
    pub fn new_range(title: impl Into<String>, span: DateSpan) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            category: ItemCategory::Task,
            schedule: Schedule::Range(span),
            duration_minutes: None,
            assignee_id: None,
            project_id: None,
        }
    }

    pub fn in_project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn kind(&self) -> ItemKind {
        self.schedule.kind()
    }

    pub fn anchor(&self) -> Option<NaiveDateTime> {
        match self.schedule {
            Schedule::Point { scheduled_at } => scheduled_at,
            Schedule::Range(_) => None,
        }
    }

    pub fn span(&self) -> Option<DateSpan> {
        match self.schedule {
            Schedule::Range(span) => Some(span),
            Schedule::Point { .. } => None,
        }
    }

    /// Range items are always scheduled; point items only with an anchor.
    pub fn is_scheduled(&self) -> bool {
        match self.schedule {
            Schedule::Point { scheduled_at } => scheduled_at.is_some(),
            Schedule::Range(_) => true,
        }
    }

    /// Replace the schedule fields. The patch must keep the item's shape.
    pub fn apply_schedule(&mut self, patch: &SchedulePatch) -> Result<(), ScheduleError> {
        if patch.kind() != self.kind() {
            return Err(ScheduleError::PatchMismatch(self.id));
        }
        self.schedule = patch.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn span_rejects_inverted_dates() {
        assert!(DateSpan::new(date(8), date(5)).is_err());
        let span = DateSpan::new(date(5), date(5)).unwrap();
        assert_eq!(span.duration_days(), 1);
    }

    #[test]
    fn span_duration_is_inclusive() {
        let span = DateSpan::new(date(5), date(8)).unwrap();
        assert_eq!(span.duration_days(), 4);
        assert_eq!(span.shifted(12), DateSpan::new(date(17), date(20)).unwrap());
        assert_eq!(span.with_end(date(1)).end(), date(5));
    }

    #[test]
    fn range_schedule_uses_date_only_wire_format() {
        let schedule = Schedule::Range(DateSpan::new(date(5), date(8)).unwrap());
        let json = serde_json::to_value(&schedule).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "start_date": "2025-03-05",
                "end_date": "2025-03-08",
                "duration_days": 4
            })
        );
        let back: Schedule = serde_json::from_value(json).unwrap();
        assert_eq!(back, schedule);
    }

    #[test]
    fn point_schedule_serializes_nullable_timestamp() {
        let json = serde_json::to_value(Schedule::unscheduled()).unwrap();
        assert_eq!(json, serde_json::json!({ "scheduled_at": null }));

        let at = date(4).and_hms_opt(10, 30, 0).unwrap();
        let back: Schedule =
            serde_json::from_str(r#"{"scheduled_at":"2025-03-04T10:30:00"}"#).unwrap();
        assert_eq!(back, Schedule::at(at));
    }

    #[test]
    fn inconsistent_duration_is_rejected() {
        let bad = r#"{"start_date":"2025-03-05","end_date":"2025-03-08","duration_days":9}"#;
        assert!(serde_json::from_str::<DateSpan>(bad).is_err());
    }

    #[test]
    fn patch_must_keep_item_shape() {
        let mut call = ScheduledItem::new_point("Kickoff call", ItemCategory::Call, None);
        let span = DateSpan::new(date(1), date(2)).unwrap();
        assert_eq!(
            call.apply_schedule(&Schedule::Range(span)),
            Err(ScheduleError::PatchMismatch(call.id))
        );
        let at = date(3).and_hms_opt(9, 0, 0).unwrap();
        call.apply_schedule(&Schedule::at(at)).unwrap();
        assert_eq!(call.anchor(), Some(at));
    }
}
