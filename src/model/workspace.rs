use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::item::{DateSpan, ItemCategory, ItemId, ScheduledItem};
use super::project::Project;

/// The persisted document: every project and scheduled item of the agency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub name: String,
    pub projects: Vec<Project>,
    pub items: Vec<ScheduledItem>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            name: "Untitled Workspace".to_string(),
            projects: Vec::new(),
            items: Vec::new(),
            created: Utc::now(),
            modified: Utc::now(),
        }
    }
}

impl Workspace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Touch the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    pub fn item(&self, id: ItemId) -> Option<&ScheduledItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut ScheduledItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn project(&self, id: Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Generate a sample workspace around `today` for a first run.
    pub fn sample(today: NaiveDate) -> Self {
        let mut ws = Workspace::new("Agency");
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let at = |day: i64, h: u32, m: u32| {
            (monday + Duration::days(day)).and_hms_opt(h, m, 0)
        };

        let start = monday - Duration::days(7);
        let deadline = monday + Duration::days(26);
        let project = Project {
            id: Uuid::new_v4(),
            name: "Spring Campaign".to_string(),
            start,
            deadline,
        };

        let span =
            |from: i64, days: i64| DateSpan::with_duration(start + Duration::days(from), days);

        ws.items = vec![
            ScheduledItem::new_point("Brand guidelines v2", ItemCategory::Deliverable, at(0, 10, 0))
                .in_project(project.id),
            ScheduledItem::new_point("Client check-in", ItemCategory::Call, at(1, 14, 30))
                .in_project(project.id),
            ScheduledItem::new_point("Moodboard review", ItemCategory::Deliverable, at(3, 9, 0))
                .in_project(project.id),
            ScheduledItem::new_point("Media plan sync", ItemCategory::Call, at(4, 16, 0)),
            ScheduledItem::new_point("Press kit", ItemCategory::Deliverable, None)
                .in_project(project.id),
            ScheduledItem::new_point("Supplier call", ItemCategory::Call, None),
            ScheduledItem::new_range("Research & briefing", span(0, 5)).in_project(project.id),
            ScheduledItem::new_range("Concept design", span(5, 8)).in_project(project.id),
            ScheduledItem::new_range("Production", span(13, 10)).in_project(project.id),
            ScheduledItem::new_range("Launch prep", span(24, 4)).in_project(project.id),
        ];
        ws.projects.push(project);
        ws
    }
}
