use std::io::Write;
use std::path::Path;

use crate::error::AppResult;
use crate::model::{Schedule, ScheduledItem, Workspace};

const HEADER: [&str; 6] = ["Title", "Category", "Project", "Start", "End", "Duration"];

/// Export the schedule to a semicolon-delimited CSV file.
///
/// Columns: Title ; Category ; Project ; Start ; End ; Duration
/// Point items use `DD/MM/YYYY HH:MM` and a duration in minutes (empty start
/// when unscheduled); range items use `DD/MM/YYYY` and a duration in days.
/// Returns the number of items written.
pub fn export_csv(workspace: &Workspace, path: &Path) -> AppResult<usize> {
    let file = std::fs::File::create(path)?;
    write_csv(workspace, file)
}

pub fn write_csv<W: Write>(workspace: &Workspace, out: W) -> AppResult<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(out);
    wtr.write_record(HEADER)?;

    for item in &workspace.items {
        let project = item
            .project_id
            .and_then(|id| workspace.project(id))
            .map(|p| p.name.as_str())
            .unwrap_or("");
        let (start, end, duration) = schedule_columns(item);
        wtr.write_record([
            item.title.as_str(),
            item.category.label(),
            project,
            &start,
            &end,
            &duration,
        ])?;
    }

    wtr.flush()?;
    Ok(workspace.items.len())
}

fn schedule_columns(item: &ScheduledItem) -> (String, String, String) {
    match &item.schedule {
        Schedule::Point {
            scheduled_at: Some(at),
        } => {
            let minutes = item.duration_minutes.unwrap_or(0);
            let end = *at + chrono::Duration::minutes(i64::from(minutes));
            (
                at.format("%d/%m/%Y %H:%M").to_string(),
                end.format("%d/%m/%Y %H:%M").to_string(),
                format!("{minutes}m"),
            )
        }
        Schedule::Point { scheduled_at: None } => (String::new(), String::new(), String::new()),
        Schedule::Range(span) => (
            span.start().format("%d/%m/%Y").to_string(),
            span.end().format("%d/%m/%Y").to_string(),
            format!("{}d", span.duration_days()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn writes_header_and_one_row_per_item() {
        let ws = Workspace::sample(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
        let mut buf = Vec::new();
        let written = write_csv(&ws, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(written, ws.items.len());
        assert_eq!(lines.len(), ws.items.len() + 1);
        assert_eq!(lines[0], "Title;Category;Project;Start;End;Duration");
    }

    #[test]
    fn range_rows_carry_inclusive_day_count() {
        let mut ws = Workspace::new("Export");
        let span = crate::model::DateSpan::new(
            NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
        )
        .unwrap();
        ws.items.push(ScheduledItem::new_range("Shoot", span));
        let mut buf = Vec::new();
        write_csv(&ws, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Shoot;Task;;05/06/2025;08/06/2025;4d"));
    }
}
