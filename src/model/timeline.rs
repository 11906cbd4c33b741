use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::item::DateSpan;
use crate::error::ScheduleError;

/// The visible scheduling window of the time grid. `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ScheduleError> {
        if end < start {
            return Err(ScheduleError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Monday 00:00 of the week containing `date` up to the next Monday.
    pub fn week_of(date: NaiveDate) -> Self {
        let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        let start = monday.and_time(NaiveTime::MIN);
        Self {
            start,
            end: start + Duration::days(7),
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Calendar dates covered by the range. An `end` at exactly midnight does
    /// not pull in its own date.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let first = self.start.date();
        let mut last = self.end.date();
        if self.end.time() == NaiveTime::MIN && self.end > self.start {
            last = last.pred_opt().unwrap_or(last);
        }
        first.iter_days().take_while(|d| *d <= last).collect()
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Scroll the range by a number of days.
    pub fn scroll_days(&mut self, days: i64) {
        self.start += Duration::days(days);
        self.end += Duration::days(days);
    }
}

/// Horizontal day axis of the retroplanning chart. The visible dates are
/// stretched across the container, so pixels per day follows its width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GanttViewport {
    /// The leftmost visible date.
    pub start: NaiveDate,
    /// The rightmost visible date, inclusive.
    pub end: NaiveDate,
    pub container_width_px: f32,
}

impl GanttViewport {
    pub fn new(start: NaiveDate, end: NaiveDate, container_width_px: f32) -> Self {
        Self {
            start,
            end,
            container_width_px,
        }
    }

    /// Viewport covering a project window.
    pub fn for_window(window: &DateSpan, container_width_px: f32) -> Self {
        Self::new(window.start(), window.end(), container_width_px)
    }

    pub fn total_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// `None` when the container has no usable width or the range is empty.
    pub fn pixels_per_day(&self) -> Option<f32> {
        let days = self.total_days();
        if days <= 0 || !self.container_width_px.is_finite() || self.container_width_px <= 0.0 {
            return None;
        }
        Some(self.container_width_px / days as f32)
    }

    /// Convert a date to an x-pixel offset from the viewport start.
    pub fn date_to_x(&self, date: NaiveDate) -> Option<f32> {
        let ppd = self.pixels_per_day()?;
        Some((date - self.start).num_days() as f32 * ppd)
    }

    /// Left and right pixel edges of a bar covering `span` (end day included).
    pub fn span_to_x(&self, span: &DateSpan) -> Option<(f32, f32)> {
        let ppd = self.pixels_per_day()?;
        let left = self.date_to_x(span.start())?;
        Some((left, left + span.duration_days() as f32 * ppd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_starts_on_monday() {
        // 2025-03-06 is a Thursday.
        let week = TimeRange::week_of(date(2025, 3, 6));
        assert_eq!(week.start().date(), date(2025, 3, 3));
        let dates = week.dates();
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[6], date(2025, 3, 9));
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let a = date(2025, 3, 6).and_hms_opt(9, 0, 0).unwrap();
        let b = date(2025, 3, 5).and_hms_opt(9, 0, 0).unwrap();
        assert!(TimeRange::new(a, b).is_err());
        let empty = TimeRange::new(a, a).unwrap();
        assert_eq!(empty.dates(), vec![date(2025, 3, 6)]);
    }

    #[test]
    fn gantt_viewport_fits_window_to_width() {
        let span = DateSpan::new(date(2025, 6, 1), date(2025, 6, 20)).unwrap();
        let vp = GanttViewport::for_window(&span, 400.0);
        assert_eq!(vp.total_days(), 20);
        assert_eq!(vp.pixels_per_day(), Some(20.0));
        assert_eq!(vp.date_to_x(date(2025, 6, 3)), Some(40.0));
        let bar = DateSpan::new(date(2025, 6, 5), date(2025, 6, 8)).unwrap();
        assert_eq!(vp.span_to_x(&bar), Some((80.0, 160.0)));
    }

    #[test]
    fn gantt_viewport_without_width_is_unusable() {
        let vp = GanttViewport::new(date(2025, 6, 1), date(2025, 6, 20), 0.0);
        assert_eq!(vp.pixels_per_day(), None);
        assert_eq!(vp.date_to_x(date(2025, 6, 3)), None);
        let inverted = GanttViewport::new(date(2025, 6, 20), date(2025, 6, 1), 300.0);
        assert_eq!(inverted.pixels_per_day(), None);
    }
}
