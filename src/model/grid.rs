//! Pixel <-> time geometry of the week time-grid.
//!
//! Day columns run left to right, hours top to bottom below a fixed header.
//! The model is rebuilt whenever the container or visible range changes and
//! never carries state between calls, so hosts can query it on every pointer
//! move.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use super::snap::SnapPolicy;
use super::timeline::TimeRange;

/// A position in grid-local pixels (origin at the grid's top-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPos {
    pub x: f32,
    pub y: f32,
}

impl PixelPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: PixelPos) -> f32 {
        let (dx, dy) = (self.x - other.x, self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle in grid-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub min: PixelPos,
    pub max: PixelPos,
}

impl PixelRect {
    pub fn new(min: PixelPos, max: PixelPos) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, pos: PixelPos) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }
}

/// Host-supplied layout inputs. Rebuild the model when any of them change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub range: TimeRange,
    pub container_width_px: f32,
    /// Weekend column width relative to a weekday column.
    pub weekend_ratio: f32,
    pub start_hour: u32,
    pub end_hour: u32,
    pub hour_height_px: f32,
    /// Day-label strip above the first hour row.
    pub header_height_px: f32,
}

/// One day column. Columns are contiguous: each starts where the previous
/// one ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarColumn {
    pub date: NaiveDate,
    pub width_px: f32,
    pub is_weekend: bool,
    pub left_offset_px: f32,
}

impl CalendarColumn {
    pub fn right_px(&self) -> f32 {
        self.left_offset_px + self.width_px
    }

    fn contains_x(&self, x: f32) -> bool {
        self.width_px > 0.0 && x >= self.left_offset_px && x < self.right_px()
    }
}

/// Where an instant lands on the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub column_index: usize,
    pub pixel_x: f32,
    pub pixel_y: f32,
}

/// A snapped, droppable grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSlot {
    pub date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
}

impl GridSlot {
    /// `hour` may equal 24 when the band ends at midnight; that rolls over to
    /// the next day.
    pub fn to_datetime(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN)
            + Duration::minutes(i64::from(self.hour * 60 + self.minute))
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[derive(Debug, Clone)]
pub struct TimeGridModel {
    columns: Vec<CalendarColumn>,
    start_hour: u32,
    end_hour: u32,
    hour_height_px: f32,
    header_height_px: f32,
    snap: SnapPolicy,
    canvas: Option<PixelRect>,
}

impl TimeGridModel {
    pub fn new(geometry: &GridGeometry, snap: SnapPolicy) -> Self {
        let dates = geometry.range.dates();
        let ratio = if geometry.weekend_ratio.is_finite() {
            geometry.weekend_ratio.max(0.0)
        } else {
            1.0
        };
        let weekend_days = dates.iter().filter(|d| is_weekend(**d)).count() as f32;
        let weekdays = dates.len() as f32 - weekend_days;
        let units = weekdays + ratio * weekend_days;

        let width = geometry.container_width_px;
        let weekday_width = if units > 0.0 && width.is_finite() && width > 0.0 {
            width / units
        } else {
            0.0
        };

        let mut left = 0.0;
        let columns = dates
            .into_iter()
            .map(|date| {
                let weekend = is_weekend(date);
                let width_px = if weekend {
                    weekday_width * ratio
                } else {
                    weekday_width
                };
                let column = CalendarColumn {
                    date,
                    width_px,
                    is_weekend: weekend,
                    left_offset_px: left,
                };
                left += width_px;
                column
            })
            .collect();

        Self {
            columns,
            start_hour: geometry.start_hour,
            end_hour: geometry.end_hour,
            hour_height_px: geometry.hour_height_px,
            header_height_px: geometry.header_height_px,
            snap,
            canvas: None,
        }
    }

    /// Everything the host paints as part of the grid, in grid-local pixels.
    /// It may extend past the hour band (hour gutter, blank space below the
    /// last row).
    pub fn with_canvas(mut self, canvas: PixelRect) -> Self {
        self.canvas = Some(canvas);
        self
    }

    pub fn columns(&self) -> &[CalendarColumn] {
        &self.columns
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn header_height_px(&self) -> f32 {
        self.header_height_px
    }

    pub fn hour_height_px(&self) -> f32 {
        self.hour_height_px
    }

    /// Minutes covered by the vertical hour band; 0 for an invalid band.
    pub fn band_minutes(&self) -> u32 {
        if self.end_hour <= self.start_hour || self.end_hour > 24 {
            return 0;
        }
        (self.end_hour - self.start_hour) * 60
    }

    pub fn band_height_px(&self) -> f32 {
        self.band_minutes() as f32 / 60.0 * self.hour_height_px
    }

    pub fn total_width_px(&self) -> f32 {
        self.columns.last().map(|c| c.right_px()).unwrap_or(0.0)
    }

    /// Bounding rectangle of the grid, header included.
    pub fn grid_bounds(&self) -> PixelRect {
        PixelRect::new(
            PixelPos::new(0.0, 0.0),
            PixelPos::new(
                self.total_width_px(),
                self.header_height_px + self.band_height_px(),
            ),
        )
    }

    /// Area that reads as grid on screen: the painted canvas when known,
    /// otherwise [`grid_bounds`](Self::grid_bounds). Releasing a drag outside
    /// it targets the unscheduled pool.
    pub fn drop_area(&self) -> PixelRect {
        self.canvas.unwrap_or_else(|| self.grid_bounds())
    }

    fn is_usable(&self) -> bool {
        self.band_minutes() > 0
            && self.hour_height_px.is_finite()
            && self.hour_height_px > 0.0
            && self.header_height_px.is_finite()
            && self.total_width_px() > 0.0
    }

    pub fn column_at(&self, x: f32) -> Option<(usize, &CalendarColumn)> {
        if !x.is_finite() {
            return None;
        }
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.contains_x(x))
    }

    fn minutes_into_band(&self, instant: NaiveDateTime) -> Option<f32> {
        let minute_of_day =
            instant.hour() as f32 * 60.0 + instant.minute() as f32 + instant.second() as f32 / 60.0;
        let offset = minute_of_day - (self.start_hour * 60) as f32;
        (offset >= 0.0 && offset <= self.band_minutes() as f32).then_some(offset)
    }

    /// Pixel y of a minute offset into the hour band.
    pub fn y_for_minutes(&self, minutes: f32) -> f32 {
        self.header_height_px + minutes * self.hour_height_px / 60.0
    }

    /// Place an instant on the grid. `None` when it falls outside the visible
    /// dates or the hour band, or the geometry is degenerate.
    pub fn forward(&self, instant: NaiveDateTime) -> Option<GridPoint> {
        if !self.is_usable() {
            return None;
        }
        let date = instant.date();
        let column_index = self.columns.iter().position(|c| c.date == date)?;
        let minutes = self.minutes_into_band(instant)?;
        Some(GridPoint {
            column_index,
            pixel_x: self.columns[column_index].left_offset_px,
            pixel_y: self.y_for_minutes(minutes),
        })
    }

    /// Resolve a pointer position to a snapped slot. `None` outside the hour
    /// band, outside every column, on weekend columns, or when the geometry
    /// is degenerate.
    pub fn inverse(&self, pixel_x: f32, pixel_y: f32) -> Option<GridSlot> {
        if !self.is_usable() || !pixel_y.is_finite() {
            return None;
        }
        let (_, column) = self.column_at(pixel_x)?;
        if column.is_weekend {
            return None;
        }
        let offset_y = pixel_y - self.header_height_px;
        if offset_y < 0.0 || offset_y > self.band_height_px() {
            return None;
        }
        let raw_minutes = offset_y / self.hour_height_px * 60.0;
        let snapped = self.snap.snap(raw_minutes, self.band_minutes());
        let minutes = self.start_hour * 60 + snapped;
        Some(GridSlot {
            date: column.date,
            hour: minutes / 60,
            minute: minutes % 60,
        })
    }

    /// The instant `inverse(forward(instant))` is expected to produce.
    pub fn snap_instant(&self, instant: NaiveDateTime) -> Option<NaiveDateTime> {
        let minutes = self.minutes_into_band(instant)?;
        let snapped = self.snap.snap(minutes, self.band_minutes());
        Some(
            instant.date().and_time(NaiveTime::MIN)
                + Duration::minutes(i64::from(self.start_hour * 60 + snapped)),
        )
    }

    /// Pixel y of the current-time marker, when `now` is on screen.
    pub fn now_marker(&self, now: NaiveDateTime) -> Option<GridPoint> {
        self.forward(now)
    }
}
