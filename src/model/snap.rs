use chrono::{Duration, NaiveDate};

use super::item::DateSpan;

pub const DEFAULT_TICK_MINUTES: u32 = 30;

/// Rounding and clamping rules applied to every proposed schedule change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapPolicy {
    /// Granularity of point placements on the time grid.
    pub tick_minutes: u32,
}

impl Default for SnapPolicy {
    fn default() -> Self {
        Self {
            tick_minutes: DEFAULT_TICK_MINUTES,
        }
    }
}

impl SnapPolicy {
    pub fn new(tick_minutes: u32) -> Self {
        Self {
            tick_minutes: tick_minutes.max(1),
        }
    }

    /// Round `minutes_from_grid_start` to the nearest tick and clamp it into
    /// `[0, bounds_minutes]`. Non-finite input snaps to the grid start.
    pub fn snap(&self, minutes_from_grid_start: f32, bounds_minutes: u32) -> u32 {
        if !minutes_from_grid_start.is_finite() || minutes_from_grid_start <= 0.0 {
            return 0;
        }
        if minutes_from_grid_start >= bounds_minutes as f32 {
            return bounds_minutes;
        }
        let tick = self.tick_minutes.max(1) as f32;
        let ticks = (minutes_from_grid_start / tick).round();
        let snapped = ticks * tick;
        if snapped >= bounds_minutes as f32 {
            bounds_minutes
        } else {
            snapped as u32
        }
    }

    /// Largest whole-day shift, closest to `raw_delta_days`, that keeps both
    /// ends of `span` inside `[lower, upper]`.
    ///
    /// A span wider than the window cannot move and yields 0.
    pub fn clamp_delta(
        &self,
        span: &DateSpan,
        raw_delta_days: f32,
        lower: NaiveDate,
        upper: NaiveDate,
    ) -> i64 {
        let wanted = round_days(raw_delta_days);
        let min_delta = (lower - span.start()).num_days();
        let max_delta = (upper - span.end()).num_days();
        if min_delta > max_delta {
            return 0;
        }
        wanted.clamp(min_delta, max_delta)
    }

    /// New end date for a trailing-edge resize. The result never drops below
    /// a one-day duration and never passes `upper`; when both cannot hold the
    /// minimum duration wins.
    pub fn clamp_resize_end(
        &self,
        span: &DateSpan,
        raw_delta_days: f32,
        upper: NaiveDate,
    ) -> NaiveDate {
        let min_delta = (span.start() - span.end()).num_days();
        let max_delta = (upper - span.end()).num_days().max(min_delta);
        let delta = round_days(raw_delta_days).clamp(min_delta, max_delta);
        span.end() + Duration::days(delta)
    }
}

fn round_days(raw: f32) -> i64 {
    if raw.is_finite() {
        raw.round() as i64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap() + Duration::days(n - 1)
    }

    fn span(from: i64, to: i64) -> DateSpan {
        DateSpan::new(day(from), day(to)).unwrap()
    }

    #[test]
    fn snaps_to_nearest_half_hour() {
        let policy = SnapPolicy::default();
        assert_eq!(policy.snap(137.0, 720), 150);
        assert_eq!(policy.snap(14.0, 720), 0);
        assert_eq!(policy.snap(16.0, 720), 30);
    }

    #[test]
    fn snap_is_idempotent() {
        let policy = SnapPolicy::default();
        for raw in (0..1500).map(|m| m as f32 * 0.7) {
            let once = policy.snap(raw, 600);
            assert_eq!(policy.snap(once as f32, 600), once, "raw {raw}");
        }
    }

    #[test]
    fn snap_clamps_into_bounds() {
        let policy = SnapPolicy::default();
        assert_eq!(policy.snap(-45.0, 600), 0);
        assert_eq!(policy.snap(9_000.0, 600), 600);
        assert_eq!(policy.snap(f32::NAN, 600), 0);
        assert_eq!(policy.snap(f32::INFINITY, 600), 0);
    }

    #[test]
    fn snap_with_bounds_smaller_than_a_tick_stays_in_range() {
        let policy = SnapPolicy::default();
        assert_eq!(policy.snap(20.0, 10), 10);
        assert_eq!(policy.snap(5.0, 10), 0);
        assert_eq!(policy.snap(5.0, 0), 0);
        assert_eq!(policy.snap(policy.snap(20.0, 10) as f32, 10), 10);
    }

    #[test]
    fn move_clamps_to_last_window_inside_project() {
        // Days 5..=8 of a 20-day window, dragged 13 days right.
        let policy = SnapPolicy::default();
        let delta = policy.clamp_delta(&span(5, 8), 13.0, day(1), day(20));
        assert_eq!(delta, 12);
        assert_eq!(span(5, 8).shifted(delta), span(17, 20));
    }

    #[test]
    fn move_clamps_at_project_start() {
        let policy = SnapPolicy::default();
        assert_eq!(policy.clamp_delta(&span(3, 6), -9.4, day(1), day(20)), -2);
        assert_eq!(policy.clamp_delta(&span(3, 6), 1.4, day(1), day(20)), 1);
    }

    #[test]
    fn clamp_containment_holds_for_any_delta() {
        let policy = SnapPolicy::default();
        let window = span(1, 20);
        for raw in -40..40 {
            for (from, to) in [(1, 1), (5, 8), (2, 19), (1, 20)] {
                let s = span(from, to);
                let delta = policy.clamp_delta(&s, raw as f32 * 0.75, window.start(), window.end());
                assert!(window.encloses(&s.shifted(delta)));
            }
        }
    }

    #[test]
    fn span_wider_than_window_cannot_move() {
        let policy = SnapPolicy::default();
        assert_eq!(policy.clamp_delta(&span(1, 30), 3.0, day(1), day(20)), 0);
    }

    #[test]
    fn resize_never_drops_below_one_day() {
        let policy = SnapPolicy::default();
        let end = policy.clamp_resize_end(&span(5, 8), -10.0, day(20));
        assert_eq!(end, day(5));
        assert_eq!(span(5, 8).with_end(end).duration_days(), 1);
    }

    #[test]
    fn resize_clamps_to_upper_bound() {
        let policy = SnapPolicy::default();
        assert_eq!(policy.clamp_resize_end(&span(5, 8), 30.0, day(20)), day(20));
        assert_eq!(policy.clamp_resize_end(&span(5, 8), 2.2, day(20)), day(10));
    }

    #[test]
    fn resize_with_extreme_delta_stays_in_bounds() {
        let policy = SnapPolicy::default();
        assert_eq!(policy.clamp_resize_end(&span(5, 8), 1.0e12, day(20)), day(20));
        assert_eq!(policy.clamp_resize_end(&span(5, 8), -1.0e12, day(20)), day(5));
        assert_eq!(policy.clamp_resize_end(&span(5, 8), f32::MAX, day(20)), day(20));
        assert_eq!(policy.clamp_resize_end(&span(5, 8), f32::NAN, day(20)), day(8));
    }

    #[test]
    fn resize_keeps_one_day_when_upper_precedes_start() {
        let policy = SnapPolicy::default();
        assert_eq!(policy.clamp_resize_end(&span(5, 8), 3.0, day(2)), day(5));
    }
}
