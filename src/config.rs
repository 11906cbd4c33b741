//! Persisted scheduler settings (lives in the OS config directory).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, ScheduleError};
use crate::interaction::DEFAULT_DRAG_THRESHOLD_PX;
use crate::model::{GridGeometry, SnapPolicy, TimeRange};
use crate::model::snap::DEFAULT_TICK_MINUTES;

const APP_NAME: &str = "AgencyTimeline";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub drag_threshold_px: f32,
    pub snap_minutes: u32,
    /// First visible hour of the time grid.
    pub start_hour: u32,
    /// Hour at which the grid ends (exclusive, may be 24).
    pub end_hour: u32,
    pub hour_height_px: f32,
    pub header_height_px: f32,
    pub weekend_ratio: f32,
    pub persist_timeout_ms: u64,
    /// Artificial delay on every remote write, for demos.
    pub simulated_latency_ms: u64,
    /// Dropping a card outside the grid sends it back to the pool.
    pub unschedule_outside_grid: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            snap_minutes: DEFAULT_TICK_MINUTES,
            start_hour: 8,
            end_hour: 20,
            hour_height_px: 48.0,
            header_height_px: 44.0,
            weekend_ratio: 0.4,
            persist_timeout_ms: 8_000,
            simulated_latency_ms: 0,
            unschedule_outside_grid: true,
        }
    }
}

impl SchedulerConfig {
    /// Settings path inside the platform config dir, or the working
    /// directory when none can be determined.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .unwrap_or_else(|| PathBuf::from("settings.json"))
    }

    /// Workspace document inside the platform data dir.
    pub fn workspace_path() -> PathBuf {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.data_dir().join("workspace.json"))
            .unwrap_or_else(|| PathBuf::from("workspace.json"))
    }

    /// Read settings from `path`. A missing file yields the defaults and
    /// writes them out so users have something to edit.
    pub fn load_or_init(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            debug!(path = %path.display(), "wrote default settings");
            return Ok(config);
        }
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.start_hour >= self.end_hour || self.end_hour > 24 {
            return Err(AppError::Config(
                ScheduleError::InvalidHourBand {
                    start_hour: self.start_hour,
                    end_hour: self.end_hour,
                }
                .to_string(),
            ));
        }
        if !(self.hour_height_px.is_finite() && self.hour_height_px > 0.0) {
            return Err(AppError::Config(format!(
                "hour_height_px must be positive, got {}",
                self.hour_height_px
            )));
        }
        if self.snap_minutes == 0 || self.snap_minutes > 24 * 60 {
            return Err(AppError::Config(format!(
                "snap_minutes out of range: {}",
                self.snap_minutes
            )));
        }
        Ok(())
    }

    /// Like [`load_or_init`](Self::load_or_init), but never fails: problems
    /// are logged and the defaults used instead.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_or_init(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "settings unusable, using defaults");
            Self::default()
        })
    }

    pub fn snap_policy(&self) -> SnapPolicy {
        SnapPolicy::new(self.snap_minutes)
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }

    pub fn geometry(&self, range: TimeRange, container_width_px: f32) -> GridGeometry {
        GridGeometry {
            range,
            container_width_px,
            weekend_ratio: self.weekend_ratio,
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            hour_height_px: self.hour_height_px,
            header_height_px: self.header_height_px,
        }
    }
}
