use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AppResult, PersistError};
use crate::model::{ItemId, SchedulePatch, ScheduledItem, Workspace};
use crate::store::RemoteStore;

/// Save a workspace to a JSON file, creating parent directories.
pub fn save_workspace(workspace: &Workspace, path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(workspace)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a workspace from a JSON file.
pub fn load_workspace(path: &Path) -> AppResult<Workspace> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Remote store backed by a workspace document on disk. Each write reads the
/// document, patches one item and writes it back.
#[derive(Debug)]
pub struct JsonFileRemote {
    path: PathBuf,
    latency: Duration,
    // Serializes read-modify-write cycles on the document.
    lock: Mutex<()>,
}

impl JsonFileRemote {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            latency: Duration::ZERO,
            lock: Mutex::new(()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Workspace, PersistError> {
        let json = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[async_trait]
impl RemoteStore for JsonFileRemote {
    async fn persist(&self, id: ItemId, patch: &SchedulePatch) -> Result<(), PersistError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let _guard = self.lock.lock().await;
        let mut workspace = self.read().await?;
        let item = workspace.item_mut(id).ok_or(PersistError::NotFound(id))?;
        item.apply_schedule(patch)
            .map_err(|e| PersistError::Rejected(e.to_string()))?;
        workspace.touch();
        let json = serde_json::to_string_pretty(&workspace)?;
        tokio::fs::write(&self.path, json).await?;
        debug!(item = %id, path = %self.path.display(), "workspace written");
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<ScheduledItem>, PersistError> {
        Ok(self.read().await?.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureClass;
    use crate::model::Schedule;
    use chrono::NaiveDate;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    #[test]
    fn workspace_survives_a_save_load_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("workspace.json");
        let ws = Workspace::sample(monday());
        save_workspace(&ws, &path).unwrap();
        let loaded = load_workspace(&path).unwrap();
        assert_eq!(loaded.items, ws.items);
        assert_eq!(loaded.projects, ws.projects);
    }

    #[tokio::test]
    async fn persist_patches_one_item_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.json");
        let ws = Workspace::sample(monday());
        save_workspace(&ws, &path).unwrap();
        let target = ws.items.iter().find(|i| i.is_scheduled()).unwrap().id;

        let remote = JsonFileRemote::new(&path);
        remote.persist(target, &Schedule::unscheduled()).await.unwrap();

        let items = remote.fetch_all().await.unwrap();
        let stored = items.iter().find(|i| i.id == target).unwrap();
        assert!(!stored.is_scheduled());
        assert_eq!(items.len(), ws.items.len());
    }

    #[tokio::test]
    async fn unknown_item_is_gone_and_missing_file_is_transient() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.json");
        save_workspace(&Workspace::new("Empty"), &path).unwrap();
        let remote = JsonFileRemote::new(&path);
        let err = remote
            .persist(uuid::Uuid::new_v4(), &Schedule::unscheduled())
            .await
            .unwrap_err();
        assert_eq!(err.classify(), FailureClass::Gone);

        let missing = JsonFileRemote::new(dir.path().join("nope.json"));
        let err = missing
            .persist(uuid::Uuid::new_v4(), &Schedule::unscheduled())
            .await
            .unwrap_err();
        assert_eq!(err.classify(), FailureClass::Transient);
    }
}
