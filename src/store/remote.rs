//! Remote persistence seam.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::PersistError;
use crate::model::{ItemId, SchedulePatch, ScheduledItem};

/// Where confirmed schedule changes end up.
///
/// Implementations must be safe to call concurrently; the persister never
/// issues two writes for the same item at once.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Write the schedule fields of one item. Fails with
    /// [`PersistError::NotFound`] when the item no longer exists.
    async fn persist(&self, id: ItemId, patch: &SchedulePatch) -> Result<(), PersistError>;

    /// Every item the remote currently holds.
    async fn fetch_all(&self) -> Result<Vec<ScheduledItem>, PersistError>;
}

/// In-memory remote with scripted failures, used offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    items: HashMap<ItemId, ScheduledItem>,
    order: Vec<ItemId>,
    scripted_failures: VecDeque<PersistError>,
    latency: Duration,
    writes: usize,
}

impl MemoryRemote {
    pub fn new(items: impl IntoIterator<Item = ScheduledItem>) -> Self {
        let remote = Self::default();
        {
            let mut state = remote.state();
            for item in items {
                state.order.push(item.id);
                state.items.insert(item.id, item);
            }
        }
        remote
    }

    /// Delay every call by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state().latency = latency;
        self
    }

    /// The next write fails with `err`; failures are consumed in order.
    pub fn fail_next(&self, err: PersistError) {
        self.state().scripted_failures.push_back(err);
    }

    /// Delete an item behind the client's back.
    pub fn remove(&self, id: ItemId) -> Option<ScheduledItem> {
        let mut state = self.state();
        state.order.retain(|i| *i != id);
        state.items.remove(&id)
    }

    pub fn item(&self, id: ItemId) -> Option<ScheduledItem> {
        self.state().items.get(&id).cloned()
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn latency(&self) -> Duration {
        self.state().latency
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn persist(&self, id: ItemId, patch: &SchedulePatch) -> Result<(), PersistError> {
        let latency = self.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.state();
        if let Some(err) = state.scripted_failures.pop_front() {
            return Err(err);
        }
        let item = state.items.get_mut(&id).ok_or(PersistError::NotFound(id))?;
        item.apply_schedule(patch)
            .map_err(|e| PersistError::Rejected(e.to_string()))?;
        state.writes += 1;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<ScheduledItem>, PersistError> {
        let state = self.state();
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.items.get(id).cloned())
            .collect())
    }
}
