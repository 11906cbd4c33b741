//! Runs remote writes off the UI thread and hands the outcomes back.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::optimistic::{MutationTicket, ScheduleDispatch, ScheduleStore};
use super::remote::RemoteStore;
use crate::error::PersistError;
use crate::model::ItemId;

pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(8);

/// Outcome of one remote write.
#[derive(Debug, Clone)]
pub struct Completion {
    pub ticket: MutationTicket,
    pub entity_id: ItemId,
    pub result: Result<(), PersistError>,
    pub elapsed: Duration,
}

type Wake = Arc<dyn Fn() + Send + Sync>;

pub struct Persister {
    handle: Handle,
    remote: Arc<dyn RemoteStore>,
    timeout: Duration,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    wake: Option<Wake>,
}

impl fmt::Debug for Persister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persister")
            .field("timeout", &self.timeout)
            .field("wake", &self.wake.is_some())
            .finish()
    }
}

impl Persister {
    pub fn new(handle: Handle, remote: Arc<dyn RemoteStore>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            handle,
            remote,
            timeout,
            tx,
            rx,
            wake: None,
        }
    }

    /// Called from the runtime after each completion, e.g. to request a
    /// repaint of the host window.
    pub fn with_wake(mut self, wake: impl Fn() + Send + Sync + 'static) -> Self {
        self.wake = Some(Arc::new(wake));
        self
    }

    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.remote
    }

    /// Start the remote write. The result arrives through
    /// [`poll_completions`](Self::poll_completions).
    pub fn dispatch(&self, dispatch: ScheduleDispatch) {
        let ScheduleDispatch {
            ticket,
            entity_id,
            patch,
        } = dispatch;
        let remote = Arc::clone(&self.remote);
        let tx = self.tx.clone();
        let wake = self.wake.clone();
        let timeout = self.timeout;
        debug!(entity = %entity_id, %ticket, "dispatching remote write");

        self.handle.spawn(async move {
            let started = Instant::now();
            let result = match tokio::time::timeout(timeout, remote.persist(entity_id, &patch)).await {
                Ok(result) => result,
                Err(_) => Err(PersistError::Timeout(timeout)),
            };
            let elapsed = started.elapsed();
            match &result {
                Ok(()) => debug!(entity = %entity_id, %ticket, ?elapsed, "remote write done"),
                Err(e) => warn!(entity = %entity_id, %ticket, ?elapsed, error = %e, "remote write failed"),
            }
            let completion = Completion {
                ticket,
                entity_id,
                result,
                elapsed,
            };
            if tx.send(completion).is_err() {
                debug!(%ticket, "persister gone, completion dropped");
                return;
            }
            if let Some(wake) = wake {
                wake();
            }
        });
    }

    /// Completions that arrived since the last call. Never blocks.
    pub fn poll_completions(&mut self) -> Vec<Completion> {
        let mut done = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            done.push(completion);
        }
        done
    }

    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }

    /// Feed arrived completions into `store` and dispatch any writes they
    /// release. Returns how many completions were handled.
    pub fn pump(&mut self, store: &mut ScheduleStore) -> usize {
        let completions = self.poll_completions();
        let handled = completions.len();
        for completion in completions {
            self.settle_one(store, completion);
        }
        handled
    }

    /// Wait until `store` has no pending mutation left.
    pub async fn settle(&mut self, store: &mut ScheduleStore) {
        while store.pending_count() > 0 {
            let Some(completion) = self.next_completion().await else {
                break;
            };
            self.settle_one(store, completion);
        }
        info!(revision = store.revision(), "store settled");
    }

    fn settle_one(&self, store: &mut ScheduleStore, completion: Completion) {
        if let Some(next) = store.resolve(completion.ticket, completion.result).into_next() {
            self.dispatch(next);
        }
    }
}
