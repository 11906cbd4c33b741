//! Local-first store: mutations land immediately, remote confirmation or
//! failure is reconciled afterwards.
//!
//! Every `apply` records the fields it overwrote. The store never talks to
//! the remote itself; it hands out [`Dispatch`] values the host forwards to a
//! persister, and later feeds the outcome back through [`resolve`].
//!
//! Writes to one entity are serialized: while a mutation is in flight, newer
//! mutations of the same entity are queued and released one at a time as
//! earlier ones resolve.
//!
//! [`resolve`]: OptimisticMutationStore::resolve

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;

use tracing::{debug, info, warn};

use crate::error::{FailureClass, PersistError, ScheduleError, StoreError};
use crate::model::{ItemId, SchedulePatch, ScheduledItem};

/// An entity the store can patch and roll back.
pub trait Patchable: Clone {
    type Id: Copy + Eq + Hash + fmt::Debug + fmt::Display;
    type Patch: Clone + fmt::Debug + PartialEq;

    fn id(&self) -> Self::Id;

    /// Human-readable name used in notices.
    fn label(&self) -> String;

    /// Current values of exactly the fields `patch` would overwrite, in patch
    /// form so that merging it back restores them.
    fn capture(&self, patch: &Self::Patch) -> Self::Patch;

    fn merge(&mut self, patch: &Self::Patch) -> Result<(), ScheduleError>;
}

impl Patchable for ScheduledItem {
    type Id = ItemId;
    type Patch = SchedulePatch;

    fn id(&self) -> ItemId {
        self.id
    }

    fn label(&self) -> String {
        self.title.clone()
    }

    fn capture(&self, _patch: &SchedulePatch) -> SchedulePatch {
        // A schedule patch always replaces the whole schedule.
        self.schedule.clone()
    }

    fn merge(&mut self, patch: &SchedulePatch) -> Result<(), ScheduleError> {
        self.apply_schedule(patch)
    }
}

/// Correlates a remote response with the mutation that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationTicket(u64);

impl fmt::Display for MutationTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State of a pending record. Confirmation and rollback discard the record;
/// [`Resolution`] reports which of the two happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    /// Handed to the persister, awaiting a response.
    InFlight,
    /// Waiting behind an earlier mutation of the same entity.
    Queued,
}

/// Bookkeeping for one not-yet-confirmed mutation.
#[derive(Debug, Clone)]
pub struct MutationRecord<P> {
    pub ticket: MutationTicket,
    pub patch: P,
    /// Values the patch overwrote; the rollback target.
    pub snapshot: P,
    pub status: MutationStatus,
}

/// A remote write the host must perform.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch<Id, P> {
    pub ticket: MutationTicket,
    pub entity_id: Id,
    pub patch: P,
}

/// What `resolve` did with a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<Id, P> {
    /// Remote accepted the write; the local value stands.
    Confirmed {
        entity_id: Id,
        next: Option<Dispatch<Id, P>>,
    },
    /// Transient failure of the newest mutation; its snapshot is back.
    RolledBack {
        entity_id: Id,
        next: Option<Dispatch<Id, P>>,
    },
    /// Transient failure of a mutation a newer local edit already replaced.
    Superseded {
        entity_id: Id,
        next: Option<Dispatch<Id, P>>,
    },
    /// The entity no longer exists remotely and was dropped locally.
    Removed { entity_id: Id },
    /// Unknown, stale or not-yet-dispatched ticket.
    Ignored,
}

impl<Id, P> Resolution<Id, P> {
    /// The queued write released by this resolution, if any.
    pub fn into_next(self) -> Option<Dispatch<Id, P>> {
        match self {
            Resolution::Confirmed { next, .. }
            | Resolution::RolledBack { next, .. }
            | Resolution::Superseded { next, .. } => next,
            Resolution::Removed { .. } | Resolution::Ignored => None,
        }
    }
}

/// Change notifications delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent<Id> {
    Inserted(Id),
    Applied(Id),
    Confirmed(Id),
    RolledBack(Id),
    Removed(Id),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    SaveFailed,
    ItemRemoved,
}

/// User-facing message produced by a failed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener<Id> = Box<dyn FnMut(&StoreEvent<Id>)>;

pub struct OptimisticMutationStore<E: Patchable> {
    entities: HashMap<E::Id, E>,
    order: Vec<E::Id>,
    /// Pending mutations per entity, oldest first. Only the front is ever in
    /// flight.
    pending: HashMap<E::Id, VecDeque<MutationRecord<E::Patch>>>,
    next_ticket: u64,
    revision: u64,
    listeners: Vec<(ListenerId, Listener<E::Id>)>,
    next_listener: u64,
    notices: Vec<Notice>,
}

/// The store the scheduler runs on.
pub type ScheduleStore = OptimisticMutationStore<ScheduledItem>;

pub type ScheduleDispatch = Dispatch<ItemId, SchedulePatch>;

impl<E: Patchable> Default for OptimisticMutationStore<E> {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            order: Vec::new(),
            pending: HashMap::new(),
            next_ticket: 1,
            revision: 0,
            listeners: Vec::new(),
            next_listener: 1,
            notices: Vec::new(),
        }
    }
}

impl<E: Patchable> fmt::Debug for OptimisticMutationStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimisticMutationStore")
            .field("entities", &self.entities.len())
            .field("pending", &self.pending_count())
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<E: Patchable> OptimisticMutationStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = E>) -> Self {
        let mut store = Self::new();
        for entity in entities {
            store.insert(entity);
        }
        store
    }

    /// Add or replace an entity, outside of any mutation tracking.
    pub fn insert(&mut self, entity: E) {
        let id = entity.id();
        if self.entities.insert(id, entity).is_none() {
            self.order.push(id);
        }
        self.bump(StoreEvent::Inserted(id));
    }

    pub fn get(&self, id: E::Id) -> Option<&E> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: E::Id) -> bool {
        self.entities.contains_key(&id)
    }

    /// Entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &E> + '_ {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Incremented on every visible change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of mutations awaiting a remote response, queued ones included.
    pub fn pending_count(&self) -> usize {
        self.pending.values().map(VecDeque::len).sum()
    }

    pub fn is_pending(&self, id: E::Id) -> bool {
        self.pending.get(&id).is_some_and(|q| !q.is_empty())
    }

    pub fn records(&self, id: E::Id) -> impl Iterator<Item = &MutationRecord<E::Patch>> + '_ {
        self.pending.get(&id).into_iter().flatten()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent<E::Id>) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Merge `patch` into the local copy right away and record what it
    /// overwrote. Returns the remote write to perform now, or `None` when it
    /// was queued behind an earlier write to the same entity.
    pub fn apply(
        &mut self,
        entity_id: E::Id,
        patch: E::Patch,
    ) -> Result<Option<Dispatch<E::Id, E::Patch>>, StoreError<E::Id>> {
        let entity = self
            .entities
            .get_mut(&entity_id)
            .ok_or(StoreError::UnknownEntity(entity_id))?;
        let snapshot = entity.capture(&patch);
        entity.merge(&patch)?;

        let ticket = MutationTicket(self.next_ticket);
        self.next_ticket += 1;
        let queue = self.pending.entry(entity_id).or_default();
        let status = if queue.is_empty() {
            MutationStatus::InFlight
        } else {
            MutationStatus::Queued
        };
        queue.push_back(MutationRecord {
            ticket,
            patch: patch.clone(),
            snapshot,
            status,
        });
        debug!(entity = %entity_id, %ticket, ?status, "mutation applied locally");
        self.bump(StoreEvent::Applied(entity_id));

        Ok((status == MutationStatus::InFlight).then_some(Dispatch {
            ticket,
            entity_id,
            patch,
        }))
    }

    /// Reconcile a remote response with local state.
    pub fn resolve(
        &mut self,
        ticket: MutationTicket,
        result: Result<(), PersistError>,
    ) -> Resolution<E::Id, E::Patch> {
        let Some(entity_id) = self.in_flight_owner(ticket) else {
            debug!(%ticket, "response for unknown ticket ignored");
            return Resolution::Ignored;
        };

        match result {
            Ok(()) => {
                self.pop_front(entity_id);
                info!(entity = %entity_id, %ticket, "mutation confirmed");
                self.bump(StoreEvent::Confirmed(entity_id));
                Resolution::Confirmed {
                    entity_id,
                    next: self.release_next(entity_id),
                }
            }
            Err(err) => match err.classify() {
                FailureClass::Gone => self.remove_gone(entity_id, &err),
                FailureClass::Transient => self.roll_back(entity_id, ticket, &err),
            },
        }
    }

    fn in_flight_owner(&self, ticket: MutationTicket) -> Option<E::Id> {
        self.pending.iter().find_map(|(id, queue)| {
            queue
                .front()
                .filter(|r| r.ticket == ticket && r.status == MutationStatus::InFlight)
                .map(|_| *id)
        })
    }

    fn pop_front(&mut self, entity_id: E::Id) -> Option<MutationRecord<E::Patch>> {
        let queue = self.pending.get_mut(&entity_id)?;
        let record = queue.pop_front();
        if queue.is_empty() {
            self.pending.remove(&entity_id);
        }
        record
    }

    /// Promote the oldest queued write of `entity_id` to in flight.
    fn release_next(&mut self, entity_id: E::Id) -> Option<Dispatch<E::Id, E::Patch>> {
        let record = self.pending.get_mut(&entity_id)?.front_mut()?;
        record.status = MutationStatus::InFlight;
        debug!(entity = %entity_id, ticket = %record.ticket, "queued mutation released");
        Some(Dispatch {
            ticket: record.ticket,
            entity_id,
            patch: record.patch.clone(),
        })
    }

    fn roll_back(
        &mut self,
        entity_id: E::Id,
        ticket: MutationTicket,
        err: &PersistError,
    ) -> Resolution<E::Id, E::Patch> {
        let Some(failed) = self.pop_front(entity_id) else {
            return Resolution::Ignored;
        };
        let label = self.label_of(entity_id);

        if let Some(newer) = self
            .pending
            .get_mut(&entity_id)
            .and_then(VecDeque::front_mut)
        {
            // The failed value never reached the remote, so the next write
            // must roll back past it.
            newer.snapshot = failed.snapshot;
            self.notices.push(Notice {
                kind: NoticeKind::SaveFailed,
                message: format!(
                    "An earlier save of \"{label}\" failed: {err}. Retrying with your latest change."
                ),
            });
            warn!(entity = %entity_id, %ticket, error = %err, "superseded mutation failed");
            return Resolution::Superseded {
                entity_id,
                next: self.release_next(entity_id),
            };
        }

        if let Some(entity) = self.entities.get_mut(&entity_id) {
            if let Err(merge_err) = entity.merge(&failed.snapshot) {
                warn!(entity = %entity_id, error = %merge_err, "snapshot could not be restored");
            }
        }
        self.notices.push(Notice {
            kind: NoticeKind::SaveFailed,
            message: format!("Could not save \"{label}\": {err}. The change was undone."),
        });
        warn!(entity = %entity_id, %ticket, error = %err, "mutation rolled back");
        self.bump(StoreEvent::RolledBack(entity_id));
        Resolution::RolledBack {
            entity_id,
            next: None,
        }
    }

    fn remove_gone(&mut self, entity_id: E::Id, err: &PersistError) -> Resolution<E::Id, E::Patch> {
        let label = self.label_of(entity_id);
        let dropped = self.pending.remove(&entity_id).map_or(0, |q| q.len());
        self.entities.remove(&entity_id);
        self.order.retain(|id| *id != entity_id);
        warn!(entity = %entity_id, dropped, error = %err, "entity gone remotely, removed");
        self.notices.push(Notice {
            kind: NoticeKind::ItemRemoved,
            message: format!("\"{label}\" no longer exists and was removed."),
        });
        self.bump(StoreEvent::Removed(entity_id));
        Resolution::Removed { entity_id }
    }

    fn label_of(&self, entity_id: E::Id) -> String {
        self.entities
            .get(&entity_id)
            .map(Patchable::label)
            .unwrap_or_else(|| entity_id.to_string())
    }

    fn bump(&mut self, event: StoreEvent<E::Id>) {
        self.revision += 1;
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}
