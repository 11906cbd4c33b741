pub mod optimistic;
pub mod persister;
pub mod remote;

pub use optimistic::{
    Dispatch, MutationRecord, MutationStatus, MutationTicket, Notice, NoticeKind,
    OptimisticMutationStore, Patchable, Resolution, ScheduleDispatch, ScheduleStore, StoreEvent,
};
pub use persister::{Completion, Persister, DEFAULT_PERSIST_TIMEOUT};
pub use remote::{MemoryRemote, RemoteStore};
