//! The per-invocation context and the entry handle it carries.
//!
//! Go's reference threads an ambient `context.Context` value through every
//! call; Rust has no equivalent implicit mechanism, so the context is an
//! explicit struct. [`EntryHandle`] is the split-out, cheaply-`Clone`-able
//! half of an [`crate::entry::Entry`] that both the scheduler (which mutates
//! `next`/`prev`) and the entry's own injector middleware (which only reads
//! them) can hold a reference to without the entry being self-referential.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use parking_lot::RwLock;

use crate::job::JobRef;

/// Monotonically-increasing entry identifier. `0` is never issued and
/// denotes the invalid/zero entry, kept for parity with the reference's
/// "valid iff id != 0" predicate even though this crate otherwise prefers
/// `Option<Entry<C>>` to convey absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

impl EntryId {
    /// True iff this id was actually issued by a scheduler.
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct EntryState {
    next: Option<DateTime<FixedOffset>>,
    prev: Option<DateTime<FixedOffset>>,
}

/// The shareable half of an entry: immutable id and original job, plus the
/// mutable `next`/`prev` pair the dispatcher updates after every firing.
pub struct EntryHandle<C> {
    id: EntryId,
    state: RwLock<EntryState>,
    original_job: JobRef<C>,
}

impl<C> EntryHandle<C>
where
    C: Send + Sync + 'static,
{
    pub(crate) fn new(id: EntryId, original_job: JobRef<C>) -> Arc<Self> {
        Arc::new(Self {
            id,
            state: RwLock::new(EntryState {
                next: None,
                prev: None,
            }),
            original_job,
        })
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn next(&self) -> Option<DateTime<FixedOffset>> {
        self.state.read().next
    }

    pub fn prev(&self) -> Option<DateTime<FixedOffset>> {
        self.state.read().prev
    }

    /// The job as originally submitted, before middleware wrapping — used
    /// by middlewares that need to inspect capability traits (distributed
    /// mutex) that the wrapped callable would no longer expose.
    pub fn original_job(&self) -> &JobRef<C> {
        &self.original_job
    }

    pub(crate) fn set_next(&self, next: Option<DateTime<FixedOffset>>) {
        self.state.write().next = next;
    }

    pub(crate) fn fire(&self, next: Option<DateTime<FixedOffset>>) {
        let mut state = self.state.write();
        state.prev = state.next;
        state.next = next;
    }
}

/// The value every job invocation receives: the caller's root context value
/// plus (when running under a scheduler) a reference to the firing entry.
#[derive(Clone)]
pub struct JobContext<C> {
    /// The caller-supplied root context value, cloned per invocation.
    pub app: C,
    entry: Option<Arc<EntryHandle<C>>>,
}

impl<C> JobContext<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub fn new(app: C) -> Self {
        Self { app, entry: None }
    }

    pub(crate) fn with_entry(mut self, entry: Arc<EntryHandle<C>>) -> Self {
        self.entry = Some(entry);
        self
    }

    /// The equivalent of the reference's `EntryFromContext`: the firing
    /// entry, or `None` outside of scheduler-managed dispatch (e.g. a job
    /// invoked directly in a unit test).
    pub fn entry(&self) -> Option<&Arc<EntryHandle<C>>> {
        self.entry.as_ref()
    }
}
