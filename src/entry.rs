//! A registered (schedule, job) pair.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use crate::context::{EntryHandle, EntryId, JobContext};
use crate::job::{Job, JobRef};
use crate::middleware::{chain, Middleware};
use crate::schedule::Schedule;

/// A registered job: id, schedule, the callable after middleware
/// composition, and accessors onto its mutable `next`/`prev` state.
///
/// `wrapped` is built once at construction by composing, outermost first,
/// an injector that attaches this entry to the invocation context, then the
/// middlewares supplied at registration (§4.C).
pub struct Entry<C> {
    handle: Arc<EntryHandle<C>>,
    schedule: Arc<dyn Schedule>,
    job: JobRef<C>,
    wrapped: JobRef<C>,
    middlewares: Vec<Middleware<C>>,
}

impl<C> Clone for Entry<C> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
            schedule: Arc::clone(&self.schedule),
            job: Arc::clone(&self.job),
            wrapped: Arc::clone(&self.wrapped),
            middlewares: self.middlewares.clone(),
        }
    }
}

impl<C> Entry<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        id: EntryId,
        schedule: Arc<dyn Schedule>,
        job: JobRef<C>,
        middlewares: Vec<Middleware<C>>,
    ) -> Self {
        let handle = EntryHandle::new(id, Arc::clone(&job));

        let injector: Middleware<C> = {
            let handle = Arc::clone(&handle);
            Arc::new(move |next: JobRef<C>| -> JobRef<C> {
                let handle = Arc::clone(&handle);
                Arc::new(EntryInjector {
                    handle,
                    next,
                })
            })
        };

        let mut all = Vec::with_capacity(middlewares.len() + 1);
        all.push(injector);
        all.extend(middlewares.iter().cloned());

        let wrapped = chain(&all, Arc::clone(&job));

        Self {
            handle,
            schedule,
            job,
            wrapped,
            middlewares,
        }
    }

    pub fn id(&self) -> EntryId {
        self.handle.id()
    }

    pub fn schedule(&self) -> &Arc<dyn Schedule> {
        &self.schedule
    }

    pub fn next(&self) -> Option<DateTime<FixedOffset>> {
        self.handle.next()
    }

    pub fn prev(&self) -> Option<DateTime<FixedOffset>> {
        self.handle.prev()
    }

    pub fn job(&self) -> &JobRef<C> {
        &self.job
    }

    pub fn wrapped_job(&self) -> &JobRef<C> {
        &self.wrapped
    }

    pub fn middlewares(&self) -> &[Middleware<C>] {
        &self.middlewares
    }

    /// True iff this entry carries a real, scheduler-issued id.
    pub fn valid(&self) -> bool {
        self.handle.id().is_valid()
    }

    pub(crate) fn handle(&self) -> &Arc<EntryHandle<C>> {
        &self.handle
    }

    pub(crate) fn set_next(&self, next: Option<DateTime<FixedOffset>>) {
        self.handle.set_next(next);
    }

    pub(crate) fn fire(&self, next: Option<DateTime<FixedOffset>>) {
        self.handle.fire(next);
    }
}

/// The outermost middleware every entry installs: attaches the entry handle
/// to the job context before delegating to the rest of the chain.
struct EntryInjector<C> {
    handle: Arc<EntryHandle<C>>,
    next: JobRef<C>,
}

#[async_trait::async_trait]
impl<C> Job<C> for EntryInjector<C>
where
    C: Clone + Send + Sync + 'static,
{
    async fn run(&self, ctx: JobContext<C>) -> crate::error::JobResult {
        let ctx = ctx.with_entry(Arc::clone(&self.handle));
        self.next.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::NoopJob;
    use crate::schedule::NeverSchedule;

    #[tokio::test]
    async fn injector_attaches_entry_to_context() {
        struct CheckJob;
        #[async_trait::async_trait]
        impl Job<()> for CheckJob {
            async fn run(&self, ctx: JobContext<()>) -> crate::error::JobResult {
                assert!(ctx.entry().is_some());
                assert_eq!(ctx.entry().unwrap().id().value(), 7);
                Ok(())
            }
        }

        let entry: Entry<()> = Entry::new(
            EntryId(7),
            Arc::new(NeverSchedule),
            Arc::new(CheckJob),
            Vec::new(),
        );
        entry
            .wrapped_job()
            .run(JobContext::new(()))
            .await
            .unwrap();
    }

    #[test]
    fn id_zero_is_invalid() {
        let entry: Entry<()> = Entry::new(
            EntryId(0),
            Arc::new(NeverSchedule),
            Arc::new(NoopJob),
            Vec::new(),
        );
        assert!(!entry.valid());
    }
}
