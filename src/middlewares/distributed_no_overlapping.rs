//! An external-mutex gate, for coordinating across processes.
//!
//! Requires the wrapped job to implement [`crate::job::JobWithMutex`]; if it
//! doesn't, this middleware passes through unchanged (§4.E). The owning
//! entry is discovered via the ambient [`JobContext`], and the capability
//! check is made against the entry's *original* job, since that is the
//! concrete type that can still expose it — the already-chained `next`
//! callable has lost it behind a trait object boundary, the same reason the
//! reference reaches through `EntryFromContext` rather than asserting on
//! its own `original` parameter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::JobContext;
use crate::error::{JobResult, MutexError};
use crate::job::{Job, JobRef, JobWithMutex};
use crate::logger::Logger;
use crate::middleware::Middleware;

/// An external, named, TTL'd lock — the collaborator interface this
/// middleware drives (§6).
#[async_trait]
pub trait DistributedMutex: Send + Sync {
    async fn lock(&self, job: &dyn JobWithMutex) -> Result<bool, MutexError>;
    async fn unlock(&self, job: &dyn JobWithMutex) -> Result<(), MutexError>;
}

/// A mutex backend that always succeeds without actually coordinating
/// anything, useful in tests and as a harmless default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMutex;

#[async_trait]
impl DistributedMutex for NoopMutex {
    async fn lock(&self, _job: &dyn JobWithMutex) -> Result<bool, MutexError> {
        Ok(true)
    }

    async fn unlock(&self, _job: &dyn JobWithMutex) -> Result<(), MutexError> {
        Ok(())
    }
}

struct DistributedNoOverlappingJob<C> {
    next: JobRef<C>,
    mutex: Arc<dyn DistributedMutex>,
    logger: Arc<dyn Logger>,
}

#[async_trait]
impl<C> Job<C> for DistributedNoOverlappingJob<C>
where
    C: Clone + Send + Sync + 'static,
{
    async fn run(&self, ctx: JobContext<C>) -> JobResult {
        let Some(entry) = ctx.entry() else {
            return self.next.run(ctx).await;
        };
        let Some(mutex_aware) = entry.original_job().as_mutex_aware() else {
            return self.next.run(ctx).await;
        };

        match self.mutex.lock(mutex_aware).await {
            Ok(true) => {
                let result = self.next.run(ctx).await;
                if let Err(err) = self.mutex.unlock(mutex_aware).await {
                    self.logger
                        .error(&err, "failed to release distributed mutex", &[]);
                }
                result
            }
            Ok(false) => {
                self.logger
                    .info("distributed mutex already held, skip", &[]);
                Ok(())
            }
            Err(err) => {
                self.logger
                    .error(&err, "failed to acquire distributed mutex", &[]);
                Err(Box::new(err))
            }
        }
    }
}

/// Wraps a job with an external mutex gate, keyed and TTL'd by the job's
/// own [`JobWithMutex`] capability.
pub fn distributed_no_overlapping<C>(
    mutex: Arc<dyn DistributedMutex>,
    logger: Arc<dyn Logger>,
) -> Middleware<C>
where
    C: Clone + Send + Sync + 'static,
{
    Arc::new(move |next: JobRef<C>| -> JobRef<C> {
        Arc::new(DistributedNoOverlappingJob {
            next: Arc::clone(&next),
            mutex: Arc::clone(&mutex),
            logger: Arc::clone(&logger),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EntryId;
    use crate::entry::Entry;
    use crate::job::FnJob;
    use crate::logger::DiscardLogger;
    use crate::schedule::NeverSchedule;
    use std::time::Duration;

    struct MutexAwareJob;
    #[async_trait]
    impl Job<()> for MutexAwareJob {
        async fn run(&self, _ctx: JobContext<()>) -> JobResult {
            Ok(())
        }
        fn as_mutex_aware(&self) -> Option<&dyn JobWithMutex> {
            Some(self)
        }
    }
    impl JobWithMutex for MutexAwareJob {
        fn mutex_key(&self) -> String {
            "job-x".to_string()
        }
        fn mutex_ttl(&self) -> Duration {
            Duration::from_secs(30)
        }
    }

    #[tokio::test]
    async fn passes_through_without_entry_context() {
        let job: JobRef<()> = Arc::new(FnJob::new(|_ctx: JobContext<()>| async { Ok(()) }));
        let wrapped =
            distributed_no_overlapping::<()>(Arc::new(NoopMutex), Arc::new(DiscardLogger))(job);
        assert!(wrapped.run(JobContext::new(())).await.is_ok());
    }

    #[tokio::test]
    async fn locks_and_unlocks_around_capable_job() {
        let entry: Entry<()> = Entry::new(
            EntryId(1),
            Arc::new(NeverSchedule),
            Arc::new(MutexAwareJob),
            vec![distributed_no_overlapping(
                Arc::new(NoopMutex),
                Arc::new(DiscardLogger),
            )],
        );
        let result = entry.wrapped_job().run(JobContext::new(())).await;
        assert!(result.is_ok());
    }
}
