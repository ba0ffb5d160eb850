//! Skip-if-already-running: a single-slot, non-blocking gate.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::context::JobContext;
use crate::error::JobResult;
use crate::job::{Job, JobRef};
use crate::logger::Logger;
use crate::middleware::Middleware;

struct NoOverlappingJob<C> {
    next: JobRef<C>,
    gate: Arc<Semaphore>,
    logger: Arc<dyn Logger>,
}

#[async_trait]
impl<C> Job<C> for NoOverlappingJob<C>
where
    C: Clone + Send + Sync + 'static,
{
    async fn run(&self, ctx: JobContext<C>) -> JobResult {
        match self.gate.try_acquire() {
            Ok(_permit) => self.next.run(ctx).await,
            Err(_) => {
                self.logger.info("job is still running, skip", &[]);
                Ok(())
            }
        }
    }
}

/// Wraps a job with a one-slot token: at most one invocation of the
/// wrapped job runs at a time for this middleware instance; overlapping
/// attempts are dropped, not queued. Each call to this function returns a
/// fresh gate — do not reuse one `Middleware` value across distinct entries.
pub fn skip_if_still_running<C>(logger: Arc<dyn Logger>) -> Middleware<C>
where
    C: Clone + Send + Sync + 'static,
{
    let gate = Arc::new(Semaphore::new(1));
    Arc::new(move |next: JobRef<C>| -> JobRef<C> {
        Arc::new(NoOverlappingJob {
            next: Arc::clone(&next),
            gate: Arc::clone(&gate),
            logger: Arc::clone(&logger),
        })
    })
}
