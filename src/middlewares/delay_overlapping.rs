//! Serialize-if-already-running: concurrent invocations queue behind a
//! mutex instead of being dropped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::context::JobContext;
use crate::error::JobResult;
use crate::job::{Job, JobRef};
use crate::logger::Logger;
use crate::middleware::Middleware;

const DEFAULT_REMINDER: Duration = Duration::from_secs(60);

struct DelayOverlappingJob<C> {
    next: JobRef<C>,
    gate: Arc<Mutex<()>>,
    logger: Arc<dyn Logger>,
    reminder: Duration,
}

#[async_trait]
impl<C> Job<C> for DelayOverlappingJob<C>
where
    C: Clone + Send + Sync + 'static,
{
    async fn run(&self, ctx: JobContext<C>) -> JobResult {
        let wait_start = Instant::now();
        let guard = self.gate.lock().await;
        let waited = wait_start.elapsed();
        if waited >= self.reminder {
            self.logger.info(
                "job was waiting to run",
                &[("waited", &format!("{waited:?}"))],
            );
        }
        let result = self.next.run(ctx).await;
        drop(guard);
        result
    }
}

/// Wraps a job with a mutex-serialized gate: concurrent invocations queue
/// rather than being skipped; if a queued invocation waited at least
/// `reminder` (default one minute) it logs at info once it starts.
pub fn delay_if_still_running<C>(logger: Arc<dyn Logger>, reminder: Option<Duration>) -> Middleware<C>
where
    C: Clone + Send + Sync + 'static,
{
    let gate = Arc::new(Mutex::new(()));
    let reminder = reminder.unwrap_or(DEFAULT_REMINDER);
    Arc::new(move |next: JobRef<C>| -> JobRef<C> {
        Arc::new(DelayOverlappingJob {
            next: Arc::clone(&next),
            gate: Arc::clone(&gate),
            logger: Arc::clone(&logger),
            reminder,
        })
    })
}
