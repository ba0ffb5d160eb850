//! Catches a panicking job invocation and reports it as a logged error
//! rather than letting it unwind out of the firing task.
//!
//! A goroutine's `recover()` has no direct analogue inside a single async
//! task; the idiomatic Tokio substitute is to run the wrapped invocation on
//! its own spawned task and inspect the resulting `JoinError` (§4.E).

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::JobContext;
use crate::error::JobResult;
use crate::job::{Job, JobRef};
use crate::logger::Logger;
use crate::middleware::Middleware;

struct RecoveryJob<C> {
    next: JobRef<C>,
    logger: Arc<dyn Logger>,
}

#[async_trait]
impl<C> Job<C> for RecoveryJob<C>
where
    C: Clone + Send + Sync + 'static,
{
    async fn run(&self, ctx: JobContext<C>) -> JobResult {
        let next = Arc::clone(&self.next);
        match tokio::spawn(async move { next.run(ctx).await }).await {
            Ok(result) => result,
            Err(join_err) => {
                let is_panic = join_err.is_panic();
                let message = panic_message(join_err);
                self.logger.error(
                    &PanicError(message.clone()),
                    if is_panic {
                        "job panicked, recovered"
                    } else {
                        "job task was cancelled"
                    },
                    &[("panic", message.as_str())],
                );
                Ok(())
            }
        }
    }
}

/// Extracts the panic payload message, mirroring Go's `recover()` returning
/// the value passed to `panic()`. A full unwind backtrace is only available
/// when the process ran with `RUST_BACKTRACE=1`; this crate does not assume
/// it is present.
fn panic_message(join_err: tokio::task::JoinError) -> String {
    if !join_err.is_panic() {
        return "task was cancelled before completion".to_string();
    }
    let payload = join_err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked with a non-string payload".to_string()
    }
}

#[derive(Debug)]
struct PanicError(String);

impl std::fmt::Display for PanicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PanicError {}

/// Wraps a job so that a panic during its invocation is caught, logged, and
/// does not propagate.
pub fn recovery<C>(logger: Arc<dyn Logger>) -> Middleware<C>
where
    C: Clone + Send + Sync + 'static,
{
    Arc::new(move |next: JobRef<C>| -> JobRef<C> {
        Arc::new(RecoveryJob {
            next: Arc::clone(&next),
            logger: Arc::clone(&logger),
        })
    })
}
