//! Emits a span per firing, named `cron <name>`, for jobs that opt in via
//! [`crate::job::JobWithName`].
//!
//! Grounded in the host's own `#[instrument(skip(...), fields(...))]`
//! convention on its async handlers — here built by hand, since the span
//! must be created conditionally (only when the wrapped job is named) and
//! `#[instrument]` cannot express that. A consumer who wants these spans
//! exported to OpenTelemetry installs `tracing-opentelemetry`'s layer on
//! their own subscriber; this crate only emits plain `tracing` spans.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::field::Empty;
use tracing::Instrument;

use crate::context::JobContext;
use crate::error::JobResult;
use crate::job::{Job, JobRef};
use crate::middleware::Middleware;

struct TracingJob<C> {
    next: JobRef<C>,
}

#[async_trait]
impl<C> Job<C> for TracingJob<C>
where
    C: Clone + Send + Sync + 'static,
{
    async fn run(&self, ctx: JobContext<C>) -> JobResult {
        let Some(named) = self.next.as_named() else {
            return self.next.run(ctx).await;
        };

        let entry = ctx.entry();
        let id = entry.map(|e| e.id().value());
        let prev = entry.and_then(|e| e.prev()).map(|t| t.to_rfc3339());
        let next = entry.and_then(|e| e.next()).map(|t| t.to_rfc3339());

        let span = tracing::info_span!(
            "cron",
            name = named.name(),
            entry_id = id,
            prev = prev.as_deref(),
            next = next.as_deref(),
            error = Empty,
        );

        async move {
            let result = self.next.run(ctx).await;
            if let Err(err) = &result {
                tracing::Span::current().record("error", tracing::field::display(err));
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wraps a job so its invocations show up as `cron <name>` spans, provided
/// the job implements [`crate::job::JobWithName`]; otherwise passes through.
pub fn tracing<C>() -> Middleware<C>
where
    C: Clone + Send + Sync + 'static,
{
    Arc::new(move |next: JobRef<C>| -> JobRef<C> { Arc::new(TracingJob { next }) })
}
