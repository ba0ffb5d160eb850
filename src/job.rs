//! The `Job` trait and its adapters.
//!
//! A [`Job`] is the unit of work a schedule entry fires. Capability traits
//! ([`JobWithName`], [`JobWithMutex`]) let a job opt in to richer middleware
//! behavior (tracing, distributed locking) without the scheduler needing to
//! know about them generically — Rust has no structural "does this type
//! satisfy interface X" check, so the opt-in is an explicit accessor method
//! with a `None` default.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::JobResult;

/// A pinned, boxed future, the shape `async_trait` desugars to.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The unit of scheduled work. `C` is the root context value threaded
/// through every invocation (see [`crate::context::JobContext`]).
#[async_trait]
pub trait Job<C = ()>: Send + Sync
where
    C: Send + Sync + 'static,
{
    /// Run the job once.
    async fn run(&self, ctx: crate::context::JobContext<C>) -> JobResult;

    /// Opt in to the `tracing` middleware by returning `Some(self)`.
    fn as_named(&self) -> Option<&dyn JobWithName> {
        None
    }

    /// Opt in to the distributed-mutex middleware by returning `Some(self)`.
    fn as_mutex_aware(&self) -> Option<&dyn JobWithMutex> {
        None
    }
}

/// A job handle shared across the entry, its middleware chain, and any
/// concurrently-firing invocation.
pub type JobRef<C> = Arc<dyn Job<C>>;

/// A capability a job may implement to be named in tracing spans.
pub trait JobWithName: Send + Sync {
    fn name(&self) -> &str;
}

/// A capability a job may implement to participate in the
/// distributed-no-overlapping middleware.
pub trait JobWithMutex: Send + Sync {
    fn mutex_key(&self) -> String;
    fn mutex_ttl(&self) -> Duration;
}

/// Adapts a plain async closure into a [`Job`], the equivalent of the
/// reference's `JobFunc`.
pub struct FnJob<C, F> {
    f: F,
    _marker: PhantomData<fn(C)>,
}

impl<C, F, Fut> FnJob<C, F>
where
    F: Fn(crate::context::JobContext<C>) -> Fut + Send + Sync,
    Fut: Future<Output = JobResult> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<C, F, Fut> Job<C> for FnJob<C, F>
where
    C: Send + Sync + 'static,
    F: Fn(crate::context::JobContext<C>) -> Fut + Send + Sync,
    Fut: Future<Output = JobResult> + Send + 'static,
{
    async fn run(&self, ctx: crate::context::JobContext<C>) -> JobResult {
        (self.f)(ctx).await
    }
}

/// A job that does nothing and always succeeds, useful in tests.
pub struct NoopJob;

#[async_trait]
impl<C> Job<C> for NoopJob
where
    C: Send + Sync + 'static,
{
    async fn run(&self, _ctx: crate::context::JobContext<C>) -> JobResult {
        Ok(())
    }
}
