//! Middleware: a function `Job -> Job`, composed outer-first.

use std::sync::Arc;

use crate::job::JobRef;

/// A middleware wraps one job callable into another. Implementations may
/// hold state private to the one wrapped job they were built for (a gate
/// channel, a lock) — a middleware factory is expected to be called once per
/// entry, never shared across entries.
pub type Middleware<C> = Arc<dyn Fn(JobRef<C>) -> JobRef<C> + Send + Sync>;

/// Compose a list of middlewares so that `chain([m1, m2, m3])(inner)` calls
/// `m1(m2(m3(inner)))` — outer-first. The empty chain is the identity,
/// built by folding right-to-left exactly as the reference's `Chain` does.
pub fn chain<C>(middlewares: &[Middleware<C>], inner: JobRef<C>) -> JobRef<C>
where
    C: Send + Sync + 'static,
{
    middlewares
        .iter()
        .rev()
        .fold(inner, |acc, m| m(acc))
}

/// A middleware that does nothing, useful as a default or in tests.
pub fn noop<C>() -> Middleware<C>
where
    C: Send + Sync + 'static,
{
    Arc::new(|job: JobRef<C>| job)
}
