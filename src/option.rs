//! Scheduler construction options, as a consuming-self fluent builder —
//! the same shape as the host's own `AgentBuilder` (`with_*(mut self) ->
//! Self`, terminating in `build()`).

use std::sync::Arc;

use crate::logger::{Logger, TracingLogger};
use crate::middleware::Middleware;
use crate::schedule::{Parser, ScheduleParser};
use crate::scheduler::Scheduler;
use crate::timezone::TimeZone;

/// Builds a [`Scheduler<C>`]. `C` is the root context value type threaded
/// through every job invocation; it defaults to `()`.
pub struct SchedulerBuilder<C = ()> {
    timezone: TimeZone,
    parser: Arc<dyn ScheduleParser>,
    base_middlewares: Vec<Middleware<C>>,
    logger: Arc<dyn Logger>,
    app_context: C,
}

impl Default for SchedulerBuilder<()> {
    fn default() -> Self {
        Self::new(())
    }
}

impl<C> SchedulerBuilder<C>
where
    C: Clone + Send + Sync + 'static,
{
    /// Start building a scheduler whose jobs will receive `app_context`
    /// (cloned) on every invocation.
    pub fn new(app_context: C) -> Self {
        Self {
            timezone: TimeZone::default(),
            parser: Arc::new(Parser::default()),
            base_middlewares: Vec::new(),
            logger: Arc::new(TracingLogger),
            app_context,
        }
    }

    pub fn with_location(mut self, timezone: TimeZone) -> Self {
        self.timezone = timezone;
        self
    }

    /// Switches to a 6-field (leading seconds) parser.
    pub fn with_seconds(mut self) -> Self {
        self.parser = Arc::new(Parser::new(true));
        self
    }

    /// Overrides the spec parser wholesale; replaces any prior parser
    /// (including the effect of [`Self::with_seconds`]), matching the
    /// reference's "last option wins" `WithParser` semantics.
    pub fn with_parser(mut self, parser: Arc<dyn ScheduleParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Replaces the base middleware list applied to every entry (not
    /// appended — matching the reference's `WithMiddleware`).
    pub fn with_base_middlewares(mut self, middlewares: Vec<Middleware<C>>) -> Self {
        self.base_middlewares = middlewares;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> Scheduler<C> {
        Scheduler::new(
            self.timezone,
            self.parser,
            self.base_middlewares,
            self.logger,
            self.app_context,
        )
    }
}
