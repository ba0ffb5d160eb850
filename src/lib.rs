//! `rucron`: an in-process, middleware-aware cron scheduler.
//!
//! Callers register jobs against a textual recurrence spec (standard cron
//! grammar, optionally seconds-enabled, plus `@hourly`-style descriptors and
//! `@every <duration>`); the scheduler fires each one concurrently as its
//! schedule comes due, running it through a composable middleware chain
//! (recovery, skip/delay-if-overlapping, distributed mutex, tracing).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rucron::{SchedulerBuilder, JobContext};
//!
//! # async fn example() {
//! let scheduler = SchedulerBuilder::default().with_seconds().build();
//! scheduler
//!     .add_func(
//!         "*/5 * * * * *",
//!         |_ctx: JobContext<()>| async move {
//!             println!("tick");
//!             Ok(())
//!         },
//!         Vec::new(),
//!     )
//!     .expect("valid spec");
//!
//! scheduler.start();
//! scheduler.stop().await;
//! # }
//! ```

pub mod context;
pub mod entry;
pub mod error;
pub mod job;
pub mod logger;
pub mod middleware;
pub mod middlewares;
pub mod option;
pub mod schedule;
pub mod scheduler;
pub mod timezone;

pub use context::{EntryHandle, EntryId, JobContext};
pub use entry::Entry;
pub use error::{CronError, JobError, JobResult, MutexError, ParseError};
pub use job::{FnJob, Job, JobRef, JobWithMutex, JobWithName, NoopJob};
pub use logger::{DiscardLogger, Logger, TracingLogger};
pub use middleware::{chain, Middleware};
pub use option::SchedulerBuilder;
pub use schedule::{IntervalSchedule, NeverSchedule, Parser, Schedule, ScheduleParser, SpecSchedule};
pub use scheduler::{Scheduler, StopHandle};
pub use timezone::TimeZone;
