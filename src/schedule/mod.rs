//! The `Schedule` abstraction and its implementations.

mod fields;
mod interval;
mod never;
mod parser;
mod spec;

pub use interval::IntervalSchedule;
pub use never::NeverSchedule;
pub use parser::{Parser, ScheduleParser};
pub use spec::SpecSchedule;

use chrono::{DateTime, FixedOffset};

/// Computes the next activation instant strictly after a given one, or
/// `None` if the schedule never fires again (the Rust stand-in for the
/// reference's zero-instant sentinel).
pub trait Schedule: Send + Sync {
    fn next_after(&self, after: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>>;
}
