//! A schedule that never fires, used as a test sentinel (§8 boundary cases).

use chrono::{DateTime, FixedOffset};

use super::Schedule;

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSchedule;

impl Schedule for NeverSchedule {
    fn next_after(&self, _after: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        None
    }
}
