//! Constant-interval schedule ("@every D").

use chrono::{DateTime, Duration, FixedOffset, Timelike};

use super::Schedule;

/// Fires every `interval` after whatever instant it is asked about,
/// independent of wall-clock boundaries. Sub-second precision is truncated
/// once, at construction (§9 open question (c)), not on every tick.
#[derive(Debug, Clone)]
pub struct IntervalSchedule {
    interval: Duration,
}

impl IntervalSchedule {
    pub fn new(interval: Duration) -> Self {
        let whole_seconds = Duration::seconds(interval.num_seconds());
        Self {
            interval: whole_seconds,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Schedule for IntervalSchedule {
    fn next_after(&self, after: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let truncated = after - Duration::nanoseconds(after.nanosecond() as i64);
        Some(truncated + self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fires_at_a_constant_offset() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let s = IntervalSchedule::new(Duration::seconds(30));
        let t = tz.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            s.next_after(t).unwrap(),
            tz.with_ymd_and_hms(2024, 1, 1, 0, 0, 30).unwrap()
        );
    }

    #[test]
    fn sub_second_component_truncated_at_construction() {
        let s = IntervalSchedule::new(Duration::milliseconds(1500));
        assert_eq!(s.interval(), Duration::seconds(1));
    }
}
