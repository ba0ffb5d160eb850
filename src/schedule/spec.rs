//! The bitmask cron schedule and its next-after algorithm.

use chrono::{DateTime, Datelike, Duration, FixedOffset, TimeZone, Timelike};

use super::Schedule;

/// A parsed cron expression: one bitmask per field, plus the DOM/DOW
/// "starred" flags that drive their interaction (§4.B).
#[derive(Debug, Clone)]
pub struct SpecSchedule {
    pub(crate) seconds: u64,
    pub(crate) minutes: u64,
    pub(crate) hours: u64,
    pub(crate) dom: u64,
    pub(crate) month: u64,
    pub(crate) dow: u64,
    pub(crate) dom_starred: bool,
    pub(crate) dow_starred: bool,
    /// Whether this schedule has an explicit seconds field (affects the
    /// initial granularity used by `next_after`).
    pub(crate) has_seconds: bool,
}

const YEAR_LOOKAHEAD: i32 = 5;

impl SpecSchedule {
    fn day_matches(&self, t: &DateTime<FixedOffset>) -> bool {
        let dom_match = self.dom & (1 << t.day()) != 0;
        // chrono's Weekday::Sun is 0 in `num_days_from_sunday`.
        let dow_match = self.dow & (1 << t.weekday().num_days_from_sunday()) != 0;

        if self.dom_starred || self.dow_starred {
            dom_match && dow_match
        } else {
            dom_match || dow_match
        }
    }
}

impl Schedule for SpecSchedule {
    fn next_after(&self, after: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        // Start at the earliest possible activation: the next whole second
        // (or next whole minute, if this schedule has no seconds field).
        let mut t = if self.has_seconds {
            let truncated = after - Duration::nanoseconds(after.nanosecond() as i64);
            truncated + Duration::seconds(1)
        } else {
            let truncated = after - Duration::nanoseconds(after.nanosecond() as i64);
            truncated + Duration::minutes(1) - Duration::seconds(truncated.second() as i64)
        };

        let year_limit = t.year() + YEAR_LOOKAHEAD;
        let mut added;

        'wrap: loop {
            if t.year() > year_limit {
                return None;
            }

            added = false;
            while self.month & (1 << t.month()) == 0 {
                if !added {
                    added = true;
                    t = t.timezone().with_ymd_and_hms(t.year(), t.month(), 1, 0, 0, 0).unwrap();
                }
                t = add_months(t, 1);
                if t.month() == 1 {
                    continue 'wrap;
                }
            }

            added = false;
            while !self.day_matches(&t) {
                if !added {
                    added = true;
                    t = t
                        .timezone()
                        .with_ymd_and_hms(t.year(), t.month(), t.day(), 0, 0, 0)
                        .unwrap();
                }
                t += Duration::days(1);
                if t.day() == 1 {
                    continue 'wrap;
                }
            }

            added = false;
            while self.hours & (1 << t.hour()) == 0 {
                if !added {
                    added = true;
                    t = t
                        .timezone()
                        .with_ymd_and_hms(t.year(), t.month(), t.day(), t.hour(), 0, 0)
                        .unwrap();
                }
                t += Duration::hours(1);
                if t.hour() == 0 {
                    continue 'wrap;
                }
            }

            added = false;
            while self.minutes & (1 << t.minute()) == 0 {
                if !added {
                    added = true;
                    t -= Duration::seconds(t.second() as i64);
                }
                t += Duration::minutes(1);
                if t.minute() == 0 {
                    continue 'wrap;
                }
            }

            added = false;
            while self.seconds & (1 << t.second()) == 0 {
                if !added {
                    added = true;
                }
                t += Duration::seconds(1);
                if t.second() == 0 {
                    continue 'wrap;
                }
            }

            return Some(t);
        }
    }
}

fn add_months(t: DateTime<FixedOffset>, months: i32) -> DateTime<FixedOffset> {
    let total = (t.year() * 12 + t.month() as i32 - 1) + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) + 1;
    t.timezone()
        .with_ymd_and_hms(year, month as u32, 1, 0, 0, 0)
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::fields::parse_field;
    use chrono::FixedOffset;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
        utc().with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn build(
        seconds: &str,
        minutes: &str,
        hours: &str,
        dom: &str,
        month: &str,
        dow: &str,
    ) -> SpecSchedule {
        let s = parse_field("second", seconds, 0, 59).unwrap();
        let mi = parse_field("minute", minutes, 0, 59).unwrap();
        let h = parse_field("hour", hours, 0, 23).unwrap();
        let d = parse_field("dom", dom, 1, 31).unwrap();
        let mo = parse_field("month", month, 1, 12).unwrap();
        let w = parse_field("dow", dow, 0, 6).unwrap();
        SpecSchedule {
            seconds: s.mask,
            minutes: mi.mask,
            hours: h.mask,
            dom: d.mask,
            month: mo.mask,
            dow: w.mask,
            dom_starred: d.starred,
            dow_starred: w.starred,
            has_seconds: true,
        }
    }

    #[test]
    fn every_minute_advances_by_one_minute() {
        let s = build("0", "*", "*", "*", "*", "*");
        let next = s.next_after(dt(2024, 1, 1, 10, 30, 0)).unwrap();
        assert_eq!(next, dt(2024, 1, 1, 10, 31, 0));
    }

    #[test]
    fn dom_only_constrains_to_that_day() {
        // "* * * 1 *" -> every second on the 1st of the month only.
        let s = build("*", "*", "*", "1", "*", "*");
        let next = s.next_after(dt(2024, 1, 2, 0, 0, 0)).unwrap();
        assert_eq!((next.month(), next.day()), (2, 1));
    }

    #[test]
    fn dow_only_constrains_to_that_weekday() {
        // "* * * * 1" -> every second on Mondays only.
        let s = build("*", "*", "*", "*", "*", "1");
        let next = s.next_after(dt(2024, 1, 1, 0, 0, 0)).unwrap(); // Jan 1 2024 is a Monday
        // next activation after a Monday midnight is the very next second,
        // still Monday.
        assert_eq!(next.weekday().num_days_from_sunday(), 1);
    }

    #[test]
    fn dom_or_dow_when_both_restricted() {
        // "* * * 1 1" -> 1st OR any Monday.
        let s = build("0", "0", "0", "1", "*", "1");
        // Jan 1 2024 is itself a Monday and the 1st; look from a later start.
        let next = s.next_after(dt(2024, 1, 2, 0, 0, 0)).unwrap();
        assert!(next.day() == 1 || next.weekday().num_days_from_sunday() == 1);
    }

    #[test]
    fn never_matching_dom_returns_none() {
        // Feb 30th never exists.
        let s = build("0", "0", "0", "30", "2", "?");
        assert!(s.next_after(dt(2024, 1, 1, 0, 0, 0)).is_none());
    }

    #[test]
    fn next_is_always_strictly_later() {
        let s = build("*/7", "*/3", "*", "*", "*", "*");
        let after = dt(2024, 6, 15, 12, 0, 0);
        let next = s.next_after(after).unwrap();
        assert!(next > after);
    }
}
