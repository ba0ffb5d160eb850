//! The zone in which schedules are interpreted (the reference's `Location`).

use chrono::{DateTime, FixedOffset, Local, Utc};

/// Configures which wall-clock zone `next`/`prev` instants are computed and
/// reported in.
#[derive(Debug, Clone)]
pub enum TimeZone {
    /// The process's local timezone.
    Local,
    /// UTC.
    Utc,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl Default for TimeZone {
    fn default() -> Self {
        TimeZone::Local
    }
}

impl TimeZone {
    /// The current instant, in this zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self {
            TimeZone::Local => {
                let now = Local::now();
                now.with_timezone(now.offset())
            }
            TimeZone::Utc => Utc::now().with_timezone(&FixedOffset::east_opt(0).unwrap()),
            TimeZone::Fixed(offset) => Utc::now().with_timezone(offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_now_has_zero_offset() {
        let tz = TimeZone::Utc;
        assert_eq!(tz.now().offset().utc_minus_local(), 0);
    }

    #[test]
    fn fixed_offset_preserved() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let tz = TimeZone::Fixed(offset);
        assert_eq!(*tz.now().offset(), offset);
    }
}
