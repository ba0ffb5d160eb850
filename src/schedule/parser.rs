//! Turns a textual recurrence spec into a [`Schedule`].

use std::sync::Arc;

use chrono::Duration;

use crate::error::ParseError;

use super::fields::parse_field;
use super::{IntervalSchedule, Schedule, SpecSchedule};

/// A pluggable textual-spec-to-`Schedule` parser, the equivalent of the
/// reference's `ScheduleParser` interface.
pub trait ScheduleParser: Send + Sync {
    fn parse(&self, spec: &str) -> Result<Arc<dyn Schedule>, ParseError>;
}

/// The standard parser: 5-field cron by default, 6-field (leading seconds)
/// when constructed `with_seconds(true)`, plus descriptors and `@every`.
#[derive(Debug, Clone, Copy)]
pub struct Parser {
    seconds_enabled: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            seconds_enabled: false,
        }
    }
}

impl Parser {
    pub fn new(seconds_enabled: bool) -> Self {
        Self { seconds_enabled }
    }

    fn expand_descriptor(&self, spec: &str) -> Result<String, ParseError> {
        let body = match spec {
            "@yearly" | "@annually" => "0 0 1 1 *",
            "@monthly" => "0 0 1 * *",
            "@weekly" => "0 0 * * 0",
            "@daily" | "@midnight" => "0 0 * * *",
            "@hourly" => "0 * * * *",
            other => return Err(ParseError::UnknownDescriptor(other.to_string())),
        };
        if self.seconds_enabled {
            Ok(format!("0 {body}"))
        } else {
            Ok(body.to_string())
        }
    }

    fn parse_fields(&self, spec: &str) -> Result<SpecSchedule, ParseError> {
        let tokens: Vec<&str> = spec.split_whitespace().collect();
        let expected_len = if self.seconds_enabled { 6 } else { 5 };
        if tokens.len() != expected_len {
            return Err(ParseError::FieldCount {
                expected: if self.seconds_enabled { "6" } else { "5" },
                got: tokens.len(),
                spec: spec.to_string(),
            });
        }

        let (seconds_tok, rest) = if self.seconds_enabled {
            (tokens[0], &tokens[1..])
        } else {
            ("0", &tokens[..])
        };

        let seconds = parse_field("second", seconds_tok, 0, 59)?;
        let minutes = parse_field("minute", rest[0], 0, 59)?;
        let hours = parse_field("hour", rest[1], 0, 23)?;
        let dom = parse_field("dom", rest[2], 1, 31)?;
        let month = parse_field("month", rest[3], 1, 12)?;
        let dow = parse_field("dow", rest[4], 0, 6)?;

        Ok(SpecSchedule {
            seconds: seconds.mask,
            minutes: minutes.mask,
            hours: hours.mask,
            dom: dom.mask,
            month: month.mask,
            dow: dow.mask,
            dom_starred: dom.starred,
            dow_starred: dow.starred,
            has_seconds: self.seconds_enabled,
        })
    }
}

impl ScheduleParser for Parser {
    fn parse(&self, spec: &str) -> Result<Arc<dyn Schedule>, ParseError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(ParseError::Empty);
        }

        if let Some(duration_spec) = spec.strip_prefix("@every ") {
            let duration = parse_duration(duration_spec)?;
            return Ok(Arc::new(IntervalSchedule::new(duration)));
        }

        if spec.starts_with('@') {
            let expanded = self.expand_descriptor(spec)?;
            return Ok(Arc::new(self.parse_fields(&expanded)?));
        }

        Ok(Arc::new(self.parse_fields(spec)?))
    }
}

/// Parses a Go-duration-style string (`"1h30m"`, `"500ms"`) into a
/// [`chrono::Duration`]. A bare number with no unit is rejected rather than
/// silently assumed to be seconds.
fn parse_duration(raw: &str) -> Result<Duration, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParseError::BadDuration(raw.to_string()));
    }

    let mut total = Duration::zero();
    let mut chars = raw.char_indices().peekable();
    let mut consumed_any = false;

    while let Some(&(start, c)) = chars.peek() {
        if !c.is_ascii_digit() && c != '.' {
            return Err(ParseError::BadDuration(raw.to_string()));
        }
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                end = i + c.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let number: f64 = raw[start..end]
            .parse()
            .map_err(|_| ParseError::BadDuration(raw.to_string()))?;

        let unit_start = end;
        let mut unit_end = unit_start;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_ascii_alphabetic() || c == 'µ' {
                unit_end = i + c.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        if unit_start == unit_end {
            return Err(ParseError::BadDuration(raw.to_string()));
        }
        let unit = &raw[unit_start..unit_end];

        let nanos_per_unit: f64 = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" => 60.0 * 1_000_000_000.0,
            "h" => 3_600.0 * 1_000_000_000.0,
            _ => return Err(ParseError::BadDuration(raw.to_string())),
        };

        let nanos = number * nanos_per_unit;
        total += Duration::nanoseconds(nanos as i64);
        consumed_any = true;
    }

    if !consumed_any {
        return Err(ParseError::BadDuration(raw.to_string()));
    }
    Ok(total)
}
