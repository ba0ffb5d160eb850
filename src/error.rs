//! Crate-level error types.
//!
//! Registration-time failures (`CronError`/`ParseError`) are returned to the
//! caller synchronously. Runtime failures (`JobError`, `MutexError`) never
//! unwind out of the dispatcher; they are surfaced through the configured
//! [`crate::logger::Logger`] and, where relevant, through a middleware's own
//! return value.

use thiserror::Error;

/// A job's own fallible result. Jobs bring their own error types; the
/// scheduler only needs to log and display them, never to match on their
/// variants.
pub type JobError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by [`crate::job::Job::run`].
pub type JobResult = Result<(), JobError>;

/// Errors raised while parsing a textual recurrence spec into a `Schedule`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("empty schedule spec")]
    Empty,

    #[error("wrong number of fields: expected {expected}, got {got} in {spec:?}")]
    FieldCount {
        expected: &'static str,
        got: usize,
        spec: String,
    },

    #[error("unrecognized descriptor {0:?}")]
    UnknownDescriptor(String),

    #[error("malformed duration {0:?} for @every")]
    BadDuration(String),

    #[error("malformed field atom {atom:?} in field {field}")]
    BadAtom { field: &'static str, atom: String },

    #[error("value {value} out of range for field {field} (expected {min}-{max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("unrecognized name {name:?} in field {field}")]
    UnknownName { field: &'static str, name: String },
}

/// Errors raised by a [`crate::middlewares::distributed_no_overlapping`]
/// mutex backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MutexError {
    #[error("failed to acquire mutex for key {key:?}: {source}")]
    Acquire {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("failed to release mutex for key {key:?}: {source}")]
    Release {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// Top-level crate error, covering anything that can go wrong outside of a
/// job invocation itself.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CronError {
    #[error("invalid schedule: {0}")]
    Parse(#[from] ParseError),

    #[error("distributed mutex error: {0}")]
    Mutex(#[from] MutexError),
}
