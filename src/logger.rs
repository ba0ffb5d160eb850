//! The operational log sink (§4/§6 `Logger` interface).
//!
//! The reference defines its own `Logger` interface with `PrintfLogger`
//! adapters; this crate's own internals, and the default implementation
//! handed to jobs, log through `tracing` like the rest of the host's stack,
//! so a consumer who already has a `tracing` subscriber installed gets
//! scheduler diagnostics for free.

use std::error::Error;
use std::fmt;

/// Sink for operational info/error messages, implemented by the scheduler's
/// built-in middlewares and available to user middleware via [`crate::option::SchedulerBuilder::with_logger`].
pub trait Logger: Send + Sync {
    fn info(&self, msg: &str, fields: &[(&str, &str)]);
    fn error(&self, err: &(dyn Error + 'static), msg: &str, fields: &[(&str, &str)]);
}

fn format_fields(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The default logger: forwards to `tracing::info!`/`tracing::error!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, msg: &str, fields: &[(&str, &str)]) {
        if fields.is_empty() {
            tracing::info!(target: "rucron", "{msg}");
        } else {
            tracing::info!(target: "rucron", "{msg} {}", format_fields(fields));
        }
    }

    fn error(&self, err: &(dyn Error + 'static), msg: &str, fields: &[(&str, &str)]) {
        if fields.is_empty() {
            tracing::error!(target: "rucron", error = %err, "{msg}");
        } else {
            tracing::error!(target: "rucron", error = %err, "{msg} {}", format_fields(fields));
        }
    }
}

/// A logger that discards everything, for tests and benchmarks.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardLogger;

impl Logger for DiscardLogger {
    fn info(&self, _msg: &str, _fields: &[(&str, &str)]) {}
    fn error(&self, _err: &(dyn Error + 'static), _msg: &str, _fields: &[(&str, &str)]) {}
}

impl fmt::Debug for dyn Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Logger")
    }
}
