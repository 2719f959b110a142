//! Reporting for batch operations.
//!
//! Entry sets describe what they do (one line per operation, one line per
//! touched member) through a [`Reporter`] handed to them at construction.
//! Nothing here is global: two entry sets can report to different sinks, and
//! a silent reporter never changes what an operation returns.

use std::sync::Arc;

use tracing::Level;

pub trait Reporter: Send + Sync {
    fn report(&self, level: Level, message: &str);
}

/// Forwards reports to the `tracing` subscriber installed by the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "fileset", "{message}"),
            Level::WARN => tracing::warn!(target: "fileset", "{message}"),
            Level::INFO => tracing::info!(target: "fileset", "{message}"),
            Level::DEBUG => tracing::debug!(target: "fileset", "{message}"),
            _ => tracing::trace!(target: "fileset", "{message}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn report(&self, _level: Level, _message: &str) {}
}

/// The reporter used when none is injected explicitly.
pub fn default_reporter(verbose: bool) -> Arc<dyn Reporter> {
    if verbose {
        Arc::new(TracingReporter)
    } else {
        Arc::new(SilentReporter)
    }
}
