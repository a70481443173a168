//! The fan-out logger and the fatal path.

use super::{ConsoleSink, LogEvent, Severity, Sink};
use crate::errors::PipelineError;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// A logging facade that broadcasts every event to its sinks.
///
/// Delivery is synchronous: `log` returns only after every sink has been
/// handed the event. Each sink applies its own level threshold; nothing is
/// filtered globally. FATAL passes every threshold.
#[derive(Clone, Default)]
pub struct Logger {
    sinks: Vec<Arc<dyn Sink>>,
}

impl Logger {
    /// Creates a logger over `sinks`, delivered to in the given order.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    /// Creates a logger with only a console sink.
    #[must_use]
    pub fn console(min_level: Severity) -> Self {
        let console: Arc<dyn Sink> = Arc::new(ConsoleSink::console().with_min_level(min_level));
        Self::new(vec![console])
    }

    /// Creates a logger that discards everything.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    /// Returns a copy of this logger with `sink` appended.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Returns the number of registered sinks.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Logs a message at `severity`, optionally tagged with a program label.
    pub fn log(&self, severity: Severity, label: Option<&str>, message: impl Into<String>) {
        self.emit(&LogEvent::new(severity, label, message));
    }

    /// Delivers an already built event to every sink that keeps its severity.
    /// FATAL reaches every sink.
    pub fn emit(&self, event: &LogEvent) {
        for sink in &self.sinks {
            if event.severity != Severity::Fatal && event.severity < sink.min_level() {
                continue;
            }
            if let Err(err) = sink.accept(event) {
                warn!(error = %err, severity = %event.severity, "log sink rejected event");
            }
        }
    }

    /// Logs at DEBUG.
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Severity::Debug, None, message);
    }

    /// Logs at INFO.
    pub fn info(&self, message: impl Into<String>) {
        self.log(Severity::Info, None, message);
    }

    /// Logs a section heading.
    pub fn title(&self, message: impl Into<String>) {
        self.log(Severity::Title, None, message);
    }

    /// Logs at WARN.
    pub fn warn(&self, message: impl Into<String>) {
        self.log(Severity::Warn, None, message);
    }

    /// Logs at ERROR.
    pub fn error(&self, message: impl Into<String>) {
        self.log(Severity::Error, None, message);
    }

    /// Logs a command line under `label`.
    pub fn command(&self, label: &str, command_line: impl Into<String>) {
        self.log(Severity::Command, Some(label), command_line);
    }

    /// Flushes every sink, reporting failures through `tracing`.
    pub fn flush(&self) {
        for sink in &self.sinks {
            if let Err(err) = sink.flush() {
                warn!(error = %err, "log sink failed to flush");
            }
        }
    }

    /// Logs `message` at FATAL to every sink regardless of its threshold,
    /// flushes every sink, and returns the error that ends the run.
    ///
    /// The caller propagates the returned error with `?`; the process exits
    /// once, at the top level, after every sink already holds the message.
    #[must_use = "the fatal error must be propagated to stop the pipeline"]
    pub fn fatal(&self, message: impl Into<String>) -> PipelineError {
        let message = message.into();
        self.log(Severity::Fatal, None, message.clone());
        self.flush();
        PipelineError::Fatal(message)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
