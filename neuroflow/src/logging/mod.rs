//! Multi-sink logging for pipeline runs.
//!
//! A [`Logger`] broadcasts each [`LogEvent`] to an ordered list of [`Sink`]s:
//! the console, a plain-text file, and a JSON-lines file. A [`LogSession`]
//! owns the logger across a run and swaps in the file sinks once the output
//! directory is known.
//!
//! FATAL is the only severity with behavior: [`Logger::fatal`] logs and
//! flushes everywhere, then hands back the error that stops the pipeline.

mod event;
mod files;
mod logger;
mod severity;
pub mod sink;

pub use event::{JsonRecord, LogEvent};
pub use files::{softlink, LogFiles, LogSession, LoggerState};
pub use logger::Logger;
pub use severity::{ParseSeverityError, Severity};
pub use sink::{ConsoleSink, FileSink, LineFormat, MemorySink, Sink, WriterSink};
