//! Sink trait and implementations.

use super::{LogEvent, Severity};
use parking_lot::{Mutex, RwLock};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// A destination for log events.
///
/// The [`Logger`](super::Logger) only hands a sink events at or above its
/// [`min_level`](Sink::min_level), one at a time and in creation order.
#[cfg_attr(test, mockall::automock)]
pub trait Sink: Send + Sync {
    /// Accepts one event.
    fn accept(&self, event: &LogEvent) -> io::Result<()>;

    /// Flushes anything buffered.
    fn flush(&self) -> io::Result<()>;

    /// The lowest severity this sink keeps.
    fn min_level(&self) -> Severity;
}

/// How a [`WriterSink`] renders each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    /// One human-readable line per event.
    Plain,
    /// One JSON object per line.
    Json,
}

/// A sink that renders events as lines into any writer.
pub struct WriterSink<W: Write + Send> {
    format: LineFormat,
    min_level: Severity,
    pid: u32,
    writer: Mutex<W>,
}

/// Human-readable lines on standard output.
pub type ConsoleSink = WriterSink<io::Stdout>;

/// Lines appended to a file owned by the sink.
pub type FileSink = WriterSink<BufWriter<File>>;

impl<W: Write + Send> WriterSink<W> {
    /// Creates a sink around `writer`.
    pub fn new(writer: W, format: LineFormat) -> Self {
        Self {
            format,
            min_level: Severity::Debug,
            pid: std::process::id(),
            writer: Mutex::new(writer),
        }
    }

    /// Sets the lowest severity kept by this sink.
    #[must_use]
    pub fn with_min_level(mut self, level: Severity) -> Self {
        self.min_level = level;
        self
    }

    /// Returns the line format.
    pub fn format(&self) -> LineFormat {
        self.format
    }

    /// Runs `f` with the underlying writer locked.
    pub fn with_writer<R>(&self, f: impl FnOnce(&W) -> R) -> R {
        let guard = self.writer.lock();
        f(&*guard)
    }

    fn render(&self, event: &LogEvent) -> String {
        match self.format {
            LineFormat::Plain => event.to_plain_line(self.pid),
            LineFormat::Json => event.to_json_line(),
        }
    }
}

impl WriterSink<io::Stdout> {
    /// Creates a plain-text sink on standard output.
    #[must_use]
    pub fn console() -> Self {
        Self::new(io::stdout(), LineFormat::Plain)
    }
}

impl WriterSink<BufWriter<File>> {
    /// Creates `path` (truncating any existing file) and returns a sink
    /// writing to it.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be opened.
    pub fn create(path: impl AsRef<Path>, format: LineFormat) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        Ok(Self::new(BufWriter::new(file), format))
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn accept(&self, event: &LogEvent) -> io::Result<()> {
        let line = self.render(event);
        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")
    }

    fn flush(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }

    fn min_level(&self) -> Severity {
        self.min_level
    }
}

impl<W: Write + Send> std::fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterSink")
            .field("format", &self.format)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

/// A sink that keeps events in memory.
///
/// Used by tests and by callers that want to inspect a run's log afterwards.
#[derive(Debug, Default)]
pub struct MemorySink {
    min_level: Severity,
    events: RwLock<Vec<LogEvent>>,
}

impl MemorySink {
    /// Creates an empty sink keeping every severity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty sink that drops events below `level`.
    #[must_use]
    pub fn with_min_level(level: Severity) -> Self {
        Self {
            min_level: level,
            events: RwLock::new(Vec::new()),
        }
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.read().clone()
    }

    /// Returns the messages of all collected events.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.events.read().iter().map(|e| e.message.clone()).collect()
    }

    /// Returns the events with the given severity.
    #[must_use]
    pub fn of_severity(&self, severity: Severity) -> Vec<LogEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.severity == severity)
            .cloned()
            .collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl Sink for MemorySink {
    fn accept(&self, event: &LogEvent) -> io::Result<()> {
        self.events.write().push(event.clone());
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    fn min_level(&self) -> Severity {
        self.min_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sink_plain_lines() {
        let sink = WriterSink::new(Vec::new(), LineFormat::Plain);
        sink.accept(&LogEvent::new(Severity::Info, None, "first")).unwrap();
        sink.accept(&LogEvent::new(Severity::Warn, Some("bet"), "second")).unwrap();

        let text = sink.with_writer(|buf| String::from_utf8(buf.clone()).unwrap());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("I, ["));
        assert!(lines[0].ends_with("INFO -- : first"));
        assert!(lines[1].ends_with("WARN -- bet: second"));
    }

    #[test]
    fn test_writer_sink_json_lines() {
        let sink = WriterSink::new(Vec::new(), LineFormat::Json);
        sink.accept(&LogEvent::new(Severity::Error, Some("3dvolreg"), "nonzero exit code: 1"))
            .unwrap();

        let text = sink.with_writer(|buf| String::from_utf8(buf.clone()).unwrap());
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["level_id"], 6);
        assert_eq!(value["progname"], "3dvolreg");
    }

    #[test]
    fn test_file_sink_flushes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.txt");
        let sink = FileSink::create(&path, LineFormat::Plain).unwrap();

        sink.accept(&LogEvent::new(Severity::Title, None, "Skull Strip")).unwrap();
        sink.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("TITLE -- : Skull Strip"));
    }

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.accept(&LogEvent::new(Severity::Info, None, "a")).unwrap();
        sink.accept(&LogEvent::new(Severity::Error, None, "b")).unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.messages(), vec!["a", "b"]);
        assert_eq!(sink.of_severity(Severity::Error).len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }
}
