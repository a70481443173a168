//! Timestamped log file pairs, "latest" links, and the logging session.

use super::{FileSink, LineFormat, Logger, MemorySink, Severity, Sink};
use crate::errors::{PipelineError, Result};
use crate::utils::{log_file_stamp, with_suffix, Timestamp};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// The files written for one logging prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFiles {
    /// Timestamped plain-text log.
    pub text: PathBuf,
    /// Timestamped JSON-lines log.
    pub json: PathBuf,
    /// Fixed-name link to the newest text log.
    pub latest_text: PathBuf,
    /// Fixed-name link to the newest JSON log.
    pub latest_json: PathBuf,
}

impl LogFiles {
    /// Computes the file names for `prefix` at time `now`.
    ///
    /// `/out/report/log` at 2015-03-01 08:00:00 gives
    /// `/out/report/log_2015-03-01_08-00-00.txt` and `.json`, plus the links
    /// `/out/report/log.txt` and `/out/report/log.json`.
    #[must_use]
    pub fn for_prefix(prefix: impl AsRef<Path>, now: &Timestamp) -> Self {
        let prefix = prefix.as_ref();
        let stamp = log_file_stamp(now);
        Self {
            text: with_suffix(prefix, &format!("_{stamp}.txt")),
            json: with_suffix(prefix, &format!("_{stamp}.json")),
            latest_text: with_suffix(prefix, ".txt"),
            latest_json: with_suffix(prefix, ".json"),
        }
    }

    /// Creates both log files and returns their sinks as `(text, json)`.
    ///
    /// The parent directory is created when missing. The "latest" links are
    /// not touched here; see [`LogFiles::link_latest`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::LogFileExists`] if either file exists and
    /// `overwrite` is false, or an IO error if a file cannot be created.
    pub fn open(&self, overwrite: bool) -> Result<(FileSink, FileSink)> {
        if !overwrite {
            for path in [&self.text, &self.json] {
                if path.exists() {
                    return Err(PipelineError::LogFileExists(path.clone()));
                }
            }
        }

        if let Some(parent) = self.text.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let text = FileSink::create(&self.text, LineFormat::Plain)?;
        let json = FileSink::create(&self.json, LineFormat::Json)?;
        debug!(text = %self.text.display(), json = %self.json.display(), "opened log files");
        Ok((text, json))
    }

    /// Points the "latest" links at this pair, logging each link.
    ///
    /// # Errors
    ///
    /// Returns an IO error if a link cannot be replaced.
    ///
    /// Each link stores the bare file name of its target, so it resolves from
    /// the link's own directory whatever the prefix was relative to.
    pub fn link_latest(&self, logger: &Logger) -> Result<()> {
        softlink(logger, sibling_name(&self.text), &self.latest_text, true)?;
        softlink(logger, sibling_name(&self.json), &self.latest_json, true)?;
        Ok(())
    }
}

// Log files and their links share a directory.
fn sibling_name(path: &Path) -> &Path {
    path.file_name().map_or(path, Path::new)
}

/// Creates a symbolic link at `target` pointing to `source`, logging the
/// equivalent `ln` command.
///
/// With `force`, an existing file or link at `target` is replaced.
///
/// # Errors
///
/// Returns an IO error if the link cannot be created.
pub fn softlink(
    logger: &Logger,
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
    force: bool,
) -> io::Result<()> {
    let (source, target) = (source.as_ref(), target.as_ref());
    let flags = if force { "-sf" } else { "-s" };
    logger.log(
        Severity::Command,
        Some("ln"),
        format!("ln {flags} {} {}", source.display(), target.display()),
    );

    if force && fs::symlink_metadata(target).is_ok() {
        fs::remove_file(target)?;
    }
    symlink(source, target)
}

#[cfg(unix)]
fn symlink(source: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn symlink(source: &Path, target: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, target)
}

/// Where a [`LogSession`] is in its lifecycle.
///
/// Transitions only move forward: `Unconfigured -> ConsoleOnly -> FileBacked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoggerState {
    /// No sinks yet.
    Unconfigured,
    /// Console output only, before an output directory is known.
    ConsoleOnly,
    /// Console plus text and JSON files. Terminal for the run.
    FileBacked,
}

/// Owns the logger for one pipeline run and rebuilds it as the run learns
/// where to write its log files.
pub struct LogSession {
    state: LoggerState,
    logger: Logger,
    console: bool,
    console_level: Severity,
    extra_sinks: Vec<Arc<dyn Sink>>,
    files: Option<LogFiles>,
}

impl Default for LogSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSession {
    /// Creates an unconfigured session that will log to the console.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: LoggerState::Unconfigured,
            logger: Logger::silent(),
            console: true,
            console_level: Severity::Debug,
            extra_sinks: Vec::new(),
            files: None,
        }
    }

    /// Sets the lowest severity printed on the console.
    #[must_use]
    pub fn with_console_level(mut self, level: Severity) -> Self {
        self.console_level = level;
        self
    }

    /// Disables the console sink.
    #[must_use]
    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    /// Adds a sink kept in every logger this session builds.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.extra_sinks.push(sink);
        self
    }

    /// Adds an in-memory sink and returns it for later inspection.
    pub fn capture(&mut self) -> Arc<MemorySink> {
        let sink = Arc::new(MemorySink::new());
        self.extra_sinks.push(sink.clone());
        sink
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> LoggerState {
        self.state
    }

    /// Returns the current logger.
    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Returns the log files once the session is file backed.
    #[must_use]
    pub fn files(&self) -> Option<&LogFiles> {
        self.files.as_ref()
    }

    /// Moves to `ConsoleOnly`. Does nothing once past `Unconfigured`.
    pub fn start_console(&mut self) -> &Logger {
        if self.state == LoggerState::Unconfigured {
            self.logger = self.base_logger();
            self.state = LoggerState::ConsoleOnly;
        }
        &self.logger
    }

    /// Moves to `FileBacked`, writing to a new log file pair under `prefix`.
    ///
    /// Must be called before the pipeline does any work: a log file that
    /// cannot be created is a startup failure.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::LogFileExists`] if a target exists and
    /// `overwrite` is false, [`PipelineError::Validation`] if the session is
    /// already file backed, or an IO error.
    pub fn attach_files(
        &mut self,
        prefix: impl AsRef<Path>,
        overwrite: bool,
        now: &Timestamp,
    ) -> Result<&Logger> {
        if self.state == LoggerState::FileBacked {
            return Err(PipelineError::Validation(
                "log session is already file backed".to_string(),
            ));
        }

        let files = LogFiles::for_prefix(prefix, now);
        let (text, json) = files.open(overwrite)?;
        let logger = self
            .base_logger()
            .with_sink(Arc::new(text))
            .with_sink(Arc::new(json));
        files.link_latest(&logger)?;

        self.logger = logger;
        self.files = Some(files);
        self.state = LoggerState::FileBacked;
        Ok(&self.logger)
    }

    fn base_logger(&self) -> Logger {
        let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();
        if self.console {
            sinks.push(Arc::new(
                super::ConsoleSink::console().with_min_level(self.console_level),
            ));
        }
        sinks.extend(self.extra_sinks.iter().cloned());
        Logger::new(sinks)
    }
}

impl std::fmt::Debug for LogSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSession")
            .field("state", &self.state)
            .field("console", &self.console)
            .field("console_level", &self.console_level)
            .field("extra_sinks", &self.extra_sinks.len())
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}
