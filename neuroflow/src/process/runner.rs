//! Running one external command with its output streamed into the logger.

use super::CommandSpec;
use crate::context::ChildEnv;
use crate::errors::{PipelineError, Result};
use crate::logging::{Logger, Severity};
use crate::utils::timestamps::format_duration_secs;
use crate::utils::Timestamp;
use async_trait::async_trait;
use chrono::Utc;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

/// The record of one finished external command.
///
/// Lives only as long as the stage driver needs it to decide what to do
/// next; the log already holds everything it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// The command line that ran.
    pub command: String,
    /// Label used for its log events.
    pub label: String,
    /// Directory it ran in, if not inherited.
    pub workdir: Option<PathBuf>,
    /// Exit code; `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Combined stdout/stderr lines in arrival order.
    pub lines: Vec<String>,
    /// When the command was started.
    pub started_at: Timestamp,
    /// When the command finished.
    pub finished_at: Timestamp,
    /// Wall-clock time between spawn and exit.
    pub duration: Duration,
}

impl ProcessOutcome {
    /// Returns true if the command exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Something that can run a [`CommandSpec`].
///
/// [`ProcessRunner`] is the real implementation; the stage driver only sees
/// this trait.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `spec` with `env` applied and returns once it has exited.
    ///
    /// A non-zero exit is reported in the outcome, not as an error.
    async fn run(
        &self,
        spec: &CommandSpec,
        env: &ChildEnv,
        logger: &Logger,
    ) -> Result<ProcessOutcome>;
}

/// Runs commands through the system shell.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    shell: PathBuf,
    shell_flag: String,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    /// Creates a runner using `/bin/sh -c` (or `cmd /C` on Windows).
    #[must_use]
    pub fn new() -> Self {
        if cfg!(windows) {
            Self::with_shell("cmd", "/C")
        } else {
            Self::with_shell("/bin/sh", "-c")
        }
    }

    /// Creates a runner using a specific shell and command flag.
    #[must_use]
    pub fn with_shell(shell: impl Into<PathBuf>, flag: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            shell_flag: flag.into(),
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        env: &ChildEnv,
        logger: &Logger,
    ) -> Result<ProcessOutcome> {
        if spec.command.trim().is_empty() {
            return Err(PipelineError::Validation("no command to run".to_string()));
        }
        let label = spec.resolved_label();
        logger.command(&label, spec.command.clone());

        // stdout and stderr share one pipe so lines keep the order the
        // child wrote them in.
        let (reader, writer) = os_pipe::pipe()?;
        let mut command = Command::new(&self.shell);
        command
            .arg(&self.shell_flag)
            .arg(&spec.command)
            .stdin(Stdio::null())
            .stdout(Stdio::from(writer.try_clone()?))
            .stderr(Stdio::from(writer));
        if let Some(dir) = &spec.workdir {
            command.current_dir(dir);
        }
        env.apply(&mut command);

        let started_at = Utc::now();
        let start = Instant::now();
        let spawned = command.spawn();
        // The parent's copies of the write end must close for the reader to
        // see EOF.
        drop(command);
        let mut child = spawned.map_err(|err| PipelineError::spawn(spec.command.clone(), err))?;
        if let Some(pid) = child.id() {
            debug!(pid, label = %label, "spawned command");
            logger.log(Severity::Debug, Some(&label), format!("pid is {pid}"));
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let pump = tokio::task::spawn_blocking(move || forward_lines(reader, &tx));

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            logger.log(Severity::CommandOutput, Some(&label), line.clone());
            lines.push(line);
        }
        if let Err(err) = pump.await {
            debug!(error = %err, "output reader stopped");
        }

        let status = child.wait().await?;
        let duration = start.elapsed();
        let finished_at = Utc::now();

        match status.code() {
            Some(0) => {}
            Some(code) => {
                logger.log(Severity::Error, Some(&label), format!("nonzero exit code: {code}"));
            }
            None => logger.log(Severity::Error, Some(&label), "terminated by signal"),
        }
        logger.log(
            Severity::Debug,
            Some(&label),
            format!("duration: {} seconds", format_duration_secs(duration)),
        );

        Ok(ProcessOutcome {
            command: spec.command.clone(),
            label,
            workdir: spec.workdir.clone(),
            exit_code: status.code(),
            lines,
            started_at,
            finished_at,
            duration,
        })
    }
}

// Sends each line of `reader` (newline stripped, lossily decoded) until EOF.
fn forward_lines(reader: impl Read, tx: &mpsc::UnboundedSender<String>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                if tx.send(String::from_utf8_lossy(&buf).into_owned()).is_err() {
                    break;
                }
            }
            Err(err) => {
                debug!(error = %err, "stopped reading command output");
                break;
            }
        }
    }
}
