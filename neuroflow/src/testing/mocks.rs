//! Command runners for tests.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::context::ChildEnv;
use crate::errors::{PipelineError, Result};
use crate::logging::{Logger, Severity};
use crate::process::{CommandRunner, CommandSpec, ProcessOutcome};

/// One call seen by a [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    /// The command as handed to the runner.
    pub spec: CommandSpec,
    /// The child environment it would have been spawned with.
    pub env: ChildEnv,
}

/// A runner that spawns nothing.
///
/// It logs the COMMAND event a real run would, records the call, creates any
/// files registered for the command line, and returns the configured exit
/// code (zero unless set).
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<RecordedCommand>>,
    exit_codes: Mutex<HashMap<String, i32>>,
    creates: Mutex<HashMap<String, Vec<PathBuf>>>,
    spawn_failures: Mutex<Vec<String>>,
}

impl RecordingRunner {
    /// Creates a runner where every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `command` exit with `code`.
    #[must_use]
    pub fn with_exit_code(self, command: impl Into<String>, code: i32) -> Self {
        self.exit_codes.lock().insert(command.into(), code);
        self
    }

    /// Makes `command` create an empty file at `path` when it runs.
    #[must_use]
    pub fn creating(self, command: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.creates
            .lock()
            .entry(command.into())
            .or_default()
            .push(path.into());
        self
    }

    /// Makes `command` fail to spawn.
    #[must_use]
    pub fn failing_to_spawn(self, command: impl Into<String>) -> Self {
        self.spawn_failures.lock().push(command.into());
        self
    }

    /// Returns every recorded call in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCommand> {
        self.calls.lock().clone()
    }

    /// Returns the command lines run, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.spec.command.clone()).collect()
    }

    /// Returns the number of commands run.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Resets call tracking.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        env: &ChildEnv,
        logger: &Logger,
    ) -> Result<ProcessOutcome> {
        let label = spec.resolved_label();
        logger.command(&label, spec.command.clone());

        if self.spawn_failures.lock().contains(&spec.command) {
            return Err(PipelineError::spawn(
                spec.command.clone(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "command not found"),
            ));
        }

        self.calls.lock().push(RecordedCommand {
            spec: spec.clone(),
            env: env.clone(),
        });

        let created = self.creates.lock().get(&spec.command).cloned().unwrap_or_default();
        for path in created {
            fs::write(&path, b"")?;
        }

        let code = self.exit_codes.lock().get(&spec.command).copied().unwrap_or(0);
        if code != 0 {
            logger.log(Severity::Error, Some(&label), format!("nonzero exit code: {code}"));
        }

        let now = Utc::now();
        Ok(ProcessOutcome {
            command: spec.command.clone(),
            label,
            workdir: spec.workdir.clone(),
            exit_code: Some(code),
            lines: Vec::new(),
            started_at: now,
            finished_at: now,
            duration: Duration::ZERO,
        })
    }
}
