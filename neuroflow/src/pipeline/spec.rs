//! Stage specifications.

use crate::errors::{PipelineError, Result};
use crate::process::CommandSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// What a stage does when all of its outputs already exist and overwrite
/// is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingOutputs {
    /// Warn and move on without running anything.
    #[default]
    Skip,
    /// Stop the pipeline with FATAL "CHECK OUTPUTS".
    Fatal,
}

impl fmt::Display for ExistingOutputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// Specification for a single stage in a pipeline.
///
/// A stage is done when every declared output exists; there is no other
/// record of completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// The unique name of the stage.
    pub name: String,
    /// Paths that must exist before the stage runs.
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    /// Paths the stage produces.
    #[serde(default)]
    pub outputs: Vec<PathBuf>,
    /// Commands, run in order.
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
    /// Child environment entries set only while this stage runs.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Behaviour when the outputs are already there.
    #[serde(default)]
    pub existing_outputs: ExistingOutputs,
}

impl StageSpec {
    /// Creates an empty stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            commands: Vec::new(),
            env: BTreeMap::new(),
            existing_outputs: ExistingOutputs::default(),
        }
    }

    /// Adds an input path.
    #[must_use]
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    /// Adds input paths.
    #[must_use]
    pub fn inputs(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.inputs.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Adds an output path.
    #[must_use]
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    /// Adds output paths.
    #[must_use]
    pub fn outputs(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.outputs.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Appends a command.
    #[must_use]
    pub fn command(mut self, command: impl Into<CommandSpec>) -> Self {
        self.commands.push(command.into());
        self
    }

    /// Sets a stage-local child environment entry.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the behaviour for already present outputs.
    #[must_use]
    pub fn existing_outputs(mut self, behaviour: ExistingOutputs) -> Self {
        self.existing_outputs = behaviour;
        self
    }

    /// Validates the stage specification.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or a command line is empty.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PipelineError::Validation(
                "Stage name cannot be empty or whitespace-only".to_string(),
            ));
        }
        if let Some(index) = self.commands.iter().position(|c| c.command.trim().is_empty()) {
            return Err(PipelineError::Validation(format!(
                "Stage '{}' has an empty command at position {}",
                self.name,
                index + 1
            )));
        }
        Ok(())
    }
}
