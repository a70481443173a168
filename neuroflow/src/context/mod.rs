//! Run-wide settings passed explicitly into every component.
//!
//! [`RunContext`] carries the overwrite policy, thread count, and failure
//! policies for one pipeline run. It is built once at startup and borrowed
//! by the stage driver and the process runner; nothing here touches the
//! parent process environment.

mod env;

pub use env::{ChildEnv, EnvScope, AFNI_DECONFLICT, OMP_NUM_THREADS};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What to do when an external command exits non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandFailurePolicy {
    /// Log the failure and keep going (later stages may then fail their
    /// input checks).
    #[default]
    Continue,
    /// Skip the rest of the stage's commands and move to the next stage.
    AbortStage,
    /// Stop the whole pipeline with FATAL.
    AbortPipeline,
}

/// What to do when only some of a stage's outputs already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartialOutputPolicy {
    /// Warn with the present paths and run the stage again.
    #[default]
    Rerun,
    /// Stop the pipeline with FATAL "PARTIAL OUTPUTS".
    Abort,
}

/// Error returned when a policy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown policy '{0}'")]
pub struct ParsePolicyError(pub String);

impl fmt::Display for CommandFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::AbortStage => write!(f, "abort-stage"),
            Self::AbortPipeline => write!(f, "abort-pipeline"),
        }
    }
}

impl FromStr for CommandFailurePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "continue" => Ok(Self::Continue),
            "abort-stage" => Ok(Self::AbortStage),
            "abort-pipeline" => Ok(Self::AbortPipeline),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

impl fmt::Display for PartialOutputPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rerun => write!(f, "rerun"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

impl FromStr for PartialOutputPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rerun" => Ok(Self::Rerun),
            "abort" => Ok(Self::Abort),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    /// Replace existing outputs, and tell the tools to do the same.
    #[serde(default)]
    pub overwrite: bool,
    /// Worker threads for the external tools, if known.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Reaction to non-zero exit codes.
    #[serde(default)]
    pub on_command_failure: CommandFailurePolicy,
    /// Reaction to partially present outputs.
    #[serde(default)]
    pub partial_outputs: PartialOutputPolicy,
    /// Extra variables for every child process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl RunContext {
    /// Creates a context with defaults: no overwrite, no thread count,
    /// continue past failed commands, rerun partially complete stages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the overwrite policy.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets the thread count.
    #[must_use]
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the command failure policy.
    #[must_use]
    pub fn with_command_failure(mut self, policy: CommandFailurePolicy) -> Self {
        self.on_command_failure = policy;
        self
    }

    /// Sets the partial output policy.
    #[must_use]
    pub fn with_partial_outputs(mut self, policy: PartialOutputPolicy) -> Self {
        self.partial_outputs = policy;
        self
    }

    /// Adds a variable for every child process.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Resolves the thread count: the explicit value if given, else
    /// `OMP_NUM_THREADS` from this process's environment.
    #[must_use]
    pub fn resolve_threads(explicit: Option<usize>) -> Option<usize> {
        explicit.or_else(|| threads_from_env(std::env::var(OMP_NUM_THREADS).ok().as_deref()))
    }

    /// Builds the environment overlay every child process receives.
    #[must_use]
    pub fn child_env(&self) -> ChildEnv {
        let mut env = ChildEnv::new();
        for (key, value) in &self.env {
            env.set(key, value);
        }
        if self.overwrite {
            env.set(AFNI_DECONFLICT, "OVERWRITE");
        }
        if let Some(threads) = self.threads {
            env.set(OMP_NUM_THREADS, threads.to_string());
        }
        env
    }
}

/// Parses a thread count from an environment value, ignoring zero and junk.
#[must_use]
pub fn threads_from_env(value: Option<&str>) -> Option<usize> {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}
