//! Dry check: what a run would do, without running anything.

use super::spec::ExistingOutputs;
use super::Pipeline;
use crate::check::{output_presence, OutputPresence};
use crate::context::{PartialOutputPolicy, RunContext};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// The decision a run would make for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StageAction {
    /// The stage would run.
    Run,
    /// Some outputs exist; the stage would run again.
    Rerun {
        /// Outputs already present.
        present: Vec<PathBuf>,
    },
    /// All outputs exist; the stage would be skipped.
    Skip,
    /// All outputs exist and the stage is configured to stop on that.
    StopExisting,
    /// Some outputs exist and the partial output policy is abort.
    StopPartial {
        /// Outputs already present.
        present: Vec<PathBuf>,
    },
    /// Inputs that neither exist nor come from an earlier stage.
    MissingInputs {
        /// The missing paths.
        missing: Vec<PathBuf>,
    },
}

impl StageAction {
    /// Returns true if a run would stop at this stage.
    #[must_use]
    pub fn stops_run(&self) -> bool {
        matches!(
            self,
            Self::StopExisting | Self::StopPartial { .. } | Self::MissingInputs { .. }
        )
    }

    /// Returns true if the stage's commands would run.
    #[must_use]
    pub fn runs_commands(&self) -> bool {
        matches!(self, Self::Run | Self::Rerun { .. })
    }
}

impl fmt::Display for StageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => write!(f, "run"),
            Self::Rerun { present } => write!(f, "rerun ({} outputs present)", present.len()),
            Self::Skip => write!(f, "skip (outputs exist)"),
            Self::StopExisting => write!(f, "stop: outputs exist"),
            Self::StopPartial { present } => {
                write!(f, "stop: partial outputs ({} present)", present.len())
            }
            Self::MissingInputs { missing } => {
                let names: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
                write!(f, "stop: missing inputs {}", names.join(", "))
            }
        }
    }
}

/// One line of a dry check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePlan {
    /// Stage name.
    pub name: String,
    /// What a run would do.
    #[serde(flatten)]
    pub action: StageAction,
}

impl Pipeline {
    /// Works out what [`Pipeline::run`] would do for each stage.
    ///
    /// Only the filesystem is inspected; nothing is logged or spawned. An
    /// input counts as available when it exists or is an output of an
    /// earlier stage that would run. The plan ends at the first stage that
    /// would stop the run.
    #[must_use]
    pub fn plan(&self, ctx: &RunContext) -> Vec<StagePlan> {
        let mut produced: HashSet<&Path> = HashSet::new();
        let mut plans = Vec::with_capacity(self.stage_count());

        for stage in self.stages() {
            let missing: Vec<PathBuf> = stage
                .inputs
                .iter()
                .filter(|p| !p.exists() && !produced.contains(p.as_path()))
                .cloned()
                .collect();

            let action = if !missing.is_empty() {
                StageAction::MissingInputs { missing }
            } else if ctx.overwrite {
                StageAction::Run
            } else {
                match output_presence(&stage.outputs) {
                    OutputPresence::None => StageAction::Run,
                    OutputPresence::All => match stage.existing_outputs {
                        ExistingOutputs::Skip => StageAction::Skip,
                        ExistingOutputs::Fatal => StageAction::StopExisting,
                    },
                    OutputPresence::Partial(present) => match ctx.partial_outputs {
                        PartialOutputPolicy::Rerun => StageAction::Rerun { present },
                        PartialOutputPolicy::Abort => StageAction::StopPartial { present },
                    },
                }
            };

            if action.runs_commands() {
                produced.extend(stage.outputs.iter().map(PathBuf::as_path));
            }
            let stop = action.stops_run();
            plans.push(StagePlan {
                name: stage.name.clone(),
                action,
            });
            if stop {
                break;
            }
        }
        plans
    }
}
