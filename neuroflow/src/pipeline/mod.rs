//! Pipeline definition and execution.
//!
//! This module provides:
//! - Stage specifications with declared inputs, outputs, and commands
//! - A validated, strictly ordered pipeline
//! - The stage driver and its reports
//! - A dry check that predicts what a run would do

mod builder;
mod driver;
#[cfg(test)]
mod integration_tests;
mod plan;
mod report;
mod spec;

pub use builder::Pipeline;
pub use plan::{StageAction, StagePlan};
pub use report::{PipelineReport, StageReport};
pub use spec::{ExistingOutputs, StageSpec};
