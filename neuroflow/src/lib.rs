//! # Neuroflow
//!
//! Stage execution and structured logging for neuroimaging preprocessing
//! pipelines that drive external tools (AFNI, FSL, FreeSurfer).
//!
//! Neuroflow provides:
//!
//! - **Staged runs**: each stage declares inputs, outputs, and shell commands
//! - **Idempotent skips**: a stage whose outputs all exist is not run again
//! - **Fan-out logging**: one event stream to the console, a text log, and a
//!   JSON-lines log, with a FATAL path that flushes every sink
//! - **Explicit run settings**: overwrite, thread count, and failure policies
//!   travel in a [`RunContext`](context::RunContext), never in the parent
//!   process environment
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neuroflow::prelude::*;
//!
//! # async fn example() -> neuroflow::Result<()> {
//! let pipeline = Pipeline::new("anat")
//!     .stage(
//!         StageSpec::new("skullstrip")
//!             .input("/data/sub01/head.nii.gz")
//!             .output("/data/sub01/brain.nii.gz")
//!             .command("3dSkullStrip -input head.nii.gz -prefix brain.nii.gz"),
//!     )?;
//!
//! let mut session = LogSession::new();
//! let logger = session.start_console().clone();
//! let report = pipeline
//!     .run(&RunContext::new(), &logger, &ProcessRunner::new())
//!     .await?;
//! assert!(report.succeeded());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod check;
pub mod context;
pub mod core;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod process;
pub mod testing;
pub mod utils;

pub use errors::{PipelineError, Result};

use std::process::ExitCode;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::check::{
        inputs_missing, output_presence, outputs_all_present, quit_if_all_outputs_exist,
        quit_if_inputs_missing, OutputPresence,
    };
    pub use crate::context::{
        ChildEnv, CommandFailurePolicy, PartialOutputPolicy, RunContext,
    };
    pub use crate::core::StageStatus;
    pub use crate::errors::{PipelineError, Result};
    pub use crate::logging::{
        LogFiles, LogSession, Logger, LoggerState, MemorySink, Severity, Sink,
    };
    pub use crate::pipeline::{
        ExistingOutputs, Pipeline, PipelineReport, StageAction, StagePlan, StageReport,
        StageSpec,
    };
    pub use crate::process::{
        CommandLine, CommandRunner, CommandSpec, ProcessOutcome, ProcessRunner,
    };
}

/// Maps the result of a run to the process exit status.
///
/// This is the single place a run turns into an exit: by the time an error
/// reaches here, a FATAL message has already been flushed to every sink.
#[must_use]
pub fn exit_code<T>(result: &Result<T>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(err.exit_status()),
    }
}
