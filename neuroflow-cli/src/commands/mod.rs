pub mod check;
pub mod run;

use clap::Args;
use neuroflow::context::{CommandFailurePolicy, PartialOutputPolicy, RunContext};
use neuroflow::logging::Severity;
use std::path::PathBuf;

/// Run settings shared by `run` and `check`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Path to the pipeline manifest (JSON)
    pub manifest: PathBuf,
    /// Rerun stages whose outputs already exist and let the tools overwrite
    #[arg(long)]
    pub overwrite: bool,
    /// Thread count for the tools (default: OMP_NUM_THREADS if set)
    #[arg(long)]
    pub threads: Option<usize>,
    /// What to do when a command exits non-zero
    #[arg(long, default_value = "continue")]
    pub on_command_failure: CommandFailurePolicy,
    /// What to do when only some of a stage's outputs exist
    #[arg(long, default_value = "rerun")]
    pub partial_outputs: PartialOutputPolicy,
}

impl RunArgs {
    pub fn context(&self, env: &std::collections::BTreeMap<String, String>) -> RunContext {
        let mut ctx = RunContext::new()
            .with_overwrite(self.overwrite)
            .with_threads(RunContext::resolve_threads(self.threads))
            .with_command_failure(self.on_command_failure)
            .with_partial_outputs(self.partial_outputs);
        for (key, value) in env {
            ctx = ctx.with_env(key, value);
        }
        ctx
    }
}

/// Options that only apply to `run`.
#[derive(Debug, Clone, Args)]
pub struct LogArgs {
    /// Log file prefix; overrides the manifest's `log`
    #[arg(long)]
    pub log: Option<PathBuf>,
    /// Lowest severity shown on the console
    #[arg(long, default_value = "DEBUG")]
    pub console_level: Severity,
}
