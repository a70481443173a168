//! Running a pipeline stage by stage.

use super::report::{PipelineReport, StageReport};
use super::spec::{ExistingOutputs, StageSpec};
use super::Pipeline;
use crate::check::{self, OutputPresence};
use crate::context::{ChildEnv, CommandFailurePolicy, PartialOutputPolicy, RunContext};
use crate::core::StageStatus;
use crate::errors::Result;
use crate::logging::Logger;
use crate::process::CommandRunner;
use crate::utils::generate_run_id;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Commands a stage actually started and the ones that failed.
struct CommandTally {
    run: usize,
    failed: Vec<String>,
}

impl Pipeline {
    /// Runs every stage in order.
    ///
    /// Per stage: inputs are checked (FATAL "CHECK INPUTS" if any is
    /// missing), the output set decides between skipping and running, the
    /// stage's environment overrides are scoped over the run's child
    /// environment, and the commands run one after another.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Fatal`](crate::PipelineError::Fatal) when a
    /// check or failure policy stops the run; the message is already in every
    /// log sink. Spawn and IO failures are returned as they are.
    pub async fn run(
        &self,
        ctx: &RunContext,
        logger: &Logger,
        runner: &dyn CommandRunner,
    ) -> Result<PipelineReport> {
        self.validate()?;
        let run_id = generate_run_id();
        info!(pipeline = %self.name(), %run_id, stages = self.stage_count(), "starting pipeline");

        logger.title(self.name());
        logger.debug(format!(
            "run context: {}",
            serde_json::to_string(ctx).unwrap_or_else(|_| format!("{ctx:?}"))
        ));

        let mut env = ctx.child_env();
        let mut stages = Vec::with_capacity(self.stage_count());
        for stage in self.stages() {
            stages.push(run_stage(stage, ctx, &mut env, logger, runner).await?);
        }

        let report = PipelineReport {
            run_id,
            pipeline: self.name().to_string(),
            stages,
        };
        info!(
            pipeline = %report.pipeline,
            commands = report.commands_run(),
            succeeded = report.succeeded(),
            "pipeline finished"
        );
        Ok(report)
    }
}

async fn run_stage(
    stage: &StageSpec,
    ctx: &RunContext,
    env: &mut ChildEnv,
    logger: &Logger,
    runner: &dyn CommandRunner,
) -> Result<StageReport> {
    let start = Instant::now();
    logger.title(&stage.name);

    check::quit_if_inputs_missing(logger, &stage.inputs)?;

    if !ctx.overwrite {
        match check::output_presence(&stage.outputs) {
            OutputPresence::All => match stage.existing_outputs {
                ExistingOutputs::Skip => {
                    logger.warn(format!("Skipping '{}': outputs exist", stage.name));
                    debug!(stage = %stage.name, "stage skipped");
                    return Ok(StageReport::skipped(&stage.name, start.elapsed()));
                }
                ExistingOutputs::Fatal => check::quit_if_all_outputs_exist(logger, &stage.outputs)?,
            },
            OutputPresence::Partial(present) => match ctx.partial_outputs {
                PartialOutputPolicy::Rerun => {
                    logger.warn(format!(
                        "Rerunning '{}': {} of {} outputs already exist: {}",
                        stage.name,
                        present.len(),
                        stage.outputs.len(),
                        join_paths(&present)
                    ));
                }
                PartialOutputPolicy::Abort => {
                    for path in &present {
                        logger.error(format!("Output '{}' already exists.", path.display()));
                    }
                    return Err(logger.fatal("PARTIAL OUTPUTS"));
                }
            },
            OutputPresence::None => {}
        }
    }

    let scope = env.scoped(&stage.env);
    let tally = run_commands(stage, ctx.on_command_failure, env, logger, runner).await;
    scope.restore(env);
    let tally = tally?;

    let status = if tally.failed.is_empty() {
        StageStatus::Ok
    } else {
        StageStatus::Fail
    };
    debug!(stage = %stage.name, %status, commands = tally.run, "stage finished");
    Ok(StageReport {
        name: stage.name.clone(),
        status,
        commands_run: tally.run,
        failed_commands: tally.failed,
        duration: start.elapsed(),
    })
}

async fn run_commands(
    stage: &StageSpec,
    policy: CommandFailurePolicy,
    env: &ChildEnv,
    logger: &Logger,
    runner: &dyn CommandRunner,
) -> Result<CommandTally> {
    let mut tally = CommandTally {
        run: 0,
        failed: Vec::new(),
    };
    for (index, command) in stage.commands.iter().enumerate() {
        let outcome = runner.run(command, env, logger).await?;
        tally.run += 1;
        if outcome.success() {
            continue;
        }
        tally.failed.push(command.command.clone());
        match policy {
            CommandFailurePolicy::Continue => {}
            CommandFailurePolicy::AbortStage => {
                let remaining = stage.commands.len() - index - 1;
                if remaining > 0 {
                    logger.warn(format!(
                        "Skipping {remaining} remaining command(s) of '{}'",
                        stage.name
                    ));
                }
                break;
            }
            CommandFailurePolicy::AbortPipeline => return Err(logger.fatal("COMMAND FAILED")),
        }
    }
    Ok(tally)
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
