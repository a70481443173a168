use anyhow::{Context, Result};
use chrono::Utc;
use neuroflow::logging::LogSession;
use neuroflow::process::ProcessRunner;
use std::process::ExitCode;
use tracing::info;

use super::{LogArgs, RunArgs};
use crate::manifest::{base_dir, Manifest};

/// Execute the `run` command: run every stage of the manifest.
pub async fn execute(args: &RunArgs, log: &LogArgs) -> Result<ExitCode> {
    let manifest = Manifest::load(&args.manifest)
        .with_context(|| format!("Failed to load manifest: {}", args.manifest.display()))?;
    let base = base_dir(&args.manifest);
    let pipeline = manifest.to_pipeline(&base)?;
    let ctx = args.context(&manifest.env);

    let mut session = LogSession::new().with_console_level(log.console_level);
    session.start_console();
    let prefix = log.log.clone().or_else(|| manifest.log_prefix(&base));
    if let Some(prefix) = prefix {
        session.attach_files(&prefix, ctx.overwrite, &Utc::now())?;
        if let Some(files) = session.files() {
            info!(text = %files.text.display(), json = %files.json.display(), "writing log files");
        }
    }

    let logger = session.logger();
    let result = pipeline.run(&ctx, logger, &ProcessRunner::new()).await;
    match &result {
        Ok(report) => {
            info!(
                run_id = %report.run_id,
                commands = report.commands_run(),
                succeeded = report.succeeded(),
                "run complete"
            );
        }
        // FATAL has already reached every sink.
        Err(err) if err.is_fatal() => {}
        Err(err) => logger.error(err.to_string()),
    }
    logger.flush();

    Ok(neuroflow::exit_code(&result))
}
