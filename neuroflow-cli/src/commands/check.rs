use anyhow::{Context, Result};
use std::process::ExitCode;

use super::RunArgs;
use crate::manifest::{base_dir, Manifest};

/// Execute the `check` command: report what a run would do without running it.
pub fn execute(args: &RunArgs, json: bool) -> Result<ExitCode> {
    let manifest = Manifest::load(&args.manifest)
        .with_context(|| format!("Failed to load manifest: {}", args.manifest.display()))?;
    let pipeline = manifest.to_pipeline(&base_dir(&args.manifest))?;
    let ctx = args.context(&manifest.env);

    let plans = pipeline.plan(&ctx);
    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
    } else {
        println!("Pipeline: {}", pipeline.name());
        for plan in &plans {
            println!("  {:20} {}", format!("{}:", plan.name), plan.action);
        }
    }

    if plans.iter().any(|p| p.action.stops_run()) {
        if !json {
            println!("\nA run would stop.");
        }
        Ok(ExitCode::FAILURE)
    } else {
        if !json {
            println!("\nAll checks passed.");
        }
        Ok(ExitCode::SUCCESS)
    }
}
