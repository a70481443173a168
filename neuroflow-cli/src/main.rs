mod commands;
mod logging;
mod manifest;

use clap::{Parser, Subcommand};
use neuroflow::PipelineError;
use std::process::ExitCode;

use commands::{LogArgs, RunArgs};

#[derive(Parser)]
#[command(
    name = "neuroflow",
    version,
    about = "Run staged neuroimaging preprocessing pipelines"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Diagnostic log level on stderr (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage of a pipeline manifest
    Run {
        #[command(flatten)]
        args: RunArgs,
        #[command(flatten)]
        log: LogArgs,
    },
    /// Report what a run would do, without running anything
    Check {
        #[command(flatten)]
        args: RunArgs,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    let result = match &cli.command {
        Commands::Run { args, log } => commands::run::execute(args, log).await,
        Commands::Check { args, json } => commands::check::execute(args, *json),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            let status = err
                .downcast_ref::<PipelineError>()
                .map_or(1, PipelineError::exit_status);
            ExitCode::from(status)
        }
    }
}
