//! External process execution.
//!
//! Commands run one at a time through the system shell. Their stdout and
//! stderr are merged into a single line stream that goes to the logger as it
//! arrives; the caller gets a [`ProcessOutcome`] once the child has exited.
//! There is no retry and no timeout.

mod command;
mod runner;

pub use command::{shell_quote, CommandLine, CommandSpec, OptValue};
pub use runner::{CommandRunner, ProcessOutcome, ProcessRunner};
