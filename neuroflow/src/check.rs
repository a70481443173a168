//! Existence checks on declared stage inputs and outputs.
//!
//! Existence is the only state inspected: no hashing, no timestamps, no
//! locking. Every path in a list is checked (and reported) even after the
//! verdict is already known, so the log names all offending paths at once.

use crate::errors::Result;
use crate::logging::Logger;
use std::path::{Path, PathBuf};

/// How much of a declared output set is already on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPresence {
    /// None of the outputs exist (or none were declared).
    None,
    /// Some, but not all, outputs exist. Holds the ones that do.
    Partial(Vec<PathBuf>),
    /// Every declared output exists.
    All,
}

/// Logs an ERROR for each missing input and returns true if any is missing.
pub fn inputs_missing<P: AsRef<Path>>(logger: &Logger, paths: &[P]) -> bool {
    paths.iter().fold(false, |missing, path| {
        let path = path.as_ref();
        let absent = !path.exists();
        if absent {
            logger.error(format!("Input '{}' doesn't exist!", path.display()));
        }
        absent || missing
    })
}

/// Logs an ERROR for each existing output and returns true only if every
/// output exists.
///
/// An empty list is never "all present": a stage that declares no outputs
/// cannot be recognised as done.
pub fn outputs_all_present<P: AsRef<Path>>(logger: &Logger, paths: &[P]) -> bool {
    if paths.is_empty() {
        return false;
    }
    paths.iter().fold(true, |all, path| {
        let path = path.as_ref();
        let present = path.exists();
        if present {
            logger.error(format!("Output '{}' already exists.", path.display()));
        }
        present && all
    })
}

/// Raises FATAL "CHECK INPUTS" if any input is missing.
///
/// # Errors
///
/// Returns [`PipelineError::Fatal`](crate::PipelineError::Fatal) after logging.
pub fn quit_if_inputs_missing<P: AsRef<Path>>(logger: &Logger, paths: &[P]) -> Result<()> {
    if inputs_missing(logger, paths) {
        return Err(logger.fatal("CHECK INPUTS"));
    }
    Ok(())
}

/// Raises FATAL "CHECK OUTPUTS" if every output already exists.
///
/// # Errors
///
/// Returns [`PipelineError::Fatal`](crate::PipelineError::Fatal) after logging.
pub fn quit_if_all_outputs_exist<P: AsRef<Path>>(logger: &Logger, paths: &[P]) -> Result<()> {
    if outputs_all_present(logger, paths) {
        return Err(logger.fatal("CHECK OUTPUTS"));
    }
    Ok(())
}

/// Classifies an output set without logging.
#[must_use]
pub fn output_presence<P: AsRef<Path>>(paths: &[P]) -> OutputPresence {
    let present: Vec<PathBuf> = paths
        .iter()
        .map(|p| p.as_ref().to_path_buf())
        .filter(|p| p.exists())
        .collect();

    if present.is_empty() {
        OutputPresence::None
    } else if present.len() == paths.len() {
        OutputPresence::All
    } else {
        OutputPresence::Partial(present)
    }
}
