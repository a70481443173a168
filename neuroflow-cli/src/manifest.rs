//! JSON pipeline manifests.

use neuroflow::pipeline::{ExistingOutputs, Pipeline, StageSpec};
use neuroflow::process::CommandSpec;
use neuroflow::{PipelineError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A pipeline as written on disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub name: String,
    /// Log file prefix, if the run should write log files.
    #[serde(default)]
    pub log: Option<PathBuf>,
    /// Child environment entries for every stage.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub stages: Vec<StageEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageEntry {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub outputs: Vec<PathBuf>,
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub existing_outputs: ExistingOutputs,
}

/// A command given either as a bare line or with a label and directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CommandEntry {
    Line(String),
    Full(CommandSpec),
}

impl Manifest {
    /// Reads and parses a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text).map_err(|err| match err {
            PipelineError::Manifest(msg) => {
                PipelineError::Manifest(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| PipelineError::Manifest(err.to_string()))
    }

    /// The log prefix with relative paths resolved against `base`.
    pub fn log_prefix(&self, base: &Path) -> Option<PathBuf> {
        self.log.as_deref().map(|p| resolve(base, p))
    }

    /// Builds the pipeline, resolving relative paths against `base`.
    pub fn to_pipeline(&self, base: &Path) -> Result<Pipeline> {
        let mut pipeline = Pipeline::new(&self.name);
        for entry in &self.stages {
            let mut stage = StageSpec::new(&entry.name)
                .inputs(entry.inputs.iter().map(|p| resolve(base, p)))
                .outputs(entry.outputs.iter().map(|p| resolve(base, p)))
                .existing_outputs(entry.existing_outputs);
            for (key, value) in &entry.env {
                stage = stage.env(key, value);
            }
            for command in &entry.commands {
                let mut spec = match command {
                    CommandEntry::Line(line) => CommandSpec::new(line),
                    CommandEntry::Full(spec) => spec.clone(),
                };
                let workdir = spec.workdir.take();
                spec.workdir =
                    Some(workdir.map_or_else(|| base.to_path_buf(), |d| resolve(base, &d)));
                stage = stage.command(spec);
            }
            pipeline.add_stage(stage)?;
        }
        Ok(pipeline)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// The directory relative manifest paths are resolved against.
pub fn base_dir(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
