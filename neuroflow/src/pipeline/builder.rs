//! Pipeline definition with validation.

use super::StageSpec;
use crate::errors::{PipelineError, Result};

/// A named, ordered list of stages for one subject.
///
/// Stages run strictly in insertion order; there are no dependency edges.
/// A later stage consumes an earlier one's outputs by naming them as inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    name: String,
    stages: Vec<StageSpec>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Adds a stage to the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage is invalid or its name is taken.
    pub fn stage(mut self, spec: StageSpec) -> Result<Self> {
        self.add_stage(spec)?;
        Ok(self)
    }

    /// Adds a stage in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage is invalid or its name is taken.
    pub fn add_stage(&mut self, spec: StageSpec) -> Result<()> {
        spec.validate()?;
        if self.stages.iter().any(|s| s.name == spec.name) {
            return Err(PipelineError::Validation(format!(
                "Duplicate stage name '{}' in pipeline '{}'",
                spec.name, self.name
            )));
        }
        self.stages.push(spec);
        Ok(())
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in run order.
    #[must_use]
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Validates the pipeline as a whole.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PipelineError::Validation(
                "Pipeline name cannot be empty or whitespace-only".to_string(),
            ));
        }
        Ok(())
    }
}
