//! Results of a pipeline run.

use crate::core::StageStatus;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// What happened to one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Stage name.
    pub name: String,
    /// Final status.
    pub status: StageStatus,
    /// Number of commands started.
    pub commands_run: usize,
    /// Command lines that exited non-zero.
    pub failed_commands: Vec<String>,
    /// Time spent on the stage, checks included.
    pub duration: Duration,
}

impl StageReport {
    pub(crate) fn skipped(name: &str, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            status: StageStatus::Skip,
            commands_run: 0,
            failed_commands: Vec::new(),
            duration,
        }
    }
}

/// The outcome of a pipeline run that was not stopped by FATAL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    /// Identifier of this run.
    pub run_id: Uuid,
    /// Pipeline name.
    pub pipeline: String,
    /// One report per stage, in run order.
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// Returns the report for `name`.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Returns true if no stage failed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.stages.iter().all(|s| s.status.is_success())
    }

    /// Counts stages with `status`.
    #[must_use]
    pub fn count(&self, status: StageStatus) -> usize {
        self.stages.iter().filter(|s| s.status == status).count()
    }

    /// Total number of commands started across all stages.
    #[must_use]
    pub fn commands_run(&self) -> usize {
        self.stages.iter().map(|s| s.commands_run).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(statuses: &[StageStatus]) -> PipelineReport {
        PipelineReport {
            run_id: Uuid::nil(),
            pipeline: "anat".to_string(),
            stages: statuses
                .iter()
                .enumerate()
                .map(|(i, status)| StageReport {
                    name: format!("s{i}"),
                    status: *status,
                    commands_run: usize::from(*status != StageStatus::Skip),
                    failed_commands: Vec::new(),
                    duration: Duration::ZERO,
                })
                .collect(),
        }
    }

    #[test]
    fn test_succeeded_counts_skip_as_success() {
        let r = report(&[StageStatus::Ok, StageStatus::Skip]);
        assert!(r.succeeded());
        assert_eq!(r.count(StageStatus::Skip), 1);
        assert_eq!(r.commands_run(), 1);
        assert_eq!(r.stage("s1").map(|s| s.status), Some(StageStatus::Skip));
    }

    #[test]
    fn test_failed_stage_fails_report() {
        let r = report(&[StageStatus::Ok, StageStatus::Fail, StageStatus::Ok]);
        assert!(!r.succeeded());
        assert!(r.stage("missing").is_none());
    }

    #[test]
    fn test_report_serializes_status_names() {
        let json = serde_json::to_value(report(&[StageStatus::Fail])).unwrap();
        assert_eq!(json["stages"][0]["status"], "fail");
        assert_eq!(json["pipeline"], "anat");
    }
}
