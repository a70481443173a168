//! Test assertions for pipeline reports and captured logs.

use crate::core::StageStatus;
use crate::logging::{MemorySink, Severity};
use crate::pipeline::PipelineReport;

/// Asserts that stage `name` finished with `expected`.
pub fn assert_stage_status(report: &PipelineReport, name: &str, expected: StageStatus) {
    let stage = report
        .stage(name)
        .unwrap_or_else(|| panic!("No stage '{name}' in report for '{}'", report.pipeline));
    assert_eq!(
        stage.status, expected,
        "Expected stage '{name}' to be {expected}, got {}",
        stage.status
    );
}

/// Asserts that at least one event of `severity` carries exactly `message`.
pub fn assert_logged(sink: &MemorySink, severity: Severity, message: &str) {
    let events = sink.of_severity(severity);
    assert!(
        events.iter().any(|e| e.message == message),
        "Expected {severity} '{message}', got: {:?}",
        events.iter().map(|e| &e.message).collect::<Vec<_>>()
    );
}

/// Asserts that no event of `severity` was logged.
pub fn assert_not_logged(sink: &MemorySink, severity: Severity) {
    let events = sink.of_severity(severity);
    assert!(
        events.is_empty(),
        "Expected no {severity} events, got: {:?}",
        events.iter().map(|e| &e.message).collect::<Vec<_>>()
    );
}
