//! Testing utilities for neuroflow pipelines.
//!
//! This module provides:
//! - A command runner that records instead of spawning
//! - Assertions on stage reports and captured log events
//! - Small filesystem and logger fixtures

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_logged, assert_not_logged, assert_stage_status};
pub use fixtures::{capture_logger, touch_all};
pub use mocks::{RecordedCommand, RecordingRunner};
