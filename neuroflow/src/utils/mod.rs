//! Utility functions for timestamps and imaging file paths.

pub mod paths;
pub mod timestamps;

pub use paths::{compound_extension, strip_extension, with_suffix};
pub use timestamps::{iso_millis, log_file_stamp, Timestamp};

/// Generates a time-ordered run id.
#[must_use]
pub fn generate_run_id() -> uuid::Uuid {
    uuid::Uuid::now_v7()
}
