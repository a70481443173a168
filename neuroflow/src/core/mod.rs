//! Core domain types shared by the driver and its reports.

mod status;

pub use status::StageStatus;
