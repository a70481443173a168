//! Timestamp formatting for log records and log file names.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Formats a timestamp as ISO 8601 UTC with millisecond precision.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use neuroflow::utils::iso_millis;
///
/// let ts = Utc.with_ymd_and_hms(2015, 3, 1, 8, 0, 0).unwrap();
/// assert_eq!(iso_millis(&ts), "2015-03-01T08:00:00.000Z");
/// ```
#[must_use]
pub fn iso_millis(dt: &Timestamp) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Formats a timestamp with microseconds and no zone suffix, as used in
/// plain-text log lines.
#[must_use]
pub fn iso_micros(dt: &Timestamp) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Formats the stamp embedded in timestamped log file names.
#[must_use]
pub fn log_file_stamp(dt: &Timestamp) -> String {
    dt.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Formats a duration as fractional seconds for duration log lines.
#[must_use]
pub fn format_duration_secs(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}
