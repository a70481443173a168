//! Log events and their two on-disk renderings.

use super::Severity;
use crate::utils::timestamps::{iso_millis, iso_micros};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single log event.
///
/// Events are immutable once created and are handed by reference to every
/// registered sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Severity of the event.
    pub severity: Severity,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Program or stage the event is about, if any.
    pub label: Option<String>,
    /// The message text.
    pub message: String,
}

impl LogEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(severity: Severity, label: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity,
            timestamp: Utc::now(),
            label: label.map(String::from),
            message: message.into(),
        }
    }

    /// Returns the structured record written by JSON sinks.
    #[must_use]
    pub fn to_record(&self) -> JsonRecord {
        JsonRecord {
            time: iso_millis(&self.timestamp),
            level: self.severity.name().to_string(),
            level_id: self.severity.id(),
            progname: self.label.clone(),
            msg: self.message.clone(),
        }
    }

    /// Renders the event as one JSON line (without the trailing newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        // JsonRecord only holds strings and integers
        serde_json::to_string(&self.to_record()).unwrap_or_default()
    }

    /// Renders the event as one human-readable line (without the trailing newline).
    ///
    /// `pid` is passed in so a sink can compute it once.
    #[must_use]
    pub fn to_plain_line(&self, pid: u32) -> String {
        let name = self.severity.name();
        let initial = &name[..1];
        format!(
            "{initial}, [{} #{pid}] {name:>5} -- {}: {}",
            iso_micros(&self.timestamp),
            self.label.as_deref().unwrap_or(""),
            self.message
        )
    }
}

/// The JSON shape of a log event, one per line in the JSON log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRecord {
    /// ISO-8601 UTC time with millisecond precision.
    pub time: String,
    /// Severity name.
    pub level: String,
    /// Severity ordinal.
    pub level_id: u8,
    /// Label of the emitting program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progname: Option<String>,
    /// Message text, present even when empty.
    #[serde(default)]
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn fixed_event(label: Option<&str>, message: &str) -> LogEvent {
        LogEvent {
            severity: Severity::Command,
            timestamp: Utc.with_ymd_and_hms(2014, 10, 24, 9, 30, 5).unwrap()
                + chrono::Duration::milliseconds(42),
            label: label.map(String::from),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_json_record_shape() {
        let event = fixed_event(Some("3dcalc"), "3dcalc -a head.nii.gz");
        let value: serde_json::Value = serde_json::from_str(&event.to_json_line()).unwrap();

        assert_eq!(value["time"], "2014-10-24T09:30:05.042Z");
        assert_eq!(value["level"], "COMMAND");
        assert_eq!(value["level_id"], 3);
        assert_eq!(value["progname"], "3dcalc");
        assert_eq!(value["msg"], "3dcalc -a head.nii.gz");
    }

    #[test]
    fn test_json_record_omits_absent_label() {
        let event = fixed_event(None, "");
        let value: serde_json::Value = serde_json::from_str(&event.to_json_line()).unwrap();
        let obj = value.as_object().unwrap();

        assert!(!obj.contains_key("progname"));
        assert_eq!(obj["msg"], "");
        assert_eq!(obj.len(), 4);
    }

    #[test]
    fn test_blank_command_output_keeps_msg() {
        let mut event = fixed_event(Some("3dvolreg"), "");
        event.severity = Severity::CommandOutput;
        let line = event.to_json_line();

        assert!(line.contains(r#""msg":"""#), "{line}");
        let record: JsonRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(record.level, "COMMAND_OUTPUT");
        assert_eq!(record.msg, "");
    }

    #[test]
    fn test_plain_line() {
        let event = fixed_event(Some("bet"), "bet head brain");
        assert_eq!(
            event.to_plain_line(77),
            "C, [2014-10-24T09:30:05.042000 #77] COMMAND -- bet: bet head brain"
        );
    }

    #[test]
    fn test_plain_line_pads_short_levels() {
        let mut event = fixed_event(None, "hello");
        event.severity = Severity::Info;
        assert!(event.to_plain_line(1).contains("]  INFO -- : hello"));
    }
}
