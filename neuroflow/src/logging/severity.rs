//! Log severities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of severities a log event can carry.
///
/// Variants are declared in ascending order; the derived `Ord` is what sinks
/// use for level filtering. `Fatal` is the only severity with behavior beyond
/// filtering, and no sink threshold drops it: see
/// [`crate::logging::Logger::fatal`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Diagnostic detail (pids, durations, resolved paths).
    #[default]
    Debug,
    /// Progress messages.
    Info,
    /// One line of an external command's combined output.
    CommandOutput,
    /// An external command about to run.
    Command,
    /// Section heading for a stage or pipeline.
    Title,
    /// Something unexpected that does not stop the run.
    Warn,
    /// A failure that is logged but not escalated.
    Error,
    /// A failure that terminates the pipeline.
    Fatal,
    /// Anything else.
    Unknown,
}

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Self; 9] = [
        Self::Debug,
        Self::Info,
        Self::CommandOutput,
        Self::Command,
        Self::Title,
        Self::Warn,
        Self::Error,
        Self::Fatal,
        Self::Unknown,
    ];

    /// The fixed upper-case name written to log records.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::CommandOutput => "COMMAND_OUTPUT",
            Self::Command => "COMMAND",
            Self::Title => "TITLE",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// The fixed numeric id written as `level_id`.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Looks a severity up by its numeric id.
    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a severity name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity '{0}'")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|sev| sev.name() == wanted)
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}
