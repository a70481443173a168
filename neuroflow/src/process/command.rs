//! Command specifications and a small command-line builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One external command of a stage.
///
/// The command line is opaque: it is handed to the shell as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Full command line.
    pub command: String,
    /// Label for log events; defaults to the program name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Directory to run in; inherited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
}

impl CommandSpec {
    /// Creates a command spec.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            label: None,
            workdir: None,
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Returns the label, or the first token of the command line.
    #[must_use]
    pub fn resolved_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            self.command
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string()
        })
    }
}

impl From<&str> for CommandSpec {
    fn from(command: &str) -> Self {
        Self::new(command)
    }
}

impl From<String> for CommandSpec {
    fn from(command: String) -> Self {
        Self::new(command)
    }
}

impl From<CommandLine> for CommandSpec {
    fn from(line: CommandLine) -> Self {
        let label = line.program.clone();
        Self::new(line.to_string()).with_label(label)
    }
}

/// An option value for [`CommandLine::opt`]. Bare flags are added with
/// [`CommandLine::flag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptValue {
    /// A bare flag such as `--overwrite`.
    Flag,
    /// One value following the flag.
    One(String),
    /// Several values following the flag.
    Many(Vec<String>),
}

impl From<&str> for OptValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for OptValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<&std::path::Path> for OptValue {
    fn from(value: &std::path::Path) -> Self {
        Self::One(value.display().to_string())
    }
}

impl From<Vec<String>> for OptValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<usize> for OptValue {
    fn from(value: usize) -> Self {
        Self::One(value.to_string())
    }
}

/// Builds a command line from a program, options, and positional arguments.
///
/// Single-letter option keys render as `-k`, longer ones as `--key`. Options
/// come first, then arguments, in insertion order.
///
/// ```
/// use neuroflow::process::CommandLine;
///
/// let line = CommandLine::new("anat_skullstrip")
///     .opt("h", "/data/sub01/head.nii.gz")
///     .opt("outdir", "/data/sub01/anat")
///     .flag("overwrite");
/// assert_eq!(
///     line.to_string(),
///     "anat_skullstrip -h /data/sub01/head.nii.gz --outdir /data/sub01/anat --overwrite"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    opts: Vec<(String, OptValue)>,
    args: Vec<String>,
}

impl CommandLine {
    /// Starts a command line for `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            opts: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Adds an option.
    #[must_use]
    pub fn opt(mut self, key: impl Into<String>, value: impl Into<OptValue>) -> Self {
        self.opts.push((key.into(), value.into()));
        self
    }

    /// Adds an option only when `value` is present.
    #[must_use]
    pub fn opt_if<V: Into<OptValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.opt(key, value),
            None => self,
        }
    }

    /// Adds a bare flag such as `--overwrite`.
    #[must_use]
    pub fn flag(self, key: impl Into<String>) -> Self {
        self.opt(key, OptValue::Flag)
    }

    /// Adds a bare flag only when `on` is true.
    #[must_use]
    pub fn flag_if(self, key: impl Into<String>, on: bool) -> Self {
        if on {
            self.flag(key)
        } else {
            self
        }
    }

    /// Adds a positional argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Returns the tokens, unquoted.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = vec![self.program.clone()];
        for (key, value) in &self.opts {
            tokens.push(if key.chars().count() == 1 {
                format!("-{key}")
            } else {
                format!("--{key}")
            });
            match value {
                OptValue::Flag => {}
                OptValue::One(v) => tokens.push(v.clone()),
                OptValue::Many(vs) => tokens.extend(vs.iter().cloned()),
            }
        }
        tokens.extend(self.args.iter().cloned());
        tokens
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.tokens().iter().map(|t| shell_quote(t)).collect();
        f.write_str(&quoted.join(" "))
    }
}

/// Quotes `token` for a POSIX shell when it contains anything special.
#[must_use]
pub fn shell_quote(token: &str) -> String {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}
