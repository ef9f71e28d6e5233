//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Pairing
    /// Commands at the same position in both snapshots have different names
    CommandMismatch,

    /// One snapshot has more commands than the other
    CommandUnpaired,

    /// The command is listed in the diff skip list
    CommandSkipped,

    // Handler configuration
    /// No diff configuration exists for a command
    NoHandler,

    /// Configured columns are absent, or the two tables disagree on columns
    ConfigMismatch,

    // Data
    /// No table could be extracted from the command output
    ParseMiss,

    /// A row's value count disagrees with its table's column count
    DataFormat,

    /// The same key appears more than once in one table
    DuplicateKey,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommandMismatch => "COMMAND_MISMATCH",
            Self::CommandUnpaired => "COMMAND_UNPAIRED",
            Self::CommandSkipped => "COMMAND_SKIPPED",
            Self::NoHandler => "NO_HANDLER",
            Self::ConfigMismatch => "CONFIG_MISMATCH",
            Self::ParseMiss => "PARSE_MISS",
            Self::DataFormat => "DATA_FORMAT",
            Self::DuplicateKey => "DUPLICATE_KEY",
        }
    }

    /// Severity used when no override is configured
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::CommandUnpaired
            | Self::CommandSkipped
            | Self::NoHandler
            | Self::ParseMiss => Severity::Info,
            Self::CommandMismatch | Self::ConfigMismatch | Self::DuplicateKey => Severity::Warn,
            Self::DataFormat => Severity::Error,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - the command was skipped or partially trusted
    Warn,

    /// Error - a unit of work failed
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Where in a snapshot pair a diagnostic applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Position of the command in capture order (0-indexed)
    pub position: usize,

    /// Command name at that position
    pub command: String,
}

impl Location {
    pub fn new(position: usize, command: impl Into<String>) -> Self {
        Self {
            position,
            command: command.into(),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} '{}'", self.position, self.command)
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Command position (best-effort)
    pub location: Option<Location>,

    /// Value seen on the first snapshot's side
    pub expected: Option<String>,

    /// Value seen on the second snapshot's side
    pub actual: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
            expected: None,
            actual: None,
        }
    }

    /// Create a diagnostic at the code's default severity
    pub fn from_code(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, code.default_severity(), message)
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set expected/actual values
    pub fn with_comparison(
        mut self,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    /// Override severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}
