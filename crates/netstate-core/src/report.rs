//! Diff report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::diagnostic::{Diagnostic, Severity};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Classification of one key in the outer join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    /// Key only in the second snapshot
    New,

    /// Key only in the first snapshot
    Missing,

    /// Key in both, some check column differs
    Changed,

    /// Key in both, all check columns equal
    Unchanged,
}

impl std::fmt::Display for RowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Missing => write!(f, "missing"),
            Self::Changed => write!(f, "changed"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// A check column whose value differs between the two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnChange {
    pub column: String,

    /// Value in the first snapshot
    pub old: String,

    /// Value in the second snapshot
    pub new: String,
}

/// One classified key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRow {
    pub kind: RowKind,

    /// Values of the index columns, in configured order
    pub key: Vec<String>,

    /// Differing check columns, in configured order; only set for `Changed`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ColumnChange>,
}

impl DiffRow {
    pub fn new(kind: RowKind, key: Vec<String>) -> Self {
        Self {
            kind,
            key,
            details: Vec::new(),
        }
    }

    pub fn changed(key: Vec<String>, details: Vec<ColumnChange>) -> Self {
        Self {
            kind: RowKind::Changed,
            key,
            details,
        }
    }

    /// The change recorded for a column, if any
    pub fn detail(&self, column: &str) -> Option<&ColumnChange> {
        self.details.iter().find(|d| d.column == column)
    }
}

/// Diff of one paired command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDiff {
    /// Position of the pair in capture order
    pub position: usize,

    pub command: String,

    /// Index columns naming the key tuple
    pub index_columns: Vec<String>,

    /// Rows: first snapshot's keys in its row order, then keys only in the second
    pub rows: Vec<DiffRow>,

    /// Non-fatal notes about this command
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl CommandDiff {
    pub fn count(&self, kind: RowKind) -> usize {
        self.rows.iter().filter(|r| r.kind == kind).count()
    }

    /// Check if any row is new, missing or changed
    pub fn has_changes(&self) -> bool {
        self.rows.iter().any(|r| r.kind != RowKind::Unchanged)
    }

    /// Rows other than `Unchanged`
    pub fn changes(&self) -> impl Iterator<Item = &DiffRow> {
        self.rows.iter().filter(|r| r.kind != RowKind::Unchanged)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Command pairs that produced an entry
    pub commands_compared: usize,

    pub new: usize,
    pub missing: usize,
    pub changed: usize,
    pub unchanged: usize,

    /// Diagnostics by severity, entry diagnostics included
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl ReportSummary {
    fn count_diagnostic(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warn => self.warnings += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// Diff report (report.json v1)
///
/// Entries appear in pairing order. Positions that were skipped or failed
/// have no entry, only a report-level diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Source of the first snapshot
    pub source_a: String,

    /// Source of the second snapshot
    pub source_b: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// Per-command diffs
    pub entries: Vec<CommandDiff>,

    /// Diagnostics for positions without an entry
    pub diagnostics: Vec<Diagnostic>,

    /// Metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl DiffReport {
    /// Create a new empty report
    pub fn new(source_a: impl Into<String>, source_b: impl Into<String>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            source_a: source_a.into(),
            source_b: source_b.into(),
            summary: ReportSummary::default(),
            entries: Vec::new(),
            diagnostics: Vec::new(),
            metadata: None,
        }
    }

    /// Append a command diff
    pub fn add_entry(&mut self, entry: CommandDiff) {
        self.summary.commands_compared += 1;
        for row in &entry.rows {
            match row.kind {
                RowKind::New => self.summary.new += 1,
                RowKind::Missing => self.summary.missing += 1,
                RowKind::Changed => self.summary.changed += 1,
                RowKind::Unchanged => self.summary.unchanged += 1,
            }
        }
        for diagnostic in &entry.diagnostics {
            self.summary.count_diagnostic(diagnostic);
        }
        self.entries.push(entry);
    }

    /// Add a report-level diagnostic
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.summary.count_diagnostic(&diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Set metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Check if any entry has new, missing or changed rows
    pub fn has_changes(&self) -> bool {
        self.entries.iter().any(CommandDiff::has_changes)
    }

    /// First entry for a command name
    pub fn entry(&self, command: &str) -> Option<&CommandDiff> {
        self.entries.iter().find(|e| e.command == command)
    }

    /// Report-level and entry diagnostics, report-level first
    pub fn all_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .chain(self.entries.iter().flat_map(|e| e.diagnostics.iter()))
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
