//! Snapshots of captured command state and their persisted form
//!
//! A snapshot is written to disk as an ordered list of command records
//! `{command, encoding, result}`. `result` is either the raw text of the
//! command, a table as a list of rows whose first row holds column names, or
//! (for `json` records) whatever structured reply the device sent.

use crate::table::{Row, Table, TableError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Persisted format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Encoding tag for records holding a table
pub const ENCODING_LIST: &str = "list";

/// Encoding tag for records holding raw text
pub const ENCODING_TEXT: &str = "text";

/// Encoding tag for records holding a device's structured JSON reply
pub const ENCODING_JSON: &str = "json";

/// Whether structure could be extracted from a command's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseStatus {
    Parsed,
    Unparsable,
}

impl std::fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parsed => write!(f, "parsed"),
            Self::Unparsable => write!(f, "unparsable"),
        }
    }
}

/// Result of one command: its raw text, plus a table when one was extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    command: String,
    table: Option<Table>,
    raw_text: String,
    structured: Option<serde_json::Value>,
}

impl CommandResult {
    /// A command whose output was parsed into a table
    pub fn parsed(command: impl Into<String>, table: Table, raw_text: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            table: Some(table),
            raw_text: raw_text.into(),
            structured: None,
        }
    }

    /// A command whose output could not be parsed; the raw text is kept
    pub fn unparsable(command: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            table: None,
            raw_text: raw_text.into(),
            structured: None,
        }
    }

    /// A command the device answered with structured JSON
    ///
    /// No table is extracted, so the status is `Unparsable`. The raw text is
    /// the pretty-printed JSON.
    pub fn structured(command: impl Into<String>, value: serde_json::Value) -> Self {
        // A Value has only string keys, so it always serializes
        let raw_text = serde_json::to_string_pretty(&value).unwrap_or_default();
        Self {
            command: command.into(),
            table: None,
            raw_text,
            structured: Some(value),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn status(&self) -> ParseStatus {
        if self.table.is_some() {
            ParseStatus::Parsed
        } else {
            ParseStatus::Unparsable
        }
    }

    /// The extracted table, present iff the status is `Parsed`
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// The device's JSON reply, for results built from one
    pub fn structured_output(&self) -> Option<&serde_json::Value> {
        self.structured.as_ref()
    }

    /// Convert to the persisted record form
    pub fn to_record(&self) -> CommandRecord {
        if let Some(value) = &self.structured {
            return CommandRecord {
                command: self.command.clone(),
                encoding: ENCODING_JSON.to_string(),
                result: RecordResult::Structured(value.clone()),
                raw: None,
            };
        }

        match &self.table {
            Some(table) => CommandRecord {
                command: self.command.clone(),
                encoding: ENCODING_LIST.to_string(),
                result: RecordResult::Table(table.to_records()),
                raw: Some(self.raw_text.clone()),
            },
            None => CommandRecord {
                command: self.command.clone(),
                encoding: ENCODING_TEXT.to_string(),
                result: RecordResult::Text(self.raw_text.clone()),
                raw: None,
            },
        }
    }

    /// Rebuild from a persisted record; `position` is only used in errors
    ///
    /// Table rows are loaded without checking their shape. A malformed table
    /// is reported when that command is diffed, not here.
    pub fn from_record(position: usize, record: CommandRecord) -> Result<Self, SnapshotError> {
        let CommandRecord {
            command,
            encoding,
            result,
            raw,
        } = record;

        if encoding == ENCODING_JSON {
            return Ok(Self::structured(command, result.into_value()));
        }

        match result {
            RecordResult::Table(rows) if encoding == ENCODING_LIST => {
                let table = Table::from_records(rows).map_err(|source| SnapshotError::Table {
                    position,
                    command: command.clone(),
                    source,
                })?;
                Ok(Self::parsed(command, table, raw.unwrap_or_default()))
            }
            RecordResult::Text(output) if encoding != ENCODING_LIST => {
                Ok(Self::unparsable(command, output))
            }
            RecordResult::Structured(value) if encoding != ENCODING_LIST => {
                let output = wrapped_output(&value).ok_or_else(|| {
                    SnapshotError::InconsistentRecord {
                        position,
                        command: command.clone(),
                        encoding: encoding.clone(),
                    }
                })?;
                Ok(Self::unparsable(command, output))
            }
            _ => Err(SnapshotError::InconsistentRecord {
                position,
                command,
                encoding,
            }),
        }
    }
}

/// Text of an `{"output": "..."}` object, as device APIs wrap raw replies
fn wrapped_output(value: &serde_json::Value) -> Option<String> {
    value
        .as_object()?
        .get("output")?
        .as_str()
        .map(str::to_string)
}

/// One full capture, as an ordered list of per-command results
///
/// Repeated command names are kept in capture order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Device or file the capture came from
    pub source_id: String,

    /// When the capture was taken
    pub captured_at: DateTime<Utc>,

    /// Results in capture order
    pub results: Vec<CommandResult>,
}

impl Snapshot {
    /// Create an empty snapshot stamped with the current time
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            captured_at: Utc::now(),
            results: Vec::new(),
        }
    }

    /// Set the capture time
    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// Set the results
    pub fn with_results(mut self, results: Vec<CommandResult>) -> Self {
        self.results = results;
        self
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Command names in capture order
    pub fn commands(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.command()).collect()
    }

    /// Number of results that were parsed into tables
    pub fn parsed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status() == ParseStatus::Parsed)
            .count()
    }

    /// SHA-256 over the persisted records, hex encoded
    ///
    /// Independent of `source_id` and `captured_at`, so two captures of an
    /// unchanged device share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for record in self.to_records() {
            // Records only hold strings, so serialization cannot fail
            let line = serde_json::to_string(&record).unwrap_or_default();
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }

    /// Convert to the persisted record list
    pub fn to_records(&self) -> Vec<CommandRecord> {
        self.results.iter().map(CommandResult::to_record).collect()
    }

    /// Rebuild from a persisted record list
    pub fn from_records(
        source_id: impl Into<String>,
        captured_at: DateTime<Utc>,
        records: Vec<CommandRecord>,
    ) -> Result<Self, SnapshotError> {
        let results = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| CommandResult::from_record(i, record))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source_id: source_id.into(),
            captured_at,
            results,
        })
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        let file = SnapshotFile {
            version: SNAPSHOT_FORMAT_VERSION,
            source_id: self.source_id.clone(),
            captured_at: self.captured_at,
            commands: self.to_records(),
        };
        serde_json::to_string_pretty(&file)
            .map_err(|e| SnapshotError::SerializeError(e.to_string()))
    }

    /// Parse from a JSON string
    ///
    /// Accepts both the envelope written by [`Snapshot::to_json`] and a bare
    /// list of records. For a bare list, `fallback_source_id` names the source
    /// and the capture time is the load time.
    pub fn from_json(json: &str, fallback_source_id: &str) -> Result<Self, SnapshotError> {
        let document: SnapshotDocument =
            serde_json::from_str(json).map_err(|e| SnapshotError::ParseError(e.to_string()))?;

        match document {
            SnapshotDocument::Envelope(file) => {
                if file.version > SNAPSHOT_FORMAT_VERSION {
                    return Err(SnapshotError::UnsupportedVersion(file.version));
                }
                Self::from_records(file.source_id, file.captured_at, file.commands)
            }
            SnapshotDocument::Records(records) => {
                Self::from_records(fallback_source_id, Utc::now(), records)
            }
        }
    }

    /// Save to file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .map_err(|e| SnapshotError::IoError(path.display().to_string(), e.to_string()))
    }

    /// Load from file; bare record lists take their source id from the file stem
    pub fn load_from_file(path: &Path) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SnapshotError::IoError(path.display().to_string(), e.to_string()))?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::from_json(&contents, &stem)
    }
}

/// Persisted form of one command result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Command name
    pub command: String,

    /// `list` for tables, `text` for raw output, `json` for structured replies
    pub encoding: String,

    /// Table rows, raw text or a structured reply
    pub result: RecordResult,

    /// Raw text of a parsed command, kept for audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Payload of a command record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordResult {
    /// Rows, first row = column names
    Table(Vec<Row>),

    /// Raw command output
    Text(String),

    /// Any other JSON payload, such as a structured device reply or raw
    /// output wrapped in an `{"output": ...}` object
    Structured(serde_json::Value),
}

impl RecordResult {
    fn into_value(self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::Table(rows) => Value::Array(
                rows.into_iter()
                    .map(|row| Value::Array(row.into_iter().map(Value::String).collect()))
                    .collect(),
            ),
            Self::Text(text) => Value::String(text),
            Self::Structured(value) => value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    source_id: String,
    captured_at: DateTime<Utc>,
    commands: Vec<CommandRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    Envelope(SnapshotFile),
    Records(Vec<CommandRecord>),
}

/// Snapshot persistence errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to access snapshot file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse snapshot JSON: {0}")]
    ParseError(String),

    #[error("Failed to serialize snapshot: {0}")]
    SerializeError(String),

    #[error("Unsupported snapshot format version {0}")]
    UnsupportedVersion(u32),

    #[error("Record #{position} '{command}' has an invalid table: {source}")]
    Table {
        position: usize,
        command: String,
        #[source]
        source: TableError,
    },

    #[error(
        "Record #{position} '{command}' has encoding '{encoding}' that does not match its result"
    )]
    InconsistentRecord {
        position: usize,
        command: String,
        encoding: String,
    },
}
