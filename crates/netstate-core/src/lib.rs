//! netstate core
//!
//! Domain model for captured device state: transcript sections, tables,
//! snapshots and their persisted form, diff reports, diagnostics and
//! configuration. Never rename diagnostic codes - they are part of the
//! public API.

pub mod diagnostic;
pub mod section;
pub mod table;
pub mod snapshot;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use section::Section;
pub use table::{Row, Table, TableError};
pub use snapshot::{
    CommandRecord, CommandResult, ParseStatus, RecordResult, Snapshot, SnapshotError,
};
pub use report::{
    ColumnChange, CommandDiff, DiffReport, DiffRow, ReportSummary, ReportVersion, RowKind,
};
pub use config::{
    Config, ConfigError, DiffConfig, DiffSettings, DuplicateKeyPolicy, ParserConfig,
    SegmentConfig, SeverityThreshold,
};
