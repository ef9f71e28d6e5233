//! Snapshot diff engine
//!
//! Command results are paired by position, never by name. Each pair with a
//! configured handler is diffed as a full outer join on its index columns:
//! keys only in the first table are `Missing`, keys only in the second are
//! `New`, shared keys are `Changed` or `Unchanged` depending on the check
//! columns.
//!
//! A pair that cannot be diffed leaves no entry in the report, only a
//! located diagnostic. Other pairs are unaffected.

use crate::compare::{ExactComparator, RowComparator};
use netstate_core::{
    ColumnChange, CommandDiff, CommandResult, Config, Diagnostic, DiagnosticCode, DiffConfig,
    DiffReport, DiffRow, DiffSettings, DuplicateKeyPolicy, Location, Row, RowKind, Severity,
    SeverityThreshold, Snapshot, Table, TableError,
};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;

/// Which snapshot of the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Second => write!(f, "second"),
        }
    }
}

/// Why a paired command produced no entry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandDiffError {
    #[error("Commands differ at this position: '{first}' vs '{second}'")]
    CommandMismatch { first: String, second: String },

    #[error("No diff handler configured for '{0}'")]
    NoHandler(String),

    #[error("'{0}' is excluded by the skip list")]
    Skipped(String),

    #[error("Output of '{command}' in the {side} snapshot was not parsed into a table")]
    ParseMiss { command: String, side: Side },

    #[error("Column lists differ: {first:?} vs {second:?}")]
    ColumnsDiffer { first: Vec<String>, second: Vec<String> },

    #[error("Configured column '{0}' is not in the table")]
    MissingColumn(String),

    #[error("Handler has no index columns")]
    EmptyIndex,

    #[error("Malformed table in the {side} snapshot: {source}")]
    DataFormat {
        side: Side,
        #[source]
        source: TableError,
    },

    #[error("Key {key:?} occurs more than once in the {side} snapshot")]
    DuplicateKey { side: Side, key: Vec<String> },
}

impl CommandDiffError {
    /// Diagnostic code reported for this failure
    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::CommandMismatch { .. } => DiagnosticCode::CommandMismatch,
            Self::NoHandler(_) => DiagnosticCode::NoHandler,
            Self::Skipped(_) => DiagnosticCode::CommandSkipped,
            Self::ParseMiss { .. } => DiagnosticCode::ParseMiss,
            Self::ColumnsDiffer { .. } | Self::MissingColumn(_) | Self::EmptyIndex => {
                DiagnosticCode::ConfigMismatch
            }
            Self::DataFormat { .. } => DiagnosticCode::DataFormat,
            Self::DuplicateKey { .. } => DiagnosticCode::DuplicateKey,
        }
    }

    /// Severity before overrides
    ///
    /// A rejected duplicate key fails the command, so it is an error rather
    /// than the warning attached under last-write-wins.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::DuplicateKey { .. } => Severity::Error,
            other => other.code().default_severity(),
        }
    }

    fn to_diagnostic(&self, location: Location) -> Diagnostic {
        let diagnostic = Diagnostic::new(self.code(), self.default_severity(), self.to_string())
            .with_location(location);

        match self {
            Self::CommandMismatch { first, second } => diagnostic.with_comparison(first, second),
            Self::ColumnsDiffer { first, second } => {
                diagnostic.with_comparison(first.join(", "), second.join(", "))
            }
            _ => diagnostic,
        }
    }
}

/// Rows of one table keyed by their index values
struct KeyIndex<'t> {
    /// Keys in order of first occurrence
    order: Vec<Vec<&'t str>>,
    rows: HashMap<Vec<&'t str>, &'t Row>,
    duplicates: Vec<Vec<&'t str>>,
}

impl<'t> KeyIndex<'t> {
    /// Later rows replace earlier ones; the key keeps its first position
    fn build(table: &'t Table, key_positions: &[usize]) -> Self {
        let mut order = Vec::new();
        let mut rows = HashMap::with_capacity(table.rows.len());
        let mut duplicates = Vec::new();

        for row in &table.rows {
            let key: Vec<&str> = key_positions.iter().map(|&p| row[p].as_str()).collect();
            if rows.insert(key.clone(), row).is_some() {
                if !duplicates.contains(&key) {
                    duplicates.push(key);
                }
            } else {
                order.push(key);
            }
        }

        Self { order, rows, duplicates }
    }
}

fn owned(key: &[&str]) -> Vec<String> {
    key.iter().map(|s| s.to_string()).collect()
}

fn column_positions(table: &Table, columns: &[String]) -> Result<Vec<usize>, CommandDiffError> {
    columns
        .iter()
        .map(|column| {
            table
                .column_index(column)
                .ok_or_else(|| CommandDiffError::MissingColumn(column.clone()))
        })
        .collect()
}

fn check_duplicates(
    index: &KeyIndex<'_>,
    side: Side,
    policy: DuplicateKeyPolicy,
    location: &Location,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), CommandDiffError> {
    let Some(first) = index.duplicates.first() else {
        return Ok(());
    };

    match policy {
        DuplicateKeyPolicy::Reject => Err(CommandDiffError::DuplicateKey {
            side,
            key: owned(first),
        }),
        DuplicateKeyPolicy::LastWriteWins => {
            let keys: Vec<String> = index.duplicates.iter().map(|k| k.join("|")).collect();
            diagnostics.push(
                Diagnostic::from_code(
                    DiagnosticCode::DuplicateKey,
                    format!(
                        "{} repeated key(s) in the {} snapshot, last row wins: {}",
                        keys.len(),
                        side,
                        keys.join(", ")
                    ),
                )
                .with_location(location.clone()),
            );
            Ok(())
        }
    }
}

/// Diff two tables of one command
///
/// Both tables must satisfy the row length invariant and share the exact
/// column list, and every configured column must be present. Output rows
/// list the first table's keys in its row order, then keys only in the
/// second table in that table's row order.
pub fn diff_tables(
    position: usize,
    command: &str,
    first: &Table,
    second: &Table,
    config: &DiffConfig,
    policy: DuplicateKeyPolicy,
    comparator: &dyn RowComparator,
) -> Result<CommandDiff, CommandDiffError> {
    first
        .validate()
        .map_err(|source| CommandDiffError::DataFormat { side: Side::First, source })?;
    second
        .validate()
        .map_err(|source| CommandDiffError::DataFormat { side: Side::Second, source })?;

    if config.index.is_empty() {
        return Err(CommandDiffError::EmptyIndex);
    }
    if first.columns != second.columns {
        return Err(CommandDiffError::ColumnsDiffer {
            first: first.columns.clone(),
            second: second.columns.clone(),
        });
    }

    if let Some(absent) = config
        .referenced_columns()
        .into_iter()
        .find(|column| first.column_index(column).is_none())
    {
        return Err(CommandDiffError::MissingColumn(absent.to_string()));
    }

    let key_positions = column_positions(first, &config.index)?;
    let check_positions = column_positions(first, &config.check)?;

    let location = Location::new(position, command);
    let mut diagnostics = Vec::new();

    let index_a = KeyIndex::build(first, &key_positions);
    let index_b = KeyIndex::build(second, &key_positions);
    check_duplicates(&index_a, Side::First, policy, &location, &mut diagnostics)?;
    check_duplicates(&index_b, Side::Second, policy, &location, &mut diagnostics)?;

    let mut rows = Vec::with_capacity(index_a.order.len());

    for key in &index_a.order {
        let Some(row_a) = index_a.rows.get(key) else {
            continue;
        };

        let Some(row_b) = index_b.rows.get(key) else {
            rows.push(DiffRow::new(RowKind::Missing, owned(key)));
            continue;
        };

        let details: Vec<ColumnChange> = config
            .check
            .iter()
            .zip(&check_positions)
            .filter(|(column, &p)| !comparator.equal(column, &row_a[p], &row_b[p]))
            .map(|(column, &p)| ColumnChange {
                column: column.clone(),
                old: row_a[p].clone(),
                new: row_b[p].clone(),
            })
            .collect();

        if details.is_empty() {
            rows.push(DiffRow::new(RowKind::Unchanged, owned(key)));
        } else {
            rows.push(DiffRow::changed(owned(key), details));
        }
    }

    rows.extend(
        index_b
            .order
            .iter()
            .filter(|key| !index_a.rows.contains_key(*key))
            .map(|key| DiffRow::new(RowKind::New, owned(key))),
    );

    Ok(CommandDiff {
        position,
        command: command.to_string(),
        index_columns: config.index.clone(),
        rows,
        diagnostics,
    })
}

/// Diffs snapshot pairs with a fixed set of handlers
pub struct DiffEngine {
    settings: DiffSettings,
    severity: SeverityThreshold,
    comparators: HashMap<String, Box<dyn RowComparator>>,
    default_comparator: ExactComparator,
}

impl DiffEngine {
    pub fn new(settings: DiffSettings, severity: SeverityThreshold) -> Self {
        Self {
            settings,
            severity,
            comparators: HashMap::new(),
            default_comparator: ExactComparator,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.diff.clone(), config.severity.clone())
    }

    /// Use a custom comparator for one command's check columns
    pub fn with_comparator(
        mut self,
        command: impl Into<String>,
        comparator: impl RowComparator + 'static,
    ) -> Self {
        self.comparators.insert(command.into(), Box::new(comparator));
        self
    }

    pub fn settings(&self) -> &DiffSettings {
        &self.settings
    }

    fn comparator(&self, command: &str) -> &dyn RowComparator {
        match self.comparators.get(command) {
            Some(comparator) => comparator.as_ref(),
            None => &self.default_comparator,
        }
    }

    fn apply_severity(&self, diagnostic: Diagnostic) -> Diagnostic {
        let severity = self.severity.get_severity(diagnostic.code, diagnostic.severity);
        diagnostic.with_severity(severity)
    }

    /// Diff one positional pair
    pub fn diff_pair(
        &self,
        position: usize,
        first: &CommandResult,
        second: &CommandResult,
    ) -> Result<CommandDiff, CommandDiffError> {
        let command = first.command();
        if command != second.command() {
            return Err(CommandDiffError::CommandMismatch {
                first: command.to_string(),
                second: second.command().to_string(),
            });
        }

        if self.settings.is_skipped(command) {
            return Err(CommandDiffError::Skipped(command.to_string()));
        }

        let config = self
            .settings
            .handler(command)
            .ok_or_else(|| CommandDiffError::NoHandler(command.to_string()))?;

        let table_a = first.table().ok_or_else(|| CommandDiffError::ParseMiss {
            command: command.to_string(),
            side: Side::First,
        })?;
        let table_b = second.table().ok_or_else(|| CommandDiffError::ParseMiss {
            command: command.to_string(),
            side: Side::Second,
        })?;

        diff_tables(
            position,
            command,
            table_a,
            table_b,
            config,
            self.settings.duplicate_keys,
            self.comparator(command),
        )
    }

    /// Diff two snapshots
    ///
    /// Pairs are evaluated on the rayon pool when `parallel` is set; the
    /// report lists them in position order either way.
    pub fn diff(&self, first: &Snapshot, second: &Snapshot) -> DiffReport {
        let paired = first.len().min(second.len());
        let evaluate = |i: usize| self.diff_pair(i, &first.results[i], &second.results[i]);

        let outcomes: Vec<Result<CommandDiff, CommandDiffError>> = if self.settings.parallel {
            (0..paired).into_par_iter().map(evaluate).collect()
        } else {
            (0..paired).map(evaluate).collect()
        };

        let mut report = DiffReport::new(&first.source_id, &second.source_id).with_metadata(
            serde_json::json!({
                "fingerprint_a": first.fingerprint(),
                "fingerprint_b": second.fingerprint(),
                "captured_at_a": first.captured_at.to_rfc3339(),
                "captured_at_b": second.captured_at.to_rfc3339(),
            }),
        );

        for (position, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(mut entry) => {
                    tracing::debug!(
                        position,
                        command = %entry.command,
                        rows = entry.rows.len(),
                        changes = entry.changes().count(),
                        "diffed command"
                    );
                    entry.diagnostics = entry
                        .diagnostics
                        .into_iter()
                        .map(|d| self.apply_severity(d))
                        .collect();
                    report.add_entry(entry);
                }
                Err(err) => {
                    let location = Location::new(position, first.results[position].command());
                    let diagnostic = self.apply_severity(err.to_diagnostic(location));
                    match diagnostic.severity {
                        Severity::Info => tracing::debug!(position, reason = %err, "no entry"),
                        _ => tracing::warn!(position, reason = %err, "no entry"),
                    }
                    report.add_diagnostic(diagnostic);
                }
            }
        }

        for (position, longer, side) in unpaired(first, second) {
            let command = longer.results[position].command();
            let diagnostic = Diagnostic::from_code(
                DiagnosticCode::CommandUnpaired,
                format!(
                    "'{}' has no counterpart; only the {} snapshot has position {}",
                    command, side, position
                ),
            )
            .with_location(Location::new(position, command));
            report.add_diagnostic(self.apply_severity(diagnostic));
        }

        tracing::info!(
            first = %first.source_id,
            second = %second.source_id,
            compared = report.summary.commands_compared,
            new = report.summary.new,
            missing = report.summary.missing,
            changed = report.summary.changed,
            "diff complete"
        );

        report
    }
}

/// Positions present in only one snapshot
fn unpaired<'s>(
    first: &'s Snapshot,
    second: &'s Snapshot,
) -> impl Iterator<Item = (usize, &'s Snapshot, Side)> {
    let paired = first.len().min(second.len());
    let (longer, side) = if first.len() >= second.len() {
        (first, Side::First)
    } else {
        (second, Side::Second)
    };
    (paired..longer.len()).map(move |position| (position, longer, side))
}

/// Diff two snapshots with the given handlers and default severities
pub fn diff(first: &Snapshot, second: &Snapshot, settings: &DiffSettings) -> DiffReport {
    DiffEngine::new(settings.clone(), SeverityThreshold::default()).diff(first, second)
}
