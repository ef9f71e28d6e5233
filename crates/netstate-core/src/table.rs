//! Tables extracted from command output

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One row of string values, positionally aligned with the table's columns
pub type Row = Vec<String>;

/// Column list plus rows extracted from one command's output
///
/// Invariant: column names are unique and every row has exactly
/// `columns.len()` values. Tables loaded from disk are not trusted to hold
/// the invariant; call [`Table::validate`] before relying on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Ordered column names
    pub columns: Vec<String>,

    /// Ordered rows
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a table, checking the column/row invariant
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, TableError> {
        let table = Self { columns, rows };
        table.validate()?;
        Ok(table)
    }

    /// Create a table with columns only
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, checking its length
    pub fn push_row(&mut self, row: Row) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowLength {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Check the uniqueness and row-length invariants
    pub fn validate(&self) -> Result<(), TableError> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn(column.clone()));
            }
        }

        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(TableError::RowLength {
                    row: i,
                    expected: self.columns.len(),
                    found: row.len(),
                });
            }
        }

        Ok(())
    }

    /// Find a column's position by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of a named column in a row, if both exist
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build from the list-of-rows form where the first row holds column names
    ///
    /// Only the header row is required. Row shape is not checked here, so a
    /// stored table loads as-is; call [`Table::validate`] before keying it.
    pub fn from_records(mut records: Vec<Row>) -> Result<Self, TableError> {
        if records.is_empty() {
            return Err(TableError::MissingHeader);
        }
        let columns = records.remove(0);
        Ok(Self {
            columns,
            rows: records,
        })
    }

    /// Convert to the list-of-rows form where the first row holds column names
    pub fn to_records(&self) -> Vec<Row> {
        let mut records = Vec::with_capacity(self.rows.len() + 1);
        records.push(self.columns.clone());
        records.extend(self.rows.iter().cloned());
        records
    }
}

/// Table invariant violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Row {row} has {found} values but the table has {expected} columns")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Table has no header row")]
    MissingHeader,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_table() -> Table {
        Table::new(
            vec!["NETWORK".into(), "MASK".into(), "NEXT_HOP".into()],
            vec![
                vec!["10.0.0.0".into(), "24".into(), "1.1.1.1".into()],
                vec!["10.1.0.0".into(), "16".into(), "2.2.2.2".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn lookup_by_column_name() {
        let table = route_table();
        assert_eq!(table.column_index("MASK"), Some(1));
        assert_eq!(table.value(1, "NEXT_HOP"), Some("2.2.2.2"));
        assert_eq!(table.value(5, "NEXT_HOP"), None);
        assert_eq!(table.value(0, "METRIC"), None);
    }

    #[test]
    fn short_row_is_rejected() {
        let err = Table::new(
            vec!["A".into(), "B".into()],
            vec![vec!["1".into()]],
        )
        .unwrap_err();

        assert_eq!(err, TableError::RowLength { row: 0, expected: 2, found: 1 });
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let err = Table::new(vec!["A".into(), "A".into()], vec![]).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("A".into()));
    }

    #[test]
    fn push_row_checks_length() {
        let mut table = Table::with_columns(["A", "B"]);
        assert!(table.push_row(vec!["1".into(), "2".into()]).is_ok());
        assert!(table.push_row(vec!["1".into()]).is_err());
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn records_form_keeps_header_first() {
        let table = route_table();
        let records = table.to_records();
        assert_eq!(records[0], vec!["NETWORK", "MASK", "NEXT_HOP"]);
        assert_eq!(Table::from_records(records).unwrap(), table);
        assert_eq!(Table::from_records(vec![]).unwrap_err(), TableError::MissingHeader);
    }

    #[test]
    fn records_form_loads_ragged_rows_unchecked() {
        let records = vec![
            vec!["NETWORK".to_string(), "MASK".to_string()],
            vec!["10.0.0.0".to_string()],
        ];

        let table = Table::from_records(records).unwrap();

        assert_eq!(table.rows.len(), 1);
        assert_eq!(
            table.validate().unwrap_err(),
            TableError::RowLength { row: 0, expected: 2, found: 1 }
        );
    }
}
