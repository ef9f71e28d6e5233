//! Text-to-table parsing seam
//!
//! Snapshot building depends only on the [`TableParser`] contract. The
//! built-in [`RegexTableParser`] applies one line pattern per command; richer
//! template engines plug in behind the same trait.

use netstate_core::{Config, ConfigError, Table};
use regex::Regex;
use std::collections::HashMap;

/// Why no table came out of a command's output
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseMiss {
    #[error("No template for command '{0}'")]
    NoTemplate(String),

    #[error("Template for '{0}' matched no lines")]
    NoRows(String),

    #[error("Vendor '{0}' is not supported by this parser")]
    UnsupportedVendor(String),
}

/// Turns one command's raw output into a table
pub trait TableParser: Send + Sync {
    /// Parse `raw_text` produced by `command` on a `vendor` device
    fn parse(&self, command: &str, vendor: &str, raw_text: &str) -> Result<Table, ParseMiss>;
}

/// Line-oriented parser: each configured regex turns matching lines into rows
///
/// Named capture groups become columns, in pattern order. A group that does
/// not take part in a match yields an empty value.
#[derive(Debug, Clone, Default)]
pub struct RegexTableParser {
    vendor: Option<String>,
    templates: HashMap<String, Regex>,
}

impl RegexTableParser {
    /// Create a parser with no templates, accepting any vendor
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[parsers]` section, restricted to the configured vendor
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut parser = Self::new().for_vendor(&config.vendor);
        for (command, template) in &config.parsers {
            parser = parser.with_template(command, &template.pattern).map_err(|e| {
                ConfigError::InvalidPattern {
                    name: format!("parsers.\"{}\"", command),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(parser)
    }

    /// Only parse output from this vendor (case-insensitive)
    pub fn for_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    /// Register a line pattern for a command
    pub fn with_template(
        mut self,
        command: impl Into<String>,
        pattern: &str,
    ) -> Result<Self, regex::Error> {
        self.templates.insert(command.into(), Regex::new(pattern)?);
        Ok(self)
    }

    pub fn has_template(&self, command: &str) -> bool {
        self.templates.contains_key(command)
    }
}

impl TableParser for RegexTableParser {
    fn parse(&self, command: &str, vendor: &str, raw_text: &str) -> Result<Table, ParseMiss> {
        if let Some(expected) = &self.vendor {
            if !expected.eq_ignore_ascii_case(vendor) {
                return Err(ParseMiss::UnsupportedVendor(vendor.to_string()));
            }
        }

        let template = self
            .templates
            .get(command)
            .ok_or_else(|| ParseMiss::NoTemplate(command.to_string()))?;

        let columns: Vec<&str> = template.capture_names().flatten().collect();
        let mut table = Table::with_columns(columns.iter().copied());

        for line in raw_text.lines() {
            let Some(caps) = template.captures(line) else {
                continue;
            };

            table.rows.push(
                columns
                    .iter()
                    .map(|name| {
                        caps.name(name)
                            .map(|m| m.as_str().trim().to_string())
                            .unwrap_or_default()
                    })
                    .collect(),
            );
        }

        if table.rows.is_empty() {
            return Err(ParseMiss::NoRows(command.to_string()));
        }

        Ok(table)
    }
}
