//! Configuration schema (netstate.toml)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use crate::diagnostic::{DiagnosticCode, Severity};

/// Boundary pattern accepting `----- show ... -----` banners
pub const DEFAULT_BOUNDARY_PATTERN: &str = r"^-{5,} (show .+?) -{5,}\s*$";

/// Vendor passed to table parsers when none is configured
pub const DEFAULT_VENDOR: &str = "Arista";

/// Number of leading transcript lines scanned for a vendor signature
pub const DEFAULT_SNIFF_LINES: usize = 50;

/// Severity threshold overrides for specific diagnostic codes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of diagnostic code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a diagnostic code, or default
    pub fn get_severity(&self, code: DiagnosticCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }
}

/// How transcripts are cut into sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Regex matched at the start of each line; group `command` (or group 1)
    /// names the command
    #[serde(default = "default_boundary")]
    pub boundary: String,

    /// Substrings that identify a supported device in the transcript head
    #[serde(default = "default_signatures")]
    pub vendor_signatures: Vec<String>,

    /// How many leading lines are scanned for a signature
    #[serde(default = "default_sniff_lines")]
    pub sniff_lines: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            boundary: default_boundary(),
            vendor_signatures: default_signatures(),
            sniff_lines: default_sniff_lines(),
        }
    }
}

fn default_boundary() -> String {
    DEFAULT_BOUNDARY_PATTERN.to_string()
}

fn default_signatures() -> Vec<String> {
    vec!["Arista DCS-".to_string()]
}

fn default_sniff_lines() -> usize {
    DEFAULT_SNIFF_LINES
}

fn default_vendor() -> String {
    DEFAULT_VENDOR.to_string()
}

fn default_true() -> bool {
    true
}

/// Key and compare columns for one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Columns forming the join key, in key order
    #[serde(alias = "index_columns")]
    pub index: Vec<String>,

    /// Columns compared once keys match
    #[serde(default, alias = "check_columns")]
    pub check: Vec<String>,
}

impl DiffConfig {
    pub fn new<I, C, S, T>(index: I, check: C) -> Self
    where
        I: IntoIterator<Item = S>,
        C: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            index: index.into_iter().map(Into::into).collect(),
            check: check.into_iter().map(Into::into).collect(),
        }
    }

    /// Index columns followed by check columns not already in the index
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.index.iter().map(String::as_str).collect();
        for column in &self.check {
            if !columns.contains(&column.as_str()) {
                columns.push(column);
            }
        }
        columns
    }
}

/// What to do when one table holds the same key twice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// Later rows overwrite earlier ones; the entry gets a warning
    #[default]
    LastWriteWins,

    /// The command fails with a DUPLICATE_KEY error
    Reject,
}

/// Diff engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffSettings {
    /// Duplicate key handling
    #[serde(default)]
    pub duplicate_keys: DuplicateKeyPolicy,

    /// Evaluate command pairs on the rayon pool
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Commands never diffed (exact names or `*` globs)
    #[serde(default)]
    pub skip: Vec<String>,

    /// Per-command handlers; the reference route handler when absent
    #[serde(default = "default_commands")]
    pub commands: BTreeMap<String, DiffConfig>,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            duplicate_keys: DuplicateKeyPolicy::default(),
            parallel: true,
            skip: Vec::new(),
            commands: default_commands(),
        }
    }
}

fn default_commands() -> BTreeMap<String, DiffConfig> {
    let mut commands = BTreeMap::new();
    commands.insert(
        "show ip route".to_string(),
        DiffConfig::new(["NETWORK", "MASK"], ["NEXT_HOP", "INTERFACE"]),
    );
    commands
}

impl DiffSettings {
    /// Handler for a command, if configured
    pub fn handler(&self, command: &str) -> Option<&DiffConfig> {
        self.commands.get(command)
    }

    /// Check if a command should be skipped
    pub fn is_skipped(&self, command: &str) -> bool {
        self.skip.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, command)
            } else {
                pattern == command
            }
        })
    }
}

/// Line pattern for the built-in regex table parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Regex with named groups; group names become column names
    pub pattern: String,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Vendor handed to table parsers
    #[serde(default = "default_vendor")]
    pub vendor: String,

    /// Transcript segmentation
    #[serde(default)]
    pub segment: SegmentConfig,

    /// Diff engine settings and handlers
    #[serde(default)]
    pub diff: DiffSettings,

    /// Regex table parsers by command
    #[serde(default)]
    pub parsers: BTreeMap<String, ParserConfig>,

    /// Severity thresholds
    #[serde(default)]
    pub severity: SeverityThreshold,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vendor: default_vendor(),
            segment: SegmentConfig::default(),
            diff: DiffSettings::default(),
            parsers: BTreeMap::new(),
            severity: SeverityThreshold::default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Check that every regex compiles
    pub fn validate(&self) -> Result<(), ConfigError> {
        regex::Regex::new(&self.segment.boundary).map_err(|e| ConfigError::InvalidPattern {
            name: "segment.boundary".to_string(),
            reason: e.to_string(),
        })?;

        for (command, parser) in &self.parsers {
            regex::Regex::new(&parser.pattern).map_err(|e| ConfigError::InvalidPattern {
                name: format!("parsers.\"{}\"", command),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

/// Simple glob matching (supports a single *)
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" || pattern == "**" {
        return true;
    }

    if let Some(star_pos) = pattern.find('*') {
        let prefix = &pattern[..star_pos];
        let suffix = &pattern[star_pos + 1..];

        text.len() >= prefix.len() + suffix.len()
            && text.starts_with(prefix)
            && text.ends_with(suffix)
    } else {
        pattern == text
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid pattern in {name}: {reason}")]
    InvalidPattern { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.vendor, "Arista");
        assert_eq!(config.diff.duplicate_keys, DuplicateKeyPolicy::LastWriteWins);

        let route = config.diff.handler("show ip route").unwrap();
        assert_eq!(route.index, vec!["NETWORK", "MASK"]);
        assert_eq!(route.check, vec!["NEXT_HOP", "INTERFACE"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn severity_override() {
        let mut threshold = SeverityThreshold::default();
        threshold.set_override(DiagnosticCode::NoHandler, Severity::Warn);

        assert_eq!(
            threshold.get_severity(DiagnosticCode::NoHandler, Severity::Info),
            Severity::Warn
        );
        assert_eq!(
            threshold.get_severity(DiagnosticCode::ParseMiss, Severity::Info),
            Severity::Info
        );
    }

    #[test]
    fn parse_full_toml() {
        let config = Config::from_toml(
            r#"
            vendor = "Arista"

            [segment]
            boundary = '^=== (?P<command>.+) ===$'

            [diff]
            duplicate_keys = "reject"
            parallel = false
            skip = ["show clock", "show proc*"]

            [diff.commands."show ip arp"]
            index = ["ADDRESS"]
            check = ["MAC", "INTERFACE"]

            [parsers."show ip arp"]
            pattern = '^(?P<ADDRESS>\S+)\s+(?P<MAC>\S+)\s+(?P<INTERFACE>\S+)$'

            [severity.overrides]
            NO_HANDLER = "warn"
            "#,
        )
        .unwrap();

        assert_eq!(config.segment.boundary, "^=== (?P<command>.+) ===$");
        assert_eq!(config.segment.sniff_lines, DEFAULT_SNIFF_LINES);
        assert_eq!(config.diff.duplicate_keys, DuplicateKeyPolicy::Reject);
        assert!(!config.diff.parallel);
        // explicit [diff.commands] replaces the built-in handlers
        assert!(config.diff.handler("show ip route").is_none());
        assert_eq!(config.diff.handler("show ip arp").unwrap().check, vec!["MAC", "INTERFACE"]);
        assert!(config.parsers.contains_key("show ip arp"));
        assert_eq!(
            config.severity.get_severity(DiagnosticCode::NoHandler, Severity::Info),
            Severity::Warn
        );
    }

    #[test]
    fn invalid_parser_pattern_is_rejected() {
        let err = Config::from_toml(
            r#"
            [parsers."show ip arp"]
            pattern = '(?P<ADDRESS>'
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn partial_diff_table_keeps_route_handler() {
        let config = Config::from_toml("[diff]\nduplicate_keys = \"reject\"\n").unwrap();

        assert_eq!(config.diff.duplicate_keys, DuplicateKeyPolicy::Reject);
        assert_eq!(
            config.diff.handler("show ip route"),
            Some(&DiffConfig::new(["NETWORK", "MASK"], ["NEXT_HOP", "INTERFACE"]))
        );
        assert_eq!(config.diff.commands, DiffSettings::default().commands);
    }

    #[test]
    fn referenced_columns_dedupes() {
        let cfg = DiffConfig::new(["NETWORK", "MASK"], ["MASK", "NEXT_HOP"]);
        assert_eq!(cfg.referenced_columns(), vec!["NETWORK", "MASK", "NEXT_HOP"]);
    }

    #[test]
    fn skip_pattern_matching() {
        let mut settings = DiffSettings::default();
        settings.skip = vec!["show clock".to_string(), "show proc*".to_string()];

        assert!(settings.is_skipped("show clock"));
        assert!(settings.is_skipped("show processes top once"));
        assert!(!settings.is_skipped("show ip route"));
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn glob_matching() {
        assert!(glob_match("*", "anything"));
        assert!(glob_match("show ip *", "show ip route"));
        assert!(glob_match("*summary", "show ip bgp summary"));
        assert!(!glob_match("show ip *", "show version"));
        assert!(!glob_match("ab*ba", "aba"));
    }
}
