//! Device query seam for fetching command output

use netstate_core::Section;
use std::collections::HashMap;
use std::fmt;

/// Output encoding requested from a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Text,
    Json,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One command's reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: String,
    pub encoding: Encoding,
    pub output: String,
}

/// Errors that can occur when querying a device
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Encoding '{0}' is not supported")]
    UnsupportedEncoding(Encoding),

    #[error("Connection failed: {0}")]
    ConnectionError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Anything that can run show commands and return their output
#[async_trait::async_trait]
pub trait DeviceQuery: Send + Sync {
    /// Device name used as the snapshot source
    fn name(&self) -> &str;

    /// Run commands in order and return one output per command, in order
    async fn fetch(
        &self,
        commands: &[String],
        encoding: Encoding,
    ) -> Result<Vec<CommandOutput>, DeviceError>;
}

/// Answers queries from a previously captured transcript
///
/// A command captured more than once keeps every capture. Within one
/// `fetch`, the n-th request for a command gets its n-th capture; requests
/// past the last capture repeat the last one.
#[derive(Debug, Clone)]
pub struct ReplayDevice {
    name: String,
    outputs: HashMap<String, Vec<String>>,
}

impl ReplayDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outputs: HashMap::new(),
        }
    }

    /// Replay the sections of a segmented transcript
    pub fn from_sections(name: impl Into<String>, sections: &[Section]) -> Self {
        let mut device = Self::new(name);
        for section in sections {
            device.push(section.command.clone(), section.text());
        }
        device
    }

    /// Add a canned reply; adding one for a known command queues it after the others
    pub fn with_output(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.push(command.into(), output.into());
        self
    }

    fn push(&mut self, command: String, output: String) {
        self.outputs.entry(command).or_default().push(output);
    }

    /// Commands this device can answer, sorted
    pub fn commands(&self) -> Vec<&str> {
        let mut commands: Vec<&str> = self.outputs.keys().map(String::as_str).collect();
        commands.sort_unstable();
        commands
    }
}

#[async_trait::async_trait]
impl DeviceQuery for ReplayDevice {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(
        &self,
        commands: &[String],
        encoding: Encoding,
    ) -> Result<Vec<CommandOutput>, DeviceError> {
        if encoding != Encoding::Text {
            return Err(DeviceError::UnsupportedEncoding(encoding));
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        commands
            .iter()
            .map(|command| {
                let captures = self
                    .outputs
                    .get(command)
                    .ok_or_else(|| DeviceError::UnknownCommand(command.clone()))?;

                let occurrence = seen.entry(command.as_str()).or_insert(0);
                let index = (*occurrence).min(captures.len().saturating_sub(1));
                *occurrence += 1;

                let output = captures
                    .get(index)
                    .ok_or_else(|| DeviceError::UnknownCommand(command.clone()))?;

                Ok(CommandOutput {
                    command: command.clone(),
                    encoding,
                    output: output.clone(),
                })
            })
            .collect()
    }
}
